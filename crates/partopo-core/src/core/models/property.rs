use bitvec::slice::BitSlice;
use nalgebra::Vector3;
use phf::phf_map;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Well-known per-element properties with a canonical data layout.
///
/// Which standard properties a container accepts, and with which layout,
/// is decided by its [`ContainerKind`](super::container::ContainerKind).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StandardProperty {
    /// Numeric element type ID.
    Type,
    /// Non-zero for selected elements.
    Selection,
    /// RGB color.
    Color,
    /// Cartesian particle position.
    Position,
    /// Unique particle identifier, stable across reordering.
    Identifier,
    /// Particle display radius.
    Radius,
    /// Particle mass.
    Mass,
    /// Tuple of particle indices (pair, triplet or quadruplet).
    Topology,
    /// Integer 3-vector of periodic cell crossings.
    PeriodicImage,
    /// Bond display width.
    Width,
    /// Bond length.
    Length,
    /// Display transparency.
    Transparency,
}

static STANDARD_PROPERTY_NAMES: phf::Map<&'static str, StandardProperty> = phf_map! {
    "type" => StandardProperty::Type,
    "particle type" => StandardProperty::Type,
    "bond type" => StandardProperty::Type,
    "selection" => StandardProperty::Selection,
    "color" => StandardProperty::Color,
    "position" => StandardProperty::Position,
    "identifier" => StandardProperty::Identifier,
    "particle identifier" => StandardProperty::Identifier,
    "radius" => StandardProperty::Radius,
    "mass" => StandardProperty::Mass,
    "topology" => StandardProperty::Topology,
    "periodic image" => StandardProperty::PeriodicImage,
    "width" => StandardProperty::Width,
    "length" => StandardProperty::Length,
    "transparency" => StandardProperty::Transparency,
};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown standard property name: '{0}'")]
pub struct ParseStandardPropertyError(pub String);

impl FromStr for StandardProperty {
    type Err = ParseStandardPropertyError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        STANDARD_PROPERTY_NAMES
            .get(s.trim().to_lowercase().as_str())
            .copied()
            .ok_or_else(|| ParseStandardPropertyError(s.to_string()))
    }
}

impl fmt::Display for StandardProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Type => "Type",
                Self::Selection => "Selection",
                Self::Color => "Color",
                Self::Position => "Position",
                Self::Identifier => "Particle Identifier",
                Self::Radius => "Radius",
                Self::Mass => "Mass",
                Self::Topology => "Topology",
                Self::PeriodicImage => "Periodic Image",
                Self::Width => "Width",
                Self::Length => "Length",
                Self::Transparency => "Transparency",
            }
        )
    }
}

/// Storage layout of a property column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Int,
    Int64,
    Float,
    Vec3,
    Vec3I,
    Pairs,
    Triplets,
    Quadruplets,
}

impl DataType {
    /// Number of scalar components per element.
    pub fn component_count(self) -> usize {
        match self {
            Self::Int | Self::Int64 | Self::Float => 1,
            Self::Pairs => 2,
            Self::Vec3 | Self::Vec3I | Self::Triplets => 3,
            Self::Quadruplets => 4,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Int => "int32",
                Self::Int64 => "int64",
                Self::Float => "float",
                Self::Vec3 => "float[3]",
                Self::Vec3I => "int32[3]",
                Self::Pairs => "int64[2]",
                Self::Triplets => "int64[3]",
                Self::Quadruplets => "int64[4]",
            }
        )
    }
}

/// Identifies a column within a container: either a standard property or a
/// free-form user property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKey {
    Standard(StandardProperty),
    User(String),
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard(p) => write!(f, "{}", p),
            Self::User(name) => write!(f, "{}", name),
        }
    }
}

impl From<StandardProperty> for PropertyKey {
    fn from(p: StandardProperty) -> Self {
        Self::Standard(p)
    }
}

/// Element types that can be zero-initialised when a column grows.
trait Zeroed: Clone {
    fn zeroed() -> Self;
}

impl Zeroed for i32 {
    fn zeroed() -> Self {
        0
    }
}

impl Zeroed for i64 {
    fn zeroed() -> Self {
        0
    }
}

impl Zeroed for f64 {
    fn zeroed() -> Self {
        0.0
    }
}

impl Zeroed for Vector3<f64> {
    fn zeroed() -> Self {
        Vector3::zeros()
    }
}

impl Zeroed for Vector3<i32> {
    fn zeroed() -> Self {
        Vector3::zeros()
    }
}

impl<const N: usize> Zeroed for [i64; N] {
    fn zeroed() -> Self {
        [0; N]
    }
}

/// Typed storage of one property column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyData {
    Int(Vec<i32>),
    Int64(Vec<i64>),
    Float(Vec<f64>),
    Vec3(Vec<Vector3<f64>>),
    Vec3I(Vec<Vector3<i32>>),
    Pairs(Vec<[i64; 2]>),
    Triplets(Vec<[i64; 3]>),
    Quadruplets(Vec<[i64; 4]>),
}

macro_rules! with_values {
    ($data:expr, $values:ident => $body:expr) => {
        match $data {
            PropertyData::Int($values) => $body,
            PropertyData::Int64($values) => $body,
            PropertyData::Float($values) => $body,
            PropertyData::Vec3($values) => $body,
            PropertyData::Vec3I($values) => $body,
            PropertyData::Pairs($values) => $body,
            PropertyData::Triplets($values) => $body,
            PropertyData::Quadruplets($values) => $body,
        }
    };
}

macro_rules! with_value_pair {
    ($dst:expr, $src:expr, ($d:ident, $s:ident) => $body:expr, else => $fallback:expr) => {
        match ($dst, $src) {
            (PropertyData::Int($d), PropertyData::Int($s)) => $body,
            (PropertyData::Int64($d), PropertyData::Int64($s)) => $body,
            (PropertyData::Float($d), PropertyData::Float($s)) => $body,
            (PropertyData::Vec3($d), PropertyData::Vec3($s)) => $body,
            (PropertyData::Vec3I($d), PropertyData::Vec3I($s)) => $body,
            (PropertyData::Pairs($d), PropertyData::Pairs($s)) => $body,
            (PropertyData::Triplets($d), PropertyData::Triplets($s)) => $body,
            (PropertyData::Quadruplets($d), PropertyData::Quadruplets($s)) => $body,
            _ => $fallback,
        }
    };
}

/// Raised when two columns taking part in one operation have different layouts.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
#[error("Incompatible column layouts: expected {expected}, found {actual}")]
pub struct LayoutMismatch {
    pub expected: DataType,
    pub actual: DataType,
}

impl PropertyData {
    /// Allocates a zero-filled column of the given layout.
    pub fn zeroed(data_type: DataType, len: usize) -> Self {
        match data_type {
            DataType::Int => Self::Int(vec![0; len]),
            DataType::Int64 => Self::Int64(vec![0; len]),
            DataType::Float => Self::Float(vec![0.0; len]),
            DataType::Vec3 => Self::Vec3(vec![Vector3::zeros(); len]),
            DataType::Vec3I => Self::Vec3I(vec![Vector3::zeros(); len]),
            DataType::Pairs => Self::Pairs(vec![[0; 2]; len]),
            DataType::Triplets => Self::Triplets(vec![[0; 3]; len]),
            DataType::Quadruplets => Self::Quadruplets(vec![[0; 4]; len]),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Self::Int(_) => DataType::Int,
            Self::Int64(_) => DataType::Int64,
            Self::Float(_) => DataType::Float,
            Self::Vec3(_) => DataType::Vec3,
            Self::Vec3I(_) => DataType::Vec3I,
            Self::Pairs(_) => DataType::Pairs,
            Self::Triplets(_) => DataType::Triplets,
            Self::Quadruplets(_) => DataType::Quadruplets,
        }
    }

    pub fn len(&self) -> usize {
        with_values!(self, values => values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Grows or shrinks the column; new elements are zero.
    pub fn resize(&mut self, len: usize) {
        with_values!(self, values => values.resize(len, Zeroed::zeroed()))
    }

    /// Removes every element whose bit is set in `mask`, keeping the order of
    /// the remaining elements.
    ///
    /// `mask` must cover exactly the current column length.
    pub fn filter(&mut self, mask: &BitSlice) {
        debug_assert_eq!(mask.len(), self.len());
        with_values!(self, values => {
            let mut row = 0;
            values.retain(|_| {
                let keep = !mask[row];
                row += 1;
                keep
            });
        })
    }

    /// Reorders the column so that the element at `old` moves to
    /// `inverted_permutation[old]`.
    pub fn permute(&mut self, inverted_permutation: &[usize]) {
        debug_assert_eq!(inverted_permutation.len(), self.len());
        with_values!(self, values => {
            let original = values.clone();
            for (old, value) in original.into_iter().enumerate() {
                values[inverted_permutation[old]] = value;
            }
        })
    }

    /// Copies `source[k]` into `self[target]` for every `Some(target)` at
    /// position `k` of `targets`; `None` entries are skipped.
    pub fn scatter_from(
        &mut self,
        source: &PropertyData,
        targets: &[Option<usize>],
    ) -> Result<(), LayoutMismatch> {
        let expected = self.data_type();
        let actual = source.data_type();
        with_value_pair!(self, source, (dst, src) => {
            for (value, target) in src.iter().zip(targets) {
                if let Some(target) = *target {
                    dst[target] = value.clone();
                }
            }
            Ok(())
        }, else => Err(LayoutMismatch { expected, actual }))
    }

    pub fn as_int(&self) -> Option<&[i32]> {
        match self {
            Self::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int_mut(&mut self) -> Option<&mut [i32]> {
        match self {
            Self::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int64(&self) -> Option<&[i64]> {
        match self {
            Self::Int64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<&[f64]> {
        match self {
            Self::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float_mut(&mut self) -> Option<&mut [f64]> {
        match self {
            Self::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<&[Vector3<f64>]> {
        match self {
            Self::Vec3(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_vec3_mut(&mut self) -> Option<&mut [Vector3<f64>]> {
        match self {
            Self::Vec3(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_vec3i(&self) -> Option<&[Vector3<i32>]> {
        match self {
            Self::Vec3I(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_vec3i_mut(&mut self) -> Option<&mut [Vector3<i32>]> {
        match self {
            Self::Vec3I(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_pairs(&self) -> Option<&[[i64; 2]]> {
        match self {
            Self::Pairs(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_pairs_mut(&mut self) -> Option<&mut [[i64; 2]]> {
        match self {
            Self::Pairs(v) => Some(v),
            _ => None,
        }
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub key: PropertyKey,
    pub data: PropertyData,
}

impl Property {
    pub fn new(key: impl Into<PropertyKey>, data: PropertyData) -> Self {
        Self {
            key: key.into(),
            data,
        }
    }

    pub fn user(name: &str, data: PropertyData) -> Self {
        Self::new(PropertyKey::User(name.to_string()), data)
    }

    pub fn name(&self) -> String {
        self.key.to_string()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
