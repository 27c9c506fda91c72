use super::property::{DataType, Property, PropertyData, PropertyKey, StandardProperty};
use bitvec::slice::BitSlice;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The kinds of element containers a particle dataset is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerKind {
    Particles,
    Bonds,
    Angles,
    Dihedrals,
    Impropers,
}

impl ContainerKind {
    /// Containers whose rows reference particle rows, in cascade order.
    pub const TOPOLOGY_KINDS: [ContainerKind; 4] = [
        ContainerKind::Bonds,
        ContainerKind::Angles,
        ContainerKind::Dihedrals,
        ContainerKind::Impropers,
    ];

    /// Canonical layout of a standard property in this container, or `None`
    /// if the property is not defined for this kind of element.
    pub fn standard_layout(self, property: StandardProperty) -> Option<DataType> {
        use StandardProperty as P;
        match (self, property) {
            (_, P::Type) => Some(DataType::Int),
            (Self::Particles | Self::Bonds, P::Selection) => Some(DataType::Int),
            (Self::Particles | Self::Bonds, P::Color) => Some(DataType::Vec3),
            (Self::Particles | Self::Bonds, P::PeriodicImage) => Some(DataType::Vec3I),
            (Self::Particles | Self::Bonds, P::Transparency) => Some(DataType::Float),
            (Self::Particles, P::Position) => Some(DataType::Vec3),
            (Self::Particles, P::Identifier) => Some(DataType::Int64),
            (Self::Particles, P::Radius | P::Mass) => Some(DataType::Float),
            (Self::Bonds, P::Width | P::Length) => Some(DataType::Float),
            (Self::Bonds, P::Topology) => Some(DataType::Pairs),
            (Self::Angles, P::Topology) => Some(DataType::Triplets),
            (Self::Dihedrals | Self::Impropers, P::Topology) => Some(DataType::Quadruplets),
            _ => None,
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Particles => "particles",
                Self::Bonds => "bonds",
                Self::Angles => "angles",
                Self::Dihedrals => "dihedrals",
                Self::Impropers => "impropers",
            }
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ContainerError {
    #[error("Required {container} property '{property}' does not exist")]
    MissingProperty {
        container: ContainerKind,
        property: String,
    },

    #[error("'{property}' is not a standard property of {container}")]
    UnsupportedProperty {
        container: ContainerKind,
        property: StandardProperty,
    },

    #[error("Property '{property}' has data type {actual}, expected {expected}")]
    TypeMismatch {
        property: String,
        expected: DataType,
        actual: DataType,
    },

    #[error(
        "Property array '{property}' has {actual} elements, but the {container} container holds {expected}"
    )]
    LengthMismatch {
        container: ContainerKind,
        property: String,
        expected: usize,
        actual: usize,
    },

    #[error("Mask covers {actual} elements, but the {container} container holds {expected}")]
    MaskLengthMismatch {
        container: ContainerKind,
        expected: usize,
        actual: usize,
    },
}

/// Flat columnar row store: a set of equally long property columns.
///
/// Rows have no identity besides their position, which changes whenever the
/// container is compacted or sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyContainer {
    kind: ContainerKind,
    element_count: usize,
    properties: Vec<Property>,
}

impl PropertyContainer {
    pub fn new(kind: ContainerKind) -> Self {
        Self::with_count(kind, 0)
    }

    pub fn with_count(kind: ContainerKind, element_count: usize) -> Self {
        Self {
            kind,
            element_count,
            properties: Vec::new(),
        }
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    pub fn element_count(&self) -> usize {
        self.element_count
    }

    pub fn is_empty(&self) -> bool {
        self.element_count == 0
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Changes the number of rows, resizing every column. New rows are zero.
    pub fn set_element_count(&mut self, count: usize) {
        if count == self.element_count {
            return;
        }
        for property in &mut self.properties {
            property.data.resize(count);
        }
        self.element_count = count;
    }

    fn position_of(&self, key: &PropertyKey) -> Option<usize> {
        self.properties.iter().position(|p| &p.key == key)
    }

    pub fn get_property(&self, key: &PropertyKey) -> Option<&Property> {
        self.position_of(key).map(|i| &self.properties[i])
    }

    pub fn get_property_mut(&mut self, key: &PropertyKey) -> Option<&mut Property> {
        self.position_of(key).map(move |i| &mut self.properties[i])
    }

    pub fn contains(&self, key: &PropertyKey) -> bool {
        self.position_of(key).is_some()
    }

    /// Column data of a standard property, if present.
    pub fn standard(&self, property: StandardProperty) -> Option<&PropertyData> {
        self.get_property(&PropertyKey::Standard(property))
            .map(|p| &p.data)
    }

    pub fn standard_mut(&mut self, property: StandardProperty) -> Option<&mut PropertyData> {
        self.get_property_mut(&PropertyKey::Standard(property))
            .map(|p| &mut p.data)
    }

    /// Column data of a standard property; fails if the column is absent or
    /// its length does not match the container.
    pub fn expect_standard(&self, property: StandardProperty) -> Result<&PropertyData, ContainerError> {
        let data = self
            .standard(property)
            .ok_or_else(|| ContainerError::MissingProperty {
                container: self.kind,
                property: property.to_string(),
            })?;
        if data.len() != self.element_count {
            return Err(ContainerError::LengthMismatch {
                container: self.kind,
                property: property.to_string(),
                expected: self.element_count,
                actual: data.len(),
            });
        }
        Ok(data)
    }

    /// Returns the existing column of a standard property or creates a
    /// zero-filled one with the canonical layout for this container kind.
    pub fn create_standard_property(
        &mut self,
        property: StandardProperty,
    ) -> Result<&mut PropertyData, ContainerError> {
        let layout = self.kind.standard_layout(property).ok_or(
            ContainerError::UnsupportedProperty {
                container: self.kind,
                property,
            },
        )?;
        self.create_column(PropertyKey::Standard(property), layout)
    }

    /// Returns the existing user column `name` or creates a zero-filled one.
    /// An existing column must already have the requested layout.
    pub fn create_user_property(
        &mut self,
        name: &str,
        data_type: DataType,
    ) -> Result<&mut PropertyData, ContainerError> {
        self.create_column(PropertyKey::User(name.to_string()), data_type)
    }

    fn create_column(
        &mut self,
        key: PropertyKey,
        data_type: DataType,
    ) -> Result<&mut PropertyData, ContainerError> {
        let index = match self.position_of(&key) {
            Some(index) => {
                let actual = self.properties[index].data.data_type();
                if actual != data_type {
                    return Err(ContainerError::TypeMismatch {
                        property: key.to_string(),
                        expected: data_type,
                        actual,
                    });
                }
                index
            }
            None => {
                self.properties.push(Property {
                    key,
                    data: PropertyData::zeroed(data_type, self.element_count),
                });
                self.properties.len() - 1
            }
        };
        Ok(&mut self.properties[index].data)
    }

    /// Inserts a fully populated column, replacing any column with the same key.
    ///
    /// The first column added to an empty container defines its row count.
    pub fn add_property(&mut self, property: Property) -> Result<(), ContainerError> {
        if let PropertyKey::Standard(standard) = property.key {
            let expected =
                self.kind
                    .standard_layout(standard)
                    .ok_or(ContainerError::UnsupportedProperty {
                        container: self.kind,
                        property: standard,
                    })?;
            let actual = property.data.data_type();
            if expected != actual {
                return Err(ContainerError::TypeMismatch {
                    property: standard.to_string(),
                    expected,
                    actual,
                });
            }
        }

        if self.properties.is_empty() && self.element_count == 0 {
            self.element_count = property.len();
        }
        if property.len() != self.element_count {
            return Err(ContainerError::LengthMismatch {
                container: self.kind,
                property: property.name(),
                expected: self.element_count,
                actual: property.len(),
            });
        }

        match self.position_of(&property.key) {
            Some(index) => self.properties[index] = property,
            None => self.properties.push(property),
        }
        Ok(())
    }

    pub fn remove_property(&mut self, key: &PropertyKey) -> Option<Property> {
        self.position_of(key).map(|i| self.properties.remove(i))
    }

    /// Physically removes the rows flagged in `mask` from every column and
    /// returns the number of removed rows.
    pub fn compact(&mut self, mask: &BitSlice) -> Result<usize, ContainerError> {
        if mask.len() != self.element_count {
            return Err(ContainerError::MaskLengthMismatch {
                container: self.kind,
                expected: self.element_count,
                actual: mask.len(),
            });
        }
        self.verify_integrity()?;

        let delete_count = mask.count_ones();
        if delete_count == 0 {
            return Ok(0);
        }
        for property in &mut self.properties {
            property.data.filter(mask);
        }
        self.element_count -= delete_count;
        Ok(delete_count)
    }

    /// Stable-sorts the rows by ascending `Identifier` and returns the inverted
    /// permutation (`result[old] == new`).
    ///
    /// Returns an empty vector if there is no identifier column or the rows
    /// are already in order.
    pub fn sort_by_identifier(&mut self) -> Result<Vec<usize>, ContainerError> {
        let Some(ids) = self.standard(StandardProperty::Identifier) else {
            return Ok(Vec::new());
        };
        let ids = ids.as_int64().ok_or_else(|| ContainerError::TypeMismatch {
            property: StandardProperty::Identifier.to_string(),
            expected: DataType::Int64,
            actual: ids.data_type(),
        })?;
        self.verify_integrity()?;

        let mut permutation: Vec<usize> = (0..ids.len()).collect();
        permutation.sort_by_key(|&row| ids[row]);

        let mut inverted_permutation = vec![0; permutation.len()];
        let mut already_sorted = true;
        for (new, &old) in permutation.iter().enumerate() {
            inverted_permutation[old] = new;
            if old != new {
                already_sorted = false;
            }
        }
        if already_sorted {
            return Ok(Vec::new());
        }

        for property in &mut self.properties {
            property.data.permute(&inverted_permutation);
        }
        Ok(inverted_permutation)
    }

    /// Checks that every column has exactly one value per row.
    pub fn verify_integrity(&self) -> Result<(), ContainerError> {
        match self
            .properties
            .iter()
            .find(|p| p.len() != self.element_count)
        {
            Some(p) => Err(ContainerError::LengthMismatch {
                container: self.kind,
                property: p.name(),
                expected: self.element_count,
                actual: p.len(),
            }),
            None => Ok(()),
        }
    }
}
