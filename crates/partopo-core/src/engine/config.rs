use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Decides which candidate's auxiliary values are kept when several
/// candidates of one merge batch resolve to the same bond row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DuplicatePolicy {
    /// The first candidate in batch order wins; later ones are ignored.
    #[default]
    FirstWins,
    /// Every candidate overwrites the previous one, so the last wins.
    LastWins,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid duplicate policy '{0}', expected 'first' or 'last'")]
pub struct ParseDuplicatePolicyError(pub String);

impl FromStr for DuplicatePolicy {
    type Err = ParseDuplicatePolicyError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "first" | "first-wins" => Ok(Self::FirstWins),
            "last" | "last-wins" => Ok(Self::LastWins),
            _ => Err(ParseDuplicatePolicyError(s.to_string())),
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::FirstWins => "first",
                Self::LastWins => "last",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MergeOptions {
    pub duplicate_policy: DuplicatePolicy,
    /// Bond type assigned to newly appended rows.
    pub bond_type: Option<i32>,
}

#[derive(Default)]
pub struct MergeOptionsBuilder {
    duplicate_policy: Option<DuplicatePolicy>,
    bond_type: Option<i32>,
}

impl MergeOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = Some(policy);
        self
    }
    pub fn bond_type(mut self, bond_type: Option<i32>) -> Self {
        self.bond_type = bond_type;
        self
    }

    pub fn build(self) -> Result<MergeOptions, ConfigError> {
        Ok(MergeOptions {
            duplicate_policy: self
                .duplicate_policy
                .ok_or(ConfigError::MissingParameter("duplicate_policy"))?,
            bond_type: self.bond_type,
        })
    }
}

pub const DEFAULT_BOND_COLOR: [f64; 3] = [0.6, 0.6, 0.6];
pub const DEFAULT_BOND_WIDTH: f64 = 0.4;

/// Default bond appearance used for rows the caller did not style explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct AppearanceConfig {
    pub bond_color: [f64; 3],
    pub bond_width: f64,
    /// Color new bonds after their first particle; takes precedence over type colors.
    pub use_particle_colors: bool,
    /// Explicit colors per bond type ID, taking precedence over the palette.
    pub type_colors: HashMap<i32, [f64; 3]>,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            bond_color: DEFAULT_BOND_COLOR,
            bond_width: DEFAULT_BOND_WIDTH,
            use_particle_colors: false,
            type_colors: HashMap::new(),
        }
    }
}

#[derive(Default)]
pub struct AppearanceConfigBuilder {
    bond_color: Option<[f64; 3]>,
    bond_width: Option<f64>,
    use_particle_colors: bool,
    type_colors: HashMap<i32, [f64; 3]>,
}

impl AppearanceConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bond_color(mut self, color: [f64; 3]) -> Self {
        self.bond_color = Some(color);
        self
    }
    pub fn bond_width(mut self, width: f64) -> Self {
        self.bond_width = Some(width);
        self
    }
    pub fn use_particle_colors(mut self, enabled: bool) -> Self {
        self.use_particle_colors = enabled;
        self
    }
    pub fn type_color(mut self, type_id: i32, color: [f64; 3]) -> Self {
        self.type_colors.insert(type_id, color);
        self
    }

    pub fn build(self) -> Result<AppearanceConfig, ConfigError> {
        let bond_color = self
            .bond_color
            .ok_or(ConfigError::MissingParameter("bond_color"))?;
        let bond_width = self
            .bond_width
            .ok_or(ConfigError::MissingParameter("bond_width"))?;

        if !(bond_width.is_finite() && bond_width >= 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "bond_width",
                reason: format!("must be a non-negative number, got {}", bond_width),
            });
        }
        let out_of_range = |c: &[f64; 3]| c.iter().any(|v| !(0.0..=1.0).contains(v));
        if out_of_range(&bond_color) || self.type_colors.values().any(out_of_range) {
            return Err(ConfigError::InvalidParameter {
                name: "bond_color",
                reason: "color components must lie in [0, 1]".to_string(),
            });
        }

        Ok(AppearanceConfig {
            bond_color,
            bond_width,
            use_particle_colors: self.use_particle_colors,
            type_colors: self.type_colors,
        })
    }
}
