use partopo::engine::config::{DEFAULT_BOND_COLOR, DEFAULT_BOND_WIDTH, DuplicatePolicy};

pub struct DefaultsConfig {
    pub bond_color: [f64; 3],
    pub bond_width: f64,
    pub use_particle_colors: bool,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            bond_color: DEFAULT_BOND_COLOR,
            bond_width: DEFAULT_BOND_WIDTH,
            use_particle_colors: false,
            duplicate_policy: DuplicatePolicy::FirstWins,
        }
    }
}
