use std::ops::Range;

use nalgebra::Vector3;

use super::config::AppearanceConfig;
use crate::core::models::container::PropertyContainer;
use crate::core::models::property::StandardProperty;

/// Standard colors of bond types, cycled by `|type_id| % 9`.
pub const BOND_TYPE_PALETTE: [[f64; 3]; 9] = [
    [1.0, 1.0, 0.0],
    [0.7, 0.0, 1.0],
    [0.2, 1.0, 1.0],
    [1.0, 0.4, 1.0],
    [0.4, 1.0, 0.4],
    [1.0, 0.4, 0.4],
    [0.4, 0.4, 1.0],
    [1.0, 1.0, 0.7],
    [0.97, 0.97, 0.97],
];

pub fn palette_color(type_id: i32) -> [f64; 3] {
    BOND_TYPE_PALETTE[type_id.unsigned_abs() as usize % BOND_TYPE_PALETTE.len()]
}

/// Supplies default per-row appearance for bond rows appended by a merge.
///
/// Implementations only see the row range they are asked about and must
/// return exactly `rows.len()` values.
pub trait DefaultAppearanceProvider {
    fn bond_colors(
        &self,
        particles: &PropertyContainer,
        bonds: &PropertyContainer,
        rows: Range<usize>,
    ) -> Vec<Vector3<f64>>;

    fn bond_widths(
        &self,
        particles: &PropertyContainer,
        bonds: &PropertyContainer,
        rows: Range<usize>,
    ) -> Vec<f64>;
}

/// Config-driven appearance.
///
/// Colors are resolved per row in this order: the color of the first
/// particle (if enabled and available), the color of a non-zero bond type
/// (explicit entry, else palette), then the uniform bond color.
#[derive(Debug, Clone, Default)]
pub struct StandardAppearance {
    config: AppearanceConfig,
}

impl StandardAppearance {
    pub fn new(config: AppearanceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppearanceConfig {
        &self.config
    }

    fn type_color(&self, type_id: i32) -> [f64; 3] {
        self.config
            .type_colors
            .get(&type_id)
            .copied()
            .unwrap_or_else(|| palette_color(type_id))
    }
}

impl DefaultAppearanceProvider for StandardAppearance {
    fn bond_colors(
        &self,
        particles: &PropertyContainer,
        bonds: &PropertyContainer,
        rows: Range<usize>,
    ) -> Vec<Vector3<f64>> {
        let particle_colors = self
            .config
            .use_particle_colors
            .then(|| particles.standard(StandardProperty::Color))
            .flatten()
            .and_then(|data| data.as_vec3());
        let topology = bonds
            .standard(StandardProperty::Topology)
            .and_then(|data| data.as_pairs());
        let types = bonds
            .standard(StandardProperty::Type)
            .and_then(|data| data.as_int());

        rows.map(|row| {
            let from_particle = particle_colors.zip(topology).and_then(|(colors, topology)| {
                let index1 = *topology.get(row)?.first()?;
                usize::try_from(index1).ok().and_then(|i| colors.get(i)).copied()
            });
            if let Some(color) = from_particle {
                return color;
            }
            match types.and_then(|types| types.get(row).copied()) {
                Some(type_id) if type_id != 0 => Vector3::from(self.type_color(type_id)),
                _ => Vector3::from(self.config.bond_color),
            }
        })
        .collect()
    }

    fn bond_widths(
        &self,
        _particles: &PropertyContainer,
        _bonds: &PropertyContainer,
        rows: Range<usize>,
    ) -> Vec<f64> {
        vec![self.config.bond_width; rows.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::container::ContainerKind;
    use crate::core::models::property::{Property, PropertyData};

    fn particles_with_colors() -> PropertyContainer {
        let mut particles = PropertyContainer::new(ContainerKind::Particles);
        particles
            .add_property(Property::new(
                StandardProperty::Color,
                PropertyData::Vec3(vec![Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 1.0)]),
            ))
            .unwrap();
        particles
    }

    fn bonds(pairs: Vec<[i64; 2]>, types: Option<Vec<i32>>) -> PropertyContainer {
        let mut bonds = PropertyContainer::new(ContainerKind::Bonds);
        bonds
            .add_property(Property::new(
                StandardProperty::Topology,
                PropertyData::Pairs(pairs),
            ))
            .unwrap();
        if let Some(types) = types {
            bonds
                .add_property(Property::new(StandardProperty::Type, PropertyData::Int(types)))
                .unwrap();
        }
        bonds
    }

    #[test]
    fn palette_cycles_by_absolute_type_id() {
        assert_eq!(palette_color(0), [1.0, 1.0, 0.0]);
        assert_eq!(palette_color(10), palette_color(1));
        assert_eq!(palette_color(-2), palette_color(2));
    }

    #[test]
    fn untyped_bonds_get_uniform_color() {
        let appearance = StandardAppearance::default();
        let colors = appearance.bond_colors(
            &particles_with_colors(),
            &bonds(vec![[0, 1], [1, 0]], None),
            0..2,
        );
        assert_eq!(colors, vec![Vector3::new(0.6, 0.6, 0.6); 2]);
    }

    #[test]
    fn typed_bonds_prefer_explicit_type_colors_over_palette() {
        let mut config = AppearanceConfig::default();
        config.type_colors.insert(2, [0.1, 0.2, 0.3]);
        let appearance = StandardAppearance::new(config);

        let colors = appearance.bond_colors(
            &particles_with_colors(),
            &bonds(vec![[0, 1], [1, 0], [0, 0]], Some(vec![2, 3, 0])),
            0..3,
        );
        assert_eq!(colors[0], Vector3::new(0.1, 0.2, 0.3));
        assert_eq!(colors[1], Vector3::from(palette_color(3)));
        assert_eq!(colors[2], Vector3::new(0.6, 0.6, 0.6));
    }

    #[test]
    fn particle_colors_take_precedence_when_enabled() {
        let config = AppearanceConfig {
            use_particle_colors: true,
            ..AppearanceConfig::default()
        };
        let appearance = StandardAppearance::new(config);
        let colors = appearance.bond_colors(
            &particles_with_colors(),
            &bonds(vec![[0, 1], [1, 0], [5, 0]], Some(vec![1, 1, 1])),
            1..3,
        );
        assert_eq!(colors.len(), 2);
        assert_eq!(colors[0], Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(colors[1], Vector3::from(palette_color(1)));
    }

    #[test]
    fn widths_cover_requested_rows() {
        let appearance = StandardAppearance::default();
        let widths = appearance.bond_widths(
            &particles_with_colors(),
            &bonds(vec![[0, 1]; 4], None),
            2..4,
        );
        assert_eq!(widths, vec![0.4, 0.4]);
    }
}
