use crate::cli::InspectArgs;
use crate::error::Result;
use crate::snapshot;
use nalgebra::Vector3;
use partopo::core::models::container::ContainerKind;
use partopo::workflows::dataset::ParticleDataset;
use std::fmt;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct DegreeStats {
    pub min: usize,
    pub max: usize,
    pub mean: f64,
    /// Particles without any bond.
    pub isolated: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InspectReport {
    pub particles: usize,
    /// Row counts of the topology containers present in the dataset.
    pub containers: Vec<(ContainerKind, usize)>,
    pub selected: Option<usize>,
    /// Connectivity statistics; `None` without a bonds container.
    pub degree: Option<DegreeStats>,
    pub periodic_bonds: usize,
    pub has_cell: bool,
}

pub fn inspect(dataset: &ParticleDataset) -> Result<InspectReport> {
    let particles = dataset.particle_count();
    let containers = ContainerKind::TOPOLOGY_KINDS
        .into_iter()
        .filter_map(|kind| dataset.container(kind).map(|c| (kind, c.element_count())))
        .collect();
    let selected = dataset.selected_particles().map(|mask| mask.count_ones());

    let degree = if dataset.bonds().is_some() {
        let adjacency = dataset.adjacency()?;
        let degrees: Vec<usize> = (0..particles).map(|p| adjacency.degree(p)).collect();
        Some(DegreeStats {
            min: degrees.iter().copied().min().unwrap_or(0),
            max: degrees.iter().copied().max().unwrap_or(0),
            mean: if particles == 0 {
                0.0
            } else {
                degrees.iter().sum::<usize>() as f64 / particles as f64
            },
            isolated: degrees.iter().filter(|&&d| d == 0).count(),
        })
    } else {
        None
    };

    let periodic_bonds = (0..dataset.bond_count())
        .filter_map(|row| dataset.bond(row))
        .filter(|bond| bond.shift != Vector3::zeros())
        .count();

    Ok(InspectReport {
        particles,
        containers,
        selected,
        degree,
        periodic_bonds,
        has_cell: dataset.cell().is_some(),
    })
}

impl fmt::Display for InspectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Particles: {}", self.particles)?;
        if let Some(selected) = self.selected {
            writeln!(f, "  selected: {}", selected)?;
        }
        for (kind, count) in &self.containers {
            writeln!(f, "{:<10} {}", format!("{}:", kind), count)?;
        }
        match &self.degree {
            Some(stats) => {
                writeln!(
                    f,
                    "Bonds per particle: min {}, max {}, mean {:.2}",
                    stats.min, stats.max, stats.mean
                )?;
                writeln!(f, "  isolated particles: {}", stats.isolated)?;
            }
            None => writeln!(f, "No bonds container.")?,
        }
        if self.periodic_bonds > 0 {
            writeln!(f, "Bonds crossing the cell boundary: {}", self.periodic_bonds)?;
        }
        write!(
            f,
            "Simulation cell: {}",
            if self.has_cell { "present" } else { "none" }
        )
    }
}

pub fn run(args: InspectArgs) -> Result<()> {
    let dataset = snapshot::read_dataset(&args.input)?;
    let report = inspect(&dataset)?;
    info!(
        particles = report.particles,
        bonds = dataset.bond_count(),
        "Inspected dataset."
    );
    println!("{}", report);
    Ok(())
}
