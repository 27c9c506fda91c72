use thiserror::Error;

use crate::core::models::container::{ContainerError, ContainerKind};
use crate::core::models::property::{DataType, LayoutMismatch};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Operation requires {0} as input")]
    MissingContainer(ContainerKind),

    #[error("Expected a {expected} container, got {actual}")]
    WrongContainerKind {
        expected: ContainerKind,
        actual: ContainerKind,
    },

    #[error("Bond candidate batch is empty")]
    EmptyBatch,

    #[error(
        "Bond candidate #{candidate} references particle {index}, but only {particle_count} particles exist"
    )]
    CandidateOutOfRange {
        candidate: usize,
        index: usize,
        particle_count: usize,
    },

    #[error("Property '{0}' is managed by the bond merger and cannot be supplied per candidate")]
    ReservedProperty(String),

    #[error(
        "Auxiliary property '{property}' has {actual} values for {expected} bond candidates"
    )]
    AuxiliaryLengthMismatch {
        property: String,
        expected: usize,
        actual: usize,
    },

    #[error("Auxiliary property '{property}' has data type {actual}, but the bonds column is {expected}")]
    AuxiliaryTypeMismatch {
        property: String,
        expected: DataType,
        actual: DataType,
    },

    #[error("Deletion mask covers {actual} particles, but the dataset holds {expected}")]
    MaskLengthMismatch { expected: usize, actual: usize },

    #[error("Simulation cell is degenerate and has no inverse")]
    DegenerateCell,

    #[error("{container} row {row} references particle {index} outside 0..{particle_count}")]
    DanglingReference {
        container: ContainerKind,
        row: usize,
        index: i64,
        particle_count: usize,
    },

    #[error(transparent)]
    Container(#[from] ContainerError),
}

impl EngineError {
    pub(crate) fn auxiliary_type_mismatch(property: String, mismatch: LayoutMismatch) -> Self {
        Self::AuxiliaryTypeMismatch {
            property,
            expected: mismatch.expected,
            actual: mismatch.actual,
        }
    }
}
