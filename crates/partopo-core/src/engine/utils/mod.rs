//! Read-only helpers shared by engine consumers.
//!
//! Bulk scans here never mutate containers and may run in parallel when the
//! `parallel` feature is enabled.

pub mod scan;
