//! # Engine Module
//!
//! Algorithms that mutate several containers of a dataset together while
//! keeping their particle references consistent.
//!
//! ## Architecture
//!
//! - **Mutation Tasks** ([`tasks`]) - Bond merging, cascading particle deletion, stable sorting and periodic image generation
//! - **Configuration** ([`config`]) - Merge options, default appearance settings and their builders
//! - **Appearance** ([`appearance`]) - The injected provider of default colors and widths for new bonds
//! - **Progress Monitoring** ([`progress`]) - Progress events for front ends
//! - **Error Handling** ([`error`]) - Engine-specific error types
//! - **Scans** ([`utils`]) - Read-only bulk queries such as bond selection
//!
//! None of the tasks lock anything. Callers must hold exclusive access to
//! every container a task touches for the duration of the call.

pub mod appearance;
pub mod config;
pub mod error;
pub mod progress;
pub mod tasks;
pub mod utils;
