#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The coverage/overlap/classification engine.
//!
//! Stages, in dependency order: coverage (which schools fall inside each
//! campus's radius), classification (exclusive vs. shared per school),
//! overlap (pairwise contested-student matrix), and market sizing (TAM).
//! [`pipeline::run`] chains them into one synchronous batch computation.
//!
//! Every stage is a pure function from the previous stage's output to a
//! fresh structure; nothing is mutated across stage boundaries.

pub mod classify;
pub mod coverage;
pub mod overlap;
pub mod pipeline;
pub mod progress;
pub mod tam;

use thiserror::Error;

/// Errors that can abort an analysis run.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Campus working-set resolution failed.
    #[error(transparent)]
    Registry(#[from] campus_map_registry::RegistryError),

    /// No school records were supplied.
    #[error("no schools to analyze")]
    NoSchools,
}
