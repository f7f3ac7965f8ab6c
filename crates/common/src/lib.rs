//! Paasport Harness Common Library
//!
//! Shared types and the error taxonomy for the Paasport integration harness.

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::{
    ApiReport, Liveness, Phase, PhaseResult, ProbeOutcome, Report, Stage,
};

/// Harness version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
