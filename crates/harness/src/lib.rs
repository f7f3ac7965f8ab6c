//! Paasport Integration Harness
//!
//! This crate drives a full integration run against the Paasport console:
//! - Spawns the backend API and the frontend dev server as subprocesses
//! - Gates each on its stdout readiness banner
//! - Probes the backend HTTP/GraphQL surface
//! - Runs the frontend unit-test and end-to-end phases as subprocesses
//! - Writes an aggregated JSON report and tears everything down
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Harness (one run)                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  check_prerequisites()                                       │
//! │  spawn backend  ──▶ ServiceHandle (banner gate, 30s)        │
//! │  spawn frontend ──▶ ServiceHandle (banner + port, 60s)      │
//! │  phases (sequential, failure-isolated)                      │
//! │    ├── api-integration ──▶ ApiProber (health, auth, CRUD,   │
//! │    │                       deployments, analytics, graphql) │
//! │    ├── frontend-unit   ──▶ subprocess                       │
//! │    └── end-to-end      ──▶ wait_for_url gate + subprocess   │
//! │  report ──▶ console summary + JSON file                     │
//! │  cleanup() — unconditional, every exit path                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod phase;
pub mod prereq;
pub mod process;
pub mod readiness;
pub mod report;
pub mod runner;

pub use paasport_common::{Error, Result};
pub use runner::{Harness, HarnessConfig};
