//! Core types for harness runs
//!
//! Everything that ends up in the persisted report lives here, together with
//! the run/process state machines. All of it serializes with serde so the
//! report file carries the full structured result tree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Lifecycle stage of a single harness run
///
/// `CleanedUp` is reached from every other stage, including `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Init,
    PrerequisitesChecked,
    BackendStarting,
    BackendReady,
    FrontendStarting,
    FrontendReady,
    RunningPhases,
    ReportGenerated,
    CleanedUp,
    Failed,
}

impl Default for Stage {
    fn default() -> Self {
        Self::Init
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::PrerequisitesChecked => "prerequisites_checked",
            Stage::BackendStarting => "backend_starting",
            Stage::BackendReady => "backend_ready",
            Stage::FrontendStarting => "frontend_starting",
            Stage::FrontendReady => "frontend_ready",
            Stage::RunningPhases => "running_phases",
            Stage::ReportGenerated => "report_generated",
            Stage::CleanedUp => "cleaned_up",
            Stage::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Liveness of a spawned service process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Liveness {
    Starting,
    Ready,
    Failed,
    Terminated,
}

/// Outcome of a single bounded probe against the backend
///
/// Probes never panic or propagate transport errors; anything that goes wrong
/// becomes `success: false` with the error text preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Per-category results of the backend API probe suite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiReport {
    pub connectivity: ProbeOutcome,
    pub authentication: ProbeOutcome,
    pub applications: ProbeOutcome,
    pub deployments: ProbeOutcome,
    pub analytics: ProbeOutcome,
    pub graphql: ProbeOutcome,
}

impl ApiReport {
    /// Probe categories in execution order
    pub fn outcomes(&self) -> [(&'static str, &ProbeOutcome); 6] {
        [
            ("connectivity", &self.connectivity),
            ("authentication", &self.authentication),
            ("applications", &self.applications),
            ("deployments", &self.deployments),
            ("analytics", &self.analytics),
            ("graphql", &self.graphql),
        ]
    }

    pub fn passed(&self) -> usize {
        self.outcomes().iter().filter(|(_, o)| o.success).count()
    }

    pub fn total(&self) -> usize {
        self.outcomes().len()
    }

    pub fn all_passed(&self) -> bool {
        self.outcomes().iter().all(|(_, o)| o.success)
    }
}

/// Top-level stage of the test run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    ApiIntegration,
    FrontendUnit,
    EndToEnd,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::ApiIntegration => "api-integration",
            Phase::FrontendUnit => "frontend-unit",
            Phase::EndToEnd => "end-to-end",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of one phase, immutable once recorded into a [`Report`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseResult {
    pub phase: Phase,
    pub success: bool,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub detail: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PhaseResult {
    /// Build the API-integration phase result from the probe suite
    pub fn from_api(api: &ApiReport, duration: Duration) -> Self {
        let failed: Vec<&str> = api
            .outcomes()
            .iter()
            .filter(|(_, o)| !o.success)
            .map(|(name, _)| *name)
            .collect();

        Self {
            phase: Phase::ApiIntegration,
            success: failed.is_empty(),
            duration_ms: duration.as_millis() as u64,
            detail: serde_json::to_value(api).unwrap_or(Value::Null),
            error: if failed.is_empty() {
                None
            } else {
                Some(format!("failed probes: {}", failed.join(", ")))
            },
        }
    }

    pub fn failed(phase: Phase, duration: Duration, error: impl Into<String>) -> Self {
        Self {
            phase,
            success: false,
            duration_ms: duration.as_millis() as u64,
            detail: Value::Null,
            error: Some(error.into()),
        }
    }
}

/// Aggregated, persisted record of one harness run
///
/// Append-only while the run is in flight; authoritative only once
/// `finished_at` is set. An interrupted run is never reported as success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub harness_version: String,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub stage: Stage,
    pub overall_success: bool,
    pub phases: Vec<PhaseResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fatal_error: Option<String>,
}

impl Report {
    pub fn new(harness_version: &str) -> Self {
        Self {
            harness_version: harness_version.to_string(),
            started_at: Utc::now(),
            finished_at: None,
            stage: Stage::Init,
            overall_success: false,
            phases: Vec::new(),
            fatal_error: None,
        }
    }

    /// Append a phase result
    pub fn record(&mut self, result: PhaseResult) {
        self.phases.push(result);
    }

    /// Close out a completed run: overall success is the logical AND across
    /// all recorded phases
    pub fn finalize(&mut self) {
        self.finished_at = Some(Utc::now());
        self.overall_success = !self.phases.is_empty()
            && self.fatal_error.is_none()
            && self.phases.iter().all(|p| p.success);
    }

    /// Close out an aborted run
    pub fn mark_fatal(&mut self, error: impl Into<String>) {
        self.finished_at = Some(Utc::now());
        self.stage = Stage::Failed;
        self.overall_success = false;
        self.fatal_error = Some(error.into());
    }
}
