//! Run orchestration - services up, phases through, cleanup always

use std::path::PathBuf;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use paasport_common::{Phase, PhaseResult, Report, Result, Stage};

use crate::api::{ApiConfig, ApiProber};
use crate::phase::{self, CommandSpec};
use crate::prereq;
use crate::process::{ServiceConfig, ServiceHandle};
use crate::readiness;
use crate::report;

/// Configuration for one harness run
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Backend service under test
    pub backend: ServiceConfig,

    /// Frontend dev-server cluster (the shell process)
    pub frontend: ServiceConfig,

    /// API probe settings
    pub api: ApiConfig,

    /// Frontend shell URL, polled before the end-to-end phase
    pub frontend_url: String,

    /// Frontend unit-test phase command
    pub frontend_tests: CommandSpec,

    /// End-to-end phase command
    pub e2e_tests: CommandSpec,

    /// Where the JSON report is written
    pub report_path: PathBuf,

    /// Budget for the pre-e2e readiness gate
    pub readiness_timeout: Duration,

    /// Poll interval for the readiness gate
    pub poll_interval: Duration,

    /// Probe already-running services instead of spawning them
    pub attach: bool,

    /// Run only the API probe phase
    pub api_only: bool,

    pub skip_frontend_tests: bool,
    pub skip_e2e: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            backend: ServiceConfig {
                name: "backend".to_string(),
                program: "npm".to_string(),
                args: vec!["run".to_string(), "dev".to_string()],
                cwd: PathBuf::from("backend"),
                ready_marker: "Server running on port".to_string(),
                ready_port: None,
                startup_timeout: Duration::from_secs(30),
            },
            frontend: ServiceConfig {
                name: "frontend".to_string(),
                program: "npm".to_string(),
                args: vec!["run".to_string(), "dev".to_string()],
                cwd: PathBuf::from("."),
                ready_marker: "Ready".to_string(),
                ready_port: Some(3000),
                startup_timeout: Duration::from_secs(60),
            },
            api: ApiConfig::default(),
            frontend_url: "http://localhost:3000".to_string(),
            frontend_tests: CommandSpec::new(
                "npm",
                vec![
                    "run".to_string(),
                    "test".to_string(),
                    "--".to_string(),
                    "--watchAll=false".to_string(),
                ],
                ".",
            ),
            e2e_tests: CommandSpec::new(
                "npx",
                vec!["playwright".to_string(), "test".to_string()],
                ".",
            ),
            report_path: PathBuf::from("test-results/integration-report.json"),
            readiness_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(2),
            attach: false,
            api_only: false,
            skip_frontend_tests: false,
            skip_e2e: false,
        }
    }
}

/// One-shot orchestrator for a full integration run
///
/// Owns the spawned services for the duration of the run. Whatever happens
/// inside a run - prerequisite failure, startup timeout, failing phases -
/// [`Harness::run`] releases every spawned process exactly once before it
/// returns.
pub struct Harness {
    config: HarnessConfig,
    backend: Option<ServiceHandle>,
    frontend: Option<ServiceHandle>,
    stage: Stage,
}

impl Harness {
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            backend: None,
            frontend: None,
            stage: Stage::Init,
        }
    }

    /// Execute the full run and return the aggregated report
    ///
    /// Fatal errors abort the remaining run and are returned after cleanup;
    /// an interrupted report is still persisted best-effort, marked failed.
    pub async fn run(&mut self) -> Result<Report> {
        let mut report = Report::new(paasport_common::VERSION);
        let outcome = self.execute(&mut report).await;

        self.cleanup().await;
        self.stage = Stage::CleanedUp;

        match outcome {
            Ok(()) => Ok(report),
            Err(e) => {
                report.mark_fatal(e.to_string());
                if let Err(write_err) = report::write_report(&report, &self.config.report_path) {
                    warn!("Could not persist failure report: {}", write_err);
                }
                Err(e)
            }
        }
    }

    async fn execute(&mut self, report: &mut Report) -> Result<()> {
        if self.config.attach {
            info!("Attach mode: probing already-running services");
        } else {
            prereq::check_prerequisites(&self.config)?;
            self.advance(report, Stage::PrerequisitesChecked);

            self.advance(report, Stage::BackendStarting);
            self.backend = Some(ServiceHandle::spawn(&self.config.backend).await?);
            self.advance(report, Stage::BackendReady);

            self.advance(report, Stage::FrontendStarting);
            self.frontend = Some(ServiceHandle::spawn(&self.config.frontend).await?);
            self.advance(report, Stage::FrontendReady);
        }

        self.advance(report, Stage::RunningPhases);
        self.run_phases(report).await;

        report.finalize();
        self.advance(report, Stage::ReportGenerated);
        report::print_summary(report);
        report::write_report(report, &self.config.report_path)?;

        Ok(())
    }

    /// Sequential phases with per-phase failure isolation
    async fn run_phases(&self, report: &mut Report) {
        report.record(self.run_api_phase().await);

        if !self.config.api_only && !self.config.skip_frontend_tests {
            report.record(phase::run_subprocess_phase(Phase::FrontendUnit, &self.config.frontend_tests).await);
        }

        if !self.config.api_only && !self.config.skip_e2e {
            report.record(self.run_e2e_phase().await);
        }
    }

    async fn run_api_phase(&self) -> PhaseResult {
        let start = Instant::now();
        match ApiProber::new(self.config.api.clone()) {
            Ok(prober) => {
                let api = prober.run_all().await;
                PhaseResult::from_api(&api, start.elapsed())
            }
            Err(e) => PhaseResult::failed(Phase::ApiIntegration, start.elapsed(), e.to_string()),
        }
    }

    /// Gate on the frontend shell before handing over to the browser tests
    async fn run_e2e_phase(&self) -> PhaseResult {
        let start = Instant::now();

        if let Err(e) = readiness::wait_for_url(
            &self.config.frontend_url,
            self.config.readiness_timeout,
            self.config.poll_interval,
        )
        .await
        {
            return PhaseResult::failed(
                Phase::EndToEnd,
                start.elapsed(),
                format!("frontend not ready: {}", e),
            );
        }

        phase::run_subprocess_phase(Phase::EndToEnd, &self.config.e2e_tests).await
    }

    fn advance(&mut self, report: &mut Report, stage: Stage) {
        debug!("stage: {} -> {}", self.stage, stage);
        self.stage = stage;
        report.stage = stage;
    }

    /// Terminate every spawned service, exactly once
    pub async fn cleanup(&mut self) {
        if let Some(mut frontend) = self.frontend.take() {
            frontend.stop().await;
        }
        if let Some(mut backend) = self.backend.take() {
            backend.stop().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_console_topology() {
        let config = HarnessConfig::default();

        assert_eq!(config.backend.startup_timeout, Duration::from_secs(30));
        assert_eq!(config.frontend.startup_timeout, Duration::from_secs(60));
        assert_eq!(config.frontend.ready_port, Some(3000));
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.api.timeout, Duration::from_secs(10));
        assert!(!config.attach);
    }
}
