//! Paasport harness CLI entry point
//!
//! Running the binary executes one full integration run. Exit codes:
//! 0 - run completed (phase failures are in the report, not the exit code)
//! 1 - run completed with failures and --strict was set
//! 2 - fatal orchestration error (prerequisites, startup timeout)

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use paasport_common::{Error, Report, Result};
use paasport_harness::phase::CommandSpec;
use paasport_harness::{Harness, HarnessConfig};

#[derive(Parser, Debug)]
#[command(name = "paasport-harness")]
#[command(about = "Integration test harness for the Paasport console")]
struct Args {
    /// Backend checkout directory
    #[arg(long, default_value = "backend")]
    backend_dir: PathBuf,

    /// Frontend checkout directory
    #[arg(long, default_value = ".")]
    frontend_dir: PathBuf,

    /// Backend base URL for API probes
    #[arg(long, default_value = "http://localhost:8000")]
    backend_url: String,

    /// Frontend shell URL, polled before the end-to-end phase
    #[arg(long, default_value = "http://localhost:3000")]
    frontend_url: String,

    /// Command used to launch the backend
    #[arg(long, default_value = "npm run dev")]
    backend_cmd: String,

    /// Command used to launch the frontend dev server
    #[arg(long, default_value = "npm run dev")]
    frontend_cmd: String,

    /// Command for the frontend unit-test phase
    #[arg(long, default_value = "npm run test -- --watchAll=false")]
    frontend_test_cmd: String,

    /// Command for the end-to-end phase
    #[arg(long, default_value = "npx playwright test")]
    e2e_cmd: String,

    /// Stdout marker that signals backend readiness
    #[arg(long, default_value = "Server running on port")]
    backend_ready_marker: String,

    /// Stdout marker that signals frontend readiness
    #[arg(long, default_value = "Ready")]
    frontend_ready_marker: String,

    /// Backend startup timeout in seconds
    #[arg(long, default_value = "30")]
    backend_timeout: u64,

    /// Frontend startup timeout in seconds
    #[arg(long, default_value = "60")]
    frontend_timeout: u64,

    /// Login probe username
    #[arg(long, env = "PAASPORT_USERNAME", default_value = "testuser")]
    username: String,

    /// Login probe password
    #[arg(long, env = "PAASPORT_PASSWORD", default_value = "testpass123")]
    password: String,

    /// Probe already-running services instead of spawning them
    #[arg(long)]
    attach: bool,

    /// Run only the API probe phase
    #[arg(long)]
    api_only: bool,

    /// Skip the frontend unit-test phase
    #[arg(long)]
    skip_frontend_tests: bool,

    /// Skip the end-to-end phase
    #[arg(long)]
    skip_e2e: bool,

    /// Exit non-zero when any phase fails
    #[arg(long)]
    strict: bool,

    /// Report output path
    #[arg(short, long, default_value = "test-results/integration-report.json")]
    report: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let args = Args::parse();
    let strict = args.strict;

    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    let result = rt.block_on(async_main(args));

    match result {
        Ok(report) => {
            if report.overall_success || !strict {
                std::process::exit(0);
            } else {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

async fn async_main(args: Args) -> Result<Report> {
    let config = build_config(&args)?;
    let mut harness = Harness::new(config);
    harness.run().await
}

fn build_config(args: &Args) -> Result<HarnessConfig> {
    let backend_cmd = parse_command(&args.backend_cmd)?;
    let frontend_cmd = parse_command(&args.frontend_cmd)?;
    let frontend_tests = parse_command(&args.frontend_test_cmd)?;
    let e2e_tests = parse_command(&args.e2e_cmd)?;

    let mut config = HarnessConfig::default();

    config.backend.program = backend_cmd.program;
    config.backend.args = backend_cmd.args;
    config.backend.cwd = args.backend_dir.clone();
    config.backend.ready_marker = args.backend_ready_marker.clone();
    config.backend.startup_timeout = Duration::from_secs(args.backend_timeout);

    config.frontend.program = frontend_cmd.program;
    config.frontend.args = frontend_cmd.args;
    config.frontend.cwd = args.frontend_dir.clone();
    config.frontend.ready_marker = args.frontend_ready_marker.clone();
    config.frontend.ready_port = Some(port_from_url(&args.frontend_url).unwrap_or(3000));
    config.frontend.startup_timeout = Duration::from_secs(args.frontend_timeout);

    config.api.base_url = args.backend_url.clone();
    config.api.username = args.username.clone();
    config.api.password = args.password.clone();

    config.frontend_url = args.frontend_url.clone();
    config.frontend_tests = CommandSpec {
        cwd: args.frontend_dir.clone(),
        ..frontend_tests
    };
    config.e2e_tests = CommandSpec {
        cwd: args.frontend_dir.clone(),
        ..e2e_tests
    };
    config.report_path = args.report.clone();
    config.attach = args.attach;
    config.api_only = args.api_only;
    config.skip_frontend_tests = args.skip_frontend_tests;
    config.skip_e2e = args.skip_e2e;

    Ok(config)
}

fn parse_command(command: &str) -> Result<CommandSpec> {
    CommandSpec::parse(command, ".")
        .ok_or_else(|| Error::Internal(format!("empty command: {:?}", command)))
}

/// Best-effort port extraction from a URL like `http://localhost:3000`
fn port_from_url(url: &str) -> Option<u16> {
    url.rsplit(':').next().and_then(|p| {
        p.trim_end_matches('/')
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect::<String>()
            .parse()
            .ok()
    })
}
