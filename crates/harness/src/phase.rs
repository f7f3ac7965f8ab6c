//! Subprocess test phases
//!
//! The frontend unit-test and end-to-end phases are external commands run to
//! completion. A non-zero exit marks the phase failed but never aborts the
//! run; the report keeps the output tails for diagnosis.

use serde_json::json;
use std::path::PathBuf;
use std::time::Instant;
use tokio::process::Command;
use tracing::info;

use paasport_common::{Phase, PhaseResult};

/// Lines of stdout/stderr kept in a failed phase's report payload
const TAIL_LINES: usize = 20;

/// An external command run to completion as one phase
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: Vec<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args,
            cwd: cwd.into(),
        }
    }

    /// Split a whitespace-separated command line into a spec
    pub fn parse(command: &str, cwd: impl Into<PathBuf>) -> Option<Self> {
        let mut parts = command.split_whitespace().map(String::from);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
            cwd: cwd.into(),
        })
    }
}

/// Run one subprocess phase and capture its outcome
pub async fn run_subprocess_phase(phase: Phase, spec: &CommandSpec) -> PhaseResult {
    let start = Instant::now();
    info!(
        "Running {} phase: {} {}",
        phase,
        spec.program,
        spec.args.join(" ")
    );

    let output = Command::new(&spec.program)
        .args(&spec.args)
        .current_dir(&spec.cwd)
        .output()
        .await;

    match output {
        Ok(output) => {
            let success = output.status.success();
            let detail = json!({
                "exit_code": output.status.code(),
                "stdout_tail": tail(&String::from_utf8_lossy(&output.stdout), TAIL_LINES),
                "stderr_tail": tail(&String::from_utf8_lossy(&output.stderr), TAIL_LINES),
            });

            PhaseResult {
                phase,
                success,
                duration_ms: start.elapsed().as_millis() as u64,
                detail,
                error: if success {
                    None
                } else {
                    Some(format!("{} exited with {}", spec.program, output.status))
                },
            }
        }
        Err(e) => PhaseResult::failed(
            phase,
            start.elapsed(),
            format!("failed to run {}: {}", spec.program, e),
        ),
    }
}

/// Last `n` lines of `text`
fn tail(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_keeps_the_last_lines() {
        let text = (1..=30).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        let tail = tail(&text, 20);
        assert!(tail.starts_with("11"));
        assert!(tail.ends_with("30"));
        assert_eq!(tail.lines().count(), 20);
    }

    #[test]
    fn tail_of_short_text_is_the_whole_text() {
        assert_eq!(tail("one\ntwo", 20), "one\ntwo");
        assert_eq!(tail("", 20), "");
    }

    #[test]
    fn parse_splits_program_and_args() {
        let spec = CommandSpec::parse("npm run test -- --watchAll=false", ".").unwrap();
        assert_eq!(spec.program, "npm");
        assert_eq!(spec.args, vec!["run", "test", "--", "--watchAll=false"]);
    }

    #[test]
    fn parse_rejects_empty_command() {
        assert!(CommandSpec::parse("   ", ".").is_none());
    }
}
