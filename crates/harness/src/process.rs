//! Service process management - spawning, readiness banners, teardown

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

use paasport_common::{Error, Liveness, Result};

/// Configuration for one spawned service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Service name used in logs and errors ("backend", "frontend")
    pub name: String,

    /// Program to launch
    pub program: String,

    /// Arguments passed to the program
    pub args: Vec<String>,

    /// Working directory (the service's checkout)
    pub cwd: PathBuf,

    /// Substring of a stdout line that signals the service is ready
    pub ready_marker: String,

    /// When set, readiness additionally requires `:{port}` to have appeared
    /// in the output (dev-server clusters announce several ports)
    pub ready_port: Option<u16>,

    /// How long to wait for the readiness signal
    pub startup_timeout: Duration,
}

/// Owned handle to a running service process
///
/// The handle is the only owner of the child. It is terminated exactly once:
/// either through [`ServiceHandle::stop`], or by the kill-on-drop backstop if
/// the handle is dropped while the child is still running.
pub struct ServiceHandle {
    name: String,
    child: Child,
    state: Liveness,
}

impl ServiceHandle {
    /// Spawn the service and wait for its readiness banner
    ///
    /// Blocks (without busy-looping) until the marker appears on stdout or
    /// the startup timeout elapses. Stderr is surfaced as diagnostics but
    /// never fails startup on its own. On any failure the child is killed
    /// before the error is returned.
    pub async fn spawn(config: &ServiceConfig) -> Result<Self> {
        info!(
            "Starting {} ({} {})",
            config.name,
            config.program,
            config.args.join(" ")
        );

        let mut cmd = Command::new(&config.program);
        cmd.args(&config.args)
            .current_dir(&config.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| Error::Spawn {
            service: config.name.clone(),
            message: e.to_string(),
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Internal("child stdout was not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::Internal("child stderr was not captured".to_string()))?;

        // Surface stderr as diagnostics for the whole process lifetime
        let stderr_name = config.name.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                warn!("[{} stderr] {}", stderr_name, line);
            }
        });

        let mut handle = Self {
            name: config.name.clone(),
            child,
            state: Liveness::Starting,
        };

        match handle.await_ready(stdout, config).await {
            Ok(()) => {
                handle.state = Liveness::Ready;
                info!("{} is ready", config.name);
                Ok(handle)
            }
            Err(e) => {
                handle.state = Liveness::Failed;
                handle.stop().await;
                Err(e)
            }
        }
    }

    /// Watch stdout until the readiness marker (and port, if required) appears
    async fn await_ready(&mut self, stdout: ChildStdout, config: &ServiceConfig) -> Result<()> {
        let deadline = Instant::now() + config.startup_timeout;
        let mut lines = BufReader::new(stdout).lines();

        let port_needle = config.ready_port.map(|p| format!(":{}", p));
        let mut port_seen = port_needle.is_none();
        let mut marker_seen = false;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(Error::StartupTimeout {
                    service: self.name.clone(),
                    seconds: config.startup_timeout.as_secs(),
                });
            }

            let line = match timeout(remaining, lines.next_line()).await {
                Err(_) => {
                    return Err(Error::StartupTimeout {
                        service: self.name.clone(),
                        seconds: config.startup_timeout.as_secs(),
                    })
                }
                Ok(Ok(Some(line))) => line,
                // stdout closed: the process died before it ever became ready
                Ok(Ok(None)) => {
                    return Err(Error::EarlyExit {
                        service: self.name.clone(),
                    })
                }
                Ok(Err(e)) => return Err(e.into()),
            };

            debug!("[{}] {}", self.name, line);

            if line.contains(&config.ready_marker) {
                marker_seen = true;
            }
            if let Some(needle) = &port_needle {
                if line.contains(needle) {
                    port_seen = true;
                }
            }

            if marker_seen && port_seen {
                // Keep draining stdout or the pipe backs up and stalls the child
                let name = self.name.clone();
                tokio::spawn(async move {
                    while let Ok(Some(line)) = lines.next_line().await {
                        debug!("[{}] {}", name, line);
                    }
                });
                return Ok(());
            }
        }
    }

    /// OS process id, if the child is still running
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> Liveness {
        self.state
    }

    /// Stop the service: SIGTERM with a short grace window, then a hard kill
    ///
    /// Idempotent; the child is terminated and reaped at most once.
    pub async fn stop(&mut self) {
        if self.state == Liveness::Terminated {
            return;
        }

        info!("Stopping {} (pid {:?})", self.name, self.child.id());

        #[cfg(unix)]
        if let Some(pid) = self.child.id() {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok() {
                if let Ok(Ok(status)) =
                    timeout(Duration::from_millis(500), self.child.wait()).await
                {
                    debug!("{} exited with {}", self.name, status);
                    self.state = Liveness::Terminated;
                    return;
                }
            }
        }

        let _ = self.child.start_kill();
        let _ = self.child.wait().await;
        self.state = Liveness::Terminated;
    }
}
