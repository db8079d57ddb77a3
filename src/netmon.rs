// src/netmon.rs

//! Optional external network monitor.
//!
//! Everything here is best effort: a monitor that cannot be started or
//! stopped is logged and otherwise ignored.

use std::fs::File;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// How to launch the monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkMonitorOptions {
    pub program: String,
    pub args: Vec<String>,
    /// Capture file for the monitor's stdout.
    pub output: PathBuf,
}

impl NetworkMonitorOptions {
    /// `nethogs` in trace mode, refreshing once per probe interval.
    pub fn nethogs(output: impl Into<PathBuf>, probe_interval: Duration) -> Self {
        let refresh_secs = probe_interval.as_secs().max(1);
        Self {
            program: "nethogs".to_string(),
            args: vec!["-t".to_string(), "-d".to_string(), refresh_secs.to_string()],
            output: output.into(),
        }
    }
}

/// A running network monitor process.
#[derive(Debug)]
pub struct NetworkMonitor {
    child: Child,
}

impl NetworkMonitor {
    /// Launch the monitor; `None` (with a warning) if it cannot be started.
    pub fn start(options: &NetworkMonitorOptions) -> Option<Self> {
        match Self::try_start(options) {
            Ok(monitor) => Some(monitor),
            Err(e) => {
                warn!(program = %options.program, error = %e, "network monitor not started");
                None
            }
        }
    }

    fn try_start(options: &NetworkMonitorOptions) -> Result<Self> {
        if let Some(parent) = options.output.parent() {
            std::fs::create_dir_all(parent).with_context(|| format!("creating dir {:?}", parent))?;
        }
        let out = File::create(&options.output)
            .with_context(|| format!("creating file {:?}", options.output))?;

        let child = Command::new(&options.program)
            .args(&options.args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(out))
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawning '{}'", options.program))?;

        info!(program = %options.program, pid = ?child.id(), "network monitor started");
        Ok(Self { child })
    }

    /// Kill the monitor and reap it.
    pub async fn stop(mut self) {
        if let Err(e) = self.child.start_kill() {
            debug!(error = %e, "network monitor already gone");
            return;
        }
        match self.child.wait().await {
            Ok(status) => debug!(?status, "network monitor stopped"),
            Err(e) => warn!(error = %e, "waiting for network monitor failed"),
        }
    }
}
