#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use wfexec::engine::OrchestratorOptions;
use wfexec::exec::ExecutorOptions;
use wfexec::job::{FileRef, JobDescriptor, RawJobDescriptor};
use wfexec::monitor::MonitorOptions;

/// Builder for job descriptors, producing either the validated form or the
/// JSON payload the worker reads from the store.
pub struct JobDescriptorBuilder {
    raw: RawJobDescriptor,
}

impl JobDescriptorBuilder {
    pub fn new(executable: &str) -> Self {
        Self {
            raw: RawJobDescriptor {
                executable: executable.to_string(),
                ..RawJobDescriptor::default()
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.raw.name = name.to_string();
        self
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.raw.args.push(arg.to_string());
        self
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.raw.args.extend(args.iter().map(|a| a.to_string()));
        self
    }

    pub fn stdout(mut self, path: &str) -> Self {
        self.raw.stdout = Some(PathBuf::from(path));
        self
    }

    pub fn stdout_append(mut self, path: &str) -> Self {
        self.raw.stdout_append = Some(PathBuf::from(path));
        self
    }

    pub fn stderr(mut self, path: &str) -> Self {
        self.raw.stderr = Some(PathBuf::from(path));
        self
    }

    pub fn stderr_append(mut self, path: &str) -> Self {
        self.raw.stderr_append = Some(PathBuf::from(path));
        self
    }

    pub fn input(mut self, name: &str) -> Self {
        self.raw.inputs.push(FileRef {
            name: PathBuf::from(name),
        });
        self
    }

    pub fn output(mut self, name: &str) -> Self {
        self.raw.outputs.push(FileRef {
            name: PathBuf::from(name),
        });
        self
    }

    pub fn raw(self) -> RawJobDescriptor {
        self.raw
    }

    pub fn json(&self) -> String {
        serde_json::to_string(&self.raw).expect("descriptor serializes")
    }

    pub fn build(self) -> JobDescriptor {
        JobDescriptor::try_from(self.raw).expect("Failed to build valid descriptor from builder")
    }
}

/// Builder for `OrchestratorOptions` with test-friendly defaults: no input
/// wait, no network monitor, a short retrieve timeout.
pub struct OrchestratorOptionsBuilder {
    options: OrchestratorOptions,
}

impl OrchestratorOptionsBuilder {
    pub fn new(dir: &Path) -> Self {
        Self {
            options: OrchestratorOptions {
                retrieve_timeout: Duration::from_secs(1),
                wait_for_inputs: false,
                file_watch_retries: 3,
                max_backoff_round_exponent: 16,
                input_dir: dir.to_path_buf(),
                output_dir: dir.to_path_buf(),
                network_monitor: None,
            },
        }
    }

    pub fn retrieve_timeout(mut self, timeout: Duration) -> Self {
        self.options.retrieve_timeout = timeout;
        self
    }

    pub fn wait_for_inputs(mut self, retries: u32) -> Self {
        self.options.wait_for_inputs = true;
        self.options.file_watch_retries = retries;
        self
    }

    pub fn build(self) -> OrchestratorOptions {
        self.options
    }
}

/// Executor options rooted in `dir`, with zero backoff so retries are
/// immediate.
pub fn executor_options(dir: &Path, retries: u32) -> ExecutorOptions {
    ExecutorOptions {
        work_dir: dir.to_path_buf(),
        stdout_log: dir.join("logs").join("job__stdout.log"),
        stderr_log: dir.join("logs").join("job__stderr.log"),
        retries,
        backoff_seed: Duration::ZERO,
        monitor: MonitorOptions::new(Duration::from_millis(50)),
    }
}
