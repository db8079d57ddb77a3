// src/monitor/sysinfo_provider.rs

//! Telemetry provider backed by `sysinfo`, plus `/proc` for network devices.

use std::collections::{HashMap, VecDeque};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use sysinfo::{Pid as SysPid, Process, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, System};

use super::netdev::parse_net_dev;
use super::telemetry::{
    IoCounters, NetDevCounters, Pid, ProcessTelemetry, TelemetryError, TelemetryResult, Usage,
};

/// Production telemetry provider.
///
/// Tree discovery, command lines and IO share one `System`. Usage samples
/// keep a `System` per pid: sysinfo derives a process's CPU share from the
/// global CPU time elapsed between two refreshes, and both refreshes must
/// belong to the same pid for the ratio to hold. The first usage sample of
/// a pid therefore reads 0%.
#[derive(Debug)]
pub struct SysinfoTelemetry {
    system: Mutex<System>,
    usage_systems: Mutex<HashMap<Pid, System>>,
    proc_root: PathBuf,
}

impl Default for SysinfoTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoTelemetry {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
            usage_systems: Mutex::new(HashMap::new()),
            proc_root: PathBuf::from("/proc"),
        }
    }

    fn lock(&self, pid: Pid) -> TelemetryResult<MutexGuard<'_, System>> {
        self.system.lock().map_err(|_| poisoned(pid))
    }

    /// Refresh a single process and run `f` on it.
    fn with_process<T>(&self, pid: Pid, f: impl FnOnce(&Process) -> T) -> TelemetryResult<T> {
        let mut system = self.lock(pid)?;
        let spid = SysPid::from_u32(pid);
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[spid]),
            ProcessRefreshKind::everything(),
        );

        match system.process(spid) {
            Some(p) if p.status() != ProcessStatus::Zombie => Ok(f(p)),
            _ => Err(TelemetryError::NotFound(pid)),
        }
    }
}

impl ProcessTelemetry for SysinfoTelemetry {
    fn descendants(&self, root: Pid) -> TelemetryResult<Vec<Pid>> {
        let mut system = self.lock(root)?;
        system.refresh_processes_specifics(ProcessesToUpdate::All, ProcessRefreshKind::new());

        let root = SysPid::from_u32(root);
        if system.process(root).is_none() {
            return Err(TelemetryError::NotFound(root.as_u32()));
        }

        let mut children: HashMap<SysPid, Vec<SysPid>> = HashMap::new();
        for (pid, process) in system.processes() {
            // Linux threads show up as processes; only real processes count.
            if process.thread_kind().is_some() || process.status() == ProcessStatus::Zombie {
                continue;
            }
            if let Some(parent) = process.parent() {
                children.entry(parent).or_default().push(*pid);
            }
        }

        let mut found = Vec::new();
        let mut queue: VecDeque<SysPid> = VecDeque::from([root]);
        while let Some(pid) = queue.pop_front() {
            if let Some(kids) = children.get(&pid) {
                for kid in kids {
                    found.push(kid.as_u32());
                    queue.push_back(*kid);
                }
            }
        }

        Ok(found)
    }

    fn command_line(&self, pid: Pid) -> TelemetryResult<Vec<String>> {
        self.with_process(pid, |p| p.cmd().iter().map(|s| s.to_string_lossy().into_owned()).collect())
    }

    fn io(&self, pid: Pid) -> TelemetryResult<IoCounters> {
        self.with_process(pid, |p| {
            let disk = p.disk_usage();
            IoCounters {
                read_bytes: disk.read_bytes,
                written_bytes: disk.written_bytes,
                total_read_bytes: disk.total_read_bytes,
                total_written_bytes: disk.total_written_bytes,
            }
        })
    }

    fn network(&self, pid: Pid) -> TelemetryResult<Vec<NetDevCounters>> {
        // Outside Linux there is no such file; the sampler then stops as if
        // the process were gone.
        let path = self.proc_root.join(pid.to_string()).join("net").join("dev");
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(parse_net_dev(&contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(TelemetryError::NotFound(pid)),
            Err(e) => Err(TelemetryError::Failed {
                pid,
                reason: format!("reading {:?}: {e}", path),
            }),
        }
    }

    fn usage(&self, pid: Pid) -> TelemetryResult<Usage> {
        let mut systems = self.usage_systems.lock().map_err(|_| poisoned(pid))?;
        let system = systems.entry(pid).or_insert_with(System::new);

        let spid = SysPid::from_u32(pid);
        system.refresh_cpu_usage();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[spid]),
            ProcessRefreshKind::new().with_cpu().with_memory(),
        );

        let usage = system
            .process(spid)
            .filter(|p| p.status() != ProcessStatus::Zombie)
            .map(|p| Usage {
                cpu_percent: p.cpu_usage(),
                memory_bytes: p.memory(),
                virtual_memory_bytes: p.virtual_memory(),
                elapsed: Duration::from_secs(p.run_time()),
            });

        match usage {
            Some(usage) => Ok(usage),
            None => {
                systems.remove(&pid);
                Err(TelemetryError::NotFound(pid))
            }
        }
    }
}

fn poisoned(pid: Pid) -> TelemetryError {
    TelemetryError::Failed {
        pid,
        reason: "telemetry state poisoned".to_string(),
    }
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;
    use std::process::{Command, Stdio};
    use std::thread::sleep;

    #[test]
    fn busy_process_reports_cpu_share() {
        let mut child = Command::new("sh")
            .args(["-c", "while :; do :; done"])
            .stdout(Stdio::null())
            .spawn()
            .expect("spawn busy loop");
        let pid = child.id();
        let telemetry = SysinfoTelemetry::new();

        let mut samples = Vec::new();
        for _ in 0..4 {
            samples.push(telemetry.usage(pid).map(|u| u.cpu_percent));
            sleep(Duration::from_millis(600));
        }
        let _ = child.kill();
        let _ = child.wait();

        let samples: Vec<f32> = samples
            .into_iter()
            .collect::<TelemetryResult<_>>()
            .expect("busy process is alive while sampled");
        assert!(
            samples[1..].iter().any(|cpu| *cpu > 0.0),
            "cpu samples {samples:?}"
        );
    }

    #[test]
    fn usage_of_unknown_pid_is_not_found() {
        let telemetry = SysinfoTelemetry::new();
        let err = telemetry.usage(u32::MAX - 1).unwrap_err();
        assert!(err.is_not_found());
        assert!(telemetry.usage_systems.lock().unwrap().is_empty());
    }
}
