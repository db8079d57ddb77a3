// src/exec/output.rs

//! Per-attempt output wiring: each job stream is copied to the task's log
//! capture file and, optionally, to the descriptor's redirect file.

use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};

use crate::errors::{Result, WorkerError};
use crate::job::OutputTarget;

/// How a sink file is opened for one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkSpec {
    pub path: PathBuf,
    pub append: bool,
}

impl SinkSpec {
    /// Log capture file: fresh on the first attempt, appended to afterwards.
    pub fn capture(path: impl Into<PathBuf>, first_attempt: bool) -> Self {
        Self {
            path: path.into(),
            append: !first_attempt,
        }
    }

    /// Descriptor redirect, resolved against `base` when relative.
    ///
    /// `Truncate` targets behave like capture files; `Append` targets are
    /// always appended to.
    pub fn redirect(target: &OutputTarget, base: &Path, first_attempt: bool) -> Self {
        let path = base.join(target.path());
        match target {
            OutputTarget::Truncate(_) => Self::capture(path, first_attempt),
            OutputTarget::Append(_) => Self { path, append: true },
        }
    }

    pub async fn open(&self) -> std::io::Result<File> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut options = OpenOptions::new();
        options.create(true);
        if self.append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }
        options.open(&self.path).await
    }
}

/// Open every sink of one stream.
///
/// Fails with [`WorkerError::Output`] on the first sink that cannot be
/// opened; files opened before it are closed again.
pub async fn open_sinks(specs: &[SinkSpec]) -> Result<Vec<(PathBuf, File)>> {
    let mut files = Vec::with_capacity(specs.len());
    for spec in specs {
        let file = spec.open().await.map_err(|source| WorkerError::Output {
            path: spec.path.clone(),
            source,
        })?;
        files.push((spec.path.clone(), file));
    }
    Ok(files)
}

/// Copy `reader` into every sink until EOF.
///
/// A sink that fails to write is dropped with a warning; the others keep
/// receiving data and the job is never affected.
pub async fn tee<R>(mut reader: R, mut sinks: Vec<(PathBuf, File)>, stream: &'static str)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; 8192];
    let mut total: u64 = 0;

    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                warn!(stream, error = %e, "reading job output failed");
                break;
            }
        };
        total += n as u64;

        let mut i = 0;
        while i < sinks.len() {
            if let Err(e) = sinks[i].1.write_all(&buf[..n]).await {
                warn!(stream, path = ?sinks[i].0, error = %e, "writing job output failed; dropping sink");
                sinks.remove(i);
            } else {
                i += 1;
            }
        }
    }

    for (path, file) in sinks.iter_mut() {
        if let Err(e) = file.flush().await {
            warn!(stream, path = ?path, error = %e, "flushing job output failed");
        }
    }
    debug!(stream, bytes = total, "job output stream closed");
}
