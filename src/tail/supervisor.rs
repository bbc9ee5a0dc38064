//! Follower worker threads
//!
//! Each configured source gets a dedicated OS thread (not a tokio task): the
//! follow loop does blocking file I/O and sleeps between polls, which would
//! stall the async runtime. Workers only talk to the rest of the program
//! through the aggregation channel.
//!
//! Failures are isolated per worker. Anything that escapes the follow loop -
//! a read error or a panic - is caught at the thread boundary, reported as a
//! single `[ERROR] ...` line in that source's panel, and the thread exits.

use super::{Follow, StopSignal, TailError};
use crate::events::{EventSender, LogEvent, SourceId};
use anyhow::{Context, Result};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Counters shared between a worker thread and the supervisor
#[derive(Debug, Default)]
pub struct WorkerMetrics {
    lines_sent: AtomicU64,
    rotations: AtomicU64,
    truncations: AtomicU64,
    reopens: AtomicU64,
    finished: AtomicBool,
}

impl WorkerMetrics {
    pub fn record_line(&self) {
        self.lines_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rotation(&self) {
        self.rotations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_truncation(&self) {
        self.truncations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reopen(&self) {
        self.reopens.fetch_add(1, Ordering::Relaxed);
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            lines_sent: self.lines_sent.load(Ordering::Relaxed),
            rotations: self.rotations.load(Ordering::Relaxed),
            truncations: self.truncations.load(Ordering::Relaxed),
            reopens: self.reopens.load(Ordering::Relaxed),
            finished_workers: u64::from(self.is_finished()),
        }
    }
}

/// Point-in-time copy of worker counters (summable across workers)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub lines_sent: u64,
    pub rotations: u64,
    pub truncations: u64,
    pub reopens: u64,
    pub finished_workers: u64,
}

impl std::ops::Add for MetricsSnapshot {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            lines_sent: self.lines_sent + rhs.lines_sent,
            rotations: self.rotations + rhs.rotations,
            truncations: self.truncations + rhs.truncations,
            reopens: self.reopens + rhs.reopens,
            finished_workers: self.finished_workers + rhs.finished_workers,
        }
    }
}

/// One running follower
struct WorkerHandle {
    path: PathBuf,
    stop: StopSignal,
    metrics: Arc<WorkerMetrics>,
    thread: Option<JoinHandle<()>>,
}

/// Owns every follower thread for the lifetime of the process
pub struct Supervisor {
    workers: Vec<WorkerHandle>,
    poll_interval: Duration,
}

impl Supervisor {
    /// Start one follower thread per path; `SourceId(i)` is the i-th path
    pub fn spawn(paths: &[PathBuf], poll_interval: Duration, tx: EventSender) -> Result<Self> {
        let mut workers = Vec::with_capacity(paths.len());

        for (index, path) in paths.iter().enumerate() {
            let source = SourceId(index);
            let stop = StopSignal::new();
            let metrics = Arc::new(WorkerMetrics::default());

            let follow = Follow::new(path.clone(), poll_interval, stop.clone())
                .with_metrics(metrics.clone());
            let worker_tx = tx.clone();
            let worker_metrics = metrics.clone();

            let thread = thread::Builder::new()
                .name(thread_name(path))
                .spawn(move || {
                    run_guarded(source, &worker_tx, &worker_metrics, || {
                        follow_into_channel(source, follow, &worker_tx, &worker_metrics)
                    });
                })
                .with_context(|| format!("Failed to spawn follower for {}", path.display()))?;

            tracing::info!("Following {} as {}", path.display(), source);
            workers.push(WorkerHandle {
                path: path.clone(),
                stop,
                metrics,
                thread: Some(thread),
            });
        }

        Ok(Self {
            workers,
            poll_interval,
        })
    }

    /// Summed counters across all workers
    pub fn totals(&self) -> MetricsSnapshot {
        self.workers
            .iter()
            .map(|w| w.metrics.snapshot())
            .fold(MetricsSnapshot::default(), |acc, s| acc + s)
    }

    /// Raise every worker's stop signal without waiting
    pub fn stop_all(&self) {
        for worker in &self.workers {
            worker.stop.stop();
        }
    }

    /// Stop every worker and join its thread
    ///
    /// Each worker notices its signal within one poll interval.
    pub fn shutdown(mut self) {
        self.stop_all();
        tracing::debug!(
            "Stopping {} followers (poll interval {:?})",
            self.workers.len(),
            self.poll_interval
        );

        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                if thread.join().is_err() {
                    tracing::warn!("Follower for {} did not exit cleanly", worker.path.display());
                }
            }
        }
        tracing::debug!("All followers stopped");
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.stop_all();
    }
}

/// Prefix of every follower thread name
const THREAD_PREFIX: &str = "tail-";

/// Thread names are `tail-<file name>` for readable panics and debuggers
fn thread_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    format!("{}{}", THREAD_PREFIX, name)
}

/// Whether a thread with this name runs a follower
pub fn is_follower_thread(name: &str) -> bool {
    name.starts_with(THREAD_PREFIX)
}

/// Pump a follow sequence into the aggregation channel
///
/// Returns when the sequence ends (stop signal or open failure) or the
/// consumer has gone away.
fn follow_into_channel(
    source: SourceId,
    follow: Follow,
    tx: &EventSender,
    metrics: &WorkerMetrics,
) -> Result<(), TailError> {
    for item in follow {
        let line = item?;
        metrics.record_line();
        if tx.send(LogEvent::new(source, line)).is_err() {
            tracing::debug!("Aggregation channel closed, follower {} exiting", source);
            break;
        }
    }
    Ok(())
}

/// Worker boundary: convert any failure into one diagnostic line
fn run_guarded<F>(source: SourceId, tx: &EventSender, metrics: &WorkerMetrics, body: F)
where
    F: FnOnce() -> Result<(), TailError>,
{
    let reason = match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(e.to_string()),
        Err(payload) => Some(panic_message(payload.as_ref())),
    };

    if let Some(reason) = reason {
        tracing::warn!("Follower {} failed: {}", source, reason);
        // Consumer may already be gone during shutdown
        let _ = tx.send(LogEvent::fault(source, reason));
    }
    metrics.finished.store(true, Ordering::Release);
}

pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events;
    use std::fs;
    use std::io::{self, Write};
    use std::time::Instant;
    use tempfile::TempDir;

    const POLL: Duration = Duration::from_millis(10);

    fn recv_within(rx: &mut events::EventReceiver, timeout: Duration) -> Option<LogEvent> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(event) = rx.try_recv() {
                return Some(event);
            }
            thread::sleep(Duration::from_millis(5));
        }
        None
    }

    #[test]
    fn test_thread_name_uses_file_name() {
        assert_eq!(thread_name(Path::new("/var/log/syslog")), "tail-syslog");
        assert!(is_follower_thread(&thread_name(Path::new("app.log"))));
        assert!(!is_follower_thread("main"));
    }

    #[test]
    fn test_snapshots_sum() {
        let a = MetricsSnapshot {
            lines_sent: 3,
            rotations: 1,
            ..Default::default()
        };
        let b = MetricsSnapshot {
            lines_sent: 4,
            truncations: 2,
            ..Default::default()
        };
        let sum = a + b;
        assert_eq!(sum.lines_sent, 7);
        assert_eq!(sum.rotations, 1);
        assert_eq!(sum.truncations, 2);
    }

    #[test]
    fn test_guarded_panic_becomes_diagnostic_line() {
        let (tx, mut rx) = events::channel();
        let metrics = WorkerMetrics::default();

        run_guarded(SourceId(2), &tx, &metrics, || panic!("boom"));

        let event = rx.try_recv().unwrap();
        assert_eq!(event.source, SourceId(2));
        assert_eq!(event.text, "[ERROR] boom");
        assert!(metrics.is_finished());
    }

    #[test]
    fn test_guarded_error_becomes_diagnostic_line() {
        let (tx, mut rx) = events::channel();
        let metrics = WorkerMetrics::default();

        run_guarded(SourceId(0), &tx, &metrics, || {
            Err(TailError::Read {
                path: PathBuf::from("/tmp/x.log"),
                source: io::Error::new(io::ErrorKind::Other, "bad sector"),
            })
        });

        let event = rx.try_recv().unwrap();
        assert_eq!(event.text, "[ERROR] read failed on /tmp/x.log: bad sector");
    }

    #[test]
    fn test_clean_exit_sends_nothing() {
        let (tx, mut rx) = events::channel();
        let metrics = WorkerMetrics::default();

        run_guarded(SourceId(0), &tx, &metrics, || Ok(()));

        assert!(rx.try_recv().is_err());
        assert!(metrics.is_finished());
    }

    #[test]
    fn test_workers_deliver_lines_and_stop() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.log");
        let b = dir.path().join("b.log");
        fs::write(&a, "").unwrap();
        fs::write(&b, "").unwrap();

        let (tx, mut rx) = events::channel();
        let supervisor = Supervisor::spawn(&[a.clone(), b.clone()], POLL, tx).unwrap();
        assert_eq!(supervisor.workers.len(), 2);

        // Give both workers time to open and seek to the end
        thread::sleep(Duration::from_millis(100));
        fs::OpenOptions::new()
            .append(true)
            .open(&b)
            .unwrap()
            .write_all(b"from b\n")
            .unwrap();

        let event = recv_within(&mut rx, Duration::from_secs(2)).expect("line from b");
        assert_eq!(event, LogEvent::new(SourceId(1), "from b"));
        assert_eq!(supervisor.totals().lines_sent, 1);

        let started = Instant::now();
        supervisor.shutdown();
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_failing_source_does_not_affect_others() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.log");
        let bad = dir.path().join("bad");
        fs::write(&good, "").unwrap();
        fs::create_dir(&bad).unwrap();

        let (tx, mut rx) = events::channel();
        let supervisor = Supervisor::spawn(&[bad, good.clone()], POLL, tx).unwrap();

        let diagnostic = recv_within(&mut rx, Duration::from_secs(2)).expect("diagnostic");
        assert_eq!(diagnostic.source, SourceId(0));
        assert!(diagnostic.text.starts_with("[ERROR"));

        thread::sleep(Duration::from_millis(50));
        fs::OpenOptions::new()
            .append(true)
            .open(&good)
            .unwrap()
            .write_all(b"still alive\n")
            .unwrap();

        let event = recv_within(&mut rx, Duration::from_secs(2)).expect("line from good");
        assert_eq!(event, LogEvent::new(SourceId(1), "still alive"));
        supervisor.shutdown();
    }
}
