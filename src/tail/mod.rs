//! Source followers - `tail -F` for a single path
//!
//! A [`Follower`] owns one file handle and advances in discrete cycles. Each
//! cycle either reads newly appended bytes and splits them into lines, or (when
//! nothing new arrived) re-stats the path to notice rotation, truncation, or
//! the file disappearing.
//!
//! ```text
//!               exists                     read > 0
//!   [Waiting] ─────────▶ [Open] ◀──────────────────────┐
//!       ▲   │ open fails    │                           │
//!       │   ▼               │ read == 0 → stat path     │
//!       │ [Closed]          ├── new identity  → reopen, seek end (Rotated)
//!       │                   ├── offset > size → seek end        (Truncated)
//!       └───────────────────┴── not found     → back to Waiting (Vanished)
//! ```
//!
//! [`Follow`] wraps a follower into the lazy, infinite line sequence the
//! worker threads consume: it sleeps one poll interval between cycles and
//! ends when its [`StopSignal`] is raised or the first open fails.

pub mod supervisor;

use std::collections::VecDeque;
use std::fmt;
use std::fs::{self, File, Metadata};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub use supervisor::{
    is_follower_thread, panic_message, MetricsSnapshot, Supervisor, WorkerMetrics,
};

/// Read buffer size for a single `read` call
const READ_CHUNK: usize = 8 * 1024;

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Failures that end a follower
#[derive(Debug)]
pub enum TailError {
    /// The path existed but could not be opened (terminal for the source)
    Open { path: PathBuf, source: io::Error },
    /// Reading from an open handle failed
    Read { path: PathBuf, source: io::Error },
}

impl fmt::Display for TailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TailError::Open { path, source } => {
                write!(f, "cannot open {}: {}", path.display(), source)
            }
            TailError::Read { path, source } => {
                write!(f, "read failed on {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for TailError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TailError::Open { source, .. } | TailError::Read { source, .. } => Some(source),
        }
    }
}

/// The single visible line a panel shows when its file cannot be opened
pub fn open_failure_line(path: &Path, err: &io::Error) -> String {
    format!("[ERROR opening {}: {}]", path.display(), err)
}

// ─────────────────────────────────────────────────────────────────────────────
// File identity
// ─────────────────────────────────────────────────────────────────────────────

/// Identity token of an on-disk file (device + inode on Unix)
///
/// Two handles with the same identity refer to the same file even if it was
/// renamed; a different identity under the same path means the path was
/// rotated to a new file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileIdentity {
    dev: u64,
    ino: u64,
}

impl FileIdentity {
    #[cfg(unix)]
    pub fn of(meta: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            dev: meta.dev(),
            ino: meta.ino(),
        })
    }

    /// No portable inode outside Unix; rotation detection is disabled there
    /// and truncation detection still applies.
    #[cfg(not(unix))]
    pub fn of(_meta: &Metadata) -> Option<Self> {
        None
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Follower state machine
// ─────────────────────────────────────────────────────────────────────────────

/// Handle state of a follower
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    /// Path does not exist yet (or vanished); polling for it
    Waiting,
    /// Following an open handle
    Open,
    /// First open failed; the sequence is over
    Closed,
}

/// What a single cycle observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cycle {
    /// Path still missing
    Waiting,
    /// First open succeeded; positioned at end of file
    Opened,
    /// Path reappeared after vanishing and was reopened
    Reopened,
    /// Complete lines read this cycle (never empty)
    Lines(Vec<String>),
    /// Nothing new and nothing changed
    Idle,
    /// Path now refers to a different file; following the new one from its end
    Rotated,
    /// File shrank below the read offset; reseeked to the new end
    Truncated,
    /// Path no longer exists; back to existence polling
    Vanished,
    /// Follower is closed; no further cycles do anything
    Closed,
}

/// Follows appended content of one path
#[derive(Debug)]
pub struct Follower {
    path: PathBuf,
    file: Option<File>,
    identity: Option<FileIdentity>,
    offset: u64,
    carry: Vec<u8>,
    state: HandleState,
}

impl Follower {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
            identity: None,
            offset: 0,
            carry: Vec::new(),
            state: HandleState::Waiting,
        }
    }

    /// Run one cycle
    ///
    /// Returns `Err(TailError::Open)` only for the very first open; once a
    /// file has been followed, failed reopens keep the previous handle.
    pub fn poll_once(&mut self) -> Result<Cycle, TailError> {
        match self.state {
            HandleState::Closed => Ok(Cycle::Closed),
            HandleState::Waiting => self.poll_waiting(),
            HandleState::Open => self.poll_open(),
        }
    }

    fn poll_waiting(&mut self) -> Result<Cycle, TailError> {
        if !self.path.exists() {
            return Ok(Cycle::Waiting);
        }

        let reappeared = self.file.is_some();
        match self.open_at_end() {
            Ok(()) => {
                self.state = HandleState::Open;
                Ok(if reappeared {
                    Cycle::Reopened
                } else {
                    Cycle::Opened
                })
            }
            Err(e) if reappeared => {
                tracing::warn!(
                    "Reopen of {} failed, keeping previous handle: {}",
                    self.path.display(),
                    e
                );
                self.state = HandleState::Open;
                Ok(Cycle::Idle)
            }
            Err(e) => {
                self.state = HandleState::Closed;
                Err(TailError::Open {
                    path: self.path.clone(),
                    source: e,
                })
            }
        }
    }

    fn poll_open(&mut self) -> Result<Cycle, TailError> {
        let read = self.read_available()?;
        if read > 0 {
            let lines = self.take_lines();
            return Ok(if lines.is_empty() {
                Cycle::Idle
            } else {
                Cycle::Lines(lines)
            });
        }

        match fs::metadata(&self.path) {
            Ok(meta) => Ok(self.check_rotation(&meta)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("{} vanished, waiting for it to reappear", self.path.display());
                self.state = HandleState::Waiting;
                Ok(Cycle::Vanished)
            }
            Err(e) => {
                tracing::debug!("stat {} failed: {}", self.path.display(), e);
                Ok(Cycle::Idle)
            }
        }
    }

    fn check_rotation(&mut self, meta: &Metadata) -> Cycle {
        let current = FileIdentity::of(meta);
        let rotated = matches!(
            (self.identity, current),
            (Some(old), Some(new)) if old != new
        );

        if rotated {
            return match self.open_at_end() {
                Ok(()) => {
                    tracing::debug!("{} rotated, following new file", self.path.display());
                    Cycle::Rotated
                }
                Err(e) => {
                    tracing::debug!("{} rotated but reopen failed: {}", self.path.display(), e);
                    Cycle::Idle
                }
            };
        }

        if self.offset > meta.len() {
            if let Some(file) = self.file.as_mut() {
                if let Ok(end) = file.seek(SeekFrom::End(0)) {
                    self.offset = end;
                    self.carry.clear();
                    tracing::debug!("{} truncated, reseeked to {}", self.path.display(), end);
                    return Cycle::Truncated;
                }
            }
        }

        Cycle::Idle
    }

    /// Open the path, seek to its end and adopt its identity
    ///
    /// On failure the current handle (if any) is left untouched.
    fn open_at_end(&mut self) -> io::Result<()> {
        let mut file = File::open(&self.path)?;
        let end = file.seek(SeekFrom::End(0))?;
        let identity = file.metadata().ok().and_then(|m| FileIdentity::of(&m));

        self.file = Some(file);
        self.identity = identity;
        self.offset = end;
        self.carry.clear();
        Ok(())
    }

    /// Read everything currently available into the carry buffer
    fn read_available(&mut self) -> Result<usize, TailError> {
        let Some(file) = self.file.as_mut() else {
            return Ok(0);
        };

        let mut total = 0;
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match file.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    self.carry.extend_from_slice(&chunk[..n]);
                    total += n;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(TailError::Read {
                        path: self.path.clone(),
                        source: e,
                    })
                }
            }
        }
        self.offset += total as u64;
        Ok(total)
    }

    /// Split complete lines off the carry buffer
    fn take_lines(&mut self) -> Vec<String> {
        let Some(last_newline) = self.carry.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };

        let rest = self.carry.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.carry, rest);

        complete[..last_newline]
            .split(|&b| b == b'\n')
            .map(|line| {
                let line = line.strip_suffix(b"\r").unwrap_or(line);
                String::from_utf8_lossy(line).into_owned()
            })
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cancellation
// ─────────────────────────────────────────────────────────────────────────────

/// Cooperative stop flag shared between a worker and its supervisor
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Lazy line sequence
// ─────────────────────────────────────────────────────────────────────────────

/// Infinite, non-restartable sequence of lines appended to one path
///
/// Yields `Ok(line)` for every observed line. If the first open fails it
/// yields the synthetic `[ERROR opening ...]` line once and ends. A read error
/// is yielded as `Err` and also ends the sequence; the worker turns it into a
/// diagnostic line. Raising the stop signal ends the sequence within one poll
/// interval.
pub struct Follow {
    follower: Follower,
    poll_interval: Duration,
    stop: StopSignal,
    metrics: Option<Arc<WorkerMetrics>>,
    pending: VecDeque<String>,
    polled: bool,
    finished: bool,
}

impl Follow {
    pub fn new(path: impl Into<PathBuf>, poll_interval: Duration, stop: StopSignal) -> Self {
        Self {
            follower: Follower::new(path),
            poll_interval,
            stop,
            metrics: None,
            pending: VecDeque::new(),
            polled: false,
            finished: false,
        }
    }

    /// Record rotations, truncations and reopens into shared worker metrics
    pub fn with_metrics(mut self, metrics: Arc<WorkerMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn record(&self, cycle: &Cycle) {
        let Some(metrics) = &self.metrics else {
            return;
        };
        match cycle {
            Cycle::Rotated => metrics.record_rotation(),
            Cycle::Truncated => metrics.record_truncation(),
            Cycle::Reopened => metrics.record_reopen(),
            _ => {}
        }
    }
}

impl Iterator for Follow {
    type Item = Result<String, TailError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(line) = self.pending.pop_front() {
                return Some(Ok(line));
            }
            if self.finished || self.stop.is_stopped() {
                return None;
            }

            // Every cycle after the first is preceded by one poll interval
            if self.polled {
                thread::sleep(self.poll_interval);
                if self.stop.is_stopped() {
                    return None;
                }
            }
            self.polled = true;

            match self.follower.poll_once() {
                Ok(Cycle::Lines(lines)) => self.pending.extend(lines),
                Ok(Cycle::Closed) => self.finished = true,
                Ok(cycle) => self.record(&cycle),
                Err(TailError::Open { path, source }) => {
                    self.finished = true;
                    return Some(Ok(open_failure_line(&path, &source)));
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn append(path: &Path, text: &str) {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file.flush().unwrap();
    }

    fn lines(cycle: Cycle) -> Vec<String> {
        match cycle {
            Cycle::Lines(lines) => lines,
            other => panic!("expected lines, got {:?}", other),
        }
    }

    fn opened_follower(dir: &TempDir, name: &str, existing: &str) -> (PathBuf, Follower) {
        let path = dir.path().join(name);
        append(&path, existing);
        let mut follower = Follower::new(&path);
        assert_eq!(follower.poll_once().unwrap(), Cycle::Opened);
        (path, follower)
    }

    #[test]
    fn test_no_backfill_of_existing_content() {
        let dir = TempDir::new().unwrap();
        let (path, mut follower) = opened_follower(&dir, "app.log", "old 1\nold 2\n");

        assert_eq!(follower.poll_once().unwrap(), Cycle::Idle);

        append(&path, "new 1\n");
        assert_eq!(lines(follower.poll_once().unwrap()), vec!["new 1"]);
    }

    #[test]
    fn test_partial_line_is_carried_until_terminated() {
        let dir = TempDir::new().unwrap();
        let (path, mut follower) = opened_follower(&dir, "app.log", "");

        append(&path, "first\nsec");
        assert_eq!(lines(follower.poll_once().unwrap()), vec!["first"]);

        append(&path, "ond\r\nthird\n");
        assert_eq!(
            lines(follower.poll_once().unwrap()),
            vec!["second", "third"]
        );
    }

    #[test]
    fn test_unterminated_read_is_idle() {
        let dir = TempDir::new().unwrap();
        let (path, mut follower) = opened_follower(&dir, "app.log", "");

        append(&path, "no newline yet");
        assert_eq!(follower.poll_once().unwrap(), Cycle::Idle);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let dir = TempDir::new().unwrap();
        let (path, mut follower) = opened_follower(&dir, "bin.log", "");

        let mut file = fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"ok \xff\xfe end\n").unwrap();

        let got = lines(follower.poll_once().unwrap());
        assert_eq!(got.len(), 1);
        assert!(got[0].starts_with("ok "));
        assert!(got[0].contains('\u{FFFD}'));
        assert!(got[0].ends_with(" end"));
    }

    #[test]
    fn test_multibyte_char_split_across_reads() {
        let dir = TempDir::new().unwrap();
        let (path, mut follower) = opened_follower(&dir, "utf8.log", "");

        let snowman = "☃".as_bytes();
        let mut file = fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&snowman[..1]).unwrap();
        assert_eq!(follower.poll_once().unwrap(), Cycle::Idle);

        file.write_all(&snowman[1..]).unwrap();
        file.write_all(b"\n").unwrap();
        assert_eq!(lines(follower.poll_once().unwrap()), vec!["☃"]);
    }

    #[test]
    fn test_waits_for_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("later.log");
        let mut follower = Follower::new(&path);

        assert_eq!(follower.poll_once().unwrap(), Cycle::Waiting);
        assert_eq!(follower.state, HandleState::Waiting);

        append(&path, "written before open\n");
        assert_eq!(follower.poll_once().unwrap(), Cycle::Opened);

        append(&path, "after open\n");
        assert_eq!(lines(follower.poll_once().unwrap()), vec!["after open"]);
    }

    #[test]
    fn test_rotation_follows_new_file_from_its_end() {
        let dir = TempDir::new().unwrap();
        let (path, mut follower) = opened_follower(&dir, "app.log", "");

        append(&path, "before rotation\n");
        assert_eq!(
            lines(follower.poll_once().unwrap()),
            vec!["before rotation"]
        );

        // Rename keeps the old inode alive so the new file cannot reuse it
        fs::rename(&path, dir.path().join("app.log.1")).unwrap();
        append(&path, "already in new file\n");

        assert_eq!(follower.poll_once().unwrap(), Cycle::Rotated);
        assert_eq!(follower.poll_once().unwrap(), Cycle::Idle);

        append(&path, "after rotation\n");
        assert_eq!(
            lines(follower.poll_once().unwrap()),
            vec!["after rotation"]
        );
    }

    #[test]
    fn test_truncation_reseeks_without_spurious_lines() {
        let dir = TempDir::new().unwrap();
        let (path, mut follower) = opened_follower(&dir, "app.log", "");

        append(&path, "one\ntwo\nthree\n");
        assert_eq!(lines(follower.poll_once().unwrap()).len(), 3);

        fs::OpenOptions::new()
            .write(true)
            .open(&path)
            .unwrap()
            .set_len(0)
            .unwrap();

        assert_eq!(follower.poll_once().unwrap(), Cycle::Truncated);
        assert_eq!(follower.offset, 0);
        assert_eq!(follower.poll_once().unwrap(), Cycle::Idle);

        append(&path, "fresh\n");
        assert_eq!(lines(follower.poll_once().unwrap()), vec!["fresh"]);
    }

    #[test]
    fn test_vanished_file_is_reopened_when_it_reappears() {
        let dir = TempDir::new().unwrap();
        let (path, mut follower) = opened_follower(&dir, "app.log", "");

        fs::remove_file(&path).unwrap();
        assert_eq!(follower.poll_once().unwrap(), Cycle::Vanished);
        assert_eq!(follower.poll_once().unwrap(), Cycle::Waiting);

        append(&path, "recreated\n");
        assert_eq!(follower.poll_once().unwrap(), Cycle::Reopened);

        append(&path, "back again\n");
        assert_eq!(lines(follower.poll_once().unwrap()), vec!["back again"]);
    }

    #[test]
    fn test_directory_path_fails_instead_of_following() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("not-a-file");
        fs::create_dir(&sub).unwrap();

        let mut follower = Follower::new(&sub);
        // Depending on the filesystem the seek-to-end or the first read fails
        match follower.poll_once() {
            Err(TailError::Open { .. }) => assert_eq!(follower.state, HandleState::Closed),
            Ok(Cycle::Opened) => assert!(matches!(
                follower.poll_once(),
                Err(TailError::Read { .. })
            )),
            other => panic!("unexpected cycle: {:?}", other),
        }
    }

    #[test]
    fn test_open_failure_line_format() {
        let err = io::Error::new(io::ErrorKind::PermissionDenied, "Permission denied");
        let line = open_failure_line(Path::new("/var/log/secret.log"), &err);
        assert_eq!(
            line,
            "[ERROR opening /var/log/secret.log: Permission denied]"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_unopenable_path_yields_one_error_line_then_ends() {
        use std::os::unix::net::UnixListener;

        // Sockets exist on disk but refuse open(2)
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sock.log");
        let _listener = UnixListener::bind(&path).unwrap();

        let mut follow = Follow::new(&path, Duration::from_millis(5), StopSignal::new());
        let line = follow.next().unwrap().unwrap();
        assert!(line.starts_with("[ERROR opening "), "got {:?}", line);
        assert!(line.contains("sock.log"));
        assert!(line.ends_with(']'));
        assert!(follow.next().is_none());
        assert!(follow.next().is_none());
    }

    #[test]
    fn test_follow_stops_on_signal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("never.log");
        let stop = StopSignal::new();
        let mut follow = Follow::new(&path, Duration::from_millis(5), stop.clone());

        stop.stop();
        assert!(follow.next().is_none());
    }

    #[test]
    fn test_follow_yields_appended_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        append(&path, "ignored\n");

        let stop = StopSignal::new();
        let mut follow = Follow::new(&path, Duration::from_millis(5), stop);

        let writer_path = path.clone();
        let writer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            append(&writer_path, "hello\nworld\n");
        });

        assert_eq!(follow.next().unwrap().unwrap(), "hello");
        assert_eq!(follow.next().unwrap().unwrap(), "world");
        writer.join().unwrap();
    }
}
