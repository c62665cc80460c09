//! Durable offline queue for submissions that could not be delivered.
//!
//! The queue is a JSON-lines file, one [`QueueEntry`] per line. Appends are a
//! single write followed by `fsync`. Draining never edits the file in place:
//! the surviving lines are written to `<queue>.tmp`, synced, and renamed over
//! the queue, so a crash at any point leaves either the old or the new file.
//! Delivery is at-least-once; a crash between a successful redelivery and the
//! rename can deliver that entry again on the next drain.
//!
//! All operations hold an exclusive advisory lock on `<queue>.lock`.

use crate::error::{ClientError, Result};
use crate::sink::FeedbackSink;
use chrono::Utc;
use fs2::FileExt;
use kneadback_core::FeedbackInput;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Unix seconds.
    pub queued_at: i64,
    pub record: FeedbackInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum QueueState {
    Empty,
    Pending { entries: usize },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct OfflineQueue {
    path: PathBuf,
    backoff: Duration,
}

struct QueueLock {
    file: File,
}

impl Drop for QueueLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

impl OfflineQueue {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            backoff: DEFAULT_BACKOFF,
        }
    }

    /// Pause after each failed redelivery when more entries remain.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> PathBuf {
        sibling(&self.path, ".lock")
    }

    pub fn tmp_path(&self) -> PathBuf {
        sibling(&self.path, ".tmp")
    }

    fn lock(&self) -> Result<QueueLock> {
        ensure_parent_dir(&self.path)?;
        let path = self.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| ClientError::Lock {
                path: path.clone(),
                source,
            })?;
        file.lock_exclusive()
            .map_err(|source| ClientError::Lock { path, source })?;
        Ok(QueueLock { file })
    }

    pub fn enqueue(&self, input: &FeedbackInput) -> Result<()> {
        let _lock = self.lock()?;
        let entry = QueueEntry {
            queued_at: Utc::now().timestamp(),
            record: input.clone(),
        };
        let line = serde_json::to_string(&entry)?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;
        restrict_file_permissions(&self.path)?;

        let mut buf = Vec::with_capacity(line.len() + 2);
        if has_torn_tail(&mut file)? {
            warn!(path = %self.path.display(), "queue file has an unterminated last line");
            buf.push(b'\n');
        }
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
        file.write_all(&buf)?;
        file.sync_all()?;
        debug!(path = %self.path.display(), "queued submission");
        Ok(())
    }

    pub fn status(&self) -> Result<QueueState> {
        let _lock = self.lock()?;
        let entries = self.read_lines()?.len();
        Ok(if entries == 0 {
            QueueState::Empty
        } else {
            QueueState::Pending { entries }
        })
    }

    /// Redelivers every entry in order. Delivered entries are dropped; failed
    /// and unreadable ones are kept byte for byte.
    pub fn drain<S: FeedbackSink + ?Sized>(&self, sink: &S) -> Result<DrainReport> {
        self.drain_with(sink, proceed)
    }

    fn drain_with<S, H>(&self, sink: &S, before_rename: H) -> Result<DrainReport>
    where
        S: FeedbackSink + ?Sized,
        H: FnOnce() -> io::Result<()>,
    {
        let _lock = self.lock()?;
        let lines = self.read_lines()?;
        let total = lines.len();
        let mut report = DrainReport::default();
        let mut survivors = Vec::new();

        for (index, line) in lines.into_iter().enumerate() {
            // Also rejects lines cut inside a multi-byte character.
            let entry = match serde_json::from_slice::<QueueEntry>(&line) {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(line = index + 1, error = %err, "keeping unreadable queue entry");
                    report.failed += 1;
                    survivors.push(line);
                    continue;
                }
            };
            match sink.deliver(&entry.record) {
                Ok(record) => {
                    debug!(id = %record.id, queued_at = entry.queued_at, "redelivered");
                    report.succeeded += 1;
                }
                Err(err) => {
                    warn!(queued_at = entry.queued_at, error = %err, "redelivery failed");
                    report.failed += 1;
                    survivors.push(line);
                    if index + 1 < total && !self.backoff.is_zero() {
                        thread::sleep(self.backoff);
                    }
                }
            }
        }

        if total > 0 {
            self.replace(&survivors, before_rename)?;
            info!(
                succeeded = report.succeeded,
                failed = report.failed,
                "queue drained"
            );
        }
        Ok(report)
    }

    /// Non-blank lines of the queue file as raw bytes; a missing file is an
    /// empty queue.
    fn read_lines(&self) -> Result<Vec<Vec<u8>>> {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        Ok(contents
            .split(|byte| *byte == b'\n')
            .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
            .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
            .map(<[u8]>::to_vec)
            .collect())
    }

    fn replace<H>(&self, survivors: &[Vec<u8>], before_rename: H) -> Result<()>
    where
        H: FnOnce() -> io::Result<()>,
    {
        if survivors.is_empty() {
            match fs::remove_file(&self.path) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
            return sync_parent_dir(&self.path);
        }

        let tmp = self.tmp_path();
        let result = write_and_swap(&tmp, &self.path, survivors, before_rename);
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result
    }
}

fn proceed() -> io::Result<()> {
    Ok(())
}

/// `before_rename` runs once the temporary file is complete and synced.
fn write_and_swap<H>(tmp: &Path, target: &Path, lines: &[Vec<u8>], before_rename: H) -> Result<()>
where
    H: FnOnce() -> io::Result<()>,
{
    let mut file = File::create(tmp)?;
    restrict_file_permissions(tmp)?;
    let mut contents = Vec::with_capacity(lines.iter().map(|line| line.len() + 1).sum());
    for line in lines {
        contents.extend_from_slice(line);
        contents.push(b'\n');
    }
    file.write_all(&contents)?;
    file.sync_all()?;
    drop(file);
    before_rename()?;
    fs::rename(tmp, target)?;
    sync_parent_dir(target)
}

fn has_torn_tail(file: &mut File) -> Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    let parent = parent_dir(path);
    if !parent.exists() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> Result<()> {
    File::open(parent_dir(path))?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(unix)]
fn restrict_file_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_file_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{sibling, OfflineQueue, QueueState};
    use crate::{ClientError, FeedbackSink};
    use kneadback_core::{FeedbackInput, FeedbackRecord};
    use std::fs;
    use std::io;
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn sidecar_paths_extend_the_file_name() {
        let queue = OfflineQueue::new("/tmp/kb/queue.jsonl");
        assert_eq!(queue.lock_path(), Path::new("/tmp/kb/queue.jsonl.lock"));
        assert_eq!(queue.tmp_path(), Path::new("/tmp/kb/queue.jsonl.tmp"));
        assert_eq!(sibling(Path::new("q"), ".x"), Path::new("q.x"));
    }

    #[test]
    fn missing_file_is_empty() {
        let temp = TempDir::new().expect("temp dir");
        let queue = OfflineQueue::new(temp.path().join("nested").join("queue.jsonl"));
        assert_eq!(queue.status().expect("status"), QueueState::Empty);
    }

    #[test]
    fn enqueue_repairs_torn_tail() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("queue.jsonl");
        fs::write(&path, "{\"queued_at\":1,\"rec").expect("write torn");

        let queue = OfflineQueue::new(&path);
        queue.enqueue(&FeedbackInput::default()).expect("enqueue");

        let contents = fs::read_to_string(&path).expect("read");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "{\"queued_at\":1,\"rec");
        assert!(lines[1].starts_with("{\"queued_at\":"));
        assert!(contents.ends_with('\n'));
        assert_eq!(
            queue.status().expect("status"),
            QueueState::Pending { entries: 2 }
        );
    }

    struct RefuseAll;

    impl FeedbackSink for RefuseAll {
        fn deliver(&self, _input: &FeedbackInput) -> crate::Result<FeedbackRecord> {
            Err(ClientError::Status {
                status: 503,
                body: String::new(),
            })
        }
    }

    #[test]
    fn interrupted_rewrite_keeps_pre_drain_queue() {
        let temp = TempDir::new().expect("temp dir");
        let queue = OfflineQueue::new(temp.path().join("queue.jsonl"))
            .with_backoff(std::time::Duration::ZERO);
        let mut first = FeedbackInput::default();
        first.notes = "first".to_string();
        queue.enqueue(&first).expect("enqueue");
        queue.enqueue(&FeedbackInput::default()).expect("enqueue");
        let before = fs::read(queue.path()).expect("read");

        // Snapshot the temporary file at the moment a kill would land, then
        // abort before the rename.
        let tmp = queue.tmp_path();
        let snapshot = temp.path().join("snapshot");
        let result = queue.drain_with(&RefuseAll, || {
            fs::copy(&tmp, &snapshot)?;
            Err(io::Error::other("killed before rename"))
        });
        assert!(result.is_err());
        assert_eq!(fs::read(queue.path()).expect("read"), before);
        assert_eq!(fs::read(&snapshot).expect("snapshot"), before);

        // Restart with the temporary file a hard kill leaves behind.
        fs::copy(&snapshot, &tmp).expect("restore tmp");
        assert_eq!(
            queue.status().expect("status"),
            QueueState::Pending { entries: 2 }
        );
        let report = queue.drain(&RefuseAll).expect("drain");
        assert_eq!(report.failed, 2);
        assert_eq!(fs::read(queue.path()).expect("read"), before);
        assert!(!queue.tmp_path().exists());
    }
}
