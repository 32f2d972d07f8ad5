// SPDX-License-Identifier: Apache-2.0

//! Checkpoint store: shared tracking state and the read/advance protocol.
//!
//! One store-wide lock guards the path-to-checkpoint map. Every read and
//! every snapshot operation takes it, so reads for different files are
//! serialized rather than parallel and a snapshot can never observe a
//! half-advanced offset. Saves also hold the lock for the duration of the
//! write, which excludes reads while the snapshot file is rewritten.

use std::collections::HashMap;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::checkpoint::Checkpoint;
use crate::error::Result;
use crate::file_id::FileId;
use crate::persistence::{self, Snapshot, SnapshotEntry};
use crate::scanner::{LineScanner, WindowReader};

/// Read seam for the poll loop: anything that can produce the newly appended
/// lines for a path.
pub trait LineSource: Send + Sync {
    fn read_lines(&self, path: &Path) -> Result<Vec<String>>;
}

/// Tracks read positions for every observed path and reads forward from
/// them.
///
/// Entries are created the first time a path is read and are never removed;
/// a path whose file disappears keeps its entry (and its offset) in case the
/// file comes back.
pub struct CheckpointStore {
    checkpoints: Mutex<HashMap<PathBuf, Checkpoint>>,
    max_read_size: u64,
}

impl CheckpointStore {
    /// Create an empty store. `max_read_size` caps the bytes read from one
    /// file in one `read_lines` call.
    pub fn new(max_read_size: u64) -> Self {
        Self {
            checkpoints: Mutex::new(HashMap::new()),
            max_read_size,
        }
    }

    /// Read the complete lines appended to `path` since the last call.
    ///
    /// Reconciles the checkpoint with the file first (rotation, truncation,
    /// absence), reads at most `max_read_size` bytes from the recorded
    /// offset, and advances the offset by exactly the bytes of the lines
    /// returned. An unterminated trailing line is left for a later call.
    /// An inaccessible file yields an empty result, not an error.
    pub fn read_lines(&self, path: &Path) -> Result<Vec<String>> {
        let mut checkpoints = self.checkpoints.lock().unwrap();
        let checkpoint = checkpoints.entry(path.to_path_buf()).or_default();
        checkpoint.check(path)?;

        let Some(file) = checkpoint.file.as_ref() else {
            return Ok(Vec::new());
        };

        let window = WindowReader::new(file, checkpoint.offset, self.max_read_size);
        let mut scanner = LineScanner::new(BufReader::new(window));
        let mut lines = Vec::new();
        while let Some(line) = scanner.next_line()? {
            lines.push(line);
        }
        let consumed = scanner.bytes_consumed();
        checkpoint.offset += consumed;
        Ok(lines)
    }

    /// Point-in-time copy of the persistable state.
    pub fn snapshot(&self) -> Snapshot {
        let checkpoints = self.checkpoints.lock().unwrap();
        Self::collect(&checkpoints)
    }

    /// Seed the store from persisted state. Handles stay closed until each
    /// path's next read.
    pub fn restore(&self, snapshot: Snapshot) {
        let mut checkpoints = self.checkpoints.lock().unwrap();
        for (path, entry) in snapshot {
            let file_id = FileId::new(entry.dev, entry.ino);
            checkpoints.insert(
                PathBuf::from(path),
                Checkpoint::from_persisted(entry.offset, entry.size, file_id),
            );
        }
    }

    /// Serialize the current state and overwrite the snapshot file at
    /// `path`, holding the store lock for the whole write. Returns the bytes
    /// written.
    pub fn save(&self, path: &Path) -> Result<usize> {
        let checkpoints = self.checkpoints.lock().unwrap();
        let snapshot = Self::collect(&checkpoints);
        persistence::write(path, &snapshot)
    }

    /// Close every open handle. Offsets and identities are kept; the store
    /// is not meant to serve reads afterwards.
    pub fn close(&self) {
        let mut checkpoints = self.checkpoints.lock().unwrap();
        for checkpoint in checkpoints.values_mut() {
            checkpoint.close();
        }
    }

    fn collect(checkpoints: &HashMap<PathBuf, Checkpoint>) -> Snapshot {
        checkpoints
            .iter()
            .map(|(path, checkpoint)| {
                (
                    path.to_string_lossy().into_owned(),
                    SnapshotEntry {
                        offset: checkpoint.offset,
                        size: checkpoint.size,
                        dev: checkpoint.file_id.dev(),
                        ino: checkpoint.file_id.ino(),
                    },
                )
            })
            .collect()
    }
}

impl LineSource for CheckpointStore {
    fn read_lines(&self, path: &Path) -> Result<Vec<String>> {
        CheckpointStore::read_lines(self, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    fn append(path: &Path, bytes: &[u8]) {
        let mut f = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .unwrap();
        f.write_all(bytes).unwrap();
        f.flush().unwrap();
    }

    fn offset_of(store: &CheckpointStore, path: &Path) -> u64 {
        store
            .snapshot()
            .get(path.to_str().unwrap())
            .unwrap()
            .offset
    }

    #[test]
    fn test_appends_advance_offset_exactly() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.log");
        let store = CheckpointStore::new(1 << 20);

        append(&path, b"hello\n");
        assert_eq!(store.read_lines(&path).unwrap(), vec!["hello"]);
        assert_eq!(offset_of(&store, &path), 6);

        append(&path, b"wor");
        assert!(store.read_lines(&path).unwrap().is_empty());
        assert_eq!(offset_of(&store, &path), 6);

        append(&path, b"ld\n");
        assert_eq!(store.read_lines(&path).unwrap(), vec!["world"]);
        assert_eq!(offset_of(&store, &path), 12);
    }

    #[test]
    fn test_no_new_data_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.log");
        let store = CheckpointStore::new(1 << 20);

        append(&path, b"line\n");
        assert_eq!(store.read_lines(&path).unwrap(), vec!["line"]);
        assert!(store.read_lines(&path).unwrap().is_empty());
        assert_eq!(offset_of(&store, &path), 5);
    }

    #[test]
    fn test_missing_file_yields_empty_until_it_appears() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("late.log");
        let store = CheckpointStore::new(1 << 20);

        assert!(store.read_lines(&path).unwrap().is_empty());

        append(&path, b"here\n");
        assert_eq!(store.read_lines(&path).unwrap(), vec!["here"]);
    }

    #[test]
    fn test_bounded_read_drains_over_multiple_calls() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.log");
        let store = CheckpointStore::new(8);

        append(&path, b"aaa\nbbb\nccc\n");
        assert_eq!(store.read_lines(&path).unwrap(), vec!["aaa", "bbb"]);
        assert_eq!(offset_of(&store, &path), 8);
        assert_eq!(store.read_lines(&path).unwrap(), vec!["ccc"]);
        assert_eq!(offset_of(&store, &path), 12);
    }

    #[test]
    fn test_truncation_restarts_from_new_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.log");
        let store = CheckpointStore::new(1 << 20);

        append(&path, b"first line\n");
        assert_eq!(store.read_lines(&path).unwrap(), vec!["first line"]);

        fs::write(&path, b"new\n").unwrap();
        assert_eq!(store.read_lines(&path).unwrap(), vec!["new"]);
        assert_eq!(offset_of(&store, &path), 4);
    }

    #[test]
    fn test_same_size_replacement_restarts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.log");
        let store = CheckpointStore::new(1 << 20);

        append(&path, b"aaaa\n");
        assert_eq!(store.read_lines(&path).unwrap(), vec!["aaaa"]);

        fs::remove_file(&path).unwrap();
        fs::write(&path, b"bbbb\n").unwrap();
        assert_eq!(store.read_lines(&path).unwrap(), vec!["bbbb"]);
    }

    #[test]
    fn test_file_removed_then_recreated_restarts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.log");
        let store = CheckpointStore::new(1 << 20);

        append(&path, b"gone\n");
        assert_eq!(store.read_lines(&path).unwrap(), vec!["gone"]);

        fs::remove_file(&path).unwrap();
        assert!(store.read_lines(&path).unwrap().is_empty());

        append(&path, b"back\n");
        assert_eq!(store.read_lines(&path).unwrap(), vec!["back"]);
    }

    #[test]
    fn test_snapshot_restore_resumes_without_redelivery() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.log");

        let first = CheckpointStore::new(1 << 20);
        append(&path, b"hello\n");
        assert_eq!(first.read_lines(&path).unwrap(), vec!["hello"]);
        let snapshot = first.snapshot();
        first.close();

        append(&path, b"world\n");

        let second = CheckpointStore::new(1 << 20);
        second.restore(snapshot);
        assert_eq!(second.read_lines(&path).unwrap(), vec!["world"]);
        assert_eq!(offset_of(&second, &path), 12);
    }

    #[test]
    fn test_restore_of_fully_read_file_reads_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.log");

        let first = CheckpointStore::new(1 << 20);
        append(&path, b"done\n");
        assert_eq!(first.read_lines(&path).unwrap(), vec!["done"]);
        let snapshot = first.snapshot();

        let second = CheckpointStore::new(1 << 20);
        second.restore(snapshot);
        assert!(second.read_lines(&path).unwrap().is_empty());
    }

    #[test]
    fn test_close_keeps_offsets_in_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.log");
        let store = CheckpointStore::new(1 << 20);

        append(&path, b"hello\n");
        store.read_lines(&path).unwrap();
        store.close();

        assert_eq!(offset_of(&store, &path), 6);
    }

    #[test]
    fn test_crlf_lines_consume_both_terminator_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.log");
        let store = CheckpointStore::new(1 << 20);

        append(&path, b"alpha\r\nbeta\r\n");
        assert_eq!(store.read_lines(&path).unwrap(), vec!["alpha", "beta"]);
        assert_eq!(offset_of(&store, &path), 13);
    }
}
