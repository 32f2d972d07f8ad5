// SPDX-License-Identifier: Apache-2.0

//! Checkpointed multi-file tailer.
//!
//! fantail follows a changing set of files, discovered by shell-glob pattern
//! or recursive directory walk, and delivers newly appended complete lines
//! to a consumer callback. Per-file read offsets and file identities
//! (device and inode numbers) are checkpointed to a JSON snapshot on an
//! interval, with a final flush on shutdown, so a restarted process resumes
//! exactly where the previous one stopped.
//!
//! Rotation and truncation are detected per file on every read: a changed
//! identity or a shrunken size restarts that file from offset zero, while a
//! file that merely disappears keeps its position in case it comes back.
//! Only complete lines are delivered; a partially written trailing line is
//! withheld, and its bytes are not counted, until its newline arrives.
//! Reads are bounded per file per pass so one busy file cannot starve the
//! rest.

mod checkpoint;
pub mod config;
pub mod engine;
pub mod error;
pub mod file_id;
pub mod finder;
pub mod persistence;
pub mod scanner;
pub mod selector;
pub mod store;
pub mod tailer;

pub use config::{Selection, TailerConfig};
pub use engine::Engine;
pub use error::{BoxError, Error, Result};
pub use file_id::FileId;
pub use finder::{create_finder, FileFinder, GlobFinder, WalkFinder};
pub use persistence::{Snapshot, SnapshotEntry, SnapshotPersister};
pub use scanner::{LineScanner, WindowReader};
pub use selector::FileSelector;
pub use store::{CheckpointStore, LineSource};
pub use tailer::Tailer;
