//! # Todo Store
//!
//! One todo list bound to one JSON file.
//!
//! ```text
//! TodoStore
//! ├── path: PathBuf        // backing file, never written into the file itself
//! └── doc: TodoDocument
//!     ├── todos: Vec<TodoItem>   // display order == on-disk order
//!     └── next_id: u64           // survives restarts, ids are never reused
//! ```
//!
//! Every mutation is staged on a copy of the document, written with an atomic
//! temp-file-then-rename save, and only committed to memory once the write
//! succeeded. A failed save leaves both the file and the in-memory list as
//! they were.
//!
//! After any mutation the list is partitioned: incomplete items first,
//! completed items last, encounter order kept within each group.
//!
//! Out-of-range indices and unknown ids are silent no-ops. They never write.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::Builder;
use thiserror::Error;

use crate::core::todo::{TodoDocument, TodoItem};

/// Appended to the full file name when an unparseable list is set aside.
pub const CORRUPTED_SUFFIX: &str = ".corrupted";

const TEMP_PREFIX: &str = ".justdoit_";
const TEMP_SUFFIX: &str = ".tmp";

/// Step of the atomic save that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStage {
    CreateTemp,
    Write,
    Sync,
    Rename,
}

impl fmt::Display for WriteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WriteStage::CreateTemp => "create temp file",
            WriteStage::Write => "write temp file",
            WriteStage::Sync => "sync temp file",
            WriteStage::Rename => "rename temp file",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The file exists but could not be read (permissions, I/O).
    #[error("failed to read todo file {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    /// The file did not parse; its raw bytes were copied to `backup`.
    #[error("corrupted todo file backed up to {}: {source}", .backup.display())]
    Corrupted {
        backup: PathBuf,
        source: serde_json::Error,
    },
    /// The file did not parse and the backup copy could not be written either.
    #[error("corrupted todo file {} (backup failed: {backup_error}): {source}", .path.display())]
    CorruptedBackupFailed {
        path: PathBuf,
        source: serde_json::Error,
        backup_error: io::Error,
    },
    /// The file did not parse. Only [`TodoStore::peek`] reports this; it
    /// makes no backup.
    #[error("todo file {} is not valid: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// `next_id` has reached `u64::MAX`; no further item can be added.
    #[error("no ids left in {}", .path.display())]
    IdsExhausted { path: PathBuf },
    #[error("failed to encode todo list: {0}")]
    Encode(#[source] serde_json::Error),
    /// A save failed. The target file is untouched and the temp file is gone.
    #[error("failed to {stage} for {}: {source}", .path.display())]
    Write {
        stage: WriteStage,
        path: PathBuf,
        source: io::Error,
    },
}

impl StoreError {
    /// True for every unparseable-file variant. Callers may continue with
    /// [`TodoStore::fresh`] once the error has been shown.
    pub fn is_corrupted(&self) -> bool {
        matches!(
            self,
            StoreError::Corrupted { .. }
                | StoreError::CorruptedBackupFailed { .. }
                | StoreError::Malformed { .. }
        )
    }
}

#[derive(Debug, Clone)]
pub struct TodoStore {
    path: PathBuf,
    doc: TodoDocument,
}

impl TodoStore {
    /// Load the list at `path`.
    ///
    /// A missing file is not an error: the result is an empty store with
    /// `next_id == 1` and nothing is written. A file that fails to parse is
    /// copied byte-for-byte to `<path>.corrupted` and reported as
    /// [`StoreError::Corrupted`] (or [`StoreError::CorruptedBackupFailed`]).
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::load(path.into(), true)
    }

    /// Load like [`TodoStore::open`] without writing anything: an
    /// unparseable file is reported as [`StoreError::Malformed`] and no
    /// backup is made. For read-only callers such as list summaries.
    pub fn peek(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::load(path.into(), false)
    }

    fn load(path: PathBuf, backup: bool) -> Result<Self, StoreError> {
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::fresh(path)),
            Err(source) => return Err(StoreError::Read { path, source }),
        };

        match TodoDocument::from_json(&bytes) {
            Ok(doc) => Ok(Self { path, doc }),
            Err(source) if backup => Err(set_aside_corrupted(&path, &bytes, source)),
            Err(source) => Err(StoreError::Malformed { path, source }),
        }
    }

    /// An empty, unsaved store bound to `path`.
    pub fn fresh(path: impl Into<PathBuf>) -> Self {
        Self::from_document(path, TodoDocument::default())
    }

    /// Bind an existing document to `path` without touching the disk.
    /// `next_id` is raised past the document's ids if needed.
    pub fn from_document(path: impl Into<PathBuf>, mut doc: TodoDocument) -> Self {
        doc.reserve_existing_ids();
        Self {
            path: path.into(),
            doc,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn items(&self) -> &[TodoItem] {
        &self.doc.todos
    }

    pub fn document(&self) -> &TodoDocument {
        &self.doc
    }

    pub fn len(&self) -> usize {
        self.doc.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc.todos.is_empty()
    }

    pub fn next_id(&self) -> u64 {
        self.doc.next_id
    }

    pub fn get(&self, id: u64) -> Option<&TodoItem> {
        self.doc.todos.iter().find(|item| item.id == id)
    }

    /// Current position of the item with `id`.
    pub fn position_of(&self, id: u64) -> Option<usize> {
        self.doc.todos.iter().position(|item| item.id == id)
    }

    /// `(open, done)` item counts.
    pub fn counts(&self) -> (usize, usize) {
        let done = self.doc.todos.iter().filter(|item| item.completed).count();
        (self.len() - done, done)
    }

    /// True when the list has items and every one of them is completed.
    pub fn all_completed(&self) -> bool {
        !self.is_empty() && self.doc.todos.iter().all(|item| item.completed)
    }

    /// Write the current state with an atomic temp-file-then-rename save.
    pub fn save(&self) -> Result<(), StoreError> {
        write_document(&self.path, &self.doc)
    }

    /// Put a new incomplete item on top of the list and return its id.
    ///
    /// Fails with [`StoreError::IdsExhausted`] once `next_id` is `u64::MAX`;
    /// ids never wrap.
    pub fn add(&mut self, title: impl Into<String>) -> Result<u64, StoreError> {
        let id = self.doc.next_id;
        let next_id = id.checked_add(1).ok_or_else(|| StoreError::IdsExhausted {
            path: self.path.clone(),
        })?;
        let mut staged = self.doc.clone();
        staged.todos.insert(0, TodoItem::new(id, title));
        staged.next_id = next_id;
        staged.partition_completed();
        self.commit(staged)?;
        Ok(id)
    }

    /// Same placement as [`TodoStore::add`]: new items always land on top of
    /// the incomplete section, whatever `_at` says.
    pub fn insert(&mut self, _at: usize, title: impl Into<String>) -> Result<u64, StoreError> {
        self.add(title)
    }

    pub fn delete(&mut self, index: usize) -> Result<(), StoreError> {
        if index >= self.len() {
            return Ok(());
        }
        let mut staged = self.doc.clone();
        staged.todos.remove(index);
        self.commit(staged)
    }

    /// Flip completion and re-partition, so a completed item sinks to the
    /// bottom and a reopened one rises to the end of the incomplete block.
    pub fn toggle(&mut self, index: usize) -> Result<(), StoreError> {
        if index >= self.len() {
            return Ok(());
        }
        let mut staged = self.doc.clone();
        staged.todos[index].completed = !staged.todos[index].completed;
        staged.partition_completed();
        self.commit(staged)
    }

    /// Replace the title only. Position, id, completion and timestamp stay.
    pub fn update(&mut self, index: usize, title: impl Into<String>) -> Result<(), StoreError> {
        if index >= self.len() {
            return Ok(());
        }
        let mut staged = self.doc.clone();
        staged.todos[index].title = title.into();
        self.commit(staged)
    }

    /// Re-apply the completion partition and persist.
    pub fn sort(&mut self) -> Result<(), StoreError> {
        let mut staged = self.doc.clone();
        staged.partition_completed();
        self.commit(staged)
    }

    /// [`TodoStore::delete`] addressed by id. `Ok(false)` if the id is unknown.
    pub fn delete_id(&mut self, id: u64) -> Result<bool, StoreError> {
        self.at_id(id, Self::delete)
    }

    /// [`TodoStore::toggle`] addressed by id. `Ok(false)` if the id is unknown.
    pub fn toggle_id(&mut self, id: u64) -> Result<bool, StoreError> {
        self.at_id(id, Self::toggle)
    }

    /// [`TodoStore::update`] addressed by id. `Ok(false)` if the id is unknown.
    pub fn update_id(&mut self, id: u64, title: impl Into<String>) -> Result<bool, StoreError> {
        let title = title.into();
        self.at_id(id, |store, index| store.update(index, title))
    }

    fn at_id<F>(&mut self, id: u64, op: F) -> Result<bool, StoreError>
    where
        F: FnOnce(&mut Self, usize) -> Result<(), StoreError>,
    {
        match self.position_of(id) {
            Some(index) => op(self, index).map(|()| true),
            None => Ok(false),
        }
    }

    fn commit(&mut self, staged: TodoDocument) -> Result<(), StoreError> {
        write_document(&self.path, &staged)?;
        self.doc = staged;
        Ok(())
    }
}

/// `<path>.corrupted`, keeping the original extension.
pub fn corrupted_backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(CORRUPTED_SUFFIX);
    PathBuf::from(name)
}

fn set_aside_corrupted(path: &Path, bytes: &[u8], source: serde_json::Error) -> StoreError {
    let backup = corrupted_backup_path(path);
    match fs::write(&backup, bytes) {
        Ok(()) => StoreError::Corrupted { backup, source },
        Err(backup_error) => StoreError::CorruptedBackupFailed {
            path: path.to_path_buf(),
            source,
            backup_error,
        },
    }
}

fn write_document(path: &Path, doc: &TodoDocument) -> Result<(), StoreError> {
    let json = doc.to_json().map_err(StoreError::Encode)?;
    write_atomic_with(path, |file| file.write_all(&json))
}

/// Create a temp file next to `path`, let `fill` write it, sync, then rename
/// it over `path`. The temp file removes itself on every early return, so a
/// failure never leaves debris and never touches `path`.
pub(crate) fn write_atomic_with<F>(path: &Path, fill: F) -> Result<(), StoreError>
where
    F: FnOnce(&mut fs::File) -> io::Result<()>,
{
    // Same directory as the target, so the rename stays on one filesystem.
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
        .map_err(write_error(WriteStage::CreateTemp, path))?;

    fill(tmp.as_file_mut()).map_err(write_error(WriteStage::Write, path))?;
    tmp.as_file()
        .sync_all()
        .map_err(write_error(WriteStage::Sync, path))?;

    // PersistError hands the temp file back; dropping it deletes it.
    tmp.persist(path)
        .map_err(|e| write_error(WriteStage::Rename, path)(e.error))?;
    Ok(())
}

fn write_error(stage: WriteStage, path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Write {
        stage,
        path: path.to_path_buf(),
        source,
    }
}
