//! # Workspace
//!
//! The directory conventions around the stores:
//!
//! ```text
//! <todo_dir>/
//! ├── default.json
//! ├── groceries.json
//! └── archive/
//!     └── q3-launch.json
//! ```
//!
//! Archiving is a plain `rename` between the two directories. The store never
//! knows which directory it lives in.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;

use crate::core::store::{StoreError, TodoStore};

/// Extension of list files, without the dot.
pub const LIST_EXTENSION: &str = "json";

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("invalid list name {0:?}")]
    InvalidName(String),
    #[error("no such list: {0}")]
    NotFound(String),
    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),
    #[error("failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        source: io::Error,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct Workspace {
    todo_dir: PathBuf,
    archive_dir: PathBuf,
}

impl Workspace {
    /// Bind to the two directories, creating them if needed.
    pub fn open(
        todo_dir: impl Into<PathBuf>,
        archive_dir: impl Into<PathBuf>,
    ) -> Result<Self, WorkspaceError> {
        let workspace = Self {
            todo_dir: todo_dir.into(),
            archive_dir: archive_dir.into(),
        };
        for dir in [&workspace.todo_dir, &workspace.archive_dir] {
            fs::create_dir_all(dir).map_err(io_error("create directory", dir))?;
        }
        debug!(
            "Workspace at {} (archive {})",
            workspace.todo_dir.display(),
            workspace.archive_dir.display()
        );
        Ok(workspace)
    }

    pub fn todo_dir(&self) -> &Path {
        &self.todo_dir
    }

    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }

    /// Active list files, sorted by name.
    pub fn lists(&self) -> Result<Vec<String>, WorkspaceError> {
        list_files(&self.todo_dir, LIST_EXTENSION).map_err(io_error("list", &self.todo_dir))
    }

    /// Archived list files, sorted by name.
    pub fn archived(&self) -> Result<Vec<String>, WorkspaceError> {
        list_files(&self.archive_dir, LIST_EXTENSION).map_err(io_error("list", &self.archive_dir))
    }

    /// Path of an active list. `name` may omit the extension.
    pub fn list_path(&self, name: &str) -> Result<PathBuf, WorkspaceError> {
        Ok(self.todo_dir.join(list_file_name(name)?))
    }

    /// Path of an archived list. `name` may omit the extension.
    pub fn archived_path(&self, name: &str) -> Result<PathBuf, WorkspaceError> {
        Ok(self.archive_dir.join(list_file_name(name)?))
    }

    /// Open (or start) an active list. Does not write.
    pub fn open_list(&self, name: &str) -> Result<TodoStore, WorkspaceError> {
        Ok(TodoStore::open(self.list_path(name)?)?)
    }

    /// Make sure an active list file exists, keeping any existing content.
    pub fn create(&self, name: &str) -> Result<TodoStore, WorkspaceError> {
        let store = self.open_list(name)?;
        store.save()?;
        info!("Created list {}", store.path().display());
        Ok(store)
    }

    pub fn delete(&self, name: &str) -> Result<(), WorkspaceError> {
        let path = self.list_path(name)?;
        if !path.is_file() {
            return Err(WorkspaceError::NotFound(list_file_name(name)?));
        }
        fs::remove_file(&path).map_err(io_error("delete", &path))?;
        info!("Deleted list {}", path.display());
        Ok(())
    }

    /// Move an active list into the archive directory.
    pub fn archive(&self, name: &str) -> Result<PathBuf, WorkspaceError> {
        let from = self.list_path(name)?;
        let to = self.archived_path(name)?;
        move_list(&from, &to)?;
        info!("Archived {} to {}", from.display(), to.display());
        Ok(to)
    }

    /// Move an archived list back to the active directory.
    pub fn unarchive(&self, name: &str) -> Result<PathBuf, WorkspaceError> {
        let from = self.archived_path(name)?;
        let to = self.list_path(name)?;
        move_list(&from, &to)?;
        info!("Unarchived {} to {}", from.display(), to.display());
        Ok(to)
    }

    /// Create `name` if there are no active lists at all, so one is always
    /// available. Returns true when a list was created.
    pub fn ensure_default(&self, name: &str) -> Result<bool, WorkspaceError> {
        if !self.lists()?.is_empty() {
            return Ok(false);
        }
        self.create(name)?;
        Ok(true)
    }
}

/// Regular files in `dir` whose extension equals `ext`, sorted by name.
/// A missing directory lists as empty.
pub fn list_files(dir: &Path, ext: &str) -> io::Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().is_some_and(|e| e == ext) {
            files.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    files.sort();
    Ok(files)
}

/// `work` and `work.json` both become `work.json`. Names that could escape
/// the directory are rejected.
pub fn list_file_name(name: &str) -> Result<String, WorkspaceError> {
    let name = name.trim();
    let stem = name
        .strip_suffix(&format!(".{LIST_EXTENSION}"))
        .unwrap_or(name);
    let invalid = stem.is_empty()
        || stem.starts_with('.')
        || stem.contains(['/', '\\'])
        || stem.contains("..");
    if invalid {
        return Err(WorkspaceError::InvalidName(name.to_string()));
    }
    Ok(format!("{stem}.{LIST_EXTENSION}"))
}

/// Display name of a list file (`work.json` → `work`).
pub fn list_stem(file_name: &str) -> &str {
    file_name
        .strip_suffix(&format!(".{LIST_EXTENSION}"))
        .unwrap_or(file_name)
}

fn move_list(from: &Path, to: &Path) -> Result<(), WorkspaceError> {
    if !from.is_file() {
        let name = from
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Err(WorkspaceError::NotFound(name));
    }
    if to.exists() {
        return Err(WorkspaceError::AlreadyExists(to.to_path_buf()));
    }
    fs::rename(from, to).map_err(io_error("move", from))
}

fn io_error<'a>(action: &'static str, path: &'a Path) -> impl FnOnce(io::Error) -> WorkspaceError + 'a {
    move |source| WorkspaceError::Io {
        action,
        path: path.to_path_buf(),
        source,
    }
}
