//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::fs;
use std::path::Path;

use chrono::{Duration, Utc};
use tempfile::TempDir;

use crate::core::todo::{TodoDocument, TodoItem};

/// A throwaway directory, removed when dropped.
pub fn scratch() -> TempDir {
    TempDir::new().expect("failed to create temp dir")
}

/// `n` items with ids `1..=n`, every third one completed (ids 1, 4, 7, ...),
/// each an hour older than the previous.
pub fn sample_items(n: usize) -> Vec<TodoItem> {
    let now = Utc::now();
    (0..n)
        .map(|i| TodoItem {
            id: i as u64 + 1,
            title: format!("Todo item number {} with some descriptive text", i + 1),
            completed: i % 3 == 0,
            created_at: now - Duration::hours(i as i64),
        })
        .collect()
}

/// A document over [`sample_items`], with `next_id = n + 1`.
pub fn sample_document(n: usize) -> TodoDocument {
    TodoDocument {
        todos: sample_items(n),
        next_id: n as u64 + 1,
    }
}

/// Sorted file names in `dir`.
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("failed to read dir")
        .map(|entry| {
            entry
                .expect("failed to read dir entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}
