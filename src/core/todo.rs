//! # Todo Items
//!
//! The atomic record and the document shape written to disk.
//!
//! ```json
//! {
//!   "todos": [
//!     { "id": 2, "title": "walk dog", "completed": false, "created_at": "2026-10-19T09:12:03.120Z" }
//!   ],
//!   "next_id": 3
//! }
//! ```
//!
//! Key names are part of the file format and must not change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single entry in a todo list.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TodoItem {
    pub id: u64,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl TodoItem {
    /// A new, incomplete item stamped with the current time.
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            completed: false,
            created_at: Utc::now(),
        }
    }
}

/// Everything persisted for one list. The file path is not part of it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TodoDocument {
    #[serde(default)]
    pub todos: Vec<TodoItem>,
    #[serde(default = "first_id")]
    pub next_id: u64,
}

fn first_id() -> u64 {
    1
}

impl Default for TodoDocument {
    fn default() -> Self {
        Self {
            todos: Vec::new(),
            next_id: first_id(),
        }
    }
}

impl TodoDocument {
    /// Stable partition: incomplete items first, completed last, encounter
    /// order kept within each group.
    pub fn partition_completed(&mut self) {
        let (incomplete, completed): (Vec<TodoItem>, Vec<TodoItem>) =
            self.todos.drain(..).partition(|item| !item.completed);
        self.todos = incomplete;
        self.todos.extend(completed);
    }

    /// Pretty JSON with two-space indentation.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }

    /// Decode a list file. `next_id` is raised past every stored id, so a
    /// missing or stale counter never hands out an id already in use.
    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        let mut doc: Self = serde_json::from_slice(bytes)?;
        doc.reserve_existing_ids();
        Ok(doc)
    }

    /// Make `next_id` at least 1 and greater than every id in `todos`.
    /// Saturates at `u64::MAX`, which the store refuses to hand out.
    pub fn reserve_existing_ids(&mut self) {
        let floor = self
            .todos
            .iter()
            .map(|item| item.id.saturating_add(1))
            .max()
            .unwrap_or_else(first_id);
        self.next_id = self.next_id.max(floor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: u64, completed: bool) -> TodoItem {
        TodoItem {
            completed,
            ..TodoItem::new(id, format!("item {id}"))
        }
    }

    #[test]
    fn test_new_item_is_incomplete() {
        let item = TodoItem::new(7, "buy milk");
        assert_eq!(item.id, 7);
        assert_eq!(item.title, "buy milk");
        assert!(!item.completed);
    }

    #[test]
    fn test_default_document_starts_at_one() {
        let doc = TodoDocument::default();
        assert!(doc.todos.is_empty());
        assert_eq!(doc.next_id, 1);
    }

    #[test]
    fn test_serialized_keys_are_snake_case() {
        let doc = TodoDocument {
            todos: vec![item(1, true)],
            next_id: 2,
        };
        let json = String::from_utf8(doc.to_json().unwrap()).unwrap();
        for key in ["\"todos\"", "\"next_id\"", "\"id\"", "\"title\"", "\"completed\"", "\"created_at\""] {
            assert!(json.contains(key), "missing {key} in {json}");
        }
        // two-space indentation
        assert!(json.contains("\n  \"todos\""));
    }

    #[test]
    fn test_parses_offset_timestamps() {
        let json = r#"{
          "todos": [
            {"id": 1, "title": "legacy", "completed": false,
             "created_at": "2024-03-01T10:15:30.123456789-05:00"}
          ],
          "next_id": 2
        }"#;
        let doc = TodoDocument::from_json(json.as_bytes()).unwrap();
        let expected: DateTime<Utc> = "2024-03-01T15:15:30.123456789Z".parse().unwrap();
        assert_eq!(doc.todos[0].created_at, expected);
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let doc = TodoDocument::from_json(b"{}").unwrap();
        assert_eq!(doc, TodoDocument::default());
    }

    #[test]
    fn test_missing_next_id_is_raised_past_existing_ids() {
        let json = r#"{"todos": [
            {"id": 1, "title": "a", "completed": false, "created_at": "2024-03-01T10:00:00Z"},
            {"id": 2, "title": "b", "completed": false, "created_at": "2024-03-01T10:00:00Z"}
        ]}"#;
        let doc = TodoDocument::from_json(json.as_bytes()).unwrap();
        assert_eq!(doc.next_id, 3);
    }

    #[test]
    fn test_stale_next_id_is_raised() {
        let mut doc = TodoDocument {
            todos: vec![item(9, false), item(4, true)],
            next_id: 5,
        };
        doc.reserve_existing_ids();
        assert_eq!(doc.next_id, 10);

        let mut zero = TodoDocument {
            todos: Vec::new(),
            next_id: 0,
        };
        zero.reserve_existing_ids();
        assert_eq!(zero.next_id, 1);
    }

    #[test]
    fn test_larger_next_id_is_kept() {
        let mut doc = TodoDocument {
            todos: vec![item(2, false)],
            next_id: 50,
        };
        doc.reserve_existing_ids();
        assert_eq!(doc.next_id, 50);
    }

    #[test]
    fn test_max_id_saturates_next_id() {
        let mut doc = TodoDocument {
            todos: vec![item(u64::MAX, false)],
            next_id: 3,
        };
        doc.reserve_existing_ids();
        assert_eq!(doc.next_id, u64::MAX);
    }

    #[test]
    fn test_partition_is_stable() {
        let mut doc = TodoDocument {
            todos: vec![item(1, true), item(2, false), item(3, true), item(4, false), item(5, false)],
            next_id: 6,
        };
        doc.partition_completed();
        let ids: Vec<u64> = doc.todos.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 4, 5, 1, 3]);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(TodoDocument::from_json(br#"{"todos": [{"id": 1, "title": "broken""#).is_err());
    }
}
