//! # Core
//!
//! Todo lists, their persistence, and the conventions around them.
//! Nothing in here knows about the command line.
//!
//! ```text
//!        ┌──────────────────────────────┐
//!        │   cli (or any other front)   │
//!        └──────┬───────────────┬───────┘
//!               │               │
//!               ▼               ▼
//!        ┌────────────┐  ┌────────────┐
//!        │ workspace  │─▶│   store    │──▶  <todo_dir>/<name>.json
//!        │ (dirs,     │  │ (load,     │
//!        │  archive)  │  │  mutate,   │
//!        └────────────┘  │  save)     │
//!                        └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`todo`]: `TodoItem` and the on-disk `TodoDocument`
//! - [`store`]: `TodoStore`, one list bound to one file
//! - [`workspace`]: active/archive directories and list files
//! - [`config`]: layered settings (defaults, file, env, flags)
//! - [`generate`]: synthetic lists for load testing

pub mod config;
pub mod generate;
pub mod store;
pub mod todo;
pub mod workspace;
