//! justdoit: personal todo lists, one JSON file per list.
//!
//! The heart is [`core::store::TodoStore`]; everything else arranges files
//! around it or drives it from the command line.

pub mod cli;
pub mod core;

#[cfg(test)]
pub mod test_support;

pub use crate::core::store::{StoreError, TodoStore};
pub use crate::core::todo::{TodoDocument, TodoItem};
