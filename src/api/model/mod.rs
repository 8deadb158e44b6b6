//! Field schemas for the resources the query engine ships with

pub mod list;
pub mod list_item;

pub use list::{List, ListField};
pub use list_item::{ListItem, ListItemField};
