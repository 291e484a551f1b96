//! Paged terminal layout management.
//!
//! Terminal sessions are organized into a three-level hierarchy: pages
//! (tabs) hold groups (side-by-side split columns), groups hold terminals.
//! The [`tree::TreeModel`] owns that hierarchy and the active-selection
//! pointers; the [`manager::TerminalManager`] keeps one live split panel per
//! node, reacts to tree events, and persists/restores the whole arrangement
//! through [`session`] snapshots.

pub mod config;
pub mod event;
pub mod id;
pub mod layout;
pub mod manager;
pub mod session;
pub mod terminal;
pub mod tree;
