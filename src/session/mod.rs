pub mod store;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id::{GroupId, PageId, TerminalKey};

pub const SNAPSHOT_VERSION: u32 = 1;

/// Why a persisted layout could not be brought back.
///
/// Any of these aborts the partially built layout; the manager logs the
/// error, discards what was created and falls back to one default page, so
/// nothing here ever reaches the caller of `restore_state`.
#[derive(Debug, Error)]
pub enum RestoreError {
    /// A snapshot id has no live tree node of the expected kind.
    #[error("layout state mismatch for {id}")]
    Mismatch { id: String },
    /// The snapshot itself violates the page/group/terminal shape.
    #[error("malformed layout snapshot: {reason}")]
    Malformed { reason: String },
    /// The terminal factory refused to recreate a persisted session.
    #[error("terminal creation failed during restore")]
    Spawn(#[source] anyhow::Error),
}

/// Serialized description of the whole layout: the page → group → terminal
/// nesting plus the relative sizes captured from each live split panel.
///
/// Taking a snapshot never mutates the tree; restoring one replaces it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    pub version: u32,
    pub updated_at: DateTime<Utc>,
    /// Split between the tree view and the terminal area.
    pub panel_sizes: Option<PanelRelativeSizes>,
    pub pages: Vec<PageLayout>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PanelRelativeSizes {
    pub tree: f64,
    pub terminal: f64,
}

impl Default for PanelRelativeSizes {
    fn default() -> Self {
        Self {
            tree: 0.2,
            terminal: 0.6,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PageLayout {
    pub id: PageId,
    pub label: String,
    pub counter: u32,
    /// Horizontal shares of the page's groups, in group order.
    pub group_widths: Option<Vec<f64>>,
    pub groups: Vec<GroupLayout>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupLayout {
    pub id: GroupId,
    pub label: String,
    pub counter: u32,
    /// Vertical shares of the group's terminals, in terminal order.
    pub terminal_heights: Option<Vec<f64>>,
    pub terminals: Vec<TerminalLayout>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TerminalLayout {
    pub id: TerminalKey,
    pub label: String,
}

impl LayoutSnapshot {
    /// Check the structural invariants a restorable snapshot must satisfy:
    /// at least one page, no empty page or group, and no duplicated id at
    /// any level.
    pub fn validate(&self) -> Result<(), RestoreError> {
        let malformed = |reason: &str| RestoreError::Malformed {
            reason: reason.to_string(),
        };
        if self.pages.is_empty() {
            return Err(malformed("no pages"));
        }
        let mut page_ids = HashSet::new();
        let mut group_ids = HashSet::new();
        let mut terminal_ids = HashSet::new();
        for page in &self.pages {
            if !page_ids.insert(page.id) {
                return Err(malformed("duplicate page id"));
            }
            if page.groups.is_empty() {
                return Err(malformed("page without groups"));
            }
            for group in &page.groups {
                if !group_ids.insert(group.id) {
                    return Err(malformed("duplicate group id"));
                }
                if group.terminals.is_empty() {
                    return Err(malformed("group without terminals"));
                }
                for terminal in &group.terminals {
                    if !terminal_ids.insert(terminal.id) {
                        return Err(malformed("duplicate terminal id"));
                    }
                }
            }
        }
        Ok(())
    }
}
