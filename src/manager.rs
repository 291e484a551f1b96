use std::collections::HashMap;

use anyhow::Result;
use chrono::Utc;
use ratatui::layout::Rect;
use tokio::sync::mpsc;

use crate::config::{Config, TreeViewLocation};
use crate::event::{SelectionChangedEvent, TreeEvent};
use crate::id::{GroupId, NodeId, PageId, TerminalKey};
use crate::layout::{Orientation, SplitPanel};
use crate::session::{
    GroupLayout, LayoutSnapshot, PageLayout, PanelRelativeSizes, RestoreError, TerminalLayout,
    SNAPSHOT_VERSION,
};
use crate::terminal::{TerminalOptions, TerminalResource, TerminalSpawner};
use crate::tree::TreeModel;

/// The two fixed children of the outermost split: the tree view and the
/// stacked terminal pages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RootSlot {
    TreeView,
    Terminals,
}

/// Focus and highlight requests for the view layer, sent whenever the active
/// terminal changes. The manager never touches input focus itself.
#[derive(Clone, Debug, PartialEq)]
pub enum ViewCommand {
    FocusTerminal(TerminalKey),
    FlashTerminal { key: TerminalKey, duration_ms: u64 },
}

/// Resolved geometry for one frame: where the tree view and terminal area
/// sit, and a rect per terminal of the visible page.
#[derive(Clone, Debug, Default)]
pub struct LayoutFrame {
    pub tree_area: Rect,
    pub terminal_area: Rect,
    pub terminals: Vec<(TerminalKey, Rect)>,
}

/// The layout engine: keeps one live panel per tree node, mirrored 1:1 by id.
///
/// User-facing operations spawn a terminal resource, register the matching
/// panels, then hand the ids to the tree model. The model validates the
/// mutation and records events; [`TerminalManager::pump`] drains them and
/// performs the corresponding panel attach/detach, so the tree stays the
/// source of truth and the panels a projection of it. The one exception is
/// restore, which rebuilds both sides from a snapshot.
pub struct TerminalManager {
    tree: TreeModel,
    config: Config,
    spawner: Box<dyn TerminalSpawner>,
    view_tx: mpsc::UnboundedSender<ViewCommand>,
    page_panels: HashMap<PageId, SplitPanel<GroupId>>,
    group_panels: HashMap<GroupId, SplitPanel<TerminalKey>>,
    terminals: HashMap<TerminalKey, TerminalResource>,
    /// Page panels in attach order; selection decides which one is shown.
    page_order: Vec<PageId>,
    visible_page: Option<PageId>,
    last_focused: Option<TerminalKey>,
    root: SplitPanel<RootSlot>,
    title: String,
    state_is_set: bool,
}

impl TerminalManager {
    pub fn new(
        config: Config,
        spawner: Box<dyn TerminalSpawner>,
        view_tx: mpsc::UnboundedSender<ViewCommand>,
    ) -> Self {
        let mut root = SplitPanel::new(Orientation::Horizontal);
        match config.tree_view_location {
            TreeViewLocation::Left => {
                root.push_child(RootSlot::TreeView);
                root.push_child(RootSlot::Terminals);
            }
            TreeViewLocation::Right => {
                root.push_child(RootSlot::Terminals);
                root.push_child(RootSlot::TreeView);
            }
        }
        let mut manager = Self {
            tree: TreeModel::new(),
            config,
            spawner,
            view_tx,
            page_panels: HashMap::new(),
            group_panels: HashMap::new(),
            terminals: HashMap::new(),
            page_order: Vec::new(),
            visible_page: None,
            last_focused: None,
            root,
            title: String::new(),
            state_is_set: false,
        };
        let sizes = manager.config.panel_sizes;
        manager.set_panel_sizes(sizes);
        manager
    }

    pub fn tree(&self) -> &TreeModel {
        &self.tree
    }

    /// `Page > Group > Terminal` breadcrumb of the active path, mirrored from
    /// the tree on every selection change and rename.
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn visible_page_id(&self) -> Option<PageId> {
        self.visible_page
    }

    pub fn page_ids(&self) -> &[PageId] {
        &self.page_order
    }

    pub fn terminal(&self, key: TerminalKey) -> Option<&TerminalResource> {
        self.terminals.get(&key)
    }

    pub fn page_panel(&self, id: PageId) -> Option<&SplitPanel<GroupId>> {
        self.page_panels.get(&id)
    }

    pub fn group_panel(&self, id: GroupId) -> Option<&SplitPanel<TerminalKey>> {
        self.group_panels.get(&id)
    }

    /// Mutable panel access for host-driven resizing.
    pub fn page_panel_mut(&mut self, id: PageId) -> Option<&mut SplitPanel<GroupId>> {
        self.page_panels.get_mut(&id)
    }

    pub fn group_panel_mut(&mut self, id: GroupId) -> Option<&mut SplitPanel<TerminalKey>> {
        self.group_panels.get_mut(&id)
    }

    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Create the initial default page unless state was already set (or
    /// `force` is given, as after the last page disappears).
    pub async fn populate_layout(&mut self, force: bool) -> Result<()> {
        if !self.state_is_set || force {
            self.create_terminal_page().await?;
            self.state_is_set = true;
        }
        Ok(())
    }

    /// Spawn one terminal and wrap it in a fresh group and page. The tree is
    /// only touched after the spawn succeeds, so a factory failure leaves
    /// everything as it was.
    pub async fn create_terminal_page(&mut self) -> Result<PageId> {
        let mut resource = self.spawner.spawn(TerminalOptions::default()).await?;
        resource.start();
        let terminal_key = resource.key();
        let group_id = self.unique_group_id();
        let page_id = self.unique_page_id();

        let mut group_panel = SplitPanel::new(Orientation::Vertical);
        group_panel.push_child(terminal_key);
        let mut page_panel = SplitPanel::new(Orientation::Horizontal);
        page_panel.push_child(group_id);

        self.terminals.insert(terminal_key, resource);
        self.group_panels.insert(group_id, group_panel);
        self.page_panels.insert(page_id, page_panel);

        self.tree.add_page(terminal_key, group_id, page_id);
        self.pump();
        Ok(page_id)
    }

    /// Spawn one terminal in a fresh group appended to an existing page.
    /// An unknown page id is a no-op and nothing is spawned.
    pub async fn add_terminal_group_to_page(&mut self, page_id: PageId) -> Result<()> {
        if self.tree.page(page_id).is_none() {
            return Ok(());
        }
        let mut resource = self.spawner.spawn(TerminalOptions::default()).await?;
        resource.start();
        let terminal_key = resource.key();
        let group_id = self.unique_group_id();

        let mut group_panel = SplitPanel::new(Orientation::Vertical);
        group_panel.push_child(terminal_key);
        self.terminals.insert(terminal_key, resource);
        self.group_panels.insert(group_id, group_panel);

        self.tree.add_group(terminal_key, group_id, page_id);
        self.pump();
        Ok(())
    }

    /// Spawn one terminal appended to an existing group. An unknown group id
    /// is a no-op and nothing is spawned.
    pub async fn add_terminal_to_group(&mut self, group_id: GroupId) -> Result<()> {
        if self.tree.group(group_id).is_none() {
            return Ok(());
        }
        let mut resource = self.spawner.spawn(TerminalOptions::default()).await?;
        resource.start();
        let terminal_key = resource.key();
        self.terminals.insert(terminal_key, resource);

        self.tree.add_terminal(terminal_key, group_id);
        self.pump();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Deletion
    // -----------------------------------------------------------------------

    pub async fn delete_terminal(&mut self, key: TerminalKey) -> Result<()> {
        self.tree.delete_terminal(key);
        self.pump();
        self.ensure_populated().await
    }

    pub async fn delete_group(&mut self, group_id: GroupId) -> Result<()> {
        self.tree.delete_group(group_id);
        self.pump();
        self.ensure_populated().await
    }

    pub async fn delete_page(&mut self, page_id: PageId) -> Result<()> {
        self.tree.delete_page(page_id);
        self.pump();
        self.ensure_populated().await
    }

    /// The view is never left without a page.
    async fn ensure_populated(&mut self) -> Result<()> {
        if self.page_panels.is_empty() {
            self.populate_layout(true).await?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Selection & rename
    // -----------------------------------------------------------------------

    pub fn select(&mut self, id: NodeId) {
        self.tree.select(id);
        self.pump();
    }

    /// Entry point for externally driven focus changes (a terminal gained
    /// input focus outside the tree view).
    pub fn select_terminal(&mut self, key: TerminalKey) {
        if self.tree.terminal(key).is_some() {
            self.select(NodeId::Terminal(key));
        }
    }

    pub fn toggle_rename(&mut self, id: NodeId) {
        self.tree.toggle_rename(id);
        self.pump();
    }

    pub fn rename(&mut self, id: NodeId, new_label: &str) {
        self.tree.rename(id, new_label);
        self.pump();
    }

    // -----------------------------------------------------------------------
    // Event pump
    // -----------------------------------------------------------------------

    /// Drain the tree's event queue and apply the matching panel mutations.
    /// Runs synchronously after every model call, so panels never lag the
    /// tree across an await point.
    fn pump(&mut self) {
        for event in self.tree.take_events() {
            match event {
                TreeEvent::PageAdded { page_id, .. } => {
                    if self.page_panels.contains_key(&page_id) {
                        self.page_order.push(page_id);
                    }
                }
                TreeEvent::PageDeleted { page_id } => {
                    self.page_panels.remove(&page_id);
                    self.page_order.retain(|id| *id != page_id);
                    if self.visible_page == Some(page_id) {
                        self.visible_page = None;
                    }
                }
                TreeEvent::GroupAdded {
                    group_id, page_id, ..
                } => {
                    if let Some(panel) = self.page_panels.get_mut(&page_id) {
                        panel.push_child(group_id);
                    }
                }
                TreeEvent::GroupDeleted { group_id, page_id } => {
                    self.group_panels.remove(&group_id);
                    if let Some(panel) = self.page_panels.get_mut(&page_id) {
                        panel.remove_child(group_id);
                    }
                }
                TreeEvent::TerminalAdded {
                    terminal_key,
                    group_id,
                } => {
                    if let Some(panel) = self.group_panels.get_mut(&group_id) {
                        panel.push_child(terminal_key);
                    }
                }
                TreeEvent::TerminalDeleted {
                    terminal_key,
                    group_id,
                } => {
                    if let Some(mut resource) = self.terminals.remove(&terminal_key) {
                        resource.dispose();
                    }
                    if let Some(panel) = self.group_panels.get_mut(&group_id) {
                        panel.remove_child(terminal_key);
                    }
                    if self.last_focused == Some(terminal_key) {
                        self.last_focused = None;
                    }
                }
                TreeEvent::NodeRenamed { .. } => {
                    self.title = self.tree.active_path_name();
                }
                TreeEvent::SelectionChanged(sel) => self.handle_selection_changed(sel),
            }
        }
    }

    /// Show the active page, hide its siblings, and ask the view to flash
    /// the active terminal (and move focus when it actually changed).
    fn handle_selection_changed(&mut self, sel: SelectionChangedEvent) {
        if let Some(page_id) = sel.active_page_id {
            if self.page_panels.contains_key(&page_id) {
                self.visible_page = Some(page_id);
            }
            self.title = self.tree.active_path_name();
        }
        if let Some(key) = sel.active_terminal_id {
            let _ = self.view_tx.send(ViewCommand::FlashTerminal {
                key,
                duration_ms: self.config.flash_duration_ms,
            });
            if self.last_focused != Some(key) {
                let _ = self.view_tx.send(ViewCommand::FocusTerminal(key));
                self.last_focused = Some(key);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Geometry
    // -----------------------------------------------------------------------

    /// Set the split between the tree view and the terminal area. Applied on
    /// the next layout pass if the root panel has no dimensions yet.
    pub fn set_panel_sizes(&mut self, sizes: PanelRelativeSizes) {
        let ordered = match self.config.tree_view_location {
            TreeViewLocation::Left => vec![sizes.tree, sizes.terminal],
            TreeViewLocation::Right => vec![sizes.terminal, sizes.tree],
        };
        self.root.set_relative_sizes(ordered);
    }

    /// Resolve the whole layout against concrete dimensions. Every page panel
    /// is resolved (which is what applies sizes parked by a restore), but
    /// only the visible page contributes terminal rects to the frame.
    pub fn layout(&mut self, area: Rect) -> LayoutFrame {
        let mut frame = LayoutFrame::default();
        for (slot, rect) in self.root.layout(area) {
            match slot {
                RootSlot::TreeView => frame.tree_area = rect,
                RootSlot::Terminals => frame.terminal_area = rect,
            }
        }
        for page_id in self.page_order.clone() {
            let Some(page_panel) = self.page_panels.get_mut(&page_id) else {
                continue;
            };
            let visible = self.visible_page == Some(page_id);
            for (group_id, group_rect) in page_panel.layout(frame.terminal_area) {
                if let Some(group_panel) = self.group_panels.get_mut(&group_id) {
                    let terminal_rects = group_panel.layout(group_rect);
                    if visible {
                        frame.terminals.extend(terminal_rects);
                    }
                }
            }
        }
        frame
    }

    // -----------------------------------------------------------------------
    // Serialize / restore
    // -----------------------------------------------------------------------

    /// Capture the whole layout: the tree nesting in depth-first order plus
    /// the relative sizes of every live split panel. Pure snapshot, the tree
    /// is not touched.
    pub fn layout_data(&self) -> LayoutSnapshot {
        let pages = self
            .tree
            .pages()
            .iter()
            .map(|page| {
                let group_widths = self
                    .page_panels
                    .get(&page.id)
                    .map(|p| p.relative_sizes().to_vec());
                let groups = page
                    .groups
                    .iter()
                    .map(|group| {
                        let terminal_heights = self
                            .group_panels
                            .get(&group.id)
                            .map(|p| p.relative_sizes().to_vec());
                        let terminals = group
                            .terminals
                            .iter()
                            .map(|t| TerminalLayout {
                                id: t.id,
                                label: t.label.clone(),
                            })
                            .collect();
                        GroupLayout {
                            id: group.id,
                            label: group.label.clone(),
                            counter: group.counter,
                            terminal_heights,
                            terminals,
                        }
                    })
                    .collect();
                PageLayout {
                    id: page.id,
                    label: page.label.clone(),
                    counter: page.counter,
                    group_widths,
                    groups,
                }
            })
            .collect();
        LayoutSnapshot {
            version: SNAPSHOT_VERSION,
            updated_at: Utc::now(),
            panel_sizes: Some(self.panel_sizes()),
            pages,
        }
    }

    pub fn store_state(&self) -> LayoutSnapshot {
        self.layout_data()
    }

    fn panel_sizes(&self) -> PanelRelativeSizes {
        let sizes = self.root.relative_sizes();
        let (tree_idx, terminal_idx) = match self.config.tree_view_location {
            TreeViewLocation::Left => (0, 1),
            TreeViewLocation::Right => (1, 0),
        };
        let default = PanelRelativeSizes::default();
        PanelRelativeSizes {
            tree: sizes.get(tree_idx).copied().unwrap_or(default.tree),
            terminal: sizes.get(terminal_idx).copied().unwrap_or(default.terminal),
        }
    }

    /// Bring a persisted layout back: rebuild the tree from the snapshot,
    /// then the panels on top of it, then select a terminal. Restore failures
    /// never escape; the layout falls back to one default page instead. The
    /// returned error only reports a terminal factory that also failed the
    /// fallback.
    pub async fn restore_state(&mut self, snap: &LayoutSnapshot) -> Result<()> {
        if let Some(sizes) = snap.panel_sizes {
            self.set_panel_sizes(sizes);
        }
        match self.try_restore_state(snap).await {
            Ok(()) => {
                if let Some(key) = self.tree.first_terminal_key() {
                    self.select_terminal(key);
                }
            }
            Err(e) => {
                eprintln!("termdeck: layout restore failed: {e}");
                self.recover().await?;
            }
        }
        self.state_is_set = true;
        Ok(())
    }

    async fn try_restore_state(&mut self, snap: &LayoutSnapshot) -> Result<(), RestoreError> {
        snap.validate()?;
        self.discard_panels();
        self.tree.restore(snap);
        self.build_panels(snap).await
    }

    /// Rebuild the panels for a tree that was already reconstructed to match
    /// the snapshot. A mismatch between the two falls back to one default
    /// page, like any other restore failure.
    pub async fn restore_layout_data(&mut self, snap: &LayoutSnapshot) -> Result<()> {
        self.discard_panels();
        if let Err(e) = self.build_panels(snap).await {
            eprintln!("termdeck: layout restore failed: {e}");
            self.recover().await?;
        }
        Ok(())
    }

    /// Walk the snapshot top-down, verifying each id against the live tree
    /// and recreating panels and terminal resources. Relative sizes are
    /// parked on each panel and land on the next layout pass, once the panels
    /// have concrete dimensions.
    async fn build_panels(&mut self, snap: &LayoutSnapshot) -> Result<(), RestoreError> {
        for page in &snap.pages {
            if self.tree.page(page.id).is_none() {
                return Err(RestoreError::Mismatch {
                    id: page.id.to_string(),
                });
            }
            let mut page_panel = SplitPanel::new(Orientation::Horizontal);
            for group in &page.groups {
                if self.tree.group(group.id).is_none() {
                    return Err(RestoreError::Mismatch {
                        id: group.id.to_string(),
                    });
                }
                let mut group_panel = SplitPanel::new(Orientation::Vertical);
                for terminal in &group.terminals {
                    if self.tree.terminal(terminal.id).is_none() {
                        return Err(RestoreError::Mismatch {
                            id: terminal.id.to_string(),
                        });
                    }
                    let opts = TerminalOptions {
                        created_ms: Some(terminal.id.millis()),
                        title: Some(terminal.label.clone()),
                        ..Default::default()
                    };
                    let mut resource =
                        self.spawner.spawn(opts).await.map_err(RestoreError::Spawn)?;
                    if resource.key() != terminal.id {
                        return Err(RestoreError::Mismatch {
                            id: terminal.id.to_string(),
                        });
                    }
                    resource.start();
                    self.terminals.insert(terminal.id, resource);
                    group_panel.push_child(terminal.id);
                }
                if let Some(heights) = &group.terminal_heights {
                    group_panel.set_relative_sizes(heights.clone());
                }
                self.group_panels.insert(group.id, group_panel);
                page_panel.push_child(group.id);
            }
            if let Some(widths) = &page.group_widths {
                page_panel.set_relative_sizes(widths.clone());
            }
            self.page_panels.insert(page.id, page_panel);
            self.page_order.push(page.id);
        }
        Ok(())
    }

    /// Dispose every terminal resource and drop all panels, leaving the tree
    /// alone.
    fn discard_panels(&mut self) {
        for resource in self.terminals.values_mut() {
            resource.dispose();
        }
        self.terminals.clear();
        self.page_panels.clear();
        self.group_panels.clear();
        self.page_order.clear();
        self.visible_page = None;
        self.last_focused = None;
    }

    /// Full fallback after a failed restore: drop everything, reset the tree
    /// and produce one guaranteed-valid default page.
    async fn recover(&mut self) -> Result<()> {
        self.discard_panels();
        self.tree = TreeModel::new();
        self.title.clear();
        self.create_terminal_page().await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Id allocation
    // -----------------------------------------------------------------------

    /// Mint a page id unused by any live panel, regenerating on the
    /// (unlikely) collision.
    fn unique_page_id(&self) -> PageId {
        loop {
            let id = PageId::random();
            if !self.page_panels.contains_key(&id) {
                return id;
            }
        }
    }

    fn unique_group_id(&self) -> GroupId {
        loop {
            let id = GroupId::random();
            if !self.group_panels.contains_key(&id) {
                return id;
            }
        }
    }
}
