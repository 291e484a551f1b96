use std::collections::VecDeque;

use crate::event::{SelectionChangedEvent, TreeEvent};
use crate::id::{GroupId, NodeId, PageId, TerminalKey};
use crate::session::LayoutSnapshot;

/// A tab holding one or more groups side by side.
#[derive(Clone, Debug)]
pub struct PageNode {
    pub id: PageId,
    pub label: String,
    pub counter: u32,
    pub is_editing: bool,
    pub groups: Vec<GroupNode>,
}

/// A split column within a page, holding one or more terminals stacked
/// vertically.
#[derive(Clone, Debug)]
pub struct GroupNode {
    pub id: GroupId,
    pub label: String,
    pub counter: u32,
    pub is_editing: bool,
    pub parent_page_id: PageId,
    pub terminals: Vec<TerminalNode>,
}

/// Leaf node bound to one terminal resource.
#[derive(Clone, Debug)]
pub struct TerminalNode {
    pub id: TerminalKey,
    pub label: String,
    pub is_editing: bool,
    pub parent_group_id: GroupId,
}

impl TerminalNode {
    fn new(id: TerminalKey, parent_group_id: GroupId) -> Self {
        Self {
            id,
            label: "Terminal".to_string(),
            is_editing: false,
            parent_group_id,
        }
    }
}

/// The authoritative page → group → terminal hierarchy.
///
/// The model owns all node objects and the active-selection pointers, and it
/// is the only component that mutates them. Every structural change and every
/// selection transition is recorded as a [`TreeEvent`]; callers drain the
/// queue with [`TreeModel::take_events`] after each mutating call and react.
///
/// Two invariants hold after every completed mutation:
/// - every page has at least one group and every group at least one terminal
///   (deleting the last child cascades to the parent instead), and
/// - the active pointers are coherent: a finer pointer implies the coarser
///   ones name its ancestors.
#[derive(Debug, Default)]
pub struct TreeModel {
    pages: Vec<PageNode>,
    active_page: Option<PageId>,
    active_group: Option<GroupId>,
    active_terminal: Option<TerminalKey>,
    events: VecDeque<TreeEvent>,
}

impl TreeModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pages(&self) -> &[PageNode] {
        &self.pages
    }

    pub fn page(&self, id: PageId) -> Option<&PageNode> {
        self.pages.iter().find(|p| p.id == id)
    }

    pub fn group(&self, id: GroupId) -> Option<&GroupNode> {
        self.pages
            .iter()
            .flat_map(|p| &p.groups)
            .find(|g| g.id == id)
    }

    pub fn terminal(&self, key: TerminalKey) -> Option<&TerminalNode> {
        self.pages
            .iter()
            .flat_map(|p| &p.groups)
            .flat_map(|g| &g.terminals)
            .find(|t| t.id == key)
    }

    pub fn active_page_id(&self) -> Option<PageId> {
        self.active_page
    }

    pub fn active_group_id(&self) -> Option<GroupId> {
        self.active_group
    }

    pub fn active_terminal_id(&self) -> Option<TerminalKey> {
        self.active_terminal
    }

    /// Current selection pointers, as carried by `SelectionChanged`.
    pub fn selection(&self) -> SelectionChangedEvent {
        SelectionChangedEvent {
            active_page_id: self.active_page,
            active_group_id: self.active_group,
            active_terminal_id: self.active_terminal,
        }
    }

    /// Drain all events recorded since the last call, oldest first.
    pub fn take_events(&mut self) -> Vec<TreeEvent> {
        self.events.drain(..).collect()
    }

    /// `Page(1) > Group(2) > Terminal` breadcrumb for the active path.
    pub fn active_path_name(&self) -> String {
        let mut name = String::new();
        if let Some(page) = self.active_page.and_then(|id| self.page(id)) {
            name.push_str(&page.label);
        }
        if let Some(group) = self.active_group.and_then(|id| self.group(id)) {
            name.push_str(&format!(" > {}", group.label));
        }
        if let Some(terminal) = self.active_terminal.and_then(|id| self.terminal(id)) {
            name.push_str(&format!(" > {}", terminal.label));
        }
        name
    }

    /// First terminal in tree order, used as the post-restore selection when
    /// no better candidate is known.
    pub fn first_terminal_key(&self) -> Option<TerminalKey> {
        self.pages.first().and_then(Self::first_leaf_of_page)
    }

    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Create a page containing one group containing one terminal. All three
    /// ids are supplied by the caller. The new page becomes active and its
    /// terminal is selected.
    pub fn add_page(&mut self, terminal_key: TerminalKey, group_id: GroupId, page_id: PageId) {
        let page_counter = self.next_page_counter();
        let group = GroupNode {
            id: group_id,
            label: "Group(1)".to_string(),
            counter: 1,
            is_editing: false,
            parent_page_id: page_id,
            terminals: vec![TerminalNode::new(terminal_key, group_id)],
        };
        self.pages.push(PageNode {
            id: page_id,
            label: format!("Page({page_counter})"),
            counter: page_counter,
            is_editing: false,
            groups: vec![group],
        });
        self.active_page = Some(page_id);
        self.events.push_back(TreeEvent::PageAdded {
            page_id,
            terminal_key,
        });
        self.select(NodeId::Terminal(terminal_key));
    }

    /// Append a group (containing one terminal) to an existing page. Unknown
    /// `page_id` is a no-op: creation calls only ever carry ids the engine
    /// just minted.
    pub fn add_group(&mut self, terminal_key: TerminalKey, group_id: GroupId, page_id: PageId) {
        let Some(p_idx) = self.locate_page(page_id) else {
            return;
        };
        let counter = Self::next_group_counter(&self.pages[p_idx]);
        let group = GroupNode {
            id: group_id,
            label: format!("Group({counter})"),
            counter,
            is_editing: false,
            parent_page_id: page_id,
            terminals: vec![TerminalNode::new(terminal_key, group_id)],
        };
        self.events.push_back(TreeEvent::GroupAdded {
            group_id,
            page_id,
            terminal_key,
        });
        self.pages[p_idx].groups.push(group);
        self.select(NodeId::Terminal(terminal_key));
    }

    /// Append a terminal to an existing group. Unknown `group_id` is a no-op.
    pub fn add_terminal(&mut self, terminal_key: TerminalKey, group_id: GroupId) {
        let Some((p_idx, g_idx)) = self.locate_group(group_id) else {
            return;
        };
        self.pages[p_idx].groups[g_idx]
            .terminals
            .push(TerminalNode::new(terminal_key, group_id));
        self.events.push_back(TreeEvent::TerminalAdded {
            terminal_key,
            group_id,
        });
        self.select(NodeId::Terminal(terminal_key));
    }

    // -----------------------------------------------------------------------
    // Deletion
    // -----------------------------------------------------------------------

    /// Remove a terminal. Removing the only terminal of a group deletes the
    /// group instead, so no empty group ever survives the call.
    pub fn delete_terminal(&mut self, terminal_key: TerminalKey) {
        let Some((p_idx, g_idx, t_idx)) = self.locate_terminal(terminal_key) else {
            return;
        };
        if self.pages[p_idx].groups[g_idx].terminals.len() == 1 {
            let group_id = self.pages[p_idx].groups[g_idx].id;
            self.delete_group(group_id);
            return;
        }
        let was_active = self.active_terminal == Some(terminal_key);
        let group_id = self.pages[p_idx].groups[g_idx].id;
        self.events.push_back(TreeEvent::TerminalDeleted {
            terminal_key,
            group_id,
        });
        self.pages[p_idx].groups[g_idx].terminals.remove(t_idx);
        if was_active {
            let neighbor = {
                let terminals = &self.pages[p_idx].groups[g_idx].terminals;
                let candidate = if t_idx > 0 {
                    terminals.get(t_idx - 1)
                } else {
                    terminals.get(t_idx)
                };
                candidate.map(|t| t.id)
            };
            if let Some(key) = neighbor {
                self.select(NodeId::Terminal(key));
            }
        }
    }

    /// Remove a group and its terminals. Removing the only group of a page
    /// deletes the page instead.
    pub fn delete_group(&mut self, group_id: GroupId) {
        let Some((p_idx, g_idx)) = self.locate_group(group_id) else {
            return;
        };
        if self.pages[p_idx].groups.len() == 1 {
            let page_id = self.pages[p_idx].id;
            self.delete_page(page_id);
            return;
        }
        let was_active = self.active_group == Some(group_id);
        let page_id = self.pages[p_idx].id;
        {
            let group = &mut self.pages[p_idx].groups[g_idx];
            while let Some(terminal) = group.terminals.pop() {
                self.events.push_back(TreeEvent::TerminalDeleted {
                    terminal_key: terminal.id,
                    group_id,
                });
            }
        }
        self.events.push_back(TreeEvent::GroupDeleted { group_id, page_id });
        self.pages[p_idx].groups.remove(g_idx);
        if was_active {
            let neighbor = {
                let groups = &self.pages[p_idx].groups;
                let candidate = if g_idx > 0 {
                    groups.get(g_idx - 1)
                } else {
                    groups.get(g_idx)
                };
                candidate.and_then(Self::first_leaf_of_group)
            };
            if let Some(key) = neighbor {
                self.select(NodeId::Terminal(key));
            }
        }
    }

    /// Remove a page unconditionally, cascading through its groups and
    /// terminals. Listeners see terminal deletions before their group's and
    /// group deletions before the page's, groups draining back-to-front.
    pub fn delete_page(&mut self, page_id: PageId) {
        let Some(p_idx) = self.locate_page(page_id) else {
            return;
        };
        let was_active = self.active_page == Some(page_id);
        {
            let page = &mut self.pages[p_idx];
            while let Some(mut group) = page.groups.pop() {
                while let Some(terminal) = group.terminals.pop() {
                    self.events.push_back(TreeEvent::TerminalDeleted {
                        terminal_key: terminal.id,
                        group_id: group.id,
                    });
                }
                self.events.push_back(TreeEvent::GroupDeleted {
                    group_id: group.id,
                    page_id,
                });
            }
        }
        self.events.push_back(TreeEvent::PageDeleted { page_id });
        self.pages.remove(p_idx);
        if was_active {
            let neighbor = {
                let candidate = if p_idx > 0 {
                    self.pages.get(p_idx - 1)
                } else {
                    self.pages.get(p_idx)
                };
                candidate.and_then(Self::first_leaf_of_page)
            };
            match neighbor {
                Some(key) => self.select(NodeId::Terminal(key)),
                None => {
                    // Last page removed. The pointers stay undefined until the
                    // engine repopulates a default page.
                    self.active_page = None;
                    self.active_group = None;
                    self.active_terminal = None;
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Selection & rename
    // -----------------------------------------------------------------------

    /// The single entry point that moves the active-selection pointers.
    /// Selecting a terminal activates its whole ancestor chain; selecting a
    /// group or page clears the finer pointers. Every resolved call emits one
    /// `SelectionChanged`.
    pub fn select(&mut self, id: NodeId) {
        match id {
            NodeId::Terminal(key) => {
                let Some(terminal) = self.terminal(key) else {
                    return;
                };
                let group_id = terminal.parent_group_id;
                let page_id = self.group(group_id).map(|g| g.parent_page_id);
                self.active_terminal = Some(key);
                self.active_group = Some(group_id);
                self.active_page = page_id;
            }
            NodeId::Group(group_id) => {
                let Some(group) = self.group(group_id) else {
                    return;
                };
                let page_id = group.parent_page_id;
                self.active_terminal = None;
                self.active_group = Some(group_id);
                self.active_page = Some(page_id);
            }
            NodeId::Page(page_id) => {
                if self.page(page_id).is_none() {
                    return;
                }
                self.active_terminal = None;
                self.active_group = None;
                self.active_page = Some(page_id);
            }
        }
        let selection = self.selection();
        self.events.push_back(TreeEvent::SelectionChanged(selection));
    }

    /// Flag a node for inline editing; the view layer offers an editor and
    /// reports the result through [`TreeModel::rename`].
    pub fn toggle_rename(&mut self, id: NodeId) {
        if let Some((_, is_editing)) = self.label_slot_mut(id) {
            *is_editing = true;
        }
    }

    /// Apply a rename. The new label is trimmed; an empty result keeps the
    /// old label. Either way edit mode ends and `NodeRenamed` fires.
    pub fn rename(&mut self, id: NodeId, new_label: &str) {
        let trimmed = new_label.trim().to_string();
        let Some((label, is_editing)) = self.label_slot_mut(id) else {
            return;
        };
        if !trimmed.is_empty() {
            *label = trimmed;
        }
        *is_editing = false;
        self.events.push_back(TreeEvent::NodeRenamed { id });
    }

    // -----------------------------------------------------------------------
    // Restore
    // -----------------------------------------------------------------------

    /// Rebuild the whole tree from a snapshot, replacing any current content.
    ///
    /// No structural events are emitted: restore wires panels up separately,
    /// so the event-driven attach path must stay quiet. The caller validates
    /// the snapshot first; pages and groups are taken as given.
    pub fn restore(&mut self, snap: &LayoutSnapshot) {
        self.pages.clear();
        self.active_page = None;
        self.active_group = None;
        self.active_terminal = None;
        self.events.clear();
        for page in &snap.pages {
            let mut groups = Vec::with_capacity(page.groups.len());
            for group in &page.groups {
                let terminals = group
                    .terminals
                    .iter()
                    .map(|t| TerminalNode {
                        id: t.id,
                        label: t.label.clone(),
                        is_editing: false,
                        parent_group_id: group.id,
                    })
                    .collect();
                groups.push(GroupNode {
                    id: group.id,
                    label: group.label.clone(),
                    counter: group.counter,
                    is_editing: false,
                    parent_page_id: page.id,
                    terminals,
                });
            }
            self.pages.push(PageNode {
                id: page.id,
                label: page.label.clone(),
                counter: page.counter,
                is_editing: false,
                groups,
            });
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn next_page_counter(&self) -> u32 {
        self.pages.iter().map(|p| p.counter).max().unwrap_or(0) + 1
    }

    fn next_group_counter(page: &PageNode) -> u32 {
        page.groups.iter().map(|g| g.counter).max().unwrap_or(0) + 1
    }

    fn first_leaf_of_group(group: &GroupNode) -> Option<TerminalKey> {
        // Well-formedness guarantees a terminal exists; an empty group here
        // means a cascade failed to run.
        debug_assert!(
            !group.terminals.is_empty(),
            "group {} has no terminals",
            group.id
        );
        group.terminals.first().map(|t| t.id)
    }

    fn first_leaf_of_page(page: &PageNode) -> Option<TerminalKey> {
        debug_assert!(!page.groups.is_empty(), "page {} has no groups", page.id);
        page.groups.first().and_then(Self::first_leaf_of_group)
    }

    fn locate_page(&self, id: PageId) -> Option<usize> {
        self.pages.iter().position(|p| p.id == id)
    }

    fn locate_group(&self, id: GroupId) -> Option<(usize, usize)> {
        for (p_idx, page) in self.pages.iter().enumerate() {
            if let Some(g_idx) = page.groups.iter().position(|g| g.id == id) {
                return Some((p_idx, g_idx));
            }
        }
        None
    }

    fn locate_terminal(&self, key: TerminalKey) -> Option<(usize, usize, usize)> {
        for (p_idx, page) in self.pages.iter().enumerate() {
            for (g_idx, group) in page.groups.iter().enumerate() {
                if let Some(t_idx) = group.terminals.iter().position(|t| t.id == key) {
                    return Some((p_idx, g_idx, t_idx));
                }
            }
        }
        None
    }

    fn label_slot_mut(&mut self, id: NodeId) -> Option<(&mut String, &mut bool)> {
        match id {
            NodeId::Page(pid) => self
                .pages
                .iter_mut()
                .find(|p| p.id == pid)
                .map(|p| (&mut p.label, &mut p.is_editing)),
            NodeId::Group(gid) => self
                .pages
                .iter_mut()
                .flat_map(|p| &mut p.groups)
                .find(|g| g.id == gid)
                .map(|g| (&mut g.label, &mut g.is_editing)),
            NodeId::Terminal(key) => self
                .pages
                .iter_mut()
                .flat_map(|p| &mut p.groups)
                .flat_map(|g| &mut g.terminals)
                .find(|t| t.id == key)
                .map(|t| (&mut t.label, &mut t.is_editing)),
        }
    }
}
