use crate::id::{GroupId, NodeId, PageId, TerminalKey};

/// Structural and selection events emitted by the tree model.
///
/// Events accumulate in a queue owned by the model and are drained
/// synchronously by the layout engine after each mutating call, so a
/// listener always observes a fully settled tree.
#[derive(Clone, Debug, PartialEq)]
pub enum TreeEvent {
    PageAdded {
        page_id: PageId,
        terminal_key: TerminalKey,
    },
    PageDeleted {
        page_id: PageId,
    },
    GroupAdded {
        group_id: GroupId,
        page_id: PageId,
        terminal_key: TerminalKey,
    },
    GroupDeleted {
        group_id: GroupId,
        page_id: PageId,
    },
    TerminalAdded {
        terminal_key: TerminalKey,
        group_id: GroupId,
    },
    TerminalDeleted {
        terminal_key: TerminalKey,
        group_id: GroupId,
    },
    NodeRenamed {
        id: NodeId,
    },
    SelectionChanged(SelectionChangedEvent),
}

/// Snapshot of the active-selection pointers after a selection transition.
///
/// The pointers are coherent: whenever a finer pointer is set, the coarser
/// ones name its ancestors.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SelectionChangedEvent {
    pub active_page_id: Option<PageId>,
    pub active_group_id: Option<GroupId>,
    pub active_terminal_id: Option<TerminalKey>,
}
