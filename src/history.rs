use crate::model::{Edge, MindmapLayout, PositionedNode};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::trace;

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Immutable capture of the node and edge lists.
///
/// Both lists are shared, so cloning a snapshot is cheap. Mutating goes through
/// [`Snapshot::nodes_mut`], which copies the node list only if it is shared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    nodes: Arc<Vec<PositionedNode>>,
    edges: Arc<Vec<Edge>>,
}

impl Snapshot {
    pub fn new(nodes: Vec<PositionedNode>, edges: Vec<Edge>) -> Self {
        Self {
            nodes: Arc::new(nodes),
            edges: Arc::new(edges),
        }
    }

    pub fn nodes(&self) -> &[PositionedNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn nodes_mut(&mut self) -> &mut Vec<PositionedNode> {
        Arc::make_mut(&mut self.nodes)
    }

    pub fn to_layout(&self) -> MindmapLayout {
        MindmapLayout {
            nodes: self.nodes.to_vec(),
            edges: self.edges.to_vec(),
        }
    }

    /// True when both snapshots share the same underlying lists.
    pub fn shares_storage_with(&self, other: &Snapshot) -> bool {
        Arc::ptr_eq(&self.nodes, &other.nodes) && Arc::ptr_eq(&self.edges, &other.edges)
    }
}

impl From<MindmapLayout> for Snapshot {
    fn from(layout: MindmapLayout) -> Self {
        Self::new(layout.nodes, layout.edges)
    }
}

/// Bounded undo stack with a cursor. Entries past the cursor are the redo branch.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<Snapshot>,
    cursor: usize,
    capacity: usize,
}

impl History {
    pub fn new(initial: Snapshot, capacity: usize) -> Self {
        let mut entries = VecDeque::with_capacity(capacity.max(1));
        entries.push_back(initial);
        Self {
            entries,
            cursor: 0,
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn current(&self) -> &Snapshot {
        &self.entries[self.cursor]
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Drops the redo branch.
    pub fn truncate_redo(&mut self) {
        self.entries.truncate(self.cursor + 1);
    }

    /// Records `snapshot` after the cursor, dropping the redo branch and, past
    /// capacity, the oldest entry.
    pub fn push(&mut self, snapshot: Snapshot) {
        self.truncate_redo();
        self.entries.push_back(snapshot);
        self.cursor = self.entries.len() - 1;

        while self.entries.len() > self.capacity {
            self.entries.pop_front();
            self.cursor -= 1;
            trace!(capacity = self.capacity, "history full, dropped oldest snapshot");
        }
    }

    pub fn undo(&mut self) -> Option<&Snapshot> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        Some(&self.entries[self.cursor])
    }

    pub fn redo(&mut self) -> Option<&Snapshot> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        Some(&self.entries[self.cursor])
    }

    /// Discards everything and starts over from `snapshot`.
    pub fn reset(&mut self, snapshot: Snapshot) {
        self.entries.clear();
        self.entries.push_back(snapshot);
        self.cursor = 0;
    }
}
