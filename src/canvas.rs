use crate::generate::GenerationError;
use crate::history::{History, Snapshot, DEFAULT_HISTORY_CAPACITY};
use crate::layout::{layout_with_report, LayoutSettings};
use crate::model::{Edge, MindmapLayout, MindmapNode, NodeId, PositionedNode};
use crate::tree::TreeDiagnostics;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Dragging {
        node_id: NodeId,
        /// Whether the pre-drag state has been recorded for this gesture
        recorded: bool,
    },
}

/// Identifies one regeneration request. Only the newest one may complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegenerationTicket(u64);

impl RegenerationTicket {
    pub fn sequence(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegenerationOutcome {
    Applied,
    /// A newer request superseded this one; its result was dropped.
    Stale,
}

/// Hover emphasis: the hovered node, its ancestors and its descendants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Highlight {
    pub hovered: Option<NodeId>,
    pub nodes: HashSet<NodeId>,
    pub edges: HashSet<String>,
}

impl Highlight {
    /// Computes the active path of `target` from the current edge list in one pass.
    pub fn compute(target: &str, edges: &[Edge]) -> Self {
        let mut parent_of: HashMap<&str, (&str, &str)> = HashMap::with_capacity(edges.len());
        let mut children_of: HashMap<&str, Vec<(&str, &str)>> = HashMap::new();
        for edge in edges {
            parent_of.insert(edge.target_id.as_str(), (edge.source_id.as_str(), edge.id.as_str()));
            children_of
                .entry(edge.source_id.as_str())
                .or_default()
                .push((edge.target_id.as_str(), edge.id.as_str()));
        }

        let mut nodes: HashSet<&str> = HashSet::new();
        let mut edge_ids: HashSet<&str> = HashSet::new();
        nodes.insert(target);

        // Up to the root
        let mut current = target;
        while let Some(&(parent, edge_id)) = parent_of.get(current) {
            edge_ids.insert(edge_id);
            if !nodes.insert(parent) {
                break;
            }
            current = parent;
        }

        // Down through the subtree
        let mut stack = vec![target];
        while let Some(node) = stack.pop() {
            for &(child, edge_id) in children_of.get(node).into_iter().flatten() {
                edge_ids.insert(edge_id);
                if nodes.insert(child) {
                    stack.push(child);
                }
            }
        }

        Self {
            hovered: Some(target.to_string()),
            nodes: nodes.into_iter().map(str::to_string).collect(),
            edges: edge_ids.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hovered.is_none()
    }
}

/// Interactive mindmap state: the live node/edge lists, undo history, drag
/// gesture tracking and hover highlight.
///
/// The canvas is the only owner of its history; renderers receive read-only
/// views through [`MindmapCanvas::snapshot`] and friends.
pub struct MindmapCanvas {
    canonical: Vec<MindmapNode>,
    settings: LayoutSettings,
    live: Snapshot,
    history: History,
    /// Live positions differ from the entry under the history cursor
    uncommitted: bool,
    drag: DragState,
    highlight: Highlight,
    next_ticket: u64,
    in_flight: Option<RegenerationTicket>,
    diagnostics: TreeDiagnostics,
}

impl MindmapCanvas {
    pub fn new(canonical: Vec<MindmapNode>, settings: LayoutSettings) -> Self {
        Self::with_capacity(canonical, settings, DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(
        canonical: Vec<MindmapNode>,
        settings: LayoutSettings,
        history_capacity: usize,
    ) -> Self {
        let (layout, diagnostics) = layout_with_report(&canonical, &settings);
        let live = Snapshot::from(layout);

        Self {
            canonical,
            settings,
            history: History::new(live.clone(), history_capacity),
            live,
            uncommitted: false,
            drag: DragState::Idle,
            highlight: Highlight::default(),
            next_ticket: 0,
            in_flight: None,
            diagnostics,
        }
    }

    // --- Read-only views ---

    pub fn nodes(&self) -> &[PositionedNode] {
        self.live.nodes()
    }

    pub fn edges(&self) -> &[Edge] {
        self.live.edges()
    }

    pub fn node(&self, id: &str) -> Option<&PositionedNode> {
        self.nodes().iter().find(|n| n.id == id)
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.live
    }

    pub fn layout(&self) -> MindmapLayout {
        self.live.to_layout()
    }

    pub fn canonical(&self) -> &[MindmapNode] {
        &self.canonical
    }

    pub fn settings(&self) -> LayoutSettings {
        self.settings
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }

    pub fn diagnostics(&self) -> &TreeDiagnostics {
        &self.diagnostics
    }

    pub fn highlight(&self) -> &Highlight {
        &self.highlight
    }

    pub fn is_active(&self, node_id: &str) -> bool {
        self.highlight.nodes.contains(node_id)
    }

    pub fn is_animated(&self, edge_id: &str) -> bool {
        self.highlight.edges.contains(edge_id)
    }

    /// Nodes in paint order: highlighted nodes last so they are drawn on top.
    pub fn draw_order(&self) -> Vec<&PositionedNode> {
        let (active, rest): (Vec<_>, Vec<_>) =
            self.nodes().iter().partition(|n| self.is_active(&n.id));
        rest.into_iter().chain(active).collect()
    }

    // --- Loading ---

    /// Replaces the mindmap with a fresh node list. History restarts from the new
    /// layout; nothing before it can be undone.
    pub fn load(&mut self, canonical: Vec<MindmapNode>) {
        let (layout, diagnostics) = layout_with_report(&canonical, &self.settings);
        self.live = Snapshot::from(layout);
        self.history.reset(self.live.clone());
        self.canonical = canonical;
        self.diagnostics = diagnostics;
        self.uncommitted = false;
        self.drag = DragState::Idle;
        self.highlight = Highlight::default();

        info!(
            nodes = self.live.nodes().len(),
            orphans = self.diagnostics.orphans.len(),
            "loaded mindmap"
        );
    }

    // --- Dragging ---

    pub fn pointer_down(&mut self, node_id: &str) -> bool {
        if self.node(node_id).is_none() {
            return false;
        }
        self.drag = DragState::Dragging {
            node_id: node_id.to_string(),
            recorded: false,
        };
        true
    }

    /// Moves a node. The first move of a gesture records the pre-drag state so the
    /// whole gesture undoes at once.
    pub fn drag_move(&mut self, node_id: &str, x: f64, y: f64) -> bool {
        let Some(index) = self.nodes().iter().position(|n| n.id == node_id) else {
            return false;
        };

        let needs_record = match &self.drag {
            DragState::Dragging {
                node_id: dragged,
                recorded,
            } if dragged == node_id => !*recorded,
            _ => true,
        };

        if needs_record {
            self.record_pre_drag();
            self.drag = DragState::Dragging {
                node_id: node_id.to_string(),
                recorded: true,
            };
        }

        let node = &mut self.live.nodes_mut()[index];
        node.x = x;
        node.y = y;
        self.uncommitted = true;
        true
    }

    pub fn pointer_up(&mut self) {
        self.drag = DragState::Idle;
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    fn record_pre_drag(&mut self) {
        if self.uncommitted {
            self.commit();
        } else {
            // Pre-drag state already sits under the cursor
            self.history.truncate_redo();
        }
    }

    fn commit(&mut self) {
        self.history.push(self.live.clone());
        self.uncommitted = false;
    }

    // --- History ---

    pub fn undo(&mut self) -> bool {
        self.drag = DragState::Idle;
        if self.uncommitted {
            self.commit();
        }

        match self.history.undo() {
            Some(snapshot) => {
                self.live = snapshot.clone();
                debug!(cursor = self.history.cursor(), "undo");
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        if self.uncommitted {
            return false;
        }

        match self.history.redo() {
            Some(snapshot) => {
                self.live = snapshot.clone();
                debug!(cursor = self.history.cursor(), "redo");
                true
            }
            None => false,
        }
    }

    /// Discards manual moves by recomputing the layout from the canonical list.
    /// Undoable: the state before the reset stays in history.
    pub fn reset_layout(&mut self) {
        self.drag = DragState::Idle;
        if self.uncommitted {
            self.commit();
        }

        let (layout, diagnostics) = layout_with_report(&self.canonical, &self.settings);
        self.live = Snapshot::from(layout);
        self.diagnostics = diagnostics;
        self.history.push(self.live.clone());
    }

    // --- Regeneration ---

    /// Starts a regeneration. Any request still in flight is superseded.
    pub fn request_regeneration(&mut self) -> RegenerationTicket {
        self.next_ticket += 1;
        let ticket = RegenerationTicket(self.next_ticket);
        if let Some(previous) = self.in_flight.replace(ticket) {
            debug!(
                previous = previous.sequence(),
                current = ticket.sequence(),
                "superseding regeneration"
            );
        }
        ticket
    }

    pub fn is_regenerating(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn cancel_regeneration(&mut self) {
        self.in_flight = None;
    }

    /// Applies a generator result if `ticket` is still the newest request.
    ///
    /// On success the mindmap is reloaded and history restarts. A failure leaves
    /// the current mindmap untouched and is handed back to the caller.
    pub fn finish_regeneration(
        &mut self,
        ticket: RegenerationTicket,
        result: Result<Vec<MindmapNode>, GenerationError>,
    ) -> Result<RegenerationOutcome, GenerationError> {
        if self.in_flight != Some(ticket) {
            debug!(ticket = ticket.sequence(), "dropping stale regeneration result");
            return Ok(RegenerationOutcome::Stale);
        }
        self.in_flight = None;

        match result {
            Ok(nodes) => {
                self.load(nodes);
                Ok(RegenerationOutcome::Applied)
            }
            Err(err) => {
                warn!(error = %err, "regeneration failed, keeping current mindmap");
                Err(err)
            }
        }
    }

    // --- Hover ---

    pub fn pointer_enter(&mut self, node_id: &str) {
        if self.node(node_id).is_none() {
            return;
        }
        self.highlight = Highlight::compute(node_id, self.live.edges());
    }

    /// Clears the highlight, but only when leaving the node that set it.
    pub fn pointer_leave(&mut self, node_id: &str) {
        if self.highlight.hovered.as_deref() == Some(node_id) {
            self.highlight = Highlight::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<MindmapNode> {
        vec![
            MindmapNode::root("root", "Physics"),
            MindmapNode::child("a", "Mechanics", "root", "covers"),
            MindmapNode::child("b", "Optics", "root", "covers"),
            MindmapNode::child("a1", "Newton", "a", "includes"),
            MindmapNode::child("a2", "Energy", "a", "includes"),
            MindmapNode::child("a1x", "Inertia", "a1", "explains"),
            MindmapNode::child("b1", "Lenses", "b", "includes"),
        ]
    }

    fn canvas() -> MindmapCanvas {
        MindmapCanvas::new(sample(), LayoutSettings::default())
    }

    fn pos(canvas: &MindmapCanvas, id: &str) -> (f64, f64) {
        let n = canvas.node(id).unwrap();
        (n.x, n.y)
    }

    fn drag(canvas: &mut MindmapCanvas, id: &str, steps: &[(f64, f64)]) {
        assert!(canvas.pointer_down(id));
        for &(x, y) in steps {
            assert!(canvas.drag_move(id, x, y));
        }
        canvas.pointer_up();
    }

    #[test]
    fn test_undo_redo_single_drag() {
        let mut canvas = canvas();
        let before = pos(&canvas, "a");

        drag(&mut canvas, "a", &[(400.0, 10.0), (420.0, 20.0), (500.0, 30.0)]);
        assert_eq!(pos(&canvas, "a"), (500.0, 30.0));

        assert!(canvas.undo());
        assert_eq!(pos(&canvas, "a"), before);

        assert!(canvas.redo());
        assert_eq!(pos(&canvas, "a"), (500.0, 30.0));
        assert!(!canvas.redo());
    }

    #[test]
    fn test_each_gesture_is_one_step() {
        let mut canvas = canvas();
        let start = pos(&canvas, "b");

        drag(&mut canvas, "b", &[(-100.0, 0.0), (-110.0, 5.0)]);
        drag(&mut canvas, "b", &[(-200.0, 0.0)]);

        assert!(canvas.undo());
        assert_eq!(pos(&canvas, "b"), (-110.0, 5.0));
        assert!(canvas.undo());
        assert_eq!(pos(&canvas, "b"), start);
        assert!(!canvas.undo());
    }

    #[test]
    fn test_drag_after_undo_drops_redo() {
        let mut canvas = canvas();
        drag(&mut canvas, "a", &[(1.0, 1.0)]);
        canvas.undo();
        drag(&mut canvas, "b", &[(2.0, 2.0)]);

        assert!(!canvas.redo());
        assert_eq!(pos(&canvas, "b"), (2.0, 2.0));
    }

    #[test]
    fn test_history_is_bounded() {
        let mut canvas = canvas();
        for i in 0..200 {
            drag(&mut canvas, "a1", &[(i as f64, 0.0)]);
            assert!(canvas.history().len() <= DEFAULT_HISTORY_CAPACITY);
        }
        while canvas.undo() {}
        assert!(canvas.history().len() <= DEFAULT_HISTORY_CAPACITY);
    }

    #[test]
    fn test_unknown_node_is_ignored() {
        let mut canvas = canvas();
        assert!(!canvas.pointer_down("ghost"));
        assert!(!canvas.drag_move("ghost", 1.0, 1.0));
        assert!(!canvas.undo());
    }

    #[test]
    fn test_reset_layout_is_undoable() {
        let mut canvas = canvas();
        let original = pos(&canvas, "a");
        drag(&mut canvas, "a", &[(999.0, 999.0)]);

        canvas.reset_layout();
        assert_eq!(pos(&canvas, "a"), original);

        assert!(canvas.undo());
        assert_eq!(pos(&canvas, "a"), (999.0, 999.0));
        assert!(canvas.redo());
        assert_eq!(pos(&canvas, "a"), original);
    }

    #[test]
    fn test_regenerate_discards_history() {
        let mut canvas = canvas();
        drag(&mut canvas, "a", &[(1.0, 1.0)]);
        canvas.undo();

        let ticket = canvas.request_regeneration();
        assert!(canvas.is_regenerating());
        let outcome = canvas.finish_regeneration(ticket, Ok(vec![MindmapNode::root("r", "Fresh")]));

        assert_eq!(outcome.unwrap(), RegenerationOutcome::Applied);
        assert!(!canvas.is_regenerating());
        assert_eq!(canvas.history().len(), 1);
        assert!(!canvas.undo());
        assert!(!canvas.redo());
        assert_eq!(canvas.nodes().len(), 1);
    }

    #[test]
    fn test_last_regeneration_wins() {
        let mut canvas = canvas();
        let first = canvas.request_regeneration();
        let second = canvas.request_regeneration();

        let late = canvas.finish_regeneration(second, Ok(vec![MindmapNode::root("new", "New")]));
        assert_eq!(late.unwrap(), RegenerationOutcome::Applied);

        let stale = canvas.finish_regeneration(first, Ok(vec![MindmapNode::root("old", "Old")]));
        assert_eq!(stale.unwrap(), RegenerationOutcome::Stale);
        assert!(canvas.node("new").is_some());
        assert!(canvas.node("old").is_none());
    }

    #[test]
    fn test_failed_regeneration_keeps_map() {
        let mut canvas = canvas();
        let ticket = canvas.request_regeneration();
        let result = canvas.finish_regeneration(
            ticket,
            Err(GenerationError::Upstream("timeout".to_string())),
        );

        assert!(result.is_err());
        assert!(!canvas.is_regenerating());
        assert_eq!(canvas.nodes().len(), 7);
    }

    #[test]
    fn test_hover_highlights_path_and_subtree() {
        let mut canvas = canvas();
        canvas.pointer_enter("a1");

        let mut active: Vec<_> = canvas.highlight().nodes.iter().cloned().collect();
        active.sort();
        assert_eq!(active, ["a", "a1", "a1x", "root"]);

        assert!(canvas.is_animated("e-root-a"));
        assert!(canvas.is_animated("e-a-a1"));
        assert!(canvas.is_animated("e-a1-a1x"));
        assert!(!canvas.is_animated("e-a-a2"));
        assert!(!canvas.is_active("a2"));
        assert!(!canvas.is_active("b"));
        assert_eq!(canvas.highlight().edges.len(), 3);
    }

    #[test]
    fn test_leave_only_clears_for_hovered_node() {
        let mut canvas = canvas();
        canvas.pointer_enter("a");
        canvas.pointer_leave("a1");
        assert!(canvas.is_active("a"));

        canvas.pointer_leave("a");
        assert!(canvas.highlight().is_empty());
        assert!(!canvas.is_active("a"));
    }

    #[test]
    fn test_active_nodes_drawn_last() {
        let mut canvas = canvas();
        canvas.pointer_enter("b1");

        let order: Vec<_> = canvas.draw_order().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(order.len(), 7);
        assert_eq!(&order[4..], ["root", "b", "b1"]);
    }
}
