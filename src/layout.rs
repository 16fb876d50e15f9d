use crate::model::{Edge, MindmapLayout, MindmapNode, PositionedNode, Side};
use crate::tree::{ConceptTree, TreeDiagnostics, TreeIndex};
use indextree::NodeId as ArenaId;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Horizontal distance between consecutive levels
pub const HORIZONTAL_SPACING: f64 = 350.0;

/// Vertical room given to one leaf
pub const VERTICAL_SPACING: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutSettings {
    pub horizontal_spacing: f64,
    pub vertical_spacing: f64,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            horizontal_spacing: HORIZONTAL_SPACING,
            vertical_spacing: VERTICAL_SPACING,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub side: Side,
}

/// Root's direct children split by insertion index: even to the right, odd to the left.
#[derive(Debug, Default)]
pub struct SideGroups {
    pub left: Vec<ArenaId>,
    pub right: Vec<ArenaId>,
}

impl SideGroups {
    pub fn split(tree: &ConceptTree<'_>) -> Self {
        let mut groups = Self::default();
        for (i, child) in tree.children(tree.root).enumerate() {
            if i % 2 == 0 {
                groups.right.push(child);
            } else {
                groups.left.push(child);
            }
        }
        groups
    }
}

pub struct LayoutEngine {
    pub placements: HashMap<ArenaId, Placement>,
    pub leaf_counts: HashMap<ArenaId, usize>,
    settings: LayoutSettings,
}

impl LayoutEngine {
    pub fn new(settings: LayoutSettings) -> Self {
        Self {
            placements: HashMap::new(),
            leaf_counts: HashMap::new(),
            settings,
        }
    }

    pub fn calculate_layout(tree: &ConceptTree<'_>, settings: LayoutSettings) -> Self {
        let mut engine = Self::new(settings);

        // First pass: leaf counts, bottom-up
        engine.count_leaves(tree);

        // Second pass: both halves, vertically centered against the taller one
        let groups = SideGroups::split(tree);
        let right_height = engine.band_height(&groups.right);
        let left_height = engine.band_height(&groups.left);
        let max_height = right_height.max(left_height);

        engine.placements.insert(
            tree.root,
            Placement {
                x: 0.0,
                y: 0.0,
                side: Side::Center,
            },
        );

        let right_start = -max_height / 2.0 + (max_height - right_height) / 2.0;
        engine.place_side(tree, &groups.right, Side::Right, right_start);

        let left_start = -max_height / 2.0 + (max_height - left_height) / 2.0;
        engine.place_side(tree, &groups.left, Side::Left, left_start);

        engine
    }

    fn count_leaves(&mut self, tree: &ConceptTree<'_>) {
        let order: Vec<ArenaId> = tree.root.descendants(&tree.arena).collect();

        for &id in order.iter().rev() {
            let count = if tree.is_leaf(id) {
                1
            } else {
                tree.children(id)
                    .map(|child| self.leaf_counts.get(&child).copied().unwrap_or(0))
                    .sum()
            };
            self.leaf_counts.insert(id, count);
        }
    }

    pub fn leaf_count(&self, id: ArenaId) -> usize {
        self.leaf_counts.get(&id).copied().unwrap_or(0)
    }

    /// Total height of a group of subtrees stacked top to bottom.
    fn band_height(&self, tops: &[ArenaId]) -> f64 {
        tops.iter()
            .map(|&id| self.leaf_count(id) as f64 * self.settings.vertical_spacing)
            .sum()
    }

    /// Leaves take successive slots starting at `start_y`; every parent then sits
    /// halfway between its first and last child.
    fn place_side(&mut self, tree: &ConceptTree<'_>, tops: &[ArenaId], side: Side, start_y: f64) {
        let mut cursor = start_y;
        let mut visited = Vec::new();

        for &top in tops {
            for id in top.descendants(&tree.arena) {
                let level = tree.node(id).level;
                let x = side.sign() * level as f64 * self.settings.horizontal_spacing;

                let y = if tree.is_leaf(id) {
                    let y = cursor;
                    cursor += self.settings.vertical_spacing;
                    y
                } else {
                    0.0
                };

                self.placements.insert(id, Placement { x, y, side });
                visited.push(id);
            }
        }

        for &id in visited.iter().rev() {
            let mut children = tree.children(id);
            let Some(first) = children.next() else {
                continue;
            };
            let last = children.last().unwrap_or(first);

            let first_y = self.placements.get(&first).map(|p| p.y).unwrap_or(cursor);
            let last_y = self.placements.get(&last).map(|p| p.y).unwrap_or(first_y);

            if let Some(placement) = self.placements.get_mut(&id) {
                placement.y = (first_y + last_y) / 2.0;
            }
        }
    }
}

/// Lays out a flat node list. Malformed input degrades to an empty or partial layout.
pub fn layout_mindmap(nodes: &[MindmapNode], settings: &LayoutSettings) -> MindmapLayout {
    layout_with_report(nodes, settings).0
}

pub fn layout_with_report(
    nodes: &[MindmapNode],
    settings: &LayoutSettings,
) -> (MindmapLayout, TreeDiagnostics) {
    let index = TreeIndex::new(nodes);
    let tree = ConceptTree::build(&index);
    let diagnostics = TreeDiagnostics::collect(&index, tree.as_ref());

    if diagnostics.missing_root && !nodes.is_empty() {
        warn!(nodes = nodes.len(), "no root node, producing empty layout");
    }
    if !diagnostics.extra_roots.is_empty() {
        warn!(roots = ?diagnostics.extra_roots, "ignoring extra parentless nodes");
    }
    if !diagnostics.orphans.is_empty() {
        warn!(count = diagnostics.orphans.len(), orphans = ?diagnostics.orphans, "excluding unreachable nodes");
    }

    let Some(tree) = tree else {
        return (MindmapLayout::default(), diagnostics);
    };

    let engine = LayoutEngine::calculate_layout(&tree, *settings);
    let layout = assemble(&index, &tree, &engine);
    debug!(
        nodes = layout.nodes.len(),
        edges = layout.edges.len(),
        "computed mindmap layout"
    );

    (layout, diagnostics)
}

/// Emits positioned nodes in input order, plus one edge per placed child.
///
/// Nodes without a placement are skipped, never drawn at a default coordinate.
fn assemble(index: &TreeIndex<'_>, tree: &ConceptTree<'_>, engine: &LayoutEngine) -> MindmapLayout {
    let mut layout = MindmapLayout::default();

    for node in index.nodes() {
        let Some(aid) = tree.arena_id(&node.id) else {
            continue;
        };
        let Some(placement) = engine.placements.get(&aid) else {
            continue;
        };

        let positioned = PositionedNode {
            id: node.id.clone(),
            label: node.label.clone(),
            level: tree.node(aid).level,
            side: placement.side,
            edge_label: node.edge_label.clone(),
            x: placement.x,
            y: placement.y,
        };

        let parent_placed = node
            .parent_id
            .as_deref()
            .and_then(|parent| tree.arena_id(parent))
            .is_some_and(|parent| engine.placements.contains_key(&parent));

        if parent_placed {
            if let Some(parent) = node.parent_id.as_deref() {
                layout.edges.push(Edge::between(parent, &positioned));
            }
        }

        layout.nodes.push(positioned);
    }

    layout
}
