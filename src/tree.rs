use crate::model::{MindmapNode, NodeId};
use indextree::{Arena, NodeId as ArenaId};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Flat-list index: `parentId -> children` and `id -> node`.
///
/// Duplicate ids keep the first occurrence; later ones are dropped.
pub struct TreeIndex<'a> {
    nodes: Vec<&'a MindmapNode>,
    by_id: HashMap<&'a str, usize>,
    children: HashMap<&'a str, Vec<usize>>,
    roots: Vec<usize>,
    duplicate_ids: Vec<NodeId>,
}

impl<'a> TreeIndex<'a> {
    pub fn new(input: &'a [MindmapNode]) -> Self {
        let mut nodes = Vec::with_capacity(input.len());
        let mut by_id = HashMap::with_capacity(input.len());
        let mut children: HashMap<&'a str, Vec<usize>> = HashMap::new();
        let mut roots = Vec::new();
        let mut duplicate_ids = Vec::new();

        for node in input {
            if by_id.contains_key(node.id.as_str()) {
                duplicate_ids.push(node.id.clone());
                continue;
            }

            let idx = nodes.len();
            by_id.insert(node.id.as_str(), idx);
            match node.parent_id.as_deref() {
                Some(parent) => children.entry(parent).or_default().push(idx),
                None => roots.push(idx),
            }
            nodes.push(node);
        }

        if !duplicate_ids.is_empty() {
            warn!(count = duplicate_ids.len(), "dropping duplicate node ids");
        }

        Self {
            nodes,
            by_id,
            children,
            roots,
            duplicate_ids,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Deduplicated nodes in input order.
    pub fn nodes(&self) -> impl Iterator<Item = &'a MindmapNode> + '_ {
        self.nodes.iter().copied()
    }

    pub fn get(&self, id: &str) -> Option<&'a MindmapNode> {
        self.by_id.get(id).map(|&idx| self.nodes[idx])
    }

    /// Direct children of `parent` (`None` lists the root-looking nodes).
    pub fn children_of(&self, parent: Option<&str>) -> impl Iterator<Item = &'a MindmapNode> + '_ {
        self.child_indices(parent).iter().map(|&idx| self.nodes[idx])
    }

    fn child_indices(&self, parent: Option<&str>) -> &[usize] {
        match parent {
            Some(id) => self.children.get(id).map(Vec::as_slice).unwrap_or(&[]),
            None => &self.roots,
        }
    }

    /// The first node without a parent.
    pub fn root(&self) -> Option<&'a MindmapNode> {
        self.children_of(None).next()
    }

    pub fn duplicate_ids(&self) -> &[NodeId] {
        &self.duplicate_ids
    }
}

#[derive(Debug, Clone)]
pub struct ConceptNode<'a> {
    pub source: &'a MindmapNode,
    pub level: usize,
}

/// Reachable part of the input, materialized as an arena tree.
pub struct ConceptTree<'a> {
    pub arena: Arena<ConceptNode<'a>>,
    pub root: ArenaId,
    by_id: HashMap<&'a str, ArenaId>,
}

impl<'a> ConceptTree<'a> {
    /// Walks from the root with an explicit stack, assigning levels as it goes.
    ///
    /// Returns `None` when the input has no root. A node is attached at most
    /// once, so an input cycle can never be entered twice.
    pub fn build(index: &TreeIndex<'a>) -> Option<Self> {
        let root_source = index.root()?;

        let mut arena = Arena::new();
        let mut by_id = HashMap::with_capacity(index.len());
        let mut visited: HashSet<&str> = HashSet::with_capacity(index.len());

        let root = arena.new_node(ConceptNode {
            source: root_source,
            level: 0,
        });
        by_id.insert(root_source.id.as_str(), root);
        visited.insert(root_source.id.as_str());

        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            let source: &'a MindmapNode = arena[current].get().source;
            let level = arena[current].get().level;

            for child in index.children_of(Some(source.id.as_str())) {
                if !visited.insert(child.id.as_str()) {
                    warn!(node = %child.id, "node reached twice, skipping subtree");
                    continue;
                }

                let child_id = arena.new_node(ConceptNode {
                    source: child,
                    level: level + 1,
                });
                current.append(child_id, &mut arena);
                by_id.insert(child.id.as_str(), child_id);
                stack.push(child_id);
            }
        }

        debug!(reachable = by_id.len(), total = index.len(), "built concept tree");

        Some(Self { arena, root, by_id })
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn arena_id(&self, id: &str) -> Option<ArenaId> {
        self.by_id.get(id).copied()
    }

    pub fn node(&self, id: ArenaId) -> &ConceptNode<'a> {
        self.arena[id].get()
    }

    pub fn level(&self, id: &str) -> Option<usize> {
        self.arena_id(id).map(|aid| self.node(aid).level)
    }

    pub fn children(&self, id: ArenaId) -> impl Iterator<Item = ArenaId> + '_ {
        id.children(&self.arena)
    }

    pub fn is_leaf(&self, id: ArenaId) -> bool {
        self.arena[id].first_child().is_none()
    }

    /// Ids of every reachable node mapped to its distance from the root.
    pub fn levels(&self) -> HashMap<&'a str, usize> {
        self.by_id
            .iter()
            .map(|(&id, &aid)| (id, self.node(aid).level))
            .collect()
    }
}

/// What was dropped from the input while building the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeDiagnostics {
    pub missing_root: bool,
    pub duplicate_ids: Vec<NodeId>,
    /// Parentless nodes after the first one.
    pub extra_roots: Vec<NodeId>,
    /// Nodes not reachable from the root, cycle members included.
    pub orphans: Vec<NodeId>,
}

impl TreeDiagnostics {
    pub fn collect(index: &TreeIndex<'_>, tree: Option<&ConceptTree<'_>>) -> Self {
        let root_id = index.root().map(|n| n.id.as_str());

        let extra_roots = index
            .children_of(None)
            .filter(|n| Some(n.id.as_str()) != root_id)
            .map(|n| n.id.clone())
            .collect();

        let orphans = index
            .nodes()
            .filter(|n| !tree.is_some_and(|t| t.contains(&n.id)))
            .map(|n| n.id.clone())
            .collect();

        Self {
            missing_root: root_id.is_none(),
            duplicate_ids: index.duplicate_ids().to_vec(),
            extra_roots,
            orphans,
        }
    }

    pub fn is_clean(&self) -> bool {
        !self.missing_root
            && self.duplicate_ids.is_empty()
            && self.extra_roots.is_empty()
            && self.orphans.is_empty()
    }
}
