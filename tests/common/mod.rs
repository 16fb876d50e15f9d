#![allow(dead_code)]

use mindmap_engine::{MindmapLayout, MindmapNode};
use std::collections::HashMap;

/// Root with two branches on the right side and one on the left.
pub fn biology_nodes() -> Vec<MindmapNode> {
    vec![
        MindmapNode::root("root", "Cell Biology"),
        MindmapNode::child("a", "Organelles", "root", "covers"),
        MindmapNode::child("b", "Membranes", "root", "covers"),
        MindmapNode::child("c", "Cell Cycle", "root", "covers"),
        MindmapNode::child("a1", "Mitochondria", "a", "includes"),
        MindmapNode::child("a2", "Ribosomes", "a", "includes"),
        MindmapNode::child("a3", "Nucleus", "a", "includes"),
        MindmapNode::child("c1", "Mitosis", "c", "includes"),
    ]
}

/// A node list of `width` children under the root, each with `depth` more
/// levels below it.
pub fn grid_nodes(width: usize, depth: usize) -> Vec<MindmapNode> {
    let mut nodes = vec![MindmapNode::root("root", "Root")];
    for branch in 0..width {
        let mut parent = "root".to_string();
        for level in 0..=depth {
            let id = format!("b{branch}-{level}");
            nodes.push(MindmapNode::child(
                id.clone(),
                format!("Branch {branch} level {level}"),
                parent,
                "has",
            ));
            parent = id;
        }
    }
    nodes
}

/// `id -> (x, y)` for quick lookups in assertions.
pub fn positions(layout: &MindmapLayout) -> HashMap<String, (f64, f64)> {
    layout
        .nodes
        .iter()
        .map(|n| (n.id.clone(), (n.x, n.y)))
        .collect()
}

/// One line per node, `id level side (x, y)`, in output order.
pub fn layout_to_string(layout: &MindmapLayout) -> String {
    let mut result = String::new();
    for node in &layout.nodes {
        result.push_str(&format!(
            "{} {} {:?} ({}, {})\n",
            node.id, node.level, node.side, node.x, node.y
        ));
    }
    result
}
