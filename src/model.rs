use serde::{Deserialize, Serialize};

/// Identifier of a concept node as produced by the generator.
pub type NodeId = String;

/// Canonical (un-laid-out) concept node. This is what gets generated and persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MindmapNode {
    pub id: NodeId,
    pub label: String,
    #[serde(default)]
    pub parent_id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_label: Option<String>,
}

impl MindmapNode {
    pub fn root(id: impl Into<NodeId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            parent_id: None,
            edge_label: None,
        }
    }

    pub fn child(
        id: impl Into<NodeId>,
        label: impl Into<String>,
        parent_id: impl Into<NodeId>,
        edge_label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            parent_id: Some(parent_id.into()),
            edge_label: Some(edge_label.into()),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Half-plane a node is drawn in, relative to the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
    Center,
}

impl Side {
    /// Direction of growth along the x axis.
    pub fn sign(self) -> f64 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
            Side::Center => 0.0,
        }
    }
}

/// Connection point on a node's box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleSide {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedNode {
    pub id: NodeId,
    pub label: String,
    pub level: usize,
    pub side: Side,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_label: Option<String>,
    pub x: f64,
    pub y: f64,
}

/// Directed parent -> child connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source_id: NodeId,
    pub target_id: NodeId,
    pub source_handle_side: HandleSide,
    pub target_handle_side: HandleSide,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Edge {
    /// Builds the edge from `parent` to a child drawn on `side`.
    ///
    /// Handles face away from the root: a left child is entered on its right
    /// handle and leaves the parent through the parent's left handle.
    pub fn between(parent: &str, child: &PositionedNode) -> Self {
        let (source_handle_side, target_handle_side) = match child.side {
            Side::Left => (HandleSide::Left, HandleSide::Right),
            Side::Right | Side::Center => (HandleSide::Right, HandleSide::Left),
        };

        Self {
            id: edge_id(parent, &child.id),
            source_id: parent.to_string(),
            target_id: child.id.clone(),
            source_handle_side,
            target_handle_side,
            label: child.edge_label.clone(),
        }
    }
}

pub fn edge_id(source: &str, target: &str) -> String {
    format!("e-{source}-{target}")
}

/// Output contract handed to a renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MindmapLayout {
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<Edge>,
}

impl MindmapLayout {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&PositionedNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn root(&self) -> Option<&PositionedNode> {
        self.nodes.iter().find(|n| n.side == Side::Center)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positioned(id: &str, side: Side) -> PositionedNode {
        PositionedNode {
            id: id.to_string(),
            label: id.to_string(),
            level: 1,
            side,
            edge_label: Some("has".to_string()),
            x: 0.0,
            y: 0.0,
        }
    }

    #[test]
    fn test_node_deserializes_camel_case() {
        let json = r#"{"id":"a","label":"Atoms","parentId":"root","edgeLabel":"consists of"}"#;
        let node: MindmapNode = serde_json::from_str(json).unwrap();

        assert_eq!(node.parent_id.as_deref(), Some("root"));
        assert_eq!(node.edge_label.as_deref(), Some("consists of"));
        assert!(!node.is_root());
    }

    #[test]
    fn test_root_node_without_optional_fields() {
        let json = r#"{"id":"root","label":"Chemistry","parentId":null}"#;
        let node: MindmapNode = serde_json::from_str(json).unwrap();
        assert!(node.is_root());
        assert!(node.edge_label.is_none());

        let missing = r#"{"id":"root","label":"Chemistry"}"#;
        let node: MindmapNode = serde_json::from_str(missing).unwrap();
        assert!(node.is_root());
    }

    #[test]
    fn test_persisted_node_has_no_coordinates() {
        let node = MindmapNode::child("a", "Atoms", "root", "has");
        let json = serde_json::to_string(&node).unwrap();

        assert!(!json.contains("\"x\""));
        assert!(!json.contains("\"y\""));
        assert!(json.contains("\"parentId\":\"root\""));
    }

    #[test]
    fn test_edge_handles_point_away_from_root() {
        let left = Edge::between("root", &positioned("l", Side::Left));
        assert_eq!(left.source_handle_side, HandleSide::Left);
        assert_eq!(left.target_handle_side, HandleSide::Right);

        let right = Edge::between("root", &positioned("r", Side::Right));
        assert_eq!(right.source_handle_side, HandleSide::Right);
        assert_eq!(right.target_handle_side, HandleSide::Left);
        assert_eq!(right.id, "e-root-r");
        assert_eq!(right.label.as_deref(), Some("has"));
    }

    #[test]
    fn test_side_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Side::Center).unwrap(), "\"center\"");
        assert_eq!(serde_json::to_string(&HandleSide::Left).unwrap(), "\"left\"");
    }
}
