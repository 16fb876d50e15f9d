mod common;

use insta::assert_snapshot;
use mindmap_engine::model::HandleSide;
use mindmap_engine::{layout_mindmap, layout_with_report, LayoutSettings, MindmapNode, Side};
use serde_json::json;

fn layout(nodes: &[MindmapNode]) -> mindmap_engine::MindmapLayout {
    layout_mindmap(nodes, &LayoutSettings::default())
}

#[test]
fn test_biology_layout_positions() {
    let result = layout(&common::biology_nodes());

    assert_snapshot!(common::layout_to_string(&result), @r"
    root 0 Center (0, 0)
    a 1 Right (350, -100)
    b 1 Left (-350, -50)
    c 1 Right (350, 100)
    a1 2 Right (700, -200)
    a2 2 Right (700, -100)
    a3 2 Right (700, 0)
    c1 2 Right (700, 100)
    ");
}

#[test]
fn test_edges_one_per_placed_child() {
    let result = layout(&common::biology_nodes());
    assert_eq!(result.edges.len(), result.nodes.len() - 1);

    let ids: Vec<&str> = result.edges.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(
        ids,
        [
            "e-root-a", "e-root-b", "e-root-c", "e-a-a1", "e-a-a2", "e-a-a3", "e-c-c1"
        ]
    );

    for edge in &result.edges {
        let target = result.node(&edge.target_id).unwrap();
        match target.side {
            Side::Left => {
                assert_eq!(edge.source_handle_side, HandleSide::Left);
                assert_eq!(edge.target_handle_side, HandleSide::Right);
            }
            _ => {
                assert_eq!(edge.source_handle_side, HandleSide::Right);
                assert_eq!(edge.target_handle_side, HandleSide::Left);
            }
        }
        assert_eq!(edge.label, target.edge_label);
    }
}

#[test]
fn test_levels_and_sides_drive_x() {
    let nodes = common::grid_nodes(5, 3);
    let result = layout(&nodes);
    assert_eq!(result.nodes.len(), nodes.len());

    for node in &result.nodes {
        let expected = node.side.sign() * node.level as f64 * 350.0;
        assert_eq!(node.x, expected, "x of {}", node.id);
        if node.level > 0 {
            assert_ne!(node.side, Side::Center);
        }
    }

    // Branches alternate sides, descendants inherit
    for branch in 0..5 {
        let expected = if branch % 2 == 0 { Side::Right } else { Side::Left };
        for level in 0..=3 {
            let node = result.node(&format!("b{branch}-{level}")).unwrap();
            assert_eq!(node.side, expected);
            assert_eq!(node.level, level + 1);
        }
    }
}

#[test]
fn test_parents_sit_between_first_and_last_child() {
    let result = layout(&common::biology_nodes());
    let pos = common::positions(&result);

    let a = pos["a"].1;
    assert_eq!(a, (pos["a1"].1 + pos["a3"].1) / 2.0);
    assert_eq!(pos["c"].1, pos["c1"].1);
    assert_eq!(pos["a2"].1 - pos["a1"].1, 100.0);
}

#[test]
fn test_shorter_side_is_centred_against_taller() {
    let result = layout(&common::biology_nodes());
    let pos = common::positions(&result);

    // Right band spans -200..200, left band is a single slot centred in it
    assert_eq!(pos["b"].1, -50.0);
}

#[test]
fn test_layout_json_contract() {
    let nodes = vec![
        MindmapNode::root("r", "Root"),
        MindmapNode::child("x", "Left Child", "r", "has"),
        MindmapNode::child("y", "Right Child", "r", "has"),
    ];
    let result = layout(&nodes);

    // Insertion order is x then y: x goes right, y goes left
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(
        value["nodes"][1],
        json!({
            "id": "x",
            "label": "Left Child",
            "level": 1,
            "side": "right",
            "edgeLabel": "has",
            "x": 350.0,
            "y": -50.0
        })
    );
    assert_eq!(
        value["edges"][1],
        json!({
            "id": "e-r-y",
            "sourceId": "r",
            "targetId": "y",
            "sourceHandleSide": "left",
            "targetHandleSide": "right",
            "label": "has"
        })
    );
    assert!(value["nodes"][0].get("edgeLabel").is_none());
}

#[test]
fn test_orphans_and_cycles_are_excluded() {
    let nodes = vec![
        MindmapNode::root("root", "Root"),
        MindmapNode::child("a", "A", "root", "has"),
        MindmapNode::child("ghost", "Ghost", "missing", "has"),
        MindmapNode::child("p", "P", "q", "has"),
        MindmapNode::child("q", "Q", "p", "has"),
        MindmapNode::root("second", "Second Root"),
    ];
    let (result, report) = layout_with_report(&nodes, &LayoutSettings::default());

    let ids: Vec<&str> = result.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, ["root", "a"]);
    assert_eq!(result.edges.len(), 1);

    assert!(!report.missing_root);
    assert_eq!(report.extra_roots, ["second"]);
    assert_eq!(report.orphans, ["ghost", "p", "q", "second"]);
    assert!(!report.is_clean());
}

#[test]
fn test_no_root_gives_empty_layout() {
    let nodes = vec![
        MindmapNode::child("a", "A", "b", "has"),
        MindmapNode::child("b", "B", "a", "has"),
    ];
    let (result, report) = layout_with_report(&nodes, &LayoutSettings::default());

    assert!(result.is_empty());
    assert!(result.edges.is_empty());
    assert!(report.missing_root);

    assert!(layout(&[]).is_empty());
}

#[test]
fn test_duplicate_ids_first_wins() {
    let nodes = vec![
        MindmapNode::root("root", "Root"),
        MindmapNode::child("a", "First", "root", "has"),
        MindmapNode::child("a", "Second", "root", "has"),
    ];
    let (result, report) = layout_with_report(&nodes, &LayoutSettings::default());

    assert_eq!(result.nodes.len(), 2);
    assert_eq!(result.node("a").unwrap().label, "First");
    assert_eq!(report.duplicate_ids, ["a"]);
}

#[test]
fn test_single_root() {
    let result = layout(&[MindmapNode::root("only", "Only")]);

    assert_eq!(result.nodes.len(), 1);
    let root = result.root().unwrap();
    assert_eq!((root.x, root.y, root.level), (0.0, 0.0, 0));
    assert_eq!(root.side, Side::Center);
    assert!(result.edges.is_empty());
}

#[test]
fn test_layout_is_deterministic() {
    let nodes = common::grid_nodes(7, 4);
    let first = layout(&nodes);
    for _ in 0..5 {
        assert_eq!(layout(&nodes), first);
    }
}

#[test]
fn test_deep_chain_does_not_overflow() {
    let mut nodes = vec![MindmapNode::root("n0", "Start")];
    for i in 1..20_000 {
        nodes.push(MindmapNode::child(
            format!("n{i}"),
            format!("Step {i}"),
            format!("n{}", i - 1),
            "next",
        ));
    }
    let result = layout(&nodes);

    assert_eq!(result.nodes.len(), nodes.len());
    let last = result.node("n19999").unwrap();
    assert_eq!(last.level, 19_999);
    assert_eq!(last.x, 19_999.0 * 350.0);
}

#[test]
fn test_custom_spacing() {
    let settings = LayoutSettings {
        horizontal_spacing: 200.0,
        vertical_spacing: 40.0,
    };
    let result = layout_mindmap(&common::biology_nodes(), &settings);
    let pos = common::positions(&result);

    assert_eq!(pos["a1"], (400.0, -80.0));
    assert_eq!(pos["b"], (-200.0, -20.0));
}
