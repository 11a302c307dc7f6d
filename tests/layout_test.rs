//! Tests for the layout engine: measurement, placement, folding and connectors

use rstest::{fixture, rstest};

use mmx::domain::{LayoutEngine, LayoutSettings, MindMap};

/// root "R"
/// ├── A
/// │   ├── A1
/// │   └── A2
/// └── B
#[fixture]
fn map() -> MindMap {
    let mut map = MindMap::new("R");
    let root = map.root();
    let a = map.insert_with_id("a", "A", false, root).unwrap();
    map.insert_with_id("a1", "A1", false, a).unwrap();
    map.insert_with_id("a2", "A2", false, a).unwrap();
    map.insert_with_id("b", "B", false, root).unwrap();
    map
}

fn engine() -> LayoutEngine {
    LayoutEngine::new(LayoutSettings::default())
}

#[rstest]
fn given_nested_tree_when_rendered_then_positions_follow_slot_stacking(map: MindMap) {
    let out = engine().render(&map, None);

    let root = out.node("root").unwrap();
    assert_eq!((root.x, root.y), (50.0, 400.0));
    assert_eq!(root.width, 84.0);
    assert_eq!(root.subtree_height, 90.0);

    // Children column: 50 + 84 + 50; block of 90 centred on 400
    let a = out.node("a").unwrap();
    let b = out.node("b").unwrap();
    assert_eq!((a.x, a.y), (184.0, 385.0));
    assert_eq!(a.subtree_height, 60.0);
    assert_eq!((b.x, b.y), (184.0, 430.0));

    // Grandchildren: 184 + 84 + 50; block of 60 centred on 385
    let a1 = out.node("a1").unwrap();
    let a2 = out.node("a2").unwrap();
    assert_eq!((a1.x, a1.y), (318.0, 370.0));
    assert_eq!((a2.x, a2.y), (318.0, 400.0));
    assert_eq!(a1.width, 2.0 * 9.0 + 75.0);
}

#[rstest]
fn given_nested_tree_when_rendered_then_nodes_come_out_in_preorder(map: MindMap) {
    let out = engine().render(&map, None);
    let ids: Vec<&str> = out.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["root", "a", "a1", "a2", "b"]);
    assert_eq!(out.connectors.len(), 4);
}

#[rstest]
fn given_parent_and_child_when_rendered_then_connector_is_horizontal_s_curve(map: MindMap) {
    let out = engine().render(&map, None);
    let c = out.connector("root", "a").unwrap();

    assert_eq!((c.start.x, c.start.y), (134.0, 400.0));
    assert_eq!((c.end.x, c.end.y), (184.0, 385.0));
    assert_eq!(c.control1.x, 159.0);
    assert_eq!(c.control2.x, 159.0);
    assert_eq!(c.control1.y, c.start.y);
    assert_eq!(c.control2.y, c.end.y);
    assert_eq!(c.svg_path(), "M 134 400 C 159 400, 159 385, 184 385");
}

#[rstest]
fn given_unchanged_tree_when_rendered_twice_then_output_is_identical(map: MindMap) {
    let first = engine().render(&map, Some(map.root()));
    let second = engine().render(&map, Some(map.root()));
    assert_eq!(first, second);
}

#[rstest]
fn given_selection_when_rendered_then_only_selected_node_is_flagged(map: MindMap) {
    let b = map.lookup("b").unwrap();
    let out = engine().render(&map, Some(b));
    let selected: Vec<&str> = out
        .nodes
        .iter()
        .filter(|n| n.is_selected)
        .map(|n| n.id.as_str())
        .collect();
    assert_eq!(selected, vec!["b"]);
    assert!(out.node("root").unwrap().is_root);
    assert!(!out.node("b").unwrap().is_root);
}

// ============================================================
// Folding
// ============================================================

/// root → X → Y
fn chain() -> MindMap {
    let mut map = MindMap::new("root");
    let root = map.root();
    let x = map.insert_with_id("x", "X", false, root).unwrap();
    map.insert_with_id("y", "Y", false, x).unwrap();
    map
}

#[test]
fn given_folded_root_when_rendered_then_descendants_are_hidden() {
    let mut map = chain();
    map.toggle_fold(map.root()).unwrap();
    let out = engine().render(&map, None);

    assert_eq!(out.nodes.len(), 1);
    assert!(out.connectors.is_empty());
    assert!(out.node("root").unwrap().is_folded);
    assert_eq!(out.node("root").unwrap().subtree_height, 30.0);
}

#[test]
fn given_folded_middle_node_when_rendered_then_only_its_subtree_is_hidden() {
    let mut map = chain();
    let x = map.lookup("x").unwrap();
    map.toggle_fold(x).unwrap();
    let out = engine().render(&map, None);

    assert!(out.node("root").is_some());
    assert!(out.node("x").unwrap().is_folded);
    assert!(out.node("y").is_none());
    assert!(out.connector("root", "x").is_some());
    assert!(out.connector("x", "y").is_none());
}

#[test]
fn given_fold_toggled_back_when_rendered_then_subtree_reappears() {
    let mut map = chain();
    let x = map.lookup("x").unwrap();
    let before = engine().render(&map, None);
    map.toggle_fold(x).unwrap();
    map.toggle_fold(x).unwrap();
    assert_eq!(engine().render(&map, None), before);
}

#[test]
fn given_folded_sibling_when_rendered_then_it_takes_one_row() {
    let mut map = MindMap::new("R");
    let root = map.root();
    let a = map.insert_with_id("a", "A", false, root).unwrap();
    map.insert_with_id("a1", "A1", false, a).unwrap();
    map.insert_with_id("a2", "A2", false, a).unwrap();
    map.insert_with_id("b", "B", false, root).unwrap();
    map.toggle_fold(a).unwrap();

    let out = engine().render(&map, None);
    assert_eq!(out.node("root").unwrap().subtree_height, 60.0);
    assert_eq!(out.node("a").unwrap().y, 385.0);
    assert_eq!(out.node("b").unwrap().y, 415.0);
}

// ============================================================
// Settings and bounds
// ============================================================

#[test]
fn given_custom_settings_when_rendered_then_geometry_follows_them() {
    let settings = LayoutSettings {
        row_height: 20.0,
        char_width: 10.0,
        text_padding: 0.0,
        horizontal_gap: 10.0,
        origin_x: 0.0,
        origin_y: 0.0,
    };
    let out = LayoutEngine::new(settings).render(&chain(), None);

    let x = out.node("x").unwrap();
    assert_eq!((x.x, x.y), (50.0, 0.0));
    let y = out.node("y").unwrap();
    assert_eq!((y.x, y.y), (70.0, 0.0));
}

#[test]
fn given_single_root_when_rendered_then_bounds_cover_its_box() {
    let map = MindMap::new("R");
    let out = engine().render(&map, None);
    let b = out.bounds.unwrap();
    assert_eq!((b.min_x, b.min_y, b.max_x, b.max_y), (50.0, 385.0, 134.0, 415.0));
}
