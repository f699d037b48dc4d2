use std::sync::Arc;

use super::*;
use crate::geometry::Rect;
use crate::raw::{LayoutFacet, RawDomNode};

fn el(node_id: i64, tag: &str) -> RawDomNode {
    RawDomNode {
        node_id,
        backend_node_id: node_id * 10,
        node_type: 1,
        tag: tag.into(),
        is_visible: true,
        ..Default::default()
    }
}

fn with_bounds(mut node: RawDomNode, x: f64, y: f64, w: f64, h: f64) -> RawDomNode {
    node.layout
        .get_or_insert_with(LayoutFacet::default)
        .bounds = Some(Rect::new(x, y, w, h));
    node
}

fn text(node_id: i64, value: &str) -> RawDomNode {
    RawDomNode {
        node_id,
        node_type: 3,
        node_value: value.into(),
        ..Default::default()
    }
}

fn serialize(root: RawDomNode) -> SerializeOutcome {
    let tree = Arc::new(DomTree::build(root).unwrap());
    DomSerializer::default().serialize(tree, None).unwrap()
}

#[test]
fn scripts_comments_and_blank_text_are_dropped() {
    let mut body = el(1, "body");
    body.children = vec![
        el(2, "script"),
        RawDomNode {
            node_id: 3,
            node_type: 8,
            node_value: "a comment".into(),
            ..Default::default()
        },
        text(4, "   "),
        with_bounds(el(5, "button"), 0.0, 0.0, 80.0, 24.0),
    ];
    let outcome = serialize(body);
    assert_eq!(outcome.state.root.children.len(), 1);
    assert_eq!(outcome.stats.interactive_elements, 1);
}

#[test]
fn adjacent_text_runs_merge() {
    let mut p = el(1, "p");
    p.children = vec![text(2, "Hello"), text(3, "world"), el(4, "br"), text(5, "again")];
    let outcome = serialize(p);
    let root = &outcome.state.root;
    assert_eq!(outcome.stats.merged_text_runs, 1);
    assert_eq!(root.children[0].text.as_deref(), Some("Hello world"));
}

#[test]
fn editing_a_merged_text_run_is_detected() {
    fn paragraph(second: &str) -> RawDomNode {
        let mut p = el(1, "p");
        p.children = vec![text(2, "Hello"), text(3, second)];
        p
    }

    let first = serialize(paragraph("world"));
    let run = first.state.root.find_node_id(2).unwrap();
    assert_eq!(run.text.as_deref(), Some("Hello world"));

    // The second run merged into the first, so its edit must surface on the
    // survivor.
    let tree = Arc::new(DomTree::build(paragraph("there")).unwrap());
    let second = DomSerializer::default()
        .serialize(tree, Some(&first.state))
        .unwrap();
    let run = second.state.root.find_node_id(2).unwrap();
    assert!(run.is_new);
    assert_eq!(second.stats.new_nodes, 1);
}

#[test]
fn bare_wrapper_collapses_into_child() {
    // body > div(no attrs) > button: the div disappears.
    let mut wrapper = el(2, "div");
    wrapper.children = vec![with_bounds(el(3, "button"), 0.0, 0.0, 80.0, 24.0)];
    let mut body = el(1, "body");
    body.children = vec![wrapper];

    let outcome = serialize(body);
    assert_eq!(outcome.stats.collapsed_wrappers, 1);
    let first = &outcome.state.root.children[0];
    assert_eq!(outcome.state.tree().get(first.slot).tag, "button");
}

#[test]
fn attributed_wrapper_is_kept() {
    let mut wrapper = el(2, "div");
    wrapper.attributes.insert("class".into(), "toolbar".into());
    wrapper.children = vec![with_bounds(el(3, "button"), 0.0, 0.0, 80.0, 24.0)];
    let mut body = el(1, "body");
    body.children = vec![wrapper];

    let outcome = serialize(body);
    assert_eq!(outcome.stats.collapsed_wrappers, 0);
    let first = &outcome.state.root.children[0];
    assert_eq!(outcome.state.tree().get(first.slot).tag, "div");
}

#[test]
fn invisible_node_dissolves_but_visible_children_survive() {
    let mut hidden = el(2, "div");
    hidden.is_visible = false;
    hidden.attributes.insert("class".into(), "sr-only".into());
    hidden.children = vec![with_bounds(el(3, "a"), 0.0, 0.0, 60.0, 20.0)];
    let mut body = el(1, "body");
    body.children = vec![hidden];

    let outcome = serialize(body);
    let first = &outcome.state.root.children[0];
    assert_eq!(outcome.state.tree().get(first.slot).tag, "a");
    assert!(first.interactive_index.is_some());
}

#[test]
fn compound_host_hides_its_native_sub_dom() {
    let mut option = el(3, "option");
    option.children = vec![text(4, "First")];
    let mut select = with_bounds(el(2, "select"), 0.0, 0.0, 120.0, 24.0);
    select.children = vec![option];
    let mut body = el(1, "body");
    body.children = vec![select];

    let outcome = serialize(body);
    let host = &outcome.state.root.children[0];
    assert!(host.is_compound_component);
    assert!(host.has_compound_children);
    assert!(host.children.is_empty());
    assert_eq!(host.compound_children.len(), 2);
    assert_eq!(outcome.stats.compound_hosts, 1);
}

#[test]
fn compound_synthesis_disabled_by_config() {
    let mut body = el(1, "body");
    let mut date = with_bounds(el(2, "input"), 0.0, 0.0, 120.0, 24.0);
    date.attributes.insert("type".into(), "date".into());
    body.children = vec![date];

    let tree = Arc::new(DomTree::build(body).unwrap());
    let serializer = DomSerializer::new(SerializerConfig {
        enable_compound_components: false,
        ..Default::default()
    });
    let outcome = serializer.serialize(tree, None).unwrap();
    let host = &outcome.state.root.children[0];
    assert!(!host.is_compound_component);
    assert!(host.compound_children.is_empty());
    // Still interactive in its own right.
    assert!(host.interactive_index.is_some());
}

#[test]
fn node_without_bounds_is_never_indexed() {
    let mut body = el(1, "body");
    body.children = vec![el(2, "button")];
    let outcome = serialize(body);
    assert_eq!(outcome.stats.interactive_elements, 0);
    assert!(outcome.state.root.children[0].interactive_index.is_none());
}

#[test]
fn index_cap_is_honored() {
    let mut body = el(1, "body");
    body.children = (0..10)
        .map(|i| with_bounds(el(2 + i, "button"), 0.0, i as f64 * 30.0, 80.0, 24.0))
        .collect();

    let tree = Arc::new(DomTree::build(body).unwrap());
    let serializer = DomSerializer::new(SerializerConfig {
        max_interactive_elements: 4,
        ..Default::default()
    });
    let outcome = serializer.serialize(tree, None).unwrap();
    assert_eq!(outcome.stats.interactive_elements, 4);
    let indices: Vec<u32> = outcome.state.selector_map.indices().collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
}

#[test]
fn all_nodes_new_without_previous_state() {
    let mut body = el(1, "body");
    body.children = vec![with_bounds(el(2, "button"), 0.0, 0.0, 80.0, 24.0)];
    let outcome = serialize(body);
    let mut all_new = true;
    outcome.state.root.walk(&mut |n| all_new &= n.is_new);
    assert!(all_new);
    assert_eq!(outcome.stats.new_nodes, outcome.stats.simplified_nodes);
}

#[test]
fn stats_account_for_dropped_nodes() {
    let mut body = el(1, "body");
    body.children = vec![el(2, "script"), el(3, "style"), with_bounds(el(4, "a"), 0.0, 0.0, 60.0, 20.0)];
    let outcome = serialize(body);
    assert_eq!(outcome.stats.total_raw_nodes, 4);
    assert_eq!(outcome.stats.simplified_nodes, 2);
    assert_eq!(outcome.stats.filtered_nodes, 2);
}
