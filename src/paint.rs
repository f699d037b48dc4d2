//! Paint-order occlusion analysis.
//!
//! Later-painted content wins: groups are processed from the highest paint
//! order down, and a node whose bounds are already fully covered by the
//! running [`RectUnion`] is invisible to the user and gets marked
//! `ignored_by_paint_order`. Transparent nodes are dropped on the same pass.
//! Exempt nodes (interactive, scrollable, or carrying an accessible name)
//! are never filtered here, even when fully overlapped.

use std::collections::HashSet;

use tracing::debug;

use crate::config::SerializerConfig;
use crate::detect::is_interactive;
use crate::geometry::{Rect, RectUnion};
use crate::raw::{DomTree, RawNode};
use crate::tree::SimplifiedNode;

/// Outcome of one analysis pass: arena slots to mark, plus counters.
#[derive(Debug, Default)]
pub struct PaintFilterResult {
    pub ignored_slots: HashSet<usize>,
    pub occluded: usize,
    pub transparent: usize,
}

pub struct PaintOrderAnalyzer<'a> {
    config: &'a SerializerConfig,
}

impl<'a> PaintOrderAnalyzer<'a> {
    pub fn new(config: &'a SerializerConfig) -> Self {
        Self { config }
    }

    /// Analyze the displayable nodes of a simplified tree.
    ///
    /// Nodes lacking either paint order or bounds are not candidates and pass
    /// through untouched.
    pub fn analyze(&self, tree: &DomTree, root: &SimplifiedNode) -> PaintFilterResult {
        let mut candidates: Vec<(usize, i64, Rect)> = Vec::new();
        root.walk(&mut |node| {
            if !node.should_display {
                return;
            }
            let raw = tree.get(node.slot);
            if let (Some(order), Some(bounds)) = (raw.paint_order, raw.bounds) {
                if !bounds.is_empty() {
                    candidates.push((node.slot, order, bounds));
                }
            }
        });

        // Highest paint order first; within a group keep document order so
        // the pass is deterministic.
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut result = PaintFilterResult::default();
        let mut union = RectUnion::new();

        for (slot, _, bounds) in candidates {
            let raw = tree.get(slot);
            if self.is_exempt(tree, slot, raw) {
                union.add(bounds);
                continue;
            }
            if union.contains(&bounds) {
                result.ignored_slots.insert(slot);
                result.occluded += 1;
                continue;
            }
            if self.is_transparent(raw) {
                result.ignored_slots.insert(slot);
                result.transparent += 1;
                continue;
            }
            union.add(bounds);
        }

        debug!(
            occluded = result.occluded,
            transparent = result.transparent,
            "paint-order filtering done"
        );
        result
    }

    /// Interactive, scrollable, or named nodes survive occlusion: they are
    /// the things the agent must still be able to reach (sticky overlays,
    /// scroll containers behind modals, labelled landmarks).
    fn is_exempt(&self, tree: &DomTree, slot: usize, raw: &RawNode) -> bool {
        raw.is_scrollable || raw.accessible_name().is_some() || is_interactive(tree, slot)
    }

    fn is_transparent(&self, raw: &RawNode) -> bool {
        if let Some(opacity) = raw.style("opacity").and_then(|v| v.parse::<f64>().ok()) {
            if opacity < self.config.opacity_threshold {
                return true;
            }
        }
        matches!(
            raw.style("background-color").map(str::trim),
            Some("transparent") | Some("rgba(0, 0, 0, 0)") | Some("rgba(0,0,0,0)")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::{DomTree, LayoutFacet, RawDomNode};

    fn painted_div(node_id: i64, paint_order: i64, scrollable: bool) -> RawDomNode {
        RawDomNode {
            node_id,
            node_type: 1,
            tag: "div".into(),
            is_visible: true,
            is_scrollable: scrollable,
            layout: Some(LayoutFacet {
                bounds: Some(Rect::new(0.0, 0.0, 50.0, 50.0)),
                paint_order: Some(paint_order),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn simplified(tree: &DomTree) -> SimplifiedNode {
        let mut root = SimplifiedNode::new(tree.root(), tree.get(tree.root()).node_id);
        root.should_display = true;
        for &child in &tree.get(tree.root()).children {
            let mut c = SimplifiedNode::new(child, tree.get(child).node_id);
            c.should_display = true;
            root.children.push(c);
        }
        root
    }

    fn two_div_tree(bottom_scrollable: bool) -> DomTree {
        let mut root = RawDomNode {
            node_id: 1,
            node_type: 1,
            tag: "main".into(),
            is_visible: true,
            ..Default::default()
        };
        root.children = vec![
            painted_div(2, 1, bottom_scrollable),
            painted_div(3, 2, false),
        ];
        DomTree::build(root).unwrap()
    }

    #[test]
    fn fully_overlapped_node_is_occluded() {
        let tree = two_div_tree(false);
        let root = simplified(&tree);
        let result = PaintOrderAnalyzer::new(&SerializerConfig::default()).analyze(&tree, &root);
        let bottom_slot = tree.slot_of(2).unwrap();
        assert!(result.ignored_slots.contains(&bottom_slot));
        assert_eq!(result.occluded, 1);
    }

    #[test]
    fn scrollable_node_survives_full_overlap() {
        let tree = two_div_tree(true);
        let root = simplified(&tree);
        let result = PaintOrderAnalyzer::new(&SerializerConfig::default()).analyze(&tree, &root);
        assert!(result.ignored_slots.is_empty());
    }

    #[test]
    fn partially_covered_node_is_kept() {
        let mut root = RawDomNode {
            node_id: 1,
            node_type: 1,
            tag: "main".into(),
            is_visible: true,
            ..Default::default()
        };
        let mut bottom = painted_div(2, 1, false);
        bottom.layout.as_mut().unwrap().bounds = Some(Rect::new(0.0, 0.0, 80.0, 50.0));
        root.children = vec![bottom, painted_div(3, 2, false)];
        let tree = DomTree::build(root).unwrap();
        let result =
            PaintOrderAnalyzer::new(&SerializerConfig::default()).analyze(&tree, &simplified(&tree));
        assert!(result.ignored_slots.is_empty());
    }

    #[test]
    fn transparent_node_is_filtered() {
        let mut root = RawDomNode {
            node_id: 1,
            node_type: 1,
            tag: "main".into(),
            is_visible: true,
            ..Default::default()
        };
        let mut ghost = painted_div(2, 1, false);
        ghost
            .layout
            .as_mut()
            .unwrap()
            .computed_styles
            .insert("opacity".into(), "0.2".into());
        root.children = vec![ghost];
        let tree = DomTree::build(root).unwrap();
        let result =
            PaintOrderAnalyzer::new(&SerializerConfig::default()).analyze(&tree, &simplified(&tree));
        assert_eq!(result.transparent, 1);
    }

    #[test]
    fn named_transparent_node_is_exempt() {
        let mut root = RawDomNode {
            node_id: 1,
            node_type: 1,
            tag: "main".into(),
            is_visible: true,
            ..Default::default()
        };
        let mut ghost = painted_div(2, 1, false);
        ghost
            .layout
            .as_mut()
            .unwrap()
            .computed_styles
            .insert("opacity".into(), "0.2".into());
        ghost.ax = Some(crate::raw::AxFacet {
            name: Some("Notifications".into()),
            ..Default::default()
        });
        root.children = vec![ghost];
        let tree = DomTree::build(root).unwrap();
        let result =
            PaintOrderAnalyzer::new(&SerializerConfig::default()).analyze(&tree, &simplified(&tree));
        assert!(result.ignored_slots.is_empty());
    }

    #[test]
    fn nodes_without_paint_metadata_pass_through() {
        let mut root = RawDomNode {
            node_id: 1,
            node_type: 1,
            tag: "main".into(),
            is_visible: true,
            ..Default::default()
        };
        root.children = vec![RawDomNode {
            node_id: 2,
            node_type: 1,
            tag: "div".into(),
            is_visible: true,
            ..Default::default()
        }];
        let tree = DomTree::build(root).unwrap();
        let result =
            PaintOrderAnalyzer::new(&SerializerConfig::default()).analyze(&tree, &simplified(&tree));
        assert!(result.ignored_slots.is_empty());
    }
}
