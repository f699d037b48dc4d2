//! The six-stage serialization pipeline.
//!
//! ```text
//! raw arena ──1 simplify (+compound)──► simplified tree
//!            ──2 paint-order filter───► occluded/transparent marked
//!            ──3 structural optimize──► filtered dropped, text merged,
//!                                       wrappers collapsed
//!            ──4 bounding-box filter──► contained descendants excluded
//!            ──5 index assignment────► dense interactive indices + map
//!            ──6 change detection────► is_new vs. previous state
//! ```
//!
//! Each call is a one-shot, synchronous, CPU-bound computation over the
//! snapshot: every cache lives inside the call and is dropped at the end.
//! The only value that crosses calls is the [`SerializedState`] the caller
//! retains and passes back for change detection.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::bbox::BoundingBoxFilter;
use crate::compound::build_compound_components;
use crate::config::SerializerConfig;
use crate::detect::is_interactive;
use crate::error::SerializeError;
use crate::hash::node_content_hash;
use crate::paint::PaintOrderAnalyzer;
use crate::raw::{DomTree, NodeKind};
use crate::tree::{SelectorMap, SerializedState, SerializerStats, SimplifiedNode};

/// Tags that never carry information for the model.
const IGNORED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "meta", "link", "head", "base",
];

/// Result of one serialization call.
#[derive(Debug)]
pub struct SerializeOutcome {
    pub state: SerializedState,
    pub stats: SerializerStats,
}

/// The pipeline orchestrator. Holds only configuration; safe to share and to
/// call concurrently for independent snapshots.
#[derive(Debug, Clone, Default)]
pub struct DomSerializer {
    config: SerializerConfig,
}

impl DomSerializer {
    pub fn new(config: SerializerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }

    /// Run the full pipeline over a snapshot.
    ///
    /// `previous` enables change detection; it must come from the same page
    /// lifetime (same node-id numbering domain). Without it, every node is
    /// reported as new.
    pub fn serialize(
        &self,
        tree: Arc<DomTree>,
        previous: Option<&SerializedState>,
    ) -> Result<SerializeOutcome, SerializeError> {
        if tree.is_empty() {
            return Err(SerializeError::SerializationFailed {
                reason: "empty document tree".into(),
            });
        }

        let mut stats = SerializerStats {
            total_raw_nodes: tree.len(),
            ..Default::default()
        };

        // Stage 1: simplify + compound components.
        let mut root = self
            .simplify(&tree, tree.root(), &mut stats)
            .ok_or_else(|| SerializeError::SerializationFailed {
                reason: "document root simplified to nothing".into(),
            })?;

        // Stage 2: paint-order occlusion filtering.
        if self.config.enable_paint_order_filtering {
            let result = PaintOrderAnalyzer::new(&self.config).analyze(&tree, &root);
            stats.occluded_nodes = result.occluded;
            stats.transparent_nodes = result.transparent;
            root.walk_mut(&mut |node| {
                if result.ignored_slots.contains(&node.slot) {
                    node.ignored_by_paint_order = true;
                }
            });
        }

        // Stage 3: structural optimization.
        root = self
            .optimize(&tree, root, &mut stats)
            .ok_or_else(|| SerializeError::SerializationFailed {
                reason: "document root filtered away".into(),
            })?;

        // Stage 4: bounding-box containment filtering.
        if self.config.enable_bounding_box_filtering {
            BoundingBoxFilter::new(&self.config).apply(&tree, &mut root, &mut stats);
        }

        // Stage 5: interactive index assignment.
        let selector_map = self.assign_indices(&tree, &mut root, &mut stats);

        // Stage 6: change detection.
        let hashes = self.detect_changes(&tree, &mut root, previous, &mut stats);

        root.walk(&mut |_| stats.simplified_nodes += 1);
        stats.filtered_nodes = stats.total_raw_nodes.saturating_sub(stats.simplified_nodes);

        debug!(
            total = stats.total_raw_nodes,
            kept = stats.simplified_nodes,
            interactive = stats.interactive_elements,
            new = stats.new_nodes,
            "serialization done"
        );

        Ok(SerializeOutcome {
            state: SerializedState::new(tree, root, selector_map, hashes),
            stats,
        })
    }

    /// Stage 1: copy the displayable skeleton of the raw tree.
    ///
    /// Comments, ignored tags and blank text vanish here; compound hosts get
    /// their synthetic components and keep their native sub-DOM hidden.
    fn simplify(
        &self,
        tree: &DomTree,
        slot: usize,
        stats: &mut SerializerStats,
    ) -> Option<SimplifiedNode> {
        let raw = tree.get(slot);

        match raw.kind {
            NodeKind::Comment | NodeKind::Other => return None,
            NodeKind::Text => {
                let text = raw.text()?;
                let mut node = SimplifiedNode::new(slot, raw.node_id);
                node.text = Some(text.to_string());
                node.should_display = true;
                return Some(node);
            }
            NodeKind::Element if IGNORED_TAGS.contains(&raw.tag.as_str()) => return None,
            NodeKind::Element | NodeKind::Document => {}
        }

        let mut node = SimplifiedNode::new(slot, raw.node_id);
        node.should_display = raw.kind == NodeKind::Document || raw.is_visible;

        if self.config.enable_compound_components {
            let components = build_compound_components(tree, slot);
            if !components.is_empty() {
                stats.compound_hosts += 1;
                stats.compound_components += components.len();
                node.is_compound_component = true;
                node.has_compound_children = true;
                node.compound_children = components;
                // The native sub-DOM (option lists, media internals) is
                // virtualized by the components; don't duplicate it.
                return Some(node);
            }
        }

        for &child in &raw.children {
            if let Some(simplified) = self.simplify(tree, child, stats) {
                node.children.push(simplified);
            }
        }
        Some(node)
    }

    /// Stage 3: drop nodes hidden by stages 1–2, merge adjacent text runs and
    /// collapse attribute-less single-child `div`/`span` wrappers.
    fn optimize(
        &self,
        tree: &DomTree,
        node: SimplifiedNode,
        stats: &mut SerializerStats,
    ) -> Option<SimplifiedNode> {
        // The root is always kept, so the replacement list has one entry.
        self.optimize_node(tree, node, true, stats).into_iter().next()
    }

    fn optimize_node(
        &self,
        tree: &DomTree,
        mut node: SimplifiedNode,
        is_root: bool,
        stats: &mut SerializerStats,
    ) -> Vec<SimplifiedNode> {
        // Children first.
        let children = std::mem::take(&mut node.children);
        let mut optimized: Vec<SimplifiedNode> = Vec::with_capacity(children.len());
        for child in children {
            optimized.extend(self.optimize_node(tree, child, false, stats));
        }

        // Merge adjacent leaf text runs.
        let mut merged: Vec<SimplifiedNode> = Vec::with_capacity(optimized.len());
        for child in optimized {
            let child_is_leaf_text = child.text.is_some() && child.children.is_empty();
            if child_is_leaf_text {
                if let Some(last) = merged.last_mut() {
                    if last.children.is_empty() {
                        if let (Some(last_text), Some(text)) =
                            (last.text.as_mut(), child.text.as_deref())
                        {
                            last_text.push(' ');
                            last_text.push_str(text);
                            stats.merged_text_runs += 1;
                            continue;
                        }
                    }
                }
            }
            merged.push(child);
        }
        node.children = merged;

        // A node filtered by stage 1/2 dissolves: its surviving children are
        // spliced into the parent.
        if !is_root && (!node.should_display || node.ignored_by_paint_order) {
            return node.children;
        }

        // Collapse bare single-child wrappers into their child.
        if !is_root && node.children.len() == 1 && node.text.is_none() {
            let raw = tree.get(node.slot);
            let bare_wrapper = matches!(raw.tag.as_str(), "div" | "span")
                && raw.attributes.is_empty()
                && node.compound_children.is_empty();
            if bare_wrapper {
                stats.collapsed_wrappers += 1;
                return node.children;
            }
        }

        vec![node]
    }

    /// Stage 5: collect actionable nodes depth-first, order by node id and
    /// hand out dense indices.
    fn assign_indices(
        &self,
        tree: &DomTree,
        root: &mut SimplifiedNode,
        stats: &mut SerializerStats,
    ) -> SelectorMap {
        let mut candidates: Vec<(i64, usize)> = Vec::new();
        root.walk(&mut |node| {
            if !node.should_display || node.ignored_by_paint_order || node.excluded_by_parent {
                return;
            }
            // Without usable bounds the executor has nothing to aim at, so
            // the node cannot be indexed (it still renders and diffs).
            let raw = tree.get(node.slot);
            if !raw.bounds.is_some_and(|b| !b.is_empty()) {
                return;
            }
            let actionable = node.has_compound_children || is_interactive(tree, node.slot);
            if actionable {
                candidates.push((node.node_id, node.slot));
            }
        });

        // Document order: node ids are monotonic within a page, so a stable
        // sort on them keeps indices increasing with position even when
        // iframe content interleaves.
        candidates.sort_by_key(|(node_id, _)| *node_id);
        candidates.truncate(self.config.max_interactive_elements);

        let mut by_slot: HashMap<usize, u32> = HashMap::with_capacity(candidates.len());
        let mut map = SelectorMap::default();
        for (index, (_, slot)) in candidates.iter().enumerate() {
            by_slot.insert(*slot, index as u32);
            map.insert(index as u32, *slot);
        }
        root.walk_mut(&mut |node| {
            node.interactive_index = by_slot.get(&node.slot).copied();
        });

        stats.interactive_elements = map.len();
        map
    }

    /// Stage 6: hash every surviving node and diff against the previous call.
    fn detect_changes(
        &self,
        tree: &DomTree,
        root: &mut SimplifiedNode,
        previous: Option<&SerializedState>,
        stats: &mut SerializerStats,
    ) -> HashMap<i64, u64> {
        let mut hashes: HashMap<i64, u64> = HashMap::new();
        let mut new_nodes = 0usize;

        root.walk_mut(&mut |node| {
            let raw = tree.get(node.slot);
            // Use the simplified node's text: a surviving run may carry
            // merged-away siblings whose edits must still flip the hash.
            let hash = node_content_hash(raw, node.text.as_deref(), &node.compound_children);
            hashes.insert(node.node_id, hash);
            node.is_new = match previous {
                None => true,
                Some(prev) => prev.hashes.get(&node.node_id) != Some(&hash),
            };
            if node.is_new {
                new_nodes += 1;
            }
        });

        stats.new_nodes = new_nodes;
        hashes
    }
}

#[cfg(test)]
#[path = "serializer_tests.rs"]
mod tests;
