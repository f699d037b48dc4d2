//! Pipeline output model: simplified nodes, the selector map and the
//! serialized state handle the caller retains between perception ticks.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;

use crate::compound::CompoundComponent;
use crate::raw::{DomTree, RawNode};

/// One node of the simplified tree. References exactly one arena slot of the
/// underlying [`DomTree`]; the parent owns its children and traversal is
/// always top-down.
#[derive(Debug, Clone, Serialize)]
pub struct SimplifiedNode {
    /// Arena slot of the backing raw node.
    pub slot: usize,
    /// Protocol node id of the backing raw node (denormalized for diffing).
    pub node_id: i64,
    pub children: Vec<SimplifiedNode>,
    /// Trimmed text for text nodes; stage 3 merges adjacent runs in here.
    pub text: Option<String>,
    /// Set by stage 1: the node is worth showing at all.
    pub should_display: bool,
    /// Set by stage 2: fully occluded or transparent.
    pub ignored_by_paint_order: bool,
    /// Set by stage 4: visually indistinguishable from an interactive
    /// ancestor, so it gets no index of its own.
    pub excluded_by_parent: bool,
    /// Host of synthetic compound components.
    pub is_compound_component: bool,
    pub has_compound_children: bool,
    /// Set by stage 6 relative to the previous state.
    pub is_new: bool,
    /// Dense per-call index; present only on actionable, unfiltered nodes.
    pub interactive_index: Option<u32>,
    /// Synthetic sub-controls attached to this host.
    pub compound_children: Vec<CompoundComponent>,
}

impl SimplifiedNode {
    pub(crate) fn new(slot: usize, node_id: i64) -> Self {
        Self {
            slot,
            node_id,
            children: Vec::new(),
            text: None,
            should_display: false,
            ignored_by_paint_order: false,
            excluded_by_parent: false,
            is_compound_component: false,
            has_compound_children: false,
            is_new: false,
            interactive_index: None,
            compound_children: Vec::new(),
        }
    }

    /// Depth-first pre-order visit.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a SimplifiedNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    pub(crate) fn walk_mut(&mut self, visit: &mut impl FnMut(&mut SimplifiedNode)) {
        visit(self);
        for child in &mut self.children {
            child.walk_mut(visit);
        }
    }

    /// Find the node carrying a given interactive index.
    pub fn find_index(&self, index: u32) -> Option<&SimplifiedNode> {
        if self.interactive_index == Some(index) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_index(index))
    }

    /// Find a node by protocol node id.
    pub fn find_node_id(&self, node_id: i64) -> Option<&SimplifiedNode> {
        if self.node_id == node_id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_node_id(node_id))
    }
}

/// Authoritative lookup from interactive index to the backing raw node,
/// used by the action executor to resolve "act on element N".
#[derive(Debug, Clone, Default, Serialize)]
pub struct SelectorMap {
    /// index → arena slot, ordered by index.
    entries: BTreeMap<u32, usize>,
}

impl SelectorMap {
    pub(crate) fn insert(&mut self, index: u32, slot: usize) {
        self.entries.insert(index, slot);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn slot(&self, index: u32) -> Option<usize> {
        self.entries.get(&index).copied()
    }

    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.keys().copied()
    }
}

/// Result of one serialization call. Opaque handle for the caller: pass it
/// back as `previous` on the next call to get change detection. Holds the
/// only state that survives between calls (the per-node hash map), as an
/// immutable value.
#[derive(Debug, Clone)]
pub struct SerializedState {
    tree: Arc<DomTree>,
    pub root: SimplifiedNode,
    pub selector_map: SelectorMap,
    pub(crate) hashes: HashMap<i64, u64>,
}

impl SerializedState {
    pub(crate) fn new(
        tree: Arc<DomTree>,
        root: SimplifiedNode,
        selector_map: SelectorMap,
        hashes: HashMap<i64, u64>,
    ) -> Self {
        Self {
            tree,
            root,
            selector_map,
            hashes,
        }
    }

    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Resolve an interactive index to its raw node.
    ///
    /// `None` means the index is stale (the DOM mutated since this state was
    /// built); the caller should re-serialize and retry, this is not an error.
    pub fn resolve(&self, index: u32) -> Option<&RawNode> {
        self.selector_map.slot(index).map(|slot| self.tree.get(slot))
    }
}

/// Observability record emitted alongside each serialized state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SerializerStats {
    /// Nodes in the raw arena.
    pub total_raw_nodes: usize,
    /// Nodes surviving into the final simplified tree.
    pub simplified_nodes: usize,
    /// Nodes dropped or hidden during simplification (ignored tags, blank
    /// text, invisible elements).
    pub filtered_nodes: usize,
    /// Nodes marked by the paint-order stage as fully covered.
    pub occluded_nodes: usize,
    /// Nodes marked by the paint-order stage as transparent.
    pub transparent_nodes: usize,
    /// Nodes excluded by the bounding-box containment stage.
    pub contained_nodes: usize,
    /// Nodes dropped for degenerate or out-of-range element area.
    pub size_dropped_nodes: usize,
    /// Text runs merged in stage 3.
    pub merged_text_runs: usize,
    /// Wrapper elements collapsed in stage 3.
    pub collapsed_wrappers: usize,
    /// Interactive indices assigned.
    pub interactive_elements: usize,
    /// Nodes flagged as new relative to the previous state.
    pub new_nodes: usize,
    /// Hosts carrying compound components.
    pub compound_hosts: usize,
    /// Total synthetic components attached.
    pub compound_components: usize,
}
