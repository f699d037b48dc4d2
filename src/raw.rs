//! Raw input model: wire-shaped nodes and the flattened document arena.
//!
//! The extraction collaborator hands us a single recursive [`RawDomNode`]
//! that already merges the DOM, accessibility and layout/paint facets of a
//! page snapshot. Before the pipeline runs, the tree is flattened into a
//! [`DomTree`] arena: nodes live in one `Vec`, children are slot lists, and
//! upward context is threaded through traversals instead of being stored as
//! parent pointers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SerializeError;
use crate::geometry::Rect;

/// DOM node kind, collapsed from the protocol's numeric `nodeType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Element,
    Text,
    Comment,
    Document,
    Other,
}

impl NodeKind {
    /// Map the DOM-standard numeric node type.
    pub fn from_node_type(node_type: u32) -> Self {
        match node_type {
            1 => NodeKind::Element,
            3 => NodeKind::Text,
            8 => NodeKind::Comment,
            9 => NodeKind::Document,
            _ => NodeKind::Other,
        }
    }
}

/// One accessibility property, e.g. `focusable = true` or `checked = "mixed"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxProperty {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

impl AxProperty {
    /// Whether the property value is truthy: `true`, a non-empty string other
    /// than "false", or a non-zero number.
    pub fn is_truthy(&self) -> bool {
        match &self.value {
            Value::Bool(b) => *b,
            Value::String(s) => !s.is_empty() && s != "false",
            Value::Number(n) => n.as_f64().unwrap_or(0.0) != 0.0,
            _ => false,
        }
    }
}

/// Accessibility facet of a node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AxFacet {
    pub role: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub properties: Vec<AxProperty>,
}

/// Layout/paint facet of a node. Every field is optional: layout data is the
/// facet most often missing from a snapshot and its absence must not break
/// anything downstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutFacet {
    pub bounds: Option<Rect>,
    pub computed_styles: HashMap<String, String>,
    pub paint_order: Option<i64>,
    pub cursor_style: Option<String>,
}

/// Wire-level node as supplied by the extraction layer: recursive, with
/// per-facet sub-objects, camelCase keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawDomNode {
    /// Stable for one page lifetime, monotonic in document order.
    pub node_id: i64,
    pub backend_node_id: i64,
    /// DOM-standard numeric node type (1 element, 3 text, 9 document, ...).
    pub node_type: u32,
    /// Lowercase tag name; empty for non-element nodes.
    pub tag: String,
    /// Text content for text nodes.
    pub node_value: String,
    pub attributes: HashMap<String, String>,
    pub children: Vec<RawDomNode>,
    pub shadow_roots: Vec<RawDomNode>,
    /// Populated for iframes by the iframe expansion pre-pass.
    pub content_document: Option<Box<RawDomNode>>,
    pub ax: Option<AxFacet>,
    pub layout: Option<LayoutFacet>,
    pub frame_id: Option<String>,
    pub session_id: Option<String>,
    pub is_visible: bool,
    pub is_scrollable: bool,
}

/// Arena-resident node: facets flattened, children as arena slots.
#[derive(Debug, Clone, Serialize)]
pub struct RawNode {
    pub node_id: i64,
    pub backend_node_id: i64,
    pub kind: NodeKind,
    pub tag: String,
    pub node_value: String,
    pub attributes: HashMap<String, String>,
    /// Arena slots of this node's children, in document order. Shadow-root
    /// and iframe content children come after the light-DOM children.
    pub children: Vec<usize>,
    pub ax_role: Option<String>,
    pub ax_name: Option<String>,
    pub ax_description: Option<String>,
    pub ax_properties: Vec<AxProperty>,
    pub bounds: Option<Rect>,
    pub computed_styles: HashMap<String, String>,
    pub paint_order: Option<i64>,
    pub cursor_style: Option<String>,
    pub frame_id: Option<String>,
    pub session_id: Option<String>,
    pub is_visible: bool,
    pub is_scrollable: bool,
    pub is_shadow_host: bool,
}

impl RawNode {
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    pub fn is_text(&self) -> bool {
        self.kind == NodeKind::Text
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Attribute lookup treating empty values as absent.
    pub fn non_empty_attr(&self, name: &str) -> Option<&str> {
        self.attr(name).filter(|v| !v.trim().is_empty())
    }

    pub fn style(&self, name: &str) -> Option<&str> {
        self.computed_styles.get(name).map(String::as_str)
    }

    pub fn ax_property(&self, name: &str) -> Option<&AxProperty> {
        self.ax_properties.iter().find(|p| p.name == name)
    }

    /// Accessible name, if any and non-empty.
    pub fn accessible_name(&self) -> Option<&str> {
        self.ax_name.as_deref().filter(|n| !n.trim().is_empty())
    }

    /// Trimmed text for text nodes, `None` when blank.
    pub fn text(&self) -> Option<&str> {
        if self.is_text() {
            let t = self.node_value.trim();
            if t.is_empty() { None } else { Some(t) }
        } else {
            None
        }
    }

    /// Whether any attribute name looks like an inline event handler
    /// (`onclick`, `onmousedown`, ...).
    pub fn has_event_handler_attr(&self) -> bool {
        self.attributes
            .keys()
            .any(|k| k.len() > 2 && k.starts_with("on"))
    }
}

/// Flattened document snapshot: every node in one arena, addressed by slot.
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<RawNode>,
    root: usize,
    by_node_id: HashMap<i64, usize>,
}

impl DomTree {
    /// Flatten a wire tree into an arena. Slots are assigned in depth-first
    /// document order, so a parent's slot always precedes its children's.
    pub fn build(root: RawDomNode) -> Result<Self, SerializeError> {
        let kind = NodeKind::from_node_type(root.node_type);
        if kind != NodeKind::Document && kind != NodeKind::Element {
            return Err(SerializeError::MalformedRoot(format!(
                "root must be a document or element node, got nodeType {}",
                root.node_type
            )));
        }

        let mut tree = DomTree {
            nodes: Vec::new(),
            root: 0,
            by_node_id: HashMap::new(),
        };
        tree.root = tree.insert(root);
        Ok(tree)
    }

    fn insert(&mut self, wire: RawDomNode) -> usize {
        let RawDomNode {
            node_id,
            backend_node_id,
            node_type,
            tag,
            node_value,
            attributes,
            children,
            shadow_roots,
            content_document,
            ax,
            layout,
            frame_id,
            session_id,
            is_visible,
            is_scrollable,
        } = wire;

        let ax = ax.unwrap_or_default();
        let layout = layout.unwrap_or_default();
        let is_shadow_host = !shadow_roots.is_empty();

        let slot = self.nodes.len();
        self.nodes.push(RawNode {
            node_id,
            backend_node_id,
            kind: NodeKind::from_node_type(node_type),
            tag: tag.to_ascii_lowercase(),
            node_value,
            attributes,
            children: Vec::new(),
            ax_role: ax.role,
            ax_name: ax.name,
            ax_description: ax.description,
            ax_properties: ax.properties,
            bounds: layout.bounds,
            computed_styles: layout.computed_styles,
            paint_order: layout.paint_order,
            cursor_style: layout.cursor_style,
            frame_id,
            session_id,
            is_visible,
            is_scrollable,
            is_shadow_host,
        });
        self.by_node_id.entry(node_id).or_insert(slot);

        let mut child_slots = Vec::with_capacity(children.len());
        for child in children {
            child_slots.push(self.insert(child));
        }
        for shadow in shadow_roots {
            child_slots.push(self.insert(shadow));
        }
        if let Some(content) = content_document {
            child_slots.push(self.insert(*content));
        }
        self.nodes[slot].children = child_slots;
        slot
    }

    pub fn root(&self) -> usize {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, slot: usize) -> &RawNode {
        &self.nodes[slot]
    }

    /// Slot holding a given protocol node id, if present.
    pub fn slot_of(&self, node_id: i64) -> Option<usize> {
        self.by_node_id.get(&node_id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &RawNode)> {
        self.nodes.iter().enumerate()
    }
}
