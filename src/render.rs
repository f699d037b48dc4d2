//! Text linearization of a serialized state for the language model.
//!
//! One line per indexed element: `[3]<input type=date placeholder=Born>`,
//! with a leading `*` on elements that are new since the previous state and
//! an indented annotation line per compound component. Non-indexed nodes
//! contribute only their text, folded into the nearest indexed ancestor.

use std::fmt::Write;

use crate::compound::CompoundComponent;
use crate::raw::{DomTree, RawNode};
use crate::tree::{SerializedState, SimplifiedNode};

/// Attributes worth echoing into the prompt, in display order.
const DISPLAY_ATTRIBUTES: &[&str] = &[
    "type",
    "placeholder",
    "value",
    "role",
    "aria-label",
    "title",
    "alt",
    "href",
    "name",
];

/// Longest text echoed per element before truncation.
const MAX_TEXT: usize = 80;

/// Render the indexed elements of a state as LLM prompt lines.
pub fn render_llm_text(state: &SerializedState) -> String {
    let mut out = String::new();
    render_node(state.tree(), &state.root, &mut out);
    out
}

fn render_node(tree: &DomTree, node: &SimplifiedNode, out: &mut String) {
    if let Some(index) = node.interactive_index {
        let raw = tree.get(node.slot);
        let marker = if node.is_new { "*" } else { "" };
        let _ = write!(out, "{marker}[{index}]<{}", raw.tag);
        for attr in DISPLAY_ATTRIBUTES {
            if let Some(value) = raw.non_empty_attr(attr) {
                let _ = write!(out, " {attr}={}", clip(value, 40));
            }
        }
        out.push('>');

        let text = gather_text(node);
        if !text.is_empty() {
            out.push_str(&clip(&text, MAX_TEXT));
        } else if let Some(name) = raw.accessible_name() {
            out.push_str(&clip(name, MAX_TEXT));
        }
        out.push('\n');

        for component in &node.compound_children {
            let _ = writeln!(out, "\t- {}", describe_component(component));
        }
    }

    for child in &node.children {
        render_node(tree, child, out);
    }
}

/// Concatenated text of a node and its non-indexed descendants.
fn gather_text(node: &SimplifiedNode) -> String {
    let mut parts: Vec<&str> = Vec::new();
    collect_text(node, &mut parts, true);
    parts.join(" ")
}

fn collect_text<'a>(node: &'a SimplifiedNode, parts: &mut Vec<&'a str>, is_self: bool) {
    if !is_self && node.interactive_index.is_some() {
        // An indexed descendant renders its own line.
        return;
    }
    if let Some(text) = node.text.as_deref() {
        parts.push(text);
    }
    for child in &node.children {
        collect_text(child, parts, false);
    }
}

fn describe_component(component: &CompoundComponent) -> String {
    match component {
        CompoundComponent::SpinButton {
            name,
            valuemin,
            valuemax,
            valuenow,
        } => {
            let now = valuenow
                .map(|v| format!(", now {v}"))
                .unwrap_or_default();
            format!("{name} spinbutton ({valuemin}-{valuemax}{now})")
        }
        CompoundComponent::Button { name } => format!("{name} button"),
        CompoundComponent::TextBox { name, value } => match value {
            Some(v) => format!("{name} textbox \"{}\"", clip(v, 40)),
            None => format!("{name} textbox"),
        },
        CompoundComponent::Slider {
            name,
            valuemin,
            valuemax,
            valuenow,
        } => {
            let now = valuenow
                .map(|v| format!(", now {v}"))
                .unwrap_or_default();
            format!("{name} slider ({valuemin}-{valuemax}{now})")
        }
        CompoundComponent::ListBox {
            name,
            options,
            total_options,
            format_hint,
        } => {
            let mut s = format!("{name} listbox [{}]", options.join(", "));
            if *total_options > options.len() {
                let _ = write!(s, " +{} more", total_options - options.len());
            }
            if let Some(hint) = format_hint {
                let _ = write!(s, " ({})", hint.label());
            }
            s
        }
    }
}

fn clip(text: &str, max: usize) -> String {
    let trimmed = text.trim().replace('\n', " ");
    if trimmed.chars().count() <= max {
        trimmed
    } else {
        let clipped: String = trimmed.chars().take(max.saturating_sub(3)).collect();
        format!("{clipped}...")
    }
}

/// Short human-readable summary of a raw node, used in executor logs.
pub fn describe_raw_node(raw: &RawNode) -> String {
    let mut s = format!("<{}", raw.tag);
    if let Some(id) = raw.non_empty_attr("id") {
        let _ = write!(s, " id={id}");
    }
    if let Some(name) = raw.accessible_name() {
        let _ = write!(s, " \"{}\"", clip(name, 40));
    }
    s.push('>');
    s
}
