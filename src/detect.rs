//! Multi-signal interactive element detection.
//!
//! Native tags alone are a poor signal on component-library markup, so the
//! detector layers fallbacks: accessibility state, ARIA roles, handler
//! attributes, an icon-size heuristic and finally `cursor: pointer`. Rules are
//! evaluated in a fixed order and the first decisive one wins; exclusions
//! (disabled/hidden) beat every inclusion that follows them.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::raw::{DomTree, RawNode};

/// Tags that are actionable on their own.
const INTERACTIVE_TAGS: &[&str] = &[
    "button", "input", "select", "textarea", "a", "details", "summary", "option", "optgroup",
];

/// ARIA roles that imply interactivity, whether from the `role` attribute or
/// the computed accessibility role.
const INTERACTIVE_ROLES: &[&str] = &[
    "button",
    "checkbox",
    "combobox",
    "gridcell",
    "link",
    "listbox",
    "menuitem",
    "menuitemcheckbox",
    "menuitemradio",
    "option",
    "radio",
    "searchbox",
    "slider",
    "spinbutton",
    "switch",
    "tab",
    "textbox",
    "treeitem",
];

/// Accessibility state properties whose mere presence marks a control.
const STATE_PROPERTIES: &[&str] = &["checked", "expanded", "pressed", "selected"];

/// Search-affordance vocabulary for icon-only search boxes that carry no
/// semantic markup at all.
static SEARCH_VOCAB: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)search|magnif|find|filter").unwrap());

fn role_is_interactive(role: &str) -> bool {
    INTERACTIVE_ROLES.contains(&role.to_ascii_lowercase().as_str())
}

/// Concatenated class/id/data-* text matched against the search vocabulary.
fn matches_search_vocabulary(node: &RawNode) -> bool {
    for (key, value) in &node.attributes {
        let relevant = key == "class" || key == "id" || key.starts_with("data-");
        if relevant && (SEARCH_VOCAB.is_match(value) || SEARCH_VOCAB.is_match(key)) {
            return true;
        }
    }
    false
}

/// True for the document's own `html`/`body`, as opposed to the same tags
/// sitting deeper in the tree (expanded frame documents).
fn is_page_scaffold(tree: &DomTree, slot: usize) -> bool {
    let root = tree.root();
    if slot == root {
        return true;
    }
    let top = tree.get(root);
    if top.children.contains(&slot) {
        return true;
    }
    top.children
        .iter()
        .map(|&child| tree.get(child))
        .filter(|child| child.tag == "html")
        .any(|html| html.children.contains(&slot))
}

fn icon_sized(node: &RawNode) -> bool {
    match node.bounds {
        Some(b) => (10.0..=50.0).contains(&b.width) && (10.0..=50.0).contains(&b.height),
        None => false,
    }
}

/// Decide whether a node is actionable.
///
/// Pure with respect to the tree: the same snapshot always yields the same
/// answer for the same slot.
pub fn is_interactive(tree: &DomTree, slot: usize) -> bool {
    let node = tree.get(slot);

    // 1. Only elements act; the page scaffold never does. html/body spliced
    // in from frame documents sit deeper and fall through to the rules below.
    if !node.is_element() {
        return false;
    }
    if matches!(node.tag.as_str(), "html" | "body") && is_page_scaffold(tree, slot) {
        return false;
    }

    // 2. Large iframes are opaque to every other signal; treat them as
    // actionable surfaces so the agent can scroll/focus into them.
    if node.tag == "iframe" {
        if let Some(b) = node.bounds {
            if b.width >= 100.0 && b.height >= 100.0 {
                return true;
            }
        }
    }

    // 3. Search affordance expressed only through naming.
    if matches_search_vocabulary(node) {
        return true;
    }

    // 4. Accessibility state. Disabled/hidden overrides everything below.
    for prop in &node.ax_properties {
        if (prop.name == "disabled" || prop.name == "hidden") && prop.is_truthy() {
            return false;
        }
    }
    for prop in &node.ax_properties {
        let name = prop.name.as_str();
        if matches!(name, "focusable" | "editable" | "settable") && prop.is_truthy() {
            return true;
        }
        if STATE_PROPERTIES.contains(&name) {
            return true;
        }
        if matches!(name, "required" | "autocomplete") && prop.is_truthy() {
            return true;
        }
        if name == "keyshortcuts" {
            return true;
        }
    }

    // 5. Native tags.
    if INTERACTIVE_TAGS.contains(&node.tag.as_str()) {
        return true;
    }

    // 6. Handler attributes, explicit tab order, ARIA role attribute.
    if node.has_event_handler_attr() || node.attributes.contains_key("tabindex") {
        return true;
    }
    if node.attr("role").is_some_and(role_is_interactive) {
        return true;
    }

    // 7. Computed accessibility role.
    if node.ax_role.as_deref().is_some_and(role_is_interactive) {
        return true;
    }

    // 8. Icon-size heuristic: small boxes that carry at least one hint of
    // intent are usually clickable glyphs.
    if icon_sized(node) {
        let hinted = node.non_empty_attr("class").is_some()
            || node.attr("role").is_some()
            || node.has_event_handler_attr()
            || node.attr("data-action").is_some()
            || node.non_empty_attr("aria-label").is_some();
        if hinted {
            return true;
        }
    }

    // 9. Styling fallback.
    node.cursor_style.as_deref() == Some("pointer")
}
