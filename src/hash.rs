//! Content fingerprints for change detection.
//!
//! The hash covers what the model perceives about a node: identity-bearing
//! attributes, interaction-relevant computed styles, accessibility role, name
//! and state, text, and the compound-component signature. Geometry is
//! deliberately left out: position and size churn from reflow must not be
//! reported as content change.

use sha2::{Digest, Sha256};

use crate::compound::CompoundComponent;
use crate::raw::RawNode;

/// Attributes that change a node's meaning, not just its presentation.
const SIGNIFICANT_ATTRIBUTES: &[&str] = &[
    "id",
    "class",
    "name",
    "type",
    "value",
    "placeholder",
    "title",
    "alt",
    "role",
    "href",
    "src",
    "onclick",
    "tabindex",
    "data-testid",
    "data-test",
];

/// Computed styles that change how a node can be interacted with.
const SIGNIFICANT_STYLES: &[&str] = &[
    "display",
    "visibility",
    "opacity",
    "background-color",
    "color",
    "cursor",
    "pointer-events",
    "position",
    "overflow",
    "overflow-x",
    "overflow-y",
];

/// Accessibility state that matters to the agent.
const SIGNIFICANT_AX_PROPERTIES: &[&str] = &[
    "checked", "expanded", "pressed", "selected", "disabled", "required", "invalid", "focused",
];

fn feed(hasher: &mut Sha256, label: &str, value: &str) {
    hasher.update(label.as_bytes());
    hasher.update([0x1f]);
    hasher.update(value.as_bytes());
    hasher.update([0x1e]);
}

/// Fingerprint of one node's perceivable content.
///
/// `text` is the text the simplified tree actually carries for the node.
/// After structural optimization a surviving run may hold several merged
/// sibling runs, so hashing the raw node's own value alone would miss edits
/// in the merged-away part. Falls back to the raw value when `None`.
pub fn node_content_hash(node: &RawNode, text: Option<&str>, compound: &[CompoundComponent]) -> u64 {
    let mut hasher = Sha256::new();

    feed(&mut hasher, "kind", &format!("{:?}", node.kind));
    feed(&mut hasher, "tag", &node.tag);
    feed(
        &mut hasher,
        "text",
        text.unwrap_or(node.node_value.as_str()).trim(),
    );

    // Attribute maps are unordered; iterate a sorted selection so the same
    // node always hashes the same.
    let mut attrs: Vec<(&str, &str)> = node
        .attributes
        .iter()
        .filter(|(k, _)| {
            SIGNIFICANT_ATTRIBUTES.contains(&k.as_str()) || k.starts_with("aria-")
        })
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    attrs.sort_unstable();
    for (k, v) in attrs {
        feed(&mut hasher, k, v);
    }

    let mut styles: Vec<(&str, &str)> = node
        .computed_styles
        .iter()
        .filter(|(k, _)| SIGNIFICANT_STYLES.contains(&k.as_str()))
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    styles.sort_unstable();
    for (k, v) in styles {
        feed(&mut hasher, k, v);
    }

    feed(&mut hasher, "ax-role", node.ax_role.as_deref().unwrap_or(""));
    feed(&mut hasher, "ax-name", node.ax_name.as_deref().unwrap_or(""));
    feed(
        &mut hasher,
        "ax-description",
        node.ax_description.as_deref().unwrap_or(""),
    );
    let mut ax_state: Vec<(&str, String)> = node
        .ax_properties
        .iter()
        .filter(|p| SIGNIFICANT_AX_PROPERTIES.contains(&p.name.as_str()))
        .map(|p| (p.name.as_str(), p.value.to_string()))
        .collect();
    ax_state.sort_unstable();
    for (k, v) in ax_state {
        feed(&mut hasher, k, &v);
    }

    for component in compound {
        // Stable because serde field/variant order is fixed at compile time.
        let sig = serde_json::to_string(component).unwrap_or_default();
        feed(&mut hasher, "compound", &sig);
    }

    let digest = hasher.finalize();
    u64::from_be_bytes(digest[..8].try_into().unwrap_or_default())
}
