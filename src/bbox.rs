//! Bounding-box containment filtering.
//!
//! Inside a link or button, descendants whose bounds are indistinguishable
//! from the control's own bounds add nothing for the model: the control is the
//! actionable unit. The filter walks the tree carrying a "propagating bounds"
//! context; configured tags replace the context with their own rectangle for
//! their subtree, and a child overlapping the context by at least the
//! containment threshold is excluded unless one of the exception rules keeps
//! it. Excluded nodes stay in the tree (their text still renders) but never
//! receive an interactive index.

use tracing::{debug, trace};

use crate::config::SerializerConfig;
use crate::geometry::Rect;
use crate::raw::{DomTree, RawNode};
use crate::tree::{SerializerStats, SimplifiedNode};

/// Tags whose bounds replace the inherited containment context.
const PROPAGATING_TAGS: &[&str] = &["a", "button", "li", "tr", "td", "th"];

/// Roles that make a generic `div`/`span`/`input` propagate its bounds.
const PROPAGATING_ROLES: &[&str] = &["button", "combobox", "link"];

/// Tags that are kept regardless of containment (exception rule 1).
const INTERACTIVE_EXCEPTION_TAGS: &[&str] = &[
    "input", "select", "textarea", "button", "a", "iframe", "canvas", "video", "audio",
];

/// Form controls (exception rule 7).
const FORM_CONTROL_TAGS: &[&str] = &["input", "select", "textarea", "button", "option", "label"];

/// Media elements (exception rule 8). Plain `svg` is deliberately absent:
/// decorative icons inside a control are exactly what this filter removes.
const MEDIA_TAGS: &[&str] = &["img", "picture", "video", "audio"];

/// Accessibility roles considered generic, i.e. carrying no information.
const GENERIC_ROLES: &[&str] = &["generic", "none", "presentation", ""];

pub struct BoundingBoxFilter<'a> {
    config: &'a SerializerConfig,
}

impl<'a> BoundingBoxFilter<'a> {
    pub fn new(config: &'a SerializerConfig) -> Self {
        Self { config }
    }

    /// Walk the tree, marking contained children `excluded_by_parent` and
    /// hiding size-degenerate nodes.
    pub fn apply(&self, tree: &DomTree, root: &mut SimplifiedNode, stats: &mut SerializerStats) {
        self.visit(tree, root, None, stats);
        debug!(
            contained = stats.contained_nodes,
            size_dropped = stats.size_dropped_nodes,
            "bounding-box filtering done"
        );
    }

    fn visit(
        &self,
        tree: &DomTree,
        node: &mut SimplifiedNode,
        context: Option<Rect>,
        stats: &mut SerializerStats,
    ) {
        let raw = tree.get(node.slot);

        if node.should_display && raw.is_element() {
            if let Some(bounds) = raw.bounds {
                if self.dropped_for_size(&bounds) {
                    node.should_display = false;
                    stats.size_dropped_nodes += 1;
                } else if let Some(ctx) = context {
                    if bounds.overlap_ratio(&ctx) >= self.config.containment_threshold
                        && !node.excluded_by_parent
                    {
                        match self.retained_by_exception(tree, node, raw) {
                            Some(rule) => {
                                trace!(node_id = raw.node_id, rule, "containment veto");
                            }
                            None => {
                                node.excluded_by_parent = true;
                                stats.contained_nodes += 1;
                            }
                        }
                    }
                }
            }
        }

        let next_context = if self.propagates_bounds(raw) {
            raw.bounds.or(context)
        } else {
            context
        };
        for child in &mut node.children {
            self.visit(tree, child, next_context, stats);
        }
    }

    fn dropped_for_size(&self, bounds: &Rect) -> bool {
        if bounds.width <= 0.0 || bounds.height <= 0.0 {
            return true;
        }
        let area = bounds.area();
        area < self.config.min_element_area || area > self.config.max_element_area
    }

    fn propagates_bounds(&self, raw: &RawNode) -> bool {
        if !raw.is_element() {
            return false;
        }
        if PROPAGATING_TAGS.contains(&raw.tag.as_str()) {
            return true;
        }
        if matches!(raw.tag.as_str(), "div" | "span" | "input") {
            let role = raw
                .attr("role")
                .or(raw.ax_role.as_deref())
                .unwrap_or("")
                .to_ascii_lowercase();
            return PROPAGATING_ROLES.contains(&role.as_str());
        }
        false
    }

    /// The nine ordered exception rules. Any match retains the child; the
    /// returned rule name only feeds tracing.
    fn retained_by_exception(
        &self,
        _tree: &DomTree,
        node: &SimplifiedNode,
        raw: &RawNode,
    ) -> Option<&'static str> {
        // 1. Independently interactive element kinds.
        if INTERACTIVE_EXCEPTION_TAGS.contains(&raw.tag.as_str()) {
            return Some("interactive-tag");
        }
        if matches!(raw.tag.as_str(), "div" | "span") {
            let role = raw.attr("role").or(raw.ax_role.as_deref()).unwrap_or("");
            if matches!(
                role,
                "button" | "link" | "checkbox" | "combobox" | "menuitem" | "tab" | "switch"
            ) {
                return Some("interactive-role");
            }
        }

        // 2. Non-generic accessibility role/name or truthy control state.
        if raw
            .ax_role
            .as_deref()
            .is_some_and(|r| !GENERIC_ROLES.contains(&r))
        {
            return Some("ax-role");
        }
        if raw.accessible_name().is_some() {
            return Some("ax-name");
        }
        for prop in &raw.ax_properties {
            let state = matches!(
                prop.name.as_str(),
                "focusable" | "editable" | "settable" | "checked" | "selected" | "haspopup"
                    | "required"
            );
            if state && prop.is_truthy() {
                return Some("ax-state");
            }
        }

        // 3. Inline event handler.
        if raw.has_event_handler_attr() {
            return Some("event-handler");
        }

        // 4. Explicit labelling.
        if raw.non_empty_attr("aria-label").is_some() || raw.non_empty_attr("title").is_some() {
            return Some("label");
        }

        // 5. Compound host.
        if node.is_compound_component {
            return Some("compound");
        }

        // 6. Shadow host.
        if raw.is_shadow_host {
            return Some("shadow-host");
        }

        // 7. Form control.
        if FORM_CONTROL_TAGS.contains(&raw.tag.as_str()) {
            return Some("form-control");
        }

        // 8. Media element.
        if MEDIA_TAGS.contains(&raw.tag.as_str()) {
            return Some("media");
        }

        // 9. Iframe.
        if raw.tag == "iframe" {
            return Some("iframe");
        }

        None
    }
}
