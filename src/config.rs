//! Serializer configuration.

use serde::{Deserialize, Serialize};

/// Tuning knobs for the serialization pipeline.
///
/// Every field has a sensible default; `SerializerConfig::default()` is what
/// the agent loop ships with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
    /// Run the paint-order occlusion stage.
    pub enable_paint_order_filtering: bool,
    /// Run the bounding-box containment stage.
    pub enable_bounding_box_filtering: bool,
    /// Synthesize compound components for native widgets.
    pub enable_compound_components: bool,
    /// Nodes with computed opacity below this are treated as invisible by the
    /// paint-order stage (unless exempt).
    pub opacity_threshold: f64,
    /// Fraction of a child's area that must fall inside the propagating
    /// ancestor bounds before the child is a removal candidate.
    pub containment_threshold: f64,
    /// Hard cap on assigned interactive indices per call.
    pub max_interactive_elements: usize,
    /// Elements smaller than this (px²) are dropped outright.
    pub min_element_area: f64,
    /// Elements larger than this (px²) are page-sized backdrops, not targets.
    pub max_element_area: f64,
    /// Iframe expansion knobs.
    pub iframe: IframeConfig,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            enable_paint_order_filtering: true,
            enable_bounding_box_filtering: true,
            enable_compound_components: true,
            opacity_threshold: 0.8,
            containment_threshold: 0.99,
            max_interactive_elements: 1000,
            min_element_area: 16.0,
            max_element_area: 4_000_000.0,
            iframe: IframeConfig::default(),
        }
    }
}

/// Configuration for the iframe expansion pre-pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IframeConfig {
    /// Maximum nesting depth expanded; deeper frames are left opaque.
    pub max_iframe_depth: usize,
    /// Frames smaller than this (either dimension, px) are skipped.
    pub min_iframe_size: f64,
    /// Expand frames whose origin differs from the page origin.
    pub enable_cross_origin: bool,
}

impl Default for IframeConfig {
    fn default() -> Self {
        Self {
            max_iframe_depth: 5,
            min_iframe_size: 100.0,
            enable_cross_origin: true,
        }
    }
}
