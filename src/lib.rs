//! LLM-oriented DOM snapshot serialization.
//!
//! Converts a merged DOM + accessibility + layout snapshot (the shape a
//! Chrome DevTools Protocol extraction layer produces) into a compact,
//! stable tree in which every actionable element carries a small integer
//! index. Consumers are a text renderer that linearizes the tree for a
//! language model, and an action executor that resolves "act on element N"
//! back to a concrete node.
//!
//! ## Pipeline
//!
//! ```text
//! RawDomNode ──(iframe expansion, async)──► RawDomNode
//!            ──(DomTree::build)──────────► arena
//!            ──(DomSerializer, 6 stages)─► SerializedState + stats
//!            ──(render_llm_text)─────────► prompt text
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use domlens::{DomSerializer, DomTree, RawDomNode};
//!
//! # fn snapshot_from_extraction_layer() -> RawDomNode { unimplemented!() }
//! let wire: RawDomNode = snapshot_from_extraction_layer();
//! let tree = Arc::new(DomTree::build(wire)?);
//!
//! let serializer = DomSerializer::default();
//! let outcome = serializer.serialize(tree, None)?;
//! println!("{}", domlens::render_llm_text(&outcome.state));
//!
//! // Next tick: pass the retained state back for change detection.
//! let next = serializer.serialize(Arc::new(DomTree::build(
//!     snapshot_from_extraction_layer(),
//! )?), Some(&outcome.state))?;
//! # let _ = next;
//! # Ok::<(), domlens::SerializeError>(())
//! ```
//!
//! Serialization is deterministic, tolerates partially missing metadata
//! without failing, and holds no state between calls other than the
//! [`SerializedState`] value the caller chooses to retain.

pub mod bbox;
pub mod compound;
pub mod config;
pub mod detect;
pub mod error;
pub mod geometry;
pub mod hash;
pub mod iframe;
pub mod paint;
pub mod raw;
pub mod render;
pub mod serializer;
pub mod tree;

pub use compound::{CompoundComponent, OptionFormat};
pub use config::{IframeConfig, SerializerConfig};
pub use error::{FrameError, SerializeError};
pub use geometry::Rect;
pub use iframe::{FrameContentProvider, FrameTarget, IframeProcessor};
pub use raw::{DomTree, RawDomNode, RawNode};
pub use render::render_llm_text;
pub use serializer::{DomSerializer, SerializeOutcome};
pub use tree::{SelectorMap, SerializedState, SerializerStats, SimplifiedNode};
