//! Serialization errors.

use thiserror::Error;

/// Errors surfaced by the serialization pipeline.
///
/// Per-node problems (missing bounds, malformed attributes, absent
/// accessibility data) never show up here: the affected node is treated as
/// non-displayable and the pipeline carries on. A value of this type means
/// the whole call failed and the caller should retry with a fresh snapshot.
#[derive(Debug, Error)]
pub enum SerializeError {
    /// The supplied root node cannot anchor a document tree.
    #[error("malformed document root: {0}")]
    MalformedRoot(String),

    /// The pipeline failed as a whole; partial results are not usable.
    #[error("serialization failed: {reason}")]
    SerializationFailed { reason: String },
}

/// Errors at the frame-content provider boundary.
///
/// These stay inside the iframe processor: each one is converted into a
/// logged issue string and the traversal continues with the next frame.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Provider could not resolve the frame target.
    #[error("frame target not found: {0}")]
    TargetNotFound(String),

    /// Provider fetched the frame but the content was unusable.
    #[error("frame content invalid: {0}")]
    InvalidContent(String),

    /// Transport-level failure while fetching the frame.
    #[error("frame fetch failed: {0}")]
    FetchFailed(String),
}
