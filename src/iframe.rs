//! Iframe subtree expansion.
//!
//! Runs before arena flattening, as the one async boundary of the crate:
//! fetching a frame's content crosses frame/session boundaries and is
//! supplied by the caller through [`FrameContentProvider`]. Traversal is
//! cooperative, depth-first and sequential; a parent frame is fully resolved
//! before its own iframe children are expanded, and `max_iframe_depth` bounds
//! pathological nesting. Per-frame failures never abort siblings: they are
//! collected as issue strings and logged in one batch at the end.

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;

use crate::config::IframeConfig;
use crate::error::FrameError;
use crate::raw::RawDomNode;

/// Identity of a frame to fetch, handed to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameTarget {
    /// The iframe's `src` attribute, possibly relative, possibly empty.
    pub src: String,
    pub name: Option<String>,
    pub element_id: Option<String>,
    /// Protocol node id of the iframe element.
    pub node_id: i64,
    /// Frame id if the extraction layer attached one.
    pub frame_id: Option<String>,
}

impl FrameTarget {
    /// Deduplication key. Two iframes pointing at the same document through
    /// the same element are processed once.
    fn dedup_key(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.src,
            self.name.as_deref().unwrap_or(""),
            self.element_id.as_deref().unwrap_or(""),
            self.node_id
        )
    }
}

/// Supplies the content document of a frame. Implemented by the extraction
/// collaborator; out of scope for this crate beyond the boundary.
#[async_trait]
pub trait FrameContentProvider: Send + Sync {
    async fn fetch_frame(&self, target: &FrameTarget) -> Result<RawDomNode, FrameError>;
}

pub struct IframeProcessor<'a> {
    config: &'a IframeConfig,
    /// scheme://host:port of the embedding page, when it parses.
    page_origin: Option<Url>,
}

impl<'a> IframeProcessor<'a> {
    pub fn new(config: &'a IframeConfig, page_url: &str) -> Self {
        Self {
            config,
            page_origin: Url::parse(page_url).ok(),
        }
    }

    /// Expand iframe subtrees in place. Returns the collected issue strings;
    /// an empty list means every eligible frame resolved.
    pub async fn expand(
        &self,
        root: &mut RawDomNode,
        provider: &dyn FrameContentProvider,
    ) -> Vec<String> {
        let mut state = ExpandState {
            seen: HashSet::new(),
            issues: Vec::new(),
            synthetic_id: -1,
        };
        self.expand_node(root, provider, 0, &mut state).await;
        if !state.issues.is_empty() {
            warn!(
                count = state.issues.len(),
                issues = ?state.issues,
                "iframe expansion finished with issues"
            );
        }
        state.issues
    }

    fn expand_node<'b>(
        &'b self,
        node: &'b mut RawDomNode,
        provider: &'b dyn FrameContentProvider,
        depth: usize,
        state: &'b mut ExpandState,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + 'b>> {
        Box::pin(async move {
            if node.tag.eq_ignore_ascii_case("iframe") && node.content_document.is_none() {
                if let Some(target) = self.eligible_target(node, depth, state) {
                    match provider.fetch_frame(&target).await {
                        Ok(content) => {
                            debug!(src = %target.src, depth, "iframe expanded");
                            let wrapped = self.wrap_content(content, state);
                            node.content_document = Some(Box::new(wrapped));
                        }
                        Err(e) => {
                            state
                                .issues
                                .push(format!("iframe '{}' (node {}): {e}", target.src, target.node_id));
                        }
                    }
                }
            }

            for child in &mut node.children {
                self.expand_node(child, provider, depth, state).await;
            }
            for shadow in &mut node.shadow_roots {
                self.expand_node(shadow, provider, depth, state).await;
            }
            // Content documents are one frame deeper than their host.
            if let Some(content) = &mut node.content_document {
                self.expand_node(content, provider, depth + 1, state).await;
            }
        })
    }

    /// Apply the skip rules: depth, size, dedup, cross-origin policy.
    fn eligible_target(
        &self,
        node: &RawDomNode,
        depth: usize,
        state: &mut ExpandState,
    ) -> Option<FrameTarget> {
        if depth >= self.config.max_iframe_depth {
            debug!(node_id = node.node_id, depth, "iframe beyond max depth");
            return None;
        }

        let bounds = node.layout.as_ref().and_then(|l| l.bounds);
        match bounds {
            Some(b) if b.width >= self.config.min_iframe_size
                && b.height >= self.config.min_iframe_size => {}
            _ => return None,
        }

        let src = node.attributes.get("src").cloned().unwrap_or_default();
        if !self.config.enable_cross_origin && self.is_cross_origin(&src) {
            debug!(node_id = node.node_id, %src, "cross-origin iframe skipped");
            return None;
        }

        let target = FrameTarget {
            src,
            name: node.attributes.get("name").cloned(),
            element_id: node.attributes.get("id").cloned(),
            node_id: node.node_id,
            frame_id: node.frame_id.clone(),
        };
        if !state.seen.insert(target.dedup_key()) {
            return None;
        }
        Some(target)
    }

    /// Scheme+host comparison against the page origin. Relative sources,
    /// `about:` and unparsable values count as same-origin.
    fn is_cross_origin(&self, src: &str) -> bool {
        let page = match &self.page_origin {
            Some(p) => p,
            None => return false,
        };
        match Url::parse(src) {
            Ok(u) if u.has_host() => {
                u.scheme() != page.scheme()
                    || u.host_str() != page.host_str()
                    || u.port_or_known_default() != page.port_or_known_default()
            }
            _ => false,
        }
    }

    /// Nest fetched content under a synthetic document/html/body chain so the
    /// attached subtree has the same shape as a top-level document. Synthetic
    /// nodes use negative node ids allocated deterministically in traversal
    /// order, so they never collide with protocol ids and hash stably across
    /// calls.
    fn wrap_content(&self, content: RawDomNode, state: &mut ExpandState) -> RawDomNode {
        let mut next = || {
            let id = state.synthetic_id;
            state.synthetic_id -= 1;
            id
        };
        let body = RawDomNode {
            node_id: next(),
            node_type: 1,
            tag: "body".into(),
            is_visible: true,
            children: vec![content],
            ..Default::default()
        };
        let html = RawDomNode {
            node_id: next(),
            node_type: 1,
            tag: "html".into(),
            is_visible: true,
            children: vec![body],
            ..Default::default()
        };
        RawDomNode {
            node_id: next(),
            node_type: 9,
            is_visible: true,
            children: vec![html],
            ..Default::default()
        }
    }
}

struct ExpandState {
    seen: HashSet<String>,
    issues: Vec<String>,
    synthetic_id: i64,
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::geometry::Rect;
    use crate::raw::LayoutFacet;

    struct StubProvider {
        fetched: Mutex<Vec<String>>,
        fail_on: Option<String>,
    }

    impl StubProvider {
        fn new() -> Self {
            Self {
                fetched: Mutex::new(Vec::new()),
                fail_on: None,
            }
        }

        fn failing_on(src: &str) -> Self {
            Self {
                fetched: Mutex::new(Vec::new()),
                fail_on: Some(src.to_string()),
            }
        }
    }

    #[async_trait]
    impl FrameContentProvider for StubProvider {
        async fn fetch_frame(&self, target: &FrameTarget) -> Result<RawDomNode, FrameError> {
            if self.fail_on.as_deref() == Some(target.src.as_str()) {
                return Err(FrameError::FetchFailed("boom".into()));
            }
            self.fetched.lock().unwrap().push(target.src.clone());
            Ok(RawDomNode {
                node_id: 1000 + target.node_id,
                node_type: 1,
                tag: "div".into(),
                is_visible: true,
                ..Default::default()
            })
        }
    }

    fn iframe(node_id: i64, src: &str, size: f64) -> RawDomNode {
        let mut node = RawDomNode {
            node_id,
            node_type: 1,
            tag: "iframe".into(),
            is_visible: true,
            layout: Some(LayoutFacet {
                bounds: Some(Rect::new(0.0, 0.0, size, size)),
                ..Default::default()
            }),
            ..Default::default()
        };
        node.attributes.insert("src".into(), src.into());
        node
    }

    fn page(children: Vec<RawDomNode>) -> RawDomNode {
        RawDomNode {
            node_id: 1,
            node_type: 1,
            tag: "body".into(),
            is_visible: true,
            children,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn expands_a_same_origin_iframe_under_a_synthetic_document() {
        let config = IframeConfig::default();
        let processor = IframeProcessor::new(&config, "https://example.com/page");
        let provider = StubProvider::new();
        let mut root = page(vec![iframe(2, "/widget", 300.0)]);

        let issues = processor.expand(&mut root, &provider).await;
        assert!(issues.is_empty());

        let content = root.children[0].content_document.as_ref().unwrap();
        assert_eq!(content.node_type, 9);
        assert_eq!(content.children[0].tag, "html");
        assert_eq!(content.children[0].children[0].tag, "body");
        assert_eq!(content.children[0].children[0].children[0].node_id, 1002);
    }

    #[tokio::test]
    async fn small_iframes_are_skipped() {
        let config = IframeConfig::default();
        let processor = IframeProcessor::new(&config, "https://example.com/");
        let provider = StubProvider::new();
        let mut root = page(vec![iframe(2, "/ad", 50.0)]);

        processor.expand(&mut root, &provider).await;
        assert!(root.children[0].content_document.is_none());
        assert!(provider.fetched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cross_origin_skipped_when_disabled() {
        let config = IframeConfig {
            enable_cross_origin: false,
            ..Default::default()
        };
        let processor = IframeProcessor::new(&config, "https://example.com/");
        let provider = StubProvider::new();
        let mut root = page(vec![
            iframe(2, "https://ads.example.net/banner", 300.0),
            iframe(3, "/local", 300.0),
        ]);

        processor.expand(&mut root, &provider).await;
        assert!(root.children[0].content_document.is_none());
        assert!(root.children[1].content_document.is_some());
    }

    #[tokio::test]
    async fn duplicate_targets_fetch_once() {
        let config = IframeConfig::default();
        let processor = IframeProcessor::new(&config, "https://example.com/");
        let provider = StubProvider::new();
        // Same src, same (absent) name/id, same node id key differs by node.
        let mut a = iframe(2, "/widget", 300.0);
        a.attributes.insert("id".into(), "w".into());
        let mut b = iframe(2, "/widget", 300.0);
        b.attributes.insert("id".into(), "w".into());
        let mut root = page(vec![a, b]);

        processor.expand(&mut root, &provider).await;
        assert_eq!(provider.fetched.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failure_is_collected_and_siblings_still_expand() {
        let config = IframeConfig::default();
        let processor = IframeProcessor::new(&config, "https://example.com/");
        let provider = StubProvider::failing_on("/broken");
        let mut root = page(vec![iframe(2, "/broken", 300.0), iframe(3, "/fine", 300.0)]);

        let issues = processor.expand(&mut root, &provider).await;
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("/broken"));
        assert!(root.children[0].content_document.is_none());
        assert!(root.children[1].content_document.is_some());
    }

    #[tokio::test]
    async fn depth_limit_stops_recursion() {
        struct NestingProvider;

        #[async_trait]
        impl FrameContentProvider for NestingProvider {
            async fn fetch_frame(&self, target: &FrameTarget) -> Result<RawDomNode, FrameError> {
                // Every frame contains another iframe.
                Ok(iframe(target.node_id + 100, "/deeper", 300.0))
            }
        }

        let config = IframeConfig {
            max_iframe_depth: 2,
            ..Default::default()
        };
        let processor = IframeProcessor::new(&config, "https://example.com/");
        let mut root = page(vec![iframe(2, "/deeper", 300.0)]);

        processor.expand(&mut root, &NestingProvider).await;

        // Depth 0 and 1 expand; the frame at depth 2 stays opaque.
        let level1 = root.children[0].content_document.as_ref().unwrap();
        let inner_iframe = &level1.children[0].children[0].children[0];
        assert_eq!(inner_iframe.tag, "iframe");
        let level2 = inner_iframe.content_document.as_ref().unwrap();
        let deepest = &level2.children[0].children[0].children[0];
        assert_eq!(deepest.tag, "iframe");
        assert!(deepest.content_document.is_none());
    }
}
