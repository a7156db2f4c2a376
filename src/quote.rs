//! Quote-tweet detection.
//!
//! A quoted post is rendered as a full post container nested inside the
//! quoting post's container. Anything that looks up ids, handles or media
//! for a click has to confine itself to the container the click actually
//! landed in, otherwise a click on quoted media gets attributed to the outer
//! post. [`QuoteTweetDetector`] finds those containers and answers scoped
//! lookups against them.

use crate::config::ResolverConfig;
use crate::dom;
use crate::error::ResolveError;
use crate::patterns::{self, is_content_link, single_segment};
use scraper::{ElementRef, Selector};
use serde::Serialize;
use std::collections::VecDeque;
use tracing::{debug, info, warn};
use url::Url;

const IMAGE_CDN_HOST: &str = "pbs.twimg.com";
const VIDEO_CDN_HOST: &str = "video.twimg.com";

/// Which post container the click landed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClickedBoundary {
    /// The outer post, or the only post for a flat structure
    Original,
    /// The post embedded inside another post
    Quoted,
    Unknown,
}

impl ClickedBoundary {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClickedBoundary::Original => "original",
            ClickedBoundary::Quoted => "quoted",
            ClickedBoundary::Unknown => "unknown",
        }
    }
}

/// Classification of the post containers around a node.
///
/// When `is_nested` is set both containers are present, distinct, and the
/// inner one is a descendant of the outer one. `target_container` is always
/// one of the two (or `None`) and is the scope later lookups must stay in.
#[derive(Debug, Clone, Copy)]
pub struct StructuralAnalysis<'a> {
    pub is_nested: bool,
    pub clicked_boundary: ClickedBoundary,
    pub outer_container: Option<ElementRef<'a>>,
    pub inner_container: Option<ElementRef<'a>>,
    pub target_container: Option<ElementRef<'a>>,
}

impl<'a> StructuralAnalysis<'a> {
    pub fn unknown() -> Self {
        Self {
            is_nested: false,
            clicked_boundary: ClickedBoundary::Unknown,
            outer_container: None,
            inner_container: None,
            target_container: None,
        }
    }

    fn flat(container: ElementRef<'a>) -> Self {
        Self {
            is_nested: false,
            clicked_boundary: ClickedBoundary::Original,
            outer_container: Some(container),
            inner_container: None,
            target_container: Some(container),
        }
    }
}

/// Id and author of the quoted post a click landed near.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotedPostMetadata {
    pub is_nested: bool,
    pub clicked_boundary: ClickedBoundary,
    pub quoted_post_id: Option<String>,
    pub quoted_username: Option<String>,
    /// Post the click came from, set only for nested structures
    pub source: Option<ClickedBoundary>,
}

impl QuotedPostMetadata {
    fn not_nested(clicked_boundary: ClickedBoundary) -> Self {
        Self {
            is_nested: false,
            clicked_boundary,
            quoted_post_id: None,
            quoted_username: None,
            source: None,
        }
    }
}

pub struct QuoteTweetDetector {
    boundary_selectors: Vec<String>,
    media_search_depth: usize,
}

impl QuoteTweetDetector {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            boundary_selectors: config.boundary_selectors.clone(),
            media_search_depth: config.media_search_depth,
        }
    }

    /// Classify the post containers enclosing `node`.
    ///
    /// Never fails: any traversal error degrades to [`ClickedBoundary::Unknown`].
    pub fn analyze<'a>(&self, node: ElementRef<'a>) -> StructuralAnalysis<'a> {
        match self.try_analyze(node) {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(error = %e, "quote detection failed, treating as unknown");
                StructuralAnalysis::unknown()
            }
        }
    }

    fn try_analyze<'a>(&self, node: ElementRef<'a>) -> Result<StructuralAnalysis<'a>, ResolveError> {
        let selectors = self.compile_selectors()?;
        let boundaries = collect_boundaries(node, &selectors);

        match boundaries.as_slice() {
            [] => {
                debug!(tag = %dom::tag_name(node), "no post container around node");
                Ok(StructuralAnalysis::unknown())
            }
            [only] => {
                debug!("flat post");
                Ok(StructuralAnalysis::flat(*only))
            }
            // Deeper chains collapse onto the two nearest containers.
            [inner, outer, ..] => {
                let in_inner = dom::contains(*inner, node);
                let (clicked_boundary, target) = if in_inner {
                    (ClickedBoundary::Quoted, *inner)
                } else {
                    (ClickedBoundary::Original, *outer)
                };
                info!(
                    clicked = clicked_boundary.as_str(),
                    depth = boundaries.len(),
                    "quote tweet detected"
                );
                Ok(StructuralAnalysis {
                    is_nested: true,
                    clicked_boundary,
                    outer_container: Some(*outer),
                    inner_container: Some(*inner),
                    target_container: Some(target),
                })
            }
        }
    }

    /// Id and handle of the nested post, scoped to the container the click landed in.
    pub fn extract_metadata(&self, node: ElementRef<'_>) -> QuotedPostMetadata {
        let analysis = self.analyze(node);
        let target = match analysis.target_container {
            Some(target) if analysis.is_nested => target,
            _ => return QuotedPostMetadata::not_nested(analysis.clicked_boundary),
        };
        let nested = match self.compile_selectors() {
            Ok(selectors) => selectors,
            Err(e) => {
                warn!(error = %e, "quote metadata skipped");
                return QuotedPostMetadata::not_nested(ClickedBoundary::Unknown);
            }
        };

        let quoted_post_id = first_status_id_in(target, &nested);
        let quoted_username = first_profile_link_in(target, &nested);
        debug!(?quoted_post_id, ?quoted_username, "quoted post metadata");

        QuotedPostMetadata {
            is_nested: true,
            clicked_boundary: analysis.clicked_boundary,
            quoted_post_id,
            quoted_username,
            source: Some(analysis.clicked_boundary),
        }
    }

    /// Photo or video element belonging to the post the click landed in.
    ///
    /// Looks two levels down (`container > div > media`) first, then does a
    /// bounded breadth-first search. Neither search leaves the target
    /// container or descends into another post container nested in it.
    pub fn find_media_container<'a>(&self, node: ElementRef<'a>) -> Option<ElementRef<'a>> {
        let analysis = self.analyze(node);
        let Some(target) = analysis.target_container else {
            debug!("no target container for media lookup");
            return None;
        };
        let selectors = match self.compile_selectors() {
            Ok(selectors) => selectors,
            Err(e) => {
                warn!(error = %e, "media lookup skipped");
                return None;
            }
        };

        if let Some(media) = shallow_media(target, &selectors) {
            debug!(tag = %dom::tag_name(media), "media found (shallow)");
            return Some(media);
        }

        let found = deep_media(target, &selectors, self.media_search_depth);
        match found {
            Some((media, depth)) => {
                debug!(tag = %dom::tag_name(media), depth, "media found (deep)");
                Some(media)
            }
            None => {
                debug!("media container not found");
                None
            }
        }
    }

    /// The configured post-container selectors, parsed.
    pub fn compile_selectors(&self) -> Result<Vec<Selector>, ResolveError> {
        self.boundary_selectors
            .iter()
            .map(|css| dom::selector(css))
            .collect()
    }
}

impl Default for QuoteTweetDetector {
    fn default() -> Self {
        Self::new(&ResolverConfig::default())
    }
}

fn is_boundary(element: ElementRef<'_>, selectors: &[Selector]) -> bool {
    selectors.iter().any(|s| s.matches(&element))
}

/// Every post container from `node` upward, nearest first.
fn collect_boundaries<'a>(node: ElementRef<'a>, selectors: &[Selector]) -> Vec<ElementRef<'a>> {
    dom::self_and_ancestors(node)
        .filter(|e| is_boundary(*e, selectors))
        .collect()
}

/// First `/status/<digits>` link belonging to `container` itself, not to a
/// post nested inside it.
pub(crate) fn first_status_id_in(
    container: ElementRef<'_>,
    nested: &[Selector],
) -> Option<String> {
    let links = dom::selector(r#"a[href*="/status/"]"#).ok()?;
    dom::select_outside(container, &links, nested)
        .into_iter()
        .filter_map(|a| dom::attr(a, "href"))
        .find_map(patterns::status_id)
}

/// First relative single-segment link (`/alice`) belonging to `container`.
pub(crate) fn first_profile_link_in(
    container: ElementRef<'_>,
    nested: &[Selector],
) -> Option<String> {
    let links = dom::selector(r#"a[href^="/"]"#).ok()?;
    dom::select_outside(container, &links, nested)
        .into_iter()
        .filter_map(|a| dom::attr(a, "href"))
        .filter(|href| !is_content_link(href))
        .find_map(single_segment)
        .map(str::to_string)
}

fn src_host_is(element: ElementRef<'_>, host: &str) -> bool {
    dom::attr(element, "src")
        .and_then(|src| Url::parse(src).ok())
        .is_some_and(|url| url.host_str() == Some(host))
}

fn is_photo(element: ElementRef<'_>) -> bool {
    dom::attr(element, "data-testid") == Some("tweetPhoto")
}

fn is_video_player(element: ElementRef<'_>) -> bool {
    dom::attr(element, "data-testid") == Some("videoPlayer")
}

fn is_cdn_image(element: ElementRef<'_>) -> bool {
    dom::tag_name(element) == "img" && src_host_is(element, IMAGE_CDN_HOST)
}

fn is_video(element: ElementRef<'_>) -> bool {
    dom::tag_name(element) == "video"
}

fn is_media_container(element: ElementRef<'_>) -> bool {
    is_photo(element)
        || is_video_player(element)
        || is_cdn_image(element)
        || (is_video(element) && src_host_is(element, VIDEO_CDN_HOST))
}

/// `target > div > media`, trying each media kind in turn.
fn shallow_media<'a>(target: ElementRef<'a>, boundaries: &[Selector]) -> Option<ElementRef<'a>> {
    let candidates: Vec<ElementRef<'a>> = dom::child_elements(target)
        .filter(|c| dom::tag_name(*c) == "div" && !is_boundary(*c, boundaries))
        .flat_map(dom::child_elements)
        .collect();

    let probes: [fn(ElementRef<'_>) -> bool; 4] = [is_photo, is_video_player, is_cdn_image, is_video];
    probes
        .iter()
        .find_map(|probe| candidates.iter().copied().find(|c| probe(*c)))
}

fn deep_media<'a>(
    target: ElementRef<'a>,
    boundaries: &[Selector],
    max_depth: usize,
) -> Option<(ElementRef<'a>, usize)> {
    let mut queue = VecDeque::from([(target, 0usize)]);

    while let Some((element, depth)) = queue.pop_front() {
        if is_media_container(element) {
            return Some((element, depth));
        }
        if depth == max_depth {
            continue;
        }
        for child in dom::child_elements(element) {
            if !is_boundary(child, boundaries) {
                queue.push_back((child, depth + 1));
            }
        }
    }

    None
}
