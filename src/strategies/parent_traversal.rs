use super::TweetStrategy;
use crate::config::ResolverConfig;
use crate::context::{PageContext, TweetContext, UNKNOWN};
use crate::dom;
use crate::patterns::{self, is_valid_username};
use crate::quote::{self, QuoteTweetDetector};
use anyhow::Result;
use async_trait::async_trait;
use scraper::ElementRef;
use tracing::debug;

const NAME: &str = "parent-traversal";
const CONFIDENCE: f64 = 0.5;

/// Walks up from the node's parent inspecting each element's own attributes.
///
/// The walk stops at the post container the click landed in, so a click in
/// a quoted post can't pick up attributes from the quoting post.
pub struct ParentTraversalStrategy {
    detector: QuoteTweetDetector,
    max_hops: usize,
}

impl ParentTraversalStrategy {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            detector: QuoteTweetDetector::new(config),
            max_hops: config.max_ancestor_hops,
        }
    }
}

fn own_post_id(element: ElementRef<'_>) -> Option<String> {
    ["data-tweet-id", "data-item-id"]
        .iter()
        .filter_map(|name| dom::attr(element, name))
        .find(|value| patterns::is_digits(value))
        .map(str::to_string)
        .or_else(|| dom::attr(element, "aria-labelledby").and_then(patterns::aria_id))
        .or_else(|| dom::attr(element, "href").and_then(patterns::status_id))
}

fn own_username(element: ElementRef<'_>) -> Option<String> {
    let from_href = dom::attr(element, "href")
        .and_then(|href| href.strip_prefix('/'))
        .and_then(|rest| rest.split_once("/status/"))
        .map(|(user, _)| user);

    from_href
        .into_iter()
        .chain(["data-screen-name", "data-username"].iter().filter_map(|name| dom::attr(element, name)))
        .find(|name| is_valid_username(name))
        .map(str::to_string)
}

#[async_trait(?Send)]
impl TweetStrategy for ParentTraversalStrategy {
    fn name(&self) -> &str {
        NAME
    }

    fn priority(&self) -> u32 {
        5
    }

    async fn extract(&self, node: ElementRef<'_>, _page: &PageContext) -> Result<Option<TweetContext>> {
        let ceiling = self.detector.analyze(node).target_container;
        let nested = self.detector.compile_selectors()?;

        let ancestors = dom::self_and_ancestors(node).skip(1).take(self.max_hops);
        for (hop, element) in ancestors.enumerate() {
            if let Some(post_id) = own_post_id(element) {
                let username = own_username(element)
                    .or_else(|| {
                        ceiling
                            .and_then(|c| quote::first_profile_link_in(c, &nested))
                            .filter(|name| is_valid_username(name))
                    })
                    .unwrap_or_else(|| UNKNOWN.to_string());

                let context = TweetContext::new(post_id, username, NAME, CONFIDENCE)
                    .with_meta("hops", hop + 1);
                return Ok(Some(context));
            }

            if ceiling.is_some_and(|c| dom::same_element(c, element)) {
                debug!(hops = hop + 1, "reached post container without an id");
                break;
            }
        }

        Ok(None)
    }
}
