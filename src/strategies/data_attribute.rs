use super::TweetStrategy;
use crate::config::ResolverConfig;
use crate::context::{PageContext, TweetContext, UNKNOWN};
use crate::dom;
use crate::patterns;
use anyhow::Result;
use async_trait::async_trait;
use scraper::ElementRef;

const NAME: &str = "data-attribute";
const CONFIDENCE: f64 = 0.6;

const ID_ATTRIBUTES: &[&str] = &["data-tweet-id", "data-item-id", "data-key"];
const USERNAME_ATTRIBUTES: &[&str] = &["data-screen-name", "data-username"];

/// Looks for id/handle data attributes on the node and a few of its parents.
pub struct DataAttributeStrategy {
    levels: usize,
}

impl DataAttributeStrategy {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            levels: config.data_attribute_levels,
        }
    }
}

fn post_id_of(element: ElementRef<'_>) -> Option<&str> {
    ID_ATTRIBUTES
        .iter()
        .filter_map(|name| dom::attr(element, name))
        .find(|value| patterns::is_digits(value))
}

fn username_of(element: ElementRef<'_>) -> Option<&str> {
    USERNAME_ATTRIBUTES
        .iter()
        .filter_map(|name| dom::attr(element, name))
        .map(str::trim)
        .find(|value| !value.is_empty())
}

#[async_trait(?Send)]
impl TweetStrategy for DataAttributeStrategy {
    fn name(&self) -> &str {
        NAME
    }

    fn priority(&self) -> u32 {
        4
    }

    async fn extract(&self, node: ElementRef<'_>, _page: &PageContext) -> Result<Option<TweetContext>> {
        let found = dom::self_and_ancestors(node)
            .take(self.levels + 1)
            .enumerate()
            .find_map(|(level, element)| post_id_of(element).map(|id| (level, element, id)));

        let Some((level, element, post_id)) = found else {
            return Ok(None);
        };

        let username = username_of(element).unwrap_or(UNKNOWN);
        let context =
            TweetContext::new(post_id, username, NAME, CONFIDENCE).with_meta("elementLevel", level);
        Ok(Some(context))
    }
}
