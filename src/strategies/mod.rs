pub mod clicked_element;
pub mod data_attribute;
pub mod dom_structure;
pub mod parent_traversal;
pub mod url_based;

pub use clicked_element::ClickedElementStrategy;
pub use data_attribute::DataAttributeStrategy;
pub use dom_structure::DomStructureStrategy;
pub use parent_traversal::ParentTraversalStrategy;
pub use url_based::UrlBasedStrategy;

use crate::config::ResolverConfig;
use crate::context::{PageContext, TweetContext};
use anyhow::Result;
use async_trait::async_trait;
use scraper::ElementRef;

/// One independent heuristic for working out which post a node belongs to.
///
/// `Ok(None)` means the heuristic found nothing; `Err` is a fault the
/// resolver logs before moving on. Element trees are not `Send`, so neither
/// are the futures.
#[async_trait(?Send)]
pub trait TweetStrategy {
    fn name(&self) -> &str;

    /// Lower runs first.
    fn priority(&self) -> u32;

    async fn extract(&self, node: ElementRef<'_>, page: &PageContext) -> Result<Option<TweetContext>>;
}

/// The five built-in strategies, highest trust first.
pub fn default_strategies(config: &ResolverConfig) -> Vec<Box<dyn TweetStrategy>> {
    vec![
        Box::new(ClickedElementStrategy::new(config)),
        Box::new(UrlBasedStrategy::new(config)),
        Box::new(DomStructureStrategy::new(config)),
        Box::new(DataAttributeStrategy::new(config)),
        Box::new(ParentTraversalStrategy::new(config)),
    ]
}
