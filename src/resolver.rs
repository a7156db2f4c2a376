//! Tweet resolver: runs the strategy chain for a clicked node.
//!
//! Strategies are tried strictly one after another in ascending priority
//! (ties keep registration order). The first result that passes validation
//! wins and later strategies are never run. A strategy that errors is logged
//! and skipped; nothing but `Option<TweetContext>` ever reaches the caller.

use crate::config::ResolverConfig;
use crate::context::{PageContext, TweetContext};
use crate::strategies::{default_strategies, TweetStrategy};
use scraper::ElementRef;
use tracing::{debug, warn};

pub struct TweetResolver {
    strategies: Vec<Box<dyn TweetStrategy>>,
}

impl TweetResolver {
    /// Resolver with the five built-in strategies.
    pub fn new(config: &ResolverConfig) -> Self {
        Self::with_strategies(default_strategies(config))
    }

    /// Resolver over an explicit strategy set.
    pub fn with_strategies(mut strategies: Vec<Box<dyn TweetStrategy>>) -> Self {
        // Stable sort: equal priorities keep registration order.
        strategies.sort_by_key(|s| s.priority());
        Self { strategies }
    }

    /// Strategy names in the order they are tried.
    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// First validated result in priority order, or `None`.
    pub async fn resolve(&self, node: ElementRef<'_>, page: &PageContext) -> Option<TweetContext> {
        for strategy in &self.strategies {
            if let Some(context) = run_strategy(strategy.as_ref(), node, page).await {
                debug!(
                    strategy = strategy.name(),
                    post_id = %context.post_id,
                    username = %context.username,
                    confidence = context.confidence,
                    "resolved"
                );
                return Some(context);
            }
        }

        warn!("all strategies failed");
        None
    }

    /// Run exactly one strategy by name, still validating its result.
    pub async fn resolve_with_strategy(
        &self,
        node: ElementRef<'_>,
        page: &PageContext,
        name: &str,
    ) -> Option<TweetContext> {
        let Some(strategy) = self.strategies.iter().find(|s| s.name() == name) else {
            warn!(strategy = name, "strategy not found");
            return None;
        };
        run_strategy(strategy.as_ref(), node, page).await
    }

    /// Every validated result, in priority order. Used to compare strategies.
    pub async fn resolve_with_all_strategies(
        &self,
        node: ElementRef<'_>,
        page: &PageContext,
    ) -> Vec<TweetContext> {
        let mut results = Vec::new();
        for strategy in &self.strategies {
            if let Some(context) = run_strategy(strategy.as_ref(), node, page).await {
                results.push(context);
            }
        }
        results
    }
}

impl Default for TweetResolver {
    fn default() -> Self {
        Self::new(&ResolverConfig::default())
    }
}

/// Run one strategy, turning faults and invalid ids into `None`.
async fn run_strategy(
    strategy: &dyn TweetStrategy,
    node: ElementRef<'_>,
    page: &PageContext,
) -> Option<TweetContext> {
    match strategy.extract(node, page).await {
        Ok(Some(context)) if context.is_valid() => Some(context),
        Ok(Some(context)) => {
            debug!(strategy = strategy.name(), post_id = %context.post_id, "rejected invalid post id");
            None
        }
        Ok(None) => {
            debug!(strategy = strategy.name(), "no match");
            None
        }
        Err(e) => {
            warn!(strategy = strategy.name(), error = %e, "strategy failed");
            None
        }
    }
}
