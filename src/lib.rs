//! Work out which post a click in a rendered feed belongs to.
//!
//! Given the element a user clicked in a parsed page, [`TweetResolver`] runs a
//! chain of independent heuristics ([`strategies`]) and returns the post id,
//! author handle and permalink of the post, or `None` when no heuristic is
//! confident. [`QuoteTweetDetector`] keeps clicks inside a quoted post from
//! being attributed to the post quoting it.

pub mod config;
pub mod context;
pub mod dom;
pub mod error;
pub mod patterns;
pub mod quote;
pub mod resolver;
pub mod strategies;

pub use config::ResolverConfig;
pub use context::{PageContext, TweetContext};
pub use error::{ConfigError, ResolveError};
pub use quote::{ClickedBoundary, QuoteTweetDetector, QuotedPostMetadata, StructuralAnalysis};
pub use resolver::TweetResolver;
pub use strategies::TweetStrategy;
