use super::TweetStrategy;
use crate::config::ResolverConfig;
use crate::context::{PageContext, TweetContext, FALLBACK_USERNAME};
use crate::dom;
use crate::patterns;
use crate::quote::{self, QuoteTweetDetector};
use anyhow::Result;
use async_trait::async_trait;
use scraper::ElementRef;
use tracing::debug;

const NAME: &str = "dom-structure";
const CONFIDENCE: f64 = 0.7;
const CONTAINER: &str = r#"[data-testid="tweet"], article"#;

/// Finds the nearest post-like container and reads the permalink and the
/// author's profile link out of it, ignoring any post quoted inside it.
pub struct DomStructureStrategy {
    detector: QuoteTweetDetector,
    trusted_hosts: Vec<String>,
}

impl DomStructureStrategy {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            detector: QuoteTweetDetector::new(config),
            trusted_hosts: config.trusted_hosts.clone(),
        }
    }
}

#[async_trait(?Send)]
impl TweetStrategy for DomStructureStrategy {
    fn name(&self) -> &str {
        NAME
    }

    fn priority(&self) -> u32 {
        3
    }

    async fn extract(&self, node: ElementRef<'_>, page: &PageContext) -> Result<Option<TweetContext>> {
        let container_selector = dom::selector(CONTAINER)?;
        let Some(container) = dom::closest(node, &container_selector) else {
            return Ok(None);
        };

        let nested = self.detector.compile_selectors()?;

        let Some(post_id) = quote::first_status_id_in(container, &nested) else {
            debug!("post container without a permalink");
            return Ok(None);
        };

        let username = quote::first_profile_link_in(container, &nested)
            .or_else(|| {
                patterns::parse_username_fast(Some(container), page, &self.trusted_hosts, &nested)
            })
            .unwrap_or_else(|| FALLBACK_USERNAME.to_string());
        if username == FALLBACK_USERNAME {
            return Ok(None);
        }

        let context = TweetContext::new(post_id, username, NAME, CONFIDENCE)
            .with_meta("containerTag", dom::tag_name(container));
        Ok(Some(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    async fn run(html: &str, url: &str) -> Option<TweetContext> {
        let doc = Html::parse_document(html);
        let node = doc.select(&Selector::parse("#t").unwrap()).next().unwrap();
        DomStructureStrategy::new(&ResolverConfig::default())
            .extract(node, &PageContext::new(url))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_article_container() {
        let html = r#"
            <article data-testid="tweet">
              <a href="/testuser"></a>
              <a href="/testuser/status/1234567890"></a>
              <div id="t"></div>
            </article>"#;
        let ctx = run(html, "https://x.com/home").await.unwrap();

        assert_eq!(ctx.post_id, "1234567890");
        assert_eq!(ctx.username, "testuser");
        assert_eq!(ctx.post_url, "https://twitter.com/testuser/status/1234567890");
        assert_eq!(ctx.resolution_method, "dom-structure");
        assert_eq!(ctx.confidence, 0.7);
        assert_eq!(ctx.metadata["containerTag"], "article");
    }

    #[tokio::test]
    async fn test_div_container_and_first_status_link_wins() {
        let html = r#"
            <div data-testid="tweet">
              <a href="/user/followers"></a>
              <a href="https://example.com/user"></a>
              <a href="/user/status/1111111111"></a>
              <a href="/user/status/9999999999"></a>
              <a href="/user123"></a>
              <span id="t"></span>
            </div>"#;
        let ctx = run(html, "https://x.com/home").await.unwrap();

        assert_eq!(ctx.post_id, "1111111111");
        assert_eq!(ctx.username, "user123");
        assert_eq!(ctx.metadata["containerTag"], "div");
    }

    #[tokio::test]
    async fn test_quoted_post_links_belong_to_quoted_post() {
        let html = r#"
            <article data-testid="tweet">
              <div><div data-testid="videoPlayer"><video id="t"></video></div></div>
              <div role="link">
                <article data-testid="tweet">
                  <a href="/bob">Bob</a>
                  <a href="/bob/status/222"><time>3h</time></a>
                </article>
              </div>
              <a href="/alice">Alice</a>
              <a href="/alice/status/111"><time>1h</time></a>
            </article>"#;
        let ctx = run(html, "https://x.com/home").await.unwrap();

        assert_eq!(ctx.post_id, "111");
        assert_eq!(ctx.username, "alice");
    }

    #[tokio::test]
    async fn test_no_container() {
        assert!(run(r#"<div id="t"></div>"#, "https://x.com/home").await.is_none());
    }

    #[tokio::test]
    async fn test_no_permalink() {
        let html = r#"<article><a href="/testuser"></a><div id="t"></div></article>"#;
        assert!(run(html, "https://x.com/home").await.is_none());
    }

    #[tokio::test]
    async fn test_username_fast_path_fallback() {
        let html = r#"<article><a href="/someone/status/1234567890"></a><div id="t"></div></article>"#;

        let ctx = run(html, "https://x.com/fallback_user/status/1").await.unwrap();
        assert_eq!(ctx.username, "fallback_user");

        assert!(run(html, "https://x.com/home").await.is_none());
    }
}
