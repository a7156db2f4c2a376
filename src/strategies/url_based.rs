use super::TweetStrategy;
use crate::config::ResolverConfig;
use crate::context::{PageContext, TweetContext, FALLBACK_USERNAME};
use crate::dom;
use crate::error::ResolveError;
use crate::patterns;
use anyhow::Result;
use async_trait::async_trait;
use scraper::ElementRef;
use tracing::debug;

const NAME: &str = "url-based";
const CONFIDENCE: f64 = 0.8;

/// Resolves from the page URL alone (`/<user>/status/<id>`), ignoring the clicked node.
pub struct UrlBasedStrategy {
    trusted_hosts: Vec<String>,
}

impl UrlBasedStrategy {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            trusted_hosts: config.trusted_hosts.clone(),
        }
    }
}

#[async_trait(?Send)]
impl TweetStrategy for UrlBasedStrategy {
    fn name(&self) -> &str {
        NAME
    }

    fn priority(&self) -> u32 {
        2
    }

    async fn extract(&self, node: ElementRef<'_>, page: &PageContext) -> Result<Option<TweetContext>> {
        let Some(post_id) = patterns::status_id(page.url()) else {
            return Ok(None);
        };
        let url = page
            .parsed()
            .ok_or_else(|| ResolveError::InvalidUrl(page.url().to_string()))?;

        // The document, not the clicked node, is the scope for the fast path.
        let username = patterns::url_username(&url, &self.trusted_hosts)
            .filter(|name| name != FALLBACK_USERNAME)
            .or_else(|| {
                let root = dom::root_element(node);
                patterns::parse_username_fast(Some(root), page, &self.trusted_hosts, &[])
            })
            .filter(|name| name != FALLBACK_USERNAME);

        let Some(username) = username else {
            debug!(url = page.url(), "status URL without a trusted username");
            return Ok(None);
        };

        let context = TweetContext::new(post_id, username, NAME, CONFIDENCE)
            .with_meta("sourceUrl", page.url());
        Ok(Some(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    async fn run(url: &str) -> Result<Option<TweetContext>> {
        let doc = Html::parse_document(r#"<div id="t" data-tweet-id="9999999999"></div>"#);
        let node = doc.select(&Selector::parse("#t").unwrap()).next().unwrap();
        UrlBasedStrategy::new(&ResolverConfig::default())
            .extract(node, &PageContext::new(url))
            .await
    }

    #[tokio::test]
    async fn test_status_url() {
        let ctx = run("https://x.com/alice/status/42").await.unwrap().unwrap();

        assert_eq!(ctx.post_id, "42");
        assert_eq!(ctx.username, "alice");
        assert_eq!(ctx.confidence, 0.8);
        assert_eq!(ctx.resolution_method, "url-based");
        assert_eq!(ctx.post_url, "https://twitter.com/alice/status/42");
        assert_eq!(ctx.metadata["sourceUrl"], "https://x.com/alice/status/42");
    }

    #[tokio::test]
    async fn test_ignores_node_attributes() {
        let ctx = run("https://x.com/testuser/status/1234567890").await.unwrap().unwrap();
        assert_eq!(ctx.post_id, "1234567890");
    }

    #[tokio::test]
    async fn test_url_variants() {
        for url in [
            "https://x.com/testuser/status/1234567890?s=20",
            "https://x.com/testuser/status/1234567890#m",
            "https://x.com/testuser/status/1234567890/photo/1",
            "https://x.com/testuser/status/1234567890/quote/9876543210",
            "https://mobile.twitter.com/testuser/status/1234567890",
            "https://twitter.com:443/testuser/status/1234567890",
        ] {
            let ctx = run(url).await.unwrap().unwrap();
            assert_eq!(ctx.post_id, "1234567890", "{}", url);
            assert_eq!(ctx.username, "testuser", "{}", url);
        }
    }

    #[tokio::test]
    async fn test_untrusted_host_has_no_username() {
        assert!(run("https://spoofed-x.com/bob/status/99").await.unwrap().is_none());
        assert!(run("https://x.com.evil.net/bob/status/99").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_no_status_id() {
        assert!(run("https://x.com/testuser").await.unwrap().is_none());
        assert!(run("https://x.com/testuser/status/").await.unwrap().is_none());
        assert!(run("https://x.com//testuser//status//1234567890").await.unwrap().is_none());
        assert!(run("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejected_usernames() {
        assert!(run("https://x.com/fallback/status/1234567890").await.unwrap().is_none());
        assert!(run("https://x.com/status/1234567890").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unparseable_url_is_a_fault() {
        assert!(run("x.com/alice/status/42").await.is_err());
    }

    #[tokio::test]
    async fn test_fast_path_uses_document_meta() {
        let html = r#"<html><head><meta name="twitter:creator" content="@meta_user"></head><body><p id="t"></p></body></html>"#;
        let doc = Html::parse_document(html);
        let node = doc.select(&Selector::parse("#t").unwrap()).next().unwrap();
        let ctx = UrlBasedStrategy::new(&ResolverConfig::default())
            .extract(node, &PageContext::new("https://x.com/i/status/77"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(ctx.post_id, "77");
        assert_eq!(ctx.username, "meta_user");
    }
}
