use super::TweetStrategy;
use crate::config::ResolverConfig;
use crate::context::{PageContext, TweetContext, UNKNOWN};
use crate::dom;
use crate::patterns::{self, is_valid_username, single_segment};
use crate::quote::{self, QuoteTweetDetector, StructuralAnalysis};
use anyhow::Result;
use async_trait::async_trait;
use scraper::{ElementRef, Selector};
use tracing::debug;

const NAME: &str = "clicked-element";
const CONFIDENCE: f64 = 0.9;

/// Attributes that carry a bare numeric post id on the clicked element.
const ID_ATTRIBUTES: &[&str] = &["data-tweet-id", "data-item-id", "data-testid", "data-focusable"];

/// Reads the post id straight off the clicked element, falling back to the
/// post container the click landed in.
pub struct ClickedElementStrategy {
    detector: QuoteTweetDetector,
    max_ancestor_hops: usize,
    trusted_hosts: Vec<String>,
}

impl ClickedElementStrategy {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            detector: QuoteTweetDetector::new(config),
            max_ancestor_hops: config.max_ancestor_hops,
            trusted_hosts: config.trusted_hosts.clone(),
        }
    }

    fn post_id(
        &self,
        node: ElementRef<'_>,
        analysis: &StructuralAnalysis<'_>,
        nested: &[Selector],
        page: &PageContext,
    ) -> Option<(String, &'static str)> {
        let from_data = ID_ATTRIBUTES
            .iter()
            .filter_map(|name| dom::attr(node, name))
            .find(|value| patterns::is_digits(value));
        if let Some(id) = from_data {
            return Some((id.to_string(), "data-attributes"));
        }

        if let Some(id) = dom::attr(node, "aria-labelledby").and_then(patterns::aria_id) {
            return Some((id, "aria-labelledby"));
        }

        if let Some(id) = dom::attr(node, "href").and_then(|href| id_from_href(href, page)) {
            return Some((id, "href-attribute"));
        }

        analysis
            .target_container
            .and_then(|container| quote::first_status_id_in(container, nested))
            .map(|id| (id, "ancestor-container"))
    }

    fn username(
        &self,
        node: ElementRef<'_>,
        analysis: &StructuralAnalysis<'_>,
        nested: &[Selector],
        page: &PageContext,
    ) -> Result<Option<String>> {
        let ceiling = analysis.target_container;
        if let Some(container) = ceiling {
            if let Some(name) = username_in_container(container, nested)? {
                return Ok(Some(name));
            }
        }

        let profile_links = dom::selector(r#"[href^="/"]"#)?;
        for ancestor in dom::self_and_ancestors(node).take(self.max_ancestor_hops) {
            let found = dom::select_outside(ancestor, &profile_links, nested)
                .into_iter()
                .filter_map(|e| dom::attr(e, "href"))
                .filter(|href| !is_media_or_status(href))
                .filter_map(single_segment)
                .find(|name| is_valid_username(name));
            if let Some(name) = found {
                return Ok(Some(name.to_string()));
            }
            if ceiling.is_some_and(|c| dom::same_element(c, ancestor)) {
                break;
            }
        }

        Ok(patterns::leading_path_username(page, &self.trusted_hosts))
    }
}

fn is_media_or_status(href: &str) -> bool {
    href.contains("/status/") || href.contains("/photo/") || href.contains("/video/")
}

/// `/status/<id>` in the href, or for a photo sub-page the id of the page we're on.
fn id_from_href(href: &str, page: &PageContext) -> Option<String> {
    patterns::status_id(href).or_else(|| {
        if patterns::is_photo_path(href) {
            patterns::status_id(page.url())
        } else {
            None
        }
    })
}

fn username_in_container(container: ElementRef<'_>, nested: &[Selector]) -> Result<Option<String>> {
    let user_name = dom::selector(r#"a[href^="/"][data-testid="User-Name"]"#)?;
    let from_header = dom::select_outside(container, &user_name, nested)
        .into_iter()
        .filter_map(|a| dom::attr(a, "href"))
        .filter_map(first_segment)
        .find(|name| is_valid_username(name));
    if let Some(name) = from_header {
        return Ok(Some(name.to_string()));
    }

    let role_links = dom::selector(r#"a[role="link"][href^="/"]"#)?;
    let found = dom::select_outside(container, &role_links, nested)
        .into_iter()
        .filter_map(|a| dom::attr(a, "href"))
        .filter(|href| !patterns::is_content_link(href))
        .filter_map(first_segment)
        .find(|name| is_valid_username(name));
    Ok(found.map(str::to_string))
}

fn first_segment(href: &str) -> Option<&str> {
    href.strip_prefix('/')?
        .split(&['/', '?', '#'][..])
        .next()
        .filter(|s| !s.is_empty())
}

#[async_trait(?Send)]
impl TweetStrategy for ClickedElementStrategy {
    fn name(&self) -> &str {
        NAME
    }

    fn priority(&self) -> u32 {
        1
    }

    async fn extract(&self, node: ElementRef<'_>, page: &PageContext) -> Result<Option<TweetContext>> {
        let analysis = self.detector.analyze(node);
        let nested = self.detector.compile_selectors()?;

        let Some((post_id, method)) = self.post_id(node, &analysis, &nested, page) else {
            debug!("no post id on clicked element");
            return Ok(None);
        };

        let username = self
            .username(node, &analysis, &nested, page)?
            .unwrap_or_else(|| UNKNOWN.to_string());

        let context = TweetContext::new(post_id, username, format!("{}-{}", NAME, method), CONFIDENCE)
            .with_meta("element", dom::tag_name(node))
            .with_meta("method", method)
            .with_meta("boundary", analysis.clicked_boundary.as_str());

        Ok(Some(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn find<'a>(doc: &'a Html, css: &str) -> ElementRef<'a> {
        doc.select(&Selector::parse(css).unwrap()).next().unwrap()
    }

    fn strategy() -> ClickedElementStrategy {
        ClickedElementStrategy::new(&ResolverConfig::default())
    }

    fn home() -> PageContext {
        PageContext::new("https://x.com/home")
    }

    #[tokio::test]
    async fn test_data_attribute_id() {
        let doc = Html::parse_document(r#"<div id="t" data-tweet-id="1234567890"></div>"#);
        let ctx = strategy().extract(find(&doc, "#t"), &home()).await.unwrap().unwrap();

        assert_eq!(ctx.post_id, "1234567890");
        assert_eq!(ctx.username, "unknown");
        assert_eq!(ctx.resolution_method, "clicked-element-data-attributes");
        assert_eq!(ctx.confidence, 0.9);
        assert_eq!(ctx.metadata["element"], "div");
    }

    #[tokio::test]
    async fn test_non_numeric_data_attribute_falls_through() {
        let doc = Html::parse_document(
            r#"<div id="t" data-testid="tweetPhoto" data-item-id="777"></div>"#,
        );
        let ctx = strategy().extract(find(&doc, "#t"), &home()).await.unwrap().unwrap();
        assert_eq!(ctx.post_id, "777");
    }

    #[tokio::test]
    async fn test_aria_labelledby() {
        let doc = Html::parse_document(r#"<div id="t" aria-labelledby="id__555 id__abc"></div>"#);
        let ctx = strategy().extract(find(&doc, "#t"), &home()).await.unwrap().unwrap();

        assert_eq!(ctx.post_id, "555");
        assert_eq!(ctx.resolution_method, "clicked-element-aria-labelledby");
    }

    #[tokio::test]
    async fn test_href_status() {
        let doc = Html::parse_document(r#"<a id="t" href="/carol/status/314/photo/1">pic</a>"#);
        let ctx = strategy().extract(find(&doc, "#t"), &home()).await.unwrap().unwrap();

        assert_eq!(ctx.post_id, "314");
        assert_eq!(ctx.resolution_method, "clicked-element-href-attribute");
    }

    #[tokio::test]
    async fn test_relative_photo_href_uses_page_url() {
        let doc = Html::parse_document(r#"<a id="t" href="photo/2">pic</a>"#);
        let page = PageContext::new("https://x.com/dave/status/2718");
        let ctx = strategy().extract(find(&doc, "#t"), &page).await.unwrap().unwrap();

        assert_eq!(ctx.post_id, "2718");
        assert_eq!(ctx.username, "dave");
    }

    #[tokio::test]
    async fn test_ancestor_container_flat() {
        let html = r#"
            <article data-testid="tweet">
              <a href="/erin" role="link">Erin</a>
              <a href="/erin/status/999"><time>2h</time></a>
              <div><img id="t" src="https://pbs.twimg.com/media/x.jpg"></div>
            </article>"#;
        let doc = Html::parse_document(html);
        let ctx = strategy().extract(find(&doc, "#t"), &home()).await.unwrap().unwrap();

        assert_eq!(ctx.post_id, "999");
        assert_eq!(ctx.username, "erin");
        assert_eq!(ctx.resolution_method, "clicked-element-ancestor-container");
        assert_eq!(ctx.metadata["boundary"], "original");
    }

    #[tokio::test]
    async fn test_ancestor_container_quoted_post() {
        let html = r#"
            <article data-testid="tweet">
              <a href="/alice" role="link">Alice</a>
              <a href="/alice/status/111">1h</a>
              <div role="link">
                <article data-testid="tweet">
                  <a href="/bob" role="link">Bob</a>
                  <a href="/bob/status/222">3h</a>
                  <div><img id="t" src="https://pbs.twimg.com/media/q.jpg"></div>
                </article>
              </div>
            </article>"#;
        let doc = Html::parse_document(html);
        let ctx = strategy().extract(find(&doc, "#t"), &home()).await.unwrap().unwrap();

        assert_eq!(ctx.post_id, "222");
        assert_eq!(ctx.username, "bob");
        assert_eq!(ctx.metadata["boundary"], "quoted");
    }

    #[tokio::test]
    async fn test_outer_post_click_ignores_quoted_permalink() {
        let html = r#"
            <article data-testid="tweet">
              <div><div data-testid="videoPlayer"><video id="t" src="https://video.twimg.com/v.mp4"></video></div></div>
              <div role="link">
                <article data-testid="tweet">
                  <a href="/bob" role="link">Bob</a>
                  <a href="/bob/status/222"><time>3h</time></a>
                </article>
              </div>
              <a href="/alice" role="link">Alice</a>
              <a href="/alice/status/111"><time>1h</time></a>
            </article>"#;
        let doc = Html::parse_document(html);
        let ctx = strategy().extract(find(&doc, "#t"), &home()).await.unwrap().unwrap();

        assert_eq!(ctx.post_id, "111");
        assert_eq!(ctx.username, "alice");
        assert_eq!(ctx.metadata["boundary"], "original");
    }

    #[tokio::test]
    async fn test_page_username_requires_trusted_host() {
        let doc = Html::parse_document(r#"<p><span id="t" data-tweet-id="99"></span></p>"#);
        let spoofed = PageContext::new("https://spoofed-x.com/bob/status/99");
        let ctx = strategy().extract(find(&doc, "#t"), &spoofed).await.unwrap().unwrap();
        assert_eq!(ctx.username, "unknown");

        let trusted = PageContext::new("https://x.com/bob/status/99");
        let ctx = strategy().extract(find(&doc, "#t"), &trusted).await.unwrap().unwrap();
        assert_eq!(ctx.username, "bob");
    }

    #[tokio::test]
    async fn test_username_from_ancestor_links() {
        let html = r#"
            <div>
              <a href="/frank">Frank</a>
              <a href="/frank/status/5">link</a>
              <span id="t" data-tweet-id="5"></span>
            </div>"#;
        let doc = Html::parse_document(html);
        let ctx = strategy().extract(find(&doc, "#t"), &home()).await.unwrap().unwrap();
        assert_eq!(ctx.username, "frank");
    }

    #[tokio::test]
    async fn test_nothing_found() {
        let doc = Html::parse_document(r#"<div><span id="t">text</span></div>"#);
        assert!(strategy().extract(find(&doc, "#t"), &home()).await.unwrap().is_none());
    }

    #[test]
    fn test_first_segment() {
        assert_eq!(first_segment("/alice/status/1"), Some("alice"));
        assert_eq!(first_segment("/alice"), Some("alice"));
        assert_eq!(first_segment("/"), None);
    }
}
