use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use url::Url;

/// Placeholder id/username some strategies fall back to. Never a valid post id.
pub const UNKNOWN: &str = "unknown";

/// Username some heuristics produce when they found nothing; treated as "no answer".
pub const FALLBACK_USERNAME: &str = "fallback";

/// The resolved answer for one click: which post, who wrote it, and how we know.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetContext {
    pub post_id: String,
    pub username: String,
    pub post_url: String,
    pub resolution_method: String,
    pub confidence: f64,
    pub metadata: BTreeMap<String, Value>,
}

impl TweetContext {
    pub fn new(
        post_id: impl Into<String>,
        username: impl Into<String>,
        resolution_method: impl Into<String>,
        confidence: f64,
    ) -> Self {
        let post_id = post_id.into();
        let username = username.into();
        let post_url = post_url(&username, &post_id);

        Self {
            post_id,
            username,
            post_url,
            resolution_method: resolution_method.into(),
            confidence,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Whether the resolver may hand this context to a caller.
    pub fn is_valid(&self) -> bool {
        is_valid_post_id(&self.post_id)
    }
}

/// Canonical permalink for a post.
pub fn post_url(username: &str, post_id: &str) -> String {
    format!("https://twitter.com/{}/status/{}", username, post_id)
}

/// A post id must be non-empty, all ASCII digits, and not the `unknown` sentinel.
pub fn is_valid_post_id(post_id: &str) -> bool {
    !post_id.is_empty()
        && post_id != UNKNOWN
        && post_id.bytes().all(|b| b.is_ascii_digit())
}

/// Ambient navigation state for one resolution call.
///
/// Two strategies read the page URL; it is passed in explicitly rather than
/// looked up from a global so resolution stays a pure function of its inputs.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    url: String,
}

impl PageContext {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn parsed(&self) -> Option<Url> {
        Url::parse(&self.url).ok()
    }

    /// Path component of the navigation URL, or `""` when unparseable.
    pub fn path(&self) -> String {
        self.parsed()
            .map(|u| u.path().to_string())
            .unwrap_or_default()
    }
}
