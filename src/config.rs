use crate::error::ConfigError;
use crate::patterns::DEFAULT_TRUSTED_HOSTS;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Selectors that mark the start of one post's rendered content.
pub const DEFAULT_BOUNDARY_SELECTORS: &[&str] = &[
    r#"[data-testid="tweet"]"#,
    r#"article[role="article"]"#,
    r#"article[data-tweet-id]"#,
    r#"div[data-testid="cellInnerDiv"] > article"#,
];

/// Traversal caps and trust lists for the resolution pipeline.
///
/// Every walk in the pipeline is bounded by one of these caps so a
/// pathological tree cannot make resolution unbounded.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Ancestor hops for username lookup and the parent-traversal strategy
    pub max_ancestor_hops: usize,
    /// Parent levels the data-attribute strategy inspects above the node
    pub data_attribute_levels: usize,
    /// Breadth-first depth for the media container fallback search
    pub media_search_depth: usize,
    /// Hosts (and their subdomains) whose URL path names the author
    pub trusted_hosts: Vec<String>,
    pub boundary_selectors: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_ancestor_hops: 10,
            data_attribute_levels: 5,
            media_search_depth: 3,
            trusted_hosts: DEFAULT_TRUSTED_HOSTS.iter().map(|s| s.to_string()).collect(),
            boundary_selectors: DEFAULT_BOUNDARY_SELECTORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ResolverConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// `<config dir>/tweetctx/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tweetctx").join("config.toml"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_ancestor_hops == 0 {
            return Err(ConfigError::Invalid("max_ancestor_hops must be at least 1".into()));
        }
        if self.media_search_depth == 0 {
            return Err(ConfigError::Invalid("media_search_depth must be at least 1".into()));
        }
        if self.trusted_hosts.iter().all(|h| h.trim().is_empty()) {
            return Err(ConfigError::Invalid("trusted_hosts is empty".into()));
        }
        if self.boundary_selectors.is_empty() {
            return Err(ConfigError::Invalid("boundary_selectors is empty".into()));
        }
        Ok(())
    }
}
