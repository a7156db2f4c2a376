//! URL and attribute patterns shared by the strategies: status ids, aria ids,
//! username validation, the trusted-host guard and the fast-path username parser.

use crate::context::PageContext;
use crate::dom;
use regex::Regex;
use scraper::{ElementRef, Selector};
use std::sync::LazyLock;
use url::Url;

static STATUS_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/status/(\d+)").expect("status pattern"));

static ARIA_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"id__(\d+)").expect("aria pattern"));

static PHOTO_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|/)photo/\d+$").expect("photo pattern"));

static USERNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{1,15}$").expect("username pattern"));

/// Route names that look like handles but are app pages.
const RESERVED_ROUTES: &[&str] = &[
    "i", "home", "explore", "notifications", "messages", "bookmarks", "lists", "profile", "more",
    "compose", "search", "settings", "help", "display", "moments", "topics", "login", "logout",
    "signup", "account", "privacy", "tos", "hashtag", "intent", "share", "status",
];

/// Hosts whose first path segment is a handle.
pub const DEFAULT_TRUSTED_HOSTS: &[&str] = &["twitter.com", "x.com"];

/// First `/status/<digits>` id in a URL or path.
pub fn status_id(url: &str) -> Option<String> {
    STATUS_ID.captures(url).map(|c| c[1].to_string())
}

/// Id encoded in an `aria-labelledby` reference such as `id__1234`.
pub fn aria_id(labelled_by: &str) -> Option<String> {
    ARIA_ID.captures(labelled_by).map(|c| c[1].to_string())
}

/// Whether an href points at a photo sub-page (`.../photo/1`).
pub fn is_photo_path(href: &str) -> bool {
    PHOTO_SUFFIX.is_match(href)
}

pub fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

pub fn is_reserved_route(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    RESERVED_ROUTES.contains(&lower.as_str())
}

/// A plausible handle: 1-15 word characters and not an app route.
pub fn is_valid_username(name: &str) -> bool {
    USERNAME.is_match(name) && !is_reserved_route(name)
}

/// `"/alice"` -> `Some("alice")`. Anything with more than one segment is rejected.
pub fn single_segment(href: &str) -> Option<&str> {
    let rest = href.strip_prefix('/')?;
    let rest = rest.split(&['?', '#'][..]).next().unwrap_or(rest);
    if rest.is_empty() || rest.contains('/') {
        None
    } else {
        Some(rest)
    }
}

/// Links to a post, its media, or search/hashtag pages never name the author.
pub fn is_content_link(href: &str) -> bool {
    ["/status/", "/photo/", "/video/", "/hashtag/", "/search"]
        .iter()
        .any(|p| href.contains(p))
}

/// Host is one of `trusted` or a subdomain of one.
///
/// Matching is on label boundaries: `spoofed-x.com` does not pass for `x.com`.
pub fn is_trusted_host(host: &str, trusted: &[String]) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    trusted.iter().any(|t| {
        let t = t.to_ascii_lowercase();
        host == t || host.ends_with(&format!(".{}", t))
    })
}

/// First path segment of a navigation URL on a trusted host.
pub fn url_username(url: &Url, trusted: &[String]) -> Option<String> {
    let host = url.host_str()?;
    if !is_trusted_host(host, trusted) {
        return None;
    }
    let first = url.path_segments()?.next()?;
    if first.is_empty() || is_reserved_route(first) {
        None
    } else {
        Some(first.to_string())
    }
}

/// First segment of the page path on a trusted host, only when more path
/// follows it (`/alice/...`).
pub fn leading_path_username(page: &PageContext, trusted: &[String]) -> Option<String> {
    let url = page.parsed()?;
    if !is_trusted_host(url.host_str()?, trusted) {
        return None;
    }
    let path = page.path();
    let (first, _) = path.strip_prefix('/')?.split_once('/')?;
    is_valid_username(first).then(|| first.to_string())
}

/// Strip `@`, take the last path segment, and validate.
fn clean_username(text: &str) -> Option<String> {
    let text = text.trim().trim_start_matches('@').trim();
    let text = text.rsplit('/').next().unwrap_or(text);
    is_valid_username(text).then(|| text.to_string())
}

const DOM_USERNAME_SELECTORS: &[&str] = &[
    r#"[data-testid="UserName"] [dir="ltr"]"#,
    r#"[data-testid="User-Name"] span:not([aria-hidden="true"])"#,
    r#"article [data-testid="User-Name"] span:not([aria-hidden="true"])"#,
    r#"article [role="link"] span[dir="ltr"]"#,
    r#"h2[role="heading"] span[dir="ltr"]"#,
    r#"a[role="link"][href^="/"]"#,
];

const META_USERNAME_SELECTORS: &[&str] = &[
    r#"meta[property="profile:username"]"#,
    r#"meta[property="twitter:creator"]"#,
    r#"meta[name="twitter:creator"]"#,
    r#"meta[property="og:url"]"#,
];

/// Secondary username parser: name spans and profile links in `scope`
/// (skipping posts nested in it), then the navigation URL on a trusted host,
/// then the document's meta tags.
pub fn parse_username_fast(
    scope: Option<ElementRef<'_>>,
    page: &PageContext,
    trusted: &[String],
    nested: &[Selector],
) -> Option<String> {
    if let Some(found) = scope.and_then(|scope| username_from_dom(scope, nested)) {
        return Some(found);
    }

    let from_url = page
        .parsed()
        .and_then(|url| url_username(&url, trusted))
        .filter(|name| is_valid_username(name));
    if from_url.is_some() {
        return from_url;
    }

    scope.and_then(username_from_meta)
}

fn username_from_dom(scope: ElementRef<'_>, nested: &[Selector]) -> Option<String> {
    for css in DOM_USERNAME_SELECTORS {
        let Ok(selector) = dom::selector(css) else {
            continue;
        };
        for element in dom::select_outside(scope, &selector, nested) {
            let found = if dom::tag_name(element) == "a" {
                dom::attr(element, "href")
                    .and_then(single_segment)
                    .and_then(clean_username)
            } else {
                clean_username(&element.text().collect::<String>())
            };
            if found.is_some() {
                return found;
            }
        }
    }
    None
}

fn username_from_meta(scope: ElementRef<'_>) -> Option<String> {
    let root = dom::root_element(scope);
    META_USERNAME_SELECTORS.iter().find_map(|css| {
        let selector = dom::selector(css).ok()?;
        root.select(&selector)
            .filter_map(|meta| dom::attr(meta, "content"))
            .find_map(clean_username)
    })
}
