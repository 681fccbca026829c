//! URL handling module for Site-Mirror
//!
//! This module decides what a discovered path is (a page to crawl or an asset
//! to copy verbatim), normalizes page paths, resolves references against the
//! origin, and undoes the image-proxy rewrite applied by the preview server.

mod matcher;
mod normalize;
mod origin;

use crate::config::PathsConfig;
use crate::UrlResult;
use url::Url;

// Re-export main functions
pub use matcher::matches_any_prefix;
pub use normalize::{final_extension, normalize_page_path, unescape_amp};
pub use origin::{is_same_origin, parse_origin, resolve_reference, url_on_origin};

/// Final-segment extensions that mark a path as a page
const PAGE_EXTENSIONS: &[&str] = &["", "/"];

/// What a same-origin path refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    /// HTML route - fetched, sanitized, scanned for links
    Page,
    /// Anything else - fetched and written byte for byte
    Asset,
}

impl PathKind {
    /// Returns true if the path should be crawled
    pub fn is_page(&self) -> bool {
        matches!(self, Self::Page)
    }
}

/// Classifies paths and rewrites loader URLs for one origin
///
/// # Examples
///
/// ```
/// use site_mirror::config::PathsConfig;
/// use site_mirror::url::{parse_origin, PathKind, UrlClassifier};
///
/// let origin = parse_origin("http://127.0.0.1:8000").unwrap();
/// let classifier = UrlClassifier::new(origin, &PathsConfig::default());
///
/// assert_eq!(classifier.classify("/about"), PathKind::Page);
/// assert_eq!(classifier.classify("/logo.png"), PathKind::Asset);
/// assert_eq!(classifier.classify("/api/signup"), PathKind::Asset);
/// ```
#[derive(Debug, Clone)]
pub struct UrlClassifier {
    origin: Url,
    reserved_prefixes: Vec<String>,
    live_prefixes: Vec<String>,
    image_loader_route: String,
}

impl UrlClassifier {
    /// Creates a classifier for the given origin and route conventions
    pub fn new(origin: Url, paths: &PathsConfig) -> Self {
        Self {
            origin,
            reserved_prefixes: paths.reserved_prefixes.clone(),
            live_prefixes: paths.live_prefixes.clone(),
            image_loader_route: paths.image_loader_route.clone(),
        }
    }

    /// Parses `origin` and creates a classifier for it
    pub fn from_origin(origin: &str, paths: &PathsConfig) -> UrlResult<Self> {
        Ok(Self::new(parse_origin(origin)?, paths))
    }

    /// The origin every reference is resolved against
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// The URL `path` is fetched from; always on the origin
    pub fn url_for(&self, path: &str) -> Url {
        url_on_origin(&self.origin, path)
    }

    /// Route of the image proxy endpoint
    pub fn image_loader_route(&self) -> &str {
        &self.image_loader_route
    }

    /// Returns true if `path` looks like an HTML page
    ///
    /// Reserved prefixes (framework internals, live endpoints, APIs) are never
    /// pages. Otherwise a path is a page when its final segment has no
    /// extension.
    pub fn is_likely_page(&self, path: &str) -> bool {
        if matches_any_prefix(path, &self.reserved_prefixes) {
            return false;
        }

        PAGE_EXTENSIONS.contains(&final_extension(path))
    }

    /// Classifies a same-origin path as page or asset
    pub fn classify(&self, path: &str) -> PathKind {
        if self.is_likely_page(path) {
            PathKind::Page
        } else {
            PathKind::Asset
        }
    }

    /// Returns true if `path` is a server-side rendering endpoint
    pub fn is_live(&self, path: &str) -> bool {
        matches_any_prefix(path, &self.live_prefixes)
    }

    /// Maps an image-loader URL back to the original image URL
    ///
    /// Anything that is not a loader URL, cannot be parsed, or carries no
    /// `src` parameter is returned unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use site_mirror::config::PathsConfig;
    /// use site_mirror::url::UrlClassifier;
    ///
    /// let classifier =
    ///     UrlClassifier::from_origin("http://127.0.0.1:8000", &PathsConfig::default()).unwrap();
    /// let rewritten = classifier.rewrite_dynamic_image_url(
    ///     "/live/invoke/website/loaders/image.ts?src=https%3A%2F%2Fcdn.example%2Fx.png&amp;fit=cover",
    /// );
    /// assert_eq!(rewritten, "https://cdn.example/x.png");
    /// ```
    pub fn rewrite_dynamic_image_url(&self, raw_url: &str) -> String {
        let normalized = unescape_amp(raw_url);

        let parsed = match self.origin.join(&normalized) {
            Ok(url) => url,
            Err(_) => return raw_url.to_string(),
        };

        if parsed.path() != self.image_loader_route {
            return raw_url.to_string();
        }

        parsed
            .query_pairs()
            .find(|(key, _)| key == "src")
            .map(|(_, value)| value.into_owned())
            .unwrap_or_else(|| raw_url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> UrlClassifier {
        UrlClassifier::from_origin("http://127.0.0.1:8000", &PathsConfig::default()).unwrap()
    }

    #[test]
    fn test_extensionless_paths_are_pages() {
        let c = classifier();
        for path in ["/", "/about", "/events/2024", "/blog/", "/.well-known/thing"] {
            assert!(c.is_likely_page(path), "{} should be a page", path);
        }
    }

    #[test]
    fn test_dotted_final_segment_is_asset() {
        let c = classifier();
        for path in [
            "/logo.png",
            "/styles/main.css",
            "/manifest.json",
            "/favicon.ico",
            "/archive.tar.gz",
            "/trailing.",
        ] {
            assert!(!c.is_likely_page(path), "{} should be an asset", path);
        }
    }

    #[test]
    fn test_dot_in_earlier_segment_does_not_matter() {
        let c = classifier();
        assert!(c.is_likely_page("/v1.2/changelog"));
        assert!(!c.is_likely_page("/v1.2/changelog.txt"));
    }

    #[test]
    fn test_reserved_prefixes_are_never_pages() {
        let c = classifier();
        for path in [
            "/_frsh/js/main",
            "/live/previews",
            "/_live/workflows",
            "/deco/render",
            "/api/meetup-signup",
            "/api/",
            "/_frsh/js/chunk.js",
        ] {
            assert!(!c.is_likely_page(path), "{} is reserved", path);
            assert_eq!(c.classify(path), PathKind::Asset);
        }
    }

    #[test]
    fn test_reserved_prefix_requires_full_prefix() {
        let c = classifier();
        assert!(c.is_likely_page("/apis"));
        assert!(c.is_likely_page("/livestream"));
    }

    #[test]
    fn test_custom_reserved_prefixes() {
        let paths = PathsConfig {
            reserved_prefixes: vec!["/admin/".to_string()],
            ..PathsConfig::default()
        };
        let c = UrlClassifier::from_origin("http://localhost:3000", &paths).unwrap();
        assert!(!c.is_likely_page("/admin/users"));
        assert!(c.is_likely_page("/api/users"));
    }

    #[test]
    fn test_is_live() {
        let c = classifier();
        assert!(c.is_live("/live/invoke/website/loaders/image.ts"));
        assert!(!c.is_live("/_live/workflows"));
        assert!(!c.is_live("/logo.png"));
    }

    #[test]
    fn test_rewrite_loader_url() {
        let c = classifier();
        let raw = "/live/invoke/website/loaders/image.ts?src=https%3A%2F%2Fcdn.example%2Fx.png&amp;foo=1";
        assert_eq!(c.rewrite_dynamic_image_url(raw), "https://cdn.example/x.png");
    }

    #[test]
    fn test_rewrite_absolute_loader_url() {
        let c = classifier();
        let raw = "http://127.0.0.1:8000/live/invoke/website/loaders/image.ts?width=300&src=%2Fimages%2Fhero.png";
        assert_eq!(c.rewrite_dynamic_image_url(raw), "/images/hero.png");
    }

    #[test]
    fn test_rewrite_without_src_returns_input() {
        let c = classifier();
        let raw = "/live/invoke/website/loaders/image.ts?width=300&amp;height=200";
        assert_eq!(c.rewrite_dynamic_image_url(raw), raw);
    }

    #[test]
    fn test_rewrite_other_route_returns_input() {
        let c = classifier();
        let raw = "/images/hero.png?src=elsewhere&amp;x=1";
        assert_eq!(c.rewrite_dynamic_image_url(raw), raw);
    }

    #[test]
    fn test_path_kind_is_page() {
        assert!(PathKind::Page.is_page());
        assert!(!PathKind::Asset.is_page());
    }
}
