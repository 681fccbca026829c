//! Link and asset extraction from exported markup
//!
//! Extraction scans the page text with two regular expressions instead of
//! building a DOM. The markup comes from the site's own renderer, so the
//! attribute shapes are known:
//! - `href="..."` / `src="..."` values, fragment-only values excluded
//! - `srcset="..."` values, a comma-separated list of `url descriptor` pairs
//!
//! Only the first whitespace-delimited token of each srcset candidate is used,
//! so URLs containing literal commas or spaces are not supported.

use crate::url::{is_same_origin, normalize_page_path, resolve_reference, unescape_amp, UrlClassifier};
use regex::Regex;
use std::sync::OnceLock;

/// A same-origin reference found on a page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    /// Normalized page path to crawl
    Page(String),
    /// Origin-relative asset path to copy
    Asset(String),
}

fn attr_regex() -> &'static Regex {
    static ATTR: OnceLock<Regex> = OnceLock::new();
    ATTR.get_or_init(|| Regex::new(r##"(?:href|src)=['"]([^'"#]+)['"]"##).expect("valid regex"))
}

fn srcset_regex() -> &'static Regex {
    static SRCSET: OnceLock<Regex> = OnceLock::new();
    SRCSET.get_or_init(|| Regex::new(r#"srcset=['"]([^'"]+)['"]"#).expect("valid regex"))
}

/// Extracts every same-origin page and asset referenced by `html`
///
/// References are resolved against `current_path` on the classifier's
/// origin. Cross-origin references are dropped and malformed ones skipped.
/// Results keep document order: all `href`/`src` references first, then all
/// `srcset` candidates. Duplicates are kept; the crawl engine deduplicates.
///
/// # Example
///
/// ```
/// use site_mirror::config::PathsConfig;
/// use site_mirror::crawler::{extract_references, Reference};
/// use site_mirror::url::UrlClassifier;
///
/// let classifier =
///     UrlClassifier::from_origin("http://127.0.0.1:8000", &PathsConfig::default()).unwrap();
/// let html = r#"<a href="/about/">About</a><img src="logo.png">"#;
///
/// assert_eq!(
///     extract_references(html, "/", &classifier),
///     vec![
///         Reference::Page("/about".to_string()),
///         Reference::Asset("/logo.png".to_string()),
///     ]
/// );
/// ```
pub fn extract_references(html: &str, current_path: &str, classifier: &UrlClassifier) -> Vec<Reference> {
    let mut references = Vec::new();

    for caps in attr_regex().captures_iter(html) {
        let raw = &caps[1];

        let Some(path) = resolve_path(raw, current_path, classifier) else {
            continue;
        };

        if classifier.is_likely_page(&path) {
            references.push(Reference::Page(normalize_page_path(&path)));
        } else {
            references.push(Reference::Asset(path));
        }
    }

    for caps in srcset_regex().captures_iter(html) {
        for candidate in srcset_candidates(&caps[1]) {
            let unescaped = unescape_amp(candidate);
            if let Some(path) = resolve_path(&unescaped, current_path, classifier) {
                references.push(Reference::Asset(path));
            }
        }
    }

    references
}

/// Splits a srcset value into the URL part of each candidate
///
/// Empty candidates (from a trailing comma) are dropped; resolving an empty
/// string would yield the current page itself.
pub fn srcset_candidates(srcset: &str) -> impl Iterator<Item = &str> {
    srcset
        .split(',')
        .filter_map(|part| part.split_whitespace().next())
}

/// Resolves a raw reference to a same-origin path
fn resolve_path(raw: &str, current_path: &str, classifier: &UrlClassifier) -> Option<String> {
    let url = match resolve_reference(classifier.origin(), current_path, raw) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!("Skipping malformed URL on {}: {}", current_path, e);
            return None;
        }
    };

    if !is_same_origin(&url, classifier.origin()) {
        tracing::trace!("Ignoring external reference {}", url);
        return None;
    }

    Some(url.path().to_string())
}
