//! HTML sanitization before a page is written to the mirror
//!
//! Two rewrites are applied to every exported page:
//! - The development-only client script injected by the preview server is
//!   removed
//! - Image-loader URLs are replaced with the original image URLs they wrap,
//!   since the loader endpoint does not exist in a static mirror

use crate::config::PathsConfig;
use crate::url::UrlClassifier;
use crate::UrlError;
use regex::{Captures, Regex};

/// Rewrites page markup for static hosting
#[derive(Debug, Clone)]
pub struct Sanitizer {
    dev_client: Regex,
    image_loader: Regex,
    classifier: UrlClassifier,
}

impl Sanitizer {
    /// Compiles the rewrite patterns for the configured routes
    ///
    /// The dev-client pattern matches a `<script ... src="{script}" ...></script>`
    /// tag exactly; the loader pattern matches the loader route followed by a
    /// query string, up to the next quote, whitespace or `)`.
    pub fn new(paths: &PathsConfig, classifier: UrlClassifier) -> Result<Self, UrlError> {
        let dev_client = Regex::new(&format!(
            r#"<script[^>]*src="{}"[^>]*></script>"#,
            regex::escape(&paths.dev_client_script)
        ))
        .map_err(|e| UrlError::Pattern(e.to_string()))?;

        let image_loader = Regex::new(&format!(
            r#"{}\?[^"'\s)]+"#,
            regex::escape(&paths.image_loader_route)
        ))
        .map_err(|e| UrlError::Pattern(e.to_string()))?;

        Ok(Self {
            dev_client,
            image_loader,
            classifier,
        })
    }

    /// Applies both rewrites to `html`
    pub fn sanitize(&self, html: &str) -> String {
        let without_dev_client = self.dev_client.replace_all(html, "");

        self.image_loader
            .replace_all(&without_dev_client, |caps: &Captures| {
                self.classifier.rewrite_dynamic_image_url(&caps[0])
            })
            .into_owned()
    }
}
