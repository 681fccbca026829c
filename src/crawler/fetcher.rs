//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests made against the preview server
//! once it is ready:
//! - Building the HTTP client shared by page and asset fetches
//! - GET requests for pages, with Content-Type checking
//! - GET requests for assets, returning raw bytes
//!
//! HTTP error statuses are reported as values so the caller can skip the
//! item. Transport failures (connection reset, timeout, ...) are returned as
//! [`ExportError::Http`] and abort the export.

use crate::config::TimingConfig;
use crate::ExportError;
use reqwest::{Client, Response};
use std::time::Duration;

/// Result of a page fetch
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched an HTML page
    Html {
        /// Final URL after redirects
        final_url: String,
        /// Content-Type header value
        content_type: String,
        /// Page body
        body: String,
    },

    /// The page answered with a non-HTML Content-Type
    UnsupportedContentType {
        /// The actual Content-Type received
        content_type: String,
    },

    /// The page answered with a non-success status
    PageFetchFailed {
        /// The HTTP status code
        status_code: u16,
    },
}

/// Result of an asset fetch
#[derive(Debug)]
pub enum AssetFetch {
    /// The asset body, byte for byte
    Body(Vec<u8>),

    /// The asset answered with a non-success status
    AssetFetchFailed {
        /// The HTTP status code
        status_code: u16,
    },
}

/// Builds the HTTP client used for pages and assets
///
/// Redirects are followed with reqwest's default policy; the page is
/// written under the path it was requested at.
///
/// # Example
///
/// ```
/// use site_mirror::config::TimingConfig;
/// use site_mirror::crawler::build_http_client;
///
/// let client = build_http_client(&TimingConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &TimingConfig) -> Result<Client, reqwest::Error> {
    let user_agent = format!("site-mirror/{}", env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(config.request_timeout())
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a page and checks that it is HTML
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The absolute URL of the page
///
/// # Returns
///
/// * `Ok(FetchResult)` - The page, or the reason it is skipped
/// * `Err(ExportError::Http)` - The request itself failed
pub async fn fetch_page(client: &Client, url: &str) -> Result<FetchResult, ExportError> {
    let response = send(client, url).await?;
    let status = response.status();

    if !status.is_success() {
        return Ok(FetchResult::PageFetchFailed {
            status_code: status.as_u16(),
        });
    }

    let content_type = content_type(&response);
    if !content_type.contains("text/html") {
        return Ok(FetchResult::UnsupportedContentType { content_type });
    }

    let final_url = response.url().to_string();
    let body = response.text().await.map_err(|source| ExportError::Http {
        url: url.to_string(),
        source,
    })?;

    Ok(FetchResult::Html {
        final_url,
        content_type,
        body,
    })
}

/// Fetches an asset's raw bytes
pub async fn fetch_asset(client: &Client, url: &str) -> Result<AssetFetch, ExportError> {
    let response = send(client, url).await?;
    let status = response.status();

    if !status.is_success() {
        return Ok(AssetFetch::AssetFetchFailed {
            status_code: status.as_u16(),
        });
    }

    let bytes = response.bytes().await.map_err(|source| ExportError::Http {
        url: url.to_string(),
        source,
    })?;

    Ok(AssetFetch::Body(bytes.to_vec()))
}

async fn send(client: &Client, url: &str) -> Result<Response, ExportError> {
    client
        .get(url)
        .send()
        .await
        .map_err(|source| ExportError::Http {
            url: url.to_string(),
            source,
        })
}

fn content_type(response: &Response) -> String {
    response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> Client {
        build_http_client(&TimingConfig::default()).unwrap()
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(&TimingConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_html_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/about"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<html>about</html>", "text/html"),
            )
            .mount(&server)
            .await;

        let url = format!("{}/about", server.uri());
        match fetch_page(&client(), &url).await.unwrap() {
            FetchResult::Html {
                body, content_type, ..
            } => {
                assert_eq!(body, "<html>about</html>");
                assert!(content_type.starts_with("text/html"));
            }
            other => panic!("expected HTML, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_non_html_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<rss/>", "application/xml"),
            )
            .mount(&server)
            .await;

        let url = format!("{}/feed", server.uri());
        let result = fetch_page(&client(), &url).await.unwrap();
        assert!(matches!(
            result,
            FetchResult::UnsupportedContentType { ref content_type } if content_type.contains("xml")
        ));
    }

    #[tokio::test]
    async fn test_fetch_missing_page() {
        let server = MockServer::start().await;

        let url = format!("{}/missing", server.uri());
        let result = fetch_page(&client(), &url).await.unwrap();
        assert!(matches!(
            result,
            FetchResult::PageFetchFailed { status_code: 404 }
        ));
    }

    #[tokio::test]
    async fn test_fetch_asset_bytes() {
        let server = MockServer::start().await;
        let png = vec![0x89, b'P', b'N', b'G', 0x00, 0xff];
        Mock::given(method("GET"))
            .and(path("/logo.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(png.clone(), "image/png"),
            )
            .mount(&server)
            .await;

        let url = format!("{}/logo.png", server.uri());
        match fetch_asset(&client(), &url).await.unwrap() {
            AssetFetch::Body(bytes) => assert_eq!(bytes, png),
            other => panic!("expected body, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_missing_asset() {
        let server = MockServer::start().await;

        let url = format!("{}/gone.css", server.uri());
        let result = fetch_asset(&client(), &url).await.unwrap();
        assert!(matches!(
            result,
            AssetFetch::AssetFetchFailed { status_code: 404 }
        ));
    }

    #[tokio::test]
    async fn test_connection_refused_is_fatal() {
        // Nothing listens on port 1 in test environments.
        let result = fetch_page(&client(), "http://127.0.0.1:1/").await;
        assert!(matches!(result, Err(ExportError::Http { .. })));
    }
}
