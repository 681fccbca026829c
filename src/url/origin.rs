use crate::UrlError;
use url::Url;

/// Parses and validates the origin of the preview server
///
/// Only `http` and `https` origins with a host are accepted. Any path,
/// query, or fragment is dropped so the result can serve as a join base.
///
/// # Examples
///
/// ```
/// use site_mirror::url::parse_origin;
///
/// let origin = parse_origin("http://127.0.0.1:8000/ignored?x=1").unwrap();
/// assert_eq!(origin.as_str(), "http://127.0.0.1:8000/");
/// ```
pub fn parse_origin(origin: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(origin).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS origins are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}

/// Places an origin-relative `path` on `origin`
///
/// The path is set rather than joined, so a path starting with `//` stays a
/// path on the origin instead of naming another host.
///
/// # Examples
///
/// ```
/// use site_mirror::url::{parse_origin, url_on_origin};
///
/// let origin = parse_origin("http://127.0.0.1:8000").unwrap();
/// let url = url_on_origin(&origin, "//example.com/secret");
/// assert_eq!(url.as_str(), "http://127.0.0.1:8000//example.com/secret");
/// ```
pub fn url_on_origin(origin: &Url, path: &str) -> Url {
    let mut url = origin.clone();
    url.set_path(path);
    url
}

/// Resolves a raw attribute value found on `current_path`
///
/// The base is the origin with `current_path` as its path, so relative
/// references behave the way a browser viewing that page would resolve them.
pub fn resolve_reference(origin: &Url, current_path: &str, raw: &str) -> Result<Url, UrlError> {
    let base = url_on_origin(origin, current_path);

    base.join(raw)
        .map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))
}

/// Returns true if both URLs share scheme, host and port
pub fn is_same_origin(url: &Url, origin: &Url) -> bool {
    url.origin() == origin.origin()
}
