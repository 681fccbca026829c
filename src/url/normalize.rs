/// Normalizes a page path into its frontier key
///
/// # Normalization Steps
///
/// 1. Remove a single trailing slash
/// 2. Empty result becomes `/`
///
/// Paths handed to this function come from [`url::Url::path`], so dot
/// segments are already resolved and the leading `/` is always present.
///
/// # Examples
///
/// ```
/// use site_mirror::url::normalize_page_path;
///
/// assert_eq!(normalize_page_path("/about/"), "/about");
/// assert_eq!(normalize_page_path("/"), "/");
/// ```
pub fn normalize_page_path(path: &str) -> String {
    let trimmed = path.strip_suffix('/').unwrap_or(path);

    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Returns the extension of the final path segment, including its dot
///
/// Only the last `.` counts: `archive.tar.gz` yields `.gz`. A final segment
/// without a dot (including the empty segment of a directory path) yields
/// the empty string.
pub fn final_extension(path: &str) -> &str {
    let last_segment = path.rsplit('/').next().unwrap_or("");

    match last_segment.rfind('.') {
        Some(idx) => &last_segment[idx..],
        None => "",
    }
}

/// Undoes HTML escaping of `&` inside attribute values
pub fn unescape_amp(raw: &str) -> String {
    raw.replace("&amp;", "&")
}
