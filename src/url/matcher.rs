/// Checks whether a path starts with any of the given prefixes
///
/// Prefixes are matched literally; `/api/` matches `/api/signup` but not
/// `/apis`.
///
/// # Examples
///
/// ```
/// use site_mirror::url::matches_any_prefix;
///
/// let prefixes = vec!["/api/".to_string(), "/_frsh/".to_string()];
/// assert!(matches_any_prefix("/api/signup", &prefixes));
/// assert!(!matches_any_prefix("/apis", &prefixes));
/// ```
pub fn matches_any_prefix(path: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
}
