//! Domain helpers shared by the registry and output naming

use url::Url;

/// Extracts the lowercase host of a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use scrape_relay::url::extract_domain;
///
/// let url = Url::parse("https://Docs.Example.COM/guide").unwrap();
/// assert_eq!(extract_domain(&url), Some("docs.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks if a domain matches a pattern
///
/// `"example.com"` matches only itself. `"*.example.com"` matches the bare
/// domain and any subdomain at any depth. Both sides are expected lowercase.
///
/// # Examples
///
/// ```
/// use scrape_relay::url::matches_wildcard;
///
/// assert!(matches_wildcard("*.wikipedia.org", "en.wikipedia.org"));
/// assert!(matches_wildcard("*.wikipedia.org", "wikipedia.org"));
/// assert!(!matches_wildcard("*.wikipedia.org", "notwikipedia.org"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => {
            candidate == base
                || candidate
                    .strip_suffix(base)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }
        None => candidate == pattern,
    }
}

/// Turns a URL's host into a filename-safe slug (`en.example.com` -> `en_example_com`)
pub fn domain_slug(url: &Url) -> String {
    extract_domain(url)
        .map(|d| d.replace(['.', ':'], "_"))
        .unwrap_or_else(|| "page".to_string())
}
