use crate::{UrlError, UrlResult};
use url::Url;

/// Query parameters that never change page content and are dropped from cache keys
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid", "ref", "source"];

/// Prepends `https://` to inputs that carry no scheme
///
/// Users routinely paste bare hosts (`example.com/page`); those are fetched
/// over HTTPS. Inputs with any other scheme are left alone so that
/// [`normalize_url`] can reject them.
pub fn ensure_scheme(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// Normalizes a URL so that equivalent spellings share one cache key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or not http/https
/// 2. Lowercase the host and remove a `www.` prefix
/// 3. Collapse dot segments and repeated slashes, drop the trailing slash
///    (except for the root `/`)
/// 4. Remove the fragment
/// 5. Remove tracking query parameters, sort the rest, drop an empty query
///
/// The scheme is preserved: `http://` and `https://` pages may differ.
///
/// # Examples
///
/// ```
/// use scrape_relay::url::normalize_url;
///
/// let url = normalize_url("https://WWW.Example.com/docs/?utm_source=x#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/docs");
/// ```
pub fn normalize_url(url_str: &str) -> UrlResult<Url> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let host = url.host_str().ok_or(UrlError::MissingDomain)?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;

    let path = normalize_path(url.path());
    url.set_path(&path);

    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}

/// Removes dot segments, empty segments and the trailing slash
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    format!("/{}", segments.join("/"))
}

/// Filters out tracking parameters and sorts the remaining ones by key, then value
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    params.sort();
    params
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}
