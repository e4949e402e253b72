use crate::{UrlError, UrlResult};
use url::Url;

/// Normalizes a URL so each page has exactly one spelling in the visited set
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject anything that is not HTTP or HTTPS
/// 3. Lowercase the host
/// 4. Normalize path:
///    - Remove dot segments (. and ..) and empty segments
///    - Remove trailing slash (except for root /)
///    - Empty path becomes /
/// 5. Remove fragment (everything after #)
/// 6. Sort query parameters; drop an empty query string
///
/// The scheme is kept as-is: the site answers on plain HTTP.
///
/// # Examples
///
/// ```
/// use living_wage_crawler::url::normalize_url;
///
/// let url = normalize_url("http://LIVINGWAGE.MIT.EDU/counties/48001/#top").unwrap();
/// assert_eq!(url.as_str(), "http://livingwage.mit.edu/counties/48001");
/// ```
pub fn normalize_url(url_str: &str) -> UrlResult<Url> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_in_place(&mut url)?;
    Ok(url)
}

/// Normalizes an already-parsed URL
pub fn normalize_parsed(mut url: Url) -> UrlResult<Url> {
    normalize_in_place(&mut url)?;
    Ok(url)
}

fn normalize_in_place(url: &mut Url) -> UrlResult<()> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let host = url.host_str().ok_or(UrlError::MissingHost)?.to_lowercase();
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Parse(format!("Failed to set host: {}", e)))?;

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if url.query().is_some() {
        let params = sorted_query_params(url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            // Re-encode so escaped delimiters inside values survive
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(())
}

/// Normalizes a URL path by removing dot segments and trailing slashes
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

fn sorted_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    params.sort();
    params
}
