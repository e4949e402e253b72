use crate::url::normalize::normalize_parsed;
use url::Url;

/// Kinds of links the crawler follows
///
/// The site publishes no sitemap, so these three href shapes are the only
/// signal for what is worth fetching. Matching is a plain prefix/suffix test
/// on the raw href and will miss pages if the site's layout changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// `/metros/{code}`
    Metro,
    /// `/counties/{fips}`
    County,
    /// `/states/{id}/locations`
    StateLocations,
}

/// Shapes a seed URL may take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeedKind {
    /// The site's home page, which links to every state
    Home,
    /// A state page listing its counties and metros
    StateLocations,
    County,
    Metro,
}

/// Decides which crawlable shape a raw href has, if any
///
/// Rules, first match wins:
/// 1. starts with `/metros/` or `/counties/`
/// 2. starts with `/states/` and ends with `/locations`
///
/// # Examples
///
/// ```
/// use living_wage_crawler::url::{link_kind, LinkKind};
///
/// assert_eq!(link_kind("/counties/48001"), Some(LinkKind::County));
/// assert_eq!(link_kind("/states/48/locations"), Some(LinkKind::StateLocations));
/// assert_eq!(link_kind("/states/48"), None);
/// ```
pub fn link_kind(href: &str) -> Option<LinkKind> {
    if href.starts_with("/metros/") {
        Some(LinkKind::Metro)
    } else if href.starts_with("/counties/") {
        Some(LinkKind::County)
    } else if href.starts_with("/states/") && href.ends_with("/locations") {
        Some(LinkKind::StateLocations)
    } else {
        None
    }
}

/// Classifies an outgoing href and resolves it to an absolute URL
///
/// Returns `None` for anything that is not a state, county or metro link, and
/// for hrefs that cannot be joined onto `base_url`. The result is normalized
/// but NOT deduplicated; the crawl engine's visited set owns that.
///
/// # Examples
///
/// ```
/// use living_wage_crawler::url::classify_link;
/// use url::Url;
///
/// let base = Url::parse("http://livingwage.mit.edu/states/48/locations").unwrap();
/// let url = classify_link("/counties/48001", &base).unwrap();
/// assert_eq!(url.as_str(), "http://livingwage.mit.edu/counties/48001");
///
/// assert!(classify_link("/resources", &base).is_none());
/// ```
pub fn classify_link(href: &str, base_url: &Url) -> Option<Url> {
    link_kind(href)?;

    let joined = base_url.join(href).ok()?;
    normalize_parsed(joined).ok()
}

/// Recognizes the shape of a seed URL
///
/// Used at startup to reject seeds outside the site's known taxonomy before
/// any request is made.
pub fn seed_kind(url: &Url) -> Option<SeedKind> {
    let path = url.path();
    if path == "/" || path.is_empty() {
        return Some(SeedKind::Home);
    }

    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    match segments.as_slice() {
        ["states", id, "locations"] if !id.is_empty() => Some(SeedKind::StateLocations),
        ["counties", code] if !code.is_empty() => Some(SeedKind::County),
        ["metros", code] if !code.is_empty() => Some(SeedKind::Metro),
        _ => None,
    }
}
