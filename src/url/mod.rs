//! URL handling module
//!
//! This module provides URL normalization and the link classifier that
//! decides which hrefs belong to the site's crawlable taxonomy.

mod classify;
mod normalize;

pub use classify::{classify_link, link_kind, seed_kind, LinkKind, SeedKind};
pub use normalize::{normalize_parsed, normalize_url};
