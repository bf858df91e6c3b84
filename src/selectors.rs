//! Shared Selectors

use once_cell::sync::Lazy;
use scraper::Selector;

/// Universal selector, the subject of bare `:contains(...)` queries.
pub static ANY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("*").expect("valid universal selector"));

