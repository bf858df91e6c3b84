//! Document Tools
//!
//! A thin index over `scraper::Html`: CSS queries at document scope or scoped
//! to one card, plus the `:contains("text")` predicate the ad markup needs in
//! place of semantic hooks. `:contains` is only allowed on the subject (last)
//! compound of a selector, e.g. `div.x1 span:contains("Library ID")`.


use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

use crate::error::{AdsnapError, Result};
use crate::selectors::ANY_SELECTOR;

/// Handle to an element inside a [`DocumentIndex`].
pub type Node<'a> = ElementRef<'a>;

const CONTAINS: &str = ":contains(";

#[derive(Debug, Clone)]
struct Alternative {
    selector: Selector,
    contains: Vec<String>,
}

impl Alternative {
    fn text_matches(&self, node: &Node<'_>) -> bool {
        if self.contains.is_empty() {
            return true;
        }
        let text = node.text().collect::<String>();
        self.contains.iter().all(|needle| text.contains(needle.as_str()))
    }

    fn select<'a>(&self, scope: Node<'a>, include_scope: bool) -> Vec<Node<'a>> {
        let mut out = Vec::new();
        if include_scope && self.selector.matches(&scope) && self.text_matches(&scope) {
            out.push(scope);
        }
        out.extend(scope.select(&self.selector).filter(|n| self.text_matches(n)));
        out
    }
}

/// A compiled selector (comma-separated alternatives allowed).
#[derive(Debug, Clone)]
pub struct Query {
    source: String,
    alternatives: Vec<Alternative>,
}

impl Query {
    pub fn parse(source: &str) -> Result<Self> {
        let mut alternatives = Vec::new();
        for part in split_top_level(source) {
            let part = part.trim();
            if part.is_empty() {
                return Err(AdsnapError::invalid_selector(source, "empty selector"));
            }
            let (base, contains) =
                strip_contains(part).map_err(|reason| AdsnapError::invalid_selector(source, reason))?;
            let selector = if base.is_empty() {
                ANY_SELECTOR.clone()
            } else {
                Selector::parse(&base)
                    .map_err(|e| AdsnapError::invalid_selector(source, e.to_string()))?
            };
            alternatives.push(Alternative { selector, contains });
        }
        Ok(Self {
            source: source.to_string(),
            alternatives,
        })
    }

    pub fn parse_all<'s, I>(sources: I) -> Result<Vec<Self>>
    where
        I: IntoIterator<Item = &'s str>,
    {
        sources.into_iter().map(Self::parse).collect()
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    fn select<'a>(&self, scope: Node<'a>, include_scope: bool) -> Vec<Node<'a>> {
        if let [only] = self.alternatives.as_slice() {
            return only.select(scope, include_scope);
        }
        // Merge alternatives back into document order.
        let hits: HashSet<_> = self
            .alternatives
            .iter()
            .flat_map(|alt| alt.select(scope, include_scope))
            .map(|n| n.id())
            .collect();
        scope
            .descendants()
            .filter_map(ElementRef::wrap)
            .skip(usize::from(!include_scope))
            .filter(|n| hits.contains(&n.id()))
            .collect()
    }
}

/// Parsed markup of one archive. Immutable once built.
pub struct DocumentIndex {
    html: Html,
}

impl DocumentIndex {
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    pub fn root(&self) -> Node<'_> {
        self.html.root_element()
    }

    pub fn query(&self, query: &Query) -> Vec<Node<'_>> {
        query.select(self.root(), true)
    }

    /// Descendants of `node` (not `node` itself) matching `query`.
    pub fn query_within<'a>(&'a self, node: Node<'a>, query: &Query) -> Vec<Node<'a>> {
        query.select(node, false)
    }

    pub fn text(node: Node<'_>) -> String {
        node.text().collect::<String>()
    }

    pub fn attr<'a>(node: Node<'a>, name: &str) -> Option<&'a str> {
        node.value().attr(name)
    }
}

/// Split on commas that are not inside quotes, brackets or parentheses.
fn split_top_level(source: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in source.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[' | '(') => depth += 1,
            (None, ']' | ')') => depth -= 1,
            (None, ',') if depth == 0 => {
                parts.push(&source[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&source[start..]);
    parts
}

/// True if `s` has a combinator outside quotes, brackets or parentheses.
fn has_combinator(s: &str) -> bool {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    for c in s.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[' | '(') => depth += 1,
            (None, ']' | ')') => depth -= 1,
            (None, c) if depth == 0 && (c.is_whitespace() || matches!(c, '>' | '+' | '~')) => {
                return true
            }
            _ => {}
        }
    }
    false
}

/// Pull `:contains(...)` predicates out of one selector alternative.
fn strip_contains(part: &str) -> std::result::Result<(String, Vec<String>), String> {
    let mut base = String::new();
    let mut needles = Vec::new();
    let mut rest = part;

    while let Some(pos) = rest.find(CONTAINS) {
        base.push_str(&rest[..pos]);
        let after = &rest[pos + CONTAINS.len()..];
        let (needle, consumed) = match after.chars().next() {
            Some(q @ ('"' | '\'')) => {
                let end = after[1..]
                    .find(q)
                    .ok_or("unterminated string in :contains()")?
                    + 1;
                let tail = after[end + 1..].trim_start();
                if !tail.starts_with(')') {
                    return Err("expected ')' after :contains() argument".into());
                }
                (&after[1..end], after.len() - tail.len() + 1)
            }
            _ => {
                let end = after.find(')').ok_or("unclosed :contains(")?;
                (after[..end].trim(), end + 1)
            }
        };
        if needle.is_empty() {
            return Err("empty :contains() argument".into());
        }
        needles.push(needle.to_string());
        rest = &after[consumed..];
        if has_combinator(rest) {
            return Err(":contains() is only supported on the last compound selector".into());
        }
    }
    base.push_str(rest);

    let trimmed = base.trim();
    let base = if !needles.is_empty()
        && (trimmed.is_empty() || base.ends_with(char::is_whitespace) || trimmed.ends_with(['>', '+', '~']))
    {
        // `div > :contains("x")` style: make the subject explicit.
        format!("{} *", trimmed).trim().to_string()
    } else {
        trimmed.to_string()
    };
    let base = if base == "*" { String::new() } else { base };
    Ok((base, needles))
}
