//! Extract Tools
//!
//! One strategy per ad field. Each walks an ordered list of candidate
//! selectors inside the card and keeps the first value that passes its text
//! rule. When every candidate fails the field is absent, never an error.

pub mod types;
mod utils;

pub use types::*;
use utils::*;

use chrono::NaiveDate;
use regex::Regex;

use crate::config::{ExtractConfig, Limits, PlatformTable, Scope, Sel};
use crate::diagnostics::{Diagnostics, Field, Outcome};
use crate::error::{AdsnapError, Result};
use crate::tools::clean::{clean_multiline, clean_text, clean_urls, is_valid_url};
use crate::tools::document::{DocumentIndex, Node, Query};
use crate::types::{Platform, UNKNOWN_CTA};

/// Ancestors of the platform label searched for icons before the whole card.
const SECTION_DEPTH: usize = 3;

/// Compiled per-field candidate chains and text rules.
#[derive(Debug, Clone)]
pub struct FieldExtractors {
    identifier: Vec<Query>,
    start_date: Vec<Query>,
    platform_label: Option<Query>,
    platform_icons: Vec<Query>,
    creative_text: Vec<Query>,
    call_to_action: Vec<Query>,
    destination: Vec<(Query, Scope)>,
    images: Vec<Query>,
    videos: Vec<Query>,
    identifier_rule: Regex,
    start_date_rule: Regex,
    sponsored_label: String,
    cta_phrases: Vec<String>,
    cta_max_len: usize,
    full_res_marker: String,
    platforms: PlatformTable,
    limits: Limits,
}

impl FieldExtractors {
    pub fn new(config: &ExtractConfig) -> Result<Self> {
        let sel = &config.selectors;
        let rules = &config.rules;

        // Card-scoped destination candidates always run before document-scoped ones.
        let mut destination = Vec::new();
        for scope in [Scope::Card, Scope::Document] {
            for candidate in sel.destination.iter().filter(|d| d.scope == scope) {
                destination.push((Query::parse(&candidate.sel.0)?, scope));
            }
        }

        let label = rules.platforms_label.trim();
        let platform_label = if label.is_empty() {
            None
        } else if label.contains(['"', ')']) {
            return Err(AdsnapError::invalid_rule(
                "platforms_label",
                "label may not contain '\"' or ')'",
            ));
        } else {
            Some(Query::parse(&format!(":contains(\"{label}\")"))?)
        };

        Ok(Self {
            identifier: compile(&sel.identifier)?,
            start_date: compile(&sel.start_date)?,
            platform_label,
            platform_icons: compile(&sel.platform_icons)?,
            creative_text: compile(&sel.creative_text)?,
            call_to_action: compile(&sel.call_to_action)?,
            destination,
            images: compile(&sel.images)?,
            videos: compile(&sel.videos)?,
            identifier_rule: identifier_regex(&rules.identifier_labels)?,
            start_date_rule: start_date_regex(&rules.start_date_marker, &rules.date_separator)?,
            sponsored_label: rules.sponsored_label.trim().to_string(),
            cta_phrases: rules.cta_phrases.clone(),
            cta_max_len: rules.cta_max_len,
            full_res_marker: rules.full_res_marker.trim().to_string(),
            platforms: config.platforms.clone(),
            limits: config.limits,
        })
    }

    /// Numeric token after an identifier label. The only mandatory field.
    pub fn identifier(&self, ctx: &CardContext<'_>, diag: &mut Diagnostics) -> Option<String> {
        let hit = first_hit(ctx, &self.identifier, |node| {
            let text = clean_text(&DocumentIndex::text(node));
            self.identifier_rule
                .captures(&text)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        })?;
        note_hit(diag, ctx.index, Field::Identifier, &self.identifier, hit.rank);
        Some(hit.value)
    }

    pub fn start_date(&self, ctx: &CardContext<'_>, diag: &mut Diagnostics) -> Option<NaiveDate> {
        let mut unparsed: Option<String> = None;
        let hit = first_hit(ctx, &self.start_date, |node| {
            let text = clean_text(&DocumentIndex::text(node));
            let phrase = self.start_date_rule.captures(&text)?.get(1)?.as_str().trim().to_string();
            let date = parse_date(&phrase);
            if date.is_none() {
                unparsed.get_or_insert(phrase);
            }
            date
        });
        match hit {
            Some(hit) => {
                note_hit(diag, ctx.index, Field::StartDate, &self.start_date, hit.rank);
                Some(hit.value)
            }
            None => {
                match unparsed {
                    Some(phrase) => {
                        diag.debug(ctx.index, Field::StartDate, Outcome::Unparseable, Some(phrase))
                    }
                    None => diag.debug(ctx.index, Field::StartDate, Outcome::FieldAbsent, None),
                }
                None
            }
        }
    }

    /// Platforms from sprite icons; the configured default set when none resolve.
    pub fn platforms(&self, ctx: &CardContext<'_>, diag: &mut Diagnostics) -> Vec<Platform> {
        let mut platforms: Vec<Platform> = Vec::new();
        for offset in self.icon_offsets(ctx, diag) {
            let platform = self.platforms.lookup(offset);
            if platform == Platform::Unknown {
                diag.debug(
                    ctx.index,
                    Field::Platforms,
                    Outcome::Ambiguous,
                    Some(format!("unmapped sprite offset {offset}")),
                );
            }
            if !platforms.contains(&platform) {
                platforms.push(platform);
            }
        }
        if platforms.is_empty() {
            let fallback = self.platforms.fallback();
            diag.debug(
                ctx.index,
                Field::Platforms,
                Outcome::Defaulted,
                Some(format!("no icon resolved, using {fallback:?}")),
            );
            return fallback;
        }
        platforms
    }

    /// Sprite offsets of the icons in the platform section, else anywhere in the card.
    ///
    /// A card without the platform label has no icons to read.
    fn icon_offsets(&self, ctx: &CardContext<'_>, diag: &mut Diagnostics) -> Vec<u32> {
        let Some(mut regions) = self.platform_section(ctx) else {
            return Vec::new();
        };
        let in_section = regions.len();
        regions.push(ctx.card);

        for (depth, region) in regions.into_iter().enumerate() {
            for (rank, query) in self.platform_icons.iter().enumerate() {
                let offsets: Vec<u32> = ctx
                    .doc
                    .query_within(region, query)
                    .into_iter()
                    .filter_map(|icon| DocumentIndex::attr(icon, "style"))
                    .filter_map(sprite_offset)
                    .collect();
                if offsets.is_empty() {
                    continue;
                }
                if depth < in_section && rank == 0 {
                    diag.debug(ctx.index, Field::Platforms, Outcome::Found, None);
                } else {
                    let place = if depth < in_section { "platform section" } else { "card" };
                    diag.debug(
                        ctx.index,
                        Field::Platforms,
                        Outcome::Fallback,
                        Some(format!("candidate #{} `{}` in {place}", rank + 1, query.as_str())),
                    );
                }
                return offsets;
            }
        }
        Vec::new()
    }

    /// Ancestors of the platform label, innermost first, stopping below the card.
    /// `None` when the card carries no label.
    fn platform_section<'a>(&self, ctx: &CardContext<'a>) -> Option<Vec<Node<'a>>> {
        // No configured label: the whole card is the section.
        let Some(label_query) = &self.platform_label else {
            return Some(Vec::new());
        };
        let matches = ctx.doc.query_within(ctx.card, label_query);
        let mut label = matches.first().copied()?;
        // Descend to the innermost element still holding the label text.
        while let Some(child) = matches
            .iter()
            .copied()
            .find(|m| m.parent().map(|p| p.id()) == Some(label.id()))
        {
            label = child;
        }
        let section = label
            .ancestors()
            .filter_map(Node::wrap)
            .take_while(|a| a.id() != ctx.card.id())
            .take(SECTION_DEPTH)
            .collect();
        Some(section)
    }

    /// Body copy, skipping the "Sponsored" label.
    pub fn creative_text(&self, ctx: &CardContext<'_>, diag: &mut Diagnostics) -> Option<String> {
        let hit = first_hit(ctx, &self.creative_text, |node| {
            let text = clean_multiline(&DocumentIndex::text(node));
            let sponsored = !self.sponsored_label.is_empty()
                && text.eq_ignore_ascii_case(&self.sponsored_label);
            (!text.is_empty() && !sponsored).then_some(text)
        });
        match hit {
            Some(hit) => {
                note_hit(diag, ctx.index, Field::CreativeText, &self.creative_text, hit.rank);
                Some(hit.value)
            }
            None => {
                diag.debug(ctx.index, Field::CreativeText, Outcome::FieldAbsent, None);
                None
            }
        }
    }

    /// Button text containing a known phrase. Overlong text is kept as [`UNKNOWN_CTA`].
    pub fn call_to_action(&self, ctx: &CardContext<'_>, diag: &mut Diagnostics) -> Option<String> {
        let hit = first_hit(ctx, &self.call_to_action, |node| {
            let text = clean_text(&DocumentIndex::text(node));
            let phrase = find_phrase(&text, &self.cta_phrases)?;
            Some((text, phrase))
        });
        let Some(hit) = hit else {
            diag.debug(ctx.index, Field::CallToAction, Outcome::FieldAbsent, None);
            return None;
        };
        let (text, phrase) = hit.value;
        if text.chars().count() <= self.cta_max_len || text.eq_ignore_ascii_case(phrase) {
            note_hit(diag, ctx.index, Field::CallToAction, &self.call_to_action, hit.rank);
            return Some(text);
        }
        diag.debug(
            ctx.index,
            Field::CallToAction,
            Outcome::Ambiguous,
            Some(format!("{text:?} exceeds {} chars", self.cta_max_len)),
        );
        Some(UNKNOWN_CTA.to_string())
    }

    /// Target of the first redirect anchor that decodes to a valid URL.
    pub fn destination_url(&self, ctx: &CardContext<'_>, diag: &mut Diagnostics) -> Option<String> {
        for (rank, (query, scope)) in self.destination.iter().enumerate() {
            let anchors = match scope {
                Scope::Card => ctx.doc.query_within(ctx.card, query),
                Scope::Document => ctx.doc.query(query),
            };
            for anchor in anchors {
                let Some(candidate) = DocumentIndex::attr(anchor, "href").and_then(unwrap_redirect)
                else {
                    continue;
                };
                if is_valid_url(&candidate) {
                    note_hit_by(diag, ctx.index, Field::DestinationUrl, query, rank);
                    return Some(candidate);
                }
                diag.debug(ctx.index, Field::DestinationUrl, Outcome::InvalidUrl, Some(candidate));
            }
        }
        diag.warn(
            ctx.index,
            Field::DestinationUrl,
            Outcome::FieldAbsent,
            Some("no anchor resolved to a valid URL".into()),
        );
        None
    }

    /// Images (or embedded resources when the card has none), then videos.
    ///
    /// `max_images = 0` turns images off, resource substitutes included.
    pub fn media_urls(&self, ctx: &CardContext<'_>, diag: &mut Diagnostics) -> Vec<String> {
        let mut media = self.images(ctx, diag);
        if media.is_empty() && self.limits.max_images > 0 {
            let locators: Vec<String> = ctx.resources.iter().map(|r| r.url.clone()).collect();
            media = clean_urls(&locators)
                .into_iter()
                .take(self.limits.max_resource_urls)
                .collect();
            if media.is_empty() {
                diag.debug(ctx.index, Field::Images, Outcome::FieldAbsent, None);
            } else {
                diag.debug(
                    ctx.index,
                    Field::Resources,
                    Outcome::Fallback,
                    Some(format!("{} embedded resource url(s)", media.len())),
                );
            }
        }
        for video in self.videos(ctx, diag) {
            push_unique(&mut media, video);
        }
        media
    }

    fn images(&self, ctx: &CardContext<'_>, diag: &mut Diagnostics) -> Vec<String> {
        if self.limits.max_images == 0 {
            return Vec::new();
        }
        for (rank, query) in self.images.iter().enumerate() {
            let mut found: Vec<String> = Vec::new();
            for img in ctx.doc.query_within(ctx.card, query) {
                let Some(src) = DocumentIndex::attr(img, "src").map(str::trim) else {
                    continue;
                };
                if !src.contains(self.full_res_marker.as_str()) {
                    continue;
                }
                if !is_valid_url(src) {
                    diag.debug(ctx.index, Field::Images, Outcome::InvalidUrl, Some(src.to_string()));
                    continue;
                }
                push_unique(&mut found, src.to_string());
                if found.len() >= self.limits.max_images {
                    break;
                }
            }
            if !found.is_empty() {
                note_hit(diag, ctx.index, Field::Images, &self.images, rank);
                return found;
            }
        }
        Vec::new()
    }

    fn videos(&self, ctx: &CardContext<'_>, diag: &mut Diagnostics) -> Vec<String> {
        for (rank, query) in self.videos.iter().enumerate() {
            let mut found: Vec<String> = Vec::new();
            for node in ctx.doc.query_within(ctx.card, query) {
                let Some(src) = DocumentIndex::attr(node, "src").map(str::trim) else {
                    continue;
                };
                if is_valid_url(src) {
                    push_unique(&mut found, src.to_string());
                } else {
                    diag.debug(ctx.index, Field::Videos, Outcome::InvalidUrl, Some(src.to_string()));
                }
            }
            if !found.is_empty() {
                note_hit(diag, ctx.index, Field::Videos, &self.videos, rank);
                return found;
            }
        }
        Vec::new()
    }
}

fn compile(selectors: &[Sel]) -> Result<Vec<Query>> {
    Query::parse_all(selectors.iter().map(|s| s.0.as_str()))
}

/// Try candidates in order, nodes in document order; first parsed value wins.
fn first_hit<'a, T>(
    ctx: &CardContext<'a>,
    candidates: &[Query],
    mut parse: impl FnMut(Node<'a>) -> Option<T>,
) -> Option<Hit<T>> {
    for (rank, query) in candidates.iter().enumerate() {
        let value = ctx
            .doc
            .query_within(ctx.card, query)
            .into_iter()
            .find_map(&mut parse);
        if let Some(value) = value {
            return Some(Hit { value, rank });
        }
    }
    None
}

fn note_hit(diag: &mut Diagnostics, card: usize, field: Field, candidates: &[Query], rank: usize) {
    note_hit_by(diag, card, field, &candidates[rank], rank);
}

fn note_hit_by(diag: &mut Diagnostics, card: usize, field: Field, query: &Query, rank: usize) {
    if rank == 0 {
        diag.debug(card, field, Outcome::Found, None);
    } else {
        diag.debug(
            card,
            field,
            Outcome::Fallback,
            Some(format!("candidate #{} `{}`", rank + 1, query.as_str())),
        );
    }
}
