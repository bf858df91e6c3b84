//! Selector and text-rule configuration.
//!
//! The ad library markup has no stable hooks: class names are generated at
//! build time. Everything that ties extraction to that markup lives here, as
//! ordered candidate lists that can be overridden from JSON without touching
//! the extractors.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::types::Platform;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sel(pub String);

impl From<&str> for Sel {
    fn from(s: &str) -> Self {
        Sel(s.to_string())
    }
}

/// Where a candidate selector is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Scope {
    #[default]
    Card,
    Document,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopedSel {
    pub sel: Sel,
    #[serde(default)]
    pub scope: Scope,
}

impl ScopedSel {
    fn card(s: &str) -> Self {
        Self { sel: s.into(), scope: Scope::Card }
    }
    fn document(s: &str) -> Self {
        Self { sel: s.into(), scope: Scope::Document }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSelectors {
    pub card: Sel,
    pub identifier: Vec<Sel>,
    pub start_date: Vec<Sel>,
    pub platform_icons: Vec<Sel>,
    pub creative_text: Vec<Sel>,
    pub call_to_action: Vec<Sel>,
    pub destination: Vec<ScopedSel>,
    pub images: Vec<Sel>,
    pub videos: Vec<Sel>,
}

const DEST_ANCHOR_CLASSES: &str =
    "a.x1hl2dhg.x1lku1pv.x8t9es0.x1fvot60.xxio538.xjnfcd9.xq9mrsl.x1yc453h.x1h4wwuj.x1fcty0u.x1lliihq";

impl Default for FieldSelectors {
    fn default() -> Self {
        Self {
            card: "div.xh8yej3".into(),
            identifier: vec![
                "div.xt0e3qv span.x8t9es0.xw23nyj".into(),
                "div.x3nfvp2.x1e56ztr span.x8t9es0.xw23nyj".into(),
                "span.x8t9es0.xw23nyj".into(),
                "span".into(),
                "div".into(),
            ],
            start_date: vec![
                "div.x3nfvp2.x1e56ztr span.x8t9es0.xw23nyj".into(),
                "span.x8t9es0.xw23nyj".into(),
                "span".into(),
            ],
            platform_icons: vec![
                "div.x3nfvp2.x1e56ztr div.xtwfq29".into(),
                "div.xtwfq29".into(),
                "div[style*='mask-position']".into(),
                "div[style*='background-position']".into(),
            ],
            creative_text: vec![
                "div.x6ikm8r.x10wlt62 div._4ik4._4ik5 span".into(),
                "div._4ik4._4ik5".into(),
            ],
            call_to_action: vec![
                "div.x6ikm8r.x10wlt62 a span".into(),
                "a span".into(),
                "a div".into(),
            ],
            destination: vec![
                ScopedSel::card(
                    "div._7jyg._7jyh a[rel='nofollow noreferrer'][target='_blank'][href*='u=']",
                ),
                ScopedSel::card("a[rel='nofollow noreferrer'][target='_blank'][href*='u=']"),
                ScopedSel::document(&format!(
                    "{DEST_ANCHOR_CLASSES}[rel='nofollow noreferrer'][href*='u=']"
                )),
            ],
            images: vec![
                "div.x1ywc1zp.x78zum5.xl56j7k.x1e56ztr.x1277o0a img".into(),
                "img".into(),
            ],
            videos: vec!["video[src], video > source[src], div.x1qjc9v5 video".into()],
        }
    }
}

/// Text predicates used in place of semantic tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextRules {
    pub identifier_labels: Vec<String>,
    pub start_date_marker: String,
    pub date_separator: String,
    pub platforms_label: String,
    pub sponsored_label: String,
    pub cta_phrases: Vec<String>,
    pub cta_max_len: usize,
    pub full_res_marker: String,
}

impl Default for TextRules {
    fn default() -> Self {
        Self {
            identifier_labels: vec!["Library ID".into(), "Ad ID".into()],
            start_date_marker: "Started running on".into(),
            date_separator: "·".into(),
            platforms_label: "Platforms".into(),
            sponsored_label: "Sponsored".into(),
            cta_phrases: [
                "Shop Now",
                "Visit Instagram Profile",
                "Learn More",
                "Sign Up",
                "Book Now",
                "Order Now",
                "Get Offer",
                "Contact Us",
                "Send Message",
                "Apply Now",
                "Subscribe",
                "Download",
                "Install Now",
                "Watch More",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            cta_max_len: 20,
            full_res_marker: "s600x600".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformOffset {
    pub offset: u32,
    pub platform: Platform,
}

/// Sprite offset → platform lookup.
///
/// Tied to the icon sprite the ad library serves. When the sprite changes,
/// read the new `mask-position` offsets off a captured card and update this
/// table (or override it in the JSON config).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformTable {
    pub offsets: Vec<PlatformOffset>,
    pub default: Vec<Platform>,
}

impl Default for PlatformTable {
    fn default() -> Self {
        Self {
            offsets: vec![
                PlatformOffset { offset: 1188, platform: Platform::Facebook },
                PlatformOffset { offset: 1201, platform: Platform::Instagram },
            ],
            default: vec![Platform::Instagram],
        }
    }
}

impl PlatformTable {
    pub fn lookup(&self, offset: u32) -> Platform {
        self.offsets
            .iter()
            .find(|o| o.offset == offset)
            .map(|o| o.platform)
            .unwrap_or(Platform::Unknown)
    }

    /// Default set, never empty.
    pub fn fallback(&self) -> Vec<Platform> {
        if self.default.is_empty() {
            vec![Platform::Instagram]
        } else {
            self.default.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// `0` drops images entirely, embedded-resource substitutes too.
    pub max_images: usize,
    pub max_resource_urls: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_images: 1,
            max_resource_urls: 3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub selectors: FieldSelectors,
    pub rules: TextRules,
    pub platforms: PlatformTable,
    pub limits: Limits,
}

impl ExtractConfig {
    /// Parse a (possibly partial) JSON config; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
