//! Per-run extraction notes.
//!
//! Every note is also emitted as a `tracing` event; the collected list is
//! handed back with the report so a host can show why a card lost a field.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Field {
    Archive,
    Document,
    Cards,
    Identifier,
    StartDate,
    Platforms,
    CreativeText,
    CallToAction,
    DestinationUrl,
    Images,
    Videos,
    Resources,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    FormatError,
    EmptyDocument,
    NoCardsFound,
    Found,
    /// Found, but not by the first candidate.
    Fallback,
    FieldAbsent,
    Defaulted,
    InvalidUrl,
    Unparseable,
    Ambiguous,
    SkippedCard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticEntry {
    pub card_index: Option<usize>,
    pub field: Field,
    pub outcome: Outcome,
    pub level: LogLevel,
    pub details: Option<String>,
}

impl fmt::Display for DiagnosticEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO ",
            LogLevel::Warn => "WARN ",
            LogLevel::Error => "ERROR",
        };
        let card = self
            .card_index
            .map(|i| format!("card#{i:02}"))
            .unwrap_or_else(|| "*".to_string());
        write!(f, "{} {} {:?} {:?}", level, card, self.field, self.outcome)?;
        if let Some(details) = &self.details {
            write!(f, " {details}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    entries: Vec<DiagnosticEntry>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(
        &mut self,
        level: LogLevel,
        card_index: Option<usize>,
        field: Field,
        outcome: Outcome,
        details: Option<String>,
    ) {
        let entry = DiagnosticEntry {
            card_index,
            field,
            outcome,
            level,
            details,
        };
        emit(&entry);
        self.entries.push(entry);
    }

    pub fn debug(&mut self, card: usize, field: Field, outcome: Outcome, details: Option<String>) {
        self.log(LogLevel::Debug, Some(card), field, outcome, details);
    }

    pub fn warn(&mut self, card: usize, field: Field, outcome: Outcome, details: Option<String>) {
        self.log(LogLevel::Warn, Some(card), field, outcome, details);
    }

    /// Document-level note, not tied to a card.
    pub fn run(&mut self, level: LogLevel, field: Field, outcome: Outcome, details: impl Into<String>) {
        self.log(level, None, field, outcome, Some(details.into()));
    }

    pub fn entries(&self) -> &[DiagnosticEntry] {
        &self.entries
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.entries.iter().filter(|e| e.outcome == outcome).count()
    }

    pub fn for_card(&self, card: usize) -> impl Iterator<Item = &DiagnosticEntry> {
        self.entries
            .iter()
            .filter(move |e| e.card_index == Some(card))
    }

    /// Text lines, optionally filtered to warnings and above.
    pub fn render(&self, problems_only: bool) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| !problems_only || e.level >= LogLevel::Warn)
            .map(|e| e.to_string())
            .collect()
    }
}

fn emit(entry: &DiagnosticEntry) {
    let card = entry.card_index;
    let field = entry.field;
    let outcome = entry.outcome;
    let details = entry.details.as_deref().unwrap_or("");
    match entry.level {
        LogLevel::Debug => tracing::debug!(card = ?card, field = ?field, outcome = ?outcome, "{details}"),
        LogLevel::Info => tracing::info!(card = ?card, field = ?field, outcome = ?outcome, "{details}"),
        LogLevel::Warn => tracing::warn!(card = ?card, field = ?field, outcome = ?outcome, "{details}"),
        LogLevel::Error => tracing::error!(card = ?card, field = ?field, outcome = ?outcome, "{details}"),
    }
}
