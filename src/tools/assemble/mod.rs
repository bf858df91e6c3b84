//! Assemble Tools
//!
//! Turns one archive into ordered ad records: decode, index, locate cards,
//! then run the field extractors card by card.


use tracing::{debug, info_span};

use crate::config::ExtractConfig;
use crate::diagnostics::{Diagnostics, Field, LogLevel, Outcome};
use crate::error::Result;
use crate::tools::archive;
use crate::tools::cards::CardLocator;
use crate::tools::document::DocumentIndex;
use crate::tools::extract::{CardContext, FieldExtractors};
use crate::types::{AdRecord, DecodedDocument, EmbeddedResource, ExtractionReport, RunStatus};

/// Records from one document plus the per-card counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assembly {
    pub records: Vec<AdRecord>,
    pub cards_found: usize,
    pub cards_skipped: usize,
}

#[derive(Debug, Clone)]
pub struct RecordAssembler {
    cards: CardLocator,
    fields: FieldExtractors,
}

impl RecordAssembler {
    pub fn new(config: &ExtractConfig) -> Result<Self> {
        Ok(Self {
            cards: CardLocator::new(&config.selectors.card)?,
            fields: FieldExtractors::new(config)?,
        })
    }

    /// Records in document order. Cards without an identifier are skipped.
    pub fn assemble(
        &self,
        doc: &DocumentIndex,
        resources: &[EmbeddedResource],
        diag: &mut Diagnostics,
    ) -> Assembly {
        let cards = self.cards.locate(doc);
        if cards.is_empty() {
            diag.run(
                LogLevel::Info,
                Field::Cards,
                Outcome::NoCardsFound,
                format!("no element matches `{}`", self.cards.selector()),
            );
            return Assembly::default();
        }
        diag.run(
            LogLevel::Debug,
            Field::Cards,
            Outcome::Found,
            format!("{} card(s)", cards.len()),
        );

        let mut assembly = Assembly {
            cards_found: cards.len(),
            ..Assembly::default()
        };
        for (index, card) in cards.into_iter().enumerate() {
            let ctx = CardContext::new(doc, card, index, resources);
            match self.extract_card(&ctx, diag) {
                Some(record) => assembly.records.push(record),
                None => assembly.cards_skipped += 1,
            }
        }
        assembly
    }

    fn extract_card(&self, ctx: &CardContext<'_>, diag: &mut Diagnostics) -> Option<AdRecord> {
        let Some(identifier) = self.fields.identifier(ctx, diag) else {
            diag.warn(
                ctx.index,
                Field::Identifier,
                Outcome::SkippedCard,
                Some("no identifier label with a numeric id".into()),
            );
            return None;
        };
        Some(AdRecord {
            start_date: self.fields.start_date(ctx, diag),
            platforms: self.fields.platforms(ctx, diag),
            creative_text: self.fields.creative_text(ctx, diag),
            call_to_action: self.fields.call_to_action(ctx, diag),
            destination_url: self.fields.destination_url(ctx, diag),
            media_urls: self.fields.media_urls(ctx, diag),
            identifier,
        })
    }
}

/// Bytes in, report out. Holds no per-run state, so one instance can serve
/// any number of archives from any number of threads.
#[derive(Debug, Clone)]
pub struct Pipeline {
    assembler: RecordAssembler,
}

impl Pipeline {
    pub fn new(config: &ExtractConfig) -> Result<Self> {
        Ok(Self {
            assembler: RecordAssembler::new(config)?,
        })
    }

    /// Never fails: archive problems become the report status.
    pub fn run(&self, raw: &[u8]) -> ExtractionReport {
        let _span = info_span!("archive", bytes = raw.len()).entered();
        let mut diag = Diagnostics::new();
        match archive::decode(raw) {
            Ok(decoded) => self.run_decoded(&decoded, diag),
            Err(e) => {
                diag.run(LogLevel::Error, Field::Archive, Outcome::FormatError, e.to_string());
                ExtractionReport::aborted(RunStatus::FormatError, diag)
            }
        }
    }

    /// Run on an already decoded document.
    pub fn run_decoded(&self, decoded: &DecodedDocument, mut diag: Diagnostics) -> ExtractionReport {
        if decoded.is_empty() {
            diag.run(
                LogLevel::Warn,
                Field::Document,
                Outcome::EmptyDocument,
                "archive has no markup part",
            );
            return ExtractionReport::aborted(RunStatus::EmptyDocument, diag);
        }
        if !decoded.resources.is_empty() {
            debug!(resources = decoded.resources.len(), "embedded resources available");
        }

        let doc = DocumentIndex::parse(&decoded.html);
        let assembly = self.assembler.assemble(&doc, &decoded.resources, &mut diag);
        let status = if assembly.cards_found == 0 {
            RunStatus::NoCardsFound
        } else {
            RunStatus::Completed
        };
        ExtractionReport {
            status,
            records: assembly.records,
            cards_found: assembly.cards_found,
            cards_skipped: assembly.cards_skipped,
            resources: decoded.resources.len(),
            diagnostics: diag,
        }
    }
}
