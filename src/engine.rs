use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    config::ExtractConfig,
    diagnostics::Diagnostics,
    error::*,
    tools::{assemble::Pipeline, batch::batch_blocking},
    types::*,
};

/// One archive handed to the engine.
#[derive(Debug, Clone)]
pub struct ArchiveInput {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ArchiveInput {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Ok(Self::new(path.display().to_string(), std::fs::read(path)?))
    }
}

/// What a sink learns about the archive its records came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveMeta {
    pub name: String,
    pub status: RunStatus,
    pub cards_found: usize,
    pub cards_skipped: usize,
    pub resources: usize,
    #[serde(skip)]
    pub diagnostics: Diagnostics,
}

impl ArchiveMeta {
    fn from_report(name: &str, report: &ExtractionReport) -> Self {
        Self {
            name: name.to_string(),
            status: report.status,
            cards_found: report.cards_found,
            cards_skipped: report.cards_skipped,
            resources: report.resources,
            diagnostics: report.diagnostics.clone(),
        }
    }
}

/// Storage or export collaborator. Called once per archive, in input order,
/// including archives that produced no records.
pub trait RecordSink: Send {
    fn accept(&mut self, meta: &ArchiveMeta, records: &[AdRecord]) -> Result<()>;
}

/// Keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub batches: Vec<(ArchiveMeta, Vec<AdRecord>)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> impl Iterator<Item = &AdRecord> {
        self.batches.iter().flat_map(|(_, records)| records.iter())
    }
}

impl RecordSink for MemorySink {
    fn accept(&mut self, meta: &ArchiveMeta, records: &[AdRecord]) -> Result<()> {
        self.batches.push((meta.clone(), records.to_vec()));
        Ok(())
    }
}

#[derive(Serialize)]
struct RecordLine<'a> {
    archive: &'a str,
    #[serde(flatten)]
    record: &'a AdRecord,
}

/// One JSON object per record, tagged with the archive name.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> RecordSink for JsonLinesSink<W> {
    fn accept(&mut self, meta: &ArchiveMeta, records: &[AdRecord]) -> Result<()> {
        for record in records {
            let line = serde_json::to_string(&RecordLine {
                archive: &meta.name,
                record,
            })?;
            writeln!(self.writer, "{line}")?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Archives decoded at once.
    pub concurrency: usize,
    /// Keep rendered diagnostics per archive in the summary.
    pub keep_diagnostics: bool,
}
impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            keep_diagnostics: false,
        }
    }
}

/// Totals for a batch; what a host shows the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub archives: usize,
    pub records_extracted: usize,
    pub cards_skipped: usize,
    /// Archives that decoded fine but held no ad cards.
    pub no_cards: usize,
    pub failed: Vec<(String, RunStatus)>,
    pub sink_errors: Vec<(String, String)>,
    /// Archives whose worker panicked.
    pub crashed: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub diagnostics: Vec<(String, Vec<String>)>,
}

pub struct Engine {
    pipeline: Arc<Pipeline>,
    opts: EngineOptions,
}

impl Engine {
    pub fn new(config: &ExtractConfig, opts: EngineOptions) -> Result<Self> {
        Ok(Self::with_pipeline(Pipeline::new(config)?, opts))
    }

    pub fn with_pipeline(pipeline: Pipeline, opts: EngineOptions) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            opts,
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Run every archive and feed the sink in input order. Never aborts early:
    /// bad archives and sink failures are counted in the summary.
    pub async fn run<S>(&self, inputs: Vec<ArchiveInput>, sink: &mut S) -> BatchSummary
    where
        S: RecordSink + ?Sized,
    {
        let names: Vec<String> = inputs.iter().map(|i| i.name.clone()).collect();
        let pipeline = Arc::clone(&self.pipeline);
        let reports = batch_blocking(inputs, self.opts.concurrency, move |input: ArchiveInput| {
            pipeline.run(&input.bytes)
        })
        .await;

        let mut summary = BatchSummary::default();
        for (name, report) in names.into_iter().zip(reports) {
            summary.archives += 1;
            let report = match report {
                Ok(report) => report,
                Err(e) => {
                    error!(archive = %name, error = %e, "archive worker failed");
                    summary.crashed.push(name);
                    continue;
                }
            };

            summary.records_extracted += report.records_extracted();
            summary.cards_skipped += report.cards_skipped;
            if report.status == RunStatus::NoCardsFound {
                summary.no_cards += 1;
            }
            if report.status.is_failure() {
                warn!(archive = %name, status = ?report.status, "archive yielded no document");
                summary.failed.push((name.clone(), report.status));
            }
            if self.opts.keep_diagnostics {
                summary
                    .diagnostics
                    .push((name.clone(), report.diagnostics.render(false)));
            }

            let meta = ArchiveMeta::from_report(&name, &report);
            if let Err(e) = sink.accept(&meta, &report.records) {
                warn!(archive = %name, error = %e, "sink rejected records");
                summary.sink_errors.push((name, e.to_string()));
            }
        }

        info!(
            archives = summary.archives,
            records = summary.records_extracted,
            skipped = summary.cards_skipped,
            no_cards = summary.no_cards,
            failed = summary.failed.len(),
            "batch finished"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn archive(html: &str) -> Vec<u8> {
        format!(
            "Content-Type: multipart/related; boundary=\"b\"\r\n\r\n\
             --b\r\n\
             Content-Type: text/html\r\n\r\n\
             {html}\r\n\
             --b--\r\n"
        )
        .into_bytes()
    }

    fn inputs() -> Vec<ArchiveInput> {
        vec![
            ArchiveInput::new(
                "two.mhtml",
                archive(
                    r#"<div class="xh8yej3"><span>Library ID: 2</span></div>
                       <div class="xh8yej3"><span>Library ID: 3</span></div>"#,
                ),
            ),
            ArchiveInput::new("broken.mhtml", b"not an archive".to_vec()),
            ArchiveInput::new("one.mhtml", archive(r#"<div class="xh8yej3"><span>Ad ID: 1</span></div>"#)),
        ]
    }

    struct FailingSink;

    impl RecordSink for FailingSink {
        fn accept(&mut self, _meta: &ArchiveMeta, _records: &[AdRecord]) -> Result<()> {
            Err(AdsnapError::Sink("disk full".into()))
        }
    }

    #[tokio::test]
    async fn test_engine_feeds_sink_in_input_order() {
        let engine = Engine::new(&ExtractConfig::default(), EngineOptions::default()).unwrap();
        let mut sink = MemorySink::new();

        let summary = engine.run(inputs(), &mut sink).await;

        assert_eq!(summary.archives, 3);
        assert_eq!(summary.records_extracted, 3);
        assert_eq!(
            summary.failed,
            vec![("broken.mhtml".to_string(), RunStatus::FormatError)]
        );
        let names: Vec<_> = sink.batches.iter().map(|(m, _)| m.name.as_str()).collect();
        assert_eq!(names, vec!["two.mhtml", "broken.mhtml", "one.mhtml"]);
        let ids: Vec<_> = sink.records().map(|r| r.identifier.as_str()).collect();
        assert_eq!(ids, vec!["2", "3", "1"]);
    }

    #[tokio::test]
    async fn test_archives_without_cards_are_counted() {
        let engine = Engine::new(&ExtractConfig::default(), EngineOptions::default()).unwrap();
        let mut sink = MemorySink::new();
        let mut batch = inputs();
        batch.push(ArchiveInput::new("empty-results.mhtml", archive("<h1>No ads match</h1>")));

        let summary = engine.run(batch, &mut sink).await;

        assert_eq!(summary.archives, 4);
        assert_eq!(summary.no_cards, 1);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(sink.batches[3].0.status, RunStatus::NoCardsFound);
    }

    #[tokio::test]
    async fn test_sink_errors_do_not_abort_batch() {
        let engine = Engine::new(&ExtractConfig::default(), EngineOptions::default()).unwrap();
        let summary = engine.run(inputs(), &mut FailingSink).await;

        assert_eq!(summary.archives, 3);
        assert_eq!(summary.sink_errors.len(), 3);
        assert_eq!(summary.records_extracted, 3);
    }

    #[tokio::test]
    async fn test_json_lines_sink_tags_archive() {
        let engine = Engine::new(
            &ExtractConfig::default(),
            EngineOptions {
                concurrency: 1,
                keep_diagnostics: true,
            },
        )
        .unwrap();
        let mut sink = JsonLinesSink::new(Vec::new());

        let summary = engine.run(inputs(), &mut sink).await;

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["archive"], "two.mhtml");
        assert_eq!(lines[0]["identifier"], "2");
        assert_eq!(lines[0]["platforms"], serde_json::json!(["Instagram"]));
        assert_eq!(lines[2]["archive"], "one.mhtml");
        assert_eq!(summary.diagnostics.len(), 3);
    }
}
