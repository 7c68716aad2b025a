//! Async report generation around the engine
//!
//! The service owns the two external collaborators: a [`CaptureDecoder`]
//! that extracts images and metadata from uploaded capture files, and a
//! [`ReportRenderer`] that writes the final document. Decoding runs
//! concurrently; a failed decode only degrades that one capture.

use async_trait::async_trait;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thermoscan_core::{Error, Result, ThermalMetadata};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::engine::{CaptureSubmission, ReportBatch, ReportEngine, ReportRequest};

/// An uploaded capture file with the operator's inputs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureUpload {
    /// Name the file was uploaded under
    pub filename: String,

    /// Where the uploaded bytes are stored
    pub path: PathBuf,

    pub remark: String,
    pub conclusion: String,
    pub recommendation: String,
    pub forced_category: Option<String>,
}

impl CaptureUpload {
    pub fn new(filename: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = remark.into();
        self
    }

    pub fn with_conclusion(mut self, conclusion: impl Into<String>) -> Self {
        self.conclusion = conclusion.into();
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = recommendation.into();
        self
    }

    pub fn with_forced_category(mut self, category: impl Into<String>) -> Self {
        self.forced_category = Some(category.into());
        self
    }
}

/// What the decoder extracts from one capture file
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedCapture {
    pub metadata: ThermalMetadata,

    /// False-color thermal image
    pub thermal_image_path: PathBuf,

    /// Visible-light image, when the capture has one
    pub real_image_path: Option<PathBuf>,
}

/// Extracts images and metadata from a capture file
#[async_trait]
pub trait CaptureDecoder: Send + Sync {
    /// Decode one upload, writing extracted images under `work_dir`
    async fn decode(&self, upload: &CaptureUpload, work_dir: &Path) -> Result<DecodedCapture>;
}

/// Produces the report document from an ordered batch
#[async_trait]
pub trait ReportRenderer: Send + Sync {
    /// Render the batch to `output`
    async fn render(&self, batch: &ReportBatch, output: &Path) -> Result<()>;
}

/// A rendered report
#[derive(Debug, Clone)]
pub struct ReportArtifact {
    /// `Report_<unix-millis>.pdf`
    pub report_name: String,
    pub report_path: PathBuf,

    /// Audit trail written next to the report, when auditing is enabled
    pub audit_path: Option<PathBuf>,

    pub batch: ReportBatch,
}

/// Decodes, annotates, orders, and renders report batches
pub struct ReportService {
    engine: Arc<ReportEngine>,
    decoder: Arc<dyn CaptureDecoder>,
    renderer: Arc<dyn ReportRenderer>,
    output_dir: PathBuf,
    max_concurrent_decodes: usize,
}

impl ReportService {
    pub fn new(
        engine: Arc<ReportEngine>,
        decoder: Arc<dyn CaptureDecoder>,
        renderer: Arc<dyn ReportRenderer>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            engine,
            decoder,
            renderer,
            output_dir: output_dir.into(),
            max_concurrent_decodes: 8,
        }
    }

    /// Service configured from an [`EngineConfig`]
    pub fn from_config(
        config: &EngineConfig,
        engine: Arc<ReportEngine>,
        decoder: Arc<dyn CaptureDecoder>,
        renderer: Arc<dyn ReportRenderer>,
    ) -> Self {
        Self::new(engine, decoder, renderer, config.report.output_dir.clone())
            .with_max_concurrent_decodes(config.report.max_concurrent_decodes)
    }

    pub fn with_max_concurrent_decodes(mut self, limit: usize) -> Self {
        self.max_concurrent_decodes = limit.max(1);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Generate one report from a set of uploads.
    ///
    /// Returns [`Error::EmptyBatch`] without touching the collaborators when
    /// `uploads` is empty. Decode failures never abort the batch; a renderer
    /// failure does.
    pub async fn generate(
        &self,
        title: Option<String>,
        forced_category: Option<String>,
        uploads: Vec<CaptureUpload>,
    ) -> Result<ReportArtifact> {
        if uploads.is_empty() {
            return Err(Error::EmptyBatch);
        }

        debug!(
            uploads = uploads.len(),
            output_dir = %self.output_dir.display(),
            "Generating report"
        );
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let captures = self.decode_all(uploads).await;

        let engine = self.engine.clone();
        let request = ReportRequest {
            title,
            forced_category,
            captures,
        };
        let batch = tokio::task::spawn_blocking(move || engine.process(request))
            .await
            .map_err(|e| Error::internal(format!("annotation task failed: {}", e)))?;

        let stamp = batch.generated_at.timestamp_millis();
        let report_name = format!("Report_{}.pdf", stamp);
        let report_path = self.output_dir.join(&report_name);

        self.renderer.render(&batch, &report_path).await?;

        let audit_path = match batch.audit.clone() {
            Some(trail) => {
                let path = self.output_dir.join(format!("Report_{}.audit.jsonl", stamp));
                let target = path.clone();
                tokio::task::spawn_blocking(move || trail.write_jsonl(target))
                    .await
                    .map_err(|e| Error::internal(format!("audit write task failed: {}", e)))??;
                Some(path)
            }
            None => None,
        };

        info!(
            report = %report_path.display(),
            records = batch.records.len(),
            failures = batch.failures.len(),
            "Report generated"
        );

        Ok(ReportArtifact {
            report_name,
            report_path,
            audit_path,
            batch,
        })
    }

    /// Decode uploads in groups of at most `max_concurrent_decodes`, keeping
    /// upload order
    async fn decode_all(&self, uploads: Vec<CaptureUpload>) -> Vec<CaptureSubmission> {
        let work_dir = self.output_dir.as_path();
        let mut submissions = Vec::with_capacity(uploads.len());

        for group in uploads.chunks(self.max_concurrent_decodes) {
            let futures = group
                .iter()
                .map(|upload| self.decoder.decode(upload, work_dir));
            let results = join_all(futures).await;

            submissions.extend(
                group
                    .iter()
                    .cloned()
                    .zip(results)
                    .map(|(upload, result)| into_submission(upload, result)),
            );
        }

        submissions
    }
}

fn into_submission(upload: CaptureUpload, decoded: Result<DecodedCapture>) -> CaptureSubmission {
    let CaptureUpload {
        filename,
        remark,
        conclusion,
        recommendation,
        forced_category,
        ..
    } = upload;

    let submission = CaptureSubmission {
        filename,
        remark,
        conclusion,
        recommendation,
        forced_category,
        ..Default::default()
    };

    match decoded {
        Ok(capture) => submission
            .with_metadata(capture.metadata)
            .with_images(capture.thermal_image_path, capture.real_image_path),
        Err(err) => {
            let message = match err {
                Error::Decode { message, .. } => message,
                other => other.to_string(),
            };
            warn!(filename = %submission.filename, error = %message, "Decoder failed");
            submission.with_decode_error(message)
        }
    }
}
