use crate::core::sequence::SequenceRunner;
use crate::core::{ConfigProvider, Pipeline, SourceKind, Storage};
use crate::domain::model::{DqmStore, HarvestResult, InstanceReport, SpecOutcome};
use crate::domain::spec::HarvestSequence;
use crate::utils::error::{DqmError, Result};
use reqwest::Client;
use std::io::Write;
use std::time::Duration;
use zip::write::{FileOptions, ZipWriter};

/// Filename of the per-plot efficiency summary written next to the store.
pub const SUMMARY_FILENAME: &str = "harvest_summary.csv";

pub struct HarvestPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    sequence: HarvestSequence,
    client: Client,
    monitor_enabled: bool,
}

impl<S: Storage, C: ConfigProvider> HarvestPipeline<S, C> {
    pub fn new(storage: S, config: C, sequence: HarvestSequence) -> Self {
        Self {
            storage,
            config,
            sequence,
            client: Client::new(),
            monitor_enabled: false,
        }
    }

    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.monitor_enabled = enabled;
        self
    }

    /// 將每個 instance 的收割結果整理成摘要 CSV
    fn render_summary(reports: &[InstanceReport]) -> Result<String> {
        let summary_error = |details: String| DqmError::ProcessingError {
            stage: "summary".to_string(),
            details,
        };

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["instance", "plot", "outcome", "efficiency", "detail"])?;

        for report in reports {
            for outcome in &report.outcomes {
                match outcome {
                    SpecOutcome::Published { plot, efficiency } => {
                        let eff = efficiency
                            .map(|e| format!("{:.6}", e))
                            .unwrap_or_default();
                        writer.write_record([
                            report.instance.as_str(),
                            plot.as_str(),
                            "published",
                            eff.as_str(),
                            "",
                        ])?;
                    }
                    SpecOutcome::Skipped { plot, reason } => {
                        let detail = reason.to_string();
                        writer.write_record([
                            report.instance.as_str(),
                            plot.as_str(),
                            "skipped",
                            "",
                            detail.as_str(),
                        ])?;
                    }
                }
            }
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| summary_error(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| summary_error(e.to_string()))
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for HarvestPipeline<S, C> {
    async fn extract(&self) -> Result<DqmStore> {
        let bytes = match self.config.source_kind() {
            SourceKind::Http => {
                tracing::debug!("Fetching DQM store from: {}", self.config.input_source());
                let response = self
                    .client
                    .get(self.config.input_source())
                    .timeout(Duration::from_secs(self.config.timeout_seconds()))
                    .send()
                    .await?;

                tracing::debug!("Source response status: {}", response.status());
                if !response.status().is_success() {
                    return Err(DqmError::ProcessingError {
                        stage: "extract".to_string(),
                        details: format!(
                            "store source '{}' returned HTTP {}",
                            self.config.input_source(),
                            response.status()
                        ),
                    });
                }
                response.bytes().await?.to_vec()
            }
            SourceKind::File => {
                tracing::debug!("Reading DQM store from: {}", self.config.input_source());
                self.storage.read_file(self.config.input_source()).await?
            }
        };

        let store = DqmStore::from_json(&bytes)?;
        tracing::debug!(
            "Loaded {} histograms from {} directories",
            store.len(),
            store.directories().count()
        );
        Ok(store)
    }

    async fn transform(&self, store: DqmStore) -> Result<HarvestResult> {
        let mut store = store;
        let execution_id = format!(
            "harvest-{}",
            chrono::Utc::now().format("%Y%m%dT%H%M%S%.3fZ")
        );

        let runner = SequenceRunner::new(execution_id).with_monitoring(self.monitor_enabled);
        let reports = runner.execute_all(&self.sequence, &mut store)?;
        let summary_csv = Self::render_summary(&reports)?;

        Ok(HarvestResult {
            store,
            reports,
            summary_csv,
        })
    }

    async fn load(&self, result: HarvestResult) -> Result<String> {
        let store_json = result.store.to_json_pretty()?;

        tracing::debug!(
            "Writing harvested store ({} bytes) to storage",
            store_json.len()
        );
        self.storage
            .write_file(self.config.store_filename(), &store_json)
            .await?;

        if self.config.summary_csv() {
            self.storage
                .write_file(SUMMARY_FILENAME, result.summary_csv.as_bytes())
                .await?;
        }

        if let Some(bundle) = self.config.bundle_filename() {
            // 將輸出打包成單一 ZIP
            let zip_data = {
                let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

                zip.start_file::<_, ()>(self.config.store_filename(), FileOptions::default())?;
                zip.write_all(&store_json)?;

                if self.config.summary_csv() {
                    zip.start_file::<_, ()>(SUMMARY_FILENAME, FileOptions::default())?;
                    zip.write_all(result.summary_csv.as_bytes())?;
                }

                let cursor = zip.finish()?;
                cursor.into_inner()
            };

            tracing::debug!("Writing bundle ({} bytes) to storage", zip_data.len());
            self.storage.write_file(bundle, &zip_data).await?;
        }

        Ok(format!(
            "{}/{}",
            self.config.output_path(),
            self.config.store_filename()
        ))
    }
}
