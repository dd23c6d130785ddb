use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Runs a harvest job through its three phases, optionally sampling process
/// stats around each one.
pub struct HarvestEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> HarvestEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(false),
        }
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting harvest job...");
        self.monitor.log_stats("Harvest started");

        // Extract
        let store = self.pipeline.extract().await?;
        tracing::info!("📥 Loaded input store: {} histograms", store.len());
        self.monitor.log_stats("Extract phase completed");

        // Transform
        let result = self.pipeline.transform(store).await?;
        let published: usize = result.reports.iter().map(|r| r.published()).sum();
        let skipped: usize = result.reports.iter().map(|r| r.skipped()).sum();
        tracing::info!(
            "🔄 Harvested {} instances: {} plots published, {} skipped",
            result.reports.len(),
            published,
            skipped
        );
        self.monitor.log_stats("Transform phase completed");

        // Load
        let output_path = self.pipeline.load(result).await?;
        tracing::info!("💾 Output saved to: {}", output_path);
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}
