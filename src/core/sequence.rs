//! 順序執行多個 harvester instance，並收集每個 instance 的報告。

use std::time::Instant;

use crate::core::harvester::GenericHarvester;
use crate::domain::model::{DqmStore, InstanceReport};
use crate::domain::spec::HarvestSequence;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct SequenceRunner {
    harvester: GenericHarvester,
    monitor: Option<SystemMonitor>,
    monitor_enabled: bool,
    execution_id: String,
}

impl SequenceRunner {
    pub fn new(execution_id: String) -> Self {
        Self {
            harvester: GenericHarvester::new(),
            monitor: None,
            monitor_enabled: false,
            execution_id,
        }
    }

    /// 啟用或禁用系統監控
    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.monitor_enabled = enabled;
        if enabled {
            self.monitor = Some(SystemMonitor::new(enabled));
        }
        self
    }

    /// 依宣告順序執行 sequence 中的每個 instance。
    ///
    /// A missing subdirectory degrades to "all entries skipped" inside the
    /// harvester; it never fails the run.
    pub fn execute_all(
        &self,
        sequence: &HarvestSequence,
        store: &mut DqmStore,
    ) -> Result<Vec<InstanceReport>> {
        let start = Instant::now();
        let mut reports = Vec::with_capacity(sequence.len());

        tracing::info!(
            "🚀 Executing harvest sequence '{}' ({} instances, execution id {})",
            sequence.name,
            sequence.len(),
            self.execution_id
        );
        if self.monitor_enabled {
            if let Some(monitor) = &self.monitor {
                monitor.log_stats("Harvest sequence started.");
            }
        }

        for instance in &sequence.instances {
            if !store.contains_dir(&instance.subdir) {
                tracing::info!(
                    "📂 [{}] subdirectory '{}' not present in the input store",
                    instance.name,
                    instance.subdir
                );
            }

            let report = self.harvester.run(instance, store);
            tracing::info!(
                "✅ Instance executed: {} (published: {}, skipped: {}, duration: {:?})",
                report.instance,
                report.published(),
                report.skipped(),
                report.duration
            );
            reports.push(report);
        }

        if self.monitor_enabled {
            if let Some(monitor) = &self.monitor {
                monitor.log_stats("Harvest sequence completed.");
            }
        }
        tracing::debug!("Sequence '{}' finished in {:?}", sequence.name, start.elapsed());

        Ok(reports)
    }
}
