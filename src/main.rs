use clap::Parser;
use small_dqm::client::particlenet;
use small_dqm::utils::{logger, validation::Validate};
use small_dqm::{CliConfig, HarvestEngine, HarvestPipeline, LocalStorage};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting small-dqm harvesting CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    // 內建 ParticleNet 收割序列
    let sequence = match particlenet::particlenet_client() {
        Ok(sequence) => sequence,
        Err(e) => {
            tracing::error!("❌ Built-in ParticleNet registry failed to build: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    // 創建存儲和管道
    let storage = LocalStorage::new(config.output_path.clone());
    let pipeline =
        HarvestPipeline::new(storage, config, sequence).with_monitoring(monitor_enabled);

    // 創建收割引擎並運行
    let engine = HarvestEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Harvest completed successfully!");
            tracing::info!("📁 Output saved to: {}", output_path);
            println!("✅ Harvest completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Harvest failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            // 輸出用戶友好的錯誤信息
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                small_dqm::utils::error::ErrorSeverity::Low => 0, // 警告，但成功
                small_dqm::utils::error::ErrorSeverity::Medium => 2, // 重試錯誤
                small_dqm::utils::error::ErrorSeverity::High => 1, // 處理錯誤
                small_dqm::utils::error::ErrorSeverity::Critical => 3, // 系統錯誤
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
