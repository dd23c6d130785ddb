use clap::Parser;
use small_dqm::config::toml_config::HarvestConfig;
use small_dqm::core::ConfigProvider;
use small_dqm::utils::{logger, validation::Validate};
use small_dqm::{HarvestEngine, HarvestPipeline, LocalStorage};

#[derive(Parser)]
#[command(name = "toml-harvest")]
#[command(about = "DQM harvesting tool with TOML job configuration")]
struct Args {
    /// Path to TOML job configuration file
    #[arg(short, long, default_value = "harvest-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON logs for the production log collector
    #[arg(long)]
    json_logs: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Dry run - show what would be harvested without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_batch_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting TOML-based harvesting tool");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    // 載入 TOML 配置
    let config = match HarvestConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 驗證配置 (所有 spec 字串在此解析，收割前就會失敗)
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    // 顯示配置摘要
    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual harvesting will occur");
        perform_dry_run(&config)?;
        return Ok(());
    }

    // 決定監控設定
    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());

    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    // 從配置組出收割序列
    let sequence = match config.to_sequence() {
        Ok(sequence) => sequence,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    // 創建存儲和管道
    let storage = LocalStorage::new(config.output_path().to_string());
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

fn display_config_summary(config: &HarvestConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Job: {} v{}", config.job.name, config.job.version);
    println!(
        "  Source: {} ({})",
        config.source.location, config.source.r#type
    );
    println!("  Output: {}/{}", config.output_path(), config.store_filename());
    println!("  Harvester instances: {}", config.harvester.len());
    println!("  Summary CSV: {}", config.summary_csv());

    if let Some(bundle) = config.bundle_filename() {
        println!("  Bundle: {} (ZIP)", bundle);
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &HarvestConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Dry Run Analysis:");
    println!();

    let sequence = config.to_sequence()?;

    println!("📊 Harvest Sequence: {}", sequence.name);
    for instance in &sequence.instances {
        println!();
        println!("  Instance: {}", instance.name);
        println!("    Subdirectory: {}", instance.subdir);
        println!("    Verbosity: {}", instance.verbose);
        println!("    Efficiency entries: {}", instance.efficiency.len());
        println!("    Resolution entries: {}", instance.resolution.len());

        for spec in &instance.efficiency {
            println!(
                "      {} <- {} / {} ({}-D)",
                spec.name,
                spec.numerator,
                spec.denominator,
                spec.dimensions()
            );
        }
        for spec in &instance.resolution {
            println!(
                "      {} & {} <- {}",
                spec.mean_plot(),
                spec.sigma_plot(),
                spec.source
            );
        }
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");

    Ok(())
}
