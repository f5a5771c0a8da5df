use clap::Parser;
use quake_map::core::ConfigProvider;
use quake_map::domain::model::OverlayKind;
use quake_map::utils::error::ErrorSeverity;
use quake_map::utils::{logger, validation::Validate};
use quake_map::{LocalStorage, MapEngine, QuakeMapPipeline, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-map")]
#[command(about = "Build the earthquake map from a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "quake-map.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override output directory from config
    #[arg(long)]
    output: Option<String>,

    /// Dry run - show what would be fetched and written without doing it
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if config.json_logs() {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(output) = &args.output {
        config.output.path = output.clone();
        tracing::info!("🔧 Output path overridden to: {}", output);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Tip: {}", TomlConfig::token_hint());
        std::process::exit(1);
    }

    display_config_summary(&config);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - nothing will be fetched or written");
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = QuakeMapPipeline::new(storage, config)?;
    let engine = MapEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(report) => {
            for feed in &report.feeds {
                let state = match (&feed.error, feed.loaded) {
                    (Some(error), _) => format!("failed ({})", error),
                    (None, true) => format!("{} layers, {} skipped", feed.records, feed.skipped),
                    (None, false) => "not fetched".to_string(),
                };
                println!("  {:<18} {}", feed.name, state);
            }
            println!("✅ Map build completed!");
            println!("📁 Output saved to: {}", report.output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Map build failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig) {
    tracing::info!("📋 Configuration Summary:");
    tracing::info!("  Title: {}", config.map.title);
    for kind in OverlayKind::ALL {
        tracing::info!("  {}: {}", kind, config.feed_url(kind));
    }
    tracing::info!(
        "  Palettes: earthquakes={}, major={}",
        config.style.earthquakes,
        config.style.major_earthquakes
    );
    tracing::info!("  Output: {} {:?}", config.output_path(), config.output_formats());
    if let Some(bundle) = config.bundle_filename() {
        tracing::info!("  Bundle: {}", bundle);
    }
}
