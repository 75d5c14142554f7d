use clap::Parser;
use vol_spike::cli::{Cli, Commands};
use vol_spike::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
            eprintln!("Using default configuration");
            toml::from_str(include_str!("../config.toml.example"))?
        }
    };
    config.apply_env_overrides()?;
    config.validate()?;

    // Initialize telemetry
    let _telemetry = vol_spike::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting volume spike monitor");
            args.execute(config).await?;
        }
        Commands::Status(args) => {
            args.execute(config).await?;
        }
        Commands::Export(args) => {
            args.execute(config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!(
                "  Monitor: threshold={}x, cooldown={}m, horizon={}h, poll={}m",
                config.monitor.threshold,
                config.monitor.cooldown_minutes,
                config.monitor.horizon_hours,
                config.monitor.poll_interval_minutes
            );
            println!(
                "  Baseline: median after {} samples, detailed history cap {}",
                config.monitor.min_samples_for_median, config.monitor.detailed_history_cap
            );
            println!(
                "  Feed: {} category={} suffix={}",
                config.feed.base_url, config.feed.category, config.feed.quote_suffix
            );
            println!(
                "  Notify: {}",
                if config.notify.discord_webhook.is_some() {
                    "discord webhook"
                } else {
                    "log only"
                }
            );
            println!("  State: {}", config.storage.state_path.display());
            println!(
                "  Export: enabled={}, dir={}, every {}m as {:?}",
                config.export.enabled,
                config.export.output_dir.display(),
                config.export.interval_minutes,
                config.export.format
            );
        }
    }

    Ok(())
}
