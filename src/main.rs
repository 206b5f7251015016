use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vigia::config::Config;
use vigia::monitor::Monitor;
use vigia::navigator::Navigator;
use vigia::notifications::{Channel, Dispatcher, TelegramChannel};

#[derive(Parser)]
#[command(
    name = "vigia",
    version,
    about = "Cita previa appointment monitor with Telegram alerts",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML); environment variables are used otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    /// Append log output to a file in addition to the console
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run continuous monitoring until stopped
    Monitor {
        /// Override the check interval in seconds
        #[arg(long)]
        interval_secs: Option<u64>,
    },

    /// Run a single check cycle and exit
    Check {
        /// Limit the check to one province
        #[arg(short, long)]
        province: Option<String>,
    },

    /// Send a test message through the notification channel
    NotifyTest,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    let log_file = cli.log_file.clone().or_else(|| config.logging.file.clone());
    setup_tracing(&cli.log_format, cli.verbose, &config.logging.level, log_file)?;

    match cli.command {
        Commands::Monitor { interval_secs } => {
            tracing::info!(interval_secs = ?interval_secs, "Starting monitor command");
            monitor(config, interval_secs).await?;
        }

        Commands::Check { province } => {
            tracing::info!(province = ?province, "Starting check command");
            check(config, province).await?;
        }

        Commands::NotifyTest => {
            tracing::info!("Starting notify-test command");
            notify_test(config).await?;
        }
    }

    Ok(())
}

fn setup_tracing(
    format: &str,
    verbose: bool,
    level: &str,
    log_file: Option<PathBuf>,
) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("vigia=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new(format!("vigia={level},warn"))
    };

    let file_layer = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(file)),
            )
        }
        None => None,
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(file_layer)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(file_layer)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

/// Assemble the dispatcher with the configured Telegram channel
fn build_dispatcher(config: &Config) -> Result<Dispatcher> {
    let channel = TelegramChannel::new(config.telegram.clone())?;
    Ok(Dispatcher::new().with_channel(Box::new(channel)))
}

async fn monitor(mut config: Config, interval_secs: Option<u64>) -> Result<()> {
    if let Some(secs) = interval_secs {
        config.monitor.check_interval_secs = secs;
    }
    config.validate()?;

    let provinces: Vec<String> = config.targets.iter().map(|t| t.province.clone()).collect();
    tracing::info!(provinces = ?provinces, "Monitoring provinces");

    let navigator = Navigator::from_config(&config)?;
    let dispatcher = build_dispatcher(&config)?;

    // Startup confirmation, sent once so a silent death is detectable
    dispatcher
        .announce_startup(&provinces, config.check_interval())
        .await;

    let monitor = Arc::new(Monitor::new(&config, navigator, dispatcher));

    let signal_monitor = Arc::clone(&monitor);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, requesting shutdown");
            signal_monitor.stop();
        }
    });

    monitor.run().await;
    tracing::info!("Monitor stopped");
    Ok(())
}

async fn check(mut config: Config, province: Option<String>) -> Result<()> {
    if let Some(province) = &province {
        config.targets.retain(|t| &t.province == province);
        if config.targets.is_empty() {
            anyhow::bail!("Province {province} is not configured");
        }
    }
    config.validate()?;

    let navigator = Navigator::from_config(&config)?;
    let dispatcher = build_dispatcher(&config)?;
    let monitor = Monitor::new(&config, navigator, dispatcher);

    let summary = monitor.run_tick().await;
    for (province, outcome) in &summary.outcomes {
        println!("{province}: {outcome}");
    }
    Ok(())
}

async fn notify_test(config: Config) -> Result<()> {
    let channel = TelegramChannel::new(config.telegram.clone())?;
    let status = channel
        .send_text("🧪 <b>vigia test</b>\n\nNotification channel is working.")
        .await?;
    println!("{status}");
    Ok(())
}
