//! jobpulse - live job-status dashboards for the customs back office.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feed_adapter::config::FeedConfig;
use feed_adapter::presenter::{self, DashboardViewConfig};
use feed_adapter::{metrics, ConnectionState, FeedEvent, FeedManager, Subscription};
use jobpulse_cli::errors::ShellError;
use jobpulse_cli::render;
use jobpulse_cli::screens::ScreenKind;
use jobpulse_cli::session::{
    EnvIdentityProvider, FiscalYearProvider, IdentityProvider, SystemFiscalYearProvider,
};
use jobpulse_core_types::FiscalYear;

#[derive(Parser)]
#[command(name = "jobpulse", version, about = "Live job-status dashboards")]
struct Cli {
    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Watch one dashboard screen with live updates
    Watch {
        #[arg(long, value_enum)]
        screen: ScreenKind,
        /// Deployment profile: secure-production, production, testing, local
        #[arg(long, default_value = "local")]
        profile: String,
        /// Fiscal year, e.g. 25-26; defaults to the current reporting year
        #[arg(long)]
        year: Option<String>,
        /// Override the feed endpoint URL
        #[arg(long)]
        feed_url: Option<String>,
    },
    /// List available screens and their metric columns
    Screens,
}

fn init_tracing(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Command::Screens => {
            for screen in ScreenKind::ALL {
                let config = screen.config();
                println!("{}  ({})", screen.as_str(), config.name);
                for column in &config.columns {
                    println!("    {:<28} {}", column.key, column.title);
                }
            }
            Ok(())
        }
        Command::Watch {
            screen,
            profile,
            year,
            feed_url,
        } => watch(screen, &profile, year, feed_url).await,
    }
}

async fn watch(
    screen: ScreenKind,
    profile: &str,
    year: Option<String>,
    feed_url: Option<String>,
) -> Result<()> {
    if let Some(user) = EnvIdentityProvider.current_user() {
        if !screen.permitted(&user.role) {
            return Err(ShellError::ScreenNotPermitted {
                screen: screen.as_str().to_string(),
                role: user.role.to_string(),
            }
            .into());
        }
        info!(target: "jobpulse", user = %user.username, role = %user.role, "session active");
    }

    let year = match year {
        Some(raw) => FiscalYear::parse(&raw)
            .map_err(ShellError::from)
            .context("invalid --year")?,
        None => SystemFiscalYearProvider.fiscal_year(),
    };

    let mut config = FeedConfig::for_profile(profile);
    config.endpoint_override = feed_url;
    info!(target: "jobpulse", endpoint = %config.endpoint(), year = %year, "opening dashboard feed");

    let view = screen.config();
    let manager = Arc::new(FeedManager::new(&config, Subscription::for_year(year)));
    let mut events = manager.subscribe();
    Arc::clone(&manager).start().await?;

    print_frame(&view, &manager);

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!(target: "jobpulse", "interrupt received; closing feed");
                break;
            }
            event = events.recv() => match event {
                Ok(FeedEvent::StateChanged(ConnectionState::Disconnected)) => {
                    print_frame(&view, &manager);
                    warn!(target: "jobpulse", "feed disconnected");
                    break;
                }
                Ok(_) => print_frame(&view, &manager),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(target: "jobpulse", skipped, "renderer lagged behind the feed");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    manager.shutdown().await;
    let stats = metrics::snapshot();
    info!(
        target: "jobpulse",
        frames = stats.frames,
        decode_failures = stats.decode_failures,
        "feed session closed"
    );
    Ok(())
}

fn print_frame(view: &DashboardViewConfig, manager: &FeedManager) {
    let store = manager.snapshot();
    let decision = presenter::decide(manager.connection_state(), &store);
    print!("{}", render::render(view, &decision, &store));
}
