use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use overlord_gateway::flight::{self, NavmapClient};
use overlord_gateway::relay::{RelayCommand, RelayManager};
use overlord_gateway::state::BotState;
use overlord_gateway::{Config, Daemon};

/// Overlord - Twitch chat gateway with AI, TTS relay, and flight-sim data
#[derive(Parser)]
#[command(name = "overlord", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Send a test message through the TTS relay
    TestRelay {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the relay connection.")]
        text: String,
    },
    /// Print current simulator info
    SimInfo,
    /// Look up an airport by ident
    Airport {
        /// ICAO ident (e.g. KSEA)
        ident: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,overlord_gateway=info",
        1 => "info,overlord_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env()?;

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::TestRelay { text } => test_relay(&config, text).await,
            Command::SimInfo => sim_info(&config).await,
            Command::Airport { ident } => airport(&config, &ident).await,
        };
    }

    tracing::info!(
        channel = %config.twitch.channel,
        voice = config.voice.enabled,
        "starting overlord gateway"
    );

    let daemon = Daemon::new(config)?;
    daemon.run().await?;
    Ok(())
}

/// Connect to the relay and speak one test message
async fn test_relay(config: &Config, text: String) -> anyhow::Result<()> {
    let mut manager = RelayManager::new(config.relay.clone());
    manager.connect().await;
    let state = BotState::default();
    manager.send(&RelayCommand::spoken(text, &state)).await?;
    println!("relay message sent");
    Ok(())
}

/// Print current simulator info
async fn sim_info(config: &Config) -> anyhow::Result<()> {
    let client = NavmapClient::new(&config.flight.base_url);
    match client.sim_info().await {
        Some(info) => println!("{}", flight::format_flight_status(&info)),
        None => println!("{}", flight::FLIGHT_DATA_APOLOGY),
    }
    Ok(())
}

/// Look up an airport
async fn airport(config: &Config, ident: &str) -> anyhow::Result<()> {
    let client = NavmapClient::new(&config.flight.base_url);
    let info = client.airport_info(ident).await;
    println!("{}", flight::format_airport_info(ident, info.as_ref()));
    Ok(())
}
