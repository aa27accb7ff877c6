use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use readycard_kiosk::config::{EnvOverride, KioskConfig};
use readycard_kiosk::server::{self, AppState};
use readycard_kiosk::{CardLedger, telemetry};

#[derive(Parser)]
#[clap(version, about = "Cash-to-card kiosk balance and reload API")]
struct Cli {
    #[clap(short, long, env = "KIOSK_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,
    #[clap(short, long, env = "PORT")]
    port: Option<u16>,
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Seed the ledger and serve the HTTP API (default).
    Serve,
    /// Seed the ledger, print every card and the totals as CSV, then exit.
    Summary,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();
    let cli = Cli::parse();

    let config = KioskConfig::load_config(cli.config, EnvOverride { port: cli.port })?;
    let ledger = CardLedger::from_config(&config)
        .await
        .context("Couldn't seed the card ledger")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => server::run(AppState::new(ledger.into_shared(), config)).await?,
        Command::Summary => {
            let stats = ledger.summary()?;
            let mut out = std::io::stdout().lock();
            writeln!(out, "pan,status,balance")?;
            for card in ledger.cards() {
                writeln!(out, "{}", card)?;
            }
            writeln!(out, "cards,active,inactive,total")?;
            writeln!(
                out,
                "{},{},{},{}",
                stats.cards, stats.active_cards, stats.inactive_cards, stats.total_balance
            )?;
        }
    }

    Ok(())
}
