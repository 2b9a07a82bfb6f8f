//! Stdio agent running the built-in random bot.
//!
//! Usage:
//!   foodfight run --agent "a=foodfight-agent --seed 7"

use std::io;

use anyhow::Result;
use clap::Parser;
use foodfight_host::agent::serve;
use foodfight_host::bots::RandomController;
use foodfight_host::init_tracing;
use tracing::info;

#[derive(Parser)]
#[command(name = "foodfight-agent")]
#[command(about = "Random foodfight agent speaking the stdio protocol", long_about = None)]
struct Cli {
    /// Seed for the bot's choices
    #[arg(long, default_value = "0")]
    seed: u64,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut bot = RandomController::new(cli.seed);
    let served = serve(&mut bot, io::stdin().lock(), io::stdout().lock())?;
    info!(served, "agent done");
    Ok(())
}
