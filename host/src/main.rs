use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use foodfight_core::{MatchRecord, Symbol};
use foodfight_host::{bots, init_tracing, ChessClock, HostConfig, MatchDriver, ProcessController};
use tracing::info;

#[derive(Parser)]
#[command(name = "foodfight")]
#[command(about = "Run deterministic foodfight matches", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one match and write its history
    Run {
        /// Host config JSON file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the match seed
        #[arg(long)]
        seed: Option<u64>,

        /// Attach an agent process to a player (e.g. "a=./my-agent --fast")
        #[arg(long = "agent", value_name = "SYMBOL=COMMAND")]
        agents: Vec<String>,

        /// Output file (defaults to stdout)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Dispatch all controller calls of a turn before waiting
        #[arg(long, default_value = "false")]
        parallel: bool,

        /// Write the full match record instead of only the history
        #[arg(long, default_value = "false")]
        record: bool,
    },

    /// Replay a match record and check it reproduces its history
    Verify {
        /// Record JSON written by `run --record`
        #[arg(long)]
        record: PathBuf,
    },
}

fn parse_agent(spec: &str) -> Result<(Symbol, String)> {
    let (symbol, command) = spec
        .split_once('=')
        .ok_or_else(|| anyhow!("agent {spec:?} is not SYMBOL=COMMAND"))?;
    let mut chars = symbol.chars();
    match (chars.next(), chars.next()) {
        (Some(symbol), None) if !command.trim().is_empty() => Ok((symbol, command.to_string())),
        _ => bail!("agent {spec:?} is not SYMBOL=COMMAND"),
    }
}

fn output(out: Option<PathBuf>) -> Result<Box<dyn Write>> {
    Ok(match out {
        Some(path) => Box::new(BufWriter::new(
            File::create(&path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}

fn run(
    config: Option<PathBuf>,
    seed: Option<u64>,
    agents: Vec<String>,
    out: Option<PathBuf>,
    parallel: bool,
    write_record: bool,
) -> Result<()> {
    let mut host = match config {
        Some(path) => HostConfig::from_json_file(&path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => HostConfig::default(),
    };
    if let Some(seed) = seed {
        host.seed = seed;
    }
    host.parallel_controllers |= parallel;
    host.validate()?;

    let mut driver = MatchDriver::from_host_config(&host);
    let players = driver.player_symbols();
    let clock = || ChessClock::new(host.time_budget(), host.grace());

    let mut attached = Vec::new();
    for spec in &agents {
        let (player, command) = parse_agent(spec)?;
        if !players.contains(&player) {
            bail!("no player {player:?} in a {:?} match", host.match_config.match_type);
        }
        let agent = ProcessController::from_command_line(&command)
            .with_context(|| format!("starting agent {command:?}"))?;
        info!(%player, %command, "agent attached");
        driver.register_clocked(player, Box::new(agent), clock());
        attached.push(player);
    }
    for (i, player) in players.iter().enumerate() {
        if !attached.contains(player) {
            driver.register_clocked(*player, bots::random(host.seed ^ (i as u64 + 1)), clock());
        }
    }

    let record = driver.run();
    let mut writer = output(out)?;
    if write_record {
        serde_json::to_writer(&mut writer, &record)?;
    } else {
        serde_json::to_writer(&mut writer, &record.history)?;
    }
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

fn verify(path: PathBuf) -> Result<()> {
    let file = File::open(&path).with_context(|| format!("opening {}", path.display()))?;
    let record: MatchRecord = serde_json::from_reader(io::BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))?;
    if !record.verify() {
        bail!("replay of {} diverges from its history", path.display());
    }
    info!(digest = %record.digest(), turns = record.transcript.len(), "record verified");
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            seed,
            agents,
            out,
            parallel,
            record,
        } => run(config, seed, agents, out, parallel, record),
        Commands::Verify { record } => verify(record),
    }
}
