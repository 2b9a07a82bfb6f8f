//! Generates match record JSON files for replay checks.
//!
//! Usage:
//!   cargo run -p foodfight-core --example gen-transcript -- [idle|wander|short] > record.json

use foodfight_core::*;

fn main() {
    let mode = std::env::args().nth(1).unwrap_or_else(|| "idle".to_string());

    let seed = 42;
    let config = match mode.as_str() {
        "short" => MatchConfig {
            total_turns: 100,
            ..MatchConfig::default()
        },
        _ => MatchConfig::default(),
    };
    let symbols: Vec<Symbol> = generate_field(&config, &mut seeded(seed)).player_symbols();

    let transcript: Vec<ActionMap> = match mode.as_str() {
        "idle" | "short" => {
            // Everyone stands still; only respawns and the tie-break change anything
            let idle: ActionMap = symbols.iter().map(|s| (*s, None)).collect();
            vec![idle; config.total_turns as usize]
        }
        "wander" => {
            // First player walks in widening loops, the rest idle
            (0..config.total_turns)
                .map(|turn| {
                    symbols
                        .iter()
                        .enumerate()
                        .map(|(i, s)| {
                            let action = match (i, turn % 10) {
                                (0, 0) => Some(Action::TurnLeft),
                                (0, _) => Some(Action::MoveForward),
                                _ => None,
                            };
                            (*s, action)
                        })
                        .collect()
                })
                .collect()
        }
        _ => {
            eprintln!("Unknown mode: {}. Use 'idle', 'wander', or 'short'", mode);
            std::process::exit(1);
        }
    };

    // Verify by running the sim
    let history = replay(&config, seed, &transcript);
    let record = MatchRecord {
        config,
        seed,
        history,
        transcript,
    };

    if let Some(last) = record.final_field() {
        eprintln!("=== Sim result ({} mode) ===", mode);
        eprintln!("Final turn: {}", last.turn);
        for team in &last.teams {
            eprintln!("Team {}: {} points", team.symbol, team.score.total());
        }
        eprintln!("Digest: {}", record.digest());
    }

    println!("{}", serde_json::to_string(&record).unwrap());
}
