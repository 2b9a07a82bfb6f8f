use std::sync::Arc;
use std::time::{Duration, Instant};

use foodfight_core::{generate_field, is_valid, seeded, Action, MatchConfig, MatchType};
use foodfight_host::{
    bots, ChessClock, ClockedController, Controller, ControllerError, MatchDriver,
    ProcessController,
};

const AGENT: &str = env!("CARGO_BIN_EXE_foodfight-agent");

fn shell(script: &str) -> ProcessController {
    ProcessController::spawn("sh", ["-c", script]).unwrap()
}

#[test]
fn agent_answers_with_valid_actions() {
    let config = MatchConfig::default();
    let field = generate_field(&config, &mut seeded(8));
    let mut agent = ProcessController::spawn(AGENT, ["--seed", "3"]).unwrap();

    for _ in 0..20 {
        for (team, player) in field.players() {
            let action = agent.play_action(&field, team, player.symbol).unwrap();
            if let Some(action) = action {
                assert!(is_valid(&field, player, action), "{action} for {}", player.symbol);
            }
        }
    }
}

#[test]
fn agent_plays_a_full_match() {
    let config = MatchConfig {
        total_turns: 50,
        ..MatchConfig::with_match_type(MatchType::DOUBLES)
    };
    let mut driver = MatchDriver::new(config, 17);
    for (i, player) in driver.player_symbols().into_iter().enumerate() {
        let controller: Box<dyn Controller> = if i == 0 {
            Box::new(ProcessController::spawn(AGENT, ["--seed", "9"]).unwrap())
        } else {
            bots::random(i as u64)
        };
        driver.register_clocked(
            player,
            controller,
            ChessClock::new(Duration::from_secs(30), Duration::from_millis(500)),
        );
    }
    let record = driver.run();
    assert_eq!(record.history.len(), 51);
    assert!(record.transcript.iter().any(|m| m[&'a'].is_some()));
    assert!(record.verify());
}

#[test]
fn unknown_action_name_is_a_no_op() {
    let field = generate_field(&MatchConfig::default(), &mut seeded(2));
    let mut agent = shell(r#"printf '"JUMP"\n"DUCK"\n'; cat > /dev/null"#);
    assert_eq!(agent.play_action(&field, 'A', 'a').unwrap(), None);
    assert_eq!(agent.play_action(&field, 'A', 'a').unwrap(), Some(Action::Duck));
}

#[test]
fn exited_agent_reports_closed() {
    let field = generate_field(&MatchConfig::default(), &mut seeded(2));
    let mut agent = shell("exit 0");
    let err = agent.play_action(&field, 'A', 'a').unwrap_err();
    assert!(
        matches!(err, ControllerError::Closed | ControllerError::Io(_)),
        "unexpected {err}"
    );
}

#[test]
fn silent_agent_is_killed_at_its_deadline() {
    let field = Arc::new(generate_field(&MatchConfig::default(), &mut seeded(2)));
    let agent = shell("cat > /dev/null");
    let clock = ChessClock::new(Duration::from_millis(200), Duration::from_millis(50));
    let mut clocked = ClockedController::spawn("silent", Box::new(agent), clock);

    let started = Instant::now();
    assert_eq!(clocked.play(&field, 'A', 'a'), None);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(clocked.is_dead());
    assert_eq!(clocked.play(&field, 'A', 'a'), None);
}
