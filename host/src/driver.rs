use std::collections::BTreeMap;
use std::sync::Arc;

use foodfight_core::{
    generate_field, player_symbol, run_turn, seeded, stream, ActionMap, FieldState, MatchConfig,
    MatchRecord, MatchRng, Symbol, SCHEDULE_STREAM,
};
use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use crate::clock::{ChessClock, ClockedController};
use crate::config::HostConfig;
use crate::controller::Controller;

/// Runs one match: owns the live snapshot and one controller per player.
pub struct MatchDriver {
    config: MatchConfig,
    seed: u64,
    parallel: bool,
    controllers: BTreeMap<Symbol, ClockedController>,
}

impl MatchDriver {
    pub fn new(config: MatchConfig, seed: u64) -> Self {
        Self {
            config,
            seed,
            parallel: false,
            controllers: BTreeMap::new(),
        }
    }

    pub fn from_host_config(host: &HostConfig) -> Self {
        Self::new(host.match_config.clone(), host.seed).parallel(host.parallel_controllers)
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Symbols the generator will assign, in team order.
    pub fn player_symbols(&self) -> Vec<Symbol> {
        (0..self.config.match_type.player_count())
            .map(player_symbol)
            .collect()
    }

    pub fn register(&mut self, player: Symbol, controller: ClockedController) {
        if !self.player_symbols().contains(&player) {
            warn!(%player, "no such player, controller ignored");
            return;
        }
        if self.controllers.insert(player, controller).is_some() {
            warn!(%player, "controller replaced");
        }
    }

    /// Register `controller` for `player` behind a fresh chess clock.
    pub fn register_clocked(
        &mut self,
        player: Symbol,
        controller: Box<dyn Controller>,
        clock: ChessClock,
    ) {
        let clocked = ClockedController::spawn(player.to_string(), controller, clock);
        self.register(player, clocked);
    }

    /// One action per player for `field`, in a shuffled call order.
    fn collect_actions(&mut self, field: &Arc<FieldState>, schedule: &mut MatchRng) -> ActionMap {
        let mut order: Vec<(Symbol, Symbol)> =
            field.players().map(|(team, p)| (team, p.symbol)).collect();
        order.shuffle(schedule);

        let mut actions: ActionMap = order.iter().map(|(_, player)| (*player, None)).collect();
        if self.parallel {
            let mut pending = Vec::with_capacity(order.len());
            for (team, player) in &order {
                if let Some(controller) = self.controllers.get_mut(player) {
                    if let Some(call) = controller.request(field, *team, *player) {
                        pending.push((*player, call));
                    }
                }
            }
            for (player, call) in pending {
                if let Some(controller) = self.controllers.get_mut(&player) {
                    actions.insert(player, controller.wait(call));
                }
            }
        } else {
            for (team, player) in &order {
                if let Some(controller) = self.controllers.get_mut(player) {
                    actions.insert(*player, controller.play(field, *team, *player));
                }
            }
        }
        actions
    }

    /// Play every turn and return the full record.
    pub fn run(mut self) -> MatchRecord {
        let mut engine = seeded(self.seed);
        let mut schedule = stream(self.seed, SCHEDULE_STREAM);
        let mut field = generate_field(&self.config, &mut engine);

        for player in field.player_symbols() {
            if !self.controllers.contains_key(&player) {
                debug!(%player, "no controller, player idles");
            }
        }
        info!(
            seed = self.seed,
            turns = self.config.total_turns,
            players = field.player_symbols().len(),
            parallel = self.parallel,
            "match started"
        );

        let turns = self.config.total_turns as usize;
        let mut history = Vec::with_capacity(turns + 1);
        let mut transcript = Vec::with_capacity(turns);
        for _ in 0..turns {
            let shared = Arc::new(field);
            history.push(FieldState::clone(&shared));
            let actions = self.collect_actions(&shared, &mut schedule);
            field = run_turn(&shared, &actions, &self.config, &mut engine);
            transcript.push(actions);
            if field.turn % 500 == 0 {
                debug!(turn = field.turn, "progress");
            }
        }
        history.push(field);

        let record = MatchRecord {
            config: self.config.clone(),
            seed: self.seed,
            history,
            transcript,
        };
        if let Some(last) = record.final_field() {
            for team in &last.teams {
                info!(team = %team.symbol, score = team.score.total(), "final score");
            }
        }
        let dead: Vec<Symbol> = self
            .controllers
            .iter()
            .filter(|(_, c)| c.is_dead())
            .map(|(s, _)| *s)
            .collect();
        info!(digest = %record.digest(), ?dead, "match finished");
        record
    }
}
