use foodfight_core::{is_valid, seeded, Action, FieldState, MatchRng, Symbol};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::controller::{Controller, ControllerError};

/// Never acts.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdleController;

impl Controller for IdleController {
    fn play_action(
        &mut self,
        _field: &FieldState,
        _team: Symbol,
        _player: Symbol,
    ) -> Result<Option<Action>, ControllerError> {
        Ok(None)
    }
}

/// Picks uniformly among the actions valid for its player, with a bias
/// towards moving so it actually explores the field.
#[derive(Debug, Clone)]
pub struct RandomController {
    rng: MatchRng,
}

impl RandomController {
    pub fn new(seed: u64) -> Self {
        Self { rng: seeded(seed) }
    }
}

impl Controller for RandomController {
    fn play_action(
        &mut self,
        field: &FieldState,
        _team: Symbol,
        player: Symbol,
    ) -> Result<Option<Action>, ControllerError> {
        let Some(state) = field.player(player) else {
            return Ok(None);
        };
        if self.rng.gen_bool(0.4) && is_valid(field, state, Action::MoveForward) {
            return Ok(Some(Action::MoveForward));
        }
        let valid: Vec<Action> = Action::ALL
            .iter()
            .copied()
            .filter(|a| is_valid(field, state, *a))
            .collect();
        Ok(valid.choose(&mut self.rng).copied())
    }
}

/// Replays a fixed script, cycling when it runs out.
#[derive(Debug, Clone)]
pub struct ScriptedController {
    script: Vec<Option<Action>>,
    cursor: usize,
}

impl ScriptedController {
    pub fn new(script: Vec<Option<Action>>) -> Self {
        Self { script, cursor: 0 }
    }
}

impl Controller for ScriptedController {
    fn play_action(
        &mut self,
        _field: &FieldState,
        _team: Symbol,
        _player: Symbol,
    ) -> Result<Option<Action>, ControllerError> {
        if self.script.is_empty() {
            return Ok(None);
        }
        let action = self.script[self.cursor % self.script.len()];
        self.cursor += 1;
        Ok(action)
    }
}

pub fn idle() -> Box<dyn Controller> {
    Box::new(IdleController)
}

pub fn random(seed: u64) -> Box<dyn Controller> {
    Box::new(RandomController::new(seed))
}

pub fn scripted(script: Vec<Option<Action>>) -> Box<dyn Controller> {
    Box::new(ScriptedController::new(script))
}

#[cfg(test)]
mod tests {
    use super::*;
    use foodfight_core::{generate_field, MatchConfig};

    #[test]
    fn random_bot_only_plays_valid_actions() {
        let field = generate_field(&MatchConfig::default(), &mut seeded(1));
        let mut bot = RandomController::new(5);
        for _ in 0..200 {
            if let Some(action) = bot.play_action(&field, 'A', 'a').unwrap() {
                assert!(is_valid(&field, field.player('a').unwrap(), action));
            }
        }
    }

    #[test]
    fn random_bot_is_seeded() {
        let field = generate_field(&MatchConfig::default(), &mut seeded(1));
        let mut a = RandomController::new(9);
        let mut b = RandomController::new(9);
        for _ in 0..50 {
            assert_eq!(
                a.play_action(&field, 'A', 'a').unwrap(),
                b.play_action(&field, 'A', 'a').unwrap()
            );
        }
    }

    #[test]
    fn script_cycles() {
        let field = generate_field(&MatchConfig::default(), &mut seeded(1));
        let mut bot = ScriptedController::new(vec![Some(Action::Duck), None]);
        let played: Vec<_> = (0..4)
            .map(|_| bot.play_action(&field, 'A', 'a').unwrap())
            .collect();
        assert_eq!(played, vec![Some(Action::Duck), None, Some(Action::Duck), None]);
    }
}
