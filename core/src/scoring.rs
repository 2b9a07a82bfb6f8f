use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::constants::*;
use crate::types::*;

/// Phase 4: one FOOD_ON_TABLE per piece resting on the team's own table.
pub fn score_tables(mut field: FieldState) -> FieldState {
    for team in &mut field.teams {
        for _ in 0..team.table.food.len() {
            team.record(EventKind::FoodOnTable);
        }
    }
    field
}

fn distance_from_centre(team: &TeamState) -> f64 {
    let centre = Vec2::new(FIELD_WIDTH / 2.0, FIELD_DEPTH / 2.0);
    team.players.iter().map(|p| p.location.distance(centre)).sum()
}

/// Phase 5: nudge tied teams apart with TIE_BREAK events so the final
/// ordering is strict.
///
/// Teams are shuffled, then stably sorted by score ascending with ties going
/// to the team further from the field centre first. Walking that order, a
/// team whose score does not exceed its predecessor's is granted TIE_BREAK
/// events until it does.
pub fn break_ties<R: Rng + ?Sized>(mut field: FieldState, rng: &mut R) -> FieldState {
    let mut order: Vec<(Symbol, u64, f64)> = field
        .teams
        .iter()
        .map(|t| (t.symbol, t.score.total(), distance_from_centre(t)))
        .collect();
    order.shuffle(rng);
    order.sort_by(|a, b| a.1.cmp(&b.1).then(b.2.total_cmp(&a.2)));

    let mut previous: Option<u64> = None;
    for (symbol, score, _) in order {
        let mut running = score;
        if let (Some(prev), Some(team)) = (previous, field.team_mut(symbol)) {
            while running <= prev {
                team.record(EventKind::TieBreak);
                running = team.score.total();
            }
            if running != score {
                debug!(team = %symbol, from = score, to = running, "tie broken");
            }
        }
        previous = Some(running);
    }
    field
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::config::MatchConfig;
    use crate::init::generate_field;
    use crate::rng::seeded;

    fn four_way() -> FieldState {
        generate_field(&MatchConfig::with_match_type(MatchType::FOUR_WAY), &mut seeded(8))
    }

    fn totals(field: &FieldState) -> Vec<u64> {
        field.teams.iter().map(|t| t.score.total()).collect()
    }

    #[test]
    fn table_food_scores_each_turn() {
        let mut field = four_way();
        field.teams[2].table.food.extend([FoodType::Apple, FoodType::Grape]);
        let once = score_tables(field);
        let twice = score_tables(once);
        assert_eq!(twice.teams[2].score.count(EventKind::FoodOnTable), 4);
        assert_eq!(twice.teams[0].score.total(), 0);
    }

    #[test]
    fn all_tied_teams_end_distinct() {
        let field = break_ties(four_way(), &mut seeded(1));
        let distinct: BTreeSet<u64> = totals(&field).into_iter().collect();
        assert_eq!(distinct.len(), 4);
        let tie_breaks: u32 = field
            .teams
            .iter()
            .map(|t| t.score.count(EventKind::TieBreak))
            .sum();
        assert_eq!(tie_breaks, 1 + 2 + 3);
    }

    #[test]
    fn untied_scores_unchanged() {
        let mut field = four_way();
        for (i, team) in field.teams.iter_mut().enumerate() {
            for _ in 0..i {
                team.record(EventKind::FoodOnTable);
            }
        }
        let before = totals(&field);
        let after = break_ties(field, &mut seeded(2));
        assert_eq!(totals(&after), before);
    }

    #[test]
    fn tie_goes_to_team_nearer_centre() {
        let mut field = generate_field(&MatchConfig::default(), &mut seeded(4));
        let centre = Vec2::new(FIELD_WIDTH / 2.0, FIELD_DEPTH / 2.0);
        field.teams[0].players[0].location = centre + Vec2::new(-20.0, 0.0);
        field.teams[1].players[0].location = Vec2::new(FIELD_WIDTH - 20.0, 20.0);
        for seed in 0..10 {
            let after = break_ties(field.clone(), &mut seeded(seed));
            assert_eq!(after.teams[0].score.count(EventKind::TieBreak), 1);
            assert_eq!(after.teams[1].score.count(EventKind::TieBreak), 0);
        }
    }
}
