use crate::combat::rng::{pick_index, RandomSource};
use crate::combat::state::BattleState;
use crate::data::skill::TargetSelector;

/// Resolve a selector from the point of view of `actor` (an index into
/// `state.units`). Only living units are returned. A random pick consumes one
/// draw, and only when there is more than one candidate.
pub fn select_targets<R: RandomSource + ?Sized>(
    selector: TargetSelector,
    actor: usize,
    state: &BattleState<'_>,
    rng: &mut R,
) -> Vec<usize> {
    let side = state.units[actor].at.side;
    match selector {
        TargetSelector::SelfUnit => {
            if state.units[actor].is_alive() {
                vec![actor]
            } else {
                Vec::new()
            }
        }
        TargetSelector::Ally => weakest_allies(actor, state, 1),
        TargetSelector::AllAllies => state.alive_of(side),
        TargetSelector::Enemy => {
            let enemies = state.alive_of(side.opponent());
            match enemies.len() {
                0 | 1 => enemies,
                len => vec![enemies[pick_index(rng, len)]],
            }
        }
        TargetSelector::AllEnemies => state.alive_of(side.opponent()),
        TargetSelector::All => (0..state.units.len())
            .filter(|idx| state.units[*idx].is_alive())
            .collect(),
    }
}

/// Up to `count` living allies of `actor` (the actor included) with the fewest
/// troops, ties by slot. Never consumes randomness.
pub fn weakest_allies(actor: usize, state: &BattleState<'_>, count: usize) -> Vec<usize> {
    let mut allies = state.alive_of(state.units[actor].at.side);
    allies.sort_by_key(|idx| (state.units[*idx].troops, state.units[*idx].at.slot));
    allies.truncate(count);
    allies
}
