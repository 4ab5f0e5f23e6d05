//! Bot controller - random-walk and melee for filler entities

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use super::entity::Action;
use super::{Arena, ClientId};

pub const MOVE_CHANCE: f64 = 0.7;
pub const ATTACK_CHANCE: f64 = 0.1;
pub const BLOCK_CHANCE: f64 = 0.05;
pub const IDLE_CHANCE: f64 = 0.3;

/// Largest per-axis step a bot takes in one decision
pub const BOT_STEP: f32 = 10.0;

/// Source of randomness for bot decisions
pub trait BotDice {
    /// True with probability `chance`
    fn roll(&mut self, chance: f64) -> bool;

    /// Uniform draw in `[-max, max]`
    fn jitter(&mut self, max: f32) -> f32;
}

impl BotDice for ChaCha8Rng {
    fn roll(&mut self, chance: f64) -> bool {
        self.gen_bool(chance)
    }

    fn jitter(&mut self, max: f32) -> f32 {
        self.gen_range(-max..=max)
    }
}

impl Arena {
    /// One decision round for every living bot.
    ///
    /// The four checks are independent and run in a fixed order (move,
    /// attack, block, idle); each may overwrite the action set before it.
    /// An attack lands immediately, and will land again on the next combat
    /// pass if nothing resets the action in between.
    pub fn run_bots(&mut self, dice: &mut impl BotDice, now: u64) {
        let bots: Vec<ClientId> = self
            .roster
            .values()
            .filter(|e| e.is_bot && e.is_alive())
            .map(|e| e.id)
            .collect();

        for id in bots {
            self.drive_bot(id, dice, now);
        }
    }

    fn drive_bot(&mut self, id: ClientId, dice: &mut impl BotDice, now: u64) {
        // Another bot's swing earlier in this round may have killed it.
        let Some(bot) = self.roster.get_mut(&id).filter(|e| e.is_alive()) else {
            return;
        };

        if dice.roll(MOVE_CHANCE) {
            let dx = dice.jitter(BOT_STEP);
            let dy = dice.jitter(BOT_STEP);
            bot.nudge(dx, dy);
            bot.action = Action::Move;
        }

        if dice.roll(ATTACK_CHANCE) {
            bot.action = Action::Attack;
            bot.last_attack_time = Some(now);
            let hits = self.strike_around(id, now);
            if hits > 0 {
                debug!(bot_id = %id, hits, "Bot swing landed");
            }
        }

        let Some(bot) = self.roster.get_mut(&id) else {
            return;
        };

        if dice.roll(BLOCK_CHANCE) {
            bot.action = Action::Block;
        }

        if dice.roll(IDLE_CHANCE) {
            bot.action = Action::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use rand::SeedableRng;
    use uuid::Uuid;

    use super::*;
    use crate::game::entity::{clamp_to_arena, Facing, MAX_HEALTH};
    use crate::game::testing::RecordingChannels;

    /// Dice that replay a fixed script
    #[derive(Default)]
    struct ScriptedDice {
        rolls: VecDeque<bool>,
        jitters: VecDeque<f32>,
        asked: Vec<f64>,
    }

    impl ScriptedDice {
        fn new(rolls: &[bool], jitters: &[f32]) -> Self {
            Self {
                rolls: rolls.iter().copied().collect(),
                jitters: jitters.iter().copied().collect(),
                asked: Vec::new(),
            }
        }
    }

    impl BotDice for ScriptedDice {
        fn roll(&mut self, chance: f64) -> bool {
            self.asked.push(chance);
            self.rolls.pop_front().unwrap_or(false)
        }

        fn jitter(&mut self, _max: f32) -> f32 {
            self.jitters.pop_front().unwrap_or(0.0)
        }
    }

    fn arena() -> Arena {
        Arena::new(Arc::new(RecordingChannels::default()), 3)
    }

    fn spawn_at(arena: &mut Arena, is_bot: bool, x: f32, y: f32) -> ClientId {
        let id = Uuid::new_v4();
        arena.spawn_entity(id, is_bot, 0);
        arena.roster.get_mut(&id).unwrap().place(x, y);
        id
    }

    #[test]
    fn checks_run_in_fixed_order() {
        let mut arena = arena();
        spawn_at(&mut arena, true, 100.0, 100.0);
        let mut dice = ScriptedDice::new(&[false, false, false, false], &[]);

        arena.run_bots(&mut dice, 0);

        assert_eq!(
            dice.asked,
            vec![MOVE_CHANCE, ATTACK_CHANCE, BLOCK_CHANCE, IDLE_CHANCE]
        );
    }

    #[test]
    fn move_steps_and_faces_direction() {
        let mut arena = arena();
        let bot = spawn_at(&mut arena, true, 100.0, 100.0);
        let mut dice = ScriptedDice::new(&[true, false, false, false], &[-7.0, 4.0]);

        arena.run_bots(&mut dice, 0);

        let e = arena.entity(&bot).unwrap();
        assert_eq!((e.x, e.y), (93.0, 104.0));
        assert_eq!(e.direction, Facing::Left);
        assert_eq!(e.action, Action::Move);
    }

    #[test]
    fn zero_horizontal_step_keeps_facing() {
        let mut arena = arena();
        let bot = spawn_at(&mut arena, true, 100.0, 100.0);
        arena.roster.get_mut(&bot).unwrap().direction = Facing::Left;
        let mut dice = ScriptedDice::new(&[true, false, false, false], &[0.0, 3.0]);

        arena.run_bots(&mut dice, 0);

        assert_eq!(arena.entity(&bot).unwrap().direction, Facing::Left);
    }

    #[test]
    fn move_at_the_wall_is_clamped() {
        let mut arena = arena();
        let bot = spawn_at(&mut arena, true, 0.0, 1000.0);
        let mut dice = ScriptedDice::new(&[true, false, false, false], &[-10.0, 10.0]);

        arena.run_bots(&mut dice, 0);

        let e = arena.entity(&bot).unwrap();
        assert_eq!((e.x, e.y), clamp_to_arena(-10.0, 1010.0));
    }

    #[test]
    fn attack_lands_immediately() {
        let mut arena = arena();
        let bot = spawn_at(&mut arena, true, 100.0, 100.0);
        let player = spawn_at(&mut arena, false, 120.0, 100.0);
        let mut dice = ScriptedDice::new(&[false, true, false, false], &[]);

        arena.run_bots(&mut dice, 4_000);

        let b = arena.entity(&bot).unwrap();
        assert_eq!(b.action, Action::Attack);
        assert_eq!(b.last_attack_time, Some(4_000));
        assert_eq!(arena.entity(&player).unwrap().health, MAX_HEALTH - 10);
    }

    #[test]
    fn attack_is_resolved_again_by_the_next_combat_pass() {
        let mut arena = arena();
        spawn_at(&mut arena, true, 100.0, 100.0);
        let player = spawn_at(&mut arena, false, 120.0, 100.0);
        let mut dice = ScriptedDice::new(&[false, true, false, false], &[]);

        arena.run_bots(&mut dice, 0);
        arena.resolve_combat(50);

        assert_eq!(arena.entity(&player).unwrap().health, MAX_HEALTH - 20);
    }

    #[test]
    fn later_checks_overwrite_earlier_ones() {
        let mut arena = arena();
        let bot = spawn_at(&mut arena, true, 100.0, 100.0);

        let mut dice = ScriptedDice::new(&[true, true, true, false], &[1.0, 1.0]);
        arena.run_bots(&mut dice, 0);
        assert_eq!(arena.entity(&bot).unwrap().action, Action::Block);

        let mut dice = ScriptedDice::new(&[false, false, true, true], &[]);
        arena.run_bots(&mut dice, 500);
        assert_eq!(arena.entity(&bot).unwrap().action, Action::Idle);
    }

    #[test]
    fn players_and_dead_bots_are_left_alone() {
        let mut arena = arena();
        let player = spawn_at(&mut arena, false, 100.0, 100.0);
        let dead = spawn_at(&mut arena, true, 300.0, 300.0);
        {
            let e = arena.roster.get_mut(&dead).unwrap();
            e.health = 0;
            e.is_dead = true;
        }
        let mut dice = ScriptedDice::new(&[true; 8], &[5.0; 4]);

        arena.run_bots(&mut dice, 0);

        assert!(dice.asked.is_empty());
        let p = arena.entity(&player).unwrap();
        assert_eq!((p.x, p.y), (100.0, 100.0));
        assert_eq!(p.action, Action::Idle);
    }

    #[test]
    fn seeded_rng_keeps_bots_in_bounds() {
        let mut arena = arena();
        arena.fill_with_bots(0);
        let mut dice = ChaCha8Rng::seed_from_u64(99);

        for round in 0..50 {
            arena.run_bots(&mut dice, round * 500);
        }

        for e in arena.roster.values() {
            assert!((0.0..=crate::game::entity::ARENA_WIDTH).contains(&e.x));
            assert!((0.0..=crate::game::entity::ARENA_HEIGHT).contains(&e.y));
            assert_eq!(e.health == 0, e.is_dead);
        }
    }

    #[test]
    fn jitter_stays_within_step() {
        let mut dice = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..1_000 {
            let step = dice.jitter(BOT_STEP);
            assert!((-BOT_STEP..=BOT_STEP).contains(&step));
        }
    }
}
