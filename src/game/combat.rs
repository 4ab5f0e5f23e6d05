//! Combat resolver - melee hits, block mitigation, scoring

use super::entity::{Action, HitOutcome};
use super::{Arena, ClientId};

/// Melee reach in world units
pub const ATTACK_RANGE: f32 = 50.0;
/// Damage per melee hit before mitigation
pub const ATTACK_DAMAGE: u32 = 10;
/// Minimum gap between accepted attack intents
pub const ATTACK_COOLDOWN_MS: u64 = 500;
/// Awarded to the attacker on a kill
pub const KILL_BONUS: u64 = 10;
/// Attackers earn one point per this much damage dealt
pub const DAMAGE_PER_POINT: u32 = 5;

impl Arena {
    /// Every living entity still swinging hits everyone alive in reach.
    ///
    /// There is no per-tick cooldown here: an entity left in `attack`
    /// keeps landing hits every tick until its action changes.
    pub fn resolve_combat(&mut self, now: u64) {
        let attackers: Vec<ClientId> = self
            .roster
            .values()
            .filter(|e| e.is_alive() && e.action == Action::Attack)
            .map(|e| e.id)
            .collect();

        for attacker_id in attackers {
            let swinging = self
                .roster
                .get(&attacker_id)
                .is_some_and(|e| e.is_alive() && e.action == Action::Attack);
            if swinging {
                self.strike_around(attacker_id, now);
            }
        }
    }

    /// One melee swing from `attacker_id` against all living entities in
    /// reach. Returns how many were hit.
    pub fn strike_around(&mut self, attacker_id: ClientId, now: u64) -> usize {
        let Some(attacker) = self.roster.get(&attacker_id) else {
            return 0;
        };

        let targets: Vec<ClientId> = self
            .roster
            .values()
            .filter(|t| t.id != attacker_id && t.is_alive())
            .filter(|t| t.distance_to(attacker) <= ATTACK_RANGE)
            .map(|t| t.id)
            .collect();

        for target_id in &targets {
            self.apply_damage(*target_id, ATTACK_DAMAGE, attacker_id, now);
        }

        targets.len()
    }

    /// Land a hit on `target_id` and settle the score.
    ///
    /// The attacker may already have left the roster, in which case the
    /// target still takes the damage and nobody is credited.
    pub fn apply_damage(
        &mut self,
        target_id: ClientId,
        amount: u32,
        attacker_id: ClientId,
        now: u64,
    ) -> Option<HitOutcome> {
        let target = self.roster.get_mut(&target_id)?;
        if target.is_dead {
            return None;
        }
        let outcome = target.take_hit(amount, now);

        if let Some(attacker) = self.roster.get_mut(&attacker_id) {
            if outcome.killed {
                attacker.score += KILL_BONUS;
            }
            attacker.score += u64::from(outcome.damage / DAMAGE_PER_POINT);
        }

        if outcome.killed {
            self.on_death(target_id, attacker_id, now);
        }

        Some(outcome)
    }
}
