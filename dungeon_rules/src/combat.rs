//! Combat and ability resolution.
//!
//! Enemies are removed from their room as soon as their hp reaches zero, and
//! the player is credited with their xp at that moment. Their loot drops to
//! the room floor for a later `/loot`.

use std::fmt;

use crate::config::RulesConfig;
use crate::entities::{Enemy, RoomId};
use crate::mechanics::{Ability, AbilityEffect};
use crate::world_state::GameState;

/// Damage dealt to one enemy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub enemy: String,
    pub damage: i32,
    pub defeated: bool,
}

/// Result of a basic attack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackReport {
    pub roll: i32,
    pub hit: Hit,
    pub xp_gained: u32,
    pub levels_gained: u32,
}

impl fmt::Display for AttackReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "You rolled a {} and dealt {} damage to {}!",
            self.roll, self.hit.damage, self.hit.enemy
        )?;
        if self.hit.defeated {
            write!(f, " The {} is defeated!", self.hit.enemy.replace('_', " "))?;
        }
        if self.levels_gained > 0 {
            write!(f, " You reach a new level!")?;
        }
        Ok(())
    }
}

/// Result of an ability invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbilityOutcome {
    NoAbility,
    /// Still cooling down. Nothing was consumed.
    Recharging { ability: Ability, remaining: u32 },
    /// An offensive ability with nobody to hit. Nothing was consumed.
    NoTarget { ability: Ability },
    Healed { ability: Ability, amount: i32 },
    Struck {
        ability: Ability,
        hits: Vec<Hit>,
        xp_gained: u32,
        levels_gained: u32,
    },
}

impl AbilityOutcome {
    /// Whether the ability fired and its cooldown started.
    pub fn succeeded(&self) -> bool {
        matches!(self, AbilityOutcome::Healed { .. } | AbilityOutcome::Struck { .. })
    }
}

impl fmt::Display for AbilityOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbilityOutcome::NoAbility => f.write_str("You have no special ability."),
            AbilityOutcome::Recharging { ability, remaining } => write!(
                f,
                "Your {} is recharging ({} turn{} left).",
                ability,
                remaining,
                if *remaining == 1 { "" } else { "s" }
            ),
            AbilityOutcome::NoTarget { .. } => f.write_str("No enemies to target with your ability."),
            AbilityOutcome::Healed { ability: Ability::ShieldBlock, amount } => write!(
                f,
                "You raise your shield and bolster your defenses, gaining {} HP.",
                amount
            ),
            AbilityOutcome::Healed { amount, .. } => {
                write!(f, "You channel divine power and heal {} HP.", amount)
            }
            AbilityOutcome::Struck { ability, hits, .. } => {
                let total: Vec<String> = hits
                    .iter()
                    .map(|h| format!("{} ({})", h.enemy, h.damage))
                    .collect();
                write!(f, "You use {}: {}.", ability, total.join(", "))?;
                for hit in hits.iter().filter(|h| h.defeated) {
                    write!(f, " The {} is defeated!", hit.enemy.replace('_', " "))?;
                }
                Ok(())
            }
        }
    }
}

/// Remove dead enemies from a room, dropping their loot there.
fn reap(state: &mut GameState, room_id: &RoomId) -> Vec<Enemy> {
    let Some(room) = state.rooms.get_mut(room_id) else {
        return Vec::new();
    };
    let (dead, alive): (Vec<Enemy>, Vec<Enemy>) =
        room.enemies.drain(..).partition(|e| !e.is_alive());
    room.enemies = alive;
    for enemy in &dead {
        room.items.extend(enemy.loot.iter().cloned());
    }
    dead
}

fn credit_kills(state: &mut GameState, dead: &[Enemy]) -> (u32, u32) {
    let xp = dead.iter().fold(0u32, |total, e| total.saturating_add(e.xp));
    let levels = state.player.give_xp(xp);
    (xp, levels)
}

/// Attack the enemy at `target` in the player's room with a rolled value.
///
/// Damage is `roll + player.str`. Returns `None` if there is no such living enemy.
pub fn attack(state: &mut GameState, target: usize, roll: i32) -> Option<AttackReport> {
    let location = state.player.location.clone();
    let damage = roll.saturating_add(state.player.strength);

    let room = state.rooms.get_mut(&location)?;
    let enemy = room.enemies.get_mut(target).filter(|e| e.is_alive())?;
    enemy.hp = enemy.hp.saturating_sub(damage);
    let name = enemy.name.clone();
    let defeated = !enemy.is_alive();

    let dead = reap(state, &location);
    let (xp_gained, levels_gained) = credit_kills(state, &dead);
    if defeated {
        tracing::info!(enemy = %name, xp = xp_gained, "enemy defeated");
    }

    Some(AttackReport {
        roll,
        hit: Hit {
            enemy: name,
            damage,
            defeated,
        },
        xp_gained,
        levels_gained,
    })
}

/// Attack the first living enemy in the player's room.
pub fn attack_first(state: &mut GameState, roll: i32) -> Option<AttackReport> {
    let target = state.current_room()?.first_living_enemy()?;
    attack(state, target, roll)
}

/// Invoke the player's ability.
///
/// A recharging ability, or an offensive ability without a target, fails
/// without consuming anything. On success the cooldown is set to the
/// configured length.
pub fn use_ability(state: &mut GameState, config: &RulesConfig) -> AbilityOutcome {
    let Some(ability) = state.player.ability else {
        return AbilityOutcome::NoAbility;
    };

    let remaining = state.cooldown_remaining(ability);
    if remaining > 0 {
        return AbilityOutcome::Recharging { ability, remaining };
    }

    let outcome = match ability.effect() {
        AbilityEffect::SelfHeal(amount) => {
            state.player.hp = state.player.hp.saturating_add(amount);
            AbilityOutcome::Healed { ability, amount }
        }
        AbilityEffect::AreaDamage { str_bonus } => {
            let damage = state.player.strength.saturating_add(str_bonus);
            strike_room(state, ability, damage, true)
        }
        AbilityEffect::SingleTarget { str_mul, dex_mul } => {
            let damage = state
                .player
                .strength
                .saturating_mul(str_mul)
                .saturating_add(state.player.dexterity.saturating_mul(dex_mul));
            strike_room(state, ability, damage, false)
        }
    };

    if outcome.succeeded() {
        let cooldown = config.cooldown_for(ability);
        if cooldown > 0 {
            state.ability_cooldowns.insert(ability, cooldown);
        }
        tracing::debug!(%ability, cooldown, "ability used");
    }
    outcome
}

fn strike_room(state: &mut GameState, ability: Ability, damage: i32, all: bool) -> AbilityOutcome {
    let location = state.player.location.clone();
    let Some(room) = state.rooms.get_mut(&location) else {
        return AbilityOutcome::NoTarget { ability };
    };

    let mut hits = Vec::new();
    for enemy in room.enemies.iter_mut().filter(|e| e.is_alive()) {
        enemy.hp = enemy.hp.saturating_sub(damage);
        hits.push(Hit {
            enemy: enemy.name.clone(),
            damage,
            defeated: !enemy.is_alive(),
        });
        if !all {
            break;
        }
    }
    if hits.is_empty() {
        return AbilityOutcome::NoTarget { ability };
    }

    let dead = reap(state, &location);
    let (xp_gained, levels_gained) = credit_kills(state, &dead);
    AbilityOutcome::Struck {
        ability,
        hits,
        xp_gained,
        levels_gained,
    }
}
