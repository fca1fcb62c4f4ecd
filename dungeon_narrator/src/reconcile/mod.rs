//! Reconciliation of narrator output into the authoritative state.
//!
//! The narrator proposes, the engine disposes. A turn is reconciled in a
//! fixed order:
//!
//! 1. the turn is appended to history
//! 2. the delta is merged field by field through the tables in [`crate::delta`]
//! 3. the player's location is repaired if it does not name a room
//! 4. a living enemy in the final room punishes a command that ignores it
//!
//! Nothing here fails. Entries that cannot be applied are dropped and
//! reported as [`TurnEvent::DeltaRejected`].

pub mod location;

use dungeon_rules::{enemy_template, Ability, Enemy, GameState, Room, RoomId, RulesConfig};
use serde_json::{json, Map, Value};

use crate::delta::{deep_merge, typed, PlayerField, Rejection, StateField};
use crate::events::TurnEvent;
use crate::narrator::NarratorOutput;

/// Tokens that mean the player is dealing with the enemy in the room.
pub const ENGAGE_TOKENS: [&str; 2] = ["attack", "flee"];

/// What a reconciled turn produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub narrative: String,
    /// The delta entries that were actually applied, with final values for
    /// fields the engine adjusted afterwards.
    pub applied_delta: Map<String, Value>,
    pub events: Vec<TurnEvent>,
}

impl Reconciliation {
    pub fn rejections(&self) -> impl Iterator<Item = &TurnEvent> {
        self.events.iter().filter(|e| e.is_rejection())
    }
}

/// Whether `command` engages an enemy rather than ignoring it.
pub fn engages_enemy(command: &str) -> bool {
    let lowered = command.to_lowercase();
    ENGAGE_TOKENS.iter().any(|token| lowered.contains(token))
}

/// Applies narrator output to a game state.
#[derive(Debug, Clone)]
pub struct Reconciler {
    default_room: RoomId,
}

/// Accumulates what a merge applied and dropped.
#[derive(Default)]
struct MergeLog {
    applied: Map<String, Value>,
    events: Vec<TurnEvent>,
}

impl MergeLog {
    fn reject(&mut self, key: impl Into<String>, reason: Rejection) {
        let key = key.into();
        tracing::debug!(key = %key, %reason, "dropped delta entry");
        self.events.push(TurnEvent::rejected(key, reason));
    }
}

impl Reconciler {
    pub fn new(default_room: RoomId) -> Self {
        Self { default_room }
    }

    pub fn from_config(config: &RulesConfig) -> Self {
        Self::new(config.default_room.clone())
    }

    /// Reconcile one narrated turn into `state`.
    ///
    /// `raw_command` is the player's command as typed; it decides whether the
    /// enemy in the room reacts. The turn counter is not advanced here.
    pub fn apply_turn(
        &self,
        state: &mut GameState,
        raw_command: &str,
        output: &NarratorOutput,
    ) -> Reconciliation {
        let previous = state.player.location.clone();
        let mut log = MergeLog::default();

        state.record(raw_command, output.narrative.clone());

        match output.delta_fields() {
            Some(delta) => self.merge(state, delta, &mut log),
            None if output.state_delta.is_null() => {}
            None => log.reject(
                "state_delta",
                Rejection::TypeMismatch("expected an object".into()),
            ),
        }

        self.settle_location(state, &previous, &mut log);

        let mut narrative = output.narrative.clone();
        if let Some((enemy, damage)) = enemy_reaction(state, raw_command) {
            narrative.push_str(&format!(
                "\nThe {} attacks you for {} damage as you ignore it!",
                enemy, damage
            ));
            player_entry(&mut log.applied).insert("hp".into(), json!(state.player.hp));
            log.events.push(TurnEvent::EnemyReacted { enemy, damage });
        }

        Reconciliation {
            narrative,
            applied_delta: log.applied,
            events: log.events,
        }
    }

    fn merge(&self, state: &mut GameState, delta: &Map<String, Value>, log: &mut MergeLog) {
        for (key, value) in delta {
            let Some(field) = StateField::from_key(key) else {
                log.reject(key.as_str(), Rejection::UnknownField);
                continue;
            };
            if let Some(rejection) = field.access().rejection() {
                log.reject(key.as_str(), rejection);
                continue;
            }
            match field {
                StateField::Player => merge_player(state, value, log),
                StateField::Rooms => merge_rooms(state, value, log),
                StateField::AbilityCooldowns => merge_cooldowns(state, value, log),
                // Not writable; rejected above.
                StateField::Seed | StateField::Turn | StateField::History => {}
            }
        }
    }

    fn settle_location(&self, state: &mut GameState, previous: &RoomId, log: &mut MergeLog) {
        let proposed = state.player.location.clone();
        if let Some(resolution) = location::resolve(state, &proposed, previous, &self.default_room) {
            tracing::warn!(
                proposed = %proposed,
                resolved = %resolution.room,
                via = ?resolution.via,
                "repaired player location"
            );
            state.player.location = resolution.room.clone();
            if let Some(Value::Object(player)) = log.applied.get_mut("player") {
                if player.contains_key("location") {
                    player.insert("location".into(), json!(resolution.room));
                }
            }
            log.events.push(TurnEvent::LocationRepaired {
                proposed: proposed.to_string(),
                resolved: resolution.room,
                via: resolution.via,
            });
        }

        if state.player.location != *previous {
            if let Some(room) = state.current_room_mut() {
                room.visited = true;
            }
        }
    }
}

fn player_entry(applied: &mut Map<String, Value>) -> &mut Map<String, Value> {
    let entry = applied.entry("player").or_insert_with(|| json!({}));
    if !entry.is_object() {
        *entry = json!({});
    }
    entry.as_object_mut().expect("player entry is an object")
}

/// Player fields are written one at a time; the player itself is never
/// replaced, so anything the delta omits keeps its pre-turn value.
fn merge_player(state: &mut GameState, value: &Value, log: &mut MergeLog) {
    let Some(fields) = value.as_object() else {
        log.reject("player", Rejection::TypeMismatch("expected an object".into()));
        return;
    };

    let mut accepted = Map::new();
    for (key, proposed) in fields {
        let path = format!("player.{}", key);
        let Some(field) = PlayerField::from_key(key) else {
            log.reject(path, Rejection::UnknownField);
            continue;
        };
        match field.apply(&mut state.player, proposed) {
            Ok(()) => {
                accepted.insert(key.clone(), proposed.clone());
            }
            Err(rejection) => log.reject(path, rejection),
        }
    }

    if accepted.contains_key("xp") || accepted.contains_key("level") {
        let gained = state.player.give_xp(0);
        let level = state.player.level;
        for reached in (level - gained + 1)..=level {
            log.events.push(TurnEvent::LevelUp { level: reached });
        }
        // Report the post-level-up values instead of the proposed ones.
        if gained > 0 {
            if let Ok(Value::Object(current)) = serde_json::to_value(&state.player) {
                let touched = [PlayerField::Level, PlayerField::Xp, PlayerField::Hp, PlayerField::Str, PlayerField::Dex];
                for field in touched {
                    if let Some(value) = current.get(field.key()) {
                        accepted.insert(field.key().into(), value.clone());
                    }
                }
            }
        }
    }

    if !accepted.is_empty() {
        player_entry(&mut log.applied).extend(accepted);
    }
}

fn merge_rooms(state: &mut GameState, value: &Value, log: &mut MergeLog) {
    let Some(patches) = value.as_object() else {
        log.reject("rooms", Rejection::TypeMismatch("expected an object".into()));
        return;
    };

    let mut accepted = Map::new();
    for (key, patch) in patches {
        let path = format!("rooms.{}", key);
        let id = RoomId::new(key.as_str());
        let Some(current) = state.rooms.get(&id) else {
            log.reject(path, Rejection::UnknownField);
            continue;
        };
        if !patch.is_object() {
            log.reject(path, Rejection::TypeMismatch("expected an object".into()));
            continue;
        }
        match merge_room(current, patch) {
            Ok((room, dropped)) => {
                for reason in dropped {
                    log.reject(format!("{}.enemies", path), Rejection::Invalid(reason));
                }
                state.rooms.insert(id, room);
                accepted.insert(key.clone(), patch.clone());
            }
            Err(rejection) => log.reject(path, rejection),
        }
    }

    if !accepted.is_empty() {
        log.applied.insert("rooms".into(), Value::Object(accepted));
    }
}

/// Deep-merge `patch` into a copy of `current` and sanitise the result.
///
/// The room's type and coordinates never change. Enemy entries are
/// completed from the matching prior enemy or the catalog, entries that
/// cannot be completed are dropped, and dead enemies are removed.
fn merge_room(current: &Room, patch: &Value) -> Result<(Room, Vec<String>), Rejection> {
    let mut merged =
        serde_json::to_value(current).map_err(|e| Rejection::TypeMismatch(e.to_string()))?;
    deep_merge(&mut merged, patch);
    let dropped = complete_enemies(&mut merged, &current.enemies, current.is_boss_room());

    let mut room: Room = typed(&merged)?;
    room.kind = current.kind;
    room.coords = current.coords;
    room.enemies.retain(Enemy::is_alive);
    Ok((room, dropped))
}

fn complete_enemies(merged: &mut Value, previous: &[Enemy], boss_room: bool) -> Vec<String> {
    let Some(Value::Array(entries)) = merged.get_mut("enemies") else {
        return Vec::new();
    };

    let mut dropped = Vec::new();
    let mut kept = Vec::with_capacity(entries.len());
    for (index, entry) in entries.drain(..).enumerate() {
        let Value::Object(mut fields) = entry else {
            dropped.push("enemy entry is not an object".to_string());
            continue;
        };
        let Some(name) = fields.get("name").and_then(Value::as_str).map(str::to_string) else {
            dropped.push("enemy entry has no name".to_string());
            continue;
        };

        let base = match previous.get(index).filter(|prior| prior.name == name) {
            Some(prior) => prior.clone(),
            None => match enemy_template(&name) {
                Some(template) => Enemy::from_template(template),
                None => {
                    dropped.push(format!("unknown enemy '{}'", name));
                    continue;
                }
            },
        };
        if base.is_boss() && !boss_room {
            dropped.push(format!("'{}' only appears in the boss room", name));
            continue;
        }

        if let Ok(Value::Object(defaults)) = serde_json::to_value(&base) {
            for (key, value) in defaults {
                fields.entry(key).or_insert(value);
            }
        }
        fields.insert("max_hp".into(), json!(base.max_hp));
        kept.push(Value::Object(fields));
    }
    *entries = kept;
    dropped
}

fn merge_cooldowns(state: &mut GameState, value: &Value, log: &mut MergeLog) {
    let Some(entries) = value.as_object() else {
        log.reject(
            "ability_cooldowns",
            Rejection::TypeMismatch("expected an object".into()),
        );
        return;
    };

    let mut accepted = Map::new();
    for (key, proposed) in entries {
        let path = format!("ability_cooldowns.{}", key);
        let Ok(ability) = key.parse::<Ability>() else {
            log.reject(path, Rejection::UnknownField);
            continue;
        };
        let remaining: u32 = match typed(proposed) {
            Ok(remaining) => remaining,
            Err(rejection) => {
                log.reject(path, rejection);
                continue;
            }
        };
        if remaining == 0 {
            state.ability_cooldowns.remove(&ability);
        } else {
            state.ability_cooldowns.insert(ability, remaining);
        }
        accepted.insert(ability.to_string(), json!(remaining));
    }

    if !accepted.is_empty() {
        log.applied.insert("ability_cooldowns".into(), Value::Object(accepted));
    }
}

/// The first living enemy in the player's room strikes unless the command
/// engages it. Damage is `max(1, str)` on top of whatever hp the merge left.
fn enemy_reaction(state: &mut GameState, raw_command: &str) -> Option<(String, i32)> {
    if engages_enemy(raw_command) {
        return None;
    }
    let enemy = state.current_room()?.living_enemies().next()?;
    let damage = enemy.strength.max(1);
    let name = enemy.name.clone();
    state.player.hp = state.player.hp.saturating_sub(damage);
    tracing::info!(enemy = %name, damage, hp = state.player.hp, "enemy reacts to being ignored");
    Some((name, damage))
}
