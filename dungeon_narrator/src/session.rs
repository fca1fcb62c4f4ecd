//! A game session: one dungeon, one player, one narrator.
//!
//! [`GameSession::submit`] runs a whole turn. Meta-commands are answered
//! locally and never advance the turn. Everything else goes through the
//! narrator on a copy of the state, which is committed only once the
//! narrator has replied; a timeout or narrator failure leaves the session
//! exactly as it was.

use std::fs;
use std::io::ErrorKind;
use std::sync::Arc;

use dungeon_rules::generation::new_game;
use dungeon_rules::{ai, combat, GameRng, GameState, HeroPreset, Room};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::commands::{is_movement_like, run_local, Command, MetaCommand};
use crate::config::SessionConfig;
use crate::context_assembler::{AssemblerConfig, ContextAssembler};
use crate::error::{Result, SessionError};
use crate::events::TurnEvent;
use crate::narrator::{narrate_with_timeout, Narrator};
use crate::reconcile::Reconciler;

/// What one call to [`GameSession::submit`] produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnOutcome {
    pub narrative: String,
    pub applied_delta: Map<String, Value>,
    pub options: Vec<String>,
    pub force_option_select: bool,
    /// The d20 rolled this turn, if any.
    pub roll: Option<i32>,
    pub events: Vec<TurnEvent>,
    /// True when the narrator was consulted and the turn advanced.
    pub narrated: bool,
    pub quit: bool,
}

impl TurnOutcome {
    fn local(message: impl Into<String>) -> Self {
        Self {
            narrative: message.into(),
            ..Self::default()
        }
    }
}

/// Per-session context. Owns the authoritative state.
pub struct GameSession {
    id: Uuid,
    state: GameState,
    config: SessionConfig,
    narrator: Arc<dyn Narrator>,
    assembler: ContextAssembler,
    reconciler: Reconciler,
    rng: GameRng,
    narrator_calls: u64,
    autoroll: bool,
    pending_options: Vec<String>,
}

impl GameSession {
    /// Resume a session from an existing state.
    pub fn new(state: GameState, config: SessionConfig, narrator: Arc<dyn Narrator>, rng: GameRng) -> Self {
        let id = Uuid::new_v4();
        tracing::info!(session = %id, seed = state.seed, turn = state.turn, "session started");
        Self {
            id,
            assembler: ContextAssembler::new(AssemblerConfig {
                history_window: config.narrator.history_window,
            }),
            reconciler: Reconciler::from_config(&config.rules),
            autoroll: config.autoroll,
            state,
            config,
            narrator,
            rng,
            narrator_calls: 0,
            pending_options: Vec::new(),
        }
    }

    /// Generate a fresh dungeon from `seed` and start playing it.
    pub fn start(
        seed: u64,
        hero: Option<&HeroPreset>,
        config: SessionConfig,
        narrator: Arc<dyn Narrator>,
    ) -> Self {
        let state = new_game(seed, &config.rules, hero);
        // Spawns draw from their own stream so they do not replay generation.
        let rng = GameRng::new(seed.wrapping_add(1));
        Self::new(state, config, narrator, rng)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Number of narrator calls made, including failed ones.
    pub fn narrator_calls(&self) -> u64 {
        self.narrator_calls
    }

    pub fn autoroll(&self) -> bool {
        self.autoroll
    }

    /// Options offered by the narrator's last reply.
    pub fn pending_options(&self) -> &[String] {
        &self.pending_options
    }

    /// Run one line of player input.
    pub fn submit(&mut self, input: &str) -> Result<TurnOutcome> {
        let span = tracing::info_span!("turn", session = %self.id, turn = self.state.turn);
        let _enter = span.enter();

        match Command::parse(input) {
            Command::Meta(meta) => self.run_meta(meta),
            Command::Narrated(command) if command.is_empty() => Ok(TurnOutcome::default()),
            Command::Narrated(command) => {
                let command = self.select_option(&command);
                self.run_narrated(&command)
            }
        }
    }

    /// A bare number picks one of the pending options.
    fn select_option(&self, command: &str) -> String {
        command
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| self.pending_options.get(index))
            .map(|option| strip_option_number(option).to_string())
            .unwrap_or_else(|| command.to_string())
    }

    fn run_meta(&mut self, meta: MetaCommand) -> Result<TurnOutcome> {
        let outcome = match meta {
            MetaCommand::AutoRoll => {
                self.autoroll = !self.autoroll;
                TurnOutcome::local(format!(
                    "Auto-roll is now {}.",
                    if self.autoroll { "on" } else { "off" }
                ))
            }
            MetaCommand::Save => self.save()?,
            MetaCommand::Load => self.load()?,
            MetaCommand::Quit => TurnOutcome {
                quit: true,
                ..TurnOutcome::local("Farewell, adventurer.")
            },
            other => TurnOutcome::local(
                run_local(&other, &mut self.state, &self.config.rules).unwrap_or_default(),
            ),
        };
        Ok(outcome)
    }

    fn save(&self) -> Result<TurnOutcome> {
        let Some(path) = &self.config.save_path else {
            return Ok(TurnOutcome::local("Saving is not configured."));
        };
        fs::write(path, self.state.to_json()?)?;
        tracing::info!(path = %path.display(), turn = self.state.turn, "game saved");
        Ok(TurnOutcome::local("Game saved."))
    }

    fn load(&mut self) -> Result<TurnOutcome> {
        let Some(path) = &self.config.save_path else {
            return Ok(TurnOutcome::local("Saving is not configured."));
        };
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Ok(TurnOutcome::local("No saved game found."));
            }
            Err(err) => return Err(err.into()),
        };
        self.state = GameState::from_json(&source)?;
        self.pending_options.clear();
        tracing::info!(path = %path.display(), turn = self.state.turn, "game loaded");
        Ok(TurnOutcome::local("Game loaded."))
    }

    fn run_narrated(&mut self, command: &str) -> Result<TurnOutcome> {
        if !self.state.player.is_alive() {
            return Err(SessionError::PlayerDead);
        }

        let mut working = self.state.clone();
        let mut rng = self.rng.clone();
        let mut events = Vec::new();
        let mut prelude = Vec::new();

        let roll = if command.to_lowercase().contains("attack")
            && working.current_room().is_some_and(Room::has_living_enemy)
        {
            let roll = rng.d20();
            if let Some(report) = combat::attack_first(&mut working, roll) {
                prelude.push(report.to_string());
                push_level_ups(&mut events, working.player.level, report.levels_gained);
                events.push(TurnEvent::PlayerAttacked(report));
            }
            Some(roll)
        } else if self.autoroll && !is_movement_like(command) {
            Some(rng.d20())
        } else {
            None
        };

        let request = self.assembler.assemble(self.id, &working, command, roll);
        self.narrator_calls += 1;
        let output = narrate_with_timeout(
            Arc::clone(&self.narrator),
            request,
            self.config.narrator.timeout(),
        )?;

        let reconciliation = self.reconciler.apply_turn(&mut working, command, &output);
        events.extend(reconciliation.events);

        events.extend(ai::step_enemies(&mut working).into_iter().map(TurnEvent::EnemyMoved));
        events.extend(
            ai::ensure_minimum_population(&mut working, self.config.rules.min_population, &mut rng)
                .into_iter()
                .map(TurnEvent::EnemySpawned),
        );

        working.advance_turn();
        if !working.player.is_alive() {
            tracing::info!(turn = working.turn, "player died");
            events.push(TurnEvent::PlayerDied);
        }

        prelude.push(reconciliation.narrative);
        self.state = working;
        self.rng = rng;
        self.pending_options = output.options.clone();

        tracing::debug!(events = events.len(), "turn committed");
        Ok(TurnOutcome {
            narrative: prelude.join("\n"),
            applied_delta: reconciliation.applied_delta,
            options: output.options,
            force_option_select: output.force_option_select,
            roll,
            events,
            narrated: true,
            quit: false,
        })
    }
}

fn push_level_ups(events: &mut Vec<TurnEvent>, level: u32, gained: u32) {
    for reached in (level - gained + 1)..=level {
        events.push(TurnEvent::LevelUp { level: reached });
    }
}

/// `"2. Flee"` becomes `"Flee"`.
fn strip_option_number(option: &str) -> &str {
    let trimmed = option.trim();
    match trimmed.split_once('.') {
        Some((number, rest)) if !number.is_empty() && number.chars().all(|c| c.is_ascii_digit()) => {
            rest.trim()
        }
        _ => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NarratorError;
    use crate::testing::ScriptedNarrator;
    use dungeon_rules::{Ability, Coords, Enemy, Player, RoomId, RoomType};
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::time::Duration;

    /// Rooms `room_0`..`room_{len-1}` in a row, player at the west end.
    fn corridor(len: usize) -> GameState {
        let mut rooms = BTreeMap::new();
        for i in 0..len {
            let kind = if i == 0 { RoomType::Entrance } else { RoomType::Corridor };
            let mut room = Room::new(kind, Coords::new(i as i32, 0));
            room.visited = i == 0;
            rooms.insert(RoomId::from_index(i), room);
        }
        GameState::new(5, rooms, Player::new(RoomId::from_index(0)))
    }

    fn config() -> SessionConfig {
        let mut config = SessionConfig::default();
        config.rules.min_population = 0;
        config.narrator.timeout_ms = 2_000;
        config
    }

    fn session(state: GameState, config: SessionConfig, narrator: &Arc<ScriptedNarrator>) -> GameSession {
        GameSession::new(state, config, narrator.clone(), GameRng::new(99))
    }

    fn quiet(narrative: &str) -> Value {
        json!({"narrative": narrative, "state_delta": {}})
    }

    #[test]
    fn test_meta_commands_skip_narrator() {
        let narrator = Arc::new(ScriptedNarrator::new());
        let mut session = session(corridor(3), config(), &narrator);

        for input in ["/stats", "/look", "/map", "/inventory", "/help", "/bogus"] {
            let outcome = session.submit(input).unwrap();
            assert!(!outcome.narrated);
            assert!(!outcome.narrative.is_empty(), "{} gave no reply", input);
        }
        assert_eq!(narrator.call_count(), 0);
        assert_eq!(session.narrator_calls(), 0);
        assert_eq!(session.state().turn, 0);
    }

    #[test]
    fn test_narrated_turn_commits() {
        let narrator = Arc::new(ScriptedNarrator::new().reply(json!({
            "narrative": "You step east.",
            "state_delta": {"player": {"location": "room_1", "hp": 17}}
        })));
        let mut session = session(corridor(3), config(), &narrator);

        let outcome = session.submit("walk east").unwrap();

        assert!(outcome.narrated);
        assert_eq!(outcome.narrative, "You step east.");
        assert_eq!(outcome.roll, None);
        let state = session.state();
        assert_eq!(state.turn, 1);
        assert_eq!(state.player.location, RoomId::from_index(1));
        assert_eq!(state.player.hp, 17);
        assert!(state.rooms[&RoomId::from_index(1)].visited);
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.history[0].command, "walk east");
        assert_eq!(session.narrator_calls(), 1);
        assert_eq!(narrator.requests()[0].command, "[BRIEF] walk east");
    }

    #[test]
    fn test_timeout_leaves_state_unchanged() {
        let narrator = Arc::new(
            ScriptedNarrator::new()
                .reply(json!({"narrative": "Too late.", "state_delta": {"player": {"hp": 1}}}))
                .with_delay(Duration::from_millis(300)),
        );
        let mut config = config();
        config.narrator.timeout_ms = 20;
        config.autoroll = true;
        let mut session = session(corridor(3), config, &narrator);
        let before = session.state().clone();

        let result = session.submit("search the walls");

        assert!(matches!(
            result,
            Err(SessionError::Narrator(NarratorError::Timeout(_)))
        ));
        assert_eq!(session.state(), &before);
        assert_eq!(session.narrator_calls(), 1);
    }

    #[test]
    fn test_failure_leaves_state_unchanged() {
        let narrator = Arc::new(
            ScriptedNarrator::new().fail(NarratorError::Transport("connection reset".into())),
        );
        let mut state = corridor(3);
        state.rooms.get_mut(&RoomId::from_index(0)).unwrap().enemies.push(Enemy::spawn("goblin"));
        let mut session = session(state, config(), &narrator);
        let before = session.state().clone();

        let result = session.submit("attack");
        assert!(matches!(result, Err(SessionError::Narrator(NarratorError::Transport(_)))));
        assert_eq!(session.state(), &before);

        // The retry succeeds on the untouched state.
        let outcome = session.submit("attack").unwrap();
        assert!(outcome.roll.is_some());
        assert_eq!(session.state().turn, 1);
    }

    #[test]
    fn test_attack_resolves_locally() {
        let narrator = Arc::new(ScriptedNarrator::new().reply(quiet("The slime bursts.")));
        let mut state = corridor(3);
        state.player.strength = 10;
        state.rooms.get_mut(&RoomId::from_index(0)).unwrap().enemies.push(Enemy::spawn("slime"));
        let mut session = session(state, config(), &narrator);

        let outcome = session.submit("attack the slime").unwrap();

        let roll = outcome.roll.unwrap();
        assert!((1..=20).contains(&roll));
        assert_eq!(narrator.requests()[0].roll_result, Some(roll));
        assert!(outcome.narrative.starts_with(&format!("You rolled a {}", roll)));
        assert!(outcome.narrative.ends_with("The slime bursts."));
        assert!(outcome.events.iter().any(|e| matches!(e, TurnEvent::PlayerAttacked(r) if r.hit.defeated)));

        let state = session.state();
        let room = &state.rooms[&RoomId::from_index(0)];
        assert!(room.enemies.is_empty());
        assert_eq!(room.items, vec!["gelatin goop"]);
        assert_eq!(state.player.xp, 10);
        assert_eq!(state.player.hp, 20);
    }

    #[test]
    fn test_ignored_enemy_hurts() {
        let narrator = Arc::new(ScriptedNarrator::new().reply(json!({
            "narrative": "You admire the ceiling.",
            "state_delta": {"player": {"hp": 19}}
        })));
        let mut state = corridor(3);
        state.rooms.get_mut(&RoomId::from_index(0)).unwrap().enemies.push(Enemy::spawn("orc"));
        let mut session = session(state, config(), &narrator);

        let outcome = session.submit("look around").unwrap();

        assert_eq!(session.state().player.hp, 15);
        assert_eq!(outcome.applied_delta["player"]["hp"], json!(15));
        assert_eq!(session.state().rooms[&RoomId::from_index(0)].enemies[0].hp, 18);
    }

    #[test]
    fn test_enemies_move_after_merge() {
        let narrator = Arc::new(ScriptedNarrator::new());
        let mut state = corridor(4);
        state.rooms.get_mut(&RoomId::from_index(3)).unwrap().enemies.push(Enemy::spawn("goblin"));
        let mut session = session(state, config(), &narrator);

        let outcome = session.submit("wait").unwrap();

        assert!(outcome.events.contains(&TurnEvent::EnemyMoved(ai::EnemyMove {
            enemy: "goblin".into(),
            from: RoomId::from_index(3),
            to: RoomId::from_index(2),
        })));
        assert!(session.state().rooms[&RoomId::from_index(3)].enemies.is_empty());
        assert_eq!(session.state().rooms[&RoomId::from_index(2)].enemies.len(), 1);
    }

    #[test]
    fn test_population_is_maintained() {
        let narrator = Arc::new(ScriptedNarrator::new());
        let mut config = config();
        config.rules.min_population = 2;
        let mut session = session(corridor(5), config, &narrator);

        let outcome = session.submit("wait").unwrap();

        let spawned = outcome
            .events
            .iter()
            .filter(|e| matches!(e, TurnEvent::EnemySpawned(_)))
            .count();
        assert_eq!(spawned, 2);
        assert_eq!(session.state().regular_enemy_count(), 2);
        assert!(session.state().rooms[&RoomId::from_index(0)].enemies.is_empty());
    }

    #[test]
    fn test_option_selection() {
        let narrator = Arc::new(ScriptedNarrator::new().reply(json!({
            "narrative": "A goblin lunges!\n1. Attack\n2. Flee",
            "state_delta": {},
            "force_option_select": true
        })));
        let mut session = session(corridor(3), config(), &narrator);

        let outcome = session.submit("open the door").unwrap();
        assert!(outcome.force_option_select);
        assert_eq!(session.pending_options(), ["1. Attack", "2. Flee"]);

        session.submit("2").unwrap();
        assert_eq!(narrator.requests()[1].command, "[BRIEF] Flee");
        assert!(session.pending_options().is_empty());

        session.submit("7").unwrap();
        assert_eq!(narrator.requests()[2].command, "7");
    }

    #[test]
    fn test_autoroll() {
        let narrator = Arc::new(ScriptedNarrator::new());
        let mut session = session(corridor(3), config(), &narrator);

        assert_eq!(session.submit("search the walls").unwrap().roll, None);

        let toggled = session.submit("/autoroll").unwrap();
        assert_eq!(toggled.narrative, "Auto-roll is now on.");
        assert!(session.autoroll());

        assert!(session.submit("search the walls").unwrap().roll.is_some());
        assert_eq!(session.submit("go east").unwrap().roll, None);
        assert!(narrator.requests()[1].roll_result.is_some());
    }

    #[test]
    fn test_ability_cooldown_across_turns() {
        let narrator = Arc::new(ScriptedNarrator::new());
        let mut state = corridor(3);
        state.player.ability = Some(Ability::Heal);
        let mut session = session(state, config(), &narrator);

        let used = session.submit("/ability").unwrap();
        assert_eq!(used.narrative, "You channel divine power and heal 10 HP.");
        assert_eq!(session.state().player.hp, 30);
        assert_eq!(session.state().cooldown_remaining(Ability::Heal), 3);

        session.submit("rest").unwrap();
        session.submit("rest").unwrap();
        assert_eq!(session.state().cooldown_remaining(Ability::Heal), 1);
        assert_eq!(
            session.submit("/ability").unwrap().narrative,
            "Your heal is recharging (1 turn left)."
        );
        assert_eq!(session.state().player.hp, 30);

        session.submit("rest").unwrap();
        assert_eq!(session.state().cooldown_remaining(Ability::Heal), 0);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("dungeon-save-{}.json", Uuid::new_v4()));
        let mut config = config();
        config.save_path = Some(path.clone());
        let narrator = Arc::new(ScriptedNarrator::new().reply(json!({
            "narrative": "Ouch.",
            "state_delta": {"player": {"hp": 5}}
        })));
        let mut session = session(corridor(3), config, &narrator);

        assert_eq!(session.submit("/load").unwrap().narrative, "No saved game found.");
        assert_eq!(session.submit("/save").unwrap().narrative, "Game saved.");
        let saved = session.state().clone();

        session.submit("touch the spikes").unwrap();
        assert_eq!(session.state().player.hp, 5);

        assert_eq!(session.submit("/load").unwrap().narrative, "Game loaded.");
        assert_eq!(session.state(), &saved);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_save_without_path() {
        let narrator = Arc::new(ScriptedNarrator::new());
        let mut session = session(corridor(3), config(), &narrator);
        assert_eq!(session.submit("/save").unwrap().narrative, "Saving is not configured.");
    }

    #[test]
    fn test_dead_player() {
        let narrator = Arc::new(ScriptedNarrator::new().reply(json!({
            "narrative": "The ceiling collapses.",
            "state_delta": {"player": {"hp": 0}}
        })));
        let mut session = session(corridor(3), config(), &narrator);

        let outcome = session.submit("pull the lever").unwrap();
        assert!(outcome.events.contains(&TurnEvent::PlayerDied));

        assert!(matches!(session.submit("get up"), Err(SessionError::PlayerDead)));
        assert!(session.submit("/stats").unwrap().narrative.starts_with("HP 0"));
        assert_eq!(narrator.call_count(), 1);
    }

    #[test]
    fn test_quit() {
        let narrator = Arc::new(ScriptedNarrator::new());
        let mut session = session(corridor(3), config(), &narrator);
        assert!(session.submit("/quit").unwrap().quit);
        assert!(session.submit("/exit").unwrap().quit);
    }

    #[test]
    fn test_start_generates_dungeon() {
        let narrator = Arc::new(ScriptedNarrator::new());
        let session = GameSession::start(1337, None, SessionConfig::default(), narrator);
        assert_eq!(session.state().rooms.len(), 36);
        assert_eq!(session.state().seed, 1337);
        assert_eq!(session.state().player.location, RoomId::from_index(0));
    }

    #[test]
    fn test_strip_option_number() {
        assert_eq!(strip_option_number("2. Flee"), "Flee");
        assert_eq!(strip_option_number(" Attack it "), "Attack it");
        assert_eq!(strip_option_number("Dr. Who"), "Dr. Who");
    }
}
