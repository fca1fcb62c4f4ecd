//! World state management - the authoritative snapshot of a game.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::entities::{Coords, Player, Room, RoomId};
use crate::error::{Result, RulesError};
use crate::mechanics::Ability;

/// One narrated turn, kept as narration context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub turn: u64,
    pub command: String,
    pub narrative: String,
}

/// The complete state of a game at any point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Generation seed. Never changes after creation.
    pub seed: u64,

    /// All rooms keyed by id, in natural id order.
    pub rooms: BTreeMap<RoomId, Room>,

    pub player: Player,

    /// Monotonic turn counter.
    pub turn: u64,

    /// Append-only log of narrated turns.
    #[serde(default)]
    pub history: Vec<HistoryEntry>,

    /// Remaining turns per ability. Entries are removed when they reach zero.
    #[serde(default)]
    pub ability_cooldowns: BTreeMap<Ability, u32>,
}

impl GameState {
    /// Create a new game.
    ///
    /// # Panics
    ///
    /// Panics if `rooms` is empty; a dungeon without rooms is a programming error.
    pub fn new(seed: u64, rooms: BTreeMap<RoomId, Room>, player: Player) -> Self {
        assert!(!rooms.is_empty(), "a game state needs at least one room");
        Self {
            seed,
            rooms,
            player,
            turn: 0,
            history: Vec::new(),
            ability_cooldowns: BTreeMap::new(),
        }
    }

    /// The room the player stands in, if the location resolves.
    pub fn current_room(&self) -> Option<&Room> {
        self.rooms.get(&self.player.location)
    }

    pub fn current_room_mut(&mut self) -> Option<&mut Room> {
        self.rooms.get_mut(&self.player.location)
    }

    pub fn has_room(&self, id: &RoomId) -> bool {
        self.rooms.contains_key(id)
    }

    /// Index from coordinates to room id.
    pub fn coord_index(&self) -> HashMap<Coords, RoomId> {
        self.rooms
            .iter()
            .map(|(id, room)| (room.coords, id.clone()))
            .collect()
    }

    /// The id of the boss room, if one exists.
    pub fn boss_room(&self) -> Option<&RoomId> {
        self.rooms
            .iter()
            .find(|(_, room)| room.is_boss_room())
            .map(|(id, _)| id)
    }

    /// Living non-boss enemies across the dungeon.
    pub fn regular_enemy_count(&self) -> usize {
        self.rooms
            .values()
            .flat_map(|room| room.enemies.iter())
            .filter(|e| e.is_alive() && !e.is_boss())
            .count()
    }

    /// Record a narrated turn.
    pub fn record(&mut self, command: impl Into<String>, narrative: impl Into<String>) {
        self.history.push(HistoryEntry {
            turn: self.turn,
            command: command.into(),
            narrative: narrative.into(),
        });
    }

    /// The most recent `window` history entries, oldest first.
    pub fn recent_history(&self, window: usize) -> &[HistoryEntry] {
        let start = self.history.len().saturating_sub(window);
        &self.history[start..]
    }

    /// Advance the turn counter and decay every active cooldown by one.
    pub fn advance_turn(&mut self) {
        self.turn += 1;
        self.tick_cooldowns(1);
    }

    /// Decay cooldowns by `turns`, dropping entries that reach zero.
    pub fn tick_cooldowns(&mut self, turns: u32) {
        self.ability_cooldowns.retain(|_, remaining| {
            *remaining = remaining.saturating_sub(turns);
            *remaining > 0
        });
    }

    /// Remaining cooldown for an ability; zero means ready.
    pub fn cooldown_remaining(&self, ability: Ability) -> u32 {
        self.ability_cooldowns.get(&ability).copied().unwrap_or(0)
    }

    /// Render the explored map: `@` player, `.` visited, `#` unexplored.
    pub fn render_map(&self) -> String {
        let Some((min, max)) = self.bounds() else {
            return String::new();
        };
        let index = self.coord_index();
        let player_coords = self.current_room().map(|r| r.coords);

        let mut out = String::new();
        for y in min.y..=max.y {
            let row: Vec<&str> = (min.x..=max.x)
                .map(|x| {
                    let here = Coords::new(x, y);
                    if Some(here) == player_coords {
                        "@"
                    } else if index
                        .get(&here)
                        .and_then(|id| self.rooms.get(id))
                        .is_some_and(|room| room.visited)
                    {
                        "."
                    } else {
                        "#"
                    }
                })
                .collect();
            out.push_str(&row.join(" "));
            out.push('\n');
        }
        out
    }

    fn bounds(&self) -> Option<(Coords, Coords)> {
        let mut coords = self.rooms.values().map(|r| r.coords);
        let first = coords.next()?;
        Some(coords.fold((first, first), |(min, max), c| {
            (
                Coords::new(min.x.min(c.x), min.y.min(c.y)),
                Coords::new(max.x.max(c.x), max.y.max(c.y)),
            )
        }))
    }

    /// Serialize to pretty JSON for saving.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Restore a saved game.
    ///
    /// A save without rooms, or whose player stands in a room that does not
    /// exist, is rejected.
    pub fn from_json(source: &str) -> Result<Self> {
        let state: GameState = serde_json::from_str(source)?;
        if state.rooms.is_empty() {
            return Err(RulesError::EmptyDungeon);
        }
        if !state.has_room(&state.player.location) {
            return Err(RulesError::UnknownRoom(state.player.location.to_string()));
        }
        Ok(state)
    }
}
