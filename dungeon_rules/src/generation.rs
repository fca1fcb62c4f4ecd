//! Seeded dungeon generation.
//!
//! Randomness is drawn in a fixed order so that a seed always reproduces the
//! same dungeon. For each cell, in row-major order:
//!
//! 1. room type (skipped for the entrance, which is forced)
//! 2. trap coin-flip, only when the type is `trap`
//! 3. enemy chance, then catalog pick, only for `corridor` and `enemy_lair`
//! 4. item chance, then loot pick
//!
//! The linear variant draws `x` then `y` right after the room type, and picks
//! the boss room last.

use std::collections::BTreeMap;

use crate::config::RulesConfig;
use crate::dice::GameRng;
use crate::entities::{regular_enemies, Coords, Enemy, Player, Room, RoomId, RoomType};
use crate::mechanics::HeroPreset;
use crate::world_state::GameState;

/// Items that may lie around in rooms.
pub const LOOT_TABLE: [&str; 5] = [
    "health potion",
    "silver key",
    "torch",
    "old map piece",
    "leather boots",
];

/// Chance for a corridor or lair to hold an enemy.
pub const ENEMY_CHANCE: f64 = 0.6;

/// Chance for any room to hold one loot item.
pub const ITEM_CHANCE: f64 = 0.5;

/// Extent of the coordinate square used by the linear variant.
pub const LINEAR_EXTENT: i32 = 6;

fn populate_room(rng: &mut GameRng, kind: RoomType, coords: Coords) -> Room {
    let mut room = Room::new(kind, coords);
    room.trap = kind == RoomType::Trap && rng.coin_flip();

    if kind.may_hold_enemy() && rng.chance(ENEMY_CHANCE) {
        if let Some(template) = rng.choose(regular_enemies()) {
            room.enemies.push(Enemy::from_template(template));
        }
    }
    if rng.chance(ITEM_CHANCE) {
        if let Some(item) = rng.choose(&LOOT_TABLE) {
            room.items.push(item.to_string());
        }
    }
    room
}

fn draw_room_type(rng: &mut GameRng) -> RoomType {
    *rng
        .choose(&RoomType::RANDOM_POOL)
        .expect("room type pool is not empty")
}

fn install_boss(rooms: &mut BTreeMap<RoomId, Room>, boss_id: &RoomId) {
    let room = rooms
        .get_mut(boss_id)
        .expect("boss room was chosen from generated rooms");
    room.kind = RoomType::BossRoom;
    room.enemies = vec![Enemy::boss()];
}

/// Generate a `width` x `height` grid dungeon.
///
/// The entrance sits at the origin and starts visited; the boss waits in the
/// last cell.
///
/// # Panics
///
/// Panics if the grid has fewer than two cells.
pub fn generate(seed: u64, width: u32, height: u32) -> BTreeMap<RoomId, Room> {
    let cells = width as usize * height as usize;
    assert!(
        cells >= 2,
        "a dungeon needs at least two rooms, got {}x{}",
        width,
        height
    );

    let mut rng = GameRng::new(seed);
    let mut rooms = BTreeMap::new();

    for y in 0..height {
        for x in 0..width {
            let index = (y * width + x) as usize;
            let coords = Coords::new(x as i32, y as i32);
            let kind = if index == 0 {
                RoomType::Entrance
            } else {
                draw_room_type(&mut rng)
            };
            let mut room = populate_room(&mut rng, kind, coords);
            room.visited = index == 0;
            rooms.insert(RoomId::from_index(index), room);
        }
    }

    let boss_id = RoomId::from_index(cells - 1);
    install_boss(&mut rooms, &boss_id);

    tracing::debug!(seed, rooms = rooms.len(), boss_room = %boss_id, "generated grid dungeon");
    rooms
}

/// Generate `room_count` rooms at random coordinates.
///
/// Coordinates may repeat in this variant. The boss room is chosen uniformly
/// among the non-entrance rooms.
///
/// # Panics
///
/// Panics if `room_count` is below two.
pub fn generate_linear(seed: u64, room_count: usize) -> BTreeMap<RoomId, Room> {
    assert!(
        room_count >= 2,
        "a dungeon needs at least two rooms, got {}",
        room_count
    );

    let mut rng = GameRng::new(seed);
    let mut rooms = BTreeMap::new();

    for index in 0..room_count {
        let kind = if index == 0 {
            RoomType::Entrance
        } else {
            draw_room_type(&mut rng)
        };
        let x = rng.range_inclusive(0, LINEAR_EXTENT - 1);
        let y = rng.range_inclusive(0, LINEAR_EXTENT - 1);
        let room = populate_room(&mut rng, kind, Coords::new(x, y));
        rooms.insert(RoomId::from_index(index), room);
    }

    let candidates: Vec<RoomId> = (1..room_count).map(RoomId::from_index).collect();
    let boss_id = rng
        .choose(&candidates)
        .cloned()
        .expect("at least one non-entrance room");
    install_boss(&mut rooms, &boss_id);

    if let Some(entrance) = rooms.get_mut(&RoomId::from_index(0)) {
        entrance.visited = true;
    }

    tracing::debug!(seed, rooms = rooms.len(), boss_room = %boss_id, "generated linear dungeon");
    rooms
}

/// Start a new game on a grid sized by `config`.
pub fn new_game(seed: u64, config: &RulesConfig, hero: Option<&HeroPreset>) -> GameState {
    let rooms = generate(seed, config.grid_width, config.grid_height);
    let start = RoomId::from_index(0);
    let player = match hero {
        Some(preset) => Player::from_hero(preset, start),
        None => Player::new(start),
    };
    GameState::new(seed, rooms, player)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::BOSS_TAG;
    use proptest::prelude::*;

    fn boss_rooms(rooms: &BTreeMap<RoomId, Room>) -> Vec<&Room> {
        rooms.values().filter(|r| r.kind == RoomType::BossRoom).collect()
    }

    #[test]
    fn test_grid_layout() {
        let rooms = generate(1337, 6, 6);
        assert_eq!(rooms.len(), 36);

        let entrance = &rooms[&RoomId::from_index(0)];
        assert_eq!(entrance.kind, RoomType::Entrance);
        assert_eq!(entrance.coords, Coords::new(0, 0));
        assert!(entrance.visited);

        let last = &rooms[&RoomId::from_index(35)];
        assert_eq!(last.coords, Coords::new(5, 5));
        assert_eq!(last.kind, RoomType::BossRoom);
        assert_eq!(last.enemies.len(), 1);
        assert_eq!(last.enemies[0].name, BOSS_TAG);
        assert_eq!(last.enemies[0].max_hp, 35);
    }

    #[test]
    fn test_grid_coords_unique() {
        let rooms = generate(5, 4, 3);
        let mut coords: Vec<_> = rooms.values().map(|r| r.coords).collect();
        coords.sort();
        coords.dedup();
        assert_eq!(coords.len(), 12);
    }

    #[test]
    fn test_only_lairs_and_corridors_hold_regular_enemies() {
        for seed in 0..20 {
            for room in generate(seed, 6, 6).values() {
                if room.kind == RoomType::BossRoom {
                    continue;
                }
                assert!(room.enemies.len() <= 1);
                if !room.enemies.is_empty() {
                    assert!(room.kind.may_hold_enemy());
                }
                assert!(room.items.len() <= 1);
            }
        }
    }

    #[test]
    fn test_flags_follow_type() {
        for seed in 0..20 {
            for room in generate(seed, 6, 6).values() {
                if room.trap {
                    assert_ne!(room.kind, RoomType::Entrance);
                }
                if room.kind == RoomType::Locked {
                    assert!(room.locked);
                }
            }
        }
    }

    #[test]
    fn test_linear_boss_never_at_entrance() {
        for seed in 0..30 {
            let rooms = generate_linear(seed, 12);
            assert_eq!(rooms.len(), 12);
            assert_eq!(boss_rooms(&rooms).len(), 1);
            let entrance = &rooms[&RoomId::from_index(0)];
            assert_eq!(entrance.kind, RoomType::Entrance);
            assert!(entrance.visited);
        }
    }

    #[test]
    #[should_panic(expected = "at least two rooms")]
    fn test_zero_rooms_is_fatal() {
        generate(1, 0, 4);
    }

    #[test]
    fn test_new_game_places_player_at_entrance() {
        let state = new_game(7, &RulesConfig::default(), None);
        assert_eq!(state.player.location, RoomId::from_index(0));
        assert_eq!(state.turn, 0);
        assert_eq!(state.seed, 7);
    }

    proptest! {
        #[test]
        fn prop_generation_is_deterministic(seed in any::<u64>(), w in 2u32..8, h in 1u32..8) {
            prop_assert_eq!(generate(seed, w, h), generate(seed, w, h));
        }

        #[test]
        fn prop_exactly_one_boss(seed in any::<u64>(), w in 2u32..8, h in 1u32..8) {
            let rooms = generate(seed, w, h);
            let bosses = boss_rooms(&rooms);
            prop_assert_eq!(bosses.len(), 1);
            prop_assert_eq!(bosses[0].enemies.len(), 1);
            prop_assert_eq!(bosses[0].enemies[0].name.as_str(), BOSS_TAG);
            prop_assert!(rooms[&RoomId::from_index(0)].visited);
        }

        #[test]
        fn prop_linear_is_deterministic(seed in any::<u64>(), n in 2usize..20) {
            prop_assert_eq!(generate_linear(seed, n), generate_linear(seed, n));
        }
    }
}
