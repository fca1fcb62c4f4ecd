//! Enemy AI: pursuit movement and population maintenance.
//!
//! Rooms are processed in natural id order and enemies in room order, so a
//! movement pass is fully determined by the state it starts from.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::dice::GameRng;
use crate::entities::{regular_enemies, Coords, Enemy, RoomId};
use crate::world_state::GameState;

/// One enemy stepping into a neighbouring room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnemyMove {
    pub enemy: String,
    pub from: RoomId,
    pub to: RoomId,
}

/// A freshly spawned enemy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnemySpawn {
    pub enemy: String,
    pub room: RoomId,
}

/// First cell on a shortest 4-connected path from `start` to `goal`.
///
/// Only cells that exist in `index` are walkable. Returns `None` when already
/// at the goal or when the goal is unreachable.
fn next_step<F>(index: &HashMap<Coords, RoomId>, start: Coords, goal: Coords, blocked: F) -> Option<Coords>
where
    F: Fn(&Coords) -> bool,
{
    if start == goal {
        return None;
    }

    let mut queue = VecDeque::from([start]);
    let mut came_from: HashMap<Coords, Coords> = HashMap::new();
    let mut seen: HashSet<Coords> = HashSet::from([start]);

    while let Some(current) = queue.pop_front() {
        if current == goal {
            break;
        }
        for next in current.neighbours() {
            if !index.contains_key(&next) || blocked(&next) || !seen.insert(next) {
                continue;
            }
            came_from.insert(next, current);
            queue.push_back(next);
        }
    }

    // Walk back from the goal to the cell right after `start`.
    let mut cursor = goal;
    loop {
        let previous = *came_from.get(&cursor)?;
        if previous == start {
            return Some(cursor);
        }
        cursor = previous;
    }
}

struct PlannedMove {
    order: usize,
    from: RoomId,
    index: usize,
    to: RoomId,
}

/// Move every non-boss enemy one step toward the player.
///
/// Occupied cells (any room holding a regular enemy) and the boss cell block
/// pathing. An enemy only moves into a room that currently holds no enemy;
/// otherwise it stays put. Occupancy is updated as each enemy resolves, so two
/// enemies never enter the same room in one pass. Bosses never move.
pub fn step_enemies(state: &mut GameState) -> Vec<EnemyMove> {
    let Some(player_cell) = state.current_room().map(|r| r.coords) else {
        return Vec::new();
    };
    let index = state.coord_index();

    let boss_cells: HashSet<Coords> = state
        .rooms
        .values()
        .filter(|room| room.is_boss_room() || room.enemies.iter().any(Enemy::is_boss))
        .map(|room| room.coords)
        .collect();
    let mut occupied: HashSet<Coords> = state
        .rooms
        .values()
        .filter(|room| room.has_regular_enemy())
        .map(|room| room.coords)
        .collect();
    let mut occupants: HashMap<RoomId, usize> = state
        .rooms
        .iter()
        .map(|(id, room)| (id.clone(), room.enemies.len()))
        .collect();

    let mut planned = Vec::new();
    for (room_id, room) in &state.rooms {
        for (slot, enemy) in room.enemies.iter().enumerate() {
            if enemy.is_boss() {
                continue;
            }
            let start = room.coords;
            occupied.remove(&start);

            let step = next_step(&index, start, player_cell, |cell| {
                occupied.contains(cell) || boss_cells.contains(cell)
            });
            let destination = step.and_then(|cell| index.get(&cell).map(|id| (cell, id)));

            match destination {
                Some((cell, dest_id)) if occupants.get(dest_id).copied().unwrap_or(0) == 0 => {
                    planned.push(PlannedMove {
                        order: planned.len(),
                        from: room_id.clone(),
                        index: slot,
                        to: dest_id.clone(),
                    });
                    if let Some(count) = occupants.get_mut(room_id) {
                        *count -= 1;
                        if *count > 0 {
                            occupied.insert(start);
                        }
                    }
                    *occupants.entry(dest_id.clone()).or_default() += 1;
                    occupied.insert(cell);
                }
                _ => {
                    occupied.insert(start);
                }
            }
        }
    }

    apply_moves(state, planned)
}

fn apply_moves(state: &mut GameState, mut planned: Vec<PlannedMove>) -> Vec<EnemyMove> {
    // Remove from the back of each room first so earlier indices stay valid.
    planned.sort_by(|a, b| a.from.cmp(&b.from).then(b.index.cmp(&a.index)));

    let mut in_transit: Vec<(usize, RoomId, RoomId, Enemy)> = Vec::with_capacity(planned.len());
    for mv in planned {
        if let Some(room) = state.rooms.get_mut(&mv.from) {
            if mv.index < room.enemies.len() {
                let enemy = room.enemies.remove(mv.index);
                in_transit.push((mv.order, mv.from, mv.to, enemy));
            }
        }
    }
    in_transit.sort_by_key(|(order, ..)| *order);

    let mut moves = Vec::with_capacity(in_transit.len());
    for (_, from, to, enemy) in in_transit {
        tracing::debug!(enemy = %enemy.name, %from, %to, "enemy moved");
        moves.push(EnemyMove {
            enemy: enemy.name.clone(),
            from,
            to: to.clone(),
        });
        if let Some(room) = state.rooms.get_mut(&to) {
            room.enemies.push(enemy);
        }
    }
    moves
}

/// Spawn regular enemies until at least `minimum` are alive.
///
/// Each spawn picks a uniformly random room that is neither the boss room nor
/// the player's room, then a uniformly random non-boss catalog entry. Stops
/// early if no room is eligible.
pub fn ensure_minimum_population(state: &mut GameState, minimum: usize, rng: &mut GameRng) -> Vec<EnemySpawn> {
    let eligible: Vec<RoomId> = state
        .rooms
        .iter()
        .filter(|(id, room)| !room.is_boss_room() && **id != state.player.location)
        .map(|(id, _)| id.clone())
        .collect();

    let mut spawns = Vec::new();
    while state.regular_enemy_count() < minimum {
        let Some(room_id) = rng.choose(&eligible) else {
            break;
        };
        let Some(template) = rng.choose(regular_enemies()) else {
            break;
        };
        let enemy = Enemy::from_template(template);
        tracing::debug!(enemy = %enemy.name, room = %room_id, "enemy spawned");
        spawns.push(EnemySpawn {
            enemy: enemy.name.clone(),
            room: room_id.clone(),
        });
        if let Some(room) = state.rooms.get_mut(room_id) {
            room.enemies.push(enemy);
        }
    }
    spawns
}
