//! Repair of player locations that do not name a room.
//!
//! Narrators like to invent ids such as `room_3_north` for "the room north
//! of room_3". These are followed through the coordinate index when possible.

use dungeon_rules::{Direction, GameState, RoomId};

use crate::events::RepairKind;

/// Where a broken location ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub room: RoomId,
    pub via: RepairKind,
}

/// Split `<base>_<index>[_...]` into the room id and the first direction
/// token among the trailing parts.
fn parse_compound(raw: &str) -> Option<(RoomId, Option<Direction>)> {
    let mut parts = raw.trim().split('_');
    let base = parts.next().filter(|base| !base.is_empty())?;
    let index = parts
        .next()
        .filter(|index| !index.is_empty() && index.chars().all(|c| c.is_ascii_digit()))?;
    let direction = parts.find_map(Direction::parse);
    Some((RoomId::new(format!("{}_{}", base, index)), direction))
}

/// Resolve `proposed` to an existing room.
///
/// Returns `None` when `proposed` already exists. Otherwise tries, in order:
/// the neighbour named by a direction suffix, the `<base>_<index>` room,
/// `previous`, `default_room`, and finally the first room in id order.
///
/// # Panics
///
/// Panics if the state has no rooms at all.
pub fn resolve(
    state: &GameState,
    proposed: &RoomId,
    previous: &RoomId,
    default_room: &RoomId,
) -> Option<Resolution> {
    if state.has_room(proposed) {
        return None;
    }

    let compound = parse_compound(proposed.as_str());
    if let Some((candidate, Some(direction))) = &compound {
        let destination = state
            .rooms
            .get(candidate)
            .map(|room| room.coords.step(*direction))
            .and_then(|coords| state.coord_index().get(&coords).cloned());
        if let Some(room) = destination {
            return Some(Resolution {
                room,
                via: RepairKind::Directional,
            });
        }
    }

    let fallbacks = [
        compound.map(|(candidate, _)| (candidate, RepairKind::Candidate)),
        Some((previous.clone(), RepairKind::Previous)),
        Some((default_room.clone(), RepairKind::Default)),
    ];
    if let Some((room, via)) = fallbacks
        .into_iter()
        .flatten()
        .find(|(room, _)| state.has_room(room))
    {
        return Some(Resolution { room, via });
    }

    let room = state
        .rooms
        .keys()
        .next()
        .cloned()
        .expect("a game state always has rooms");
    Some(Resolution {
        room,
        via: RepairKind::Arbitrary,
    })
}
