//! Entity definitions for the dungeon.

mod enemy;
mod player;
mod room;

pub use enemy::*;
pub use player::*;
pub use room::*;

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Identifier of a room, e.g. `room_12`.
///
/// Ordering is natural: the numeric suffix compares as a number, so
/// `room_2 < room_10`. Iteration over rooms therefore follows generation order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id of the room at generation index `index`.
    pub fn from_index(index: usize) -> Self {
        Self(format!("room_{}", index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn natural_key(&self) -> (&str, Option<u64>) {
        match self.0.rsplit_once('_') {
            Some((base, suffix)) => match suffix.parse::<u64>() {
                Ok(n) => (base, Some(n)),
                Err(_) => (self.0.as_str(), None),
            },
            None => (self.0.as_str(), None),
        }
    }
}

impl Ord for RoomId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.natural_key()
            .cmp(&other.natural_key())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for RoomId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Grid coordinates. `y` grows southwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coords {
    pub x: i32,
    pub y: i32,
}

impl Coords {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(&self, direction: Direction) -> Coords {
        let (dx, dy) = direction.offset();
        Coords::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }

    /// The four orthogonal neighbours, west, east, north, south.
    pub fn neighbours(&self) -> [Coords; 4] {
        [
            self.step(Direction::West),
            self.step(Direction::East),
            self.step(Direction::North),
            self.step(Direction::South),
        ]
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Cardinal directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub fn offset(&self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }

    /// Parse a direction token, case-insensitive.
    pub fn parse(token: &str) -> Option<Direction> {
        match token.trim().to_ascii_lowercase().as_str() {
            "north" | "n" => Some(Direction::North),
            "south" | "s" => Some(Direction::South),
            "east" | "e" => Some(Direction::East),
            "west" | "w" => Some(Direction::West),
            _ => None,
        }
    }

    /// The direction leading from `from` to an adjacent `to`.
    pub fn between(from: Coords, to: Coords) -> Option<Direction> {
        match (to.x.saturating_sub(from.x), to.y.saturating_sub(from.y)) {
            (0, -1) => Some(Direction::North),
            (0, 1) => Some(Direction::South),
            (1, 0) => Some(Direction::East),
            (-1, 0) => Some(Direction::West),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
        };
        f.write_str(name)
    }
}
