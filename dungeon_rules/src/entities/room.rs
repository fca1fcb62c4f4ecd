//! Rooms.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Coords, Enemy};

/// Room type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    Entrance,
    Corridor,
    Treasure,
    Trap,
    EnemyLair,
    Shrine,
    Locked,
    BossRoom,
}

impl RoomType {
    /// Types drawn for ordinary cells. Entrance and boss room are assigned explicitly.
    pub const RANDOM_POOL: [RoomType; 6] = [
        RoomType::Corridor,
        RoomType::Treasure,
        RoomType::Trap,
        RoomType::EnemyLair,
        RoomType::Shrine,
        RoomType::Locked,
    ];

    /// Whether a room of this type may hold a regular enemy at generation.
    pub fn may_hold_enemy(&self) -> bool {
        matches!(self, RoomType::EnemyLair | RoomType::Corridor)
    }

    pub fn label(&self) -> &'static str {
        match self {
            RoomType::Entrance => "entrance",
            RoomType::Corridor => "corridor",
            RoomType::Treasure => "treasure",
            RoomType::Trap => "trap",
            RoomType::EnemyLair => "enemy lair",
            RoomType::Shrine => "shrine",
            RoomType::Locked => "locked",
            RoomType::BossRoom => "boss room",
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A room in the dungeon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    #[serde(rename = "type")]
    pub kind: RoomType,
    pub coords: Coords,
    pub visited: bool,
    pub locked: bool,
    pub trap: bool,
    pub enemies: Vec<Enemy>,
    pub items: Vec<String>,
}

impl Room {
    /// A fresh, empty room. `locked` is derived from the type here and nowhere else.
    pub fn new(kind: RoomType, coords: Coords) -> Self {
        Self {
            kind,
            coords,
            visited: false,
            locked: kind == RoomType::Locked,
            trap: false,
            enemies: Vec::new(),
            items: Vec::new(),
        }
    }

    pub fn is_boss_room(&self) -> bool {
        self.kind == RoomType::BossRoom
    }

    /// Index of the first living enemy in room order.
    pub fn first_living_enemy(&self) -> Option<usize> {
        self.enemies.iter().position(Enemy::is_alive)
    }

    pub fn living_enemies(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.iter().filter(|e| e.is_alive())
    }

    pub fn has_living_enemy(&self) -> bool {
        self.enemies.iter().any(Enemy::is_alive)
    }

    pub fn has_regular_enemy(&self) -> bool {
        self.enemies.iter().any(|e| !e.is_boss())
    }

    /// Human readable summary used by `/look`.
    pub fn describe(&self) -> String {
        let mut desc = format!("You are in a {}. ", self.kind);
        if !self.enemies.is_empty() {
            let names: Vec<_> = self.enemies.iter().map(|e| e.name.as_str()).collect();
            desc.push_str(&format!("Enemies: {}. ", names.join(", ")));
        }
        if !self.items.is_empty() {
            desc.push_str(&format!("Items: {}. ", self.items.join(", ")));
        }
        if self.locked {
            desc.push_str("A heavy lock bars further passage. ");
        }
        if self.trap {
            desc.push_str("(something feels dangerous here) ");
        }
        desc.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locked_derived_from_type() {
        assert!(Room::new(RoomType::Locked, Coords::new(0, 0)).locked);
        assert!(!Room::new(RoomType::Shrine, Coords::new(0, 0)).locked);
    }

    #[test]
    fn test_first_living_enemy_skips_dead() {
        let mut room = Room::new(RoomType::EnemyLair, Coords::new(1, 1));
        let mut dead = Enemy::spawn("goblin");
        dead.hp = 0;
        room.enemies.push(dead);
        room.enemies.push(Enemy::spawn("orc"));
        assert_eq!(room.first_living_enemy(), Some(1));
        assert_eq!(room.living_enemies().count(), 1);
    }

    #[test]
    fn test_serde_type_tag() {
        let room = Room::new(RoomType::EnemyLair, Coords::new(2, 3));
        let json = serde_json::to_value(&room).unwrap();
        assert_eq!(json["type"], "enemy_lair");
        assert_eq!(json["coords"]["x"], 2);
    }

    #[test]
    fn test_describe() {
        let mut room = Room::new(RoomType::Treasure, Coords::new(0, 0));
        room.items.push("torch".into());
        assert_eq!(room.describe(), "You are in a treasure. Items: torch.");
    }
}
