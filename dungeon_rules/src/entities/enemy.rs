//! Enemies and the static enemy catalog.

use serde::{Deserialize, Serialize};

/// Catalog name of the boss.
pub const BOSS_TAG: &str = "dungeon_boss";

/// Base stats for one kind of enemy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnemyTemplate {
    pub name: &'static str,
    pub hp: i32,
    pub str: i32,
    pub dex: i32,
    pub xp: u32,
    pub loot: &'static [&'static str],
}

impl EnemyTemplate {
    pub fn is_boss(&self) -> bool {
        self.name == BOSS_TAG
    }
}

/// The enemy catalog. The boss is always the last entry.
pub const ENEMY_CATALOG: [EnemyTemplate; 5] = [
    EnemyTemplate { name: "goblin", hp: 8, str: 2, dex: 2, xp: 15, loot: &["copper coin"] },
    EnemyTemplate { name: "skeleton", hp: 12, str: 3, dex: 1, xp: 25, loot: &["bone shard"] },
    EnemyTemplate { name: "orc", hp: 18, str: 4, dex: 1, xp: 40, loot: &["rusty axe"] },
    EnemyTemplate { name: "slime", hp: 6, str: 1, dex: 3, xp: 10, loot: &["gelatin goop"] },
    EnemyTemplate { name: BOSS_TAG, hp: 35, str: 6, dex: 3, xp: 150, loot: &["legendary sword"] },
];

/// Catalog entries that may be spawned as regular enemies.
pub fn regular_enemies() -> &'static [EnemyTemplate] {
    &ENEMY_CATALOG[..ENEMY_CATALOG.len() - 1]
}

pub fn enemy_template(name: &str) -> Option<&'static EnemyTemplate> {
    ENEMY_CATALOG.iter().find(|t| t.name == name)
}

/// A live enemy instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enemy {
    pub name: String,
    pub hp: i32,
    /// Snapshot of hp at spawn. Never changes afterwards.
    #[serde(default)]
    pub max_hp: i32,
    #[serde(rename = "str")]
    pub strength: i32,
    #[serde(rename = "dex")]
    pub dexterity: i32,
    pub xp: u32,
    #[serde(default)]
    pub loot: Vec<String>,
}

impl Enemy {
    pub fn from_template(template: &EnemyTemplate) -> Self {
        Self {
            name: template.name.to_string(),
            hp: template.hp,
            max_hp: template.hp,
            strength: template.str,
            dexterity: template.dex,
            xp: template.xp,
            loot: template.loot.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Spawn a catalog enemy by name.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not in the catalog. Engine code only passes
    /// catalog names; untrusted names go through [`enemy_template`] first.
    pub fn spawn(name: &str) -> Self {
        let template = enemy_template(name)
            .unwrap_or_else(|| panic!("enemy '{}' is not in the catalog", name));
        Self::from_template(template)
    }

    pub fn boss() -> Self {
        Self::spawn(BOSS_TAG)
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn is_boss(&self) -> bool {
        self.name == BOSS_TAG
    }
}
