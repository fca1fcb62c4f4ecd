//! Player command classification and the locally handled meta-commands.

use dungeon_rules::combat;
use dungeon_rules::{GameState, RulesConfig};

/// Commands starting with this are handled without the narrator.
pub const META_PREFIX: char = '/';

/// Leading verbs that make a command movement-like.
pub const MOVEMENT_VERBS: [&str; 7] = ["move", "go", "walk", "run", "flee", "look", "attack"];

pub const HELP_TEXT: &str = "\
Commands:
  /look              describe the current room
  /loot              pick up everything in the room
  /inventory         list what you carry
  /stats             show your stats
  /map               show the explored map
  /ability           use your special ability
  /equip <item>      equip an item
  /unequip <slot>    unequip a slot (boots, weapon, offhand) or an item
  /use <item>        use an item
  /autoroll          toggle automatic skill-check rolls
  /save, /load       save or restore the game
  /quit              leave the game
Anything else is told to the dungeon master.";

/// A command handled by the engine alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaCommand {
    Help,
    Look,
    Loot,
    Inventory,
    Stats,
    Map,
    Ability,
    Equip(String),
    Unequip(String),
    Use(String),
    AutoRoll,
    Save,
    Load,
    Quit,
    Unknown(String),
}

/// A classified line of player input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Meta(MetaCommand),
    Narrated(String),
}

impl Command {
    pub fn parse(input: &str) -> Command {
        let input = input.trim();
        let Some(meta) = input.strip_prefix(META_PREFIX) else {
            return Command::Narrated(input.to_string());
        };

        let (name, argument) = match meta.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim().to_string()),
            None => (meta, String::new()),
        };
        let command = match name.to_lowercase().as_str() {
            "help" | "?" => MetaCommand::Help,
            "look" => MetaCommand::Look,
            "loot" => MetaCommand::Loot,
            "inventory" | "inv" | "i" => MetaCommand::Inventory,
            "stats" => MetaCommand::Stats,
            "map" => MetaCommand::Map,
            "ability" => MetaCommand::Ability,
            "equip" => MetaCommand::Equip(argument),
            "unequip" => MetaCommand::Unequip(argument),
            "use" => MetaCommand::Use(argument),
            "autoroll" => MetaCommand::AutoRoll,
            "save" => MetaCommand::Save,
            "load" => MetaCommand::Load,
            "quit" | "exit" => MetaCommand::Quit,
            _ => MetaCommand::Unknown(input.to_string()),
        };
        Command::Meta(command)
    }
}

/// Whether the command starts with a movement verb.
///
/// Movement-like commands get a brief narration and no skill-check roll.
pub fn is_movement_like(command: &str) -> bool {
    command
        .split_whitespace()
        .next()
        .map(str::to_lowercase)
        .is_some_and(|verb| MOVEMENT_VERBS.contains(&verb.as_str()))
}

/// Run a meta-command that only touches the game state.
///
/// Returns `None` for commands that need the session (`/save`, `/load`,
/// `/autoroll`, `/quit`).
pub fn run_local(command: &MetaCommand, state: &mut GameState, config: &RulesConfig) -> Option<String> {
    let reply = match command {
        MetaCommand::Help => HELP_TEXT.to_string(),
        MetaCommand::Look => match state.current_room() {
            Some(room) => room.describe(),
            None => "You are nowhere at all.".to_string(),
        },
        MetaCommand::Loot => loot(state),
        MetaCommand::Inventory => inventory(state),
        MetaCommand::Stats => stats(state),
        MetaCommand::Map => state.render_map(),
        MetaCommand::Ability => combat::use_ability(state, config).to_string(),
        MetaCommand::Equip(item) if item.is_empty() => "Equip what?".to_string(),
        MetaCommand::Equip(item) => match state.player.equip_item(item) {
            Ok(outcome) => outcome.to_string(),
            Err(err) => err.to_string(),
        },
        MetaCommand::Unequip(target) if target.is_empty() => "Unequip what?".to_string(),
        MetaCommand::Unequip(target) => match state.player.unequip(target) {
            Some(item) => format!("You unequip {}.", item),
            None => format!("{} is not equipped.", target),
        },
        MetaCommand::Use(item) if item.is_empty() => "Use what?".to_string(),
        MetaCommand::Use(item) => match state.player.use_item(item) {
            Ok(outcome) => outcome.to_string(),
            Err(err) => err.to_string(),
        },
        MetaCommand::Unknown(raw) => format!("Unknown command: {}", raw),
        MetaCommand::AutoRoll | MetaCommand::Save | MetaCommand::Load | MetaCommand::Quit => {
            return None
        }
    };
    Some(reply)
}

fn loot(state: &mut GameState) -> String {
    let Some(room) = state.current_room_mut() else {
        return "There is nothing to loot here.".to_string();
    };
    if room.items.is_empty() {
        return "There is nothing to loot here.".to_string();
    }
    let items: Vec<String> = room.items.drain(..).collect();
    let message = format!("You pick up: {}.", items.join(", "));
    state.player.inventory.extend(items);
    message
}

fn inventory(state: &GameState) -> String {
    let player = &state.player;
    if player.inventory.is_empty() {
        return "Your inventory is empty.".to_string();
    }
    let mut message = format!("Inventory: {}", player.inventory.join(", "));
    if !player.equipped.is_empty() {
        let worn: Vec<String> = player
            .equipped
            .iter()
            .map(|(slot, item)| format!("{} ({})", item, slot))
            .collect();
        message.push_str(&format!("\nEquipped: {}", worn.join(", ")));
    }
    if player.torch_lit {
        message.push_str("\nYour torch is lit.");
    }
    message
}

fn stats(state: &GameState) -> String {
    let player = &state.player;
    let mut message = format!(
        "HP {} | STR {} | DEX {} | Level {} | XP {}/{}",
        player.hp,
        player.strength,
        player.dexterity,
        player.level,
        player.xp,
        player.xp_threshold()
    );
    if let Some(ability) = player.ability {
        match state.cooldown_remaining(ability) {
            0 => message.push_str(&format!(" | Ability: {} (ready)", ability)),
            n => message.push_str(&format!(" | Ability: {} ({} turns)", ability, n)),
        }
    }
    if !player.conditions.is_empty() {
        let conditions: Vec<&str> = player.conditions.iter().map(String::as_str).collect();
        message.push_str(&format!(" | Conditions: {}", conditions.join(", ")));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use dungeon_rules::{Ability, Coords, Enemy, Player, Room, RoomId, RoomType, Stat};
    use rstest::rstest;
    use std::collections::BTreeMap;

    fn state() -> GameState {
        let mut rooms = BTreeMap::new();
        let mut entrance = Room::new(RoomType::Entrance, Coords::new(0, 0));
        entrance.visited = true;
        entrance.items = vec!["torch".into(), "leather boots".into()];
        rooms.insert(RoomId::from_index(0), entrance);
        let mut lair = Room::new(RoomType::EnemyLair, Coords::new(1, 0));
        lair.enemies.push(Enemy::spawn("slime"));
        rooms.insert(RoomId::from_index(1), lair);
        GameState::new(3, rooms, Player::new(RoomId::from_index(0)))
    }

    #[rstest]
    #[case("/help", MetaCommand::Help)]
    #[case("/LOOK", MetaCommand::Look)]
    #[case("/inventory", MetaCommand::Inventory)]
    #[case("/equip  rusty axe ", MetaCommand::Equip("rusty axe".into()))]
    #[case("/unequip weapon", MetaCommand::Unequip("weapon".into()))]
    #[case("/use health potion", MetaCommand::Use("health potion".into()))]
    #[case("/equip", MetaCommand::Equip(String::new()))]
    #[case("/exit", MetaCommand::Quit)]
    #[case("/dance", MetaCommand::Unknown("/dance".into()))]
    fn test_parse_meta(#[case] input: &str, #[case] expected: MetaCommand) {
        assert_eq!(Command::parse(input), Command::Meta(expected));
    }

    #[test]
    fn test_parse_narrated() {
        assert_eq!(
            Command::parse("  open the door "),
            Command::Narrated("open the door".into())
        );
    }

    #[rstest]
    #[case("move north", true)]
    #[case("Go west", true)]
    #[case("look around", true)]
    #[case("attack the orc", true)]
    #[case("flee", true)]
    #[case("open the chest", false)]
    #[case("I go north", false)]
    #[case("running", false)]
    #[case("", false)]
    fn test_is_movement_like(#[case] command: &str, #[case] expected: bool) {
        assert_eq!(is_movement_like(command), expected);
    }

    #[test]
    fn test_loot_moves_items_once() {
        let mut state = state();
        let config = RulesConfig::default();

        let reply = run_local(&MetaCommand::Loot, &mut state, &config).unwrap();
        assert_eq!(reply, "You pick up: torch, leather boots.");
        assert_eq!(state.player.inventory, vec!["torch", "leather boots"]);
        assert!(state.rooms[&RoomId::from_index(0)].items.is_empty());

        let reply = run_local(&MetaCommand::Loot, &mut state, &config).unwrap();
        assert_eq!(reply, "There is nothing to loot here.");
    }

    #[test]
    fn test_equip_and_unequip_through_commands() {
        let mut state = state();
        let config = RulesConfig::default();
        state.player.inventory.push("leather boots".into());

        let reply = run_local(&MetaCommand::Equip("leather boots".into()), &mut state, &config);
        assert_eq!(reply.as_deref(), Some("You equip leather boots (boots)."));
        assert_eq!(state.player.dexterity, 4);
        assert_eq!(state.player.equipment_bonus(Stat::Dex), 1);

        let reply = run_local(&MetaCommand::Unequip("boots".into()), &mut state, &config);
        assert_eq!(reply.as_deref(), Some("You unequip leather boots."));
        assert_eq!(state.player.dexterity, 3);

        let reply = run_local(&MetaCommand::Unequip("boots".into()), &mut state, &config);
        assert_eq!(reply.as_deref(), Some("boots is not equipped."));
    }

    #[test]
    fn test_use_potion() {
        let mut state = state();
        state.player.inventory.push("health potion".into());
        let reply = run_local(
            &MetaCommand::Use("health potion".into()),
            &mut state,
            &RulesConfig::default(),
        );
        assert_eq!(reply.as_deref(), Some("You use the health potion and recover 10 HP."));
        assert_eq!(state.player.hp, 30);
        assert!(state.player.inventory.is_empty());

        let reply = run_local(&MetaCommand::Use("rope".into()), &mut state, &RulesConfig::default());
        assert_eq!(reply.as_deref(), Some("You don't have rope."));
    }

    #[test]
    fn test_stats_shows_cooldown() {
        let mut state = state();
        state.player.ability = Some(Ability::Heal);
        let config = RulesConfig::default();
        assert!(run_local(&MetaCommand::Stats, &mut state, &config)
            .unwrap()
            .ends_with("Ability: heal (ready)"));

        state.ability_cooldowns.insert(Ability::Heal, 2);
        assert!(run_local(&MetaCommand::Stats, &mut state, &config)
            .unwrap()
            .ends_with("Ability: heal (2 turns)"));
    }

    #[test]
    fn test_ability_without_target() {
        let mut state = state();
        state.player.ability = Some(Ability::Backstab);
        let reply = run_local(&MetaCommand::Ability, &mut state, &RulesConfig::default());
        assert_eq!(reply.as_deref(), Some("No enemies to target with your ability."));
        assert!(state.ability_cooldowns.is_empty());
    }

    #[test]
    fn test_session_commands_are_not_local() {
        let mut state = state();
        let config = RulesConfig::default();
        for command in [MetaCommand::Save, MetaCommand::Load, MetaCommand::AutoRoll, MetaCommand::Quit] {
            assert_eq!(run_local(&command, &mut state, &config), None);
        }
    }

    #[test]
    fn test_map_and_look() {
        let mut state = state();
        let config = RulesConfig::default();
        assert_eq!(run_local(&MetaCommand::Map, &mut state, &config).as_deref(), Some("@ #\n"));
        assert_eq!(
            run_local(&MetaCommand::Look, &mut state, &config).as_deref(),
            Some("You are in a entrance. Items: torch, leather boots.")
        );
    }
}
