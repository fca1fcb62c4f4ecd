//! Prompt text for language-model narrators.

use serde_json::Value;

use crate::narrator::NarrationRequest;

/// Standing instructions for a language-model narrator.
pub const SYSTEM_PROMPT: &str = "\
You are the dungeon master of a turn-based dungeon crawl. Narrate in vivid \
second person and keep the pace brisk. After every turn offer at least two \
possible actions. When the player shares a room with a living enemy, end the \
narrative with numbered options and set \"force_option_select\" to true.

Reply with a single JSON object:
  \"narrative\": what the player experiences this turn
  \"state_delta\": the changes this turn causes, shaped like the state you were given
  \"options\" (optional): the actions you offer
  \"force_option_select\" (optional): true when the player must pick an option

Rules:
- Room ids are the keys of \"rooms\". Move the player by setting player.location to one of them.
- Enemies are only goblin, skeleton, orc, slime and dungeon_boss.
- Never reveal raw die rolls, only their outcomes.
- A command starting with [BRIEF] wants a reply of one or two sentences.";

impl NarrationRequest {
    /// The request as the JSON payload sent to a model.
    pub fn to_payload(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Format the request as a prompt string.
    pub fn to_prompt_string(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str("## Command\n");
        prompt.push_str(&self.command);
        prompt.push_str("\n\n");

        if let Some(roll) = self.roll_result {
            prompt.push_str(&format!("## Roll\nd20 = {}\n\n", roll));
        }

        let state = &self.state_snapshot;
        prompt.push_str("## Current Room\n");
        match state.current_room() {
            Some(room) => prompt.push_str(&format!("{} ({})\n\n", room.describe(), state.player.location)),
            None => prompt.push_str("unknown\n\n"),
        }

        let player = &state.player;
        prompt.push_str("## Player\n");
        prompt.push_str(&format!(
            "HP {}, STR {}, DEX {}, level {}, inventory: {}\n\n",
            player.hp,
            player.strength,
            player.dexterity,
            player.level,
            if player.inventory.is_empty() {
                "nothing".to_string()
            } else {
                player.inventory.join(", ")
            }
        ));

        if !self.history_window.is_empty() {
            prompt.push_str("## Recent Turns\n");
            for entry in &self.history_window {
                prompt.push_str(&format!(
                    "- turn {}: > {}\n  {}\n",
                    entry.turn, entry.command, entry.narrative
                ));
            }
            prompt.push('\n');
        }

        prompt.push_str("## State\n");
        prompt.push_str(&serde_json::to_string(state).unwrap_or_default());
        prompt.push('\n');

        prompt
    }
}
