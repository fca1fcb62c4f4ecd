//! Context Assembler - builds the narration request for a turn.
//!
//! The request carries:
//! 1. **Snapshot**: the game state at the start of the turn, minus its history
//! 2. **Command**: the player's command, prefixed with a brevity hint when it
//!    is movement-like
//! 3. **Roll**: the d20 result, when the engine rolled one
//! 4. **History**: the last few narrated turns

mod prompt;

pub use prompt::*;

use dungeon_rules::GameState;
use uuid::Uuid;

use crate::commands::is_movement_like;
use crate::narrator::NarrationRequest;

/// Prefix asking the narrator for a short reply.
pub const BRIEF_HINT: &str = "[BRIEF]";

/// Configuration for request assembly.
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Number of past turns to include.
    pub history_window: usize,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self { history_window: 10 }
    }
}

/// Builds narration requests from game state.
pub struct ContextAssembler {
    config: AssemblerConfig,
}

impl ContextAssembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(AssemblerConfig::default())
    }

    /// Assemble the request for `command`.
    pub fn assemble(
        &self,
        session_id: Uuid,
        state: &GameState,
        command: &str,
        roll_result: Option<i32>,
    ) -> NarrationRequest {
        let mut snapshot = state.clone();
        snapshot.history.clear();

        NarrationRequest {
            session_id,
            state_snapshot: snapshot,
            command: self.decorate_command(command),
            roll_result,
            history_window: state.recent_history(self.config.history_window).to_vec(),
        }
    }

    fn decorate_command(&self, command: &str) -> String {
        if is_movement_like(command) {
            format!("{} {}", BRIEF_HINT, command)
        } else {
            command.to_string()
        }
    }
}
