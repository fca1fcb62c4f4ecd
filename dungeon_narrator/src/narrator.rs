//! The narrator boundary.
//!
//! A [`Narrator`] turns a [`NarrationRequest`] into raw text, usually by
//! calling a language model. Its reply is advisory: [`NarratorOutput::parse`]
//! accepts anything, and the reconciler decides what of it becomes true.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use dungeon_rules::{GameState, HistoryEntry};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::NarratorError;

/// Everything the narrator sees for one turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarrationRequest {
    pub session_id: Uuid,
    /// The state at the start of the turn, without its history.
    pub state_snapshot: GameState,
    /// The player's command, possibly carrying a brevity hint.
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roll_result: Option<i32>,
    pub history_window: Vec<HistoryEntry>,
}

/// A source of narration.
///
/// Implementations block until they have a reply. The session bounds the
/// wait with a timeout, so an implementation need not enforce one itself.
pub trait Narrator: Send + Sync {
    fn narrate(&self, request: &NarrationRequest) -> Result<String, NarratorError>;
}

/// The narrator's parsed reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NarratorOutput {
    pub narrative: String,
    /// Proposed state changes. Not trusted; may be any JSON value.
    #[serde(default)]
    pub state_delta: Value,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub force_option_select: bool,
}

impl NarratorOutput {
    /// Narration with no proposed changes.
    pub fn plain(narrative: impl Into<String>) -> Self {
        Self {
            narrative: narrative.into(),
            state_delta: Value::Object(Map::new()),
            ..Self::default()
        }
    }

    /// Parse raw narrator text. Never fails.
    ///
    /// Markdown code fences are stripped first. Text that is not a JSON
    /// object becomes the narrative with an empty delta. When no `options`
    /// array is given, numbered lines `1.` to `9.` in the narrative are
    /// taken as options.
    pub fn parse(raw: &str) -> Self {
        let body = strip_code_fence(raw);
        let mut output = match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(fields)) => Self::from_fields(fields),
            _ => {
                tracing::debug!("narrator reply is not a JSON object, using it as narrative");
                Self::plain(raw.trim())
            }
        };
        if output.options.is_empty() {
            output.options = numbered_options(&output.narrative);
        }
        output
    }

    fn from_fields(mut fields: Map<String, Value>) -> Self {
        let narrative = match fields.remove("narrative") {
            Some(Value::String(text)) => text,
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        let options = match fields.remove("options") {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(text) => Some(text),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        Self {
            narrative,
            state_delta: fields.remove("state_delta").unwrap_or(Value::Null),
            options,
            force_option_select: fields
                .get("force_option_select")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }

    /// The delta as a mapping, or `None` when absent or not a mapping.
    pub fn delta_fields(&self) -> Option<&Map<String, Value>> {
        self.state_delta.as_object()
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`) on the opening fence line.
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn numbered_options(narrative: &str) -> Vec<String> {
    narrative
        .lines()
        .map(str::trim)
        .filter(|line| {
            let mut chars = line.chars();
            matches!(chars.next(), Some('1'..='9')) && chars.next() == Some('.')
        })
        .map(str::to_string)
        .collect()
}

/// Ask the narrator on a worker thread and wait at most `timeout`.
///
/// On timeout the worker is abandoned; whatever it eventually returns is
/// discarded.
pub fn narrate_with_timeout(
    narrator: Arc<dyn Narrator>,
    request: NarrationRequest,
    timeout: Duration,
) -> Result<NarratorOutput, NarratorError> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("narrator".into())
        .spawn(move || {
            let _ = tx.send(narrator.narrate(&request));
        })
        .map_err(|e| NarratorError::Transport(e.to_string()))?;

    match rx.recv_timeout(timeout) {
        Ok(Ok(raw)) => Ok(NarratorOutput::parse(&raw)),
        Ok(Err(err)) => Err(err),
        Err(RecvTimeoutError::Timeout) => {
            tracing::warn!(timeout_ms = timeout.as_millis() as u64, "narrator timed out");
            Err(NarratorError::Timeout(timeout))
        }
        Err(RecvTimeoutError::Disconnected) => Err(NarratorError::Disconnected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedNarrator;
    use dungeon_rules::generation::new_game;
    use dungeon_rules::RulesConfig;
    use serde_json::json;

    fn request() -> NarrationRequest {
        NarrationRequest {
            session_id: Uuid::new_v4(),
            state_snapshot: new_game(1, &RulesConfig::default(), None),
            command: "look".into(),
            roll_result: None,
            history_window: Vec::new(),
        }
    }

    #[test]
    fn test_parse_full_reply() {
        let raw = json!({
            "narrative": "A goblin snarls.\n1. Attack\n2. Flee",
            "state_delta": {"player": {"hp": 18}},
            "options": ["Attack it", "Run"],
            "force_option_select": true
        })
        .to_string();

        let output = NarratorOutput::parse(&raw);
        assert_eq!(output.narrative, "A goblin snarls.\n1. Attack\n2. Flee");
        assert_eq!(output.state_delta, json!({"player": {"hp": 18}}));
        assert_eq!(output.options, vec!["Attack it", "Run"]);
        assert!(output.force_option_select);
    }

    #[test]
    fn test_parse_malformed_is_narrative() {
        let output = NarratorOutput::parse("The torch flickers. {not json");
        assert_eq!(output.narrative, "The torch flickers. {not json");
        assert_eq!(output.delta_fields().map(Map::len), Some(0));
        assert!(!output.force_option_select);
    }

    #[test]
    fn test_parse_non_object_json() {
        let output = NarratorOutput::parse("[1, 2, 3]");
        assert_eq!(output.narrative, "[1, 2, 3]");
        assert!(output.delta_fields().unwrap().is_empty());
    }

    #[test]
    fn test_parse_strips_code_fence() {
        let raw = "```json\n{\"narrative\": \"Hi\", \"state_delta\": {\"turn\": 3}}\n```";
        let output = NarratorOutput::parse(raw);
        assert_eq!(output.narrative, "Hi");
        assert_eq!(output.state_delta, json!({"turn": 3}));
    }

    #[test]
    fn test_parse_missing_or_bad_delta() {
        let output = NarratorOutput::parse(r#"{"narrative": "Quiet."}"#);
        assert!(output.delta_fields().is_none());

        let output = NarratorOutput::parse(r#"{"narrative": "Quiet.", "state_delta": "oops"}"#);
        assert!(output.delta_fields().is_none());
    }

    #[test]
    fn test_numbered_lines_become_options() {
        let raw = json!({
            "narrative": "An orc blocks the way.\n 1. Attack\n2. Flee\n10 gold coins glitter.\n3) Hide",
            "state_delta": {}
        })
        .to_string();
        let output = NarratorOutput::parse(&raw);
        assert_eq!(output.options, vec!["1. Attack", "2. Flee"]);
    }

    #[test]
    fn test_timeout_reports_error() {
        let narrator = Arc::new(ScriptedNarrator::new().with_delay(Duration::from_millis(500)));
        let result = narrate_with_timeout(narrator, request(), Duration::from_millis(20));
        assert_eq!(result, Err(NarratorError::Timeout(Duration::from_millis(20))));
    }

    #[test]
    fn test_failure_is_passed_through() {
        let narrator =
            Arc::new(ScriptedNarrator::new().fail(NarratorError::Transport("503".into())));
        let result = narrate_with_timeout(narrator, request(), Duration::from_secs(5));
        assert_eq!(result, Err(NarratorError::Transport("503".into())));
    }

    #[test]
    fn test_reply_is_parsed() {
        let narrator = Arc::new(
            ScriptedNarrator::new().reply(json!({"narrative": "Drip.", "state_delta": {}})),
        );
        let output = narrate_with_timeout(narrator, request(), Duration::from_secs(5)).unwrap();
        assert_eq!(output.narrative, "Drip.");
    }
}
