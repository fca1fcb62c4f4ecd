//! Test doubles for the narrator boundary.
//!
//! [`ScriptedNarrator`] replays canned replies in order so sessions can be
//! driven deterministically without a language model.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use serde_json::Value;

use crate::error::NarratorError;
use crate::narrator::{NarrationRequest, Narrator};

/// Reply used once the script runs out.
pub const FALLBACK_REPLY: &str = r#"{"narrative": "Nothing happens.", "state_delta": {}}"#;

/// A narrator that returns scripted replies.
#[derive(Default)]
pub struct ScriptedNarrator {
    replies: Mutex<VecDeque<Result<String, NarratorError>>>,
    requests: Mutex<Vec<NarrationRequest>>,
    delay: Option<Duration>,
}

impl ScriptedNarrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a JSON reply.
    pub fn reply(self, reply: Value) -> Self {
        self.reply_raw(reply.to_string())
    }

    /// Queue raw reply text, which need not be valid JSON.
    pub fn reply_raw(self, raw: impl Into<String>) -> Self {
        self.push(Ok(raw.into()))
    }

    /// Queue a failure.
    pub fn fail(self, error: NarratorError) -> Self {
        self.push(Err(error))
    }

    /// Sleep this long before every reply.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn push(self, entry: Result<String, NarratorError>) -> Self {
        self.replies
            .lock()
            .expect("script lock poisoned")
            .push_back(entry);
        self
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<NarrationRequest> {
        self.requests.lock().expect("request log poisoned").clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().expect("request log poisoned").len()
    }
}

impl Narrator for ScriptedNarrator {
    fn narrate(&self, request: &NarrationRequest) -> Result<String, NarratorError> {
        self.requests
            .lock()
            .expect("request log poisoned")
            .push(request.clone());
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        self.replies
            .lock()
            .expect("script lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Ok(FALLBACK_REPLY.to_string()))
    }
}
