//! Introspection narration: progress and error messages for the agent UI.

use std::sync::Mutex;

use tracing::info;

/// Receives human-readable narration about a search in progress.
///
/// Fire-and-forget: nothing reads a return value, and implementations
/// must not fail the search.
pub trait Narrator: Send + Sync {
    /// Records one message on behalf of `actor`.
    fn narrate(&self, actor: &str, message: &str);
}

/// Narrator that emits each message as a tracing event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNarrator;

impl Narrator for TracingNarrator {
    fn narrate(&self, actor: &str, message: &str) {
        info!(actor, "{}", message);
    }
}

/// Narrator that keeps every message, formatted as `"{actor}: {message}"`.
#[derive(Debug, Default)]
pub struct RecordingNarrator {
    messages: Mutex<Vec<String>>,
}

impl RecordingNarrator {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded messages, oldest first.
    pub fn messages(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(messages) => messages.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Narrator for RecordingNarrator {
    fn narrate(&self, actor: &str, message: &str) {
        let line = format!("{}: {}", actor, message);
        match self.messages.lock() {
            Ok(mut messages) => messages.push(line),
            Err(poisoned) => poisoned.into_inner().push(line),
        }
    }
}
