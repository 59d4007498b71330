use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::error::LlmError;
use crate::llm::{CompletionMode, TextGenerator};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub system: String,
    pub user: String,
    pub mode: CompletionMode,
}

/// Replays canned answers keyed by system instruction and records every call.
/// A system instruction with no queued answer gets `""`.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    // Err(message) replays as a network failure.
    scripts: Mutex<HashMap<String, VecDeque<Result<String, String>>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, system: &str, response: impl Into<String>) -> Self {
        self.queue(system, Ok(response.into()));
        self
    }

    pub fn fail(mut self, system: &str, message: &str) -> Self {
        self.queue(system, Err(message.to_string()));
        self
    }

    fn queue(&mut self, system: &str, entry: Result<String, String>) {
        self.scripts
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .entry(system.to_string())
            .or_default()
            .push_back(entry);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn calls_to(&self, system: &str) -> usize {
        self.calls().iter().filter(|c| c.system == system).count()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        mode: CompletionMode,
    ) -> Result<String, LlmError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedCall {
                system: system.to_string(),
                user: user.to_string(),
                mode,
            });

        let next = self
            .scripts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(system)
            .and_then(VecDeque::pop_front);

        match next {
            Some(Ok(text)) => Ok(text.trim().to_string()),
            Some(Err(message)) => Err(LlmError::Network(message)),
            None => Ok(String::new()),
        }
    }
}

/// Answers every call with nothing. Used for offline validation, where every
/// AI-assisted step falls back to its deterministic path.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullGenerator;

#[async_trait]
impl TextGenerator for NullGenerator {
    async fn complete(
        &self,
        _system: &str,
        _user: &str,
        _mode: CompletionMode,
    ) -> Result<String, LlmError> {
        Ok(String::new())
    }
}
