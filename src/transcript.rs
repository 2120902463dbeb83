//! Ordered chat history for one conversation.

use crate::error::PreconditionError;
use crate::util;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const GREETING: &str = "Hello! Ask me anything.";
pub const CLEARED: &str = "Chat cleared. Start a new conversation!";
pub const SAVE_PREFIX: &str = "deepseek_chat";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Append-only log of turns. The only in-place edit is [`Transcript::replace_last`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transcript {
    turns: Vec<ChatTurn>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    /// A transcript holding only the greeting.
    pub fn new() -> Self {
        Self { turns: vec![ChatTurn::assistant(GREETING)] }
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&ChatTurn> {
        self.turns.last()
    }

    pub fn append(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
    }

    pub fn replace_last(&mut self, content: impl Into<String>) -> Result<(), PreconditionError> {
        let last = self.turns.last_mut().ok_or(PreconditionError)?;
        last.content = content.into();
        Ok(())
    }

    pub fn reset(&mut self) {
        self.turns.clear();
        self.turns.push(ChatTurn::assistant(CLEARED));
    }

    /// Pretty-printed JSON array of `{role, content}`, four-space indented.
    pub fn serialize(&self) -> serde_json::Result<Vec<u8>> {
        let mut out = Vec::new();
        let fmt = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, fmt);
        self.turns.serialize(&mut ser)?;
        Ok(out)
    }

    /// Writes the transcript to `dir` under a timestamped name and returns the path.
    pub fn save(&self, dir: impl AsRef<Path>) -> anyhow::Result<PathBuf> {
        if self.is_empty() {
            return Err(PreconditionError.into());
        }
        let name = util::timestamped_name(SAVE_PREFIX, "json", &chrono::Local::now());
        let path = dir.as_ref().join(name);
        let bytes = self.serialize().context("serialize transcript")?;
        util::write_file(&path, &bytes)?;
        Ok(path)
    }
}
