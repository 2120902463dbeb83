//! One conversation: transcript, model cache and the per-submission flow.

use crate::cache::ModelSessions;
use crate::error::GenerationError;
use crate::model::GenerationConfig;
use crate::template::{self, Substitution};
use crate::transcript::{ChatTurn, Transcript};
use crate::turn::run_turn;
use crate::validate::{self, InvalidParam};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Values used when a submission leaves them out.
#[derive(Clone, Debug)]
pub struct SessionDefaults {
    pub model_id: String,
    pub credential: Option<String>,
    pub config: GenerationConfig,
}

#[derive(Clone, Debug, Default)]
pub struct ChatInput {
    pub text: String,
    pub model: Option<String>,
    pub credential: Option<String>,
    pub template: Option<String>,
    pub config: Option<GenerationConfig>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }
    fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into() }
    }
    fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ChatReport {
    pub reply: Option<ChatTurn>,
    pub elapsed: Option<Duration>,
    pub error: Option<GenerationError>,
    pub notices: Vec<Notice>,
}

/// Submission rejected before anything was recorded.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error(transparent)]
    Invalid(#[from] InvalidParam),

    #[error("unknown template: {0}")]
    UnknownTemplate(String),
}

pub struct ChatSession {
    transcript: Transcript,
    models: ModelSessions,
    defaults: SessionDefaults,
    save_dir: PathBuf,
}

impl ChatSession {
    pub fn new(models: ModelSessions, defaults: SessionDefaults, save_dir: impl Into<PathBuf>) -> Self {
        Self { transcript: Transcript::new(), models, defaults, save_dir: save_dir.into() }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Runs one user submission end to end.
    ///
    /// Model and generation failures come back as notices on an `Ok` report;
    /// only malformed input is an `Err`, and then the transcript is untouched.
    pub async fn submit(&mut self, input: ChatInput) -> Result<ChatReport, ChatError> {
        validate::check_prompt(&input.text)?;
        let config = input.config.unwrap_or_else(|| self.defaults.config.clone());
        validate::check_config(&config)?;
        let template = match input.template.as_deref() {
            None => None,
            Some(name) => Some(
                template::lookup(name).ok_or_else(|| ChatError::UnknownTemplate(name.to_string()))?,
            ),
        };

        let mut report = ChatReport::default();
        if let Some(t) = template.filter(|t| !t.is_default()) {
            report.notices.push(Notice::info(format!("Selected Template: {}", t.name)));
        }

        let model_id = input.model.unwrap_or_else(|| self.defaults.model_id.clone());
        let credential = input
            .credential
            .or_else(|| self.defaults.credential.clone())
            .filter(|c| !c.is_empty());

        let handle = match self.models.acquire(&model_id, credential.as_deref()).await {
            Ok(handle) => Some(handle),
            Err(e) => {
                report.notices.push(Notice::error(format!("Model loading failed: {e}")));
                None
            }
        };

        match run_turn(&mut self.transcript, handle.as_deref(), &input.text, &config).await {
            Ok(outcome) => {
                report.notices.push(Notice::info(format!(
                    "Generated in {:.2} seconds.",
                    outcome.elapsed.as_secs_f64()
                )));
                report.reply = Some(outcome.turn);
                report.elapsed = Some(outcome.elapsed);
            }
            Err(e) => {
                let message = match (&e, &handle) {
                    (GenerationError::NoModel, None) => {
                        "Model failed to load. Check your API key and connection.".to_string()
                    }
                    _ => e.user_message(),
                };
                report.notices.push(Notice::error(message));
                report.error = Some(e);
            }
        }

        // Rewrites whichever turn is last: the reply on success, the user's
        // own turn on failure.
        if let Some(t) = template {
            match t.substitute(&input.text) {
                Substitution::Replace(content) => {
                    if let Err(e) = self.transcript.replace_last(content) {
                        tracing::error!(error = %e, "template substitution skipped");
                    }
                }
                other => {
                    if let Some(w) = other.warning() {
                        report.notices.push(Notice::warning(w));
                    }
                }
            }
        }

        Ok(report)
    }

    pub fn clear(&mut self) {
        self.transcript.reset();
        tracing::info!("transcript cleared");
    }

    pub fn save(&self) -> anyhow::Result<PathBuf> {
        let path = self.transcript.save(&self.save_dir)?;
        tracing::info!(path = %path.display(), turns = self.transcript.len(), "transcript saved");
        Ok(path)
    }
}
