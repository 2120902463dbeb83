use crate::error::ServiceError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Sampling parameters for one turn. Re-read on every submission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub max_length: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub repetition_penalty: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self { max_length: 512, temperature: 0.7, top_p: 0.95, repetition_penalty: 1.0 }
    }
}

/// Everything the backend receives alongside the prompt.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerateRequest {
    pub config: GenerationConfig,
    pub num_return_sequences: u32,
    pub pad_token_id: Option<u32>,
}

/// One candidate returned by the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Generated {
    pub generated_text: String,
}

/// A ready-to-invoke backend bound to one model.
#[async_trait::async_trait]
pub trait ModelHandle: Send + Sync + 'static {
    fn model_id(&self) -> &str;

    /// End-of-sequence token of the model's tokenizer, used as the pad token.
    fn eos_token_id(&self) -> Option<u32>;

    async fn generate(&self, prompt: &str, req: &GenerateRequest) -> Result<Vec<Generated>, ServiceError>;
}

/// Resolves a model identifier to a handle.
#[async_trait::async_trait]
pub trait ModelLoader: Send + Sync + 'static {
    async fn load(&self, model_id: &str) -> Result<Arc<dyn ModelHandle>, ServiceError>;
}

/// Exchanges a credential so later loads may access gated models.
#[async_trait::async_trait]
pub trait Authenticator: Send + Sync + 'static {
    async fn login(&self, credential: &str) -> Result<(), ServiceError>;
}

pub mod hub;
#[cfg(feature = "llama")]
pub mod llama;
