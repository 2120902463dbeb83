#![allow(dead_code)]

use deepseek_chat::cache::ModelSessions;
use deepseek_chat::chat::{ChatSession, SessionDefaults};
use deepseek_chat::error::ServiceError;
use deepseek_chat::model::{Authenticator, GenerateRequest, Generated, GenerationConfig, ModelHandle, ModelLoader};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// What the fake backend does when asked to generate.
#[derive(Clone)]
pub enum Reply {
    Text(String),
    Fail(ServiceError),
    Empty,
}

pub struct FakeHandle {
    pub model_id: String,
    pub reply: Reply,
    pub seen: Mutex<Vec<(String, GenerateRequest)>>,
}

#[async_trait::async_trait]
impl ModelHandle for FakeHandle {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn eos_token_id(&self) -> Option<u32> {
        Some(2)
    }

    async fn generate(&self, prompt: &str, req: &GenerateRequest) -> Result<Vec<Generated>, ServiceError> {
        self.seen.lock().push((prompt.to_string(), req.clone()));
        match &self.reply {
            Reply::Text(t) => Ok(vec![
                Generated { generated_text: t.clone() },
                Generated { generated_text: "ignored second candidate".into() },
            ]),
            Reply::Fail(e) => Err(e.clone()),
            Reply::Empty => Ok(Vec::new()),
        }
    }
}

impl FakeHandle {
    pub fn new(reply: Reply) -> Self {
        Self { model_id: "fake/model".into(), reply, seen: Mutex::new(Vec::new()) }
    }
}

/// Loader that counts constructions. Ids starting with `missing/` are not found.
pub struct FakeLoader {
    pub reply: Reply,
    pub loads: AtomicUsize,
}

impl FakeLoader {
    pub fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self { reply, loads: AtomicUsize::new(0) })
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ModelLoader for FakeLoader {
    async fn load(&self, model_id: &str) -> Result<Arc<dyn ModelHandle>, ServiceError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if model_id.starts_with("missing/") {
            return Err(ServiceError::NotFound(model_id.to_string()));
        }
        Ok(Arc::new(FakeHandle {
            model_id: model_id.to_string(),
            reply: self.reply.clone(),
            seen: Mutex::new(Vec::new()),
        }))
    }
}

/// Accepts only the credential `good`.
#[derive(Default)]
pub struct FakeAuth {
    pub logins: AtomicUsize,
}

impl FakeAuth {
    pub fn logins(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Authenticator for FakeAuth {
    async fn login(&self, credential: &str) -> Result<(), ServiceError> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        if credential == "good" {
            Ok(())
        } else {
            Err(ServiceError::Unauthorized("invalid token".into()))
        }
    }
}

pub fn config() -> GenerationConfig {
    GenerationConfig { max_length: 512, temperature: 0.7, top_p: 0.95, repetition_penalty: 1.0 }
}

pub fn session(reply: Reply, save_dir: &Path) -> (ChatSession, Arc<FakeLoader>, Arc<FakeAuth>) {
    let loader = FakeLoader::new(reply);
    let auth = Arc::new(FakeAuth::default());
    let models = ModelSessions::new(loader.clone(), auth.clone());
    let defaults = SessionDefaults { model_id: "fake/model".into(), credential: None, config: config() };
    (ChatSession::new(models, defaults, save_dir), loader, auth)
}
