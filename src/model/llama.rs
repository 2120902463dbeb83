// Local llama.cpp backend using `llama-cpp-2` (enabled with feature `llama`).
// The model identifier is the path of a GGUF file.

use super::{GenerateRequest, Generated, ModelHandle, ModelLoader};
use crate::error::ServiceError;
use anyhow::{anyhow, Context, Result};
use llama_cpp_2::context::params::LlamaContextParams;
use llama_cpp_2::llama_backend::LlamaBackend as LLBackend;
use llama_cpp_2::llama_batch::LlamaBatch;
use llama_cpp_2::model::params::LlamaModelParams;
use llama_cpp_2::model::{AddBos, LlamaModel, Special};
use llama_cpp_2::sampling::LlamaSampler;
use llama_cpp_2::{send_logs_to_tracing, LogOptions};
use std::num::NonZeroU32;
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Loads GGUF models. llama.cpp may only be initialised once per process,
/// so one loader owns the backend and shares it with every handle.
#[derive(Clone)]
pub struct LlamaLoader {
    backend: Arc<LLBackend>,
    n_ctx: u32,
    n_batch: usize,
    n_gpu_layers: u32,
}

impl LlamaLoader {
    pub fn new(n_ctx: u32, n_batch: usize, n_gpu_layers: u32) -> Result<Self> {
        // route llama.cpp logs to tracing so they appear in server logs when RUST_LOG is set
        send_logs_to_tracing(LogOptions::default());
        let backend = LLBackend::init().context("init llama backend")?;
        Ok(Self { backend: Arc::new(backend), n_ctx, n_batch, n_gpu_layers })
    }
}

#[async_trait::async_trait]
impl ModelLoader for LlamaLoader {
    async fn load(&self, model_id: &str) -> Result<Arc<dyn ModelHandle>, ServiceError> {
        let path = Path::new(model_id);
        if !path.is_file() {
            return Err(ServiceError::NotFound(format!("no GGUF file at {model_id}")));
        }

        let mut model_params = LlamaModelParams::default();
        if self.n_gpu_layers > 0 {
            model_params = model_params.with_n_gpu_layers(self.n_gpu_layers);
        }
        let model = LlamaModel::load_from_file(&self.backend, path, &model_params)
            .map_err(|e| ServiceError::Other(format!("load GGUF model: {e}")))?;

        Ok(Arc::new(LlamaHandle {
            backend: self.backend.clone(),
            model,
            model_id: model_id.to_string(),
            n_ctx: self.n_ctx,
            n_batch: self.n_batch,
        }))
    }
}

pub struct LlamaHandle {
    backend: Arc<LLBackend>,
    model: LlamaModel,
    model_id: String,
    n_ctx: u32,
    n_batch: usize,
}

impl LlamaHandle {
    fn complete(&self, prompt: &str, req: &GenerateRequest) -> Result<String> {
        // Fresh context per turn; no state carries between turns.
        let ctx_params = LlamaContextParams::default()
            .with_n_ctx(NonZeroU32::new(self.n_ctx))
            .with_n_threads(num_cpus::get() as i32)
            .with_n_threads_batch(num_cpus::get() as i32);
        let mut ctx = self
            .model
            .new_context(&self.backend, ctx_params)
            .context("create llama context")?;

        let tokens = self
            .model
            .str_to_token(prompt, AddBos::Always)
            .context("tokenize prompt")?;
        if tokens.is_empty() {
            return Err(anyhow!("prompt produced no tokens"));
        }

        // max_length bounds prompt + completion, like the hosted pipeline
        let budget = (req.config.max_length as usize).min(ctx.n_ctx() as usize);
        let max_new = budget.saturating_sub(tokens.len());
        if max_new == 0 {
            return Err(anyhow!(
                "prompt of {} tokens exceeds max_length {}",
                tokens.len(),
                req.config.max_length
            ));
        }

        let mut batch = LlamaBatch::new(self.n_batch.max(tokens.len()), 1);
        let last_index = (tokens.len() - 1) as i32;
        for (i, token) in (0_i32..).zip(tokens.into_iter()) {
            batch.add(token, i, &[0], i == last_index)?;
        }
        ctx.decode(&mut batch).context("decode prompt")?;

        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or_default();
        let mut sampler = LlamaSampler::chain_simple([
            LlamaSampler::penalties(64, req.config.repetition_penalty, 0.0, 0.0),
            LlamaSampler::top_p(req.config.top_p, 1),
            LlamaSampler::temp(req.config.temperature),
            LlamaSampler::dist(seed),
        ]);

        let mut n_cur = batch.n_tokens();
        let mut out = String::from(prompt);
        let mut decoder = encoding_rs::UTF_8.new_decoder();

        for _ in 0..max_new {
            let token = sampler.sample(&ctx, batch.n_tokens() - 1);
            sampler.accept(token);

            if self.model.is_eog_token(token) {
                break;
            }

            let bytes = self.model.token_to_bytes(token, Special::Tokenize)?;
            let mut piece = String::with_capacity(16);
            let _ = decoder.decode_to_string(&bytes, &mut piece, false);
            out.push_str(&piece);

            batch.clear();
            batch.add(token, n_cur, &[0], true)?;
            n_cur += 1;
            ctx.decode(&mut batch).context("decode step")?;
        }

        Ok(out)
    }
}

#[async_trait::async_trait]
impl ModelHandle for LlamaHandle {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn eos_token_id(&self) -> Option<u32> {
        u32::try_from(self.model.token_eos().0).ok()
    }

    async fn generate(&self, prompt: &str, req: &GenerateRequest) -> Result<Vec<Generated>, ServiceError> {
        let text = self
            .complete(prompt, req)
            .map_err(|e| ServiceError::Other(format!("{e:#}")))?;
        Ok(vec![Generated { generated_text: text }])
    }
}
