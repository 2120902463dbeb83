//! Hosted backend: Hugging Face Hub for credentials and model metadata,
//! Inference API for text generation.

use super::{Authenticator, GenerateRequest, Generated, ModelHandle, ModelLoader};
use crate::error::ServiceError;
use parking_lot::RwLock;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub const DEFAULT_HUB_URL: &str = "https://huggingface.co";
pub const DEFAULT_INFERENCE_URL: &str = "https://api-inference.huggingface.co";

struct Inner {
    http: Client,
    hub_url: String,
    inference_url: String,
    // set by a successful login, sent with every later request
    token: RwLock<Option<String>>,
}

/// Shared client for the hub and the inference API.
#[derive(Clone)]
pub struct HubClient {
    inner: Arc<Inner>,
}

impl HubClient {
    pub fn new(hub_url: impl Into<String>, inference_url: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                http: Client::new(),
                hub_url: hub_url.into().trim_end_matches('/').to_string(),
                inference_url: inference_url.into().trim_end_matches('/').to_string(),
                token: RwLock::new(None),
            }),
        }
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match self.inner.token.read().as_deref() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(req: RequestBuilder) -> Result<Response, ServiceError> {
        let res = req.send().await.map_err(map_transport_error)?;
        if res.status().is_success() {
            return Ok(res);
        }
        let status = res.status();
        let body = res
            .text()
            .await
            .unwrap_or_else(|_| "failed to read error body".to_string());
        Err(map_http_error(status, body))
    }

    /// Reads `eos_token_id` from the model's `config.json`; absent when the
    /// file is unavailable or does not name one.
    async fn fetch_eos_token_id(&self, model_id: &str) -> Option<u32> {
        let url = format!("{}/{}/resolve/main/config.json", self.inner.hub_url, model_id);
        let res = Self::send(self.authorized(self.inner.http.get(url))).await.ok()?;
        let config: Value = res.json().await.ok()?;
        eos_from_config(&config)
    }
}

fn eos_from_config(config: &Value) -> Option<u32> {
    let id = match config.get("eos_token_id")? {
        Value::Array(ids) => ids.first()?.as_u64(),
        v => v.as_u64(),
    };
    id.and_then(|id| u32::try_from(id).ok())
}

fn map_transport_error(err: reqwest::Error) -> ServiceError {
    if err.is_connect() || err.is_timeout() {
        ServiceError::Connection(err.to_string())
    } else {
        ServiceError::Other(err.to_string())
    }
}

fn map_http_error(status: StatusCode, body: String) -> ServiceError {
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error)
        .unwrap_or(body);
    // empty bodies still need a cause
    let message = if message.trim().is_empty() {
        status.canonical_reason().unwrap_or("no response body").to_string()
    } else {
        message
    };
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ServiceError::Unauthorized(message),
        StatusCode::NOT_FOUND => ServiceError::NotFound(message),
        StatusCode::TOO_MANY_REQUESTS => ServiceError::RateLimited(message),
        _ => ServiceError::Other(format!("{}: {}", status.as_u16(), message)),
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Serialize)]
struct InferenceParameters {
    max_new_tokens: u32,
    temperature: f32,
    top_p: f32,
    repetition_penalty: f32,
    num_return_sequences: u32,
    do_sample: bool,
    return_full_text: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pad_token_id: Option<u32>,
}

#[async_trait::async_trait]
impl Authenticator for HubClient {
    async fn login(&self, credential: &str) -> Result<(), ServiceError> {
        let url = format!("{}/api/whoami-v2", self.inner.hub_url);
        Self::send(self.inner.http.get(url).bearer_auth(credential)).await?;
        *self.inner.token.write() = Some(credential.to_string());
        tracing::info!("hub login succeeded");
        Ok(())
    }
}

#[async_trait::async_trait]
impl ModelLoader for HubClient {
    async fn load(&self, model_id: &str) -> Result<Arc<dyn ModelHandle>, ServiceError> {
        let url = format!("{}/api/models/{}", self.inner.hub_url, model_id);
        Self::send(self.authorized(self.inner.http.get(url)))
            .await
            .map_err(|e| match e {
                ServiceError::NotFound(msg) => ServiceError::NotFound(format!("{model_id}: {msg}")),
                e => e,
            })?;
        let eos_token_id = self.fetch_eos_token_id(model_id).await;
        tracing::debug!(model_id, ?eos_token_id, "resolved hub model");
        Ok(Arc::new(HubModel {
            client: self.clone(),
            model_id: model_id.to_string(),
            eos_token_id,
        }))
    }
}

/// Handle for a model served by the inference API.
pub struct HubModel {
    client: HubClient,
    model_id: String,
    eos_token_id: Option<u32>,
}

#[async_trait::async_trait]
impl ModelHandle for HubModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn eos_token_id(&self) -> Option<u32> {
        self.eos_token_id
    }

    async fn generate(&self, prompt: &str, req: &GenerateRequest) -> Result<Vec<Generated>, ServiceError> {
        let inner = &self.client.inner;
        let url = format!("{}/models/{}", inner.inference_url, self.model_id);
        let body = InferenceRequest {
            inputs: prompt,
            parameters: InferenceParameters {
                max_new_tokens: req.config.max_length,
                temperature: req.config.temperature,
                top_p: req.config.top_p,
                repetition_penalty: req.config.repetition_penalty,
                num_return_sequences: req.num_return_sequences,
                do_sample: true,
                return_full_text: true,
                pad_token_id: req.pad_token_id,
            },
        };
        let res = HubClient::send(self.client.authorized(inner.http.post(url).json(&body))).await?;
        res.json::<Vec<Generated>>()
            .await
            .map_err(|e| ServiceError::Other(format!("failed to parse inference response: {e}")))
    }
}
