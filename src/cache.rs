//! Memoizing resolver from `(model id, credential presence)` to a model handle.

use crate::error::ModelLoadError;
use crate::model::{Authenticator, ModelHandle, ModelLoader};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HandleKey {
    pub model_id: String,
    pub with_credential: bool,
}

/// Holds at most one live handle per key until the process exits.
///
/// Failed acquisitions are not cached; the next call for the same key tries
/// again. Population is not serialised per key, so concurrent callers must
/// hold the owning session's lock.
pub struct ModelSessions {
    loader: Arc<dyn ModelLoader>,
    auth: Arc<dyn Authenticator>,
    handles: Mutex<HashMap<HandleKey, Arc<dyn ModelHandle>>>,
}

impl ModelSessions {
    pub fn new(loader: Arc<dyn ModelLoader>, auth: Arc<dyn Authenticator>) -> Self {
        Self { loader, auth, handles: Mutex::new(HashMap::new()) }
    }

    pub fn len(&self) -> usize {
        self.handles.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.lock().is_empty()
    }

    pub async fn acquire(
        &self,
        model_id: &str,
        credential: Option<&str>,
    ) -> Result<Arc<dyn ModelHandle>, ModelLoadError> {
        let key = HandleKey { model_id: model_id.to_string(), with_credential: credential.is_some() };
        let cached = self.handles.lock().get(&key).cloned();
        if let Some(handle) = cached {
            tracing::debug!(model_id, with_credential = key.with_credential, "model cache hit");
            return Ok(handle);
        }

        tracing::info!(model_id, with_credential = key.with_credential, "loading model");
        let handle = match self.construct(model_id, credential).await {
            Ok(handle) => handle,
            Err(e) => {
                metrics::counter!("model_loads_total", "outcome" => e.kind()).increment(1);
                tracing::warn!(model_id, error = %e, "model load failed");
                return Err(e);
            }
        };
        metrics::counter!("model_loads_total", "outcome" => "ok").increment(1);

        Ok(self.handles.lock().entry(key).or_insert(handle).clone())
    }

    async fn construct(
        &self,
        model_id: &str,
        credential: Option<&str>,
    ) -> Result<Arc<dyn ModelHandle>, ModelLoadError> {
        if let Some(credential) = credential {
            self.auth.login(credential).await.map_err(ModelLoadError::auth)?;
        }
        Ok(self.loader.load(model_id).await?)
    }
}
