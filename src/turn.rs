//! Produces one assistant turn from the latest user input.

use crate::error::GenerationError;
use crate::model::{GenerateRequest, GenerationConfig, ModelHandle};
use crate::transcript::{ChatTurn, Transcript};
use std::time::{Duration, Instant};

#[derive(Clone, Debug, PartialEq)]
pub struct TurnOutcome {
    pub turn: ChatTurn,
    pub elapsed: Duration,
}

/// Appends the user's turn, then asks `handle` for a reply.
///
/// The user's turn stays in the transcript whatever happens next; the
/// assistant turn is appended only on success. Nothing is retried.
pub async fn run_turn(
    transcript: &mut Transcript,
    handle: Option<&dyn ModelHandle>,
    user_text: &str,
    config: &GenerationConfig,
) -> Result<TurnOutcome, GenerationError> {
    transcript.append(ChatTurn::user(user_text));

    let model = handle.map(|h| h.model_id()).unwrap_or("none");
    let result = generate(handle, user_text, config).await;
    match result {
        Ok((content, elapsed)) => {
            metrics::histogram!("chat_turn_seconds").record(elapsed.as_secs_f64());
            tracing::info!(
                model,
                elapsed_ms = elapsed.as_millis() as u64,
                chars = content.len(),
                "turn complete"
            );
            let turn = ChatTurn::assistant(content);
            transcript.append(turn.clone());
            Ok(TurnOutcome { turn, elapsed })
        }
        Err(e) => {
            metrics::counter!("chat_turn_errors_total", "kind" => e.kind()).increment(1);
            tracing::warn!(model, kind = e.kind(), error = %e, "turn failed");
            Err(e)
        }
    }
}

async fn generate(
    handle: Option<&dyn ModelHandle>,
    user_text: &str,
    config: &GenerationConfig,
) -> Result<(String, Duration), GenerationError> {
    let handle = handle.ok_or(GenerationError::NoModel)?;
    let req = GenerateRequest {
        config: config.clone(),
        num_return_sequences: 1,
        pad_token_id: handle.eos_token_id(),
    };

    let started = Instant::now();
    let output = handle
        .generate(user_text, &req)
        .await
        .map_err(GenerationError::classify)?;
    let elapsed = started.elapsed();

    let first = output
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::Unknown("backend returned no candidates".to_string()))?;
    Ok((first.generated_text, elapsed))
}
