//! Integration test for real llama.cpp inference.
//! Requires the `llama` feature and MODEL_PATH pointing to a local GGUF.
#![cfg(feature = "llama")]

#[tokio::test]
#[ignore = "needs a local GGUF model"]
async fn real_inference_returns_full_text() -> anyhow::Result<()> {
    use deepseek_chat::model::{llama::LlamaLoader, GenerationConfig, ModelLoader};
    use deepseek_chat::transcript::{Role, Transcript};
    use deepseek_chat::turn::run_turn;
    use std::{env, fs, path::PathBuf};
    use walkdir::WalkDir;

    // Resolve model path: prefer $MODEL_PATH, else search ./models for any .gguf
    let model_path: PathBuf = env::var("MODEL_PATH")
        .ok()
        .map(PathBuf::from)
        .filter(|p| fs::metadata(p).is_ok())
        .or_else(|| {
            WalkDir::new("./models")
                .into_iter()
                .filter_map(Result::ok)
                .map(|e| e.into_path())
                .find(|p| p.extension().and_then(|s| s.to_str()) == Some("gguf"))
        })
        .expect("No model found. Set MODEL_PATH or place a .gguf under ./models");

    let loader = LlamaLoader::new(2048, 256, 0)?;
    let handle = loader.load(model_path.to_str().unwrap()).await?;
    assert!(handle.eos_token_id().is_some());

    let config = GenerationConfig { max_length: 96, temperature: 0.4, top_p: 0.9, repetition_penalty: 1.1 };
    let mut t = Transcript::new();
    let out = run_turn(&mut t, Some(handle.as_ref()), "The capital of France is", &config).await?;

    assert!(out.turn.content.starts_with("The capital of France is"));
    assert_eq!(t.len(), 3);
    assert_eq!(t.last().unwrap().role, Role::Assistant);
    Ok(())
}
