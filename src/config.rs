use crate::model::hub::{DEFAULT_HUB_URL, DEFAULT_INFERENCE_URL};
use crate::model::GenerationConfig;
use clap::{Parser, ValueEnum};
use serde::Serialize;

pub const DEFAULT_MODEL: &str = "deepseek-ai/DeepSeek-V3-0324";

/// Model menu offered to the presentation layer, `(label, id)`.
pub const MODEL_OPTIONS: &[(&str, &str)] = &[("DeepSeek-V3-0324", DEFAULT_MODEL)];

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Hugging Face Inference API
    Hub,
    /// local GGUF through llama.cpp
    Llama,
}

#[derive(Parser, Debug, Clone)]
pub struct Config {
    #[arg(long, env, default_value = "0.0.0.0:8080")]
    pub bind_addr: String,
    #[arg(long, env = "HUGGINGFACE_API_KEY", hide_env_values = true)]
    pub huggingface_api_key: Option<String>,
    #[arg(long, env, default_value = DEFAULT_MODEL)]
    pub default_model: String,
    #[arg(long, env, default_value_t = 1024)]
    pub default_max_length: u32,
    #[arg(long, env, default_value_t = 0.7)]
    pub default_temperature: f32,
    #[arg(long, env, default_value_t = 0.95)]
    pub default_top_p: f32,
    #[arg(long, env, default_value_t = 1.0)]
    pub default_repetition_penalty: f32,
    #[arg(long, env, value_enum, default_value_t = Backend::Hub)]
    pub backend: Backend,
    #[arg(long, env, default_value = DEFAULT_HUB_URL)]
    pub hub_url: String,
    #[arg(long, env, default_value = DEFAULT_INFERENCE_URL)]
    pub inference_url: String,
    #[arg(long, env, default_value = ".")]
    pub save_dir: String,
    #[arg(long, env, default_value_t = 4096)]
    pub n_ctx: u32,
    #[arg(long, env, default_value_t = 256)]
    pub n_batch: usize,
    #[arg(long, env, default_value_t = 0)]
    pub n_gpu_layers: u32,
}

impl Config {
    pub fn generation(&self) -> GenerationConfig {
        GenerationConfig {
            max_length: self.default_max_length,
            temperature: self.default_temperature,
            top_p: self.default_top_p,
            repetition_penalty: self.default_repetition_penalty,
        }
    }

    /// The fixed menu, plus the configured default when it is not on it.
    pub fn model_menu(&self) -> Vec<ModelOption> {
        let mut menu: Vec<ModelOption> = MODEL_OPTIONS
            .iter()
            .map(|(label, id)| ModelOption { label: label.to_string(), id: id.to_string() })
            .collect();
        if !menu.iter().any(|m| m.id == self.default_model) {
            menu.push(ModelOption { label: self.default_model.clone(), id: self.default_model.clone() });
        }
        menu
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModelOption {
    pub label: String,
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_values() {
        let cfg = Config::parse_from(["deepseek-chat"]);
        assert_eq!(cfg.default_model, DEFAULT_MODEL);
        assert_eq!(cfg.backend, Backend::Hub);
        assert_eq!(cfg.generation().max_length, 1024);
        assert!(crate::validate::check_config(&cfg.generation()).is_ok());
    }

    #[test]
    fn custom_default_joins_menu() {
        let cfg = Config::parse_from(["deepseek-chat", "--default-model", "org/tiny"]);
        let ids: Vec<_> = cfg.model_menu().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, [DEFAULT_MODEL, "org/tiny"]);
    }
}
