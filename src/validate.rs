use crate::model::GenerationConfig;
use std::ops::RangeInclusive;

pub const MAX_LENGTH: RangeInclusive<u32> = 32..=2048;
pub const TEMPERATURE: RangeInclusive<f32> = 0.01..=1.0;
pub const TOP_P: RangeInclusive<f32> = 0.01..=1.0;
pub const REPETITION_PENALTY: RangeInclusive<f32> = 1.0..=2.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidParam {
    #[error("{name} must be within {min}..={max}, got {value}")]
    OutOfRange { name: &'static str, min: f64, max: f64, value: f64 },

    #[error("prompt must not be empty")]
    EmptyPrompt,
}

fn check<T>(name: &'static str, range: &RangeInclusive<T>, value: T) -> Result<(), InvalidParam>
where
    T: PartialOrd + Copy + Into<f64>,
{
    // NaN fails `contains`, which is what we want
    if range.contains(&value) {
        return Ok(());
    }
    Err(InvalidParam::OutOfRange {
        name,
        min: (*range.start()).into(),
        max: (*range.end()).into(),
        value: value.into(),
    })
}

pub fn check_config(cfg: &GenerationConfig) -> Result<(), InvalidParam> {
    check("max_length", &MAX_LENGTH, cfg.max_length)?;
    check("temperature", &TEMPERATURE, cfg.temperature)?;
    check("top_p", &TOP_P, cfg.top_p)?;
    check("repetition_penalty", &REPETITION_PENALTY, cfg.repetition_penalty)?;
    Ok(())
}

pub fn check_prompt(text: &str) -> Result<(), InvalidParam> {
    if text.trim().is_empty() {
        return Err(InvalidParam::EmptyPrompt);
    }
    Ok(())
}
