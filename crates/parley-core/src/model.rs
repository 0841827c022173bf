//! Supported models and providers.
//!
//! | Selector | OpenRouter model | DeepSeek API model |
//! |----------|------------------|--------------------|
//! | `deepseek-v3` | `deepseek/deepseek-chat` | `deepseek-chat` |
//! | `deepseek-r1` | `deepseek/deepseek-r1` | `deepseek-reasoner` |
//!
//! Both models share the same generation parameters. Only the system prompt
//! and the credential differ.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParleyError;

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 4096;

const LANGUAGE_RULE: &str = "Always respond in the same language as the user's input. \
If the user writes in German, respond in German. If they write in English, respond in English. \
If they write in Urdu, Hindi, or any other language, respond in that same language. \
Match the user's language exactly.";

/// One of the two models the client can talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelSelector {
    #[default]
    #[serde(rename = "deepseek-v3")]
    DeepSeekV3,
    #[serde(rename = "deepseek-r1")]
    DeepSeekR1,
}

impl ModelSelector {
    pub const ALL: [ModelSelector; 2] = [ModelSelector::DeepSeekV3, ModelSelector::DeepSeekR1];

    /// Stable identifier used in config files and on the command line.
    pub fn id(&self) -> &'static str {
        match self {
            ModelSelector::DeepSeekV3 => "deepseek-v3",
            ModelSelector::DeepSeekR1 => "deepseek-r1",
        }
    }

    /// Human-readable model name.
    pub fn display_name(&self) -> &'static str {
        match self {
            ModelSelector::DeepSeekV3 => "DeepSeek V3",
            ModelSelector::DeepSeekR1 => "DeepSeek R1",
        }
    }

    /// Name of the environment key holding this model's API key.
    pub fn credential_key(&self) -> &'static str {
        match self {
            ModelSelector::DeepSeekV3 => "DEEPSEEK_V3_API_KEY",
            ModelSelector::DeepSeekR1 => "DEEPSEEK_R1_API_KEY",
        }
    }

    /// First assistant turn of every new conversation.
    pub fn greeting(&self) -> String {
        format!(
            "Hallo! Ich bin ein KI-Chatbot, der von {} betrieben wird.",
            self.display_name()
        )
    }

    /// Resolves the request parameters for this model on `provider`.
    pub fn profile(&self, provider: Provider) -> ModelProfile {
        let remote_model = match (provider, self) {
            (Provider::OpenRouter, ModelSelector::DeepSeekV3) => "deepseek/deepseek-chat",
            (Provider::OpenRouter, ModelSelector::DeepSeekR1) => "deepseek/deepseek-r1",
            (Provider::DeepSeek, ModelSelector::DeepSeekV3) => "deepseek-chat",
            (Provider::DeepSeek, ModelSelector::DeepSeekR1) => "deepseek-reasoner",
        };
        let persona = match self {
            ModelSelector::DeepSeekV3 => "You are DeepSeek V3, a helpful AI assistant.",
            ModelSelector::DeepSeekR1 => "You are DeepSeek R1, a reasoning-focused AI assistant.",
        };

        ModelProfile {
            remote_model: remote_model.to_string(),
            system_prompt: format!("{persona} {LANGUAGE_RULE}"),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }
}

impl fmt::Display for ModelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ModelSelector {
    type Err = ParleyError;

    /// Accepts the full id (`deepseek-v3`) or the short form (`v3`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deepseek-v3" | "v3" => Ok(ModelSelector::DeepSeekV3),
            "deepseek-r1" | "r1" => Ok(ModelSelector::DeepSeekR1),
            other => Err(ParleyError::config(format!(
                "Unknown model '{other}' (expected deepseek-v3 or deepseek-r1)"
            ))),
        }
    }
}

/// Hosting service that receives the completion call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenRouter,
    DeepSeek,
}

impl Provider {
    /// Default chat-completions URL of the provider.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Provider::OpenRouter => "https://openrouter.ai/api/v1/chat/completions",
            Provider::DeepSeek => "https://api.deepseek.com/chat/completions",
        }
    }

    /// Label used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            Provider::OpenRouter => "OpenRouter",
            Provider::DeepSeek => "DeepSeek",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Provider {
    type Err = ParleyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openrouter" => Ok(Provider::OpenRouter),
            "deepseek" => Ok(Provider::DeepSeek),
            other => Err(ParleyError::config(format!(
                "Unknown provider '{other}' (expected openrouter or deepseek)"
            ))),
        }
    }
}

/// Fixed request parameters for a model on a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelProfile {
    pub remote_model: String,
    pub system_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}
