//! Configuration and credential types.
//!
//! `AppConfig` is read from `config.toml`, `SecretConfig` from `secret.json`.
//! Credential lookup is a pure function over an [`EnvSnapshot`] so callers
//! decide where values come from.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{ModelSelector, Provider};

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_client_title() -> String {
    "DeepSeek Deutsch Chatbot".to_string()
}

fn default_client_referer() -> String {
    "http://localhost".to_string()
}

/// Application settings from `config.toml`.
///
/// Every field has a default, so an empty or missing file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model used when none is given on the command line
    #[serde(default)]
    pub default_model: ModelSelector,
    /// Hosting service that receives requests
    #[serde(default)]
    pub provider: Provider,
    /// Overrides the provider's chat-completions URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Whole-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Sent as `X-Title`
    #[serde(default = "default_client_title")]
    pub client_title: String,
    /// Sent as `HTTP-Referer`
    #[serde(default = "default_client_referer")]
    pub client_referer: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_model: ModelSelector::default(),
            provider: Provider::default(),
            endpoint: None,
            request_timeout_secs: default_request_timeout_secs(),
            client_title: default_client_title(),
            client_referer: default_client_referer(),
        }
    }
}

impl AppConfig {
    /// URL requests are posted to.
    pub fn endpoint_url(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.provider.endpoint())
    }
}

/// API keys stored in `secret.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deepseek_v3_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deepseek_r1_api_key: Option<String>,
}

impl SecretConfig {
    /// Entries keyed by the environment variable names they stand in for.
    pub fn as_env_entries(&self) -> Vec<(String, String)> {
        let mut entries = Vec::new();
        if let Some(key) = &self.deepseek_v3_api_key {
            entries.push((ModelSelector::DeepSeekV3.credential_key().to_string(), key.clone()));
        }
        if let Some(key) = &self.deepseek_r1_api_key {
            entries.push((ModelSelector::DeepSeekR1.credential_key().to_string(), key.clone()));
        }
        entries
    }
}

/// Snapshot of the two places credentials can come from.
///
/// `build_time` holds values baked into the binary, `runtime` holds values
/// injected when the program starts (process environment, secret file).
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    pub build_time: HashMap<String, String>,
    pub runtime: HashMap<String, String>,
}

impl EnvSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_build_time(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.build_time.insert(key.into(), value.into());
        self
    }

    pub fn with_runtime(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.runtime.insert(key.into(), value.into());
        self
    }
}

/// Resolved API keys, one optional value per model.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    deepseek_v3: Option<String>,
    deepseek_r1: Option<String>,
}

impl Credentials {
    pub fn new(deepseek_v3: Option<String>, deepseek_r1: Option<String>) -> Self {
        Self {
            deepseek_v3: non_empty(deepseek_v3),
            deepseek_r1: non_empty(deepseek_r1),
        }
    }

    /// API key for `model`, if configured.
    pub fn for_model(&self, model: ModelSelector) -> Option<&str> {
        match model {
            ModelSelector::DeepSeekV3 => self.deepseek_v3.as_deref(),
            ModelSelector::DeepSeekR1 => self.deepseek_r1.as_deref(),
        }
    }

    pub fn has(&self, model: ModelSelector) -> bool {
        self.for_model(model).is_some()
    }
}

// Keys never reach logs through Debug.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("deepseek_v3", &self.deepseek_v3.as_ref().map(|_| "<redacted>"))
            .field("deepseek_r1", &self.deepseek_r1.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Resolves both API keys from `snapshot`.
///
/// Build-time values win only when both keys are present and non-empty
/// there; otherwise both keys are read from the runtime source. Empty values
/// count as absent. Missing keys are not an error here: the submission that
/// needs one reports it.
pub fn resolve_credentials(snapshot: &EnvSnapshot) -> Credentials {
    let lookup = |source: &HashMap<String, String>, model: ModelSelector| {
        non_empty(source.get(model.credential_key()).cloned())
    };

    let build_v3 = lookup(&snapshot.build_time, ModelSelector::DeepSeekV3);
    let build_r1 = lookup(&snapshot.build_time, ModelSelector::DeepSeekR1);
    if build_v3.is_some() && build_r1.is_some() {
        tracing::debug!("Using build-time credentials");
        return Credentials::new(build_v3, build_r1);
    }

    tracing::debug!("Using runtime credentials");
    Credentials::new(
        lookup(&snapshot.runtime, ModelSelector::DeepSeekV3),
        lookup(&snapshot.runtime, ModelSelector::DeepSeekR1),
    )
}
