//! Builds a chat session from config files, flags and the environment.

use anyhow::{Context, Result};
use clap::Args;
use parley_core::config::{AppConfig, EnvSnapshot, SecretConfig, resolve_credentials};
use parley_core::model::{ModelSelector, Provider};
use parley_infrastructure::paths::ParleyPaths;
use parley_infrastructure::storage::{ConfigStorage, SecretStorage};
use parley_interaction::{ChatSession, CompletionClient};

/// Flags shared by `chat` and `ask`.
#[derive(Args, Debug, Clone, Default)]
pub struct SessionArgs {
    /// Model to talk to (deepseek-v3 or deepseek-r1)
    #[arg(short, long)]
    pub model: Option<ModelSelector>,

    /// Hosting service (openrouter or deepseek)
    #[arg(short, long)]
    pub provider: Option<Provider>,
}

/// Everything a command needs to start talking.
pub struct SessionSetup {
    pub session: ChatSession,
    pub paths: ParleyPaths,
    pub config: AppConfig,
}

/// Loads config and secrets, resolves credentials and opens a session.
pub fn open_session(args: &SessionArgs) -> Result<SessionSetup> {
    let paths = ParleyPaths::new().context("Failed to resolve config directory")?;

    let mut config = ConfigStorage::with_path(paths.config_file())
        .load()
        .with_context(|| format!("Failed to load {}", paths.config_file().display()))?;
    if let Some(provider) = args.provider {
        config.provider = provider;
    }
    let model = args.model.unwrap_or(config.default_model);

    let secret = SecretStorage::with_path(paths.secret_file()).load()?;
    let snapshot = credential_snapshot(build_time_entries(), std::env::vars(), &secret);
    let credentials = resolve_credentials(&snapshot);

    tracing::debug!(
        model = %model,
        provider = %config.provider,
        endpoint = config.endpoint_url(),
        credentials = ?credentials,
        "Opening session"
    );

    let client = CompletionClient::from_config(&config)?;
    Ok(SessionSetup {
        session: ChatSession::new(model, credentials, client),
        paths,
        config,
    })
}

/// Keys baked in when the binary was compiled.
fn build_time_entries() -> Vec<(String, String)> {
    let baked = [
        ("DEEPSEEK_V3_API_KEY", option_env!("DEEPSEEK_V3_API_KEY")),
        ("DEEPSEEK_R1_API_KEY", option_env!("DEEPSEEK_R1_API_KEY")),
    ];
    baked
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key.to_string(), v.to_string())))
        .collect()
}

/// Combines the credential sources into one snapshot.
///
/// Runtime values come from the process environment; non-empty keys in
/// `secret.json` take precedence over it.
pub fn credential_snapshot(
    build_time: impl IntoIterator<Item = (String, String)>,
    process_env: impl IntoIterator<Item = (String, String)>,
    secret: &SecretConfig,
) -> EnvSnapshot {
    let wanted: Vec<&str> = ModelSelector::ALL
        .iter()
        .map(|model| model.credential_key())
        .collect();

    let mut snapshot = EnvSnapshot::new();
    snapshot.build_time.extend(build_time);
    snapshot.runtime.extend(
        process_env
            .into_iter()
            .filter(|(key, _)| wanted.contains(&key.as_str())),
    );
    snapshot.runtime.extend(
        secret
            .as_env_entries()
            .into_iter()
            .filter(|(_, value)| !value.trim().is_empty()),
    );
    snapshot
}
