//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! ChatService is generic over its repository, but AppState pins it to the
//! SQLite implementation.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use parley_core::chat::service::ChatService;
use parley_core::llm::box_provider::BoxLlmProvider;
use parley_infra::config::{apply_env_overrides, load_global_config, resolve_database_url};
use parley_infra::llm::ollama::OllamaProvider;
use parley_infra::sqlite::chat::SqliteChatRepository;
use parley_infra::sqlite::pool::{resolve_data_dir, DatabasePool};
use parley_types::config::GlobalConfig;

/// Chat service pinned to the SQLite repository.
pub type ConcreteChatService = ChatService<SqliteChatRepository>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub config: Arc<GlobalConfig>,
}

impl AppState {
    /// Initialize the application state: load config, connect to DB, wire services.
    ///
    /// `config_path` overrides the default `{data_dir}/config.toml`.
    pub async fn init(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| data_dir.join("config.toml"));
        let mut config = load_global_config(&config_path).await;
        apply_env_overrides(&mut config);

        let db_url = resolve_database_url(&config);
        let db_pool = DatabasePool::new(&db_url)
            .await
            .with_context(|| format!("failed to open database {db_url}"))?;

        let ollama = OllamaProvider::from_config(&config.model)
            .context("failed to build the Ollama HTTP client")?;
        let provider = BoxLlmProvider::new(ollama);

        tracing::info!(
            model = %config.model.model,
            base_url = %config.model.base_url,
            context_window = config.chat.context_window.size(),
            "Application state ready"
        );

        Ok(Self::from_parts(db_pool, provider, config))
    }

    /// Wire the state from an open pool and a provider.
    pub fn from_parts(db_pool: DatabasePool, provider: BoxLlmProvider, config: GlobalConfig) -> Self {
        let chat_service = ChatService::new(
            SqliteChatRepository::new(db_pool),
            provider,
            config.model.model.clone(),
        )
        .with_context_window(config.chat.context_window);

        Self {
            chat_service: Arc::new(chat_service),
            config: Arc::new(config),
        }
    }
}
