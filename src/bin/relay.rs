//! Spark relay server.
//!
//! Usage: `spark-relay [CONFIG_PATH]`. Without a path, the default config
//! location is tried; environment variables override either.

use std::path::PathBuf;
use std::sync::Arc;

use spark::llm::AnthropicClient;
use spark::{RelayService, ServiceSettings, SparkConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = SparkConfig::load(config_path.as_deref())?;
    config.validate()?;

    if config.llm.api_key.is_empty() {
        tracing::warn!(
            "CLAUDE_API_KEY is not set: task analysis will always fall back and reports will fail"
        );
    }
    tracing::info!(
        model = %config.llm.model,
        base_url = %config.llm.base_url,
        "using Anthropic provider"
    );

    let client = AnthropicClient::new((&config.llm).into());
    let settings = ServiceSettings::from_config(&config)?;
    let service = Arc::new(RelayService::new(Arc::new(client), settings));

    spark::serve(service, &config.server).await?;
    Ok(())
}
