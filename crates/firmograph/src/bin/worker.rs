//! Pipeline worker binary
//!
//! Hosts all five stage consumers in one process. Configuration comes from
//! the TOML file named by `FIRMOGRAPH_CONFIG` (defaults otherwise);
//! secrets come from the environment.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use dotenv::dotenv;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use firmograph::config::{ObjectStoreBackend, PipelineConfig};
use firmograph::processing::{
    Acquirer, Embedder, Indexer, Ingestor, Persister, PipelineRouter, PipelineWorker, RetryPolicy,
};
use firmograph::providers::amqp::{AmqpClient, AmqpPublisher};
use firmograph::providers::local::LocalObjectStore;
use firmograph::providers::openai::OpenAiEmbedder;
use firmograph::providers::pinecone::PineconeIndex;
use firmograph::providers::scrape::{DirectFetcher, ScrapingApiClient};
use firmograph::providers::{ObjectStore, TextFetcher};
use firmograph::storage::SqliteMetadataStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "firmograph=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("FIRMOGRAPH_CONFIG").ok().map(PathBuf::from);
    let config = PipelineConfig::load(config_path.as_deref())?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedding model: {}", config.embedding.model);
    tracing::info!("  - Output dimensions: {}", config.embedding.dimensions);
    tracing::info!("  - Scrape attempts: {}", config.scrape.max_attempts);
    tracing::info!("  - Metadata db: {}", config.metadata.db_path.display());

    let objects: Arc<dyn ObjectStore> = match config.object_store.backend {
        ObjectStoreBackend::Local => {
            Arc::new(LocalObjectStore::new(config.object_store.root_dir.clone())?)
        }
        ObjectStoreBackend::Gcp => {
            #[cfg(feature = "gcp")]
            {
                Arc::new(firmograph::providers::gcp::GcsObjectStore::new().await?)
            }
            #[cfg(not(feature = "gcp"))]
            {
                anyhow::bail!(
                    "object store backend is gcp but the worker was built without the gcp feature"
                )
            }
        }
    };

    let fetcher: Arc<dyn TextFetcher> = if config.scrape.api_key.is_some() {
        Arc::new(ScrapingApiClient::new(&config.scrape)?)
    } else {
        tracing::warn!("SCRAPING_API_KEY not set, fetching pages directly");
        Arc::new(DirectFetcher::new(Duration::from_secs(
            config.scrape.attempt_timeout_secs,
        ))?)
    };

    let embedding_provider = Arc::new(OpenAiEmbedder::new(&config.embedding)?);
    let index = Arc::new(PineconeIndex::new(&config.index)?);
    let metadata = Arc::new(SqliteMetadataStore::open(&config.metadata.db_path)?);

    let client = AmqpClient::connect(&config.amqp.url).await?;
    let publisher = Arc::new(AmqpPublisher::new(client.open_channel().await?));

    let router = Arc::new(PipelineRouter::new(
        Ingestor::new(objects, publisher.clone(), config.queues.acquire.clone()),
        Acquirer::new(
            fetcher,
            publisher.clone(),
            config.queues.embed.clone(),
            RetryPolicy::from(&config.scrape),
        ),
        Embedder::new(
            embedding_provider,
            publisher.clone(),
            config.queues.index.clone(),
            &config.embedding,
        ),
        Indexer::new(index, publisher, config.queues.persist.clone()),
        Persister::new(metadata),
    ));

    tracing::info!("Starting pipeline worker");
    PipelineWorker::run(&config, router).await?;

    Ok(())
}
