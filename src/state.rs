use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::clients::{MetadataProvider, TmdbClient};
use crate::config::Config;
use crate::db::{CatalogStore, Store};
use crate::domain::events::CatalogEvent;
use crate::library::trash_cache::TrashCache;
use crate::services::{
    CatalogService, RateLimiter, ReconcileService, SearchService, SyncOrchestrator, TrashService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub catalog: Arc<CatalogService>,

    pub event_bus: broadcast::Sender<CatalogEvent>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let provider = Arc::new(TmdbClient::new(&config.provider)?);
        let (event_bus, _) = broadcast::channel(config.general.event_bus_buffer_size);

        let catalog = Arc::new(build_catalog(
            &config,
            Arc::new(store.clone()),
            provider,
            event_bus.clone(),
        ));

        Ok(Self {
            config: Arc::new(config),
            store,
            catalog,
            event_bus,
        })
    }
}

/// Assembles the catalog services over any store/provider pair.
#[must_use]
pub fn build_catalog(
    config: &Config,
    store: Arc<dyn CatalogStore>,
    provider: Arc<dyn MetadataProvider>,
    event_bus: broadcast::Sender<CatalogEvent>,
) -> CatalogService {
    let limiter = Arc::new(RateLimiter::from_config(&config.sync));
    let engine = Arc::new(ReconcileService::new(store.clone(), provider.clone()));
    let sync = Arc::new(SyncOrchestrator::new(engine.clone(), limiter));
    let trash = Arc::new(TrashService::new(
        store.clone(),
        TrashCache::new(&config.trash.path, config.trash.retention_days),
    ));
    let search = Arc::new(SearchService::new(store, provider));

    CatalogService::new(
        engine,
        sync,
        trash,
        search,
        Duration::from_secs(config.session.draft_ttl_seconds),
        event_bus,
    )
}
