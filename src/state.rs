use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::warn;

use crate::{
    catalog::CatalogStore, config::Config, service::CatalogService, sightings::SightingStore,
};

/// Shared handle given to every request handler. The mutex serializes all
/// access to the stores.
pub struct AppState {
    pub config: Config,
    service: Mutex<CatalogService>,
}

impl AppState {
    pub fn new(config: Config) -> Arc<Self> {
        let catalog = CatalogStore::seeded(config.seed_path.as_deref());
        let service = CatalogService::new(catalog, SightingStore::new());

        Self::with_service(config, service)
    }

    pub fn with_service(config: Config, service: CatalogService) -> Arc<Self> {
        Arc::new(Self {
            config,
            service: Mutex::new(service),
        })
    }

    /// Every store operation completes before it returns, so a panic in
    /// another handler cannot leave the stores half-updated and the lock is
    /// recovered rather than failing every later request.
    pub fn service(&self) -> MutexGuard<'_, CatalogService> {
        self.service.lock().unwrap_or_else(|poisoned| {
            warn!("Catalog lock was poisoned by a panicking request, recovering");
            self.service.clear_poison();
            PoisonError::into_inner(poisoned)
        })
    }
}
