use crate::config::RelayConfig;
use crate::room::RoomRegistry;
use std::sync::Arc;
use tandem_core::RoomsReport;

struct RelayInner {
    registry: RoomRegistry,
    config: RelayConfig,
}

/// Shared state handed to every connection task.
#[derive(Clone)]
pub struct RelayService {
    inner: Arc<RelayInner>,
}

impl RelayService {
    pub fn new(config: RelayConfig) -> Self {
        Self::with_registry(config, RoomRegistry::new())
    }

    pub fn with_registry(config: RelayConfig, registry: RoomRegistry) -> Self {
        Self {
            inner: Arc::new(RelayInner { registry, config }),
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.inner.registry
    }

    pub fn config(&self) -> &RelayConfig {
        &self.inner.config
    }

    pub fn report(&self) -> RoomsReport {
        RoomsReport {
            service: "tandem relay".to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            rooms: self.inner.registry.summaries(),
        }
    }
}

impl Default for RelayService {
    fn default() -> Self {
        Self::new(RelayConfig::default())
    }
}
