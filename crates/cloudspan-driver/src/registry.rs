//! Provider → driver registry

use crate::connection::ConnectionInfo;
use crate::driver::{CloudConnection, CloudDriver, DriverCapability, ProviderKind};
use crate::error::{CloudError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Maps a provider identifier to its driver
#[derive(Clone, Default)]
pub struct DriverRegistry {
    drivers: HashMap<ProviderKind, Arc<dyn CloudDriver>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a driver, replacing and returning any previous one for the
    /// same provider.
    pub fn register(&mut self, driver: Arc<dyn CloudDriver>) -> Option<Arc<dyn CloudDriver>> {
        let kind = driver.provider();
        tracing::debug!(provider = %kind, version = driver.version(), "registering driver");
        self.drivers.insert(kind, driver)
    }

    pub fn get(&self, kind: ProviderKind) -> Result<Arc<dyn CloudDriver>> {
        self.drivers
            .get(&kind)
            .cloned()
            .ok_or_else(|| CloudError::ProviderNotFound(kind.to_string()))
    }

    /// Looks a driver up by its textual name (`aws`, `openstack`, ...).
    pub fn get_by_name(&self, name: &str) -> Result<Arc<dyn CloudDriver>> {
        self.get(name.parse()?)
    }

    /// Registered providers in a stable order
    pub fn providers(&self) -> Vec<ProviderKind> {
        let mut kinds: Vec<ProviderKind> = self.drivers.keys().copied().collect();
        kinds.sort();
        kinds
    }

    pub fn capability(&self, kind: ProviderKind) -> Result<DriverCapability> {
        Ok(self.get(kind)?.capability())
    }

    /// Connects through the driver registered for `kind`.
    pub async fn connect(
        &self,
        kind: ProviderKind,
        info: ConnectionInfo,
    ) -> Result<Box<dyn CloudConnection>> {
        self.get(kind)?.connect_cloud(info).await
    }
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("providers", &self.providers())
            .finish()
    }
}
