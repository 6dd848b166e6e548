//! Port interfaces for integration-connection persistence

use async_trait::async_trait;
use daybook_domain::{IntegrationConnection, Result};
use uuid::Uuid;

/// Integration connection persistence, keyed by the (provider, owner)
/// natural key.
#[async_trait]
pub trait IntegrationRepository: Send + Sync {
    /// Load a live connection.
    async fn get(&self, id: Uuid) -> Result<Option<IntegrationConnection>>;

    /// Natural-key lookup that deliberately bypasses the tombstone filter;
    /// the reconnect flow must find a disconnected record to resurrect it.
    async fn find_by_provider_any(
        &self,
        provider: &str,
        owner_id: &str,
    ) -> Result<Option<IntegrationConnection>>;

    /// Live connections of a user, ordered by provider.
    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<IntegrationConnection>>;

    /// Insert a new connection. A racing duplicate on (provider, owner)
    /// surfaces as [`daybook_domain::DaybookError::Conflict`].
    async fn insert(&self, connection: &IntegrationConnection) -> Result<()>;

    /// Overwrite credential fields and the tombstone flag.
    async fn update(&self, connection: &IntegrationConnection) -> Result<()>;

    /// Tombstone a connection.
    async fn remove(&self, connection: IntegrationConnection) -> Result<()>;
}
