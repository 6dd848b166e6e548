//! SQLite-backed implementation of the integration-connection port.

use std::sync::Arc;

use async_trait::async_trait;
use daybook_core::integration::ports::IntegrationRepository;
use daybook_domain::{IntegrationConnection, Result};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::manager::DbManager;
use super::store::{self, SoftDeleteStore, SqlArg, WriteBatch};

/// SQLite implementation of [`IntegrationRepository`].
///
/// The natural-key lookup bypasses the tombstone filter on purpose: the
/// reconnect flow must find a disconnected record to resurrect it. The
/// UNIQUE(provider, owner_id) index catches the racing insert this pattern
/// leaves open.
pub struct SqliteIntegrationRepository {
    db: Arc<DbManager>,
    connections: SoftDeleteStore<IntegrationConnection>,
}

impl SqliteIntegrationRepository {
    /// Create a new integration repository.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { connections: SoftDeleteStore::new(Arc::clone(&db)), db }
    }
}

#[async_trait]
impl IntegrationRepository for SqliteIntegrationRepository {
    async fn get(&self, id: Uuid) -> Result<Option<IntegrationConnection>> {
        Ok(self.connections.get(id).await?)
    }

    #[instrument(skip(self))]
    async fn find_by_provider_any(
        &self,
        provider: &str,
        owner_id: &str,
    ) -> Result<Option<IntegrationConnection>> {
        let found = self
            .connections
            .find_ignoring_tombstone(
                "provider = ?1 AND owner_id = ?2",
                vec![SqlArg::text(provider), SqlArg::text(owner_id)],
            )
            .await?;

        debug!(provider, owner_id, found = found.is_some(), "natural-key lookup");
        Ok(found)
    }

    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<IntegrationConnection>> {
        Ok(self
            .connections
            .list("owner_id = ?1", vec![SqlArg::text(owner_id)], "provider")
            .await?)
    }

    async fn insert(&self, connection: &IntegrationConnection) -> Result<()> {
        let mut batch = WriteBatch::new();
        self.connections.stage_insert(&mut batch, connection.clone());
        store::commit(&self.db, batch).await?;
        Ok(())
    }

    async fn update(&self, connection: &IntegrationConnection) -> Result<()> {
        let mut batch = WriteBatch::new();
        self.connections.stage_update(&mut batch, connection.clone());
        store::commit(&self.db, batch).await?;
        Ok(())
    }

    async fn remove(&self, connection: IntegrationConnection) -> Result<()> {
        let mut batch = WriteBatch::new();
        self.connections.stage_remove(&mut batch, connection);
        store::commit(&self.db, batch).await?;
        Ok(())
    }
}
