//! Integration connection service - core business logic
//!
//! The distinguishing flow here is reconnect-after-disconnect: the same
//! logical record is resurrected (tombstone cleared, credentials
//! overwritten) instead of inserting a duplicate, which requires the
//! natural-key lookup to bypass the default tombstone-hiding read path.

use std::sync::Arc;

use chrono::Utc;
use daybook_domain::{
    ConnectionDraft, DaybookError, IntegrationConnection, Result, Tombstone,
};
use tracing::debug;
use uuid::Uuid;

use super::ports::IntegrationRepository;
use crate::policy::{self, Actor};

/// Provider connection lifecycle service.
pub struct IntegrationService {
    connections: Arc<dyn IntegrationRepository>,
}

impl IntegrationService {
    /// Create a new integration service.
    pub fn new(connections: Arc<dyn IntegrationRepository>) -> Self {
        Self { connections }
    }

    /// Connect the actor to a provider, resurrecting a previously
    /// disconnected record when one exists.
    pub async fn connect(
        &self,
        actor: &Actor,
        draft: ConnectionDraft,
    ) -> Result<IntegrationConnection> {
        let provider = draft.provider.trim().to_ascii_lowercase();
        if provider.is_empty() {
            return Err(DaybookError::Validation("provider must not be empty".into()));
        }
        if draft.access_token.is_empty() {
            return Err(DaybookError::Validation("access token must not be empty".into()));
        }

        match self.connections.find_by_provider_any(&provider, &actor.user_id).await? {
            Some(mut existing) => {
                existing.set_deleted(false);
                existing.access_token = draft.access_token;
                existing.refresh_token = draft.refresh_token;
                existing.expires_at = draft.expires_at;
                existing.connected_at = Utc::now();

                self.connections.update(&existing).await?;
                debug!(connection_id = %existing.id, provider = %provider, "connection resurrected");
                Ok(existing)
            }
            None => {
                let connection = IntegrationConnection {
                    id: Uuid::now_v7(),
                    owner_id: actor.user_id.clone(),
                    provider,
                    access_token: draft.access_token,
                    refresh_token: draft.refresh_token,
                    expires_at: draft.expires_at,
                    connected_at: Utc::now(),
                    deleted: false,
                };

                self.connections.insert(&connection).await?;
                debug!(connection_id = %connection.id, provider = %connection.provider, "connection created");
                Ok(connection)
            }
        }
    }

    /// Tombstone a connection. Owner-gated, elevated role overrides.
    pub async fn disconnect(&self, connection_id: Uuid, actor: &Actor) -> Result<()> {
        let connection = self
            .connections
            .get(connection_id)
            .await?
            .ok_or_else(|| DaybookError::NotFound(format!("connection {connection_id}")))?;

        policy::owner_or_elevated(&connection.owner_id, actor).require("connection")?;

        let id = connection.id;
        self.connections.remove(connection).await?;
        debug!(connection_id = %id, "connection removed");
        Ok(())
    }

    /// Live connections of the actor.
    pub async fn list_for_user(&self, actor: &Actor) -> Result<Vec<IntegrationConnection>> {
        self.connections.list_for_owner(&actor.user_id).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct MockIntegrationRepository {
        connections: Mutex<HashMap<Uuid, IntegrationConnection>>,
    }

    #[async_trait]
    impl IntegrationRepository for MockIntegrationRepository {
        async fn get(&self, id: Uuid) -> Result<Option<IntegrationConnection>> {
            Ok(self.connections.lock().unwrap().get(&id).filter(|c| !c.deleted).cloned())
        }

        async fn find_by_provider_any(
            &self,
            provider: &str,
            owner_id: &str,
        ) -> Result<Option<IntegrationConnection>> {
            Ok(self
                .connections
                .lock()
                .unwrap()
                .values()
                .find(|c| c.provider == provider && c.owner_id == owner_id)
                .cloned())
        }

        async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<IntegrationConnection>> {
            let mut live: Vec<IntegrationConnection> = self
                .connections
                .lock()
                .unwrap()
                .values()
                .filter(|c| !c.deleted && c.owner_id == owner_id)
                .cloned()
                .collect();
            live.sort_by(|a, b| a.provider.cmp(&b.provider));
            Ok(live)
        }

        async fn insert(&self, connection: &IntegrationConnection) -> Result<()> {
            let mut connections = self.connections.lock().unwrap();
            // UNIQUE(provider, owner_id), as the schema enforces.
            if connections
                .values()
                .any(|c| c.provider == connection.provider && c.owner_id == connection.owner_id)
            {
                return Err(DaybookError::Conflict("connection already exists".into()));
            }
            connections.insert(connection.id, connection.clone());
            Ok(())
        }

        async fn update(&self, connection: &IntegrationConnection) -> Result<()> {
            self.connections.lock().unwrap().insert(connection.id, connection.clone());
            Ok(())
        }

        async fn remove(&self, mut connection: IntegrationConnection) -> Result<()> {
            connection.deleted = true;
            self.connections.lock().unwrap().insert(connection.id, connection);
            Ok(())
        }
    }

    fn service() -> (IntegrationService, Arc<MockIntegrationRepository>) {
        let repo = Arc::new(MockIntegrationRepository::default());
        (
            IntegrationService::new(Arc::clone(&repo) as Arc<dyn IntegrationRepository>),
            repo,
        )
    }

    fn draft(provider: &str, token: &str) -> ConnectionDraft {
        ConnectionDraft {
            provider: provider.to_string(),
            access_token: token.to_string(),
            refresh_token: None,
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn provider_name_is_normalized() {
        let (service, _) = service();
        let conn = service
            .connect(&Actor::new("x", false), draft("  Google ", "tok"))
            .await
            .unwrap();
        assert_eq!(conn.provider, "google");
    }

    #[tokio::test]
    async fn reconnect_resurrects_the_same_record() {
        let (service, repo) = service();
        let x = Actor::new("x", false);

        let first = service.connect(&x, draft("google", "tok-1")).await.unwrap();
        service.disconnect(first.id, &x).await.unwrap();

        let second = service.connect(&x, draft("google", "tok-2")).await.unwrap();

        // Same logical record, tombstone cleared, credentials overwritten.
        assert_eq!(second.id, first.id);
        assert!(!second.deleted);
        assert_eq!(second.access_token, "tok-2");
        assert_eq!(repo.connections.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn connect_while_live_overwrites_credentials() {
        let (service, repo) = service();
        let x = Actor::new("x", false);

        let first = service.connect(&x, draft("outlook", "old")).await.unwrap();
        let second = service.connect(&x, draft("outlook", "new")).await.unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.access_token, "new");
        assert_eq!(repo.connections.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn disconnect_requires_ownership_unless_elevated() {
        let (service, _) = service();
        let x = Actor::new("x", false);
        let conn = service.connect(&x, draft("google", "tok")).await.unwrap();

        let err = service.disconnect(conn.id, &Actor::new("y", false)).await.unwrap_err();
        assert!(matches!(err, DaybookError::NotOwner(_)));

        service.disconnect(conn.id, &Actor::new("root", true)).await.unwrap();
        assert!(service.list_for_user(&x).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn disconnected_connection_is_hidden_from_listing() {
        let (service, _) = service();
        let x = Actor::new("x", false);

        let conn = service.connect(&x, draft("google", "tok")).await.unwrap();
        service.connect(&x, draft("outlook", "tok")).await.unwrap();
        service.disconnect(conn.id, &x).await.unwrap();

        let live = service.list_for_user(&x).await.unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].provider, "outlook");
    }

    #[tokio::test]
    async fn connect_rejects_blank_provider() {
        let (service, _) = service();
        let err = service
            .connect(&Actor::new("x", false), draft("  ", "tok"))
            .await
            .unwrap_err();
        assert!(matches!(err, DaybookError::Validation(_)));
    }
}
