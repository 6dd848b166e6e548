//! User-role service.
//!
//! Role assignment is an explicit idempotent step invoked by the boundary
//! before a mutation, never a hidden side effect inside one: the
//! authorization path has no write side effects of its own.

use std::sync::Arc;

use daybook_domain::{DaybookError, Result};
use tracing::debug;

use super::ports::UserRoleRepository;

/// Role name whose holders pass the ownership-overridable policy check.
pub const ELEVATED_ROLE: &str = "admin";

/// Explicit role bookkeeping service.
pub struct UserRoleService {
    roles: Arc<dyn UserRoleRepository>,
}

impl UserRoleService {
    /// Create a new user-role service.
    pub fn new(roles: Arc<dyn UserRoleRepository>) -> Self {
        Self { roles }
    }

    /// Ensure the (user, role) record exists. Safe to call repeatedly.
    pub async fn ensure_role(&self, user_id: &str, role: &str) -> Result<()> {
        if user_id.trim().is_empty() || role.trim().is_empty() {
            return Err(DaybookError::Validation("user and role must not be empty".into()));
        }
        self.roles.ensure(user_id.trim(), role.trim()).await?;
        debug!(user_id, role, "role ensured");
        Ok(())
    }

    /// Whether the user carries the elevated role.
    pub async fn is_elevated(&self, user_id: &str) -> Result<bool> {
        self.roles.has_role(user_id, ELEVATED_ROLE).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct MockRoleRepository {
        roles: Mutex<HashSet<(String, String)>>,
        ensure_calls: Mutex<usize>,
    }

    #[async_trait]
    impl UserRoleRepository for MockRoleRepository {
        async fn ensure(&self, user_id: &str, role: &str) -> Result<()> {
            *self.ensure_calls.lock().unwrap() += 1;
            self.roles.lock().unwrap().insert((user_id.to_string(), role.to_string()));
            Ok(())
        }

        async fn has_role(&self, user_id: &str, role: &str) -> Result<bool> {
            Ok(self
                .roles
                .lock()
                .unwrap()
                .contains(&(user_id.to_string(), role.to_string())))
        }
    }

    #[tokio::test]
    async fn ensure_role_is_idempotent() {
        let repo = Arc::new(MockRoleRepository::default());
        let service = UserRoleService::new(Arc::clone(&repo) as Arc<dyn UserRoleRepository>);

        service.ensure_role("x", ELEVATED_ROLE).await.unwrap();
        service.ensure_role("x", ELEVATED_ROLE).await.unwrap();

        assert!(service.is_elevated("x").await.unwrap());
        assert_eq!(repo.roles.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn ensure_role_rejects_blank_input() {
        let repo = Arc::new(MockRoleRepository::default());
        let service = UserRoleService::new(repo as Arc<dyn UserRoleRepository>);

        let err = service.ensure_role(" ", "admin").await.unwrap_err();
        assert!(matches!(err, DaybookError::Validation(_)));
    }
}
