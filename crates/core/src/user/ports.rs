//! Port interface for user-role persistence

use async_trait::async_trait;
use daybook_domain::Result;

/// User-role persistence. Role records are plain bookkeeping rows; the
/// authorization path only ever reads them.
#[async_trait]
pub trait UserRoleRepository: Send + Sync {
    /// Idempotently create the (user, role) record; a no-op when it already
    /// exists.
    async fn ensure(&self, user_id: &str, role: &str) -> Result<()>;

    /// Whether the user holds the role.
    async fn has_role(&self, user_id: &str, role: &str) -> Result<bool>;
}
