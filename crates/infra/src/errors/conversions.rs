//! Conversions from storage-layer errors into domain errors.
//!
//! Keeping the conversion logic on the infrastructure side means the domain
//! crate never learns about rusqlite or pooling, and every repository maps
//! failures the same way.

use daybook_domain::DaybookError;
use tokio::task::JoinError;

use crate::database::store::StoreError;

impl From<StoreError> for DaybookError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => Self::Conflict(msg),
            // Repositories always stage at least one operation before
            // committing, so an empty batch here is a storage-layer bug.
            StoreError::NothingToPersist
            | StoreError::Pool(_)
            | StoreError::Sql(_)
            | StoreError::Join(_) => Self::Storage(err.to_string()),
        }
    }
}

/// Map a `spawn_blocking` join failure onto the domain storage error.
pub fn map_join_error(err: JoinError) -> DaybookError {
    DaybookError::Storage(format!("blocking task failed: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_maps_to_conflict() {
        let err: DaybookError = StoreError::Conflict("UNIQUE failed".into()).into();
        assert!(matches!(err, DaybookError::Conflict(_)));
    }

    #[test]
    fn other_store_errors_map_to_storage() {
        let err: DaybookError = StoreError::NothingToPersist.into();
        assert!(matches!(err, DaybookError::Storage(_)));
    }
}
