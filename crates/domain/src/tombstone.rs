//! Soft-delete capability marker.

/// Capability trait for entities that carry a tombstone flag.
///
/// A tombstoned record is logically deleted: invisible to default reads but
/// physically present, recoverable, and referentially stable. The storage
/// layer inspects this capability once so that calling code is identical for
/// tombstone-capable and hard-deleted entity types.
pub trait Tombstone {
    /// Whether the record is logically deleted.
    fn is_deleted(&self) -> bool;

    /// Set or clear the tombstone flag.
    fn set_deleted(&mut self, deleted: bool);
}
