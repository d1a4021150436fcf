use chrono::{DateTime, Utc};

use cardsort_core::{Catalog, NewPendingEntry, PendingEntry, PendingId};

use crate::error::StorageError;

#[derive(Debug, Clone)]
pub struct CatalogRecord {
    pub catalog: Catalog,
    pub fingerprint: [u8; 32],
    pub stored_at: DateTime<Utc>,
}

/// Durable store for the catalog document and the pending ledger.
///
/// Writes take `&mut self`, so callers holding one store issue them strictly
/// one after another. A write that returns `Ok` is durable.
pub trait Storage {
    /// Replace the stored catalog.
    fn put_catalog(&mut self, catalog: &Catalog) -> Result<(), StorageError>;

    fn get_catalog(&self) -> Result<Option<CatalogRecord>, StorageError>;

    /// Persist a new ledger row and return its storage-issued id.
    fn add_pending(&mut self, entry: &NewPendingEntry) -> Result<PendingId, StorageError>;

    /// All ledger rows in insertion order.
    fn get_all_pending(&self) -> Result<Vec<PendingEntry>, StorageError>;

    /// Remove a row. Removing an absent id is not an error.
    fn delete_pending(&mut self, id: PendingId) -> Result<(), StorageError>;

    /// Remove every row in one operation.
    fn clear_all_pending(&mut self) -> Result<(), StorageError>;

    fn pending_count(&self) -> Result<u64, StorageError>;
}
