use cardsort_core::{Catalog, NewPendingEntry, PendingEntry, PendingId};
use cardsort_storage::{CatalogRecord, SqliteStorage, Storage, StorageError};

/// Which writes a [`FlakyStorage`] should refuse.
#[derive(Debug, Clone, Copy, Default)]
pub struct Faults {
    pub put_catalog: bool,
    pub add_pending: bool,
    pub delete_pending: bool,
    pub clear_pending: bool,
}

/// A store that forwards to `inner` unless a fault is armed for the call.
/// Failed calls never reach `inner`.
pub struct FlakyStorage<S: Storage = SqliteStorage> {
    inner: S,
    pub faults: Faults,
}

impl FlakyStorage<SqliteStorage> {
    pub fn in_memory() -> Result<Self, StorageError> {
        Ok(Self::new(SqliteStorage::open_in_memory()?))
    }
}

impl<S: Storage> FlakyStorage<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            faults: Faults::default(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn heal(&mut self) {
        self.faults = Faults::default();
    }
}

fn injected(op: &str) -> StorageError {
    StorageError::Unavailable(format!("injected {op} failure"))
}

impl<S: Storage> Storage for FlakyStorage<S> {
    fn put_catalog(&mut self, catalog: &Catalog) -> Result<(), StorageError> {
        if self.faults.put_catalog {
            return Err(injected("put_catalog"));
        }
        self.inner.put_catalog(catalog)
    }

    fn get_catalog(&self) -> Result<Option<CatalogRecord>, StorageError> {
        self.inner.get_catalog()
    }

    fn add_pending(&mut self, entry: &NewPendingEntry) -> Result<PendingId, StorageError> {
        if self.faults.add_pending {
            return Err(injected("add_pending"));
        }
        self.inner.add_pending(entry)
    }

    fn get_all_pending(&self) -> Result<Vec<PendingEntry>, StorageError> {
        self.inner.get_all_pending()
    }

    fn delete_pending(&mut self, id: PendingId) -> Result<(), StorageError> {
        if self.faults.delete_pending {
            return Err(injected("delete_pending"));
        }
        self.inner.delete_pending(id)
    }

    fn clear_all_pending(&mut self) -> Result<(), StorageError> {
        if self.faults.clear_pending {
            return Err(injected("clear_all_pending"));
        }
        self.inner.clear_all_pending()
    }

    fn pending_count(&self) -> Result<u64, StorageError> {
        self.inner.pending_count()
    }
}
