use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use cardsort_core::{ExportDocument, NewPendingEntry, PendingEntry, PendingId};
use cardsort_storage::Storage;

use crate::error::EngineError;

/// In-memory mirror of the durable pending table.
///
/// The cache changes only after the matching storage call has returned `Ok`,
/// so a failed write leaves it exactly as it was.
#[derive(Debug, Default)]
pub struct PendingLedger {
    entries: Vec<PendingEntry>,
}

impl PendingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill the cache from storage, replacing whatever it held.
    pub fn load<S: Storage>(storage: &S) -> Result<Self, EngineError> {
        let entries = storage.get_all_pending()?;
        debug!(rows = entries.len(), "pending ledger loaded");
        Ok(Self { entries })
    }

    pub fn append<S: Storage>(
        &mut self,
        storage: &mut S,
        entry: NewPendingEntry,
    ) -> Result<PendingEntry, EngineError> {
        let id = storage.add_pending(&entry).inspect_err(|e| {
            warn!(error = %e, card = %entry.card_number, "pending append failed");
        })?;
        let stored = entry.with_id(id);
        self.entries.push(stored.clone());
        Ok(stored)
    }

    /// Returns whether a row was removed. Unknown ids are a no-op.
    pub fn delete_by_id<S: Storage>(
        &mut self,
        storage: &mut S,
        id: PendingId,
    ) -> Result<bool, EngineError> {
        let Some(position) = self.entries.iter().position(|e| e.id == id) else {
            debug!(%id, "pending row already absent");
            return Ok(false);
        };
        storage.delete_pending(id).inspect_err(|e| {
            warn!(error = %e, %id, "pending delete failed");
        })?;
        self.entries.remove(position);
        Ok(true)
    }

    pub fn clear<S: Storage>(&mut self, storage: &mut S) -> Result<(), EngineError> {
        storage.clear_all_pending().inspect_err(|e| {
            warn!(error = %e, "pending clear failed");
        })?;
        info!(rows = self.entries.len(), "pending ledger cleared");
        self.entries.clear();
        Ok(())
    }

    pub fn list_all(&self) -> &[PendingEntry] {
        &self.entries
    }

    pub fn get(&self, id: PendingId) -> Option<&PendingEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: PendingId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total pending quantity for one card, across parallels.
    pub fn quantity_for(&self, product: &str, set: &str, number: &str) -> u32 {
        self.entries
            .iter()
            .filter(|e| e.is_card(product, set, number))
            .map(|e| e.quantity)
            .sum()
    }

    /// Project the ledger into an export document. Ledger state is untouched.
    pub fn export(&self, exported_at: DateTime<Utc>) -> Result<ExportDocument, EngineError> {
        if self.entries.is_empty() {
            return Err(EngineError::EmptyLedger);
        }
        let document = ExportDocument::new(&self.entries, exported_at);
        info!(export_id = %document.export_id, changes = document.changes.len(), "ledger exported");
        Ok(document)
    }
}
