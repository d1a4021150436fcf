pub mod capture;
pub mod config;
pub mod error;
pub mod ledger;
pub mod locks;
pub mod session;

pub use capture::{CaptureContext, CaptureMode, CaptureSheet, CaptureValues, SessionDefaults};
pub use config::EngineConfig;
pub use error::EngineError;
pub use ledger::PendingLedger;
pub use locks::FieldLocks;
pub use session::{
    ActiveSession, AppendPending, DeletePending, SessionEngine, SessionEntry, SessionSetup,
    SessionState,
};

use chrono::Utc;
use tracing::{debug, info, warn};

use cardsort_core::{
    Catalog, CatalogIndex, ExportDocument, LockField, OwnedSummary, PendingEntry, PendingId,
    Product, SessionId,
};
use cardsort_storage::{SqliteStorage, Storage};

fn loaded(catalog: &Option<CatalogIndex>) -> Result<&Catalog, EngineError> {
    catalog
        .as_ref()
        .map(CatalogIndex::catalog)
        .ok_or(EngineError::NoCatalog)
}

/// Application state for one capture surface: the loaded catalog, the pending
/// ledger, browse field locks and the session state machine, over one store.
pub struct Engine<S: Storage = SqliteStorage> {
    config: EngineConfig,
    storage: S,
    catalog: Option<CatalogIndex>,
    ledger: PendingLedger,
    locks: FieldLocks,
    session: SessionEngine,
}

impl<S: Storage> Engine<S> {
    /// Build an engine over `storage`, restoring the stored catalog and the
    /// pending ledger cache.
    pub fn open(config: EngineConfig, storage: S) -> Result<Self, EngineError> {
        config.validate()?;

        let catalog = match storage.get_catalog()? {
            Some(record) => {
                let index = CatalogIndex::new(record.catalog)?;
                if *index.fingerprint() != record.fingerprint {
                    warn!(
                        stored_at = %record.stored_at,
                        "stored catalog fingerprint differs from its document"
                    );
                }
                info!(
                    fingerprint = %index.fingerprint_hex(),
                    products = index.catalog().products.len(),
                    "catalog restored"
                );
                Some(index)
            }
            None => None,
        };
        let ledger = PendingLedger::load(&storage)?;
        info!(pending = ledger.len(), "engine opened");

        Ok(Self {
            config,
            storage,
            catalog,
            ledger,
            locks: FieldLocks::new(),
            session: SessionEngine::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    /// Parse, persist and index a catalog document, replacing the current one.
    pub fn load_catalog(&mut self, raw: &str) -> Result<&CatalogIndex, EngineError> {
        let catalog = Catalog::load(raw)?;
        let index = CatalogIndex::new(catalog)?;

        let unchanged = self
            .catalog
            .as_ref()
            .is_some_and(|current| current.fingerprint() == index.fingerprint());
        self.storage.put_catalog(index.catalog()).inspect_err(|e| {
            warn!(error = %e, "catalog store failed");
        })?;
        info!(
            fingerprint = %index.fingerprint_hex(),
            products = index.catalog().products.len(),
            owned = index.owned().len(),
            unchanged,
            "catalog loaded"
        );

        if self.config.end_session_on_catalog_reload
            && !matches!(self.session.state(), SessionState::Uninitialized)
        {
            let discarded = self.session.end();
            info!(discarded, "session ended by catalog reload");
        }
        let index: &CatalogIndex = self.catalog.insert(index);
        Ok(index)
    }

    pub fn catalog_index(&self) -> Result<&CatalogIndex, EngineError> {
        self.catalog.as_ref().ok_or(EngineError::NoCatalog)
    }

    pub fn catalog(&self) -> Result<&Catalog, EngineError> {
        loaded(&self.catalog)
    }

    pub fn sports_list(&self) -> Result<Vec<&str>, EngineError> {
        Ok(self.catalog_index()?.sports_list())
    }

    pub fn products_for(&self, sport: Option<&str>) -> Result<Vec<&Product>, EngineError> {
        Ok(self.catalog_index()?.products_for(sport))
    }

    pub fn owned(
        &self,
        product: &str,
        set: &str,
        number: &str,
    ) -> Result<Option<&OwnedSummary>, EngineError> {
        Ok(self.catalog_index()?.owned().get(product, set, number))
    }

    // ========================================================================
    // Browse capture and field locks
    // ========================================================================

    pub fn open_capture(
        &self,
        product: &str,
        set: &str,
        number: &str,
    ) -> Result<CaptureSheet, EngineError> {
        CaptureSheet::open(
            loaded(&self.catalog)?,
            product,
            set,
            number,
            CaptureContext::Browse,
            &self.locks,
            &self.config,
        )
    }

    pub fn locks(&self) -> &FieldLocks {
        &self.locks
    }

    pub fn toggle_lock(&mut self, field: LockField, current: Option<&str>) -> bool {
        let locked = self.locks.toggle(field, current);
        debug!(%field, locked, "field lock toggled");
        locked
    }

    pub fn unlock_all(&mut self) {
        self.locks.unlock_all();
    }

    /// Validate `sheet` and append the entry it describes.
    ///
    /// Browse captures write the stored values through to every locked field.
    /// Session captures are mirrored into the session for undo, and only the
    /// session that opened the sheet may confirm it.
    pub fn confirm_capture(&mut self, sheet: &CaptureSheet) -> Result<PendingEntry, EngineError> {
        let catalog = loaded(&self.catalog)?;
        if sheet.mode() == CaptureMode::Session {
            let Some(current) = self.session_id() else {
                return Err(EngineError::InvalidSessionState {
                    expected: "active",
                    actual: self.session.state().as_str(),
                });
            };
            if sheet.session() != Some(current) {
                return Err(EngineError::StaleSessionCapture);
            }
        }

        let entry = sheet.confirm(&catalog.tags, Utc::now())?;
        let stored = self.ledger.append(&mut self.storage, entry)?;
        match sheet.mode() {
            CaptureMode::Browse => {
                let keep = sheet.preserved_locks(&stored.parallel);
                self.locks.write_through(&CaptureValues::from(&stored), keep);
            }
            CaptureMode::Session => self.session.record_append(&stored)?,
        }
        info!(
            id = %stored.id,
            mode = sheet.mode().as_str(),
            card = %stored.card_key(),
            parallel = %stored.parallel,
            quantity = stored.quantity,
            "capture confirmed"
        );
        Ok(stored)
    }

    // ========================================================================
    // Session
    // ========================================================================

    pub fn session(&self) -> &SessionEngine {
        &self.session
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session.active().map(ActiveSession::id)
    }

    pub fn begin_session_setup(&mut self) -> Result<(), EngineError> {
        loaded(&self.catalog)?;
        self.session.begin_setup()
    }

    pub fn select_session_product(&mut self, name: &str) -> Result<(), EngineError> {
        self.session.select_product(loaded(&self.catalog)?, name)
    }

    pub fn select_session_sets(&mut self, names: &[&str]) -> Result<(), EngineError> {
        self.session.select_sets(loaded(&self.catalog)?, names)
    }

    pub fn select_session_parallels(&mut self, names: &[&str]) -> Result<(), EngineError> {
        self.session.select_parallels(loaded(&self.catalog)?, names)
    }

    pub fn select_session_location(&mut self, name: &str) -> Result<(), EngineError> {
        self.session.select_location(loaded(&self.catalog)?, name)
    }

    pub fn available_parallels(&self) -> Result<Vec<String>, EngineError> {
        self.session.available_parallels(loaded(&self.catalog)?)
    }

    pub fn start_session(&mut self) -> Result<SessionId, EngineError> {
        let id = self.session.start(loaded(&self.catalog)?)?;
        if let Some(session) = self.session.active() {
            info!(
                session = %id,
                product = session.product(),
                sets = session.selected_sets().len(),
                parallels = session.selected_parallels().len(),
                location = session.location(),
                "session started"
            );
        }
        Ok(id)
    }

    pub fn visible_parallels(&self) -> Result<Vec<String>, EngineError> {
        self.session.visible_parallels(loaded(&self.catalog)?)
    }

    pub fn switch_active_set(&mut self, name: &str) -> Result<(), EngineError> {
        self.session.switch_active_set(loaded(&self.catalog)?, name)
    }

    pub fn switch_active_parallel(&mut self, name: &str) -> Result<(), EngineError> {
        self.session.switch_active_parallel(loaded(&self.catalog)?, name)
    }

    /// One-tap capture of card `number` in the active set.
    pub fn tap_add(&mut self, number: &str) -> Result<PendingEntry, EngineError> {
        let AppendPending(entry) = self
            .session
            .tap_add(loaded(&self.catalog)?, number, Utc::now())?;
        let stored = self.ledger.append(&mut self.storage, entry)?;
        self.session.record_append(&stored)?;
        debug!(
            id = %stored.id,
            card = %stored.card_key(),
            parallel = %stored.parallel,
            "session tap"
        );
        Ok(stored)
    }

    /// Capture sheet for a long-press on card `number` in the active set.
    pub fn long_press_add(&self, number: &str) -> Result<CaptureSheet, EngineError> {
        let (product, set, defaults) = self.session.capture_defaults()?;
        CaptureSheet::open(
            loaded(&self.catalog)?,
            &product,
            &set,
            number,
            CaptureContext::Session(&defaults),
            &self.locks,
            &self.config,
        )
    }

    /// Remove the most recent session capture from the ledger.
    /// Returns the session record that was undone, or `None` when the session
    /// has nothing to undo.
    pub fn undo(&mut self) -> Result<Option<SessionEntry>, EngineError> {
        let Some(DeletePending(id)) = self.session.undo()? else {
            return Ok(None);
        };
        let removed = self.ledger.delete_by_id(&mut self.storage, id)?;
        let entry = self.session.record_undo(id)?;
        info!(%id, removed, "session undo");
        Ok(entry)
    }

    pub fn badge_count(&self, set: &str, number: &str) -> usize {
        self.session.badge_count(set, number)
    }

    /// Leave the session. Ledger rows it wrote are kept.
    pub fn end_session(&mut self) -> usize {
        let session = self.session_id();
        let recorded = self.session.end();
        info!(session = ?session, recorded, "session ended");
        recorded
    }

    // ========================================================================
    // Pending ledger
    // ========================================================================

    pub fn pending(&self) -> &[PendingEntry] {
        self.ledger.list_all()
    }

    pub fn ledger(&self) -> &PendingLedger {
        &self.ledger
    }

    pub fn pending_quantity_for(&self, product: &str, set: &str, number: &str) -> u32 {
        self.ledger.quantity_for(product, set, number)
    }

    pub fn delete_pending(&mut self, id: PendingId) -> Result<bool, EngineError> {
        let removed = self.ledger.delete_by_id(&mut self.storage, id)?;
        debug!(%id, removed, "pending row deleted");
        Ok(removed)
    }

    pub fn clear_pending(&mut self) -> Result<(), EngineError> {
        self.ledger.clear(&mut self.storage)
    }

    pub fn export(&self) -> Result<ExportDocument, EngineError> {
        self.ledger.export(Utc::now())
    }
}
