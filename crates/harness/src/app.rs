use cardsort_core::{PendingEntry, SessionId};
use cardsort_engine::{CaptureValues, Engine, EngineConfig, EngineError};
use cardsort_storage::Storage;

use crate::fixtures;
use crate::flaky::{Faults, FlakyStorage};

/// An engine over an in-memory store with fault injection.
pub struct TestApp {
    pub engine: Engine<FlakyStorage>,
}

impl TestApp {
    /// No catalog loaded.
    pub fn empty() -> Result<Self, EngineError> {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Result<Self, EngineError> {
        let storage = FlakyStorage::in_memory()?;
        Ok(Self {
            engine: Engine::open(config, storage)?,
        })
    }

    /// Loaded with the two-card "2024 Topps" catalog.
    pub fn scenario() -> Result<Self, EngineError> {
        let mut app = Self::empty()?;
        app.engine.load_catalog(&fixtures::scenario_catalog_json())?;
        Ok(app)
    }

    /// Loaded with the multi-product sample catalog.
    pub fn sample() -> Result<Self, EngineError> {
        let mut app = Self::empty()?;
        app.engine.load_catalog(&fixtures::sample_catalog_json())?;
        Ok(app)
    }

    pub fn faults(&mut self) -> &mut Faults {
        &mut self.engine.storage_mut().faults
    }

    /// Rows the store itself holds, bypassing the ledger cache.
    pub fn durable_rows(&self) -> Result<Vec<PendingEntry>, EngineError> {
        Ok(self.engine.storage().get_all_pending()?)
    }

    /// Run setup and start a session on "2024 Topps".
    pub fn start_session(
        &mut self,
        sets: &[&str],
        parallels: &[&str],
        location: &str,
    ) -> Result<SessionId, EngineError> {
        self.engine.begin_session_setup()?;
        self.engine.select_session_product("2024 Topps")?;
        self.engine.select_session_sets(sets)?;
        self.engine.select_session_parallels(parallels)?;
        self.engine.select_session_location(location)?;
        self.engine.start_session()
    }

    /// Open a browse capture, let `edit` adjust the values, then confirm.
    pub fn browse_capture(
        &mut self,
        product: &str,
        set: &str,
        number: &str,
        edit: impl FnOnce(&mut CaptureValues),
    ) -> Result<PendingEntry, EngineError> {
        let mut sheet = self.engine.open_capture(product, set, number)?;
        edit(&mut sheet.values);
        self.engine.confirm_capture(&sheet)
    }
}
