//! Session capture state machine.
//!
//! `Uninitialized -> Configuring -> Active -> Uninitialized`. Transitions are
//! pure: operations that need storage return an effect ([`AppendPending`] or
//! [`DeletePending`]) for the caller to perform, and the session only records
//! the outcome once the caller reports success through
//! [`SessionEngine::record_append`] or [`SessionEngine::record_undo`].

use chrono::{DateTime, Utc};

use cardsort_core::{
    CardSet, Catalog, EntryAction, EntryTags, NewPendingEntry, PendingEntry, PendingId, Product,
    SessionId, TagKind,
};

use crate::capture::SessionDefaults;
use crate::error::EngineError;

/// Ledger append requested by a session capture.
#[derive(Debug, Clone, PartialEq)]
pub struct AppendPending(pub NewPendingEntry);

/// Ledger delete requested by a session undo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletePending(pub PendingId);

/// Mirror of a ledger row written during the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEntry {
    pub seq: u64,
    pub id: PendingId,
    pub set: String,
    pub card_number: String,
    pub parallel: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSetup {
    pub product: Option<String>,
    pub sets: Vec<String>,
    pub parallels: Vec<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ActiveSession {
    id: SessionId,
    product: String,
    selected_sets: Vec<String>,
    selected_parallels: Vec<String>,
    active_set: String,
    active_parallel: Option<String>,
    location: String,
    entries: Vec<SessionEntry>,
    next_seq: u64,
}

impl ActiveSession {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn selected_sets(&self) -> &[String] {
        &self.selected_sets
    }

    pub fn selected_parallels(&self) -> &[String] {
        &self.selected_parallels
    }

    pub fn active_set(&self) -> &str {
        &self.active_set
    }

    pub fn active_parallel(&self) -> Option<&str> {
        self.active_parallel.as_deref()
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn entries(&self) -> &[SessionEntry] {
        &self.entries
    }

    /// Occurrences of `set|number` among this session's entries, any parallel.
    pub fn badge_count(&self, set: &str, number: &str) -> usize {
        self.entries
            .iter()
            .filter(|e| e.set == set && e.card_number == number)
            .count()
    }

    /// Selected parallels that `set` defines, in selection order.
    fn intersection(&self, set: &CardSet) -> Vec<String> {
        self.selected_parallels
            .iter()
            .filter(|p| set.has_parallel(p))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    Uninitialized,
    Configuring(SessionSetup),
    Active(ActiveSession),
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Configuring(_) => "configuring",
            Self::Active(_) => "active",
        }
    }
}

fn find_product<'a>(catalog: &'a Catalog, name: &str) -> Result<&'a Product, EngineError> {
    catalog
        .product(name)
        .ok_or_else(|| EngineError::UnknownProduct(name.to_string()))
}

fn find_set<'a>(product: &'a Product, name: &str) -> Result<&'a CardSet, EngineError> {
    product
        .set(name)
        .ok_or_else(|| EngineError::UnknownSet(name.to_string()))
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

#[derive(Debug, Default)]
pub struct SessionEngine {
    state: SessionState,
}

impl SessionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn active(&self) -> Option<&ActiveSession> {
        match &self.state {
            SessionState::Active(session) => Some(session),
            _ => None,
        }
    }

    pub fn setup(&self) -> Option<&SessionSetup> {
        match &self.state {
            SessionState::Configuring(setup) => Some(setup),
            _ => None,
        }
    }

    fn setup_mut(&mut self) -> Result<&mut SessionSetup, EngineError> {
        let actual = self.state.as_str();
        match &mut self.state {
            SessionState::Configuring(setup) => Ok(setup),
            _ => Err(EngineError::InvalidSessionState {
                expected: "configuring",
                actual,
            }),
        }
    }

    fn active_ref(&self) -> Result<&ActiveSession, EngineError> {
        self.active().ok_or(EngineError::InvalidSessionState {
            expected: "active",
            actual: self.state.as_str(),
        })
    }

    fn active_mut(&mut self) -> Result<&mut ActiveSession, EngineError> {
        let actual = self.state.as_str();
        match &mut self.state {
            SessionState::Active(session) => Ok(session),
            _ => Err(EngineError::InvalidSessionState {
                expected: "active",
                actual,
            }),
        }
    }

    // ========================================================================
    // Configuring
    // ========================================================================

    /// Open the setup screen. Re-entering setup starts from a blank selection.
    pub fn begin_setup(&mut self) -> Result<(), EngineError> {
        if let SessionState::Active(_) = self.state {
            return Err(EngineError::InvalidSessionState {
                expected: "uninitialized",
                actual: "active",
            });
        }
        self.state = SessionState::Configuring(SessionSetup::default());
        Ok(())
    }

    /// Choosing a product resets the set and parallel selections.
    pub fn select_product(&mut self, catalog: &Catalog, name: &str) -> Result<(), EngineError> {
        let product = find_product(catalog, name)?;
        let setup = self.setup_mut()?;
        setup.product = Some(product.name.clone());
        setup.sets.clear();
        setup.parallels.clear();
        Ok(())
    }

    /// Replace the set selection. Parallels no longer offered by any selected
    /// set are dropped from the parallel selection.
    pub fn select_sets(&mut self, catalog: &Catalog, names: &[&str]) -> Result<(), EngineError> {
        let setup = self.setup_mut()?;
        let product_name = setup
            .product
            .as_deref()
            .ok_or_else(|| EngineError::MissingSelection("choose a product first".into()))?;
        let product = find_product(catalog, product_name)?;

        let mut sets = Vec::new();
        for name in names {
            let set = find_set(product, name)?;
            push_unique(&mut sets, &set.name);
        }
        setup.sets = sets;

        let available = union_of_parallels(product, &setup.sets);
        setup.parallels.retain(|p| available.contains(p));
        Ok(())
    }

    pub fn select_parallels(
        &mut self,
        catalog: &Catalog,
        names: &[&str],
    ) -> Result<(), EngineError> {
        let available = self.available_parallels(catalog)?;
        let setup = self.setup_mut()?;
        let mut parallels = Vec::new();
        for name in names {
            if !available.iter().any(|p| p == name) {
                return Err(EngineError::UnknownParallel(name.to_string()));
            }
            push_unique(&mut parallels, name);
        }
        setup.parallels = parallels;
        Ok(())
    }

    pub fn select_location(&mut self, catalog: &Catalog, name: &str) -> Result<(), EngineError> {
        if !catalog.tags.contains(TagKind::Location, name) {
            return Err(EngineError::UnknownTag {
                kind: TagKind::Location.to_string(),
                name: name.to_string(),
            });
        }
        self.setup_mut()?.location = Some(name.to_string());
        Ok(())
    }

    /// Ordered union of the parallels defined by the selected sets.
    pub fn available_parallels(&self, catalog: &Catalog) -> Result<Vec<String>, EngineError> {
        let setup = self.setup().ok_or(EngineError::InvalidSessionState {
            expected: "configuring",
            actual: self.state.as_str(),
        })?;
        let Some(product_name) = setup.product.as_deref() else {
            return Ok(Vec::new());
        };
        let product = find_product(catalog, product_name)?;
        Ok(union_of_parallels(product, &setup.sets))
    }

    /// Leave setup and begin capturing. Fails without changing state when any
    /// selection is missing.
    pub fn start(&mut self, catalog: &Catalog) -> Result<SessionId, EngineError> {
        let setup = self.setup_mut()?.clone();
        let product_name = setup
            .product
            .ok_or_else(|| EngineError::MissingSelection("choose a product".into()))?;
        let Some(first_set) = setup.sets.first() else {
            return Err(EngineError::MissingSelection("choose at least one set".into()));
        };
        if setup.parallels.is_empty() {
            return Err(EngineError::MissingSelection(
                "choose at least one parallel".into(),
            ));
        }
        let location = setup
            .location
            .ok_or_else(|| EngineError::MissingSelection("choose a location".into()))?;

        let product = find_product(catalog, &product_name)?;
        let active_set = find_set(product, first_set)?;
        // First selected parallel the first set defines, so the active
        // parallel is always one the active set offers.
        let active_parallel = setup
            .parallels
            .iter()
            .find(|p| active_set.has_parallel(p))
            .cloned();

        let session = ActiveSession {
            id: SessionId::new(),
            product: product_name,
            active_set: active_set.name.clone(),
            selected_sets: setup.sets,
            selected_parallels: setup.parallels,
            active_parallel,
            location,
            entries: Vec::new(),
            next_seq: 0,
        };
        let id = session.id;
        self.state = SessionState::Active(session);
        Ok(id)
    }

    // ========================================================================
    // Active
    // ========================================================================

    /// Parallels selectable for the active set.
    pub fn visible_parallels(&self, catalog: &Catalog) -> Result<Vec<String>, EngineError> {
        let session = self.active_ref()?;
        let product = find_product(catalog, &session.product)?;
        let set = find_set(product, &session.active_set)?;
        Ok(session.intersection(set))
    }

    /// Make `name` the active set. The active parallel is kept when the new
    /// set offers it, otherwise the first available one takes over.
    pub fn switch_active_set(&mut self, catalog: &Catalog, name: &str) -> Result<(), EngineError> {
        let session = self.active_mut()?;
        if !session.selected_sets.iter().any(|s| s == name) {
            return Err(EngineError::UnknownSet(name.to_string()));
        }
        let product = find_product(catalog, &session.product)?;
        let set = find_set(product, name)?;
        let visible = session.intersection(set);

        let keep = session
            .active_parallel
            .as_ref()
            .is_some_and(|p| visible.contains(p));
        if !keep {
            session.active_parallel = visible.first().cloned();
        }
        session.active_set = set.name.clone();
        Ok(())
    }

    pub fn switch_active_parallel(
        &mut self,
        catalog: &Catalog,
        name: &str,
    ) -> Result<(), EngineError> {
        let visible = self.visible_parallels(catalog)?;
        if !visible.iter().any(|p| p == name) {
            return Err(EngineError::UnknownParallel(name.to_string()));
        }
        self.active_mut()?.active_parallel = Some(name.to_string());
        Ok(())
    }

    /// One-tap capture of a card in the active set with the active parallel.
    pub fn tap_add(
        &self,
        catalog: &Catalog,
        number: &str,
        added_at: DateTime<Utc>,
    ) -> Result<AppendPending, EngineError> {
        let session = self.active_ref()?;
        let parallel = session
            .active_parallel
            .clone()
            .ok_or(EngineError::MissingParallel)?;
        let product = find_product(catalog, &session.product)?;
        let set = find_set(product, &session.active_set)?;
        let card = set
            .card(number)
            .ok_or_else(|| EngineError::UnknownCard(format!("{} #{number}", set.name)))?;

        Ok(AppendPending(NewPendingEntry {
            action: EntryAction::Add,
            product: product.name.clone(),
            set: set.name.clone(),
            card_number: card.number.clone(),
            parallel,
            player: card.display_name().to_string(),
            team: card.team.clone(),
            quantity: 1,
            serial_number: None,
            grade: None,
            notes: None,
            tags: EntryTags {
                location: Some(session.location.clone()),
                ..EntryTags::default()
            },
            added_at,
        }))
    }

    /// Product, active set and pre-selections for a long-press capture sheet.
    pub fn capture_defaults(&self) -> Result<(String, String, SessionDefaults), EngineError> {
        let session = self.active_ref()?;
        Ok((
            session.product.clone(),
            session.active_set.clone(),
            SessionDefaults {
                session: session.id,
                parallel: session.active_parallel.clone(),
                location: session.location.clone(),
            },
        ))
    }

    /// Mirror a ledger row that was durably written for this session.
    pub fn record_append(&mut self, entry: &PendingEntry) -> Result<(), EngineError> {
        let session = self.active_mut()?;
        session.entries.push(SessionEntry {
            seq: session.next_seq,
            id: entry.id,
            set: entry.set.clone(),
            card_number: entry.card_number.clone(),
            parallel: entry.parallel.clone(),
        });
        session.next_seq += 1;
        Ok(())
    }

    /// The deletion that undoes the most recent session capture, if any.
    pub fn undo(&self) -> Result<Option<DeletePending>, EngineError> {
        let session = self.active_ref()?;
        Ok(session
            .entries
            .last()
            .map(|e| DeletePending(e.id)))
    }

    /// Drop the mirror of `id` once its deletion has succeeded. Only the most
    /// recent entry can be removed.
    pub fn record_undo(&mut self, id: PendingId) -> Result<Option<SessionEntry>, EngineError> {
        let session = self.active_mut()?;
        if session.entries.last().is_some_and(|e| e.id == id) {
            return Ok(session.entries.pop());
        }
        Ok(None)
    }

    pub fn entry_count(&self) -> usize {
        self.active().map_or(0, |s| s.entries.len())
    }

    pub fn badge_count(&self, set: &str, number: &str) -> usize {
        self.active().map_or(0, |s| s.badge_count(set, number))
    }

    /// Discard all session state. Ledger rows already written stay.
    /// Returns how many captures the session had recorded.
    pub fn end(&mut self) -> usize {
        let recorded = self.entry_count();
        self.state = SessionState::Uninitialized;
        recorded
    }
}

fn union_of_parallels(product: &Product, sets: &[String]) -> Vec<String> {
    let mut union = Vec::new();
    for set in sets.iter().filter_map(|name| product.set(name)) {
        for parallel in &set.parallels {
            push_unique(&mut union, &parallel.name);
        }
    }
    union
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> Catalog {
        Catalog::from_value(json!({
            "products": [{"sport": "Baseball", "year": 2024, "name": "2024 Topps", "sets": [
                {"name": "Base",
                 "cards": [{"number": "1", "player": "Alice"}, {"number": "2", "player": "Bob"}],
                 "parallels": [{"name": "Base", "is_base": true}, {"name": "Gold"}]},
                {"name": "Inserts",
                 "cards": [{"number": "I-1", "player": "Carol"}],
                 "parallels": [{"name": "Base", "is_base": true}, {"name": "Rainbow"}]},
                {"name": "Short Prints",
                 "cards": [{"number": "SP-1", "player": "Dan"}],
                 "parallels": [{"name": "Red"}]}
            ]}],
            "tags": {"location": ["Box A", "Box B"]}
        }))
        .unwrap()
    }

    fn started(sets: &[&str], parallels: &[&str]) -> SessionEngine {
        let catalog = catalog();
        let mut engine = SessionEngine::new();
        engine.begin_setup().unwrap();
        engine.select_product(&catalog, "2024 Topps").unwrap();
        engine.select_sets(&catalog, sets).unwrap();
        engine.select_parallels(&catalog, parallels).unwrap();
        engine.select_location(&catalog, "Box A").unwrap();
        engine.start(&catalog).unwrap();
        engine
    }

    fn appended(effect: AppendPending, id: i64) -> PendingEntry {
        effect.0.with_id(PendingId::from_raw(id))
    }

    #[test]
    fn start_requires_every_selection() {
        let catalog = catalog();
        let mut engine = SessionEngine::new();
        assert!(matches!(
            engine.start(&catalog),
            Err(EngineError::InvalidSessionState { .. })
        ));

        engine.begin_setup().unwrap();
        assert!(matches!(engine.start(&catalog), Err(EngineError::MissingSelection(_))));

        engine.select_product(&catalog, "2024 Topps").unwrap();
        assert!(matches!(engine.start(&catalog), Err(EngineError::MissingSelection(_))));

        engine.select_sets(&catalog, &["Base"]).unwrap();
        assert!(matches!(engine.start(&catalog), Err(EngineError::MissingSelection(_))));

        engine.select_parallels(&catalog, &["Gold"]).unwrap();
        assert!(matches!(engine.start(&catalog), Err(EngineError::MissingSelection(_))));
        assert_eq!(engine.state().as_str(), "configuring");

        engine.select_location(&catalog, "Box B").unwrap();
        engine.start(&catalog).unwrap();

        let session = engine.active().unwrap();
        assert_eq!(session.active_set(), "Base");
        assert_eq!(session.active_parallel(), Some("Gold"));
        assert_eq!(session.location(), "Box B");
        assert!(session.entries().is_empty());
    }

    #[test]
    fn sets_require_a_product() {
        let catalog = catalog();
        let mut engine = SessionEngine::new();
        engine.begin_setup().unwrap();
        assert!(matches!(
            engine.select_sets(&catalog, &["Base"]),
            Err(EngineError::MissingSelection(_))
        ));
    }

    #[test]
    fn available_parallels_is_ordered_union() {
        let catalog = catalog();
        let mut engine = SessionEngine::new();
        engine.begin_setup().unwrap();
        engine.select_product(&catalog, "2024 Topps").unwrap();
        engine.select_sets(&catalog, &["Base", "Inserts"]).unwrap();
        assert_eq!(
            engine.available_parallels(&catalog).unwrap(),
            vec!["Base", "Gold", "Rainbow"]
        );

        engine.select_parallels(&catalog, &["Gold", "Rainbow"]).unwrap();
        engine.select_sets(&catalog, &["Inserts"]).unwrap();
        assert_eq!(engine.setup().unwrap().parallels, vec!["Rainbow"]);
        assert!(matches!(
            engine.select_parallels(&catalog, &["Gold"]),
            Err(EngineError::UnknownParallel(_))
        ));
    }

    #[test]
    fn unknown_location_rejected() {
        let catalog = catalog();
        let mut engine = SessionEngine::new();
        engine.begin_setup().unwrap();
        assert!(matches!(
            engine.select_location(&catalog, "Box Z"),
            Err(EngineError::UnknownTag { .. })
        ));
    }

    #[test]
    fn switching_set_keeps_parallel_only_when_available() {
        let catalog = catalog();
        let mut engine = started(
            &["Base", "Inserts", "Short Prints"],
            &["Base", "Gold", "Rainbow", "Red"],
        );
        assert_eq!(engine.active().unwrap().active_parallel(), Some("Base"));

        engine.switch_active_set(&catalog, "Inserts").unwrap();
        assert_eq!(engine.active().unwrap().active_parallel(), Some("Base"));
        assert_eq!(engine.visible_parallels(&catalog).unwrap(), vec!["Base", "Rainbow"]);

        engine.switch_active_parallel(&catalog, "Rainbow").unwrap();
        engine.switch_active_set(&catalog, "Base").unwrap();
        assert_eq!(engine.active().unwrap().active_parallel(), Some("Base"));

        engine.switch_active_set(&catalog, "Short Prints").unwrap();
        assert_eq!(engine.active().unwrap().active_parallel(), Some("Red"));
    }

    #[test]
    fn active_parallel_always_in_intersection() {
        let catalog = catalog();
        let mut engine = started(&["Base", "Inserts", "Short Prints"], &["Gold", "Rainbow"]);
        for set in ["Inserts", "Short Prints", "Base", "Inserts", "Base"] {
            engine.switch_active_set(&catalog, set).unwrap();
            let visible = engine.visible_parallels(&catalog).unwrap();
            match engine.active().unwrap().active_parallel() {
                Some(p) => assert!(visible.iter().any(|v| v == p)),
                None => assert!(visible.is_empty()),
            }
        }
    }

    #[test]
    fn tap_without_parallel_fails() {
        let catalog = catalog();
        let mut engine = started(&["Base", "Short Prints"], &["Gold"]);
        engine.switch_active_set(&catalog, "Short Prints").unwrap();
        assert_eq!(engine.active().unwrap().active_parallel(), None);
        assert!(matches!(
            engine.tap_add(&catalog, "SP-1", Utc::now()),
            Err(EngineError::MissingParallel)
        ));
    }

    #[test]
    fn parallel_switch_limited_to_active_set() {
        let catalog = catalog();
        let mut engine = started(&["Base", "Inserts"], &["Base", "Gold", "Rainbow"]);
        assert!(matches!(
            engine.switch_active_parallel(&catalog, "Rainbow"),
            Err(EngineError::UnknownParallel(_))
        ));
        assert!(matches!(
            engine.switch_active_set(&catalog, "Short Prints"),
            Err(EngineError::UnknownSet(_))
        ));
    }

    #[test]
    fn tap_effect_carries_session_context() {
        let catalog = catalog();
        let engine = started(&["Base"], &["Base", "Gold"]);
        let entry = appended(engine.tap_add(&catalog, "1", Utc::now()).unwrap(), 1);
        assert_eq!(entry.product, "2024 Topps");
        assert_eq!(entry.set, "Base");
        assert_eq!(entry.card_number, "1");
        assert_eq!(entry.parallel, "Base");
        assert_eq!(entry.player, "Alice");
        assert_eq!(entry.quantity, 1);
        assert_eq!(entry.tags.location.as_deref(), Some("Box A"));
        assert!(entry.serial_number.is_none() && entry.grade.is_none() && entry.notes.is_none());

        assert!(matches!(
            engine.tap_add(&catalog, "99", Utc::now()),
            Err(EngineError::UnknownCard(_))
        ));
    }

    #[test]
    fn badge_counts_all_parallels_and_undo_is_lifo() {
        let catalog = catalog();
        let mut engine = started(&["Base"], &["Base", "Gold"]);

        let first = appended(engine.tap_add(&catalog, "1", Utc::now()).unwrap(), 10);
        engine.record_append(&first).unwrap();
        engine.switch_active_parallel(&catalog, "Gold").unwrap();
        let second = appended(engine.tap_add(&catalog, "1", Utc::now()).unwrap(), 11);
        engine.record_append(&second).unwrap();
        assert_eq!(engine.badge_count("Base", "1"), 2);
        assert_eq!(engine.badge_count("Base", "2"), 0);

        assert_eq!(
            engine.undo().unwrap(),
            Some(DeletePending(PendingId::from_raw(11)))
        );
        // a stale id does not pop anything
        assert_eq!(engine.record_undo(PendingId::from_raw(10)).unwrap(), None);
        let popped = engine.record_undo(PendingId::from_raw(11)).unwrap().unwrap();
        assert_eq!(popped.parallel, "Gold");
        assert_eq!(engine.badge_count("Base", "1"), 1);
        assert_eq!(engine.entry_count(), 1);
    }

    #[test]
    fn undo_with_no_entries_is_noop() {
        let engine = started(&["Base"], &["Base"]);
        assert_eq!(engine.undo().unwrap(), None);
    }

    #[test]
    fn end_discards_state() {
        let catalog = catalog();
        let mut engine = started(&["Base"], &["Base"]);
        let entry = appended(engine.tap_add(&catalog, "2", Utc::now()).unwrap(), 1);
        engine.record_append(&entry).unwrap();

        assert_eq!(engine.end(), 1);
        assert_eq!(engine.state().as_str(), "uninitialized");
        assert_eq!(engine.entry_count(), 0);
        assert!(matches!(
            engine.undo(),
            Err(EngineError::InvalidSessionState { .. })
        ));
    }

    #[test]
    fn setup_cannot_begin_while_active() {
        let mut engine = started(&["Base"], &["Base"]);
        assert!(matches!(
            engine.begin_setup(),
            Err(EngineError::InvalidSessionState { .. })
        ));
    }
}
