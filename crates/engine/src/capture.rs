//! Capture sheet: the initial attribute values for one card capture and the
//! validation that turns the user's final values into a ledger row.

use chrono::{DateTime, Utc};

use cardsort_core::{
    Catalog, EntryAction, EntryTags, LockField, NewPendingEntry, PendingEntry, SessionId, TagKind,
    TagVocabulary,
};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::locks::FieldLocks;

/// Pre-selections a session hands to a long-press capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDefaults {
    pub session: SessionId,
    pub parallel: Option<String>,
    pub location: String,
}

#[derive(Debug, Clone, Copy)]
pub enum CaptureContext<'a> {
    Browse,
    Session(&'a SessionDefaults),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    Browse,
    Session,
}

impl CaptureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Browse => "browse",
            Self::Session => "session",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureValues {
    pub parallel: Option<String>,
    pub quantity: u32,
    pub serial_number: Option<String>,
    pub grade: Option<String>,
    pub notes: Option<String>,
    pub location: Option<String>,
    pub price_bucket: Option<String>,
    pub status: Option<String>,
}

impl Default for CaptureValues {
    fn default() -> Self {
        Self {
            parallel: None,
            quantity: 1,
            serial_number: None,
            grade: None,
            notes: None,
            location: None,
            price_bucket: None,
            status: None,
        }
    }
}

impl CaptureValues {
    pub fn field_value(&self, field: LockField) -> Option<&str> {
        let value = match field {
            LockField::Parallel => &self.parallel,
            LockField::Grade => &self.grade,
            LockField::Location => &self.location,
            LockField::PriceBucket => &self.price_bucket,
            LockField::Status => &self.status,
        };
        value.as_deref().filter(|v| !v.is_empty())
    }

    pub fn tag(&self, kind: TagKind) -> Option<&str> {
        let value = match kind {
            TagKind::Location => &self.location,
            TagKind::PriceBucket => &self.price_bucket,
            TagKind::Status => &self.status,
        };
        value.as_deref().filter(|v| !v.is_empty())
    }
}

impl From<&PendingEntry> for CaptureValues {
    fn from(entry: &PendingEntry) -> Self {
        Self {
            parallel: Some(entry.parallel.clone()),
            quantity: entry.quantity,
            serial_number: entry.serial_number.clone(),
            grade: entry.grade.clone(),
            notes: entry.notes.clone(),
            location: entry.tags.location.clone(),
            price_bucket: entry.tags.price_bucket.clone(),
            status: entry.tags.status.clone(),
        }
    }
}

fn normalized(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone)]
pub struct CaptureSheet {
    mode: CaptureMode,
    product: String,
    set: String,
    card_number: String,
    player: String,
    team: Option<String>,
    parallel_options: Vec<String>,
    max_quantity: Option<u32>,
    /// Parallel used in place of a locked one the set does not define.
    parallel_lock_fallback: Option<String>,
    session: Option<SessionId>,
    pub values: CaptureValues,
}

impl CaptureSheet {
    /// Resolve the initial values for capturing `number` from `product`/`set`.
    ///
    /// Browse captures start from the field locks; a locked parallel that the
    /// set does not define is skipped for this capture but stays locked.
    /// Session captures ignore locks and start from the session defaults.
    pub fn open(
        catalog: &Catalog,
        product: &str,
        set: &str,
        number: &str,
        context: CaptureContext<'_>,
        locks: &FieldLocks,
        config: &EngineConfig,
    ) -> Result<Self, EngineError> {
        let product_entry = catalog
            .product(product)
            .ok_or_else(|| EngineError::UnknownProduct(product.to_string()))?;
        let set_entry = product_entry
            .set(set)
            .ok_or_else(|| EngineError::UnknownSet(set.to_string()))?;
        let card = set_entry
            .card(number)
            .ok_or_else(|| EngineError::UnknownCard(format!("{set} #{number}")))?;
        let base = set_entry
            .base_parallel()
            .ok_or_else(|| EngineError::NoParallels { set: set.to_string() })?;

        let mut parallel_lock_fallback = None;
        let (mode, values, max_quantity, session) = match context {
            CaptureContext::Browse => {
                let locked = locks.value(LockField::Parallel);
                let parallel = match locked {
                    Some(p) if set_entry.has_parallel(p) => p,
                    Some(_) => {
                        parallel_lock_fallback = Some(base.name.clone());
                        base.name.as_str()
                    }
                    None => base.name.as_str(),
                };
                let values = CaptureValues {
                    parallel: Some(parallel.to_string()),
                    quantity: config.default_quantity,
                    serial_number: None,
                    grade: locks.resolve_initial(LockField::Grade, None),
                    notes: None,
                    location: locks.resolve_initial(LockField::Location, None),
                    price_bucket: locks.resolve_initial(LockField::PriceBucket, None),
                    status: locks.resolve_initial(LockField::Status, None),
                };
                (CaptureMode::Browse, values, Some(config.max_browse_quantity), None)
            }
            CaptureContext::Session(defaults) => {
                let parallel = defaults
                    .parallel
                    .as_deref()
                    .filter(|p| set_entry.has_parallel(p))
                    .unwrap_or(&base.name);
                let values = CaptureValues {
                    parallel: Some(parallel.to_string()),
                    quantity: config.default_quantity,
                    location: Some(defaults.location.clone()),
                    ..CaptureValues::default()
                };
                (CaptureMode::Session, values, None, Some(defaults.session))
            }
        };

        Ok(Self {
            mode,
            product: product_entry.name.clone(),
            set: set_entry.name.clone(),
            card_number: card.number.clone(),
            player: card.display_name().to_string(),
            team: card.team.clone(),
            parallel_options: set_entry.parallels.iter().map(|p| p.name.clone()).collect(),
            max_quantity,
            parallel_lock_fallback,
            session,
            values,
        })
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn set(&self) -> &str {
        &self.set
    }

    pub fn card_number(&self) -> &str {
        &self.card_number
    }

    pub fn player(&self) -> &str {
        &self.player
    }

    pub fn parallel_options(&self) -> &[String] {
        &self.parallel_options
    }

    pub fn max_quantity(&self) -> Option<u32> {
        self.max_quantity
    }

    /// The session that opened this sheet. `None` for browse captures.
    pub fn session(&self) -> Option<SessionId> {
        self.session
    }

    /// Fields that must survive write-through after this sheet is confirmed
    /// with `submitted_parallel`. A parallel lock skipped because the set
    /// lacks it stays put unless the user picked a different parallel.
    pub fn preserved_locks(&self, submitted_parallel: &str) -> &'static [LockField] {
        match self.parallel_lock_fallback.as_deref() {
            Some(fallback) if fallback == submitted_parallel => &[LockField::Parallel],
            _ => &[],
        }
    }

    /// Validate the current values and build the ledger row they describe.
    pub fn confirm(
        &self,
        tags: &TagVocabulary,
        added_at: DateTime<Utc>,
    ) -> Result<NewPendingEntry, EngineError> {
        let parallel = normalized(&self.values.parallel).ok_or(EngineError::MissingParallel)?;
        if !self.parallel_options.contains(&parallel) {
            return Err(EngineError::UnknownParallel(parallel));
        }

        let quantity = self.values.quantity;
        let max = self.max_quantity.unwrap_or(u32::MAX);
        if quantity == 0 || quantity > max {
            return Err(EngineError::InvalidQuantity { quantity, max });
        }

        let mut entry_tags = EntryTags::default();
        for kind in TagKind::ALL {
            let value = self.values.tag(kind).map(str::trim).filter(|v| !v.is_empty());
            if let Some(name) = value
                && !tags.contains(kind, name)
            {
                return Err(EngineError::UnknownTag {
                    kind: kind.to_string(),
                    name: name.to_string(),
                });
            }
            entry_tags.set(kind, value.map(str::to_string));
        }

        Ok(NewPendingEntry {
            action: EntryAction::Add,
            product: self.product.clone(),
            set: self.set.clone(),
            card_number: self.card_number.clone(),
            parallel,
            player: self.player.clone(),
            team: self.team.clone(),
            quantity,
            serial_number: normalized(&self.values.serial_number),
            grade: normalized(&self.values.grade),
            notes: normalized(&self.values.notes),
            tags: entry_tags,
            added_at,
        })
    }
}
