use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;
use crate::fields::TagKind;
use crate::ids::PendingId;
use crate::owned::CardKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryAction {
    #[default]
    Add,
}

impl EntryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "add" => Ok(Self::Add),
            _ => Err(CoreError::Serialization(format!("unknown entry action: {s}"))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryTags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_bucket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl EntryTags {
    pub fn get(&self, kind: TagKind) -> Option<&str> {
        match kind {
            TagKind::Location => self.location.as_deref(),
            TagKind::PriceBucket => self.price_bucket.as_deref(),
            TagKind::Status => self.status.as_deref(),
        }
    }

    pub fn set(&mut self, kind: TagKind, value: Option<String>) {
        let slot = match kind {
            TagKind::Location => &mut self.location,
            TagKind::PriceBucket => &mut self.price_bucket,
            TagKind::Status => &mut self.status,
        };
        *slot = value;
    }

    pub fn is_empty(&self) -> bool {
        self.location.is_none() && self.price_bucket.is_none() && self.status.is_none()
    }
}

/// A ledger row before storage has assigned it an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPendingEntry {
    pub action: EntryAction,
    pub product: String,
    pub set: String,
    pub card_number: String,
    pub parallel: String,
    pub player: String,
    pub team: Option<String>,
    pub quantity: u32,
    pub serial_number: Option<String>,
    pub grade: Option<String>,
    pub notes: Option<String>,
    pub tags: EntryTags,
    pub added_at: DateTime<Utc>,
}

impl NewPendingEntry {
    pub fn with_id(self, id: PendingId) -> PendingEntry {
        PendingEntry {
            id,
            action: self.action,
            product: self.product,
            set: self.set,
            card_number: self.card_number,
            parallel: self.parallel,
            player: self.player,
            team: self.team,
            quantity: self.quantity,
            serial_number: self.serial_number,
            grade: self.grade,
            notes: self.notes,
            tags: self.tags,
            added_at: self.added_at,
        }
    }
}

/// A stored ledger row. Rows are never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingEntry {
    pub id: PendingId,
    pub action: EntryAction,
    pub product: String,
    pub set: String,
    pub card_number: String,
    pub parallel: String,
    pub player: String,
    pub team: Option<String>,
    pub quantity: u32,
    pub serial_number: Option<String>,
    pub grade: Option<String>,
    pub notes: Option<String>,
    pub tags: EntryTags,
    pub added_at: DateTime<Utc>,
}

impl PendingEntry {
    pub fn card_key(&self) -> CardKey {
        CardKey::new(&self.product, &self.set, &self.card_number)
    }

    pub fn is_card(&self, product: &str, set: &str, number: &str) -> bool {
        self.product == product && self.set == set && self.card_number == number
    }
}
