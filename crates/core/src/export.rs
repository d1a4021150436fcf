//! The export document handed to whatever applies pending changes upstream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;
use crate::entry::{EntryAction, EntryTags, PendingEntry};
use crate::ids::ExportId;

pub const EXPORT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportChange {
    pub action: EntryAction,
    pub product: String,
    pub set: String,
    pub card_number: String,
    pub parallel: String,
    pub quantity: u32,
    pub serial_number: Option<String>,
    pub grade: Option<String>,
    pub notes: Option<String>,
    pub tags: EntryTags,
}

impl From<&PendingEntry> for ExportChange {
    fn from(entry: &PendingEntry) -> Self {
        Self {
            action: entry.action,
            product: entry.product.clone(),
            set: entry.set.clone(),
            card_number: entry.card_number.clone(),
            parallel: entry.parallel.clone(),
            quantity: entry.quantity,
            serial_number: entry.serial_number.clone(),
            grade: entry.grade.clone(),
            notes: entry.notes.clone(),
            tags: entry.tags.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub format_version: u32,
    pub export_id: ExportId,
    pub exported_at: DateTime<Utc>,
    pub changes: Vec<ExportChange>,
}

impl ExportDocument {
    /// One change per entry, in the order given. No reordering or deduplication.
    pub fn new(entries: &[PendingEntry], exported_at: DateTime<Utc>) -> Self {
        Self {
            format_version: EXPORT_FORMAT_VERSION,
            export_id: ExportId::new(),
            exported_at,
            changes: entries.iter().map(ExportChange::from).collect(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, CoreError> {
        serde_json::to_string_pretty(self).map_err(|e| CoreError::Serialization(e.to_string()))
    }

    pub fn suggested_file_name(&self) -> String {
        format!("card-changes-{}.json", self.exported_at.format("%Y%m%d-%H%M%S"))
    }
}
