use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use cardsort_core::{Catalog, EntryAction, EntryTags, NewPendingEntry, PendingEntry, PendingId};

use crate::error::StorageError;
use crate::traits::{CatalogRecord, Storage};

/// Convert Vec<u8> to fixed-size array with proper error handling.
fn to_array<const N: usize>(v: Vec<u8>, label: &str) -> Result<[u8; N], StorageError> {
    v.try_into()
        .map_err(|_| StorageError::Serialization(format!("invalid {label} length")))
}

fn parse_timestamp(raw: &str, label: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Serialization(format!("invalid {label}: {e}")))
}

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn open(path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        crate::schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        crate::schema::init_schema(&conn)?;
        Ok(Self { conn })
    }
}

/// Column values of one `pending` row, read inside a rusqlite closure and
/// decoded outside it.
struct RawPendingRow {
    id: i64,
    action: String,
    product: String,
    set: String,
    card_number: String,
    parallel: String,
    player: String,
    team: Option<String>,
    quantity: u32,
    serial_number: Option<String>,
    grade: Option<String>,
    notes: Option<String>,
    tags: Vec<u8>,
    added_at: String,
}

impl RawPendingRow {
    fn read(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            action: row.get(1)?,
            product: row.get(2)?,
            set: row.get(3)?,
            card_number: row.get(4)?,
            parallel: row.get(5)?,
            player: row.get(6)?,
            team: row.get(7)?,
            quantity: row.get(8)?,
            serial_number: row.get(9)?,
            grade: row.get(10)?,
            notes: row.get(11)?,
            tags: row.get(12)?,
            added_at: row.get(13)?,
        })
    }

    fn decode(self) -> Result<PendingEntry, StorageError> {
        let tags: EntryTags = rmp_serde::from_slice(&self.tags)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(PendingEntry {
            id: PendingId::from_raw(self.id),
            action: EntryAction::parse(&self.action)?,
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
            tags,
            added_at: parse_timestamp(&self.added_at, "added_at")?,
        })
    }
}

impl Storage for SqliteStorage {
    fn put_catalog(&mut self, catalog: &Catalog) -> Result<(), StorageError> {
        let document = catalog.to_json()?;
        let fingerprint = catalog.fingerprint()?;
        self.conn.execute(
            "INSERT INTO catalog (slot, document, fingerprint, stored_at) VALUES (1, ?1, ?2, ?3)
             ON CONFLICT(slot) DO UPDATE SET document = excluded.document, fingerprint = excluded.fingerprint, stored_at = excluded.stored_at",
            rusqlite::params![document, &fingerprint[..], Utc::now().to_rfc3339()],
        )?;
        debug!(products = catalog.products.len(), "catalog stored");
        Ok(())
    }

    fn get_catalog(&self) -> Result<Option<CatalogRecord>, StorageError> {
        let row = self
            .conn
            .query_row(
                "SELECT document, fingerprint, stored_at FROM catalog WHERE slot = 1",
                [],
                |row| {
                    let document: String = row.get(0)?;
                    let fingerprint: Vec<u8> = row.get(1)?;
                    let stored_at: String = row.get(2)?;
                    Ok((document, fingerprint, stored_at))
                },
            )
            .optional()?;

        match row {
            Some((document, fingerprint, stored_at)) => Ok(Some(CatalogRecord {
                catalog: Catalog::load(&document)?,
                fingerprint: to_array::<32>(fingerprint, "fingerprint")?,
                stored_at: parse_timestamp(&stored_at, "stored_at")?,
            })),
            None => Ok(None),
        }
    }

    fn add_pending(&mut self, entry: &NewPendingEntry) -> Result<PendingId, StorageError> {
        let tags = rmp_serde::to_vec_named(&entry.tags)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.conn.execute(
            "INSERT INTO pending (action, product, set_name, card_number, parallel, player, team, quantity, serial_number, grade, notes, tags, added_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            rusqlite::params![
                entry.action.as_str(),
                entry.product,
                entry.set,
                entry.card_number,
                entry.parallel,
                entry.player,
                entry.team.as_deref(),
                entry.quantity,
                entry.serial_number.as_deref(),
                entry.grade.as_deref(),
                entry.notes.as_deref(),
                tags,
                entry.added_at.to_rfc3339(),
            ],
        )?;
        let id = PendingId::from_raw(self.conn.last_insert_rowid());
        debug!(
            %id,
            product = %entry.product,
            set = %entry.set,
            card = %entry.card_number,
            "pending row stored"
        );
        Ok(id)
    }

    fn get_all_pending(&self) -> Result<Vec<PendingEntry>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, action, product, set_name, card_number, parallel, player, team, quantity, serial_number, grade, notes, tags, added_at
             FROM pending ORDER BY id",
        )?;
        let rows = stmt.query_map([], RawPendingRow::read)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?.decode()?);
        }
        Ok(result)
    }

    fn delete_pending(&mut self, id: PendingId) -> Result<(), StorageError> {
        let affected = self
            .conn
            .execute("DELETE FROM pending WHERE id = ?1", rusqlite::params![id.as_raw()])?;
        debug!(%id, affected, "pending row deleted");
        Ok(())
    }

    fn clear_all_pending(&mut self) -> Result<(), StorageError> {
        let affected = self.conn.execute("DELETE FROM pending", [])?;
        debug!(affected, "pending rows cleared");
        Ok(())
    }

    fn pending_count(&self) -> Result<u64, StorageError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM pending", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
