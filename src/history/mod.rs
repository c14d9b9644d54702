//! Durable dialogue history over embedded SQLite.
//!
//! Append-only rows with a pure FIFO retention sweep after every insert.
//! When a cipher is configured, user input, entities and response are stored
//! encrypted and flagged as such - never mixed within one record. A row that
//! fails to decrypt is logged and skipped on read; it never poisons the
//! listing or the turn.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;
use tracing::{info, warn};

use crate::nlu::{Entity, Intent};
use crate::security::SecurityCapability;

/// One persisted turn, decrypted for the caller.
#[derive(Debug, Clone, Serialize)]
pub struct DialogueRecord {
    pub id: i64,
    pub timestamp: String,
    pub user_input: String,
    pub intent: String,
    pub entities_json: String,
    pub response: String,
    pub is_encrypted: bool,
}

impl DialogueRecord {
    /// Decode the entities column. Empty on malformed payloads.
    pub fn entities(&self) -> Vec<Entity> {
        serde_json::from_str(&self.entities_json).unwrap_or_default()
    }
}

/// SQLite-backed store for dialogue turns.
pub struct HistoryStore {
    conn: Connection,
    max_rows: usize,
    cipher: Option<Arc<dyn SecurityCapability>>,
}

impl HistoryStore {
    /// Open or create the history database file.
    pub fn open<P: AsRef<Path>>(
        path: P,
        max_rows: usize,
        cipher: Option<Arc<dyn SecurityCapability>>,
    ) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .context("Failed to create history database directory")?;
            }
        }
        let conn = Connection::open(path).context("Failed to open history database")?;
        let store = Self {
            conn,
            max_rows,
            cipher,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory store for tests and throwaway sessions.
    pub fn open_in_memory(
        max_rows: usize,
        cipher: Option<Arc<dyn SecurityCapability>>,
    ) -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to create in-memory history database")?;
        let store = Self {
            conn,
            max_rows,
            cipher,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS dialogue_history (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    timestamp TEXT NOT NULL,
                    user_input TEXT NOT NULL,
                    intent TEXT NOT NULL,
                    entities TEXT NOT NULL,
                    response TEXT NOT NULL,
                    is_encrypted INTEGER NOT NULL DEFAULT 0
                )",
                [],
            )
            .context("Failed to create dialogue_history table")?;
        Ok(())
    }

    /// Append one turn, then sweep retention.
    pub fn append(
        &self,
        user_input: &str,
        intent: Intent,
        entities: &[Entity],
        response: &str,
    ) -> Result<()> {
        let entities_json =
            serde_json::to_string(entities).context("Failed to serialize entities")?;

        let (user_input, entities_json, response, is_encrypted) = match &self.cipher {
            Some(cipher) => (
                cipher.encrypt(user_input)?,
                cipher.encrypt(&entities_json)?,
                cipher.encrypt(response)?,
                true,
            ),
            None => (
                user_input.to_string(),
                entities_json,
                response.to_string(),
                false,
            ),
        };

        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        self.conn
            .execute(
                "INSERT INTO dialogue_history
                     (timestamp, user_input, intent, entities, response, is_encrypted)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    timestamp,
                    user_input,
                    intent.as_str(),
                    entities_json,
                    response,
                    is_encrypted
                ],
            )
            .context("Failed to insert dialogue record")?;

        self.enforce_retention()?;
        Ok(())
    }

    /// Delete oldest rows until the count is back at the maximum.
    fn enforce_retention(&self) -> Result<usize> {
        let total = self.count()?;
        if total <= self.max_rows {
            return Ok(0);
        }
        let excess = total - self.max_rows;
        let deleted = self
            .conn
            .execute(
                "DELETE FROM dialogue_history WHERE id IN (
                     SELECT id FROM dialogue_history
                     ORDER BY timestamp ASC, id ASC
                     LIMIT ?1
                 )",
                params![excess],
            )
            .context("Failed to prune dialogue history")?;
        info!(deleted, "pruned old dialogue history rows");
        Ok(deleted)
    }

    /// The most recent `limit` turns, oldest first. Rows that fail to
    /// decrypt are skipped.
    pub fn recent(&self, limit: usize) -> Result<Vec<DialogueRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, timestamp, user_input, intent, entities, response, is_encrypted
             FROM dialogue_history
             ORDER BY timestamp DESC, id DESC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit], |row| {
            Ok(DialogueRecord {
                id: row.get(0)?,
                timestamp: row.get(1)?,
                user_input: row.get(2)?,
                intent: row.get(3)?,
                entities_json: row.get(4)?,
                response: row.get(5)?,
                is_encrypted: row.get(6)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            let record = row.context("Failed to read dialogue record")?;
            match self.decrypt_record(record) {
                Some(record) => records.push(record),
                None => continue,
            }
        }

        records.reverse();
        Ok(records)
    }

    fn decrypt_record(&self, mut record: DialogueRecord) -> Option<DialogueRecord> {
        if !record.is_encrypted {
            return Some(record);
        }
        let cipher = match &self.cipher {
            Some(cipher) => cipher,
            None => {
                warn!(id = record.id, "encrypted row but no cipher configured, skipping");
                return None;
            }
        };

        let fields = [
            cipher.decrypt(&record.user_input),
            cipher.decrypt(&record.entities_json),
            cipher.decrypt(&record.response),
        ];
        match fields {
            [Ok(user_input), Ok(entities_json), Ok(response)] => {
                record.user_input = user_input;
                record.entities_json = entities_json;
                record.response = response;
                Some(record)
            }
            _ => {
                warn!(id = record.id, "failed to decrypt dialogue row, skipping");
                None
            }
        }
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM dialogue_history", [], |row| {
                row.get(0)
            })?;
        Ok(count as usize)
    }

    pub fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM dialogue_history", [])?;
        Ok(())
    }
}
