//! Durable storage for the in-progress rotation attempt.
//!
//! SQLite is the only durable store. The table holds at most one row
//! (`id = 0`, last-writer-wins); the absence of a row is `NoAttempt`.
//! Every write commits to SQLite first and only then updates the
//! derived `watch` value observers subscribe to. Recovery on open
//! rebuilds the derived value silently — nobody is notified.

use crate::types::RotationAttemptState;
use crate::RotationStoreError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;
use wallet_core::AuthKeySet;

const STATE_PROPOSAL: &str = "proposal";
const STATE_KEYS_WRITTEN: &str = "keys_written";

/// Durable record of the in-progress key-rotation attempt.
pub struct RotationAttemptStore {
    conn: Mutex<Connection>,
    state_tx: watch::Sender<RotationAttemptState>,
}

impl RotationAttemptStore {
    /// Opens the store at the given path, creating the schema if needed.
    ///
    /// Performs recovery: the current row is loaded into the derived
    /// watch value without notifying anyone.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RotationStoreError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Creates a store over an in-memory database. Useful for testing.
    pub fn in_memory() -> Result<Self, RotationStoreError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, RotationStoreError> {
        Self::init_schema(&conn)?;
        let state = Self::load_state(&conn)?;
        debug!(?state, "rotation attempt store recovered");
        let (state_tx, _rx) = watch::channel(state);
        Ok(Self {
            conn: Mutex::new(conn),
            state_tx,
        })
    }

    fn init_schema(conn: &Connection) -> Result<(), RotationStoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS rotation_attempt (
                id INTEGER PRIMARY KEY CHECK (id = 0),
                attempt_id TEXT NOT NULL,
                state TEXT NOT NULL,
                new_keys TEXT,
                created_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn load_state(conn: &Connection) -> Result<RotationAttemptState, RotationStoreError> {
        let row: Option<(String, Option<String>)> = conn
            .query_row(
                "SELECT state, new_keys FROM rotation_attempt WHERE id = 0",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            None => Ok(RotationAttemptState::NoAttempt),
            Some((state, _)) if state == STATE_PROPOSAL => Ok(RotationAttemptState::ProposalWritten),
            Some((state, Some(json))) if state == STATE_KEYS_WRITTEN => {
                let keys: AuthKeySet = serde_json::from_str(&json)?;
                Ok(RotationAttemptState::KeysWritten(keys))
            }
            Some((state, _)) => Err(RotationStoreError::Corrupt(format!(
                "unknown attempt state '{state}'"
            ))),
        }
    }

    /// Current durable state, read from SQLite.
    pub fn pending_attempt(&self) -> Result<RotationAttemptState, RotationStoreError> {
        let conn = self.conn.lock().expect("lock poisoned");
        Self::load_state(&conn)
    }

    /// Record that a rotation has been recommended.
    ///
    /// A no-op when a `KeysWritten` record exists: an in-flight attempt
    /// outranks a recommendation, and its key set may already be live
    /// server-side.
    pub fn set_proposal(&self) -> Result<(), RotationStoreError> {
        let conn = self.conn.lock().expect("lock poisoned");
        match Self::load_state(&conn)? {
            RotationAttemptState::KeysWritten(_) => {
                debug!("proposal skipped, an incomplete attempt exists");
                return Ok(());
            }
            RotationAttemptState::ProposalWritten => return Ok(()),
            RotationAttemptState::NoAttempt => {}
        }

        conn.execute(
            "INSERT OR REPLACE INTO rotation_attempt (id, attempt_id, state, new_keys, created_at)
             VALUES (0, ?1, ?2, NULL, ?3)",
            params![
                Uuid::new_v4().to_string(),
                STATE_PROPOSAL,
                Utc::now().to_rfc3339()
            ],
        )?;
        drop(conn);

        self.publish(RotationAttemptState::ProposalWritten);
        Ok(())
    }

    /// Durably record a candidate key set, replacing any prior record.
    pub fn set_keys_written(&self, keys: &AuthKeySet) -> Result<(), RotationStoreError> {
        let json = serde_json::to_string(keys)?;

        let conn = self.conn.lock().expect("lock poisoned");
        conn.execute(
            "INSERT OR REPLACE INTO rotation_attempt (id, attempt_id, state, new_keys, created_at)
             VALUES (0, ?1, ?2, ?3, ?4)",
            params![
                Uuid::new_v4().to_string(),
                STATE_KEYS_WRITTEN,
                json,
                Utc::now().to_rfc3339()
            ],
        )?;
        drop(conn);

        self.publish(RotationAttemptState::KeysWritten(keys.clone()));
        Ok(())
    }

    /// Clear the attempt record, whatever it holds.
    pub fn clear(&self) -> Result<(), RotationStoreError> {
        let conn = self.conn.lock().expect("lock poisoned");
        conn.execute("DELETE FROM rotation_attempt WHERE id = 0", [])?;
        drop(conn);

        self.publish(RotationAttemptState::NoAttempt);
        Ok(())
    }

    /// Clear the record only if it is a proposal.
    pub fn clear_proposal(&self) -> Result<(), RotationStoreError> {
        let conn = self.conn.lock().expect("lock poisoned");
        if !matches!(
            Self::load_state(&conn)?,
            RotationAttemptState::ProposalWritten
        ) {
            return Ok(());
        }

        conn.execute("DELETE FROM rotation_attempt WHERE id = 0", [])?;
        drop(conn);

        self.publish(RotationAttemptState::NoAttempt);
        Ok(())
    }

    /// Subscribe to committed state changes.
    ///
    /// The channel is last-value-wins and non-blocking: a subscriber
    /// that misses an intermediate value simply reads the current one on
    /// its next check. Values are deduplicated against the previous one.
    pub fn observe(&self) -> watch::Receiver<RotationAttemptState> {
        self.state_tx.subscribe()
    }

    fn publish(&self, state: RotationAttemptState) {
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wallet_core::PublicKey;

    fn keys(tag: &str) -> AuthKeySet {
        AuthKeySet {
            global_auth_public_key: PublicKey::from_string(format!("{tag}-global")),
            recovery_auth_public_key: PublicKey::from_string(format!("{tag}-recovery")),
            hw_signed_global_key: None,
        }
    }

    #[test]
    fn starts_with_no_attempt() {
        let store = RotationAttemptStore::in_memory().unwrap();
        assert_eq!(
            store.pending_attempt().unwrap(),
            RotationAttemptState::NoAttempt
        );
    }

    #[test]
    fn proposal_round_trips() {
        let store = RotationAttemptStore::in_memory().unwrap();
        store.set_proposal().unwrap();
        assert_eq!(
            store.pending_attempt().unwrap(),
            RotationAttemptState::ProposalWritten
        );
    }

    #[test]
    fn keys_written_round_trips() {
        let store = RotationAttemptStore::in_memory().unwrap();
        store.set_keys_written(&keys("new")).unwrap();
        assert_eq!(
            store.pending_attempt().unwrap(),
            RotationAttemptState::KeysWritten(keys("new"))
        );
    }

    #[test]
    fn keys_written_replaces_proposal() {
        let store = RotationAttemptStore::in_memory().unwrap();
        store.set_proposal().unwrap();
        store.set_keys_written(&keys("new")).unwrap();
        assert_eq!(
            store.pending_attempt().unwrap(),
            RotationAttemptState::KeysWritten(keys("new"))
        );
    }

    #[test]
    fn proposal_does_not_clobber_keys_written() {
        let store = RotationAttemptStore::in_memory().unwrap();
        store.set_keys_written(&keys("new")).unwrap();
        store.set_proposal().unwrap();
        assert_eq!(
            store.pending_attempt().unwrap(),
            RotationAttemptState::KeysWritten(keys("new"))
        );
    }

    #[test]
    fn clear_proposal_leaves_keys_written_untouched() {
        let store = RotationAttemptStore::in_memory().unwrap();
        store.set_keys_written(&keys("new")).unwrap();
        store.clear_proposal().unwrap();
        assert_eq!(
            store.pending_attempt().unwrap(),
            RotationAttemptState::KeysWritten(keys("new"))
        );
    }

    #[test]
    fn clear_removes_any_record() {
        let store = RotationAttemptStore::in_memory().unwrap();
        store.set_keys_written(&keys("new")).unwrap();
        store.clear().unwrap();
        assert_eq!(
            store.pending_attempt().unwrap(),
            RotationAttemptState::NoAttempt
        );
    }

    #[test]
    fn attempt_survives_restart() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        let path = temp_file.path();

        {
            let store = RotationAttemptStore::open(path).unwrap();
            store.set_keys_written(&keys("new")).unwrap();
            // "Crash" by dropping without cleanup.
        }

        let store = RotationAttemptStore::open(path).unwrap();
        assert_eq!(
            store.pending_attempt().unwrap(),
            RotationAttemptState::KeysWritten(keys("new"))
        );
    }

    #[test]
    fn recovery_notifies_nobody() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        let path = temp_file.path();

        {
            let store = RotationAttemptStore::open(path).unwrap();
            store.set_proposal().unwrap();
        }

        let store = RotationAttemptStore::open(path).unwrap();
        let rx = store.observe();
        assert!(!rx.has_changed().unwrap());
        assert_eq!(*rx.borrow(), RotationAttemptState::ProposalWritten);
    }

    #[test]
    fn observers_see_committed_changes() {
        let store = RotationAttemptStore::in_memory().unwrap();
        let mut rx = store.observe();
        rx.borrow_and_update();

        store.set_proposal().unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(
            *rx.borrow_and_update(),
            RotationAttemptState::ProposalWritten
        );
    }

    #[test]
    fn redundant_writes_are_deduplicated() {
        let store = RotationAttemptStore::in_memory().unwrap();
        store.set_keys_written(&keys("new")).unwrap();

        let mut rx = store.observe();
        rx.borrow_and_update();

        store.set_keys_written(&keys("new")).unwrap();
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn clear_on_empty_store_notifies_nobody() {
        let store = RotationAttemptStore::in_memory().unwrap();
        let rx = store.observe();

        store.clear().unwrap();
        assert!(!rx.has_changed().unwrap());
    }
}
