//! Durable pending action queue.
//!
//! Append-only storage for [`PendingAction`] records. Ids are assigned by
//! the store and never reused; reads come back through the timestamp index
//! with ties broken by id.

use rusqlite::{params, OptionalExtension, Row};

use super::action::{Action, ActionType, PendingAction};
use crate::error::TitheError;
use crate::storage::Database;

const SELECT_COLUMNS: &str = "SELECT id, action_type, payload, timestamp FROM pending_actions";

/// Persistent queue of actions waiting to be replayed.
pub struct ActionQueue {
    db: Database,
}

impl ActionQueue {
    /// Create a queue over an open database.
    #[must_use]
    pub const fn with_database(db: Database) -> Self {
        Self { db }
    }

    /// Open a queue backed by a database file.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &std::path::Path) -> Result<Self, TitheError> {
        Ok(Self::with_database(Database::open_at(path)?))
    }

    /// Open a queue backed by an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn open_in_memory() -> Result<Self, TitheError> {
        Ok(Self::with_database(Database::open_in_memory()?))
    }

    /// Persist an action and return its newly assigned id.
    ///
    /// The id is also written back into `action`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAction` if the action already carries an id or fails
    /// validation, or a storage error if the write fails.
    pub fn append(&self, action: &mut PendingAction) -> Result<i64, TitheError> {
        if let Some(id) = action.id {
            return Err(TitheError::InvalidAction(format!(
                "action already stored with id {id}"
            )));
        }

        action.action.validate()?;
        let payload = action.action.payload_json()?;
        // a row that cannot be decoded would block every later read
        Action::from_parts(action.action_type(), &payload)?;

        let conn = self.db.connection();

        conn.execute(
            "INSERT INTO pending_actions (action_type, payload, timestamp) VALUES (?1, ?2, ?3)",
            params![action.action_type().as_str(), payload, action.timestamp],
        )
        .map_err(|e| TitheError::Storage(format!("Failed to append action: {e}")))?;

        let id = conn.last_insert_rowid();
        action.id = Some(id);
        tracing::debug!(id, action_type = %action.action_type(), "appended pending action");

        Ok(id)
    }

    /// All stored actions, oldest timestamp first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be decoded.
    pub fn list_ordered_by_timestamp(&self) -> Result<Vec<PendingAction>, TitheError> {
        self.query_ordered(None)
    }

    /// Like [`list_ordered_by_timestamp`](Self::list_ordered_by_timestamp),
    /// stopping after `limit` actions.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be decoded.
    pub fn list_ordered_limited(&self, limit: usize) -> Result<Vec<PendingAction>, TitheError> {
        self.query_ordered(Some(limit))
    }

    fn query_ordered(&self, limit: Option<usize>) -> Result<Vec<PendingAction>, TitheError> {
        let conn = self.db.connection();
        // SQLite treats a negative LIMIT as unbounded.
        let limit = limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));

        let mut stmt = conn
            .prepare(&format!(
                "{SELECT_COLUMNS} INDEXED BY idx_pending_actions_timestamp
                 ORDER BY timestamp ASC, id ASC
                 LIMIT ?1"
            ))
            .map_err(|e| TitheError::Storage(format!("Failed to prepare query: {e}")))?;

        let rows = stmt
            .query_map([limit], StoredRow::from_row)
            .map_err(|e| TitheError::Storage(format!("Failed to query pending actions: {e}")))?;

        let mut actions = Vec::new();
        for row in rows {
            let row = row.map_err(|e| TitheError::Storage(e.to_string()))?;
            actions.push(row.decode()?);
        }

        Ok(actions)
    }

    /// Get a specific action by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row cannot be decoded.
    pub fn get(&self, id: i64) -> Result<Option<PendingAction>, TitheError> {
        let conn = self.db.connection();

        let row = conn
            .query_row(&format!("{SELECT_COLUMNS} WHERE id = ?1"), [id], StoredRow::from_row)
            .optional()
            .map_err(|e| TitheError::Storage(format!("Failed to query action {id}: {e}")))?;

        row.map(StoredRow::decode).transpose()
    }

    /// Delete an action. Deleting an id that is not stored is not an error.
    ///
    /// Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn remove(&self, id: i64) -> Result<bool, TitheError> {
        let rows = self
            .db
            .connection()
            .execute("DELETE FROM pending_actions WHERE id = ?1", [id])
            .map_err(|e| TitheError::Storage(format!("Failed to remove action {id}: {e}")))?;

        Ok(rows > 0)
    }

    /// Delete every stored action. Assigned ids are not reused afterwards.
    ///
    /// Returns the number of actions removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn clear(&self) -> Result<usize, TitheError> {
        let rows = self
            .db
            .connection()
            .execute("DELETE FROM pending_actions", [])
            .map_err(|e| TitheError::Storage(format!("Failed to clear queue: {e}")))?;

        tracing::debug!(removed = rows, "cleared pending actions");
        Ok(rows)
    }

    /// Number of stored actions.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn len(&self) -> Result<usize, TitheError> {
        let count: i64 = self
            .db
            .connection()
            .query_row("SELECT COUNT(*) FROM pending_actions", [], |row| row.get(0))
            .map_err(|e| TitheError::Storage(format!("Failed to count actions: {e}")))?;

        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Whether the queue holds no actions.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn is_empty(&self) -> Result<bool, TitheError> {
        Ok(self.len()? == 0)
    }

    /// Get queue statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn stats(&self) -> Result<QueueStats, TitheError> {
        let conn = self.db.connection();

        let (pending, oldest_timestamp, newest_timestamp): (i64, Option<i64>, Option<i64>) = conn
            .query_row(
                "SELECT COUNT(*), MIN(timestamp), MAX(timestamp) FROM pending_actions",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(|e| TitheError::Storage(format!("Failed to read queue stats: {e}")))?;

        // sqlite_sequence only has a row once something has been appended.
        let last_assigned_id: Option<i64> = conn
            .query_row(
                "SELECT seq FROM sqlite_sequence WHERE name = 'pending_actions'",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| TitheError::Storage(format!("Failed to read id sequence: {e}")))?;

        Ok(QueueStats {
            pending: usize::try_from(pending).unwrap_or_default(),
            oldest_timestamp,
            newest_timestamp,
            last_assigned_id,
        })
    }
}

/// Queue statistics.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct QueueStats {
    /// Number of pending actions
    pub pending: usize,
    /// Timestamp of the oldest pending action (ms)
    pub oldest_timestamp: Option<i64>,
    /// Timestamp of the newest pending action (ms)
    pub newest_timestamp: Option<i64>,
    /// Highest id ever assigned by this store
    pub last_assigned_id: Option<i64>,
}

/// A row as stored, before the payload is decoded.
struct StoredRow {
    id: i64,
    action_type: String,
    payload: String,
    timestamp: i64,
}

impl StoredRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(0)?,
            action_type: row.get(1)?,
            payload: row.get(2)?,
            timestamp: row.get(3)?,
        })
    }

    fn decode(self) -> Result<PendingAction, TitheError> {
        let corrupt =
            |e: TitheError| TitheError::Storage(format!("Stored action {} is unreadable: {e}", self.id));

        let action_type: ActionType = self.action_type.parse().map_err(corrupt)?;
        let action = Action::from_parts(action_type, &self.payload).map_err(corrupt)?;

        Ok(PendingAction {
            id: Some(self.id),
            action,
            timestamp: self.timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::sync::action::{
        AddMemberPayload, DeleteMemberPayload, UpdateTithePayload,
    };

    fn create_test_queue() -> ActionQueue {
        ActionQueue::open_in_memory().unwrap()
    }

    fn tithe(member_id: i64, amount: f64, timestamp: i64) -> PendingAction {
        PendingAction::new(
            Action::UpdateTithe(UpdateTithePayload {
                member_id,
                amount,
                paid_on: None,
                note: None,
            }),
            timestamp,
        )
    }

    fn delete(member_id: i64, timestamp: i64) -> PendingAction {
        PendingAction::new(
            Action::DeleteMember(DeleteMemberPayload { member_id }),
            timestamp,
        )
    }

    #[test]
    fn test_append_and_get() {
        let queue = create_test_queue();

        let mut action = tithe(7, 50.0, 1_000);
        let id = queue.append(&mut action).unwrap();
        assert_eq!(action.id, Some(id));

        let loaded = queue.get(id).unwrap().unwrap();
        assert_eq!(loaded, action);
    }

    #[test]
    fn test_append_rejects_assigned_id() {
        let queue = create_test_queue();

        let mut action = tithe(7, 50.0, 1_000);
        queue.append(&mut action).unwrap();

        let err = queue.append(&mut action).unwrap_err();
        assert!(matches!(err, TitheError::InvalidAction(_)));
        assert_eq!(queue.len().unwrap(), 1);
    }

    #[test]
    fn test_append_rejects_non_finite_amount() {
        let queue = create_test_queue();
        queue.append(&mut delete(1, 1)).unwrap();

        for amount in [f64::INFINITY, f64::NAN, -5.0] {
            let mut bad = tithe(7, amount, 2);
            let err = queue.append(&mut bad).unwrap_err();
            assert!(matches!(err, TitheError::InvalidAction(_)));
            assert_eq!(bad.id, None);
        }

        let listed = queue.list_ordered_by_timestamp().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].action.member_id(), Some(1));
    }

    #[test]
    fn test_list_orders_by_timestamp_then_insertion() {
        let queue = create_test_queue();

        let mut late = tithe(1, 10.0, 3_000);
        let mut tie_first = delete(2, 2_000);
        let mut early = tithe(3, 30.0, 1_000);
        let mut tie_second = delete(4, 2_000);
        for action in [&mut late, &mut tie_first, &mut early, &mut tie_second] {
            queue.append(action).unwrap();
        }

        let listed = queue.list_ordered_by_timestamp().unwrap();
        let ids: Vec<_> = listed.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![early.id, tie_first.id, tie_second.id, late.id]);

        let timestamps: Vec<_> = listed.iter().map(|a| a.timestamp).collect();
        assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_list_limited() {
        let queue = create_test_queue();
        for ts in [5, 4, 3, 2, 1] {
            queue.append(&mut delete(ts, ts)).unwrap();
        }

        let listed = queue.list_ordered_limited(2).unwrap();
        let timestamps: Vec<_> = listed.iter().map(|a| a.timestamp).collect();
        assert_eq!(timestamps, vec![1, 2]);
    }

    #[test]
    fn test_ids_strictly_increase_across_removals() {
        let queue = create_test_queue();

        let first = queue.append(&mut delete(1, 1)).unwrap();
        let second = queue.append(&mut delete(2, 2)).unwrap();
        assert!(queue.remove(second).unwrap());

        let third = queue.append(&mut delete(3, 3)).unwrap();
        assert!(third > second);
        assert!(second > first);

        queue.clear().unwrap();
        let fourth = queue.append(&mut delete(4, 4)).unwrap();
        assert!(fourth > third);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let queue = create_test_queue();

        let id = queue.append(&mut delete(1, 1)).unwrap();
        assert!(queue.remove(id).unwrap());
        assert!(!queue.remove(id).unwrap());
        assert!(!queue.remove(9_999).unwrap());
        assert!(queue.get(id).unwrap().is_none());
    }

    #[test]
    fn test_clear_empties_queue() {
        let queue = create_test_queue();
        queue.append(&mut delete(1, 1)).unwrap();
        queue
            .append(&mut PendingAction::new(
                Action::AddMember(AddMemberPayload::named("Jane")),
                2,
            ))
            .unwrap();

        assert_eq!(queue.clear().unwrap(), 2);
        assert!(queue.list_ordered_by_timestamp().unwrap().is_empty());
        assert!(queue.is_empty().unwrap());
    }

    #[test]
    fn test_stats() {
        let queue = create_test_queue();

        let empty = queue.stats().unwrap();
        assert_eq!(empty.pending, 0);
        assert_eq!(empty.oldest_timestamp, None);
        assert_eq!(empty.last_assigned_id, None);

        queue.append(&mut delete(1, 500)).unwrap();
        let last = queue.append(&mut tithe(1, 5.0, 200)).unwrap();

        let stats = queue.stats().unwrap();
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.oldest_timestamp, Some(200));
        assert_eq!(stats.newest_timestamp, Some(500));
        assert_eq!(stats.last_assigned_id, Some(last));
    }

    #[test]
    fn test_unknown_stored_type_is_storage_error() {
        let queue = create_test_queue();
        queue
            .db
            .connection()
            .execute(
                "INSERT INTO pending_actions (action_type, payload, timestamp)
                 VALUES ('ARCHIVE_MEMBER', '{}', 1)",
                [],
            )
            .unwrap();

        let err = queue.list_ordered_by_timestamp().unwrap_err();
        assert!(matches!(err, TitheError::Storage(_)));
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("queue.db");

        let id = {
            let queue = ActionQueue::open_at(&db_path).unwrap();
            queue.append(&mut tithe(7, 50.0, 1)).unwrap()
        };

        let queue = ActionQueue::open_at(&db_path).unwrap();
        let listed = queue.list_ordered_by_timestamp().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, Some(id));

        let next = queue.append(&mut delete(1, 2)).unwrap();
        assert!(next > id);
    }
}
