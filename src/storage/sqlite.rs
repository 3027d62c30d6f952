//! SQLite storage implementation.
//!
//! All writes go through [`SqliteStorage::mutate`], which runs the caller's
//! closure inside an IMMEDIATE transaction and writes any trace events the
//! closure buffered in its [`MutationContext`] just before commit.

use crate::error::Result;
use crate::model::TraceEvent;
use crate::storage::schema::apply_schema;
use crate::storage::trace::insert_trace_event;
use rusqlite::{Connection, Transaction};
use std::path::Path;
use std::time::Duration;

/// SQLite-based storage backend.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
}

/// Context for a mutation operation, tracking side effects.
///
/// Trace events pushed here are inserted in the same transaction as the
/// mutation, so a state change and its events persist together or not at all.
#[derive(Debug)]
pub struct MutationContext {
    /// Name of the operation being performed.
    pub op_name: String,
    /// User the operation acts for.
    pub actor: String,
    /// Trace events to write at the end of the transaction.
    pub traces: Vec<TraceEvent>,
}

impl MutationContext {
    #[must_use]
    pub fn new(op_name: &str, actor: &str) -> Self {
        Self {
            op_name: op_name.to_string(),
            actor: actor.to_string(),
            traces: Vec::new(),
        }
    }

    /// Buffer a trace event for this operation.
    pub fn record_trace(&mut self, event: TraceEvent) {
        self.traces.push(event);
    }
}

/// Rows removed by [`SqliteStorage::wipe_user`].
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct WipeStats {
    pub task_sets: usize,
    pub night_sessions: usize,
    pub trace_events: usize,
    pub year_plans: usize,
    pub review_snapshots: usize,
    pub notes: usize,
}

impl WipeStats {
    #[must_use]
    pub fn total(&self) -> usize {
        self.task_sets
            + self.night_sessions
            + self.trace_events
            + self.year_plans
            + self.review_snapshots
            + self.notes
    }
}

impl SqliteStorage {
    /// Open a database at the given path.
    ///
    /// Creates the database and applies schema if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a database with an optional busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open_with_timeout(path: &Path, timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;

        if let Some(timeout) = timeout_ms {
            conn.busy_timeout(Duration::from_millis(timeout))?;
        } else {
            // Default 5 second timeout
            conn.busy_timeout(Duration::from_secs(5))?;
        }

        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Get a reference to the underlying connection (for read operations).
    #[must_use]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Execute a mutation with the transaction protocol.
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails. The transaction is rolled back on error.
    pub fn mutate<F, R>(&mut self, op: &str, actor: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction, &mut MutationContext) -> Result<R>,
    {
        self.mutate_traced(op, actor, f).map(|(result, _)| result)
    }

    /// Like [`mutate`](Self::mutate), also returning the trace events written,
    /// with their row ids assigned.
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails. The transaction is rolled back on error.
    pub fn mutate_traced<F, R>(&mut self, op: &str, actor: &str, f: F) -> Result<(R, Vec<TraceEvent>)>
    where
        F: FnOnce(&Transaction, &mut MutationContext) -> Result<R>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

        let mut ctx = MutationContext::new(op, actor);

        let result = f(&tx, &mut ctx)?;

        let mut written = Vec::with_capacity(ctx.traces.len());
        for mut event in ctx.traces {
            event.id = insert_trace_event(&tx, &event)?;
            written.push(event);
        }

        tx.commit()?;

        tracing::debug!(op, actor, traces = written.len(), "Mutation committed");
        Ok((result, written))
    }

    /// Delete every record belonging to a user.
    ///
    /// This is the only path that removes trace events or snapshots.
    ///
    /// # Errors
    ///
    /// Returns an error if any delete fails; nothing is removed in that case.
    pub fn wipe_user(&mut self, user_id: &str) -> Result<WipeStats> {
        self.mutate("wipe_user", user_id, |tx, _ctx| {
            let notes = tx.execute("DELETE FROM micro_notes WHERE user_id = ?1", [user_id])?;
            let trace_events = tx.execute("DELETE FROM trace_events WHERE user_id = ?1", [user_id])?;
            let review_snapshots =
                tx.execute("DELETE FROM review_snapshots WHERE user_id = ?1", [user_id])?;
            let night_sessions =
                tx.execute("DELETE FROM night_sessions WHERE user_id = ?1", [user_id])?;
            // Tasks and slots cascade from their set.
            let task_sets = tx.execute("DELETE FROM daily_task_sets WHERE user_id = ?1", [user_id])?;
            // Plan directions cascade from their plan.
            let year_plans = tx.execute("DELETE FROM year_plans WHERE user_id = ?1", [user_id])?;

            Ok(WipeStats {
                task_sets,
                night_sessions,
                trace_events,
                year_plans,
                review_snapshots,
                notes,
            })
        })
    }
}
