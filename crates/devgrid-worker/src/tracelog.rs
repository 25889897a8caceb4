//! Offline-first trace log.
//!
//! Every session, entry, and terminal task report lands in a local sqlite
//! database with a `synced` flag before any push is attempted, so state
//! produced while disconnected survives until the next flush. Flags clear
//! only when the
//! controller's `SyncAck` arrives: at-least-once delivery, collapsed to a
//! no-op on the controller by the producer-assigned ids.
//!
//! All operations use `std::sync::Mutex` + `spawn_blocking` at async call
//! sites to avoid blocking the runtime.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use rusqlite::{params, Connection};
use thiserror::Error;
use tracing::warn;

use devgrid_core::{
    EntryId, EntryKind, SessionId, SessionStatus, TaskId, TaskStatus, TraceEntry, TraceSession,
    WorkerId,
};
use devgrid_proto::pb::worker_frame::Payload as WorkerPayload;
use devgrid_proto::pb::WorkerFrame;

use crate::connection::Outbound;

/// Trace log errors.
#[derive(Debug, Error)]
pub enum TraceLogError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Lock poisoned")]
    LockPoisoned,

    #[error("Blocking task failed: {0}")]
    Join(String),
}

fn session_status_to_str(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::Running => "running",
        SessionStatus::Completed => "completed",
        SessionStatus::Failed => "failed",
    }
}

fn session_status_from_str(s: &str) -> SessionStatus {
    match s {
        "completed" => SessionStatus::Completed,
        "failed" => SessionStatus::Failed,
        _ => SessionStatus::Running,
    }
}

fn task_status_to_str(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "pending",
        TaskStatus::Dispatched => "dispatched",
        TaskStatus::Completed => "completed",
        TaskStatus::Failed => "failed",
    }
}

fn task_status_from_str(s: &str) -> TaskStatus {
    match s {
        "dispatched" => TaskStatus::Dispatched,
        "completed" => TaskStatus::Completed,
        "failed" => TaskStatus::Failed,
        _ => TaskStatus::Pending,
    }
}

fn entry_kind_to_str(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::TaskReceived => "task_received",
        EntryKind::Thinking => "thinking",
        EntryKind::Discussion => "discussion",
        EntryKind::Step => "step",
        EntryKind::Result => "result",
        EntryKind::Error => "error",
    }
}

fn entry_kind_from_str(s: &str) -> EntryKind {
    match s {
        "task_received" => EntryKind::TaskReceived,
        "thinking" => EntryKind::Thinking,
        "discussion" => EntryKind::Discussion,
        "result" => EntryKind::Result,
        "error" => EntryKind::Error,
        _ => EntryKind::Step,
    }
}

/// Local durable append log for trace sessions and entries.
pub struct TraceLog {
    conn: StdMutex<Connection>,
}

// Safety: rusqlite::Connection is Send but not Sync. We protect it with a std
// Mutex, which makes &TraceLog safe to share across threads.
unsafe impl Sync for TraceLog {}

impl TraceLog {
    /// Open (or create) the log under `data_dir`; `None` keeps it in memory.
    pub fn open(data_dir: Option<&Path>) -> Result<Self, TraceLogError> {
        let conn = match data_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir).ok();
                let db_path = dir.join("tracelog.db");
                match Connection::open(&db_path) {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, path = %db_path.display(), "failed to open trace db, falling back to in-memory");
                        Connection::open_in_memory()?
                    }
                }
            }
            None => Connection::open_in_memory()?,
        };

        // WAL mode so flush reads do not block appends
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "synchronous", "NORMAL").ok();

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id            TEXT PRIMARY KEY NOT NULL,
                task_id       TEXT NOT NULL,
                worker_id     TEXT NOT NULL,
                status        TEXT NOT NULL,
                started_at_ms INTEGER NOT NULL,
                ended_at_ms   INTEGER,
                synced        INTEGER NOT NULL DEFAULT 0
            );
            CREATE TABLE IF NOT EXISTS entries (
                id            TEXT PRIMARY KEY NOT NULL,
                session_id    TEXT NOT NULL,
                kind          TEXT NOT NULL,
                title         TEXT NOT NULL,
                content       TEXT NOT NULL,
                metadata      TEXT NOT NULL,
                duration_ms   INTEGER,
                timestamp_ms  INTEGER NOT NULL,
                synced        INTEGER NOT NULL DEFAULT 0
            );
            CREATE TABLE IF NOT EXISTS reports (
                task_id        TEXT PRIMARY KEY NOT NULL,
                status         TEXT NOT NULL,
                result         TEXT,
                error          TEXT,
                reported_at_ms INTEGER NOT NULL,
                synced         INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_entries_session ON entries(session_id, timestamp_ms);
            CREATE INDEX IF NOT EXISTS idx_sessions_unsynced ON sessions(synced);
            CREATE INDEX IF NOT EXISTS idx_entries_unsynced ON entries(synced);
            CREATE INDEX IF NOT EXISTS idx_reports_unsynced ON reports(synced);",
        )?;

        Ok(Self {
            conn: StdMutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, TraceLogError> {
        self.conn.lock().map_err(|_| TraceLogError::LockPoisoned)
    }

    /// Open a new running session for a task. The id is generated here, on
    /// the producer side, and stays stable across reconnects.
    pub fn create_session(
        &self,
        task_id: TaskId,
        worker_id: WorkerId,
    ) -> Result<TraceSession, TraceLogError> {
        let session = TraceSession::open(task_id, worker_id);
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO sessions (id, task_id, worker_id, status, started_at_ms, ended_at_ms, synced)
             VALUES (?1, ?2, ?3, ?4, ?5, NULL, 0)",
            params![
                session.id.as_str(),
                session.task_id.as_str(),
                session.worker_id.as_str(),
                session_status_to_str(session.status),
                session.started_at_ms,
            ],
        )?;
        Ok(session)
    }

    /// Append an immutable entry and mark it unsynced.
    pub fn append_entry(&self, entry: &TraceEntry) -> Result<(), TraceLogError> {
        let metadata = serde_json::to_string(&entry.metadata)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO entries (id, session_id, kind, title, content, metadata, duration_ms, timestamp_ms, synced)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0)",
            params![
                entry.id.as_str(),
                entry.session_id.as_str(),
                entry_kind_to_str(entry.kind),
                entry.title,
                entry.content,
                metadata,
                entry.duration_ms,
                entry.timestamp_ms,
            ],
        )?;
        Ok(())
    }

    /// Close a session with a terminal status, re-flagging it unsynced so
    /// the closed state reaches the controller too. Returns the updated
    /// record for the immediate push.
    pub fn close_session(
        &self,
        id: &SessionId,
        status: SessionStatus,
    ) -> Result<Option<TraceSession>, TraceLogError> {
        let ended_at_ms = chrono::Utc::now().timestamp_millis();
        {
            let conn = self.lock()?;
            conn.execute(
                "UPDATE sessions SET status = ?2, ended_at_ms = ?3, synced = 0 WHERE id = ?1",
                params![id.as_str(), session_status_to_str(status), ended_at_ms],
            )?;
        }
        self.session(id)
    }

    /// Read a session by id.
    pub fn session(&self, id: &SessionId) -> Result<Option<TraceSession>, TraceLogError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, task_id, worker_id, status, started_at_ms, ended_at_ms
             FROM sessions WHERE id = ?1",
        )?;
        let mut rows = stmt.query(params![id.as_str()])?;
        match rows.next()? {
            Some(row) => Ok(Some(row_to_session(row)?)),
            None => Ok(None),
        }
    }

    /// Snapshot of every session currently flagged unsynced, oldest first.
    pub fn unsynced_sessions(&self) -> Result<Vec<TraceSession>, TraceLogError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, task_id, worker_id, status, started_at_ms, ended_at_ms
             FROM sessions WHERE synced = 0 ORDER BY started_at_ms",
        )?;
        let mut sessions = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            sessions.push(row_to_session(row)?);
        }
        Ok(sessions)
    }

    /// Snapshot of every entry currently flagged unsynced, in append order.
    pub fn unsynced_entries(&self) -> Result<Vec<TraceEntry>, TraceLogError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, session_id, kind, title, content, metadata, duration_ms, timestamp_ms
             FROM entries WHERE synced = 0 ORDER BY timestamp_ms, id",
        )?;
        let mut entries = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            entries.push(row_to_entry(row)?);
        }
        Ok(entries)
    }

    /// Entries of a session in append order (synced or not).
    pub fn entries_for_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<TraceEntry>, TraceLogError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, session_id, kind, title, content, metadata, duration_ms, timestamp_ms
             FROM entries WHERE session_id = ?1 ORDER BY timestamp_ms, id",
        )?;
        let mut entries = Vec::new();
        let mut rows = stmt.query(params![session_id.as_str()])?;
        while let Some(row) = rows.next()? {
            entries.push(row_to_entry(row)?);
        }
        Ok(entries)
    }

    /// Clear the unsynced flag for a session (controller acked it).
    pub fn mark_session_synced(&self, id: &str) -> Result<(), TraceLogError> {
        let conn = self.lock()?;
        conn.execute("UPDATE sessions SET synced = 1 WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Clear the unsynced flag for an entry (controller acked it).
    pub fn mark_entry_synced(&self, id: &str) -> Result<(), TraceLogError> {
        let conn = self.lock()?;
        conn.execute("UPDATE entries SET synced = 1 WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Persist a terminal task report and flag it unsynced. A second report
    /// for the same task replaces the first; the flag resets either way.
    pub fn record_report(&self, report: &PendingReport) -> Result<(), TraceLogError> {
        let reported_at_ms = chrono::Utc::now().timestamp_millis();
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO reports (task_id, status, result, error, reported_at_ms, synced)
             VALUES (?1, ?2, ?3, ?4, ?5, 0)",
            params![
                report.task_id.as_str(),
                task_status_to_str(report.status),
                report.result,
                report.error,
                reported_at_ms,
            ],
        )?;
        Ok(())
    }

    /// Snapshot of every report currently flagged unsynced, oldest first.
    pub fn unsynced_reports(&self) -> Result<Vec<PendingReport>, TraceLogError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT task_id, status, result, error
             FROM reports WHERE synced = 0 ORDER BY reported_at_ms, task_id",
        )?;
        let mut reports = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let status: String = row.get(1)?;
            reports.push(PendingReport {
                task_id: TaskId::new(row.get::<_, String>(0)?),
                status: task_status_from_str(&status),
                result: row.get(2)?,
                error: row.get(3)?,
            });
        }
        Ok(reports)
    }

    /// Clear the unsynced flag for a task report (controller acked it).
    pub fn mark_report_synced(&self, task_id: &str) -> Result<(), TraceLogError> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE reports SET synced = 1 WHERE task_id = ?1",
            params![task_id],
        )?;
        Ok(())
    }
}

/// Terminal task outcome buffered until the controller acks it.
#[derive(Debug, Clone)]
pub struct PendingReport {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub result: Option<String>,
    pub error: Option<String>,
}

fn row_to_session(row: &rusqlite::Row<'_>) -> Result<TraceSession, TraceLogError> {
    let status: String = row.get(3)?;
    Ok(TraceSession {
        id: SessionId::new(row.get::<_, String>(0)?),
        task_id: TaskId::new(row.get::<_, String>(1)?),
        worker_id: WorkerId::new(row.get::<_, String>(2)?),
        status: session_status_from_str(&status),
        started_at_ms: row.get(4)?,
        ended_at_ms: row.get(5)?,
    })
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> Result<TraceEntry, TraceLogError> {
    let kind: String = row.get(2)?;
    let metadata: String = row.get(5)?;
    let metadata: HashMap<String, String> = serde_json::from_str(&metadata)?;
    Ok(TraceEntry {
        id: EntryId::new(row.get::<_, String>(0)?),
        session_id: SessionId::new(row.get::<_, String>(1)?),
        kind: entry_kind_from_str(&kind),
        title: row.get(3)?,
        content: row.get(4)?,
        metadata,
        duration_ms: row.get(6)?,
        timestamp_ms: row.get(7)?,
    })
}

/// Records entries for one session: durable append first, then an immediate
/// best-effort push. The unsynced flag only clears on the controller's ack.
#[derive(Clone)]
pub struct TraceRecorder {
    log: Arc<TraceLog>,
    outbound: Arc<Outbound>,
    session_id: SessionId,
}

impl TraceRecorder {
    pub fn new(log: Arc<TraceLog>, outbound: Arc<Outbound>, session_id: SessionId) -> Self {
        Self {
            log,
            outbound,
            session_id,
        }
    }

    /// Session this recorder appends to.
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Durably append an entry, then push it if a channel is up.
    pub async fn record(&self, entry: TraceEntry) {
        debug_assert_eq!(entry.session_id, self.session_id);

        let log = self.log.clone();
        let stored = entry.clone();
        let appended = tokio::task::spawn_blocking(move || log.append_entry(&stored)).await;
        match appended {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(entry_id = %entry.id, error = %e, "Failed to append trace entry");
                return;
            }
            Err(e) => {
                warn!(entry_id = %entry.id, error = %e, "Trace append task failed");
                return;
            }
        }

        self.outbound.try_send(WorkerFrame {
            payload: Some(WorkerPayload::TraceEntry(entry.into())),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_log(dir: &TempDir) -> TraceLog {
        TraceLog::open(Some(dir.path())).unwrap()
    }

    #[test]
    fn session_lifecycle_tracks_unsynced_flags() {
        let dir = TempDir::new().unwrap();
        let log = open_log(&dir);

        let session = log
            .create_session(TaskId::new("t1"), WorkerId::new("w1"))
            .unwrap();
        assert_eq!(log.unsynced_sessions().unwrap().len(), 1);

        log.mark_session_synced(session.id.as_str()).unwrap();
        assert!(log.unsynced_sessions().unwrap().is_empty());

        // Closing re-flags: the terminal state must reach the controller.
        let closed = log
            .close_session(&session.id, SessionStatus::Completed)
            .unwrap()
            .unwrap();
        assert_eq!(closed.status, SessionStatus::Completed);
        assert!(closed.ended_at_ms.is_some());
        assert_eq!(log.unsynced_sessions().unwrap().len(), 1);
    }

    #[test]
    fn entries_read_back_in_append_order() {
        let dir = TempDir::new().unwrap();
        let log = open_log(&dir);
        let session = log
            .create_session(TaskId::new("t1"), WorkerId::new("w1"))
            .unwrap();

        for i in 0..3 {
            let mut entry =
                TraceEntry::step(session.id.clone(), format!("step {i}"), "content");
            entry.timestamp_ms = 100 + i;
            log.append_entry(&entry).unwrap();
        }

        let entries = log.entries_for_session(&session.id).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].title, "step 0");
        assert_eq!(entries[2].title, "step 2");
    }

    #[test]
    fn unsynced_entries_clear_only_on_ack() {
        let dir = TempDir::new().unwrap();
        let log = open_log(&dir);
        let session = log
            .create_session(TaskId::new("t1"), WorkerId::new("w1"))
            .unwrap();

        let entry = TraceEntry::step(session.id.clone(), "build", "cargo build")
            .with_metadata("exit_code", "0");
        log.append_entry(&entry).unwrap();

        let unsynced = log.unsynced_entries().unwrap();
        assert_eq!(unsynced.len(), 1);
        assert_eq!(unsynced[0].id, entry.id);
        assert_eq!(
            unsynced[0].metadata.get("exit_code"),
            Some(&"0".to_string())
        );

        log.mark_entry_synced(entry.id.as_str()).unwrap();
        assert!(log.unsynced_entries().unwrap().is_empty());
    }

    #[test]
    fn terminal_report_stays_flagged_until_acked() {
        let dir = TempDir::new().unwrap();
        let log = open_log(&dir);

        log.record_report(&PendingReport {
            task_id: TaskId::new("t1"),
            status: TaskStatus::Completed,
            result: Some("done".to_string()),
            error: None,
        })
        .unwrap();

        let unsynced = log.unsynced_reports().unwrap();
        assert_eq!(unsynced.len(), 1);
        assert_eq!(unsynced[0].task_id.as_str(), "t1");
        assert_eq!(unsynced[0].status, TaskStatus::Completed);
        assert_eq!(unsynced[0].result.as_deref(), Some("done"));

        // Still flagged after a restart.
        drop(log);
        let log = open_log(&dir);
        assert_eq!(log.unsynced_reports().unwrap().len(), 1);

        log.mark_report_synced("t1").unwrap();
        assert!(log.unsynced_reports().unwrap().is_empty());
    }

    #[test]
    fn log_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let session_id = {
            let log = open_log(&dir);
            let session = log
                .create_session(TaskId::new("t1"), WorkerId::new("w1"))
                .unwrap();
            log.append_entry(&TraceEntry::step(session.id.clone(), "s", "c"))
                .unwrap();
            session.id
        };

        // Reopen: buffered telemetry must still be flagged for flush.
        let log = open_log(&dir);
        assert_eq!(log.unsynced_sessions().unwrap().len(), 1);
        assert_eq!(log.unsynced_entries().unwrap().len(), 1);
        assert!(log.session(&session_id).unwrap().is_some());
    }
}
