// LogSift - GPL-3.0-or-later
// This file is part of LogSift.
//
// Copyright (C) 2025 Daniel Freiermuth
//
// LogSift is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// LogSift is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with LogSift.  If not, see <https://www.gnu.org/licenses/>.

//! SQLite persistence for analysis sessions.
//!
//! Three tables: `logs` (parsed records per session), `anomalies`
//! (flagged records with their combined scores), `analysis_sessions`
//! (one row per run, carrying the serialized report).

use std::path::Path;

use chrono::{DateTime, Local};
use rusqlite::{params, Connection};
use thiserror::Error;
use uuid::Uuid;

use crate::anomaly::Detection;
use crate::core::LogTable;

/// Severities counted as errors in session rollups.
pub const ERROR_SEVERITIES: [&str; 3] = ["ERROR", "CRITICAL", "FATAL"];

const SESSION_LIST_LIMIT: usize = 50;
const SESSION_LOG_LIMIT: usize = 1000;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// One row of `analysis_sessions`. `created_at` is filled on reads and
/// ignored on writes.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub session_id: String,
    pub filename: String,
    pub total_logs: usize,
    pub error_count: usize,
    pub anomaly_count: usize,
    pub processing_engine: String,
    pub analysis_results: String,
    pub created_at: Option<String>,
}

/// One row of `logs` as read back from the database.
#[derive(Debug, Clone)]
pub struct StoredLog {
    pub id: i64,
    pub timestamp: Option<DateTime<Local>>,
    pub severity: String,
    pub source: String,
    pub message: String,
    pub raw_line: String,
    pub line_number: usize,
    pub pattern_used: String,
}

/// One row of `anomalies` as read back from the database.
#[derive(Debug, Clone)]
pub struct StoredAnomaly {
    pub log_id: Option<i64>,
    pub anomaly_type: String,
    pub confidence: f64,
    pub description: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_logs: i64,
    pub total_anomalies: i64,
    pub total_sessions: i64,
    pub logs_last_day: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub logs_deleted: usize,
    pub anomalies_deleted: usize,
    pub sessions_deleted: usize,
}

/// Fresh identifier for one analysis run.
#[must_use]
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// SQLite-backed session store.
pub struct SessionStore {
    conn: Connection,
}

impl SessionStore {
    /// Open or create the store at `path`.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                timestamp TEXT,
                severity TEXT,
                source TEXT,
                message TEXT,
                raw_line TEXT,
                line_number INTEGER,
                pattern_used TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_logs_session ON logs(session_id);

            CREATE TABLE IF NOT EXISTS anomalies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                log_id INTEGER,
                anomaly_type TEXT,
                confidence_score REAL,
                description TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_anomalies_session ON anomalies(session_id);

            CREATE TABLE IF NOT EXISTS analysis_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT UNIQUE NOT NULL,
                filename TEXT,
                total_logs INTEGER,
                error_count INTEGER,
                anomaly_count INTEGER,
                processing_engine TEXT,
                analysis_results TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            ",
        )?;

        Ok(Self { conn })
    }

    /// Insert every record of `table` under `session_id` in one
    /// transaction. Returns the rowids in table order; anomaly rows
    /// reference logs through them.
    pub fn save_logs(&self, session_id: &str, table: &LogTable) -> Result<Vec<i64>, StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        let mut ids = Vec::with_capacity(table.len());
        {
            let mut stmt = tx.prepare(
                "INSERT INTO logs (session_id, timestamp, severity, source, message, raw_line, line_number, pattern_used)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for rec in table.records() {
                let id = stmt.insert(params![
                    session_id,
                    rec.timestamp,
                    &rec.severity,
                    &rec.source,
                    &rec.message,
                    &rec.raw_line,
                    rec.line_number as i64,
                    rec.pattern_used,
                ])?;
                ids.push(id);
            }
        }
        tx.commit()?;
        tracing::debug!("stored {} log records for session {session_id}", ids.len());
        Ok(ids)
    }

    /// Insert one anomaly row per flagged index, carrying the combined
    /// score as confidence. Indices without a matching rowid are skipped.
    pub fn save_anomalies(
        &self,
        session_id: &str,
        log_ids: &[i64],
        detection: &Detection,
    ) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO anomalies (session_id, log_id, anomaly_type, confidence_score, description)
                 VALUES (?1, ?2, 'ensemble', ?3, ?4)",
            )?;
            for &idx in &detection.indices {
                let Some(&log_id) = log_ids.get(idx) else {
                    continue;
                };
                let confidence = detection.scores.get(idx).copied().unwrap_or(0.0);
                stmt.execute(params![
                    session_id,
                    log_id,
                    confidence,
                    format!("Anomaly detected in log entry {idx}"),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Record the session rollup, replacing any previous row with the
    /// same session id.
    pub fn save_session(&self, session: &SessionRecord) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO analysis_sessions
             (session_id, filename, total_logs, error_count, anomaly_count, processing_engine, analysis_results)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &session.session_id,
                &session.filename,
                session.total_logs as i64,
                session.error_count as i64,
                session.anomaly_count as i64,
                &session.processing_engine,
                &session.analysis_results,
            ],
        )?;
        Ok(())
    }

    /// Newest sessions first, at most `SESSION_LIST_LIMIT`.
    pub fn recent_sessions(&self, limit: Option<usize>) -> Result<Vec<SessionRecord>, StoreError> {
        let limit = limit.unwrap_or(SESSION_LIST_LIMIT);
        let mut stmt = self.conn.prepare(
            "SELECT session_id, filename, total_logs, error_count, anomaly_count, processing_engine, analysis_results, created_at
             FROM analysis_sessions ORDER BY created_at DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(SessionRecord {
                session_id: row.get(0)?,
                filename: row.get(1)?,
                total_logs: row.get::<_, i64>(2)? as usize,
                error_count: row.get::<_, i64>(3)? as usize,
                anomaly_count: row.get::<_, i64>(4)? as usize,
                processing_engine: row.get(5)?,
                analysis_results: row.get(6)?,
                created_at: row.get(7)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Stored records of one session, newest insertion first.
    pub fn logs_for_session(&self, session_id: &str) -> Result<Vec<StoredLog>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, timestamp, severity, source, message, raw_line, line_number, pattern_used
             FROM logs WHERE session_id = ?1 ORDER BY created_at DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![session_id, SESSION_LOG_LIMIT as i64], |row| {
            Ok(StoredLog {
                id: row.get(0)?,
                timestamp: row.get(1)?,
                severity: row.get(2)?,
                source: row.get(3)?,
                message: row.get(4)?,
                raw_line: row.get(5)?,
                line_number: row.get::<_, i64>(6)? as usize,
                pattern_used: row.get(7)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Stored anomalies of one session.
    pub fn anomalies_for_session(&self, session_id: &str) -> Result<Vec<StoredAnomaly>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT log_id, anomaly_type, confidence_score, description
             FROM anomalies WHERE session_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![session_id], |row| {
            Ok(StoredAnomaly {
                log_id: row.get(0)?,
                anomaly_type: row.get(1)?,
                confidence: row.get(2)?,
                description: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Totals across all sessions plus the last day's log volume.
    pub fn dashboard_stats(&self) -> Result<DashboardStats, StoreError> {
        let count = |sql: &str| -> Result<i64, rusqlite::Error> {
            self.conn.query_row(sql, [], |row| row.get(0))
        };
        Ok(DashboardStats {
            total_logs: count("SELECT COUNT(*) FROM logs")?,
            total_anomalies: count("SELECT COUNT(*) FROM anomalies")?,
            total_sessions: count("SELECT COUNT(*) FROM analysis_sessions")?,
            logs_last_day: count(
                "SELECT COUNT(*) FROM logs WHERE created_at > datetime('now', '-1 day')",
            )?,
        })
    }

    /// Delete rows older than `days` days, then compact the file.
    pub fn cleanup_older_than(&self, days: u32) -> Result<CleanupReport, StoreError> {
        let cutoff = format!("-{days} days");
        let logs_deleted = self.conn.execute(
            "DELETE FROM logs WHERE created_at < datetime('now', ?1)",
            params![cutoff],
        )?;
        let anomalies_deleted = self.conn.execute(
            "DELETE FROM anomalies WHERE created_at < datetime('now', ?1)",
            params![cutoff],
        )?;
        let sessions_deleted = self.conn.execute(
            "DELETE FROM analysis_sessions WHERE created_at < datetime('now', ?1)",
            params![cutoff],
        )?;
        self.conn.execute_batch("VACUUM;")?;
        tracing::debug!(
            "cleanup removed {logs_deleted} logs, {anomalies_deleted} anomalies, {sessions_deleted} sessions"
        );
        Ok(CleanupReport {
            logs_deleted,
            anomalies_deleted,
            sessions_deleted,
        })
    }
}
