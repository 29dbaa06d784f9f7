//! SQLite schema.

use rusqlite::Connection;

/// Create every table and index if missing.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    // Research actions (append-only, in emission order)
    conn.execute(
        "CREATE TABLE IF NOT EXISTS research_actions (
            action_id INTEGER PRIMARY KEY,
            analyst_id INTEGER NOT NULL,
            security_id TEXT NOT NULL,
            idea_analyst INTEGER NOT NULL,
            idea_seq INTEGER NOT NULL,
            action_type TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            confidence REAL NOT NULL,
            stage TEXT NOT NULL,
            target_price REAL,
            payload_json TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_actions_analyst ON research_actions(analyst_id, timestamp)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_actions_security ON research_actions(security_id, timestamp)",
        [],
    )?;

    // Evaluated forecasts; one row per (action, horizon)
    conn.execute(
        "CREATE TABLE IF NOT EXISTS performance_records (
            record_id INTEGER PRIMARY KEY,
            action_id INTEGER NOT NULL,
            analyst_id INTEGER NOT NULL,
            security_id TEXT NOT NULL,
            action_type TEXT NOT NULL,
            issued_at TEXT NOT NULL,
            evaluated_at TEXT NOT NULL,
            horizon_days INTEGER NOT NULL,
            predicted REAL NOT NULL,
            realized REAL NOT NULL,
            reference REAL NOT NULL,
            forecast_error REAL NOT NULL,
            realized_return REAL NOT NULL,
            direction_correct INTEGER,
            accuracy REAL NOT NULL,
            UNIQUE(action_id, horizon_days)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_records_analyst ON performance_records(analyst_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS incidents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            tick INTEGER NOT NULL,
            analyst_id INTEGER NOT NULL,
            at TEXT NOT NULL,
            detail_json TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS run_summaries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            seed INTEGER NOT NULL,
            total_actions INTEGER NOT NULL,
            action_log_hash TEXT NOT NULL,
            summary_json TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}
