//! SQLite sink.
//!
//! Rows are buffered as hooks fire and written in one transaction per tick.
//! The first failure is kept and reported by [`SqliteSink::finish`]; after a
//! failure the sink stops writing.

use std::path::Path;

use parking_lot::Mutex;
use performance::PerformanceRecord;
use rusqlite::{Connection, params};
use simulation::{HookContext, Incident, ResearchAction, RunSummary, SimulationHook, TickStats};
use tracing::warn;

use crate::error::{Result, StorageError};
use crate::schema::init_schema;

#[derive(Default)]
struct Buffer {
    actions: Vec<ResearchAction>,
    records: Vec<PerformanceRecord>,
    incidents: Vec<(u64, Incident)>,
}

pub struct SqliteSink {
    conn: Mutex<Connection>,
    buffer: Mutex<Buffer>,
    error: Mutex<Option<StorageError>>,
}

impl SqliteSink {
    /// Open (or create) a database file. `:memory:` opens an in-memory database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = if path.as_os_str() == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            buffer: Mutex::new(Buffer::default()),
            error: Mutex::new(None),
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    /// Run a read-only query against the database.
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> T) -> T {
        f(&self.conn.lock())
    }

    fn failed(&self) -> bool {
        self.error.lock().is_some()
    }

    fn fail(&self, error: StorageError) {
        warn!(sink = "sqlite", %error, "write failed; further output dropped");
        let mut slot = self.error.lock();
        if slot.is_none() {
            *slot = Some(error);
        }
    }

    /// Write buffered rows in a single transaction.
    fn flush(&self) -> Result<()> {
        let buffer = std::mem::take(&mut *self.buffer.lock());
        if buffer.actions.is_empty() && buffer.records.is_empty() && buffer.incidents.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        {
            let mut insert_action = tx.prepare_cached(
                "INSERT INTO research_actions
                 (action_id, analyst_id, security_id, idea_analyst, idea_seq, action_type,
                  timestamp, confidence, stage, target_price, payload_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )?;
            for a in &buffer.actions {
                insert_action.execute(params![
                    a.action_id.0 as i64,
                    a.analyst_id.0 as i64,
                    a.security_id,
                    a.idea_id.analyst.0 as i64,
                    a.idea_id.seq,
                    a.action_type.to_string(),
                    a.timestamp.to_rfc3339(),
                    a.confidence,
                    a.content_payload.stage.to_string(),
                    a.content_payload.target_price,
                    serde_json::to_string(&a.content_payload)?,
                ])?;
            }

            let mut insert_record = tx.prepare_cached(
                "INSERT OR IGNORE INTO performance_records
                 (record_id, action_id, analyst_id, security_id, action_type, issued_at,
                  evaluated_at, horizon_days, predicted, realized, reference, forecast_error,
                  realized_return, direction_correct, accuracy)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            )?;
            for r in &buffer.records {
                insert_record.execute(params![
                    r.record_id.0 as i64,
                    r.action_id.0 as i64,
                    r.analyst_id.0 as i64,
                    r.security_id,
                    r.action_type.to_string(),
                    r.issued_at.to_rfc3339(),
                    r.evaluated_at.to_rfc3339(),
                    r.horizon_days,
                    r.predicted,
                    r.realized,
                    r.reference,
                    r.forecast_error,
                    r.realized_return,
                    r.direction_correct,
                    r.accuracy,
                ])?;
            }

            let mut insert_incident = tx.prepare_cached(
                "INSERT INTO incidents (tick, analyst_id, at, detail_json)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (tick, incident) in &buffer.incidents {
                insert_incident.execute(params![
                    *tick as i64,
                    incident.analyst().0 as i64,
                    incident.at().to_rfc3339(),
                    serde_json::to_string(incident)?,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_summary(&self, summary: &RunSummary) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO run_summaries (seed, total_actions, action_log_hash, summary_json)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                summary.seed as i64,
                summary.total_actions as i64,
                summary.action_log_hash,
                serde_json::to_string(summary)?,
            ],
        )?;
        Ok(())
    }

    /// Flush anything still buffered and report the first failure, if any.
    pub fn finish(&self) -> Result<()> {
        if !self.failed()
            && let Err(e) = self.flush()
        {
            self.fail(e);
        }
        match self.error.lock().take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl SimulationHook for SqliteSink {
    fn name(&self) -> &str {
        "SqliteSink"
    }

    fn on_actions(&self, actions: Vec<ResearchAction>, _ctx: &HookContext) {
        if !self.failed() {
            self.buffer.lock().actions.extend(actions);
        }
    }

    fn on_records(&self, records: Vec<PerformanceRecord>, _ctx: &HookContext) {
        if !self.failed() {
            self.buffer.lock().records.extend(records);
        }
    }

    fn on_incidents(&self, incidents: Vec<Incident>, ctx: &HookContext) {
        if !self.failed() {
            self.buffer
                .lock()
                .incidents
                .extend(incidents.into_iter().map(|i| (ctx.tick, i)));
        }
    }

    fn on_tick_end(&self, _stats: &TickStats, _ctx: &HookContext) {
        if !self.failed()
            && let Err(e) = self.flush()
        {
            self.fail(e);
        }
    }

    fn on_simulation_end(&self, summary: &RunSummary) {
        if self.failed() {
            return;
        }
        if let Err(e) = self.flush().and_then(|()| self.write_summary(summary)) {
            self.fail(e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use simulation::ContentPayload;
    use types::{ActionId, ActionType, AnalystId, ContentType, IdeaId, IdeaStage};

    fn action(id: u64) -> ResearchAction {
        ResearchAction {
            action_id: ActionId(id),
            analyst_id: AnalystId(3),
            security_id: "SEC007".into(),
            idea_id: IdeaId::new(AnalystId(3), 2),
            action_type: ActionType::NewIdea,
            timestamp: Utc.with_ymd_and_hms(2022, 5, 2, 14, 0, 0).unwrap(),
            content_payload: ContentPayload {
                target_price: Some(41.5),
                ..ContentPayload::new(ContentType::InitiationCoverage, IdeaStage::NewIdea)
            },
            confidence: 0.62,
        }
    }

    fn count(sink: &SqliteSink, table: &str) -> i64 {
        sink.with_connection(|conn| {
            conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })
            .unwrap()
        })
    }

    #[test]
    fn test_actions_written_at_tick_end() {
        let sink = SqliteSink::in_memory().unwrap();
        let ctx = HookContext::new(1, Utc.with_ymd_and_hms(2022, 5, 2, 14, 0, 0).unwrap());
        sink.on_actions(vec![action(1), action(2)], &ctx);
        assert_eq!(count(&sink, "research_actions"), 0);

        sink.on_tick_end(&TickStats::default(), &ctx);
        assert_eq!(count(&sink, "research_actions"), 2);

        let target: f64 = sink.with_connection(|conn| {
            conn.query_row(
                "SELECT target_price FROM research_actions WHERE action_id = 2",
                [],
                |row| row.get(0),
            )
            .unwrap()
        });
        assert!((target - 41.5).abs() < 1e-12);
        sink.finish().unwrap();
    }

    #[test]
    fn test_first_error_reported_by_finish() {
        let sink = SqliteSink::in_memory().unwrap();
        let ctx = HookContext::new(1, Utc.with_ymd_and_hms(2022, 5, 2, 14, 0, 0).unwrap());
        // Duplicate primary key fails the transaction.
        sink.on_actions(vec![action(1), action(1)], &ctx);
        sink.on_tick_end(&TickStats::default(), &ctx);
        sink.on_actions(vec![action(2)], &ctx);
        sink.on_tick_end(&TickStats::default(), &ctx);

        assert_eq!(count(&sink, "research_actions"), 0);
        assert!(matches!(sink.finish(), Err(StorageError::Sqlite(_))));
    }
}
