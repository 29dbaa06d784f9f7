//! JSON lines sink.
//!
//! One JSON object per line, each tagged with its kind:
//!
//! ```text
//! {"kind":"action","data":{"action_id":1,...}}
//! {"kind":"record","data":{"record_id":1,...}}
//! {"kind":"incident","data":{"kind":"data_gap",...}}
//! {"kind":"summary","data":{"seed":42,...}}
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use performance::PerformanceRecord;
use serde::Serialize;
use simulation::{HookContext, Incident, ResearchAction, RunSummary, SimulationHook, TickStats};
use tracing::warn;

use crate::error::{Result, StorageError};

#[derive(Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
enum Line<'a> {
    Action(&'a ResearchAction),
    Record(&'a PerformanceRecord),
    Incident(&'a Incident),
    Summary(&'a RunSummary),
}

struct Writer {
    out: Option<BufWriter<File>>,
    lines: u64,
    error: Option<StorageError>,
}

pub struct JsonLinesSink {
    path: PathBuf,
    writer: Mutex<Writer>,
}

impl JsonLinesSink {
    /// Create (truncate) the output file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            path,
            writer: Mutex::new(Writer {
                out: Some(BufWriter::new(file)),
                lines: 0,
                error: None,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines written so far.
    pub fn lines(&self) -> u64 {
        self.writer.lock().lines
    }

    fn write_all<'a>(&self, lines: impl IntoIterator<Item = Line<'a>>) {
        let mut writer = self.writer.lock();
        if writer.error.is_some() {
            return;
        }
        let Some(out) = writer.out.as_mut() else {
            return;
        };
        let mut written = 0;
        let mut failure = None;
        for line in lines {
            let result = serde_json::to_writer(&mut *out, &line)
                .map_err(StorageError::from)
                .and_then(|()| out.write_all(b"\n").map_err(|source| self.io(source)));
            match result {
                Ok(()) => written += 1,
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        writer.lines += written;
        if let Some(error) = failure {
            warn!(sink = "jsonl", path = %self.path.display(), %error, "write failed; further output dropped");
            writer.error = Some(error);
        }
    }

    fn io(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Flush and close the file, reporting the first failure, if any.
    pub fn finish(&self) -> Result<()> {
        let mut writer = self.writer.lock();
        if let Some(mut out) = writer.out.take()
            && writer.error.is_none()
            && let Err(source) = out.flush()
        {
            writer.error = Some(self.io(source));
        }
        match writer.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl SimulationHook for JsonLinesSink {
    fn name(&self) -> &str {
        "JsonLinesSink"
    }

    fn on_actions(&self, actions: Vec<ResearchAction>, _ctx: &HookContext) {
        self.write_all(actions.iter().map(Line::Action));
    }

    fn on_records(&self, records: Vec<PerformanceRecord>, _ctx: &HookContext) {
        self.write_all(records.iter().map(Line::Record));
    }

    fn on_incidents(&self, incidents: Vec<Incident>, _ctx: &HookContext) {
        self.write_all(incidents.iter().map(Line::Incident));
    }

    fn on_tick_end(&self, _stats: &TickStats, _ctx: &HookContext) {
        let mut writer = self.writer.lock();
        if writer.error.is_some() {
            return;
        }
        if let Some(out) = writer.out.as_mut()
            && let Err(source) = out.flush()
        {
            writer.error = Some(self.io(source));
        }
    }

    fn on_simulation_end(&self, summary: &RunSummary) {
        self.write_all([Line::Summary(summary)]);
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
            analyst_id: AnalystId(1),
            security_id: "SEC001".into(),
            idea_id: IdeaId::new(AnalystId(1), 1),
            action_type: ActionType::Update,
            timestamp: Utc.with_ymd_and_hms(2022, 3, 1, 10, 0, 0).unwrap(),
            content_payload: ContentPayload::new(ContentType::QuickUpdate, IdeaStage::Wip),
            confidence: 0.4,
        }
    }

    #[test]
    fn test_lines_are_tagged_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("actions.jsonl");
        let sink = JsonLinesSink::create(&path).unwrap();
        let ctx = HookContext::new(1, Utc.with_ymd_and_hms(2022, 3, 1, 10, 0, 0).unwrap());
        sink.on_actions(vec![action(1), action(2)], &ctx);
        sink.on_tick_end(&TickStats::default(), &ctx);
        sink.finish().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["kind"], "action");
        assert_eq!(lines[1]["data"]["action_id"], 2);
        assert_eq!(sink.lines(), 2);
    }

    #[test]
    fn test_create_in_missing_directory_fails() {
        let err = JsonLinesSink::create("/nonexistent/dir/out.jsonl").err().unwrap();
        assert!(matches!(err, StorageError::Io { .. }));
    }
}
