//! Trade journal.

use crate::error::PersistenceResult;
use crate::writer::JsonLinesWriter;
use chrono::NaiveDate;
use fxbot_core::TradeRecord;
use parking_lot::Mutex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Append-only journal of executed trades (`trades_YYYY-MM-DD.jsonl`).
///
/// Every record is flushed to disk before `record` returns.
pub struct TradeJournal {
    writer: Mutex<JsonLinesWriter<TradeRecord>>,
}

impl TradeJournal {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            writer: Mutex::new(JsonLinesWriter::new(base_dir, "trades", 1)),
        }
    }

    pub fn record(&self, trade: &TradeRecord) -> PersistenceResult<()> {
        self.writer.lock().add_record(trade)
    }

    /// Path of the journal file for `date`.
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.writer.lock().path_for(date)
    }

    /// Read back the trades journaled on `date`. Unreadable lines are skipped.
    pub fn read_day(&self, date: NaiveDate) -> PersistenceResult<Vec<TradeRecord>> {
        let path = self.path_for(date);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(File::open(&path)?);
        let mut trades = Vec::new();
        for line in reader.lines() {
            let line = line?;
            match serde_json::from_str(&line) {
                Ok(trade) => trades.push(trade),
                Err(e) => warn!(?e, path = %path.display(), "Skipping corrupt journal line"),
            }
        }
        Ok(trades)
    }

    pub fn close(&self) -> PersistenceResult<()> {
        self.writer.lock().close()
    }
}
