//! JSON Lines file writer.
//!
//! Records are appended as one JSON object per line to
//! `{base_dir}/{prefix}_{YYYY-MM-DD}.jsonl`, rotating when the UTC date
//! changes. Files are opened in append mode, so restarts never truncate.
//! A failed flush drops its records instead of retrying them, so an
//! unwritable directory costs lost lines, not unbounded memory.

use crate::error::PersistenceResult;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Active writer state for daily file.
struct ActiveWriter {
    writer: BufWriter<File>,
    date: String,
    records_written: usize,
}

/// Buffered, daily-rotated JSON Lines writer.
pub struct JsonLinesWriter<T> {
    base_dir: PathBuf,
    prefix: String,
    buffer: Vec<String>,
    /// Maximum buffer size before flush (1 = flush every record).
    max_buffer_size: usize,
    active_writer: Option<ActiveWriter>,
    _record: PhantomData<fn(&T)>,
}

impl<T: Serialize> JsonLinesWriter<T> {
    /// Create a writer, creating `base_dir` if needed.
    pub fn new(base_dir: impl AsRef<Path>, prefix: &str, max_buffer_size: usize) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        if let Err(e) = std::fs::create_dir_all(&base_dir) {
            warn!(?e, dir = %base_dir.display(), "Failed to create directory");
        }

        Self {
            base_dir,
            prefix: prefix.to_string(),
            buffer: Vec::with_capacity(max_buffer_size.max(1)),
            max_buffer_size: max_buffer_size.max(1),
            active_writer: None,
            _record: PhantomData,
        }
    }

    /// Path of the file for `date`.
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.file_path(&date.format("%Y-%m-%d").to_string())
    }

    fn file_path(&self, date: &str) -> PathBuf {
        self.base_dir.join(format!("{}_{}.jsonl", self.prefix, date))
    }

    /// Serialize and buffer a record, flushing when the buffer is full.
    pub fn add_record(&mut self, record: &T) -> PersistenceResult<()> {
        self.buffer.push(serde_json::to_string(record)?);

        if self.buffer.len() >= self.max_buffer_size {
            self.flush()?;
        }

        Ok(())
    }

    fn close_active_writer(&mut self) {
        if let Some(mut active) = self.active_writer.take() {
            if let Err(e) = active.writer.flush() {
                warn!(?e, "Failed to flush writer on close");
            }
            info!(
                prefix = %self.prefix,
                date = %active.date,
                records = active.records_written,
                "Closed JSON Lines writer"
            );
        }
    }

    fn open_writer(&self, date: &str) -> PersistenceResult<ActiveWriter> {
        let path = self.file_path(date);
        debug!(path = %path.display(), "Opening JSON Lines writer (append mode)");

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(ActiveWriter {
            writer: BufWriter::new(file),
            date: date.to_string(),
            records_written: 0,
        })
    }

    /// Write buffered records to today's file.
    pub fn flush(&mut self) -> PersistenceResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let today = Utc::now().format("%Y-%m-%d").to_string();

        if self
            .active_writer
            .as_ref()
            .is_some_and(|w| w.date != today)
        {
            self.close_active_writer();
        }

        let record_count = self.buffer.len();
        let written = self.write_buffer(&today);
        self.buffer.clear();

        match written {
            Ok(()) => {
                debug!(prefix = %self.prefix, records = record_count, "Flushed JSON Lines");
                Ok(())
            }
            Err(e) => {
                // the next flush reopens the file
                warn!(
                    ?e,
                    prefix = %self.prefix,
                    records = record_count,
                    "JSON Lines write failed, records dropped"
                );
                Err(e)
            }
        }
    }

    /// Write the buffer to today's file. On error the file is left closed.
    fn write_buffer(&mut self, today: &str) -> PersistenceResult<()> {
        let mut active = match self.active_writer.take() {
            Some(active) => active,
            None => self.open_writer(today)?,
        };
        self.buffer
            .iter()
            .try_for_each(|line| writeln!(active.writer, "{line}"))
            .and_then(|()| active.writer.flush())?;
        active.records_written += self.buffer.len();
        self.active_writer = Some(active);
        Ok(())
    }

    /// Flush pending records and close the file.
    pub fn close(&mut self) -> PersistenceResult<()> {
        self.flush()?;
        self.close_active_writer();
        Ok(())
    }
}

impl<T> Drop for JsonLinesWriter<T> {
    fn drop(&mut self) {
        if let Some(active) = self.active_writer.as_mut() {
            for line in &self.buffer {
                if let Err(e) = writeln!(active.writer, "{line}") {
                    warn!(?e, "Failed to flush buffer on drop");
                    break;
                }
            }
            if let Err(e) = active.writer.flush() {
                warn!(?e, "Failed to flush writer on drop");
            }
        } else if !self.buffer.is_empty() {
            warn!(records = self.buffer.len(), "Dropping unflushed records");
        }
    }
}
