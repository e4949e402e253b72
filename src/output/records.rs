//! Reading and writing wage record files
//!
//! Two layouts are supported, picked by file extension: a single JSON array
//! (the default) or JSON Lines (`.jsonl`), one record per line.

use crate::record::WageRecord;
use crate::Result;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// On-disk layout of a records file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    Json,
    JsonLines,
}

impl RecordFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("jsonl") => Self::JsonLines,
            _ => Self::Json,
        }
    }
}

/// Writes records one at a time as they arrive from a crawl
///
/// [`finish`](RecordWriter::finish) must be called to close a JSON array.
pub struct RecordWriter {
    out: BufWriter<File>,
    format: RecordFormat,
    written: usize,
}

impl RecordWriter {
    /// Creates (or truncates) the file at `path`
    pub fn create(path: &Path) -> Result<Self> {
        let format = RecordFormat::from_path(path);
        let mut out = BufWriter::new(File::create(path)?);

        if format == RecordFormat::Json {
            out.write_all(b"[")?;
        }

        Ok(Self {
            out,
            format,
            written: 0,
        })
    }

    pub fn write(&mut self, record: &WageRecord) -> Result<()> {
        match self.format {
            RecordFormat::Json => {
                if self.written > 0 {
                    self.out.write_all(b",")?;
                }
                self.out.write_all(b"\n  ")?;
                serde_json::to_writer(&mut self.out, record)?;
            }
            RecordFormat::JsonLines => {
                serde_json::to_writer(&mut self.out, record)?;
                self.out.write_all(b"\n")?;
            }
        }
        self.written += 1;
        Ok(())
    }

    /// Closes the array (JSON layout) and flushes; returns the record count
    pub fn finish(mut self) -> Result<usize> {
        if self.format == RecordFormat::Json {
            self.out.write_all(b"\n]\n")?;
        }
        self.out.flush()?;
        Ok(self.written)
    }
}

/// Writes a complete batch of records to `path`
pub fn write_records(path: &Path, records: &[WageRecord]) -> Result<usize> {
    let mut writer = RecordWriter::create(path)?;
    for record in records {
        writer.write(record)?;
    }
    writer.finish()
}

/// Loads every record from a file in either layout
pub fn read_records(path: &Path) -> Result<Vec<WageRecord>> {
    let file = File::open(path)?;

    match RecordFormat::from_path(path) {
        RecordFormat::Json => Ok(serde_json::from_reader(BufReader::new(file))?),
        RecordFormat::JsonLines => {
            let mut records = Vec::new();
            for line in BufReader::new(file).lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                records.push(serde_json::from_str(&line)?);
            }
            Ok(records)
        }
    }
}
