use std::collections::{HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use csv::{Position, ReaderBuilder, StringRecord, WriterBuilder};
use tracing::debug;

use super::error::StorageError;
use super::traits::ResultStore;
use crate::consumer::ConsumerResult;

const HEADER: [&str; 4] = ["identifier", "time", "info", "result"];

/// Append-only CSV file of results with an in-memory offset index
///
/// Rows are `identifier,time,info,result`. Opening the file scans it once to
/// map every identifier to the byte offset of its latest row; lookups seek
/// straight to that row. Overwrites append a new row, so the latest row for
/// an identifier wins. A rollback truncates the file back to its length at
/// open or at the last flush.
pub struct CsvResultStore {
    path: PathBuf,
    index: HashMap<String, u64>,
    reader: Mutex<Option<csv::Reader<File>>>,
    writer: Option<BufWriter<File>>,
    read_only: bool,
    /// Length of the file including buffered bytes
    end: u64,
    /// Bytes known to be on disk
    flushed: u64,
    /// File length a rollback returns to; zero removes the file
    committed: u64,
}

impl CsvResultStore {
    /// Open a store for reading and writing; the file is created on first
    /// write or by `create_if_absent`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Self::load(path.as_ref(), false)
    }

    /// Open an existing store for lookups only
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no result store at {}", path.display()),
            )
            .into());
        }
        Self::load(path, true)
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path, read_only: bool) -> Result<Self, StorageError> {
        let mut store = Self {
            path: path.to_path_buf(),
            index: HashMap::new(),
            reader: Mutex::new(None),
            writer: None,
            read_only,
            end: 0,
            flushed: 0,
            committed: 0,
        };

        if path.exists() {
            store.build_index()?;
            store.committed = store.end;
        }

        Ok(store)
    }

    fn build_index(&mut self) -> Result<(), StorageError> {
        self.index.clear();
        let file = File::open(&self.path)?;
        self.end = file.metadata()?.len();
        self.flushed = self.end;

        let mut reader = ReaderBuilder::new().has_headers(false).from_reader(file);
        let mut record = StringRecord::new();
        let mut first = true;

        while reader.read_record(&mut record)? {
            if first {
                first = false;
                if record.iter().ne(HEADER) {
                    return Err(self.corrupt("missing identifier,time,info,result header"));
                }
                continue;
            }

            let offset = record.position().map(Position::byte).unwrap_or_default();
            let identifier = record
                .get(0)
                .ok_or_else(|| self.corrupt("empty row"))?
                .to_string();
            self.index.insert(identifier, offset);
        }

        debug!(path = %self.path.display(), rows = self.index.len(), "Indexed result store");
        Ok(())
    }

    fn corrupt(&self, reason: &str) -> StorageError {
        StorageError::Corrupt {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    fn writer(&mut self) -> Result<&mut BufWriter<File>, StorageError> {
        if self.read_only {
            return Err(StorageError::ReadOnly(self.path.display().to_string()));
        }
        if self.writer.is_none() {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            let len = file.seek(SeekFrom::End(0))?;
            if len == 0 {
                let header = encode_row(HEADER)?;
                file.write_all(&header)?;
                self.end = header.len() as u64;
                self.flushed = self.end;
            }
            self.writer = Some(BufWriter::new(file));
        }
        self.writer
            .as_mut()
            .ok_or_else(|| StorageError::ReadOnly(self.path.display().to_string()))
    }

    fn append(&mut self, result: ConsumerResult) -> Result<(), StorageError> {
        let row = encode_row([
            result.identifier.as_str(),
            result.time.as_str(),
            result.info.as_str(),
            result.result.as_str(),
        ])?;

        // Opening a fresh file writes the header and moves `end`
        self.writer()?;
        let offset = self.end;
        let writer = self.writer()?;
        writer.write_all(&row)?;
        let buffered = writer.buffer().len() as u64;

        self.end = offset + row.len() as u64;
        self.flushed = self.end - buffered;
        self.index.insert(result.identifier, offset);
        Ok(())
    }

    fn read_row(&self, offset: u64) -> Result<ConsumerResult, StorageError> {
        if offset >= self.flushed {
            // Row is still in the write buffer
            let buffer = self.writer.as_ref().map(BufWriter::buffer).unwrap_or_default();
            let start = (offset - self.flushed) as usize;
            let mut reader = ReaderBuilder::new()
                .has_headers(false)
                .from_reader(buffer.get(start..).unwrap_or_default());
            return self.decode(&mut reader);
        }

        let mut guard = self.reader.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.is_none() {
            let file = File::open(&self.path)?;
            *guard = Some(ReaderBuilder::new().has_headers(false).from_reader(file));
        }
        let reader = guard
            .as_mut()
            .ok_or_else(|| self.corrupt("reader unavailable"))?;

        let mut position = Position::new();
        position.set_byte(offset);
        reader.seek(position)?;
        self.decode(reader)
    }

    fn decode<R: io::Read>(&self, reader: &mut csv::Reader<R>) -> Result<ConsumerResult, StorageError> {
        let mut record = StringRecord::new();
        if !reader.read_record(&mut record)? {
            return Err(self.corrupt("indexed row is missing"));
        }
        Ok(record.deserialize(None)?)
    }
}

fn encode_row(fields: [&str; 4]) -> Result<Vec<u8>, StorageError> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    writer.write_record(fields)?;
    writer
        .into_inner()
        .map_err(|e| StorageError::from(e.into_error()))
}

impl ResultStore for CsvResultStore {
    fn create_if_absent(&mut self) -> Result<(), StorageError> {
        self.writer()?;
        Ok(())
    }

    fn insert(&mut self, result: ConsumerResult) -> Result<(), StorageError> {
        if self.index.contains_key(&result.identifier) {
            return Err(StorageError::DuplicateIdentifier(result.identifier));
        }
        self.append(result)
    }

    fn upsert(&mut self, result: ConsumerResult) -> Result<(), StorageError> {
        self.append(result)
    }

    fn lookup(&self, identifier: &str) -> Result<Option<ConsumerResult>, StorageError> {
        match self.index.get(identifier) {
            Some(&offset) => self.read_row(offset).map(Some),
            None => Ok(None),
        }
    }

    fn identifiers(&self) -> Result<HashSet<String>, StorageError> {
        Ok(self.index.keys().cloned().collect())
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
            self.flushed = self.end;
            self.committed = self.end;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StorageError> {
        let Some(writer) = self.writer.take() else {
            return Ok(());
        };
        // Buffered rows are dropped without reaching the file
        let (file, _buffered) = writer.into_parts();
        *self.reader.get_mut().unwrap_or_else(PoisonError::into_inner) = None;

        drop(file);

        if self.committed == 0 {
            fs::remove_file(&self.path)?;
            self.index.clear();
            self.end = 0;
            self.flushed = 0;
        } else {
            OpenOptions::new()
                .write(true)
                .open(&self.path)?
                .set_len(self.committed)?;
            self.build_index()?;
        }

        debug!(path = %self.path.display(), rows = self.index.len(), "Rolled back result store");
        Ok(())
    }
}
