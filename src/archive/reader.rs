use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use tracing::{debug, warn};

/// Line that closes every record of an SD file
pub const DEFAULT_TERMINATOR: &str = "$$$$";

/// Buffered gzip reader over an archive file
pub type GzipLines = BufReader<MultiGzDecoder<File>>;

/// Lazy, single-pass iterator over the records of an SD archive
///
/// Lines are decoded one at a time and accumulated until a line whose trimmed
/// text equals the terminator. The accumulated text, terminator line
/// included, is yielded as one record. Memory use is bounded by the record
/// currently being assembled.
///
/// Invalid UTF-8 is replaced with U+FFFD instead of failing the read. Text
/// after the last terminator is not a record and is dropped with a warning.
pub struct RecordReader<R> {
    reader: R,
    terminator: String,
    line: Vec<u8>,
    current: String,
    records_read: u64,
    done: bool,
}

impl RecordReader<GzipLines> {
    /// Open a gzip-compressed archive (multi-member streams are accepted)
    ///
    /// # Example
    /// ```rust,ignore
    /// for record in RecordReader::open("Compound_000000001_000500000.sdf.gz")? {
    ///     let record = record?;
    /// }
    /// ```
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        debug!(archive = %path.display(), "Opened archive");
        Ok(Self::new(BufReader::new(MultiGzDecoder::new(file))))
    }
}

impl<R: BufRead> RecordReader<R> {
    /// Create a record reader over already decompressed lines
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            terminator: DEFAULT_TERMINATOR.to_string(),
            line: Vec::new(),
            current: String::new(),
            records_read: 0,
            done: false,
        }
    }

    /// Use a different record terminator
    pub fn with_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.terminator = terminator.into();
        self
    }

    /// Number of complete records yielded so far
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    fn finish(&mut self) {
        self.done = true;
        if !self.current.is_empty() {
            warn!(
                dropped_bytes = self.current.len(),
                records = self.records_read,
                "Dropping trailing text without record terminator"
            );
            self.current.clear();
        }
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            self.line.clear();
            match self.reader.read_until(b'\n', &mut self.line) {
                Ok(0) => {
                    self.finish();
                    return None;
                }
                Ok(_) => {
                    let decoded = String::from_utf8_lossy(&self.line);
                    let closes_record = decoded.trim() == self.terminator;
                    self.current.push_str(&decoded);

                    if closes_record {
                        self.records_read += 1;
                        return Some(Ok(std::mem::take(&mut self.current)));
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    // A broken compressed stream cannot be resynchronised
                    self.done = true;
                    self.current.clear();
                    return Some(Err(e));
                }
            }
        }
    }
}
