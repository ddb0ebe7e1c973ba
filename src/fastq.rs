use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;

use crate::error::Result;
use crate::types::ReadRecord;

/// Open a FASTQ file for streaming, transparently decompressing `.gz`.
pub fn open_fastq<P: AsRef<Path>>(path: P) -> Result<FastqRecords<Box<dyn BufRead>>> {
    let path = path.as_ref();
    let f = File::open(path)?;

    let is_gz = path
        .extension()
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    let reader: Box<dyn BufRead> = if is_gz {
        Box::new(BufReader::new(MultiGzDecoder::new(f)))
    } else {
        Box::new(BufReader::new(f))
    };

    Ok(FastqRecords::new(reader, path.to_path_buf()))
}

/// Streams fixed 4-line records. The stream ends at EOF or at the first empty
/// identifier line. A record cut short by EOF is discarded with a warning.
pub struct FastqRecords<R> {
    reader: R,
    source: PathBuf,
    line: String,
    records_read: usize,
    finished: bool,
}

impl<R: BufRead> FastqRecords<R> {
    pub fn new(reader: R, source: PathBuf) -> Self {
        Self {
            reader,
            source,
            line: String::new(),
            records_read: 0,
            finished: false,
        }
    }

    pub fn records_read(&self) -> usize {
        self.records_read
    }

    /// Reads one line without its terminator; `None` at EOF.
    fn next_line(&mut self) -> std::io::Result<Option<String>> {
        self.line.clear();
        if self.reader.read_line(&mut self.line)? == 0 {
            return Ok(None);
        }
        let trimmed = self
            .line
            .strip_suffix('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .unwrap_or(self.line.as_str());
        Ok(Some(trimmed.to_string()))
    }

    fn read_record(&mut self) -> std::io::Result<Option<ReadRecord>> {
        // 1) header; empty means end of input
        let header = match self.next_line()? {
            Some(h) if !h.trim().is_empty() => h,
            _ => return Ok(None),
        };

        // 2) sequence, 3) separator, 4) quality
        let mut body = Vec::with_capacity(3);
        for _ in 0..3 {
            match self.next_line()? {
                Some(l) => body.push(l),
                None => {
                    log::warn!(
                        "{}: record {} truncated after {} line(s); stopping",
                        self.source.display(),
                        self.records_read + 1,
                        body.len() + 1
                    );
                    return Ok(None);
                }
            }
        }
        let quality = body.pop().unwrap_or_default();
        let separator = body.pop().unwrap_or_default();
        let sequence = body.pop().unwrap_or_default();

        self.records_read += 1;
        Ok(Some(ReadRecord {
            header,
            sequence,
            separator,
            quality,
        }))
    }
}

impl<R: BufRead> Iterator for FastqRecords<R> {
    type Item = Result<ReadRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read_record() {
            Ok(Some(rec)) => Some(Ok(rec)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e.into()))
            }
        }
    }
}
