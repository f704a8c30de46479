use crate::entry::JournalRecord;
use crate::errors::JournalError;
use crate::frame::{FrameKind, JournalHeader, RecordFrame, FRAME_HEADER_SIZE, HEADER_SIZE};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// How the reader treats a truncated tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Truncated frames are errors.
    Strict,
    /// Truncation is treated as end-of-file, e.g. after a crash mid-append.
    Permissive,
}

/// Sequential reader over a session journal.
///
/// # Example
///
/// ```rust,no_run
/// use evidify_ledger::{JournalReader, ReadMode};
///
/// let mut reader = JournalReader::open("session.evj", ReadMode::Strict)?;
/// while let Some(record) = reader.read_record()? {
///     println!("{} {}", record.entry.seq, record.entry.chain_hash);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct JournalReader {
    file: BufReader<File>,
    mode: ReadMode,
    len: u64,
    position: u64,
    last_complete: u64,
}

impl JournalReader {
    /// Opens a journal and validates its header.
    pub fn open<P: AsRef<Path>>(path: P, mode: ReadMode) -> Result<Self, JournalError> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        let mut file = BufReader::new(file);
        let mut header_bytes = [0u8; HEADER_SIZE];
        file.read_exact(&mut header_bytes)?;
        JournalHeader::from_bytes(&header_bytes)?;

        Ok(Self {
            file,
            mode,
            len,
            position: HEADER_SIZE as u64,
            last_complete: HEADER_SIZE as u64,
        })
    }

    /// Byte offset just past the last complete frame read.
    ///
    /// After a permissive read hits a truncated tail, this is where a
    /// writer should resume.
    pub fn valid_len(&self) -> u64 {
        self.last_complete
    }

    /// Reads the next raw frame.
    ///
    /// Returns `Ok(None)` at end-of-file (or truncation in permissive mode).
    pub fn read_frame(&mut self) -> Result<Option<(FrameKind, Vec<u8>)>, JournalError> {
        if self.position >= self.len {
            return Ok(None);
        }
        let frame_start = self.position;

        let mut header = [0u8; FRAME_HEADER_SIZE];
        if !self.read_or_truncate(&mut header, frame_start)? {
            return Ok(None);
        }
        let frame = RecordFrame::from_bytes(&header, frame_start)?;
        self.position += FRAME_HEADER_SIZE as u64;

        let mut payload = vec![0u8; frame.len as usize];
        if !self.read_or_truncate(&mut payload, frame_start)? {
            return Ok(None);
        }
        self.position += u64::from(frame.len);
        self.last_complete = self.position;

        Ok(Some((frame.kind, payload)))
    }

    fn read_or_truncate(&mut self, buf: &mut [u8], frame_start: u64) -> Result<bool, JournalError> {
        match self.file.read_exact(buf) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => match self.mode {
                ReadMode::Permissive => {
                    self.position = self.len;
                    Ok(false)
                }
                ReadMode::Strict => Err(JournalError::TruncatedFrame {
                    offset: frame_start,
                }),
            },
            Err(e) => Err(e.into()),
        }
    }

    /// Reads the next `{event, entry}` record, skipping unknown frame kinds.
    pub fn read_record(&mut self) -> Result<Option<JournalRecord>, JournalError> {
        loop {
            match self.read_frame()? {
                None => return Ok(None),
                Some((FrameKind::Record, payload)) => {
                    let text = std::str::from_utf8(&payload)?;
                    return Ok(Some(serde_json::from_str(text)?));
                }
                Some((FrameKind::Unknown(_), _)) => continue,
            }
        }
    }
}
