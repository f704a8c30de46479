use crate::entry::JournalRecord;
use crate::errors::JournalError;
use crate::frame::{FrameKind, JournalHeader, RecordFrame, HEADER_SIZE};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, Write};
use std::path::Path;

/// Options for journal writing.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Whether to fsync after each append (default: false).
    pub sync: bool,
    /// Whether to create the file if it doesn't exist (default: true).
    pub create: bool,
    /// Whether to keep existing records (default: true); `false` truncates to the header.
    pub append: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            sync: false,
            create: true,
            append: true,
        }
    }
}

/// Append-only writer for a session journal.
///
/// Each record is one frame holding the JSON `{event, entry}` pair, so an
/// event and its ledger entry are always durable together.
pub struct JournalWriter {
    file: File,
    sync: bool,
    len: u64,
}

impl JournalWriter {
    /// Opens or creates a journal file for writing.
    ///
    /// An empty file gets a fresh header. An existing file must carry a
    /// valid header.
    pub fn open<P: AsRef<Path>>(path: P, options: WriteOptions) -> Result<Self, JournalError> {
        let file = OpenOptions::new()
            .create(options.create)
            .write(true)
            .read(true)
            .open(path)?;

        let mut writer = Self {
            file,
            sync: options.sync,
            len: 0,
        };

        let existing = writer.file.metadata()?.len();
        if existing == 0 {
            writer.write_header()?;
        } else if existing < HEADER_SIZE as u64 {
            return Err(JournalError::FileNotEmpty);
        } else {
            let mut header_bytes = [0u8; HEADER_SIZE];
            writer.file.seek(io::SeekFrom::Start(0))?;
            writer.file.read_exact(&mut header_bytes)?;
            JournalHeader::from_bytes(&header_bytes)?;
            if options.append {
                writer.len = writer.file.seek(io::SeekFrom::End(0))?;
            } else {
                writer.truncate(HEADER_SIZE as u64)?;
            }
        }

        Ok(writer)
    }

    fn write_header(&mut self) -> Result<(), JournalError> {
        self.file.write_all(&JournalHeader::new().to_bytes())?;
        self.file.flush()?;
        if self.sync {
            self.file.sync_all()?;
        }
        self.len = HEADER_SIZE as u64;
        Ok(())
    }

    /// Whether the journal holds any frames.
    pub fn is_empty(&self) -> bool {
        self.len <= HEADER_SIZE as u64
    }

    /// Drops everything after `len` bytes, e.g. a truncated tail found on recovery.
    pub fn truncate(&mut self, len: u64) -> Result<(), JournalError> {
        let len = len.max(HEADER_SIZE as u64);
        self.file.set_len(len)?;
        self.file.seek(io::SeekFrom::Start(len))?;
        self.len = len;
        Ok(())
    }

    /// Appends one `{event, entry}` record.
    pub fn append_record(&mut self, record: &JournalRecord) -> Result<(), JournalError> {
        let json = serde_json::to_vec(record)?;
        self.append_raw(FrameKind::Record, &json)
    }

    /// Appends a raw frame with the given kind and payload.
    ///
    /// A failed write is rolled back to the previous length so the file
    /// never keeps a partial frame.
    pub fn append_raw(&mut self, kind: FrameKind, payload: &[u8]) -> Result<(), JournalError> {
        let frame = RecordFrame::new(kind, payload.len())?;
        let start = self.len;

        let written = self
            .file
            .write_all(&frame.to_bytes())
            .and_then(|_| self.file.write_all(payload))
            .and_then(|_| self.file.flush())
            .and_then(|_| if self.sync { self.file.sync_data() } else { Ok(()) });
        if let Err(e) = written {
            let _ = self.truncate(start);
            return Err(e.into());
        }

        self.len = start + (crate::frame::FRAME_HEADER_SIZE + payload.len()) as u64;
        Ok(())
    }

    /// Flushes and closes the file.
    pub fn finish(mut self) -> Result<(), JournalError> {
        self.file.flush()?;
        if self.sync {
            self.file.sync_all()?;
        }
        Ok(())
    }
}

impl Drop for JournalWriter {
    fn drop(&mut self) {
        let _ = self.file.flush();
        if self.sync {
            let _ = self.file.sync_all();
        }
    }
}
