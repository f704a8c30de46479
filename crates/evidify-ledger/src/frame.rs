//! Journal file layout.
//!
//! ```text
//! header : magic "EVJ1" | version u16 LE | flags u16 LE | 8 reserved bytes
//! frame  : kind u8 | 3 reserved bytes | len u32 LE | payload[len]
//! ```

use crate::errors::JournalError;

/// Journal file magic bytes: `b"EVJ1"`.
pub const MAGIC: &[u8; 4] = b"EVJ1";

/// Current journal format version.
pub const VERSION: u16 = 0x0001;

/// Header size in bytes.
pub const HEADER_SIZE: usize = 16;

/// Frame header size in bytes.
pub const FRAME_HEADER_SIZE: usize = 8;

/// Maximum payload size: 16 MiB.
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

/// Frame kind byte for an `{event, entry}` JSON record.
pub const FRAME_KIND_RECORD: u8 = 0x01;

/// Journal file header.
///
/// Only the version varies; magic, flags and reserved bytes are fixed and
/// checked on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JournalHeader {
    /// Format version.
    pub version: u16,
}

impl JournalHeader {
    /// Header for the current version.
    pub fn new() -> Self {
        Self { version: VERSION }
    }

    /// Encodes the header.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[..4].copy_from_slice(MAGIC);
        out[4..6].copy_from_slice(&self.version.to_le_bytes());
        out
    }

    /// Decodes a header, rejecting anything this reader cannot replay.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, JournalError> {
        let invalid = |why: String| JournalError::InvalidHeader(why);
        let head: &[u8; HEADER_SIZE] = bytes
            .get(..HEADER_SIZE)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| invalid(format!("{} bytes, need {HEADER_SIZE}", bytes.len())))?;

        if &head[..4] != MAGIC {
            return Err(invalid(format!(
                "not a session journal (magic {:02x?})",
                &head[..4]
            )));
        }
        let version = u16::from_le_bytes([head[4], head[5]]);
        if version != VERSION {
            return Err(invalid(format!("unsupported version {version}")));
        }
        if head[6..].iter().any(|&b| b != 0) {
            return Err(invalid("flags and reserved bytes must be zero".to_string()));
        }
        Ok(Self { version })
    }
}

impl Default for JournalHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Record frame kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// UTF-8 JSON `{event, entry}` record.
    Record,
    /// Kind written by a newer format; skipped by readers.
    Unknown(u8),
}

impl FrameKind {
    /// Maps a kind byte.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            FRAME_KIND_RECORD => FrameKind::Record,
            _ => FrameKind::Unknown(byte),
        }
    }

    /// Kind byte.
    pub fn to_byte(self) -> u8 {
        match self {
            FrameKind::Record => FRAME_KIND_RECORD,
            FrameKind::Unknown(b) => b,
        }
    }
}

/// Record frame header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFrame {
    /// Frame kind.
    pub kind: FrameKind,
    /// Payload length in bytes.
    pub len: u32,
}

impl RecordFrame {
    /// Creates a frame header, rejecting payloads over [`MAX_PAYLOAD_SIZE`].
    pub fn new(kind: FrameKind, len: usize) -> Result<Self, JournalError> {
        match u32::try_from(len) {
            Ok(len) if len <= MAX_PAYLOAD_SIZE => Ok(Self { kind, len }),
            _ => Err(JournalError::PayloadTooLarge {
                size: len,
                max: MAX_PAYLOAD_SIZE,
            }),
        }
    }

    /// Encodes the frame header.
    pub fn to_bytes(&self) -> [u8; FRAME_HEADER_SIZE] {
        let [l0, l1, l2, l3] = self.len.to_le_bytes();
        [self.kind.to_byte(), 0, 0, 0, l0, l1, l2, l3]
    }

    /// Parses a frame header found at `offset`.
    pub fn from_bytes(bytes: &[u8], offset: u64) -> Result<Self, JournalError> {
        let invalid = |reason: String| JournalError::InvalidFrame { offset, reason };
        let [kind, r1, r2, r3, l0, l1, l2, l3] = match bytes.get(..FRAME_HEADER_SIZE) {
            Some(&[a, b, c, d, e, f, g, h]) => [a, b, c, d, e, f, g, h],
            _ => return Err(invalid(format!("{} header bytes, need 8", bytes.len()))),
        };
        if (r1 | r2 | r3) != 0 {
            return Err(invalid("reserved frame bytes set".to_string()));
        }
        let len = u32::from_le_bytes([l0, l1, l2, l3]);
        if len > MAX_PAYLOAD_SIZE {
            return Err(invalid(format!(
                "declared length {len} over the {MAX_PAYLOAD_SIZE} byte limit"
            )));
        }
        Ok(Self {
            kind: FrameKind::from_byte(kind),
            len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout() {
        let bytes = JournalHeader::new().to_bytes();
        assert_eq!(&bytes[..4], b"EVJ1");
        assert_eq!(&bytes[4..6], &[1, 0]);
        assert_eq!(JournalHeader::from_bytes(&bytes).unwrap().version, VERSION);
        assert!(JournalHeader::from_bytes(&bytes[..10]).is_err());
    }

    #[test]
    fn header_rejects_foreign_magic() {
        let mut bytes = JournalHeader::new().to_bytes();
        bytes[0..4].copy_from_slice(b"NRJ1");
        assert!(matches!(
            JournalHeader::from_bytes(&bytes),
            Err(JournalError::InvalidHeader(_))
        ));
    }

    #[test]
    fn header_rejects_unknown_version() {
        let mut bytes = JournalHeader::new().to_bytes();
        bytes[4] = 0x02;
        let err = JournalHeader::from_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn header_rejects_flags_and_reserved() {
        let mut bytes = JournalHeader::new().to_bytes();
        bytes[6] = 0x01;
        assert!(JournalHeader::from_bytes(&bytes).is_err());

        let mut bytes = JournalHeader::new().to_bytes();
        bytes[8] = 0x01;
        assert!(JournalHeader::from_bytes(&bytes).is_err());
    }

    #[test]
    fn unknown_kinds_survive_decoding() {
        let frame = RecordFrame::new(FrameKind::Unknown(0x7f), 1024).unwrap();
        let bytes = frame.to_bytes();
        assert_eq!(bytes, [0x7f, 0, 0, 0, 0, 4, 0, 0]);
        assert_eq!(RecordFrame::from_bytes(&bytes, 16).unwrap(), frame);
    }

    #[test]
    fn frame_rejects_oversized_payload() {
        assert!(matches!(
            RecordFrame::new(FrameKind::Record, MAX_PAYLOAD_SIZE as usize + 1),
            Err(JournalError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn frame_error_reports_offset() {
        let mut bytes = RecordFrame::new(FrameKind::Record, 10).unwrap().to_bytes();
        bytes[2] = 0x01;
        match RecordFrame::from_bytes(&bytes, 40) {
            Err(JournalError::InvalidFrame { offset, .. }) => assert_eq!(offset, 40),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
