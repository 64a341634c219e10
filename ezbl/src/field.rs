//! The fields of the handshake, the buffer they are collected in, and how
//! each one is decoded once it is complete.
//!
//! There is no tagging or length prefix on the wire. Every field has a fixed
//! length and they always come in the same order, so a field is only looked
//! at once all of its bytes have arrived.

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};
use tinyvec::ArrayVec;

use crate::event::{Direction, Sample};

pub const SYNC_HEADER: &[u8; 16] = b"UUUUUUUUMCUPHCME";
pub const FILE_ID_HEADER: &[u8; 4] = b"BL2B";

/// Length of the longest field (the HMAC).
pub const MAX_FIELD_LENGTH: usize = 32;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Field {
    Sync,
    FileId,
    FileLen,
    BootIdHash,
    AppVersion,
    Hmac,
    ControlCode,
}

impl Field {
    /// Number of bytes in the field.
    pub fn length(self) -> usize {
        match self {
            Field::Sync => SYNC_HEADER.len(),
            Field::FileId => FILE_ID_HEADER.len(),
            Field::FileLen => 4,
            Field::BootIdHash => 16,
            Field::AppVersion => 8,
            Field::Hmac => 32,
            Field::ControlCode => 2,
        }
    }

    /// Who sends it.
    pub fn direction(self) -> Direction {
        match self {
            Field::ControlCode => Direction::Responder,
            _ => Direction::Initiator,
        }
    }
}

/// Collects the bytes of one field. Only one field is ever open at a time so
/// the decoder keeps a single buffer and retags it as it moves along.
#[derive(Clone, Debug)]
pub struct FieldBuffer {
    field: Field,
    bytes: ArrayVec<[u8; MAX_FIELD_LENGTH]>,
    // Start of the first byte of the field.
    start: Option<Sample>,
}

/// A field with all of its bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletedField {
    pub field: Field,
    pub bytes: ArrayVec<[u8; MAX_FIELD_LENGTH]>,
    pub start: Sample,
}

impl FieldBuffer {
    pub fn new(field: Field) -> Self {
        Self {
            field,
            bytes: ArrayVec::new(),
            start: None,
        }
    }

    pub fn field(&self) -> Field {
        self.field
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn start(&self) -> Option<Sample> {
        self.start
    }

    /// Start collecting `field`, dropping anything buffered.
    pub fn open(&mut self, field: Field) {
        self.field = field;
        self.clear();
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
        self.start = None;
    }

    /// Add a byte that started at `start`. When that makes the field complete
    /// the bytes are handed back and the buffer is left empty, ready for the
    /// same field again.
    pub fn push(&mut self, value: u8, start: Sample) -> Option<CompletedField> {
        if self.bytes.is_empty() {
            self.start = Some(start);
        }
        self.bytes.push(value);

        if self.bytes.len() < self.field.length() {
            return None;
        }

        Some(CompletedField {
            field: self.field,
            bytes: std::mem::take(&mut self.bytes),
            start: self.start.take().unwrap_or(start),
        })
    }
}

/// The application version. On the wire it is 8 bytes; the build number is
/// the low three, minor is byte 4 and major is byte 6. Bytes 3, 5 and 7 are
/// padding.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct AppVersion {
    pub major: u8,
    pub minor: u8,
    pub build: u32,
}

impl AppVersion {
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Field::AppVersion.length() {
            return None;
        }
        Some(Self {
            build: LittleEndian::read_u24(&bytes[0..3]),
            minor: bytes[4],
            major: bytes[6],
        })
    }
}

impl fmt::Display for AppVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}.{}", self.major, self.minor, self.build)
    }
}

pub fn decode_file_length(bytes: &[u8]) -> Option<u32> {
    bytes.get(0..4).map(LittleEndian::read_u32)
}

pub fn decode_control_code(bytes: &[u8]) -> Option<u16> {
    bytes.get(0..2).map(LittleEndian::read_u16)
}

/// Lower case hex, two characters per byte, so leading zero bytes are kept.
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// What a completed field turned out to contain.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldValue {
    Sync { valid: bool },
    FileId { valid: bool },
    FileLen(u32),
    BootIdHash(String),
    AppVersion(AppVersion),
    Hmac(String),
    ControlCode(u16),
}

impl CompletedField {
    /// Returns `None` only if the buffer is shorter than the field, which
    /// `FieldBuffer` never hands out.
    pub fn decode(&self) -> Option<FieldValue> {
        let bytes = self.bytes.as_slice();
        if bytes.len() != self.field.length() {
            return None;
        }
        Some(match self.field {
            Field::Sync => FieldValue::Sync {
                valid: bytes == SYNC_HEADER,
            },
            Field::FileId => FieldValue::FileId {
                valid: bytes == FILE_ID_HEADER,
            },
            Field::FileLen => FieldValue::FileLen(decode_file_length(bytes)?),
            Field::BootIdHash => FieldValue::BootIdHash(to_hex(bytes)),
            Field::AppVersion => FieldValue::AppVersion(AppVersion::decode(bytes)?),
            Field::Hmac => FieldValue::Hmac(to_hex(bytes)),
            Field::ControlCode => FieldValue::ControlCode(decode_control_code(bytes)?),
        })
    }
}
