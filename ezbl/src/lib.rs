//! Microchip EZBL bootloader handshake decoder
//!
//! This sits on top of a UART decoder. It takes the data bytes going each way
//! on the bus, follows the handshake the host sends when it offers a firmware
//! image to the bootloader, and produces annotations for each field with the
//! sample range it came from.
//!
//! # Protocol
//!
//! Everything up to the control code is sent by the host (the initiator). All
//! numbers are little endian.
//!
//! | Bytes | Field                                                 |
//! |-------|-------------------------------------------------------|
//! | 16    | Sync header, `UUUUUUUUMCUPHCME`                       |
//! | 4     | File ID header, `BL2B`                                |
//! | 4     | File length (u32)                                     |
//! | 16    | Boot ID hash                                          |
//! | 8     | App version: build (u24), pad, minor, pad, major, pad |
//! | 32    | HMAC-SHA-256                                          |
//! | 2     | Control code (u16), sent by the device                |
//!
//! The firmware transfer that follows the control code is not decoded.

pub mod annotation;
pub mod decoder;
pub mod event;
pub mod field;

pub use annotation::{Annotation, AnnotationSink, Channel, Message};
pub use decoder::{Decoder, Options, State, MAX_TRANSITIONS_PER_BYTE};
pub use event::{DirectedByte, Direction, PacketType, Sample, UartPacket};
pub use field::{AppVersion, Field, FieldBuffer, FieldValue};
