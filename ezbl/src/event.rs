//! The packets a UART decoder hands us, and the filtering that turns them into
//! data bytes tagged with the direction they travelled in.

use std::str::FromStr;

use anyhow::{bail, Result};
use derive_more::{Display, From, Into};

/// A position in the capture, in samples.
#[derive(From, Into, Display, Debug, Default, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Sample(pub u64);

/// Which side of the bus a byte came from.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Direction {
    /// The host driving the handshake (the bus master).
    Initiator,
    /// The bootloader on the device (the bus slave).
    Responder,
}

impl Direction {
    pub fn from_is_initiator(is_initiator: bool) -> Self {
        if is_initiator {
            Direction::Initiator
        } else {
            Direction::Responder
        }
    }
}

/// The kinds of packet a UART decoder produces. Only `Data` carries a byte
/// we care about.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PacketType {
    StartBit,
    Data,
    ParityBit,
    StopBit,
    InvalidStartBit,
    InvalidStopBit,
    ParityError,
    Break,
    Frame,
    Idle,
}

impl FromStr for PacketType {
    type Err = anyhow::Error;

    /// Parse the upper case tags used by the UART decoder (`DATA`, `STARTBIT` etc).
    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "STARTBIT" => PacketType::StartBit,
            "DATA" => PacketType::Data,
            "PARITYBIT" => PacketType::ParityBit,
            "STOPBIT" => PacketType::StopBit,
            "INVALID STARTBIT" | "INVALID_STARTBIT" => PacketType::InvalidStartBit,
            "INVALID STOPBIT" | "INVALID_STOPBIT" => PacketType::InvalidStopBit,
            "PARITY ERROR" | "PARITY_ERROR" => PacketType::ParityError,
            "BREAK" => PacketType::Break,
            "FRAME" => PacketType::Frame,
            "IDLE" => PacketType::Idle,
            _ => bail!("Unknown UART packet type {s:?}"),
        })
    }
}

/// One packet from the UART decoder, covering samples `[start, end)`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UartPacket {
    pub start: Sample,
    pub end: Sample,
    pub packet_type: PacketType,
    /// True if this was seen on the line the initiator transmits on (TX).
    pub is_initiator: bool,
    pub value: u8,
}

impl UartPacket {
    pub fn data(start: impl Into<Sample>, end: impl Into<Sample>, is_initiator: bool, value: u8) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            packet_type: PacketType::Data,
            is_initiator,
            value,
        }
    }
}

/// A single data byte, where it came from, and the samples it occupies.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DirectedByte {
    pub direction: Direction,
    pub value: u8,
    pub start: Sample,
    pub end: Sample,
}

impl DirectedByte {
    /// Returns `None` for anything that isn't a data packet. Those are just
    /// framing noise as far as the handshake is concerned.
    ///
    /// `swap_directions` treats the RX line as the initiator instead of TX.
    pub fn from_packet(packet: &UartPacket, swap_directions: bool) -> Option<Self> {
        if packet.packet_type != PacketType::Data {
            return None;
        }
        Some(Self {
            direction: Direction::from_is_initiator(packet.is_initiator != swap_directions),
            value: packet.value,
            start: packet.start,
            end: packet.end,
        })
    }
}
