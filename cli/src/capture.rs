//! Reading UART packets from a text capture.
//!
//! One packet per line:
//!
//! ```text
//! # start end line type value
//! 1000 1086 tx DATA 0x55
//! 1086 1172 rx DATA 85
//! ```
//!
//! `tx` is the host. Blank lines and lines starting with `#` are skipped.

use std::io::BufRead;

use anyhow::{bail, Context, Result};
use ezbl::{PacketType, Sample, UartPacket};

pub fn parse_line(line: &str) -> Result<Option<UartPacket>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let fields: Vec<&str> = line.split_whitespace().collect();
    // Packet types can contain a space ("PARITY ERROR") so the value is always
    // the last field and the type is everything between.
    if fields.len() < 5 {
        bail!("Expected `start end tx|rx TYPE value`, got {} fields", fields.len());
    }

    let start: u64 = fields[0].parse().context("Invalid start sample")?;
    let end: u64 = fields[1].parse().context("Invalid end sample")?;
    if end < start {
        bail!("Packet ends ({end}) before it starts ({start})");
    }

    let is_initiator = match fields[2] {
        "tx" | "TX" => true,
        "rx" | "RX" => false,
        other => bail!("Unknown line {other:?}; expected tx or rx"),
    };

    let last = fields.len() - 1;
    let packet_type: PacketType = fields[3..last].join(" ").parse()?;
    let value = parse_value(fields[last])?;

    Ok(Some(UartPacket {
        start: Sample(start),
        end: Sample(end),
        packet_type,
        is_initiator,
        value,
    }))
}

fn parse_value(s: &str) -> Result<u8> {
    let value = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    value.with_context(|| format!("Invalid byte value {s:?}"))
}

/// Iterate over the packets in a capture. Yields an error for each bad line
/// and carries on with the next one.
pub fn read_packets(reader: impl BufRead) -> impl Iterator<Item = Result<UartPacket>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(n, line)| {
            let line_number = n + 1;
            let line = match line.with_context(|| format!("Reading line {line_number}")) {
                Ok(line) => line,
                Err(e) => return Some(Err(e)),
            };
            parse_line(&line)
                .with_context(|| format!("Line {line_number}: {line:?}"))
                .transpose()
        })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_data() {
        let packet = parse_line("1000 1086 tx DATA 0x55").unwrap().unwrap();
        assert_eq!(packet, UartPacket::data(1000u64, 1086u64, true, 0x55));

        let packet = parse_line("  5 9 RX DATA 255 ").unwrap().unwrap();
        assert_eq!(packet, UartPacket::data(5u64, 9u64, false, 255));
    }

    #[test]
    fn test_parse_multi_word_type() {
        let packet = parse_line("0 1 rx PARITY ERROR 0").unwrap().unwrap();
        assert_eq!(packet.packet_type, PacketType::ParityError);
    }

    #[test]
    fn test_skip_comments() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("   ").unwrap(), None);
        assert_eq!(parse_line("# start end line type value").unwrap(), None);
    }

    #[test]
    fn test_bad_lines() {
        assert!(parse_line("0 1 tx DATA").is_err());
        assert!(parse_line("0 1 xx DATA 1").is_err());
        assert!(parse_line("0 1 tx DATA 256").is_err());
        assert!(parse_line("0 1 tx DATA 0xZZ").is_err());
        assert!(parse_line("9 1 tx DATA 1").is_err());
        assert!(parse_line("0 1 tx NOPE 1").is_err());
    }

    #[test]
    fn test_read_packets_reports_line() {
        let capture = "# header\n0 10 tx DATA 0x55\n\n10 20 tx DATA oops\n20 30 tx DATA 1\n";
        let results: Vec<_> = read_packets(capture.as_bytes()).collect();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        let err = results[1].as_ref().unwrap_err();
        assert!(format!("{err}").starts_with("Line 4"));
        assert!(results[2].is_ok());
    }
}
