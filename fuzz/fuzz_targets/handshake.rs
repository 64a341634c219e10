#![no_main]

use ezbl::{Decoder, PacketType, State, UartPacket};
use libfuzzer_sys::fuzz_target;

// Every two input bytes make one packet: the first picks the line and whether
// it is a data packet, the second is the value.
fuzz_target!(|data: &[u8]| {
    let mut decoder = Decoder::default();
    let mut annotations = Vec::new();

    for (i, pair) in data.chunks_exact(2).enumerate() {
        let start = i as u64 * 10;
        let mut packet = UartPacket::data(start, start + 10, pair[0] & 1 == 0, pair[1]);
        if pair[0] & 0x80 != 0 {
            packet.packet_type = PacketType::StopBit;
        }
        decoder.decode(&packet, &mut annotations);

        let field = decoder.state().expected_field();
        assert!(decoder.buffered() < field.map_or(1, |f| f.length()));
        if decoder.state() == State::Idle {
            assert_eq!(decoder.buffered(), 0);
        }
    }

    for annotation in &annotations {
        assert!(annotation.start <= annotation.end);
        assert!(!annotation.labels.is_empty());
    }
});
