//! Property tests for the DSU wire codec.

use padbridge_dsu_protocol::{
    ControllerDescriptor, ControllerState, HEADER_LEN, PacketHeader, build_packet,
};
use proptest::prelude::*;

fn arb_header() -> impl Strategy<Value = PacketHeader> {
    (
        any::<[u8; 4]>(),
        any::<u16>(),
        any::<u16>(),
        any::<u32>(),
        any::<u32>(),
        any::<u32>(),
    )
        .prop_map(
            |(magic, protocol_version, packet_length, crc32, sender_id, message_type)| {
                PacketHeader {
                    magic,
                    protocol_version,
                    packet_length,
                    crc32,
                    sender_id,
                    message_type,
                }
            },
        )
}

proptest! {
    #[test]
    fn decode_never_panics_on_arbitrary_bytes(
        data in proptest::collection::vec(any::<u8>(), 0..64)
    ) {
        let _ = PacketHeader::decode(&data);
    }

    #[test]
    fn header_round_trips(header in arb_header()) {
        let decoded = PacketHeader::decode(&header.encode());
        prop_assert_eq!(decoded, Ok(header));
    }

    #[test]
    fn decode_requires_full_header(len in 0usize..HEADER_LEN) {
        let data = vec![0u8; len];
        prop_assert!(PacketHeader::decode(&data).is_err());
    }

    #[test]
    fn built_packet_crc_is_self_consistent(
        header in arb_header(),
        payload in proptest::collection::vec(any::<u8>(), 0..128)
    ) {
        let datagram = build_packet(&header, &payload);
        prop_assert_eq!(datagram.len(), HEADER_LEN + payload.len());

        let decoded = PacketHeader::decode(&datagram);
        let mut zeroed = datagram.clone();
        zeroed[8..12].fill(0);
        let expected_crc = crc32fast::hash(&zeroed);
        prop_assert_eq!(decoded.map(|h| h.crc32), Ok(expected_crc));
    }

    #[test]
    fn state_encoding_is_fixed_width(seq in any::<u32>(), x in any::<u8>(), y in any::<u8>()) {
        let state = ControllerState {
            connected: true,
            packet_seq: seq,
            left_stick_x: x,
            left_stick_y: y,
            ..ControllerState::default()
        };
        let encoded = state.encode();
        prop_assert_eq!(&encoded[1..5], &seq.to_le_bytes()[..]);
        prop_assert_eq!(encoded[9], x);
        prop_assert_eq!(encoded[10], y);
    }

    #[test]
    fn descriptor_slot_passes_through(slot in any::<u8>(), mac in any::<u64>()) {
        let desc = ControllerDescriptor { slot, mac, ..ControllerDescriptor::default() };
        let encoded = desc.encode();
        prop_assert_eq!(encoded[0], slot);
        prop_assert_eq!(&encoded[4..10], &mac.to_le_bytes()[..6]);
    }
}
