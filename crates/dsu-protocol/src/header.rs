//! Packet header layout and datagram assembly.

use crate::error::{ProtocolError, ProtocolResult};

/// Protocol version implemented by this crate.
pub const PROTOCOL_VERSION: u16 = 1001;
/// Magic prefix of server-originated datagrams.
pub const MAGIC_SERVER: [u8; 4] = *b"DSUS";
/// Magic prefix of client-originated datagrams.
pub const MAGIC_CLIENT: [u8; 4] = *b"DSUC";
/// Fixed header size, message-type field included.
pub const HEADER_LEN: usize = 20;
/// Receive buffer size; no defined message comes close to this.
pub const MAX_DATAGRAM_LEN: usize = 1024;

const OFF_MAGIC: usize = 0;
const OFF_PROTOCOL_VERSION: usize = 4;
const OFF_PACKET_LENGTH: usize = 6;
const OFF_CRC32: usize = 8;
const OFF_SENDER_ID: usize = 12;
const OFF_MESSAGE_TYPE: usize = 16;

/// Fixed 20-byte prefix of every datagram.
///
/// `packet_length` counts everything after the CRC/sender-id block, i.e. the
/// message-type field plus the payload; the payload therefore spans
/// `packet_length - 4` bytes after the header. `message_type` is kept as the
/// raw wire value so unknown types survive decoding and can be ignored
/// downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub magic: [u8; 4],
    pub protocol_version: u16,
    pub packet_length: u16,
    pub crc32: u32,
    pub sender_id: u32,
    pub message_type: u32,
}

impl PacketHeader {
    /// Decode the fixed prefix of a received datagram.
    pub fn decode(data: &[u8]) -> ProtocolResult<Self> {
        if data.len() < HEADER_LEN {
            return Err(ProtocolError::TruncatedHeader { actual: data.len() });
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&data[OFF_MAGIC..OFF_MAGIC + 4]);
        Ok(PacketHeader {
            magic,
            protocol_version: read_u16_le(data, OFF_PROTOCOL_VERSION),
            packet_length: read_u16_le(data, OFF_PACKET_LENGTH),
            crc32: read_u32_le(data, OFF_CRC32),
            sender_id: read_u32_le(data, OFF_SENDER_ID),
            message_type: read_u32_le(data, OFF_MESSAGE_TYPE),
        })
    }

    /// Serialize in wire field order. The length field is whatever the caller
    /// stored; it is not derived here.
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[OFF_MAGIC..OFF_MAGIC + 4].copy_from_slice(&self.magic);
        out[OFF_PROTOCOL_VERSION..OFF_PROTOCOL_VERSION + 2]
            .copy_from_slice(&self.protocol_version.to_le_bytes());
        out[OFF_PACKET_LENGTH..OFF_PACKET_LENGTH + 2]
            .copy_from_slice(&self.packet_length.to_le_bytes());
        out[OFF_CRC32..OFF_CRC32 + 4].copy_from_slice(&self.crc32.to_le_bytes());
        out[OFF_SENDER_ID..OFF_SENDER_ID + 4].copy_from_slice(&self.sender_id.to_le_bytes());
        out[OFF_MESSAGE_TYPE..OFF_MESSAGE_TYPE + 4]
            .copy_from_slice(&self.message_type.to_le_bytes());
        out
    }

    /// Whether this datagram came from a DSU client.
    pub fn has_client_magic(&self) -> bool {
        self.magic == MAGIC_CLIENT
    }
}

/// Assemble a complete datagram: header, then payload, then the CRC-32 of the
/// whole datagram stamped into the header's CRC slot (computed with that slot
/// zeroed, per the DSU convention).
///
/// Payload length is not validated against `header.packet_length`; keeping
/// the two consistent is the caller's responsibility.
pub fn build_packet(header: &PacketHeader, payload: &[u8]) -> Vec<u8> {
    let mut datagram = Vec::with_capacity(HEADER_LEN + payload.len());
    let zeroed = PacketHeader { crc32: 0, ..*header };
    datagram.extend_from_slice(&zeroed.encode());
    datagram.extend_from_slice(payload);
    let crc = crc32fast::hash(&datagram);
    datagram[OFF_CRC32..OFF_CRC32 + 4].copy_from_slice(&crc.to_le_bytes());
    datagram
}

fn read_u16_le(data: &[u8], offset: usize) -> u16 {
    data.get(offset..offset + 2)
        .and_then(|b| b.try_into().ok())
        .map(u16::from_le_bytes)
        .unwrap_or(0)
}

fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    data.get(offset..offset + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageType;

    fn sample_header() -> PacketHeader {
        PacketHeader {
            magic: MAGIC_SERVER,
            protocol_version: PROTOCOL_VERSION,
            packet_length: 84,
            crc32: 0xDEAD_BEEF,
            sender_id: 0x1234_5678,
            message_type: MessageType::ControllerData.wire_value(),
        }
    }

    #[test]
    fn test_header_round_trip() -> Result<(), Box<dyn std::error::Error>> {
        let header = sample_header();
        let decoded = PacketHeader::decode(&header.encode())?;
        assert_eq!(decoded, header);
        Ok(())
    }

    #[test]
    fn test_header_field_offsets() {
        let encoded = sample_header().encode();
        assert_eq!(&encoded[0..4], b"DSUS");
        assert_eq!(u16::from_le_bytes([encoded[4], encoded[5]]), 1001);
        assert_eq!(u16::from_le_bytes([encoded[6], encoded[7]]), 84);
        assert_eq!(
            u32::from_le_bytes([encoded[8], encoded[9], encoded[10], encoded[11]]),
            0xDEAD_BEEF
        );
        assert_eq!(
            u32::from_le_bytes([encoded[12], encoded[13], encoded[14], encoded[15]]),
            0x1234_5678
        );
        assert_eq!(
            u32::from_le_bytes([encoded[16], encoded[17], encoded[18], encoded[19]]),
            0x0010_0002
        );
    }

    #[test]
    fn test_decode_short_buffer_rejected() {
        let err = PacketHeader::decode(&[0u8; 19]);
        assert_eq!(err, Err(ProtocolError::TruncatedHeader { actual: 19 }));
        assert!(PacketHeader::decode(&[]).is_err());
    }

    #[test]
    fn test_decode_accepts_trailing_payload() -> Result<(), Box<dyn std::error::Error>> {
        let mut data = sample_header().encode().to_vec();
        data.extend_from_slice(&[0xAA; 40]);
        let decoded = PacketHeader::decode(&data)?;
        assert_eq!(decoded.packet_length, 84);
        Ok(())
    }

    #[test]
    fn test_build_packet_stamps_crc() -> Result<(), Box<dyn std::error::Error>> {
        let header = sample_header();
        let payload = [1u8, 2, 3, 4];
        let datagram = build_packet(&header, &payload);
        assert_eq!(datagram.len(), HEADER_LEN + payload.len());

        let decoded = PacketHeader::decode(&datagram)?;
        let mut zeroed = datagram.clone();
        zeroed[8..12].fill(0);
        assert_eq!(decoded.crc32, crc32fast::hash(&zeroed));
        // Remaining fields pass through untouched.
        assert_eq!(decoded.sender_id, header.sender_id);
        assert_eq!(&datagram[HEADER_LEN..], &payload[..]);
        Ok(())
    }

    #[test]
    fn test_client_magic_check() {
        let mut header = sample_header();
        assert!(!header.has_client_magic());
        header.magic = MAGIC_CLIENT;
        assert!(header.has_client_magic());
    }
}
