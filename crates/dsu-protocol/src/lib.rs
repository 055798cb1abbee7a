//! DSU ("cemuhook") wire protocol encoding and decoding.
//!
//! This crate is intentionally I/O-free: it provides pure functions and types
//! for the binary packet layouts exchanged between a DSU server and its
//! clients (Dolphin and other emulator frontends), so the codec can be tested
//! and fuzzed without sockets or hardware.
//!
//! All multi-byte integers are little-endian. Every datagram in either
//! direction starts with the fixed 20-byte [`PacketHeader`]; replies carrying
//! controller identity append a [`ControllerDescriptor`], and pad-data
//! replies follow the descriptor with a [`ControllerState`] block.

#![deny(static_mut_refs)]

pub mod error;
pub mod header;
pub mod report;
pub mod types;

pub use error::{ProtocolError, ProtocolResult};
pub use header::{
    HEADER_LEN, MAGIC_CLIENT, MAGIC_SERVER, MAX_DATAGRAM_LEN, PROTOCOL_VERSION, PacketHeader,
    build_packet,
};
pub use report::{CONTROLLER_STATE_LEN, DESCRIPTOR_LEN, ControllerDescriptor, ControllerState};
pub use types::{BatteryStatus, ConnectionType, DeviceModel, MessageType, RegistrationType, SlotState};
