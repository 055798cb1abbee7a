//! Controller identity and pad-data block layouts.

use crate::types::{BatteryStatus, ConnectionType, DeviceModel, SlotState};

/// Encoded size of a [`ControllerDescriptor`], trailing terminator excluded.
pub const DESCRIPTOR_LEN: usize = 11;
/// Encoded size of a [`ControllerState`] block.
pub const CONTROLLER_STATE_LEN: usize = 69;

const OFF_SLOT: usize = 0;
const OFF_SLOT_STATE: usize = 1;
const OFF_DEVICE_MODEL: usize = 2;
const OFF_CONNECTION_TYPE: usize = 3;
const OFF_MAC: usize = 4; // 48-bit little-endian
const OFF_BATTERY: usize = 10;

/// Per-slot identity block sent in listing and pad-data replies.
///
/// Listing replies append one zero terminator byte after this block;
/// pad-data replies follow it immediately with a [`ControllerState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControllerDescriptor {
    pub slot: u8,
    pub slot_state: SlotState,
    pub device_model: DeviceModel,
    pub connection_type: ConnectionType,
    /// Device MAC address, low 48 bits on the wire; zero when not applicable.
    pub mac: u64,
    pub battery: BatteryStatus,
}

impl ControllerDescriptor {
    pub fn encode(&self) -> [u8; DESCRIPTOR_LEN] {
        let mut out = [0u8; DESCRIPTOR_LEN];
        out[OFF_SLOT] = self.slot;
        out[OFF_SLOT_STATE] = self.slot_state.wire_value();
        out[OFF_DEVICE_MODEL] = self.device_model.wire_value();
        out[OFF_CONNECTION_TYPE] = self.connection_type.wire_value();
        out[OFF_MAC..OFF_MAC + 6].copy_from_slice(&self.mac.to_le_bytes()[..6]);
        out[OFF_BATTERY] = self.battery.wire_value();
        out
    }
}

// Pad-data block layout, relative to the end of the descriptor:
//   0      connected flag
//   1..5   packet sequence number (u32)
//   5..9   button bitmasks, HOME, touch button
//   9..13  left stick x/y, right stick x/y
//   13..17 analog d-pad left/down/right/up
//   17..21 analog Y/B/A/X
//   21..25 analog R1/L1/R2/L2
//   25..37 two 6-byte touch blocks
//   37..45 motion timestamp (u64 microseconds)
//   45..57 accelerometer x/y/z (f32)
//   57..69 gyro pitch/yaw/roll (f32)
// Only the fields below are driven by a stick-and-buttons device; the rest
// of the block is emitted as zero.
const OFF_CONNECTED: usize = 0;
const OFF_PACKET_SEQ: usize = 1;
const OFF_LEFT_STICK_X: usize = 9;
const OFF_LEFT_STICK_Y: usize = 10;
const OFF_ANALOG_B: usize = 18;
const OFF_ANALOG_A: usize = 19;
const OFF_ANALOG_L1: usize = 22;

/// Live input payload for one pad-data reply.
///
/// Stick axes use 128 for center, and digital buttons map onto the
/// protocol's analog pressure fields as 255/0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControllerState {
    pub connected: bool,
    /// Server-scoped send tally, not a per-slot sequence.
    pub packet_seq: u32,
    pub left_stick_x: u8,
    pub left_stick_y: u8,
    pub analog_a: u8,
    pub analog_b: u8,
    pub analog_l1: u8,
}

impl ControllerState {
    pub fn encode(&self) -> [u8; CONTROLLER_STATE_LEN] {
        let mut out = [0u8; CONTROLLER_STATE_LEN];
        out[OFF_CONNECTED] = u8::from(self.connected);
        out[OFF_PACKET_SEQ..OFF_PACKET_SEQ + 4].copy_from_slice(&self.packet_seq.to_le_bytes());
        out[OFF_LEFT_STICK_X] = self.left_stick_x;
        out[OFF_LEFT_STICK_Y] = self.left_stick_y;
        out[OFF_ANALOG_A] = self.analog_a;
        out[OFF_ANALOG_B] = self.analog_b;
        out[OFF_ANALOG_L1] = self.analog_l1;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Documentation offsets for the zero-filled regions of the block.
    const OFF_BUTTONS_1: usize = 5;
    const OFF_TOUCH_BUTTON: usize = 8;
    const OFF_RIGHT_STICK_X: usize = 11;
    const OFF_RIGHT_STICK_Y: usize = 12;
    const OFF_ANALOG_DPAD_LEFT: usize = 13;
    const OFF_ANALOG_Y: usize = 17;
    const OFF_ANALOG_X: usize = 20;
    const OFF_ANALOG_R1: usize = 21;
    const OFF_ANALOG_R2: usize = 23;
    const OFF_ANALOG_L2: usize = 24;
    const OFF_TOUCH_1: usize = 25;
    const OFF_MOTION_TIMESTAMP: usize = 37;
    const OFF_ACCEL: usize = 45;
    const OFF_GYRO: usize = 57;

    #[test]
    fn test_descriptor_layout() {
        let desc = ControllerDescriptor {
            slot: 3,
            slot_state: SlotState::Connected,
            device_model: DeviceModel::NotApplicable,
            connection_type: ConnectionType::Usb,
            mac: 0x0000_AABB_CCDD_EEFF,
            battery: BatteryStatus::Charged,
        };
        let encoded = desc.encode();
        assert_eq!(encoded.len(), DESCRIPTOR_LEN);
        assert_eq!(encoded[0], 3);
        assert_eq!(encoded[1], 2);
        assert_eq!(encoded[2], 0);
        assert_eq!(encoded[3], 1);
        assert_eq!(&encoded[4..10], &[0xFF, 0xEE, 0xDD, 0xCC, 0xBB, 0xAA]);
        assert_eq!(encoded[10], 0xEF);
    }

    #[test]
    fn test_descriptor_default_is_all_zero() {
        assert_eq!(ControllerDescriptor::default().encode(), [0u8; DESCRIPTOR_LEN]);
    }

    #[test]
    fn test_state_layout() {
        let state = ControllerState {
            connected: true,
            packet_seq: 0x0102_0304,
            left_stick_x: 128,
            left_stick_y: 120,
            analog_a: 255,
            analog_b: 0,
            analog_l1: 255,
        };
        let encoded = state.encode();
        assert_eq!(encoded.len(), CONTROLLER_STATE_LEN);
        assert_eq!(encoded[OFF_CONNECTED], 1);
        assert_eq!(&encoded[OFF_PACKET_SEQ..OFF_PACKET_SEQ + 4], &[4, 3, 2, 1]);
        assert_eq!(encoded[OFF_LEFT_STICK_X], 128);
        assert_eq!(encoded[OFF_LEFT_STICK_Y], 120);
        assert_eq!(encoded[OFF_ANALOG_A], 255);
        assert_eq!(encoded[OFF_ANALOG_B], 0);
        assert_eq!(encoded[OFF_ANALOG_L1], 255);
    }

    #[test]
    fn test_state_unused_fields_stay_zero() {
        let state = ControllerState {
            connected: true,
            packet_seq: u32::MAX,
            left_stick_x: 255,
            left_stick_y: 255,
            analog_a: 255,
            analog_b: 255,
            analog_l1: 255,
        };
        let encoded = state.encode();
        for off in [
            OFF_BUTTONS_1,
            OFF_BUTTONS_1 + 1,
            OFF_TOUCH_BUTTON - 1,
            OFF_TOUCH_BUTTON,
            OFF_RIGHT_STICK_X,
            OFF_RIGHT_STICK_Y,
            OFF_ANALOG_DPAD_LEFT,
            OFF_ANALOG_DPAD_LEFT + 1,
            OFF_ANALOG_DPAD_LEFT + 2,
            OFF_ANALOG_DPAD_LEFT + 3,
            OFF_ANALOG_Y,
            OFF_ANALOG_X,
            OFF_ANALOG_R1,
            OFF_ANALOG_R2,
            OFF_ANALOG_L2,
        ] {
            assert_eq!(encoded[off], 0, "offset {off} should be unpopulated");
        }
        assert!(encoded[OFF_TOUCH_1..OFF_MOTION_TIMESTAMP].iter().all(|&b| b == 0));
        assert!(encoded[OFF_MOTION_TIMESTAMP..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_block_sizes_match_protocol() {
        // Gyro is the last field group: 12 bytes ending the block.
        assert_eq!(OFF_GYRO + 12, CONTROLLER_STATE_LEN);
        assert_eq!(OFF_ACCEL + 12, OFF_GYRO);
        // Full pad-data datagram: header + descriptor + state = 100 bytes.
        assert_eq!(
            crate::HEADER_LEN + DESCRIPTOR_LEN + CONTROLLER_STATE_LEN,
            100
        );
    }
}
