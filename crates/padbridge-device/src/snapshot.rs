//! Raw device readings and the latest-snapshot handoff cell.

use padbridge_dsu_protocol::ControllerState;
use tokio::sync::watch;

/// Most recent parsed reading from a physical device.
///
/// Axis values are in the device's native range (a 10-bit ADC on the
/// reference hardware); buttons are plain digital states. A zero-valued
/// snapshot stands in until the first successful parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceInputSnapshot {
    pub x: i32,
    pub y: i32,
    pub button_a: bool,
    pub button_b: bool,
    pub button_joy: bool,
}

impl DeviceInputSnapshot {
    /// Build the wire-level state block from this reading.
    ///
    /// Stick axes divide by 4 to map the native range onto a byte (512
    /// center becomes 128), clamped rather than wrapped for out-of-range
    /// readings; digital buttons become full-scale analog values.
    pub fn to_controller_state(self, connected: bool, packet_seq: u32) -> ControllerState {
        ControllerState {
            connected,
            packet_seq,
            left_stick_x: scale_axis(self.x),
            left_stick_y: scale_axis(self.y),
            analog_a: button_analog(self.button_a),
            analog_b: button_analog(self.button_b),
            analog_l1: button_analog(self.button_joy),
        }
    }
}

/// Map a native axis reading onto the protocol's byte range.
pub fn scale_axis(raw: i32) -> u8 {
    (raw / 4).clamp(0, 255) as u8
}

fn button_analog(pressed: bool) -> u8 {
    if pressed { u8::MAX } else { 0 }
}

/// Create the single-slot snapshot handoff.
///
/// The publisher side belongs to a backend's read loop; readers are cheap to
/// clone and always observe either the previous complete snapshot or the new
/// complete one, never a torn mix.
pub fn snapshot_cell() -> (SnapshotPublisher, SnapshotReader) {
    let (tx, rx) = watch::channel(DeviceInputSnapshot::default());
    (SnapshotPublisher { tx }, SnapshotReader { rx })
}

/// Write side of the snapshot handoff.
#[derive(Debug)]
pub struct SnapshotPublisher {
    tx: watch::Sender<DeviceInputSnapshot>,
}

impl SnapshotPublisher {
    /// Overwrite the cell with a new complete reading.
    pub fn publish(&self, snapshot: DeviceInputSnapshot) {
        self.tx.send_replace(snapshot);
    }
}

/// Read side of the snapshot handoff.
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    rx: watch::Receiver<DeviceInputSnapshot>,
}

impl SnapshotReader {
    /// The most recently published reading, or the zero default before any.
    pub fn latest(&self) -> DeviceInputSnapshot {
        *self.rx.borrow()
    }
}
