//! The device-source capability trait.

use anyhow::Result;
use async_trait::async_trait;
use padbridge_dsu_protocol::{BatteryStatus, ConnectionType, ControllerState, DeviceModel, SlotState};

/// A thing that can report controller state to the protocol server.
///
/// Identity accessors and [`current_state`](DeviceSource::current_state) are
/// plain in-memory reads; implementations must never block the caller on
/// device I/O. Background activity (transports, read loops) belongs behind
/// [`start`](DeviceSource::start), which may return before the first reading
/// is available.
#[async_trait]
pub trait DeviceSource: Send + Sync {
    /// Begin whatever background activity the backend needs.
    async fn start(&self) -> Result<()>;

    fn battery_status(&self) -> BatteryStatus;

    fn device_model(&self) -> DeviceModel;

    fn connection_type(&self) -> ConnectionType;

    fn slot_state(&self) -> SlotState;

    fn is_connected(&self) -> bool {
        self.slot_state() == SlotState::Connected
    }

    /// The latest available reading, stamped with the given sequence number.
    ///
    /// Returns a zero-valued state when no reading has ever arrived.
    fn current_state(&self, packet_seq: u32) -> ControllerState;
}
