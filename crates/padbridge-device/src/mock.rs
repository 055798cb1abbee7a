//! Mock device source for testing and running the server without hardware.

use anyhow::Result;
use async_trait::async_trait;
use padbridge_dsu_protocol::{BatteryStatus, ConnectionType, ControllerState, DeviceModel, SlotState};

use crate::snapshot::{DeviceInputSnapshot, SnapshotPublisher, SnapshotReader, snapshot_cell};
use crate::source::DeviceSource;

/// Deterministic in-memory source; tests drive it via [`MockSource::publish`].
#[derive(Debug)]
pub struct MockSource {
    publisher: SnapshotPublisher,
    reader: SnapshotReader,
}

impl MockSource {
    pub fn new() -> Self {
        let (publisher, reader) = snapshot_cell();
        Self { publisher, reader }
    }

    /// Overwrite the current reading, as a device read loop would.
    pub fn publish(&self, snapshot: DeviceInputSnapshot) {
        self.publisher.publish(snapshot);
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceSource for MockSource {
    async fn start(&self) -> Result<()> {
        Ok(())
    }

    fn battery_status(&self) -> BatteryStatus {
        BatteryStatus::Charged
    }

    fn device_model(&self) -> DeviceModel {
        DeviceModel::NotApplicable
    }

    fn connection_type(&self) -> ConnectionType {
        ConnectionType::Usb
    }

    fn slot_state(&self) -> SlotState {
        SlotState::Connected
    }

    fn current_state(&self, packet_seq: u32) -> ControllerState {
        self.reader
            .latest()
            .to_controller_state(self.is_connected(), packet_seq)
    }
}
