//! Serial-attached microcontroller backend.
//!
//! Bridges a line-oriented serial stream (an Arduino with a joystick shield
//! on the reference hardware) into the [`DeviceSource`] capability. A
//! dedicated reader thread accumulates bytes from the port, splits them on
//! newlines, parses each line, and publishes the most recent reading through
//! the snapshot handoff; the protocol server picks it up on demand without
//! ever touching the port.

#![deny(static_mut_refs)]

mod parser;

use std::io::{ErrorKind, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serialport::{DataBits, FlowControl, Parity, StopBits};
use tracing::{debug, error, info, warn};

use padbridge_device::{
    DeviceInputSnapshot, DeviceSource, SnapshotPublisher, SnapshotReader, snapshot_cell,
};
use padbridge_dsu_protocol::{BatteryStatus, ConnectionType, ControllerState, DeviceModel, SlotState};

/// Default baud rate of the reference firmware.
pub const DEFAULT_BAUD: u32 = 9600;

/// Short read timeout so the loop stays responsive to shutdown.
const READ_TIMEOUT: Duration = Duration::from_millis(50);
/// Discard threshold for a stream that never produces a newline.
const LINE_BUFFER_CAP: usize = 4096;

/// Serial port parameters; framing is fixed at 8N1 with no flow control.
#[derive(Debug, Clone)]
pub struct SerialBridgeConfig {
    pub path: String,
    pub baud: u32,
}

impl SerialBridgeConfig {
    pub fn new(path: impl Into<String>, baud: u32) -> Self {
        Self { path: path.into(), baud }
    }
}

/// Reference [`DeviceSource`] reading newline-delimited records from a
/// serial transport.
#[derive(Debug)]
pub struct SerialBridge {
    config: SerialBridgeConfig,
    publisher: Arc<SnapshotPublisher>,
    reader: SnapshotReader,
    shutdown: Arc<AtomicBool>,
    started: AtomicBool,
}

impl SerialBridge {
    pub fn new(config: SerialBridgeConfig) -> Self {
        let (publisher, reader) = snapshot_cell();
        Self {
            config,
            publisher: Arc::new(publisher),
            reader,
            shutdown: Arc::new(AtomicBool::new(false)),
            started: AtomicBool::new(false),
        }
    }

    /// Signal the reader thread to exit; it notices within one read timeout.
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

impl Drop for SerialBridge {
    fn drop(&mut self) {
        self.stop();
    }
}

#[async_trait]
impl DeviceSource for SerialBridge {
    /// Open the port and launch the reader thread.
    ///
    /// Returns once the transport is open; the first parsed reading arrives
    /// asynchronously, and until then [`current_state`](DeviceSource::current_state)
    /// reports the zero default.
    async fn start(&self) -> Result<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let config = self.config.clone();
        let port = tokio::task::spawn_blocking(move || {
            serialport::new(config.path.as_str(), config.baud)
                .data_bits(DataBits::Eight)
                .parity(Parity::None)
                .stop_bits(StopBits::One)
                .flow_control(FlowControl::None)
                .timeout(READ_TIMEOUT)
                .open()
        })
        .await
        .context("serial open task aborted")?
        .with_context(|| {
            format!(
                "failed to open serial port {} at {} baud",
                self.config.path, self.config.baud
            )
        })?;

        info!(path = %self.config.path, baud = self.config.baud, "serial port opened");

        let publisher = Arc::clone(&self.publisher);
        let shutdown = Arc::clone(&self.shutdown);
        std::thread::Builder::new()
            .name("serial-reader".into())
            .spawn(move || read_loop(port, &publisher, &shutdown))
            .context("failed to spawn serial reader thread")?;
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

/// Blocking read loop; the transport closes when `port` drops on exit.
///
/// Generic over [`Read`] so the line-assembly path is testable with an
/// in-memory stream.
fn read_loop<R: Read>(mut port: R, publisher: &SnapshotPublisher, shutdown: &AtomicBool) {
    let mut chunk = [0u8; 256];
    let mut pending: Vec<u8> = Vec::with_capacity(LINE_BUFFER_CAP);

    while !shutdown.load(Ordering::Relaxed) {
        match port.read(&mut chunk) {
            Ok(0) => {
                info!("serial stream ended");
                break;
            }
            Ok(n) => {
                pending.extend_from_slice(&chunk[..n]);
                drain_lines(&mut pending, publisher);
                if pending.len() > LINE_BUFFER_CAP {
                    warn!(len = pending.len(), "discarding partial line without newline");
                    pending.clear();
                }
            }
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => {}
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => {
                error!("serial read failed, stopping reader: {e}");
                break;
            }
        }
    }
    debug!("serial reader exiting");
}

fn drain_lines(pending: &mut Vec<u8>, publisher: &SnapshotPublisher) {
    while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
        let line: Vec<u8> = pending.drain(..=pos).collect();
        let text = String::from_utf8_lossy(&line);
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        match parser::parse_input_line(text) {
            Some(snapshot) => {
                debug!(?snapshot, "device input");
                publisher.publish(snapshot);
            }
            None => {
                // A bad record resets to neutral rather than holding the
                // previous reading or failing the loop.
                warn!(line = %text, "unparseable input line, publishing neutral state");
                publisher.publish(DeviceInputSnapshot::default());
            }
        }
    }
}
