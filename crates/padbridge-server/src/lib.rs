//! DSU protocol server.
//!
//! Owns the UDP socket and answers the three request kinds a DSU client
//! sends: protocol version inquiries, connected-controller listings, and
//! live pad-data requests. Replies are built from whatever snapshot the
//! active [`DeviceSource`] currently publishes; the receive loop never waits
//! on device I/O.

#![deny(static_mut_refs)]

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tracing::{debug, error, info, trace};

use padbridge_device::DeviceSource;
use padbridge_dsu_protocol::{
    CONTROLLER_STATE_LEN, ControllerDescriptor, DESCRIPTOR_LEN, HEADER_LEN, MAGIC_SERVER,
    MAX_DATAGRAM_LEN, MessageType, PROTOCOL_VERSION, PacketHeader, RegistrationType, build_packet,
};

/// Default DSU server port expected by emulator clients.
pub const DEFAULT_PORT: u16 = 26760;

/// Width of the message-type field counted by the header's length field.
const MESSAGE_TYPE_LEN: usize = 4;

/// Requests shutdown of a running [`DsuServer`]; cheap to clone.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }
}

/// The protocol server: one bound socket, one random per-instance identity,
/// and one outbound packet counter shared across all peers and slots.
pub struct DsuServer {
    socket: UdpSocket,
    server_id: u32,
    packet_counter: u32,
    source: Arc<dyn DeviceSource>,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl DsuServer {
    /// Bind on all interfaces at `port` (0 picks an ephemeral port).
    pub async fn bind(port: u16, source: Arc<dyn DeviceSource>) -> Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, port))
            .await
            .with_context(|| format!("failed to bind UDP port {port}"))?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let server = Self {
            socket,
            server_id: rand::random::<u32>(),
            packet_counter: 0,
            source,
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
        };
        info!(
            addr = %server.socket.local_addr().map_or_else(|_| "?".into(), |a| a.to_string()),
            server_id = server.server_id,
            "DSU server listening"
        );
        Ok(server)
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().context("socket has no local address")
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle { tx: Arc::clone(&self.shutdown_tx) }
    }

    /// Total replies sent so far.
    pub fn packets_sent(&self) -> u32 {
        self.packet_counter
    }

    /// Receive loop. Returns `Ok(())` on requested shutdown; a fatal socket
    /// error is logged and propagated, and the server does not restart
    /// itself.
    pub async fn run(mut self) -> Result<()> {
        let mut shutdown = self.shutdown_rx.clone();
        let mut buf = [0u8; MAX_DATAGRAM_LEN];
        loop {
            let (len, peer) = tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow_and_update() {
                        info!("shutdown requested, stopping server");
                        return Ok(());
                    }
                    continue;
                }
                recv = self.socket.recv_from(&mut buf) => match recv {
                    Ok(pair) => pair,
                    Err(e) => {
                        error!("socket receive failed, stopping server: {e}");
                        return Err(e.into());
                    }
                },
            };
            if let Err(e) = self.handle_datagram(&buf[..len], peer).await {
                error!("reply send failed, stopping server: {e}");
                return Err(e);
            }
        }
    }

    async fn handle_datagram(&mut self, data: &[u8], peer: SocketAddr) -> Result<()> {
        let Ok(header) = PacketHeader::decode(data) else {
            debug!(len = data.len(), %peer, "dropping short datagram");
            return Ok(());
        };
        if !header.has_client_magic() {
            debug!(magic = ?header.magic, %peer, "dropping datagram without client magic");
            return Ok(());
        }

        // The header declares how much payload follows the message type, but
        // only the bytes that actually arrived may be sliced.
        let declared = usize::from(header.packet_length).saturating_sub(MESSAGE_TYPE_LEN);
        let available = data.len() - HEADER_LEN;
        if declared > available {
            debug!(declared, available, %peer, "declared payload exceeds datagram, clamping");
        }
        let payload = data
            .get(HEADER_LEN..HEADER_LEN + declared.min(available))
            .unwrap_or(&[]);

        match MessageType::from_wire(header.message_type) {
            Some(MessageType::ProtocolVersionInfo) => self.handle_version_info(peer).await,
            Some(MessageType::ConnectedControllersInfo) => {
                self.handle_controllers_info(payload, peer).await
            }
            Some(MessageType::ControllerData) => self.handle_controller_data(payload, peer).await,
            None => {
                debug!(message_type = header.message_type, %peer, "ignoring unknown message type");
                Ok(())
            }
        }
    }

    async fn handle_version_info(&mut self, peer: SocketAddr) -> Result<()> {
        let payload = PROTOCOL_VERSION.to_le_bytes();
        let header = self.reply_header(MessageType::ProtocolVersionInfo, payload.len());
        self.send_reply(&header, &payload, peer).await
    }

    /// Payload: u32 count, then that many slot index bytes. One reply per
    /// requested slot, each carrying the single supported device's identity
    /// under the requested slot number.
    async fn handle_controllers_info(&mut self, payload: &[u8], peer: SocketAddr) -> Result<()> {
        let count = read_u32_le(payload, 0) as usize;
        let slots = payload.get(4..).unwrap_or(&[]);
        if count > slots.len() {
            debug!(count, present = slots.len(), %peer, "slot list shorter than declared count");
        }
        for &slot in slots.iter().take(count) {
            let mut body = Vec::with_capacity(DESCRIPTOR_LEN + 1);
            body.extend_from_slice(&self.descriptor_for(slot).encode());
            body.push(0); // descriptor terminator
            let header = self.reply_header(MessageType::ConnectedControllersInfo, body.len());
            self.send_reply(&header, &body, peer).await?;
        }
        Ok(())
    }

    /// Payload byte 0 selects the registration type, byte 1 the slot to
    /// report. Registration types without a handler get no reply at all.
    async fn handle_controller_data(&mut self, payload: &[u8], peer: SocketAddr) -> Result<()> {
        let Some(&registration) = payload.first() else {
            return Ok(());
        };
        match RegistrationType::from_wire(registration) {
            Some(RegistrationType::AllControllers | RegistrationType::SlotBased) => {
                let slot = payload.get(1).copied().unwrap_or(0);
                let descriptor = self.descriptor_for(slot);
                let state = self.source.current_state(self.packet_counter);
                let mut body = Vec::with_capacity(DESCRIPTOR_LEN + CONTROLLER_STATE_LEN);
                body.extend_from_slice(&descriptor.encode());
                body.extend_from_slice(&state.encode());
                let header = self.reply_header(MessageType::ControllerData, body.len());
                self.send_reply(&header, &body, peer).await
            }
            other => {
                debug!(registration, ?other, %peer, "ignoring unhandled registration type");
                Ok(())
            }
        }
    }

    fn descriptor_for(&self, slot: u8) -> ControllerDescriptor {
        ControllerDescriptor {
            slot,
            slot_state: self.source.slot_state(),
            device_model: self.source.device_model(),
            connection_type: self.source.connection_type(),
            mac: 0,
            battery: self.source.battery_status(),
        }
    }

    fn reply_header(&self, message_type: MessageType, payload_len: usize) -> PacketHeader {
        PacketHeader {
            magic: MAGIC_SERVER,
            protocol_version: PROTOCOL_VERSION,
            packet_length: (MESSAGE_TYPE_LEN + payload_len) as u16,
            crc32: 0,
            sender_id: self.server_id,
            message_type: message_type.wire_value(),
        }
    }

    /// Every reply bumps the shared counter by exactly one, whatever the
    /// message type or peer.
    async fn send_reply(
        &mut self,
        header: &PacketHeader,
        payload: &[u8],
        peer: SocketAddr,
    ) -> Result<()> {
        let datagram = build_packet(header, payload);
        self.socket
            .send_to(&datagram, peer)
            .await
            .with_context(|| format!("failed to send reply to {peer}"))?;
        self.packet_counter = self.packet_counter.wrapping_add(1);
        trace!(%peer, len = datagram.len(), counter = self.packet_counter, "reply sent");
        Ok(())
    }
}

fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    data.get(offset..offset + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
        .unwrap_or(0)
}
