//! Transport seams
//!
//! A transport sends encoded commands to the controller and delivers
//! whatever the controller sends back into an [`EventQueue`]. The raw socket
//! transport lives in [`crate::hci::socket`]; platform HAL bindings drive a
//! [`PacketDispatcher`] through the [`HciCallbacks`] trait.

use crate::error::{HciError, Result};
use crate::hci::packet::{Packet, PacketKind};
use crate::hci::queue::EventQueue;
use crate::session::SessionState;
use log::{debug, error, info};
use std::sync::Arc;

/// Outbound half of a controller connection
pub trait HciTransport {
    /// Send one encoded command (opcode, length, parameters)
    fn send_command(&self, command: &[u8]) -> Result<()>;

    /// Release the connection. Further sends may fail.
    fn close(&self) -> Result<()> {
        Ok(())
    }
}

impl<T: HciTransport + ?Sized> HciTransport for Box<T> {
    fn send_command(&self, command: &[u8]) -> Result<()> {
        (**self).send_command(command)
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }
}

/// Inbound callbacks invoked by a HAL-style transport on its own thread
pub trait HciCallbacks: Send + Sync {
    fn initialization_complete(&self, success: bool);
    fn hci_event_received(&self, event: &[u8]);
    fn acl_data_received(&self, data: &[u8]);
    fn sco_data_received(&self, data: &[u8]);
    fn iso_data_received(&self, data: &[u8]);
}

/// Routes delivered packets into a session's queue
#[derive(Debug, Clone)]
pub struct PacketDispatcher {
    queue: Arc<EventQueue>,
    state: Arc<SessionState>,
}

impl PacketDispatcher {
    pub fn new(queue: Arc<EventQueue>, state: Arc<SessionState>) -> Self {
        Self { queue, state }
    }

    /// Copy `data` into a packet and enqueue it
    pub fn deliver(&self, kind: PacketKind, data: &[u8]) {
        self.deliver_packet(Packet::new(kind, data.to_vec()));
    }

    pub fn deliver_packet(&self, packet: Packet) {
        debug!("<- {:?}: {}", packet.kind(), hex::encode(packet.data()));
        self.queue.push(packet);
    }

    /// The transport can no longer deliver; the session is closed
    pub fn transport_lost(&self, err: &HciError) {
        error!("HCI transport lost: {}", err);
        self.state.set_initialized(false);
    }
}

impl HciCallbacks for PacketDispatcher {
    fn initialization_complete(&self, success: bool) {
        if success {
            info!("HCI init OK");
        } else {
            error!("HCI init failed");
        }
        self.state.set_initialized(success);
    }

    fn hci_event_received(&self, event: &[u8]) {
        self.deliver(PacketKind::Event, event);
    }

    fn acl_data_received(&self, data: &[u8]) {
        self.deliver(PacketKind::Acl, data);
    }

    fn sco_data_received(&self, data: &[u8]) {
        self.deliver(PacketKind::Sco, data);
    }

    fn iso_data_received(&self, data: &[u8]) {
        self.deliver(PacketKind::Iso, data);
    }
}
