//! Per-kind packet queue
//!
//! Transports push packets from whatever thread they deliver on; the session
//! pops them from its own thread. Each packet kind has its own FIFO lane so a
//! burst of ACL data never delays an event read.

use crate::error::{HciError, Result};
use crate::hci::packet::{Packet, PacketKind};
use log::trace;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Default)]
struct Lane {
    packets: Mutex<VecDeque<Packet>>,
    available: Condvar,
}

impl Lane {
    fn lock(&self) -> MutexGuard<'_, VecDeque<Packet>> {
        self.packets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Thread-safe queue bridging asynchronous delivery to blocking reads
#[derive(Debug, Default)]
pub struct EventQueue {
    lanes: [Lane; PacketKind::ALL.len()],
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lane(&self, kind: PacketKind) -> &Lane {
        &self.lanes[kind.index()]
    }

    /// Enqueue a packet on the lane of its kind and wake one reader
    pub fn push(&self, packet: Packet) {
        let lane = self.lane(packet.kind());
        trace!("queue {:?}: push {} bytes", packet.kind(), packet.len());
        lane.lock().push_back(packet);
        lane.available.notify_one();
    }

    /// Block until a packet of `kind` is available and remove it
    pub fn pop(&self, kind: PacketKind) -> Packet {
        let lane = self.lane(kind);
        let mut packets = lane.lock();
        loop {
            if let Some(packet) = packets.pop_front() {
                return packet;
            }
            packets = lane
                .available
                .wait(packets)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`pop`](Self::pop), giving up with [`HciError::Timeout`] once
    /// `timeout` has elapsed. `None` waits forever.
    pub fn pop_timeout(&self, kind: PacketKind, timeout: Option<Duration>) -> Result<Packet> {
        let Some(timeout) = timeout else {
            return Ok(self.pop(kind));
        };

        let lane = self.lane(kind);
        let (mut packets, _) = lane
            .available
            .wait_timeout_while(lane.lock(), timeout, |packets| packets.is_empty())
            .unwrap_or_else(PoisonError::into_inner);

        packets.pop_front().ok_or(HciError::Timeout(timeout))
    }

    /// Remove the oldest packet of `kind` without waiting
    pub fn try_pop(&self, kind: PacketKind) -> Option<Packet> {
        self.lane(kind).lock().pop_front()
    }

    pub fn len(&self, kind: PacketKind) -> usize {
        self.lane(kind).lock().len()
    }

    pub fn is_empty(&self, kind: PacketKind) -> bool {
        self.lane(kind).lock().is_empty()
    }

    /// Drop everything queued on the lane of `kind`, returning how many
    /// packets were dropped
    pub fn drain(&self, kind: PacketKind) -> usize {
        let mut packets = self.lane(kind).lock();
        let dropped = packets.len();
        packets.clear();
        dropped
    }

    /// Drop everything still queued on every lane
    pub fn clear(&self) {
        for lane in &self.lanes {
            lane.lock().clear();
        }
    }
}
