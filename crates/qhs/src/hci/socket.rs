//! HCI Socket implementation for Bluetooth communication
//!
//! This module provides a wrapper around the raw HCI socket interface and a
//! transport that reads the socket on a background thread, handing every
//! packet to a [`PacketDispatcher`].

use crate::error::{HciError, Result};
use crate::hci::constants::*;
use crate::hci::packet::Packet;
use crate::hci::transport::{HciTransport, PacketDispatcher};
use log::{error, warn};
use std::io::ErrorKind;
use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

// Bluetooth socket constants
const AF_BLUETOOTH: i32 = 31;
const BTPROTO_HCI: i32 = 1;
const HCI_CHANNEL_RAW: i32 = 0;
const SOL_HCI: i32 = 0;
const HCI_FILTER: i32 = 2;

// How often the reader thread checks whether it should stop
const READ_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Represents an HCI socket
#[derive(Debug)]
pub struct HciSocket {
    fd: RawFd,
}

// Define the sockaddr_hci structure
#[repr(C)]
struct SockaddrHci {
    hci_family: libc::sa_family_t,
    hci_dev: u16,
    hci_channel: u16,
}

// Define the hci_filter structure
#[repr(C)]
struct HciFilter {
    type_mask: u32,
    event_mask: [u32; 2],
    opcode: u16,
}

impl HciSocket {
    /// Gets the raw file descriptor for the socket
    pub fn as_raw_fd(&self) -> RawFd {
        self.fd
    }

    /// Opens a new HCI socket
    ///
    /// # Arguments
    ///
    /// * `dev_id` - The device ID to open (0 for `hci0`)
    ///
    /// # Returns
    ///
    /// A new `HciSocket` instance or an error if the socket could not be opened
    pub fn open(dev_id: u16) -> Result<Self> {
        // Open a raw HCI socket
        let fd = unsafe { libc::socket(AF_BLUETOOTH, libc::SOCK_RAW, BTPROTO_HCI) };

        if fd < 0 {
            return Err(HciError::SocketError(std::io::Error::last_os_error()));
        }

        // Bind to the specified device
        let addr = SockaddrHci {
            hci_family: AF_BLUETOOTH as libc::sa_family_t,
            hci_dev: dev_id,
            hci_channel: HCI_CHANNEL_RAW as u16,
        };

        let result = unsafe {
            libc::bind(
                fd,
                &addr as *const _ as *const libc::sockaddr,
                std::mem::size_of::<SockaddrHci>() as libc::socklen_t,
            )
        };

        if result < 0 {
            let err = std::io::Error::last_os_error();
            unsafe { libc::close(fd) };
            return Err(HciError::BindError(err));
        }

        Ok(HciSocket { fd })
    }

    /// Only pass event packets, all event codes, up to this socket
    pub fn set_event_filter(&self) -> Result<()> {
        let filter = HciFilter {
            type_mask: 1 << (HCI_EVENT_PKT as u32 & 0x1f),
            event_mask: [u32::MAX; 2],
            opcode: 0,
        };

        let result = unsafe {
            libc::setsockopt(
                self.fd,
                SOL_HCI,
                HCI_FILTER,
                &filter as *const _ as *const libc::c_void,
                std::mem::size_of::<HciFilter>() as libc::socklen_t,
            )
        };

        if result < 0 {
            return Err(HciError::SocketError(std::io::Error::last_os_error()));
        }
        Ok(())
    }

    /// Read one packet from the socket
    pub fn read_packet(&self) -> Result<Packet> {
        let mut buffer = [0u8; 1 + HCI_MAX_EVENT_SIZE];

        let bytes_read = unsafe {
            libc::read(
                self.fd,
                buffer.as_mut_ptr() as *mut libc::c_void,
                buffer.len(),
            )
        };

        if bytes_read < 0 {
            return Err(HciError::ReceiveError(std::io::Error::last_os_error()));
        }

        Packet::from_h4(&buffer[..bytes_read as usize])
    }

    /// Read one packet from the socket with a timeout
    pub fn read_packet_timeout(&self, timeout: Option<Duration>) -> Result<Packet> {
        if let Some(timeout) = timeout {
            // Set up the fd_set for select()
            let mut read_fds: libc::fd_set = unsafe { std::mem::zeroed() };
            unsafe {
                libc::FD_ZERO(&mut read_fds);
                libc::FD_SET(self.fd, &mut read_fds);
            }

            // Set up the timeout
            let mut timeout_val = libc::timeval {
                tv_sec: timeout.as_secs() as libc::time_t,
                tv_usec: timeout.subsec_micros() as libc::suseconds_t,
            };

            // Wait for data to be available
            let result = unsafe {
                libc::select(
                    self.fd + 1,
                    &mut read_fds,
                    std::ptr::null_mut(),
                    std::ptr::null_mut(),
                    &mut timeout_val,
                )
            };

            if result < 0 {
                return Err(HciError::ReceiveError(std::io::Error::last_os_error()));
            }

            if result == 0 {
                return Err(HciError::Timeout(timeout));
            }
        }

        self.read_packet()
    }

    /// Write an encoded command, prefixed with its H4 indicator
    pub fn write_command(&self, command: &[u8]) -> Result<()> {
        let mut packet = Vec::with_capacity(1 + command.len());
        packet.push(HCI_COMMAND_PKT);
        packet.extend_from_slice(command);

        match unsafe {
            libc::write(
                self.fd,
                packet.as_ptr() as *const libc::c_void,
                packet.len(),
            )
        } {
            -1 => Err(HciError::SendError(std::io::Error::last_os_error())),
            _ => Ok(()),
        }
    }
}

impl AsRawFd for HciSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Drop for HciSocket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}

/// Raw socket transport with a background reader thread
#[derive(Debug)]
pub struct SocketTransport {
    socket: Arc<HciSocket>,
    stop: Arc<AtomicBool>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl SocketTransport {
    /// Open `hci<dev_id>`, install the event filter and start delivering
    /// packets through `dispatcher`
    pub fn open(dev_id: u16, dispatcher: PacketDispatcher) -> Result<Self> {
        let socket = Arc::new(HciSocket::open(dev_id)?);
        socket.set_event_filter()?;

        let stop = Arc::new(AtomicBool::new(false));
        let reader = {
            let socket = Arc::clone(&socket);
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name(format!("hci{dev_id}-reader"))
                .spawn(move || read_loop(&socket, &dispatcher, &stop))?
        };

        Ok(Self {
            socket,
            stop,
            reader: Mutex::new(Some(reader)),
        })
    }

    pub fn socket(&self) -> &HciSocket {
        &self.socket
    }
}

fn read_loop(socket: &HciSocket, dispatcher: &PacketDispatcher, stop: &AtomicBool) {
    while !stop.load(Ordering::Acquire) {
        match socket.read_packet_timeout(Some(READ_POLL_INTERVAL)) {
            Ok(packet) => dispatcher.deliver_packet(packet),
            Err(HciError::InvalidPacketFormat) => {
                warn!("Dropping packet with unknown indicator");
            }
            Err(e) if is_transient(&e) => continue,
            Err(e) => {
                dispatcher.transport_lost(&e);
                break;
            }
        }
    }
}

/// Whether the reader can keep reading after `err`
fn is_transient(err: &HciError) -> bool {
    match err {
        HciError::Timeout(_) | HciError::InvalidPacketFormat => true,
        HciError::ReceiveError(e) => e.kind() == ErrorKind::Interrupted,
        _ => false,
    }
}

impl HciTransport for SocketTransport {
    fn send_command(&self, command: &[u8]) -> Result<()> {
        self.socket.write_command(command)
    }

    fn close(&self) -> Result<()> {
        self.stop.store(true, Ordering::Release);
        let reader = self
            .reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(reader) = reader {
            if reader.join().is_err() {
                error!("HCI reader thread panicked");
            }
        }
        Ok(())
    }
}

impl Drop for SocketTransport {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
