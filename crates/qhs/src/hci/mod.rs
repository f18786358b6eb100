//! Bluetooth HCI (Host Controller Interface) implementation
//!
//! This module provides the command codec, the Command Complete decoder, the
//! packet queue and the transports used to reach a controller.

pub mod constants;
pub mod event;
pub mod packet;
pub mod queue;
pub mod socket;
pub mod status;
pub mod transport;


pub use event::{read_command_complete_header, CommandComplete, NO_OPCODE_CHECKING};
pub use packet::{encode_command, HciCommand, Packet, PacketKind, QbceSubOpcode};
pub use queue::EventQueue;
pub use socket::{HciSocket, SocketTransport};
pub use status::HciStatus;
pub use transport::{HciCallbacks, HciTransport, PacketDispatcher};
