//! qhs - Qualcomm vendor capability discovery over Bluetooth HCI
//!
//! This library talks to a Bluetooth controller through the HCI transport
//! and reads the vendor specific capability reports of Qualcomm parts: QHS
//! link features (QLMP), LE link layer features (QLL) and the SoC add-on
//! audio/codec features. It includes the command codec, the Command Complete
//! decoder, a thread-safe packet queue bridging asynchronous delivery to
//! blocking reads, and a raw socket transport for Linux.

pub mod error;
pub mod hci;
pub mod session;
pub mod vendor;

// Re-export common types for convenience
pub use error::{HciError, Result};
pub use hci::{
    read_command_complete_header, CommandComplete, EventQueue, HciCallbacks, HciCommand,
    HciSocket, HciStatus, HciTransport, Packet, PacketDispatcher, PacketKind, SocketTransport,
};
pub use session::{HciSession, SessionConfig, SessionState};
pub use vendor::{
    is_qti_controller, BdAddr, ControllerVersion, FeatureFlag, FeatureSupport, QllFeatureSet,
    QlmpFeatureSet, SocAddonFeatures,
};
