//! Error types for the qhs library
//!
//! This module defines the error type shared by the transports, the event
//! decoder and the vendor feature decoders.

use crate::hci::status::HciStatus;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to an HCI controller
#[derive(Error, Debug)]
pub enum HciError {
    #[error("Failed to open HCI socket: {0}")]
    SocketError(#[from] std::io::Error),

    #[error("Failed to bind to HCI device: {0}")]
    BindError(std::io::Error),

    #[error("Failed to send HCI command: {0}")]
    SendError(std::io::Error),

    #[error("Failed to receive HCI packet: {0}")]
    ReceiveError(std::io::Error),

    #[error("Invalid parameter length: {0}")]
    InvalidParamLength(usize),

    #[error("Invalid HCI packet format")]
    InvalidPacketFormat,

    #[error("Unexpected event code 0x{found:02x}, expected 0x{expected:02x}")]
    UnexpectedEventCode { expected: u8, found: u8 },

    #[error("Short packet: need {needed} bytes, have {available}")]
    ShortPacket { needed: usize, available: usize },

    #[error("Opcode mismatch: expected 0x{expected:04x}, got 0x{found:04x}")]
    OpcodeMismatch { expected: u16, found: u16 },

    #[error("Command failed: {0}")]
    Status(HciStatus),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Timed out after {0:?} waiting for HCI packet")]
    Timeout(Duration),

    #[error("HCI session is not open")]
    SessionClosed,
}

impl HciError {
    /// Whether the error came from the transport rather than the protocol
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            HciError::SocketError(_)
                | HciError::BindError(_)
                | HciError::SendError(_)
                | HciError::ReceiveError(_)
                | HciError::SessionClosed
        )
    }

    /// The controller status, when the command itself was rejected.
    ///
    /// A status failure means the feature is absent on this controller and
    /// is not a reason to abort the feature report.
    pub fn status(&self) -> Option<HciStatus> {
        match self {
            HciError::Status(status) => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, HciError>;
