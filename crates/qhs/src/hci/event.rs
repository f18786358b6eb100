//! Command Complete event decoding
//!
//! Every query in this crate is answered by a Command Complete event. The
//! helpers here validate its envelope and hand back the return parameters
//! that follow the status byte.

use crate::error::{HciError, Result};
use crate::hci::constants::*;
use crate::hci::status::HciStatus;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

/// Pass as `expected_opcode` to accept whatever opcode the event echoes
pub const NO_OPCODE_CHECKING: Option<u16> = None;

/// Validate a Command Complete event and return its return parameters.
///
/// `event` starts at the event code (no H4 indicator). The returned slice
/// holds the `parameter_length - 4` bytes after the status field. A non-zero
/// status is reported as [`HciError::Status`].
pub fn read_command_complete_header(
    event: &[u8],
    expected_opcode: Option<u16>,
    minimum_bytes_after: usize,
) -> Result<&[u8]> {
    let header = CommandComplete::read_header(event, expected_opcode, minimum_bytes_after)?;
    if !header.status.is_success() {
        return Err(HciError::Status(header.status));
    }

    let start = HCI_EVENT_PREAMBLE_SIZE + COMMAND_COMPLETE_HEADER_SIZE;
    Ok(&event[start..HCI_EVENT_PREAMBLE_SIZE + header.parameter_length])
}

/// A decoded Command Complete event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandComplete {
    pub num_hci_command_packets: u8,
    pub opcode: u16,
    pub status: HciStatus,
    pub return_parameters: Vec<u8>,
}

struct Header {
    parameter_length: usize,
    status: HciStatus,
    num_hci_command_packets: u8,
    opcode: u16,
}

impl CommandComplete {
    /// Build a successful event around `return_parameters`
    pub fn new(opcode: u16, return_parameters: Vec<u8>) -> Self {
        Self {
            num_hci_command_packets: 1,
            opcode,
            status: HciStatus::Success,
            return_parameters,
        }
    }

    /// Parse the whole envelope, keeping a failed status instead of
    /// turning it into an error
    pub fn parse(event: &[u8]) -> Result<Self> {
        let header = Self::read_header(event, NO_OPCODE_CHECKING, 0)?;
        let start = HCI_EVENT_PREAMBLE_SIZE + COMMAND_COMPLETE_HEADER_SIZE;

        Ok(Self {
            num_hci_command_packets: header.num_hci_command_packets,
            opcode: header.opcode,
            status: header.status,
            return_parameters: event[start..HCI_EVENT_PREAMBLE_SIZE + header.parameter_length]
                .to_vec(),
        })
    }

    /// Serialize the event, starting at the event code
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let parameter_length = COMMAND_COMPLETE_HEADER_SIZE + self.return_parameters.len();
        if parameter_length > u8::MAX as usize {
            return Err(HciError::InvalidParamLength(self.return_parameters.len()));
        }

        let mut event = Vec::with_capacity(HCI_EVENT_PREAMBLE_SIZE + parameter_length);
        event.push(EVT_CMD_COMPLETE);
        event.push(parameter_length as u8);
        event.push(self.num_hci_command_packets);
        event.extend_from_slice(&self.opcode.to_le_bytes());
        event.push(self.status.code());
        event.extend_from_slice(&self.return_parameters);
        Ok(event)
    }

    fn read_header(
        event: &[u8],
        expected_opcode: Option<u16>,
        minimum_bytes_after: usize,
    ) -> Result<Header> {
        let short = |_: std::io::Error| HciError::ShortPacket {
            needed: HCI_EVENT_PREAMBLE_SIZE + COMMAND_COMPLETE_HEADER_SIZE,
            available: event.len(),
        };

        let mut cursor = Cursor::new(event);
        let event_code = cursor.read_u8().map_err(short)?;
        if event_code != EVT_CMD_COMPLETE {
            return Err(HciError::UnexpectedEventCode {
                expected: EVT_CMD_COMPLETE,
                found: event_code,
            });
        }

        let parameter_length = cursor.read_u8().map_err(|_| HciError::ShortPacket {
            needed: HCI_EVENT_PREAMBLE_SIZE,
            available: event.len(),
        })? as usize;

        let needed = COMMAND_COMPLETE_HEADER_SIZE + minimum_bytes_after;
        if parameter_length < needed {
            return Err(HciError::ShortPacket {
                needed,
                available: parameter_length,
            });
        }

        let available = event.len() - HCI_EVENT_PREAMBLE_SIZE;
        if available < parameter_length {
            return Err(HciError::ShortPacket {
                needed: parameter_length,
                available,
            });
        }

        let num_hci_command_packets = cursor.read_u8().map_err(short)?;
        let opcode = cursor.read_u16::<LittleEndian>().map_err(short)?;

        if let Some(expected) = expected_opcode {
            if opcode != expected {
                return Err(HciError::OpcodeMismatch {
                    expected,
                    found: opcode,
                });
            }
        }

        let status = HciStatus::from(cursor.read_u8().map_err(short)?);

        Ok(Header {
            parameter_length,
            status,
            num_hci_command_packets,
            opcode,
        })
    }
}
