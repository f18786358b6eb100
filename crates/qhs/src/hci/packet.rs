//! HCI packet structures and command encoding
//!
//! This module contains the packet envelope passed between transports and
//! the event queue, and the vendor commands understood by the session.

use crate::error::{HciError, Result};
use crate::hci::constants::*;

/// Kind of an HCI packet, numbered by its H4 indicator byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    Command,
    Acl,
    Sco,
    Event,
    Iso,
}

impl PacketKind {
    pub const ALL: [PacketKind; 5] = [
        PacketKind::Command,
        PacketKind::Acl,
        PacketKind::Sco,
        PacketKind::Event,
        PacketKind::Iso,
    ];

    /// The H4 packet indicator for this kind
    pub fn indicator(self) -> u8 {
        match self {
            PacketKind::Command => HCI_COMMAND_PKT,
            PacketKind::Acl => HCI_ACL_PKT,
            PacketKind::Sco => HCI_SCO_PKT,
            PacketKind::Event => HCI_EVENT_PKT,
            PacketKind::Iso => HCI_ISO_PKT,
        }
    }

    pub fn from_indicator(indicator: u8) -> Option<Self> {
        match indicator {
            HCI_COMMAND_PKT => Some(PacketKind::Command),
            HCI_ACL_PKT => Some(PacketKind::Acl),
            HCI_SCO_PKT => Some(PacketKind::Sco),
            HCI_EVENT_PKT => Some(PacketKind::Event),
            HCI_ISO_PKT => Some(PacketKind::Iso),
            _ => None,
        }
    }

    pub(crate) fn index(self) -> usize {
        self.indicator() as usize - 1
    }
}

/// A raw HCI packet without its H4 indicator
///
/// The length is always the size of the owned bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    kind: PacketKind,
    data: Vec<u8>,
}

impl Packet {
    pub fn new(kind: PacketKind, data: Vec<u8>) -> Self {
        Self { kind, data }
    }

    pub fn event(data: impl Into<Vec<u8>>) -> Self {
        Self::new(PacketKind::Event, data.into())
    }

    pub fn kind(&self) -> PacketKind {
        self.kind
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Split an H4 frame (indicator byte, then the packet) into a packet
    pub fn from_h4(frame: &[u8]) -> Result<Self> {
        match frame.split_first() {
            Some((&indicator, data)) => PacketKind::from_indicator(indicator)
                .map(|kind| Self::new(kind, data.to_vec()))
                .ok_or(HciError::InvalidPacketFormat),
            None => Err(HciError::InvalidPacketFormat),
        }
    }
}

/// Pack an OGF/OCF pair into an opcode
pub const fn opcode(ogf: u8, ocf: u16) -> u16 {
    ((ogf as u16) << 10) | (ocf & 0x3ff)
}

/// Opcode Group Field of an opcode
pub const fn ogf(opcode: u16) -> u8 {
    (opcode >> 10) as u8
}

/// Opcode Command Field of an opcode
pub const fn ocf(opcode: u16) -> u16 {
    opcode & 0x3ff
}

/// Encode a command as `opcode (LE), parameter length, parameters`
pub fn encode_command(opcode: u16, parameters: &[u8]) -> Result<Vec<u8>> {
    if parameters.len() > HCI_MAX_PARAM_LEN {
        return Err(HciError::InvalidParamLength(parameters.len()));
    }

    let mut packet = Vec::with_capacity(HCI_COMMAND_PREAMBLE_SIZE + parameters.len());
    packet.extend_from_slice(&opcode.to_le_bytes());
    packet.push(parameters.len() as u8);
    packet.extend_from_slice(parameters);
    Ok(packet)
}

/// Sub-commands multiplexed over the QBCE vendor opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QbceSubOpcode {
    ReadLocalQlmSupportedFeatures,
    ReadRemoteQlmSupportedFeatures,
    ReadLocalQllSupportedFeatures,
    ReadRemoteQllSupportedFeatures,
}

impl From<QbceSubOpcode> for u8 {
    fn from(sub_opcode: QbceSubOpcode) -> Self {
        match sub_opcode {
            QbceSubOpcode::ReadLocalQlmSupportedFeatures => QBCE_READ_LOCAL_QLM_SUPPORTED_FEATURES,
            QbceSubOpcode::ReadRemoteQlmSupportedFeatures => {
                QBCE_READ_REMOTE_QLM_SUPPORTED_FEATURES
            }
            QbceSubOpcode::ReadLocalQllSupportedFeatures => QBCE_READ_LOCAL_QLL_SUPPORTED_FEATURES,
            QbceSubOpcode::ReadRemoteQllSupportedFeatures => {
                QBCE_READ_REMOTE_QLL_SUPPORTED_FEATURES
            }
        }
    }
}

impl TryFrom<u8> for QbceSubOpcode {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, u8> {
        match value {
            QBCE_READ_LOCAL_QLM_SUPPORTED_FEATURES => Ok(Self::ReadLocalQlmSupportedFeatures),
            QBCE_READ_REMOTE_QLM_SUPPORTED_FEATURES => Ok(Self::ReadRemoteQlmSupportedFeatures),
            QBCE_READ_LOCAL_QLL_SUPPORTED_FEATURES => Ok(Self::ReadLocalQllSupportedFeatures),
            QBCE_READ_REMOTE_QLL_SUPPORTED_FEATURES => Ok(Self::ReadRemoteQllSupportedFeatures),
            other => Err(other),
        }
    }
}

/// Commands issued by the feature reads
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HciCommand {
    // Informational Parameters (OGF: 0x04)
    ReadLocalVersion,
    ReadBdAddr,

    // Vendor Commands (OGF: 0x3F)
    Qbce { sub_opcode: QbceSubOpcode },
    GetAddonFeatures,

    /// Any other opcode with caller supplied parameters
    Raw { opcode: u16, parameters: Vec<u8> },
}

impl HciCommand {
    /// Create a raw command from its OGF, OCF and parameters
    pub fn new(ogf: u8, ocf: u16, parameters: Vec<u8>) -> Self {
        Self::Raw {
            opcode: opcode(ogf, ocf),
            parameters,
        }
    }

    /// Get the OGF and OCF for this command
    pub fn opcode_parts(&self) -> (u8, u16) {
        match self {
            Self::ReadLocalVersion => (OGF_INFO_PARAM, OCF_READ_LOCAL_VERSION),
            Self::ReadBdAddr => (OGF_INFO_PARAM, OCF_READ_BD_ADDR),
            Self::Qbce { .. } => (OGF_VENDOR, OCF_VS_QBCE),
            Self::GetAddonFeatures => (OGF_VENDOR, OCF_VS_ADDON),
            Self::Raw { opcode, .. } => (ogf(*opcode), ocf(*opcode)),
        }
    }

    pub fn opcode(&self) -> u16 {
        let (ogf, ocf) = self.opcode_parts();
        opcode(ogf, ocf)
    }

    /// Convert the command to its raw parameter bytes
    fn parameters(&self) -> Vec<u8> {
        match self {
            Self::ReadLocalVersion | Self::ReadBdAddr | Self::GetAddonFeatures => vec![],
            Self::Qbce { sub_opcode } => vec![u8::from(*sub_opcode)],
            Self::Raw { parameters, .. } => parameters.clone(),
        }
    }

    /// Convert the command to its wire bytes (without H4 indicator)
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode_command(self.opcode(), &self.parameters())
    }

    /// Convert the command to a command packet
    pub fn to_packet(&self) -> Result<Packet> {
        Ok(Packet::new(PacketKind::Command, self.to_bytes()?))
    }
}
