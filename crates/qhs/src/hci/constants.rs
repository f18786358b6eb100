//! HCI protocol constants
//!
//! This module contains the constants used by the feature reads: packet
//! indicators, preamble sizes, opcode groups and the Qualcomm vendor opcodes.

// HCI packet types (H4 indicator byte)
pub const HCI_COMMAND_PKT: u8 = 0x01;
pub const HCI_ACL_PKT: u8 = 0x02;
pub const HCI_SCO_PKT: u8 = 0x03;
pub const HCI_EVENT_PKT: u8 = 0x04;
pub const HCI_ISO_PKT: u8 = 0x05;

// Maximum size of HCI command parameters
pub const HCI_MAX_PARAM_LEN: usize = 255;

// Largest event the controller can send: 2 byte header + 255 parameter bytes
pub const HCI_MAX_EVENT_SIZE: usize = 257;

// 2 bytes for opcode, 1 byte for parameter length (Vol 4, Part E, 5.4.1)
pub const HCI_COMMAND_PREAMBLE_SIZE: usize = 3;
// 1 byte for event code, 1 byte for parameter length (Vol 4, Part E, 5.4.4)
pub const HCI_EVENT_PREAMBLE_SIZE: usize = 2;

// Num_HCI_Command_Packets (1) + Command_Opcode (2) + Status (1)
pub const COMMAND_COMPLETE_HEADER_SIZE: usize = 4;

// Common OGF (Opcode Group Field) values
pub const OGF_INFO_PARAM: u8 = 0x04;
pub const OGF_VENDOR: u8 = 0x3F;

// Informational Parameters (OGF: 0x04)
pub const OCF_READ_LOCAL_VERSION: u16 = 0x0001;
pub const OCF_READ_BD_ADDR: u16 = 0x0009;

// Vendor specific commands (OGF: 0x3F)
pub const OCF_VS_QBCE: u16 = 0x0051;
pub const OCF_VS_ADDON: u16 = 0x001D;

// Packed opcodes
pub const HCI_READ_LOCAL_VERSION: u16 = OCF_READ_LOCAL_VERSION | ((OGF_INFO_PARAM as u16) << 10);
pub const HCI_READ_BD_ADDR: u16 = OCF_READ_BD_ADDR | ((OGF_INFO_PARAM as u16) << 10);
pub const HCI_VS_QBCE_OCF: u16 = OCF_VS_QBCE | ((OGF_VENDOR as u16) << 10);
pub const HCI_VS_GET_ADDON_FEATURES_SUPPORT: u16 = OCF_VS_ADDON | ((OGF_VENDOR as u16) << 10);

// QBCE sub-opcodes
pub const QBCE_READ_LOCAL_QLM_SUPPORTED_FEATURES: u8 = 0x09;
pub const QBCE_READ_REMOTE_QLM_SUPPORTED_FEATURES: u8 = 0x0A;
pub const QBCE_READ_LOCAL_QLL_SUPPORTED_FEATURES: u8 = 0x0B;
pub const QBCE_READ_REMOTE_QLL_SUPPORTED_FEATURES: u8 = 0x0C;

// HCI Events
pub const EVT_CMD_COMPLETE: u8 = 0x0E;
pub const EVT_CMD_STATUS: u8 = 0x0F;
