//! HCI status codes
//!
//! Status codes carried in Command Complete events (Bluetooth Core Vol 1, Part F).
//! Codes are surfaced verbatim: an unnamed code round-trips through
//! [`HciStatus::Unknown`].

use std::fmt;

macro_rules! hci_status {
    ($($(#[$doc:meta])* $variant:ident = $code:literal, $text:literal;)*) => {
        /// HCI status / error code
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum HciStatus {
            $($(#[$doc])* $variant,)*
            /// Reserved or vendor code with no assigned name
            Unknown(u8),
        }

        impl From<u8> for HciStatus {
            fn from(code: u8) -> Self {
                match code {
                    $($code => HciStatus::$variant,)*
                    other => HciStatus::Unknown(other),
                }
            }
        }

        impl From<HciStatus> for u8 {
            fn from(status: HciStatus) -> Self {
                match status {
                    $(HciStatus::$variant => $code,)*
                    HciStatus::Unknown(code) => code,
                }
            }
        }

        impl HciStatus {
            /// Human readable description of the status
            pub fn description(&self) -> &'static str {
                match self {
                    $(HciStatus::$variant => $text,)*
                    HciStatus::Unknown(_) => "Unknown status",
                }
            }
        }
    };
}

hci_status! {
    Success = 0x00, "Success";
    UnknownHciCommand = 0x01, "Unknown HCI Command";
    UnknownConnectionIdentifier = 0x02, "Unknown Connection Identifier";
    HardwareFailure = 0x03, "Hardware Failure";
    PageTimeout = 0x04, "Page Timeout";
    AuthenticationFailure = 0x05, "Authentication Failure";
    KeyMissing = 0x06, "PIN or Key Missing";
    MemoryFull = 0x07, "Memory Capacity Exceeded";
    ConnectionTimeout = 0x08, "Connection Timeout";
    MaxNumConnections = 0x09, "Connection Limit Exceeded";
    MaxNumScoConnections = 0x0A, "Synchronous Connection Limit To A Device Exceeded";
    ConnectionAlreadyExists = 0x0B, "Connection Already Exists";
    CommandDisallowed = 0x0C, "Command Disallowed";
    ConnRejectedResources = 0x0D, "Connection Rejected due to Limited Resources";
    ConnRejectedSecurity = 0x0E, "Connection Rejected Due To Security Reasons";
    ConnRejectedUnacceptableBdAddr = 0x0F, "Connection Rejected due to Unacceptable BD_ADDR";
    HostTimeout = 0x10, "Connection Accept Timeout Exceeded";
    UnsupportedFeatureParam = 0x11, "Unsupported Feature or Parameter Value";
    InvalidHciCommandParam = 0x12, "Invalid HCI Command Parameters";
    RemoteUserTerminated = 0x13, "Remote User Terminated Connection";
    RemoteLowResources = 0x14, "Remote Device Terminated Connection due to Low Resources";
    RemotePowerOff = 0x15, "Remote Device Terminated Connection due to Power Off";
    LocalHostTerminated = 0x16, "Connection Terminated By Local Host";
    RepeatedAttempts = 0x17, "Repeated Attempts";
    PairingNotAllowed = 0x18, "Pairing Not Allowed";
    UnknownLmpPdu = 0x19, "Unknown LMP PDU";
    UnsupportedRemoteFeature = 0x1A, "Unsupported Remote Feature";
    ScoOffsetRejected = 0x1B, "SCO Offset Rejected";
    ScoIntervalRejected = 0x1C, "SCO Interval Rejected";
    AirModeRejected = 0x1D, "SCO Air Mode Rejected";
    InvalidLmpParam = 0x1E, "Invalid LMP Parameters";
    Unspecified = 0x1F, "Unspecified Error";
    UnsupportedLmpParamValue = 0x20, "Unsupported LMP Parameter Value";
    RoleChangeNotAllowed = 0x21, "Role Change Not Allowed";
    LmpResponseTimeout = 0x22, "LMP Response Timeout";
    LmpErrorTransactionCollision = 0x23, "LMP Error Transaction Collision";
    LmpPduNotAllowed = 0x24, "LMP PDU Not Allowed";
    EncryptionModeNotAcceptable = 0x25, "Encryption Mode Not Acceptable";
    UnitKeyUsed = 0x26, "Link Key cannot be Changed";
    QosNotSupported = 0x27, "Requested QoS Not Supported";
    InstantPassed = 0x28, "Instant Passed";
    PairingWithUnitKeyNotSupported = 0x29, "Pairing With Unit Key Not Supported";
    DifferentTransactionCollision = 0x2A, "Different Transaction Collision";
    Reserved2B = 0x2B, "Reserved";
    QosUnacceptableParameter = 0x2C, "QoS Unacceptable Parameter";
    QosRejected = 0x2D, "QoS Rejected";
    ChannelClassificationNotSupported = 0x2E, "Channel Classification Not Supported";
    InsufficientSecurity = 0x2F, "Insufficient Security";
    ParameterOutOfMandatoryRange = 0x30, "Parameter Out Of Mandatory Range";
    Reserved31 = 0x31, "Reserved";
    RoleSwitchPending = 0x32, "Role Switch Pending";
    Reserved33 = 0x33, "Reserved";
    ReservedSlotViolation = 0x34, "Reserved Slot Violation";
    RoleSwitchFailed = 0x35, "Role Switch Failed";
    InquiryResponseDataTooLarge = 0x36, "Extended Inquiry Response Too Large";
    SimplePairingNotSupportedByHost = 0x37, "Secure Simple Pairing Not Supported By Host";
    HostBusyPairing = 0x38, "Host Busy - Pairing";
    ControllerBusy = 0x3A, "Controller Busy";
    UnacceptableConnectionParams = 0x3B, "Unacceptable Connection Parameters";
    AdvertisingTimeout = 0x3C, "Advertising Timeout";
    MicFailure = 0x3D, "Connection Terminated due to MIC Failure";
    ConnFailedToEstablish = 0x3E, "Connection Failed to be Established";
    MacConnectionTimeout = 0x3F, "MAC Connection Failed";
    CoarseClockAdjustRejected = 0x40,
        "Coarse Clock Adjustment Rejected but Will Try to Adjust Using Clock Dragging";
    UnknownAdvertisingIdentifier = 0x42, "Unknown Advertising Identifier";
    LimitReached = 0x43, "Limit Reached";
    OperationCancelledByHost = 0x44, "Operation Cancelled by Host";
    PacketTooLong = 0x45, "Packet Too Long";
}

impl HciStatus {
    /// The raw status byte
    pub fn code(&self) -> u8 {
        (*self).into()
    }

    pub fn is_success(&self) -> bool {
        matches!(self, HciStatus::Success)
    }
}

impl fmt::Display for HciStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02x})", self.description(), self.code())
    }
}
