//! Message kinds, bus addresses, and protocol code tables.
//!
//! The bus is a polled multi-drop RS-485 link. The master owns the wire and
//! grants clients a turn with a Clear-to-Send telegram; a client must answer
//! every CTS with exactly one frame, if only a Nothing-to-Send. Channel
//! bytes identify the conversation:
//!
//! ```text
//! 0x10..=0x2F   per-client addresses handed out by the master
//! 0xFE          multicast: new-client polling and address assignment
//! 0xFF          broadcast: periodic status telegrams
//! ```

/// Source designation written by the master on directed replies and by
/// clients on everything they transmit.
pub const MASTER_REPLY: u8 = 0xBF;

/// Source designation carried on broadcast status telegrams.
pub const BROADCAST_SRC: u8 = 0xAF;

/// Channel used for the new-client handshake.
pub const CHANNEL_ASSIGNMENT: u8 = 0xFE;

/// Channel used for broadcast status telegrams.
pub const CHANNEL_BROADCAST: u8 = 0xFF;

/// Lowest address the master hands out.
pub const CLIENT_ADDRESS_MIN: u8 = 0x10;

/// Highest address we will accept; assignments above it are clamped.
pub const CLIENT_ADDRESS_MAX: u8 = 0x2F;

/// Fixed payload of a new-client request (device type + identity bytes).
pub const NEW_CLIENT_IDENT: [u8; 3] = [0x02, 0xF1, 0x73];

// ── Message kinds ─────────────────────────────────────────────────────────

/// Message kind codes this engine sends or understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageKind {
    /// M→0xFE: "any new clients out there?"
    NewClientPoll = 0x00,
    /// C→M: request an address (payload = [`NEW_CLIENT_IDENT`]).
    NewClientRequest = 0x01,
    /// M→0xFE: address assignment (payload[0] = address).
    AddressAssignment = 0x02,
    /// C→M: acknowledge the assigned address.
    AddressAck = 0x03,
    /// M→C: this client may transmit one frame now.
    ClearToSend = 0x06,
    /// C→M: the client has nothing queued this turn.
    NothingToSend = 0x07,
    /// C→M: press a toggle item (payload = [code, 0x00]).
    ToggleItem = 0x11,
    /// M→0xFF: periodic full-state broadcast.
    StatusUpdate = 0x13,
    /// C→M: change the target temperature (payload = [raw]).
    SetTemperature = 0x20,
    /// C→M: pull one settings artifact (payload selects which).
    SettingsRequest = 0x22,
    /// M→C: filter cycle schedule.
    FilterCycles = 0x23,
    /// M→C: fault log entry.
    FaultLog = 0x28,
    /// M→C: equipment configuration.
    Configuration = 0x2E,
}

impl TryFrom<u8> for MessageKind {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x00 => Ok(MessageKind::NewClientPoll),
            0x01 => Ok(MessageKind::NewClientRequest),
            0x02 => Ok(MessageKind::AddressAssignment),
            0x03 => Ok(MessageKind::AddressAck),
            0x06 => Ok(MessageKind::ClearToSend),
            0x07 => Ok(MessageKind::NothingToSend),
            0x11 => Ok(MessageKind::ToggleItem),
            0x13 => Ok(MessageKind::StatusUpdate),
            0x20 => Ok(MessageKind::SetTemperature),
            0x22 => Ok(MessageKind::SettingsRequest),
            0x23 => Ok(MessageKind::FilterCycles),
            0x28 => Ok(MessageKind::FaultLog),
            0x2E => Ok(MessageKind::Configuration),
            _ => Err(()),
        }
    }
}

impl MessageKind {
    /// Human-readable name for diagnostics and the capture pretty-printer.
    pub fn name(self) -> &'static str {
        match self {
            MessageKind::NewClientPoll => "NewClientPoll",
            MessageKind::NewClientRequest => "NewClientRequest",
            MessageKind::AddressAssignment => "AddressAssignment",
            MessageKind::AddressAck => "AddressAck",
            MessageKind::ClearToSend => "ClearToSend",
            MessageKind::NothingToSend => "NothingToSend",
            MessageKind::ToggleItem => "ToggleItem",
            MessageKind::StatusUpdate => "StatusUpdate",
            MessageKind::SetTemperature => "SetTemperature",
            MessageKind::SettingsRequest => "SettingsRequest",
            MessageKind::FilterCycles => "FilterCycles",
            MessageKind::FaultLog => "FaultLog",
            MessageKind::Configuration => "Configuration",
        }
    }
}

// ── Toggle items ──────────────────────────────────────────────────────────

/// Items a client can "press" with a [`MessageKind::ToggleItem`] frame.
///
/// The code byte identifies the button on the control board. Jet 1 and
/// jet 2 are pumps 1 and 2 on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleItem {
    Jet1,
    Jet2,
    Pump3,
    Pump4,
    Pump5,
    Pump6,
    Blower,
    Mister,
    Light,
    Light2,
    Aux1,
    Aux2,
    HoldMode,
    TempRange,
    HeatingMode,
}

impl ToggleItem {
    /// Protocol code byte for this item.
    pub fn code(self) -> u8 {
        match self {
            ToggleItem::Jet1 => 0x04,
            ToggleItem::Jet2 => 0x05,
            ToggleItem::Pump3 => 0x06,
            ToggleItem::Pump4 => 0x07,
            ToggleItem::Pump5 => 0x08,
            ToggleItem::Pump6 => 0x09,
            ToggleItem::Blower => 0x0C,
            ToggleItem::Mister => 0x0E,
            ToggleItem::Light => 0x11,
            ToggleItem::Light2 => 0x12,
            ToggleItem::Aux1 => 0x16,
            ToggleItem::Aux2 => 0x17,
            ToggleItem::HoldMode => 0x3C,
            ToggleItem::TempRange => 0x50,
            ToggleItem::HeatingMode => 0x51,
        }
    }
}

// ── Settings requests ─────────────────────────────────────────────────────

/// Selector payloads for [`MessageKind::SettingsRequest`] frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsRequest {
    Configuration,
    /// `entry` 0xFF asks for the most recent fault.
    FaultLog { entry: u8 },
    FilterCycles,
}

impl SettingsRequest {
    /// Three-byte selector carried in the request payload.
    pub fn selector(self) -> [u8; 3] {
        match self {
            SettingsRequest::Configuration => [0x00, 0x00, 0x01],
            SettingsRequest::FaultLog { entry } => [0x20, entry, 0x00],
            SettingsRequest::FilterCycles => [0x01, 0x00, 0x00],
        }
    }
}

// ── Fault codes ───────────────────────────────────────────────────────────

/// Maps a fault code to the operator-facing message.
///
/// The strings are an external contract: operators and alerting rules match
/// on them verbatim. Codes outside the table yield "Unknown error".
pub fn fault_message(code: u8) -> &'static str {
    match code {
        15 => "Sensors are out of sync",
        16 => "The water flow is low",
        17 => "The water flow has failed",
        18 => "The settings have been reset",
        19 => "Priming Mode",
        20 => "The clock has failed",
        21 => "The settings have been reset",
        22 => "Program memory failure",
        26 => "Sensors are out of sync -- Call for service",
        27 => "The heater is dry",
        28 => "The heater may be dry",
        29 => "The water is too hot",
        30 => "The heater is too hot",
        31 => "Sensor A Fault",
        32 => "Sensor B Fault",
        34 => "A pump may be stuck on",
        35 => "Hot fault",
        36 => "The GFCI test failed",
        37 => "Standby Mode (Hold Mode)",
        _ => "Unknown error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_kind_round_trip() {
        for code in 0x00u8..=0xFF {
            if let Ok(kind) = MessageKind::try_from(code) {
                assert_eq!(kind as u8, code);
            }
        }
    }

    #[test]
    fn test_unlisted_kinds_are_rejected() {
        assert!(MessageKind::try_from(0x05).is_err());
        assert!(MessageKind::try_from(0x92).is_err());
    }

    #[test]
    fn test_toggle_codes_match_control_board_map() {
        assert_eq!(ToggleItem::Jet1.code(), 0x04);
        assert_eq!(ToggleItem::Jet2.code(), 0x05);
        assert_eq!(ToggleItem::Blower.code(), 0x0C);
        assert_eq!(ToggleItem::Light.code(), 0x11);
        assert_eq!(ToggleItem::TempRange.code(), 0x50);
        assert_eq!(ToggleItem::HeatingMode.code(), 0x51);
    }

    #[test]
    fn test_settings_selectors() {
        assert_eq!(
            SettingsRequest::Configuration.selector(),
            [0x00, 0x00, 0x01]
        );
        assert_eq!(
            SettingsRequest::FaultLog { entry: 0xFF }.selector(),
            [0x20, 0xFF, 0x00]
        );
        assert_eq!(SettingsRequest::FilterCycles.selector(), [0x01, 0x00, 0x00]);
    }

    #[test]
    fn test_fault_table_known_and_unknown() {
        assert_eq!(fault_message(16), "The water flow is low");
        assert_eq!(fault_message(37), "Standby Mode (Hold Mode)");
        assert_eq!(fault_message(99), "Unknown error");
        assert_eq!(fault_message(0), "Unknown error");
    }

    #[test]
    fn test_fault_table_casing_matches_firmware() {
        // Operators match on these strings verbatim; the odd capitalization
        // is part of the contract.
        assert_eq!(fault_message(19), "Priming Mode");
        assert_eq!(fault_message(26), "Sensors are out of sync -- Call for service");
        assert_eq!(fault_message(31), "Sensor A Fault");
        assert_eq!(fault_message(32), "Sensor B Fault");
    }
}
