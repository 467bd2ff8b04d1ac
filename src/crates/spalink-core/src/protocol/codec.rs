//! Byte-level decoders for the master's telegrams.
//!
//! Each decoder takes the frame payload (bytes between the kind byte and
//! the CRC) and produces a typed record from [`crate::domain`]. Bit fields
//! are extracted with explicit masks and shifts; nothing here relies on
//! struct memory layout. Every read is bounds-checked up front so a short
//! or lying frame yields a [`DecodeError`] instead of a panic.
//!
//! Payload offsets below are wire offsets minus 5 (sentinel, length, dest,
//! src, kind precede the payload on the wire).

use thiserror::Error;

use crate::domain::state::{
    FilterCycle, HeatState, HeatingMode, SpaConfig, SpaFaultLog, SpaFilterSettings, SpaState,
    TempRange,
};
use crate::domain::temperature::TemperatureScale;

/// Errors raised while decoding a telegram payload.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The payload is shorter than the telegram's fixed layout requires.
    #[error("{telegram}: need {needed} payload bytes, got {available}")]
    Truncated {
        telegram: &'static str,
        needed: usize,
        available: usize,
    },

    /// A field carried a value outside its documented encoding.
    #[error("{telegram}: field {field} has unencodable value {value:#04X}")]
    InvalidField {
        telegram: &'static str,
        field: &'static str,
        value: u8,
    },
}

fn require_len(
    payload: &[u8],
    needed: usize,
    telegram: &'static str,
) -> Result<(), DecodeError> {
    if payload.len() < needed {
        Err(DecodeError::Truncated {
            telegram,
            needed,
            available: payload.len(),
        })
    } else {
        Ok(())
    }
}

// ── Status update (kind 0x13) ─────────────────────────────────────────────

/// Decodes a broadcast status telegram into a [`SpaState`].
pub fn decode_status(payload: &[u8]) -> Result<SpaState, DecodeError> {
    require_len(payload, 21, "StatusUpdate")?;

    let heating_mode = HeatingMode::try_from(payload[5]).map_err(|_| DecodeError::InvalidField {
        telegram: "StatusUpdate",
        field: "heating_mode",
        value: payload[5],
    })?;

    let flags = payload[10];
    let temp_range = if flags & 0x04 != 0 {
        TempRange::High
    } else {
        TempRange::Low
    };
    let heat_bits = (flags >> 4) & 0x03;
    let heat_state = HeatState::try_from(heat_bits).map_err(|_| DecodeError::InvalidField {
        telegram: "StatusUpdate",
        field: "heat_state",
        value: heat_bits,
    })?;

    Ok(SpaState {
        hour: payload[3],
        minute: payload[4],
        heating_mode,
        temp_range,
        heat_state,
        jet1: (payload[11] & 0x02) >> 1,
        jet2: (payload[11] & 0x08) >> 3,
        blower: (payload[13] & 0x04) >> 2,
        circ: payload[13] & 0x02 != 0,
        light: payload[14] == 0x03,
        current_temp: payload[2],
        target_temp: payload[20],
    })
}

// ── Configuration (kind 0x2E) ─────────────────────────────────────────────

/// Decodes a configuration telegram.
///
/// The temperature scale rides in bit 0 of the frame's source designation
/// byte, which is why `src` is an input here; everything else is packed
/// into the payload.
pub fn decode_config(payload: &[u8], src: u8) -> Result<SpaConfig, DecodeError> {
    require_len(payload, 5, "Configuration")?;

    let pumps = [
        payload[0] & 0x03,
        (payload[0] & 0x0C) >> 2,
        (payload[0] & 0x30) >> 4,
        (payload[0] & 0xC0) >> 6,
        payload[1] & 0x03,
        (payload[1] & 0xC0) >> 6,
    ];
    let lights = [payload[2] & 0x03, (payload[2] & 0x0C) >> 2];

    Ok(SpaConfig {
        pumps,
        lights,
        circ: payload[3] & 0x80 != 0,
        blower: payload[3] & 0x03 != 0,
        mister: payload[4] & 0x30 != 0,
        aux1: payload[4] & 0x01 != 0,
        aux2: payload[4] & 0x02 != 0,
        temp_scale: TemperatureScale::from_bit(src & 0x01 != 0),
    })
}

// ── Fault log (kind 0x28) ─────────────────────────────────────────────────

/// Decodes a fault log telegram. The code byte is carried verbatim; codes
/// outside the documented table still publish, paired with the
/// "Unknown error" message.
pub fn decode_fault_log(payload: &[u8]) -> Result<SpaFaultLog, DecodeError> {
    require_len(payload, 6, "FaultLog")?;
    Ok(SpaFaultLog {
        total_entries: payload[0],
        current_entry: payload[1],
        fault_code: payload[2],
        days_ago: payload[3],
        hour: payload[4],
        minute: payload[5],
    })
}

// ── Filter cycles (kind 0x23) ─────────────────────────────────────────────

/// Decodes the filter schedule. Filter 2's enable flag is packed into the
/// high bit of its start-hour byte.
pub fn decode_filter_cycles(payload: &[u8]) -> Result<SpaFilterSettings, DecodeError> {
    require_len(payload, 8, "FilterCycles")?;
    Ok(SpaFilterSettings {
        filter1: FilterCycle {
            start_hour: payload[0],
            start_minute: payload[1],
            duration_hour: payload[2],
            duration_minute: payload[3],
        },
        filter2: FilterCycle {
            start_hour: payload[4] & 0x7F,
            start_minute: payload[5],
            duration_hour: payload[6],
            duration_minute: payload[7],
        },
        filter2_enabled: payload[4] & 0x80 != 0,
    })
}
