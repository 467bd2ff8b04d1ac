//! Decoded spa records and the fetch lifecycle tag.

use serde::{Deserialize, Serialize};

use crate::domain::temperature::TemperatureScale;
use crate::protocol::messages::fault_message;

// ── Fetch lifecycle ───────────────────────────────────────────────────────

/// Lifecycle of a pulled artifact (configuration, fault log, filter cycles).
///
/// Only `Want` makes the scheduler spend a bus turn on a request. A decoded
/// response moves the artifact to `Received`; emitting its events moves it
/// to `Published`. The periodic re-arm drops `Published` (and a stale
/// `Requested`, for self-heal after a dropped response) back to `Want`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchStage {
    #[default]
    Want,
    Requested,
    Received,
    Published,
}

// ── Status enums ──────────────────────────────────────────────────────────

/// Heating mode reported in the status telegram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeatingMode {
    Ready,
    Rest,
    ReadyInRest,
}

impl TryFrom<u8> for HeatingMode {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0 => Ok(HeatingMode::Ready),
            1 => Ok(HeatingMode::Rest),
            3 => Ok(HeatingMode::ReadyInRest),
            _ => Err(()),
        }
    }
}

/// Heater relay state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeatState {
    Off,
    Heating,
    HeatWaiting,
}

impl HeatState {
    pub fn label(self) -> &'static str {
        match self {
            HeatState::Off => "Off",
            HeatState::Heating => "Heating",
            HeatState::HeatWaiting => "Heat Waiting",
        }
    }
}

impl TryFrom<u8> for HeatState {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0 => Ok(HeatState::Off),
            1 => Ok(HeatState::Heating),
            2 => Ok(HeatState::HeatWaiting),
            _ => Err(()),
        }
    }
}

/// Setpoint range the board is operating in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TempRange {
    Low,
    High,
}

// ── Records ───────────────────────────────────────────────────────────────

/// Equipment configuration, immutable between fetches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaConfig {
    /// Speed counts for pumps 1–6 (0 = absent, 1 = one speed, 2 = two).
    pub pumps: [u8; 6],
    /// Presence/type codes for lights 1–2.
    pub lights: [u8; 2],
    pub circ: bool,
    pub blower: bool,
    pub mister: bool,
    pub aux1: bool,
    pub aux2: bool,
    pub temp_scale: TemperatureScale,
}

/// Running state, refreshed by every status telegram.
///
/// Temperatures are kept as raw wire bytes (`0xFF` = unknown); render them
/// through [`TemperatureScale`] at the publication boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaState {
    pub hour: u8,
    pub minute: u8,
    pub heating_mode: HeatingMode,
    pub temp_range: TempRange,
    pub heat_state: HeatState,
    pub jet1: u8,
    pub jet2: u8,
    pub blower: u8,
    pub circ: bool,
    pub light: bool,
    pub current_temp: u8,
    pub target_temp: u8,
}

/// One fault log entry as reported by the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaFaultLog {
    pub total_entries: u8,
    pub current_entry: u8,
    pub fault_code: u8,
    pub days_ago: u8,
    pub hour: u8,
    pub minute: u8,
}

impl SpaFaultLog {
    /// Operator-facing message for this entry's code.
    pub fn message(&self) -> &'static str {
        fault_message(self.fault_code)
    }
}

/// One filter cycle window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCycle {
    pub start_hour: u8,
    pub start_minute: u8,
    pub duration_hour: u8,
    pub duration_minute: u8,
}

/// Filter schedule; cycle 2 carries an enable flag in its start-hour byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaFilterSettings {
    pub filter1: FilterCycle,
    pub filter2: FilterCycle,
    pub filter2_enabled: bool,
}

/// A consistent copy of everything the engine has decoded so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpaSnapshot {
    pub config: Option<SpaConfig>,
    pub state: Option<SpaState>,
    pub fault_log: Option<SpaFaultLog>,
    pub filter_settings: Option<SpaFilterSettings>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heating_mode_codes() {
        assert_eq!(HeatingMode::try_from(0), Ok(HeatingMode::Ready));
        assert_eq!(HeatingMode::try_from(1), Ok(HeatingMode::Rest));
        assert_eq!(HeatingMode::try_from(3), Ok(HeatingMode::ReadyInRest));
        assert!(HeatingMode::try_from(2).is_err());
    }

    #[test]
    fn test_heat_state_codes() {
        assert_eq!(HeatState::try_from(2), Ok(HeatState::HeatWaiting));
        assert!(HeatState::try_from(3).is_err());
    }

    #[test]
    fn test_fault_log_message_lookup() {
        let entry = SpaFaultLog {
            total_entries: 1,
            current_entry: 1,
            fault_code: 28,
            days_ago: 0,
            hour: 6,
            minute: 30,
        };
        assert_eq!(entry.message(), "The heater may be dry");
    }
}
