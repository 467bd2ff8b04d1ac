//! Temperature encoding and the glitch filter.
//!
//! The wire carries temperatures as a single byte. Under the Fahrenheit
//! scale the byte is whole degrees; under Celsius it is half degrees, so an
//! odd byte means a trailing .5. The byte 0xFF marks an unknown reading
//! (sensor not settled yet).

use serde::{Deserialize, Serialize};

/// Sentinel byte for "reading not available".
pub const TEMP_UNKNOWN: u8 = 0xFF;

/// Raw setpoint bounds the protocol can express, per scale.
const FAHRENHEIT_RAW_RANGE: (u8, u8) = (50, 104);
const CELSIUS_RAW_RANGE: (u8, u8) = (52, 80); // 26.0 °C .. 40.0 °C in half degrees

/// Temperature scale the control board is configured for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemperatureScale {
    #[default]
    Fahrenheit,
    Celsius,
}

impl TemperatureScale {
    /// Decodes the scale bit (0 = Fahrenheit, 1 = Celsius).
    pub fn from_bit(bit: bool) -> Self {
        if bit {
            TemperatureScale::Celsius
        } else {
            TemperatureScale::Fahrenheit
        }
    }

    /// Converts a raw wire byte to degrees on this scale.
    pub fn degrees(self, raw: u8) -> f64 {
        match self {
            TemperatureScale::Fahrenheit => f64::from(raw),
            TemperatureScale::Celsius => f64::from(raw) / 2.0,
        }
    }

    /// Renders a raw wire byte for publication (two decimal places).
    pub fn display(self, raw: u8) -> String {
        format!("{:.2}", self.degrees(raw))
    }

    /// Clamps a raw setpoint byte to the range the protocol can represent.
    pub fn clamp_raw(self, raw: u8) -> u8 {
        let (min, max) = match self {
            TemperatureScale::Fahrenheit => FAHRENHEIT_RAW_RANGE,
            TemperatureScale::Celsius => CELSIUS_RAW_RANGE,
        };
        raw.clamp(min, max)
    }
}

/// Rejects implausible jumps in the measured water temperature.
///
/// A reading that differs from the last accepted one by more than 20% is
/// treated as electrical noise and suppressed. The reference value persists
/// across telegrams; a suppressed reading does not become the new
/// reference, so a brief spike cannot drag the filter with it.
#[derive(Debug, Default)]
pub struct GlitchFilter {
    previous: Option<f64>,
}

impl GlitchFilter {
    /// Returns `true` if `reading` should be accepted and published.
    pub fn accept(&mut self, reading: f64) -> bool {
        match self.previous {
            Some(prev) if (reading - prev).abs() > 0.2 * prev => false,
            _ => {
                self.previous = Some(reading);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fahrenheit_is_whole_degrees() {
        assert_eq!(TemperatureScale::Fahrenheit.display(102), "102.00");
    }

    #[test]
    fn test_celsius_is_half_degrees() {
        assert_eq!(TemperatureScale::Celsius.display(77), "38.50");
        assert_eq!(TemperatureScale::Celsius.display(76), "38.00");
    }

    #[test]
    fn test_clamp_fahrenheit_bounds() {
        let scale = TemperatureScale::Fahrenheit;
        assert_eq!(scale.clamp_raw(40), 50);
        assert_eq!(scale.clamp_raw(102), 102);
        assert_eq!(scale.clamp_raw(120), 104);
    }

    #[test]
    fn test_clamp_celsius_bounds() {
        let scale = TemperatureScale::Celsius;
        assert_eq!(scale.clamp_raw(10), 52);
        assert_eq!(scale.clamp_raw(90), 80);
    }

    #[test]
    fn test_glitch_filter_accepts_first_reading() {
        let mut filter = GlitchFilter::default();
        assert!(filter.accept(100.0));
    }

    #[test]
    fn test_glitch_filter_rejects_out_of_window_jump() {
        let mut filter = GlitchFilter::default();
        assert!(filter.accept(100.0));
        assert!(!filter.accept(130.0)); // 130 > 100 * 1.2
        assert!(filter.accept(101.0)); // reference stayed at 100
    }

    #[test]
    fn test_glitch_filter_tracks_gradual_change() {
        let mut filter = GlitchFilter::default();
        assert!(filter.accept(100.0));
        assert!(filter.accept(110.0));
        assert!(filter.accept(125.0)); // within 20% of 110
    }
}
