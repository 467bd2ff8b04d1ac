//! Event emission: the topic namespace and value rendering.
//!
//! The engine reports everything it learns as `(topic, value)` pairs on a
//! stable hierarchical namespace rooted at `Spa/`. The sink is the one seam
//! to the outside world: an adapter forwards the pairs to MQTT, a log, a
//! test recorder. The engine neither knows nor cares. Values arrive
//! already stringified; booleans render as `ON`/`OFF`, temperatures with
//! two decimals, clock fields as `HH:MM`.

use crate::domain::state::{
    FilterCycle, HeatingMode, SpaConfig, SpaFaultLog, SpaFilterSettings, SpaState, TempRange,
};
use crate::domain::temperature::{TemperatureScale, TEMP_UNKNOWN};

/// Where decoded events go. Implementations must not block beyond a bus
/// turn; the engine calls this inline from `feed`.
pub trait EventSink {
    fn emit(&mut self, topic: &str, value: &str);
}

/// Topic paths under the `Spa/` root.
pub mod topic {
    pub const TEMPERATURE: &str = "Spa/temperature/state";
    pub const TARGET_TEMP: &str = "Spa/target_temp/state";
    pub const TIME: &str = "Spa/time/state";
    pub const HEATING_MODE: &str = "Spa/heatingmode/state";
    pub const HEAT_MODE: &str = "Spa/heat_mode/state";
    pub const HEAT_STATE: &str = "Spa/heatstate/state";
    pub const HIGH_RANGE: &str = "Spa/highrange/state";
    pub const JET_1: &str = "Spa/jet_1/state";
    pub const JET_2: &str = "Spa/jet_2/state";
    pub const CIRC: &str = "Spa/circ/state";
    pub const BLOWER: &str = "Spa/blower/state";
    pub const LIGHT: &str = "Spa/light/state";
    pub const FILTER_1: &str = "Spa/filter1/state";
    pub const FILTER_2: &str = "Spa/filter2/state";
    pub const FILTER_2_ENABLED: &str = "Spa/filter2_enabled/state";
    pub const NODE_ID: &str = "Spa/node/id";
    pub const NODE_STATE: &str = "Spa/node/state";
    pub const NODE_DEBUG: &str = "Spa/node/debug";
    pub const NODE_VERSION: &str = "Spa/node/version";
    pub const CONFIG_PREFIX: &str = "Spa/config";
    pub const FAULT_PREFIX: &str = "Spa/fault";
}

/// Published when a temperature reading is 0xFF.
pub const VALUE_UNKNOWN: &str = "unknown";

pub fn on_off(value: bool) -> &'static str {
    if value {
        "ON"
    } else {
        "OFF"
    }
}

pub fn clock(hour: u8, minute: u8) -> String {
    format!("{hour:02}:{minute:02}")
}

fn cycle_json(cycle: &FilterCycle) -> String {
    format!(
        "{{\"start\":\"{}\",\"duration\":\"{}\"}}",
        clock(cycle.start_hour, cycle.start_minute),
        clock(cycle.duration_hour, cycle.duration_minute),
    )
}

/// Emits the full status field set. `temp_accepted` is the glitch filter's
/// verdict on the current-temperature reading; the reading is withheld when
/// it fails, everything else still publishes.
pub fn publish_status<S: EventSink>(
    sink: &mut S,
    state: &SpaState,
    scale: TemperatureScale,
    temp_accepted: bool,
) {
    if state.current_temp == TEMP_UNKNOWN {
        sink.emit(topic::TEMPERATURE, VALUE_UNKNOWN);
    } else if temp_accepted {
        sink.emit(topic::TEMPERATURE, &scale.display(state.current_temp));
    }
    sink.emit(topic::TARGET_TEMP, &scale.display(state.target_temp));
    sink.emit(topic::TIME, &clock(state.hour, state.minute));
    sink.emit(
        topic::HEATING_MODE,
        on_off(state.heating_mode == HeatingMode::Ready),
    );
    // The climate contract downstream knows the modes "heat" and "off";
    // Ready-in-Rest publishes nothing on this topic.
    match state.heating_mode {
        HeatingMode::Ready => sink.emit(topic::HEAT_MODE, "heat"),
        HeatingMode::Rest => sink.emit(topic::HEAT_MODE, "off"),
        HeatingMode::ReadyInRest => {}
    }
    sink.emit(topic::HEAT_STATE, state.heat_state.label());
    sink.emit(
        topic::HIGH_RANGE,
        on_off(state.temp_range == TempRange::High),
    );
    sink.emit(topic::JET_1, on_off(state.jet1 != 0));
    sink.emit(topic::JET_2, on_off(state.jet2 != 0));
    sink.emit(topic::CIRC, on_off(state.circ));
    sink.emit(topic::BLOWER, on_off(state.blower != 0));
    sink.emit(topic::LIGHT, on_off(state.light));
}

/// Emits the configuration as numeric leaves under `Spa/config/`.
pub fn publish_config<S: EventSink>(sink: &mut S, config: &SpaConfig) {
    for (i, pump) in config.pumps.iter().enumerate() {
        sink.emit(
            &format!("{}/pumps{}", topic::CONFIG_PREFIX, i + 1),
            &pump.to_string(),
        );
    }
    for (i, light) in config.lights.iter().enumerate() {
        sink.emit(
            &format!("{}/lights{}", topic::CONFIG_PREFIX, i + 1),
            &light.to_string(),
        );
    }
    sink.emit(
        &format!("{}/circ", topic::CONFIG_PREFIX),
        &u8::from(config.circ).to_string(),
    );
    sink.emit(
        &format!("{}/blower", topic::CONFIG_PREFIX),
        &u8::from(config.blower).to_string(),
    );
    sink.emit(
        &format!("{}/mister", topic::CONFIG_PREFIX),
        &u8::from(config.mister).to_string(),
    );
    sink.emit(
        &format!("{}/aux1", topic::CONFIG_PREFIX),
        &u8::from(config.aux1).to_string(),
    );
    sink.emit(
        &format!("{}/aux2", topic::CONFIG_PREFIX),
        &u8::from(config.aux2).to_string(),
    );
    sink.emit(
        &format!("{}/temp_scale", topic::CONFIG_PREFIX),
        &u8::from(config.temp_scale == TemperatureScale::Celsius).to_string(),
    );
}

/// Emits a fault log entry under `Spa/fault/`.
pub fn publish_fault_log<S: EventSink>(sink: &mut S, log: &SpaFaultLog) {
    let p = topic::FAULT_PREFIX;
    sink.emit(&format!("{p}/Entries"), &log.total_entries.to_string());
    sink.emit(&format!("{p}/Entry"), &log.current_entry.to_string());
    sink.emit(&format!("{p}/Code"), &log.fault_code.to_string());
    sink.emit(&format!("{p}/Message"), log.message());
    sink.emit(&format!("{p}/DaysAgo"), &log.days_ago.to_string());
    sink.emit(&format!("{p}/Hours"), &log.hour.to_string());
    sink.emit(&format!("{p}/Minutes"), &log.minute.to_string());
}

/// Emits the filter schedule.
pub fn publish_filter_settings<S: EventSink>(sink: &mut S, settings: &SpaFilterSettings) {
    sink.emit(topic::FILTER_1, &cycle_json(&settings.filter1));
    sink.emit(topic::FILTER_2, &cycle_json(&settings.filter2));
    sink.emit(topic::FILTER_2_ENABLED, on_off(settings.filter2_enabled));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::HeatState;

    #[derive(Default)]
    struct Recorder(Vec<(String, String)>);

    impl EventSink for Recorder {
        fn emit(&mut self, topic: &str, value: &str) {
            self.0.push((topic.to_string(), value.to_string()));
        }
    }

    impl Recorder {
        fn value(&self, topic: &str) -> Option<&str> {
            self.0
                .iter()
                .rev()
                .find(|(t, _)| t == topic)
                .map(|(_, v)| v.as_str())
        }
    }

    fn sample_state() -> SpaState {
        SpaState {
            hour: 8,
            minute: 5,
            heating_mode: HeatingMode::Ready,
            temp_range: TempRange::High,
            heat_state: HeatState::Heating,
            jet1: 1,
            jet2: 0,
            blower: 0,
            circ: true,
            light: true,
            current_temp: 100,
            target_temp: 102,
        }
    }

    #[test]
    fn test_status_values_render() {
        let mut sink = Recorder::default();
        publish_status(&mut sink, &sample_state(), TemperatureScale::Fahrenheit, true);
        assert_eq!(sink.value(topic::TEMPERATURE), Some("100.00"));
        assert_eq!(sink.value(topic::TARGET_TEMP), Some("102.00"));
        assert_eq!(sink.value(topic::TIME), Some("08:05"));
        assert_eq!(sink.value(topic::HEATING_MODE), Some("ON"));
        assert_eq!(sink.value(topic::HEAT_MODE), Some("heat"));
        assert_eq!(sink.value(topic::HEAT_STATE), Some("Heating"));
        assert_eq!(sink.value(topic::HIGH_RANGE), Some("ON"));
        assert_eq!(sink.value(topic::JET_1), Some("ON"));
        assert_eq!(sink.value(topic::JET_2), Some("OFF"));
        assert_eq!(sink.value(topic::LIGHT), Some("ON"));
    }

    #[test]
    fn test_heat_mode_values_per_heating_mode() {
        let mut state = sample_state();
        state.heating_mode = HeatingMode::Rest;
        let mut sink = Recorder::default();
        publish_status(&mut sink, &state, TemperatureScale::Fahrenheit, true);
        assert_eq!(sink.value(topic::HEAT_MODE), Some("off"));
        assert_eq!(sink.value(topic::HEATING_MODE), Some("OFF"));

        state.heating_mode = HeatingMode::ReadyInRest;
        let mut sink = Recorder::default();
        publish_status(&mut sink, &state, TemperatureScale::Fahrenheit, true);
        assert_eq!(sink.value(topic::HEAT_MODE), None, "no value defined for Ready-in-Rest");
        assert_eq!(sink.value(topic::HEATING_MODE), Some("OFF"));
    }

    #[test]
    fn test_fault_topics_use_plural_clock_leaves() {
        let log = SpaFaultLog {
            total_entries: 2,
            current_entry: 1,
            fault_code: 16,
            days_ago: 1,
            hour: 7,
            minute: 45,
        };
        let mut sink = Recorder::default();
        publish_fault_log(&mut sink, &log);
        assert_eq!(sink.value("Spa/fault/Hours"), Some("7"));
        assert_eq!(sink.value("Spa/fault/Minutes"), Some("45"));
        assert_eq!(sink.value("Spa/fault/Hour"), None);
        assert_eq!(sink.value("Spa/fault/Minute"), None);
    }

    #[test]
    fn test_unknown_temperature_passes_through() {
        let mut state = sample_state();
        state.current_temp = TEMP_UNKNOWN;
        let mut sink = Recorder::default();
        publish_status(&mut sink, &state, TemperatureScale::Fahrenheit, true);
        assert_eq!(sink.value(topic::TEMPERATURE), Some(VALUE_UNKNOWN));
    }

    #[test]
    fn test_rejected_reading_is_withheld() {
        let mut sink = Recorder::default();
        publish_status(&mut sink, &sample_state(), TemperatureScale::Fahrenheit, false);
        assert_eq!(sink.value(topic::TEMPERATURE), None);
        // Everything else still publishes.
        assert_eq!(sink.value(topic::TARGET_TEMP), Some("102.00"));
    }

    #[test]
    fn test_filter_cycle_json_shape() {
        let settings = SpaFilterSettings {
            filter1: FilterCycle {
                start_hour: 8,
                start_minute: 0,
                duration_hour: 2,
                duration_minute: 30,
            },
            filter2: FilterCycle {
                start_hour: 19,
                start_minute: 15,
                duration_hour: 1,
                duration_minute: 0,
            },
            filter2_enabled: true,
        };
        let mut sink = Recorder::default();
        publish_filter_settings(&mut sink, &settings);
        assert_eq!(
            sink.value(topic::FILTER_1),
            Some("{\"start\":\"08:00\",\"duration\":\"02:30\"}")
        );
        assert_eq!(
            sink.value(topic::FILTER_2),
            Some("{\"start\":\"19:15\",\"duration\":\"01:00\"}")
        );
        assert_eq!(sink.value(topic::FILTER_2_ENABLED), Some("ON"));
    }
}
