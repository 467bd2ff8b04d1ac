//! Domain types for the spa: decoded equipment configuration, running
//! state, fault log, and filter schedule.
//!
//! Nothing in this module touches the wire. The byte-level decoders in
//! [`crate::protocol::codec`] produce these records; the engine diffs and
//! publishes them. All types are plain data, cloneable, and serde-friendly
//! so snapshots can travel across whatever boundary the host puts them.

pub mod state;
pub mod temperature;

pub use state::{
    FetchStage, FilterCycle, HeatState, HeatingMode, SpaConfig, SpaFaultLog, SpaFilterSettings,
    SpaSnapshot, SpaState, TempRange,
};
pub use temperature::{GlitchFilter, TemperatureScale, TEMP_UNKNOWN};
