//! # spalink-core
//!
//! Client-side protocol engine for the Balboa spa controller's RS-485 bus.
//!
//! The engine turns a raw byte stream into a semantic event stream: it
//! reassembles and validates frames, acquires a bus address from the
//! master, answers Clear-to-Send polls with pending commands or background
//! fetches, and decodes status / configuration / fault-log / filter-cycle
//! telegrams into typed records published as `(topic, value)` pairs.
//!
//! The crate has zero dependencies on sockets, serial ports, clocks, or
//! async runtimes. Two small traits are the only seams:
//!
//! - [`engine::Transport`] – where outbound reply frames go.
//! - [`engine::events::EventSink`] – where decoded events go.
//!
//! Physical I/O and the publish/subscribe side live in host adapters such
//! as `spalink-bridge`.
//!
//! - **`protocol`** – framing, CRC, message tables, telegram decoders.
//! - **`domain`**   – typed spa records and the temperature model.
//! - **`engine`**   – the state machine tying it all together.

pub mod domain;
pub mod engine;
pub mod protocol;

pub use domain::{
    SpaConfig, SpaFaultLog, SpaFilterSettings, SpaSnapshot, SpaState, TemperatureScale,
};
pub use engine::events::EventSink;
pub use engine::{EngineError, SpaEngine, TransmitError, Transport, VERSION};
pub use protocol::{Frame, FrameReader, MessageKind, ToggleItem};
