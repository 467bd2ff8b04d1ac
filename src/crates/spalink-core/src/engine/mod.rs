//! The protocol engine: one owned record tying the framer, the address
//! FSM, the poll scheduler, the decoders, and the intent set together.
//!
//! # Architecture
//!
//! ```text
//! feed(byte)
//!  └─ FrameReader          -- reassemble + validate
//!      └─ dispatch on (channel, kind)
//!           ├─ 0xFE / 0x00,0x02   -> Registration FSM  -> reply frames
//!           ├─ 0xFF / 0x13        -> status decoder    -> events
//!           ├─ addr / 0x06 (CTS)  -> FetchPlan+intents -> ONE reply frame
//!           └─ addr / 0x23,0x28,0x2E -> artifact decoders -> events
//! ```
//!
//! The engine is single-threaded and never suspends: a Clear-to-Send is
//! answered synchronously inside `feed`, before the next byte is accepted.
//! The caller serializes `feed`, `on_tick`, and the intent setters. Running
//! several engines on distinct ports is fine; nothing here is process-wide.
//!
//! No error tears the engine down. Framing noise is dropped and counted,
//! unknown telegrams are ignored (other clients share the bus), and a
//! transmit failure is handed back to the caller; the master will re-poll.

pub mod events;
pub mod intents;
pub mod registration;
pub mod scheduler;

use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::domain::state::{SpaConfig, SpaFaultLog, SpaFilterSettings, SpaSnapshot, SpaState};
use crate::domain::temperature::{GlitchFilter, TemperatureScale, TEMP_UNKNOWN};
use crate::engine::events::{topic, EventSink};
use crate::engine::intents::IntentSet;
use crate::engine::registration::Registration;
use crate::engine::scheduler::{Artifact, FetchPlan, Reply};
use crate::protocol::codec;
use crate::protocol::framing::{Frame, FrameError, FrameReader};
use crate::protocol::messages::{
    MessageKind, ToggleItem, CHANNEL_ASSIGNMENT, CHANNEL_BROADCAST, MASTER_REPLY, NEW_CLIENT_IDENT,
};

/// Compile-time version string published on `Spa/node/version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Outbound byte channel. `transmit` is called synchronously while
/// answering a Clear-to-Send and must finish within a bus turn; failures
/// are surfaced, never retried.
pub trait Transport {
    fn transmit(&mut self, frame: &[u8]) -> Result<(), TransmitError>;
}

/// The adapter could not put the reply on the wire.
#[derive(Debug, Error)]
#[error("transmit failed: {0}")]
pub struct TransmitError(pub String);

/// Errors surfaced from [`SpaEngine::feed`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Transmit(#[from] TransmitError),

    /// A reply could not be encoded. Reply frames are all small and fixed,
    /// so seeing this means a bug rather than bad input.
    #[error("could not encode reply: {0}")]
    Encode(#[from] FrameError),
}

/// The protocol engine. Owns all state; the transport and the event sink
/// are injected.
pub struct SpaEngine<T: Transport, S: EventSink> {
    transport: T,
    sink: S,
    reader: FrameReader,
    registration: Registration,
    fetch: FetchPlan,
    intents: IntentSet,
    temp_filter: GlitchFilter,
    config: Option<SpaConfig>,
    state: Option<SpaState>,
    fault_log: Option<SpaFaultLog>,
    filter_settings: Option<SpaFilterSettings>,
    last_status_crc: Option<u8>,
    last_config_crc: Option<u8>,
    last_fault_crc: Option<u8>,
    last_filter_crc: Option<u8>,
}

impl<T: Transport, S: EventSink> SpaEngine<T, S> {
    pub fn new(transport: T, sink: S) -> Self {
        Self {
            transport,
            sink,
            reader: FrameReader::new(),
            registration: Registration::default(),
            fetch: FetchPlan::default(),
            intents: IntentSet::default(),
            temp_filter: GlitchFilter::default(),
            config: None,
            state: None,
            fault_log: None,
            filter_settings: None,
            last_status_crc: None,
            last_config_crc: None,
            last_fault_crc: None,
            last_filter_crc: None,
        }
    }

    // ── Entry points ──────────────────────────────────────────────────────

    /// Accepts one inbound byte. Replies to the master, when due, are
    /// transmitted before this returns.
    pub fn feed(&mut self, byte: u8) -> Result<(), EngineError> {
        match self.reader.feed(byte) {
            Some(frame) => self.dispatch(frame),
            None => Ok(()),
        }
    }

    /// Host-driven re-arm of the re-fetchable artifacts. Intended for
    /// callers with a wall clock; the engine also re-arms itself from the
    /// spa clock carried in status telegrams.
    pub fn on_tick(&mut self) {
        self.fetch.rearm();
    }

    /// Records a setpoint intent. The raw byte is clamped to the range the
    /// protocol can represent under the configured scale; a clamp is
    /// reported on the debug topic.
    pub fn set_target_temperature(&mut self, raw: u8) {
        let clamped = self.scale().clamp_raw(raw);
        if clamped != raw {
            debug!(raw, clamped, "setpoint clamped to protocol range");
            self.sink.emit(
                topic::NODE_DEBUG,
                &format!("setpoint {raw} clamped to {clamped}"),
            );
        }
        self.intents.request_temperature(clamped);
    }

    /// Records a toggle intent (last writer wins).
    pub fn toggle(&mut self, item: ToggleItem) {
        self.intents.request_toggle(item.code());
    }

    /// Returns a consistent copy of everything decoded so far.
    pub fn snapshot(&self) -> SpaSnapshot {
        SpaSnapshot {
            config: self.config.clone(),
            state: self.state.clone(),
            fault_log: self.fault_log.clone(),
            filter_settings: self.filter_settings.clone(),
        }
    }

    /// Our bus address, once the handshake has completed.
    pub fn address(&self) -> Option<u8> {
        self.registration.address()
    }

    /// Framing errors counted since the engine was created.
    pub fn frames_with_errors(&self) -> usize {
        self.reader.frames_with_errors()
    }

    // ── Dispatch ──────────────────────────────────────────────────────────

    fn dispatch(&mut self, frame: Frame) -> Result<(), EngineError> {
        let Ok(kind) = MessageKind::try_from(frame.kind) else {
            trace!(kind = frame.kind, dest = frame.dest, "ignoring unknown kind");
            return Ok(());
        };

        match (frame.dest, kind) {
            (CHANNEL_ASSIGNMENT, MessageKind::NewClientPoll) => self.on_new_client_poll(),
            (CHANNEL_ASSIGNMENT, MessageKind::AddressAssignment) => self.on_assignment(&frame),
            (CHANNEL_BROADCAST, MessageKind::StatusUpdate) => {
                self.on_status(&frame);
                Ok(())
            }
            (dest, kind) if Some(dest) == self.registration.address() => match kind {
                MessageKind::ClearToSend => self.on_clear_to_send(dest),
                MessageKind::Configuration => {
                    self.on_config(&frame);
                    Ok(())
                }
                MessageKind::FaultLog => {
                    self.on_fault_log(&frame);
                    Ok(())
                }
                MessageKind::FilterCycles => {
                    self.on_filter_cycles(&frame);
                    Ok(())
                }
                _ => {
                    trace!(?kind, "ignoring directed telegram");
                    Ok(())
                }
            },
            _ => {
                trace!(dest = frame.dest, ?kind, "not for us");
                Ok(())
            }
        }
    }

    // ── Registration ──────────────────────────────────────────────────────

    fn on_new_client_poll(&mut self) -> Result<(), EngineError> {
        if self.registration.on_new_client_poll() {
            self.send(Frame::new(
                CHANNEL_ASSIGNMENT,
                MASTER_REPLY,
                MessageKind::NewClientRequest as u8,
                NEW_CLIENT_IDENT.to_vec(),
            ))?;
        }
        Ok(())
    }

    fn on_assignment(&mut self, frame: &Frame) -> Result<(), EngineError> {
        let Some(&candidate) = frame.payload.first() else {
            trace!("assignment telegram without an address byte");
            return Ok(());
        };
        if let Some(address) = self.registration.on_assignment(candidate) {
            self.send(Frame::new(
                address,
                MASTER_REPLY,
                MessageKind::AddressAck as u8,
                vec![],
            ))?;
            self.sink.emit(topic::NODE_ID, &address.to_string());
            self.sink.emit(topic::NODE_STATE, "ON");
            self.sink.emit(topic::NODE_VERSION, VERSION);
        }
        Ok(())
    }

    // ── Clear-to-Send ─────────────────────────────────────────────────────

    fn on_clear_to_send(&mut self, address: u8) -> Result<(), EngineError> {
        let reply = self.fetch.next_reply(&mut self.intents);
        let frame = match reply {
            Reply::SetTemperature(raw) => Frame::new(
                address,
                MASTER_REPLY,
                MessageKind::SetTemperature as u8,
                vec![raw],
            ),
            Reply::Toggle(code) => Frame::new(
                address,
                MASTER_REPLY,
                MessageKind::ToggleItem as u8,
                vec![code, 0x00],
            ),
            Reply::Request(request) => Frame::new(
                address,
                MASTER_REPLY,
                MessageKind::SettingsRequest as u8,
                request.selector().to_vec(),
            ),
            Reply::NothingToSend => Frame::new(
                address,
                MASTER_REPLY,
                MessageKind::NothingToSend as u8,
                vec![],
            ),
        };
        self.send(frame)
    }

    // ── Inbound decoders ──────────────────────────────────────────────────

    fn on_status(&mut self, frame: &Frame) {
        // An idle spa repeats the same telegram several times a second;
        // identical CRC means identical bytes, so skip the whole decode.
        if self.last_status_crc == Some(frame.crc) {
            return;
        }
        let state = match codec::decode_status(&frame.payload) {
            Ok(state) => state,
            Err(e) => {
                trace!(error = %e, "dropping status telegram");
                return;
            }
        };
        self.last_status_crc = Some(frame.crc);
        self.fetch.on_status_minute(state.minute);

        let scale = self.scale();
        let temp_accepted = if state.current_temp == TEMP_UNKNOWN {
            false
        } else {
            self.temp_filter.accept(scale.degrees(state.current_temp))
        };
        events::publish_status(&mut self.sink, &state, scale, temp_accepted);
        self.state = Some(state);
    }

    fn on_config(&mut self, frame: &Frame) {
        if self.last_config_crc == Some(frame.crc) {
            self.fetch.mark_received(Artifact::Config);
            self.fetch.mark_published(Artifact::Config);
            return;
        }
        let config = match codec::decode_config(&frame.payload, frame.src) {
            Ok(config) => config,
            Err(e) => {
                trace!(error = %e, "dropping configuration telegram");
                return;
            }
        };
        self.last_config_crc = Some(frame.crc);
        self.fetch.mark_received(Artifact::Config);
        events::publish_config(&mut self.sink, &config);
        self.config = Some(config);
        self.fetch.mark_published(Artifact::Config);
    }

    fn on_fault_log(&mut self, frame: &Frame) {
        if self.last_fault_crc == Some(frame.crc) {
            self.fetch.mark_received(Artifact::FaultLog);
            self.fetch.mark_published(Artifact::FaultLog);
            return;
        }
        let log = match codec::decode_fault_log(&frame.payload) {
            Ok(log) => log,
            Err(e) => {
                trace!(error = %e, "dropping fault log telegram");
                return;
            }
        };
        if log.fault_code != 0 {
            warn!(code = log.fault_code, message = log.message(), "spa fault");
        }
        self.last_fault_crc = Some(frame.crc);
        self.fetch.mark_received(Artifact::FaultLog);
        events::publish_fault_log(&mut self.sink, &log);
        self.fault_log = Some(log);
        self.fetch.mark_published(Artifact::FaultLog);
    }

    fn on_filter_cycles(&mut self, frame: &Frame) {
        if self.last_filter_crc == Some(frame.crc) {
            self.fetch.mark_received(Artifact::FilterCycles);
            self.fetch.mark_published(Artifact::FilterCycles);
            return;
        }
        let settings = match codec::decode_filter_cycles(&frame.payload) {
            Ok(settings) => settings,
            Err(e) => {
                trace!(error = %e, "dropping filter cycle telegram");
                return;
            }
        };
        self.last_filter_crc = Some(frame.crc);
        self.fetch.mark_received(Artifact::FilterCycles);
        events::publish_filter_settings(&mut self.sink, &settings);
        self.filter_settings = Some(settings);
        self.fetch.mark_published(Artifact::FilterCycles);
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    fn scale(&self) -> TemperatureScale {
        self.config
            .as_ref()
            .map(|c| c.temp_scale)
            .unwrap_or_default()
    }

    fn send(&mut self, frame: Frame) -> Result<(), EngineError> {
        let bytes = frame.encode()?;
        self.transport.transmit(&bytes)?;
        Ok(())
    }
}
