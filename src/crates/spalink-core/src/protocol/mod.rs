//! Wire protocol: framing, CRC, message tables, and telegram decoders.
//!
//! # How the bus works
//!
//! The spa's control board is the bus master on a polled RS-485 link.
//! Everything travels in sentinel-delimited frames (see [`framing`]):
//!
//! 1. The master periodically polls channel 0xFE for new clients; a client
//!    without an address answers and is assigned one in the 0x10–0x2F range.
//! 2. The master grants each addressed client bus turns with Clear-to-Send
//!    frames; the client must answer every CTS with exactly one frame.
//! 3. The master broadcasts the full spa state on channel 0xFF a few times
//!    a second; configuration, fault log, and filter schedule are pulled on
//!    demand with settings requests.
//!
//! # Sub-modules
//!
//! - **`framing`**  – sentinel scanning, length/CRC validation, encoding.
//! - **`crc`**      – the 8-bit checksum both directions use.
//! - **`messages`** – message kinds, addresses, toggle and fault tables.
//! - **`codec`**    – payload decoders producing [`crate::domain`] records.

pub mod codec;
pub mod crc;
pub mod framing;
pub mod messages;

pub use codec::DecodeError;
pub use framing::{Frame, FrameError, FrameReader, MAX_FRAME_LEN, SENTINEL};
pub use messages::{MessageKind, SettingsRequest, ToggleItem};
