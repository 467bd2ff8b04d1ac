//! Address acquisition on the multicast assignment channel.
//!
//! A fresh client holds no bus address. The master polls channel 0xFE for
//! newcomers; we answer once, wait for an assignment, acknowledge it, and
//! keep that address for the lifetime of the engine. Re-assignments after
//! that are ignored: the observed protocol never re-homes a client that
//! acked, and guessing would be worse than staying put.

use tracing::{debug, info};

use crate::protocol::messages::CLIENT_ADDRESS_MAX;

/// Address acquisition state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Registration {
    /// No address; answer the next new-client poll.
    #[default]
    Unassigned,
    /// Request sent; waiting for the master's assignment.
    Requested,
    /// Address held for the lifetime of the engine.
    Assigned(u8),
}

impl Registration {
    /// Our bus address, once assigned.
    pub fn address(&self) -> Option<u8> {
        match self {
            Registration::Assigned(a) => Some(*a),
            _ => None,
        }
    }

    /// Handles a new-client poll (kind 0x00 on channel 0xFE).
    ///
    /// Returns `true` when a new-client request should be transmitted.
    pub fn on_new_client_poll(&mut self) -> bool {
        match self {
            Registration::Unassigned => {
                debug!("new-client poll received, requesting an address");
                *self = Registration::Requested;
                true
            }
            _ => false,
        }
    }

    /// Handles an address assignment (kind 0x02 on channel 0xFE).
    ///
    /// Returns the accepted address (clamped to the legal maximum) when the
    /// assignment should be acked, or `None` if it is not ours to take.
    pub fn on_assignment(&mut self, candidate: u8) -> Option<u8> {
        match self {
            Registration::Requested => {
                let address = candidate.min(CLIENT_ADDRESS_MAX);
                info!(address, "bus address assigned");
                *self = Registration::Assigned(address);
                Some(address)
            }
            _ => None,
        }
    }
}
