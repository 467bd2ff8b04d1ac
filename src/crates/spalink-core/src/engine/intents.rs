//! Pending user intents: the dirty bits the poll scheduler drains.
//!
//! Both slots are last-writer-wins. A burst of toggle presses collapses to
//! the newest one; the master re-polls fast enough that a user can only
//! perceive the final state anyway. The setpoint slot is separate from the
//! toggle slot so a stream of toggles can never starve a temperature
//! change.

/// Dirty set consumed one entry per Clear-to-Send.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntentSet {
    set_temp: Option<u8>,
    toggle: Option<u8>,
}

impl IntentSet {
    /// Records a raw setpoint byte (already clamped by the caller).
    pub fn request_temperature(&mut self, raw: u8) {
        self.set_temp = Some(raw);
    }

    /// Records a toggle code, replacing any not-yet-sent one.
    pub fn request_toggle(&mut self, code: u8) {
        self.toggle = Some(code);
    }

    /// Takes the pending setpoint, clearing the dirty bit.
    pub fn take_set_temp(&mut self) -> Option<u8> {
        self.set_temp.take()
    }

    /// Takes the pending toggle code, clearing the dirty bit.
    pub fn take_toggle(&mut self) -> Option<u8> {
        self.toggle.take()
    }
}
