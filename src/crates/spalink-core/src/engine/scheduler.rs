//! Reply selection for Clear-to-Send turns, and the fetch lifecycle.
//!
//! Every CTS earns the master exactly one frame back. User intents go
//! first so a command's perceived latency is one poll interval; background
//! fetches fill otherwise idle turns; a turn with nothing to say answers
//! Nothing-to-Send. The fault log is pulled before the filter
//! schedule; that ordering matches the board's own conversational pattern, and the
//! filter request is gated on the fault log having arrived.

use tracing::debug;

use crate::domain::state::FetchStage;
use crate::engine::intents::IntentSet;
use crate::protocol::messages::SettingsRequest;

/// Artifacts pulled from the master on idle turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Config,
    FaultLog,
    FilterCycles,
}

/// What to put on the wire for one bus turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    SetTemperature(u8),
    Toggle(u8),
    Request(SettingsRequest),
    NothingToSend,
}

/// Interval between re-arms of the re-fetchable artifacts, in spa minutes.
const REARM_INTERVAL_MINUTES: u8 = 5;

/// Fetch stages for the three pulled artifacts plus re-arm bookkeeping.
#[derive(Debug, Default)]
pub struct FetchPlan {
    config: FetchStage,
    fault_log: FetchStage,
    filter: FetchStage,
    fault_log_rearm_minute: Option<u8>,
    filter_rearm_minute: Option<u8>,
}

impl FetchPlan {
    /// Picks the reply for one Clear-to-Send, consuming at most one intent
    /// and advancing at most one fetch stage.
    pub fn next_reply(&mut self, intents: &mut IntentSet) -> Reply {
        if let Some(raw) = intents.take_set_temp() {
            return Reply::SetTemperature(raw);
        }
        if let Some(code) = intents.take_toggle() {
            return Reply::Toggle(code);
        }
        if self.config == FetchStage::Want {
            self.config = FetchStage::Requested;
            return Reply::Request(SettingsRequest::Configuration);
        }
        if self.fault_log == FetchStage::Want {
            self.fault_log = FetchStage::Requested;
            return Reply::Request(SettingsRequest::FaultLog { entry: 0xFF });
        }
        if self.fault_log_arrived() && self.filter == FetchStage::Want {
            self.filter = FetchStage::Requested;
            return Reply::Request(SettingsRequest::FilterCycles);
        }
        Reply::NothingToSend
    }

    /// Marks an artifact's response as decoded.
    pub fn mark_received(&mut self, artifact: Artifact) {
        *self.stage_mut(artifact) = FetchStage::Received;
    }

    /// Marks an artifact's events as emitted.
    pub fn mark_published(&mut self, artifact: Artifact) {
        *self.stage_mut(artifact) = FetchStage::Published;
    }

    pub fn stage(&self, artifact: Artifact) -> FetchStage {
        match artifact {
            Artifact::Config => self.config,
            Artifact::FaultLog => self.fault_log,
            Artifact::FilterCycles => self.filter,
        }
    }

    /// Re-arm driven by the spa clock carried in status telegrams: on every
    /// minute divisible by five, each re-fetchable artifact goes back to
    /// `Want` once. Configuration is fetched once per session and is never
    /// re-armed. A stale `Requested` (the response was dropped) re-arms
    /// too; the bus re-polls constantly, so this is the whole recovery
    /// story.
    pub fn on_status_minute(&mut self, minute: u8) {
        if minute % REARM_INTERVAL_MINUTES != 0 {
            return;
        }
        if self.fault_log_rearm_minute != Some(minute) && Self::rearmable(self.fault_log) {
            debug!(minute, "re-arming fault log fetch");
            self.fault_log = FetchStage::Want;
            self.fault_log_rearm_minute = Some(minute);
        }
        if self.filter_rearm_minute != Some(minute) && Self::rearmable(self.filter) {
            debug!(minute, "re-arming filter cycle fetch");
            self.filter = FetchStage::Want;
            self.filter_rearm_minute = Some(minute);
        }
    }

    /// Host-driven re-arm for callers with a wall clock (same transitions
    /// as the status-minute path, unconditionally).
    pub fn rearm(&mut self) {
        if Self::rearmable(self.fault_log) {
            self.fault_log = FetchStage::Want;
        }
        if Self::rearmable(self.filter) {
            self.filter = FetchStage::Want;
        }
    }

    fn fault_log_arrived(&self) -> bool {
        matches!(
            self.fault_log,
            FetchStage::Received | FetchStage::Published
        )
    }

    fn rearmable(stage: FetchStage) -> bool {
        matches!(stage, FetchStage::Published | FetchStage::Requested)
    }

    fn stage_mut(&mut self, artifact: Artifact) -> &mut FetchStage {
        match artifact {
            Artifact::Config => &mut self.config,
            Artifact::FaultLog => &mut self.fault_log,
            Artifact::FilterCycles => &mut self.filter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn published_plan() -> FetchPlan {
        let mut plan = FetchPlan::default();
        for artifact in [Artifact::Config, Artifact::FaultLog, Artifact::FilterCycles] {
            plan.mark_received(artifact);
            plan.mark_published(artifact);
        }
        plan
    }

    #[test]
    fn test_setpoint_preempts_everything() {
        let mut plan = FetchPlan::default();
        let mut intents = IntentSet::default();
        intents.request_toggle(0x04);
        intents.request_temperature(102);
        assert_eq!(plan.next_reply(&mut intents), Reply::SetTemperature(102));
        assert_eq!(plan.next_reply(&mut intents), Reply::Toggle(0x04));
        // Intents drained; fetches resume.
        assert_eq!(
            plan.next_reply(&mut intents),
            Reply::Request(SettingsRequest::Configuration)
        );
    }

    #[test]
    fn test_fetch_ladder_order() {
        let mut plan = FetchPlan::default();
        let mut intents = IntentSet::default();
        assert_eq!(
            plan.next_reply(&mut intents),
            Reply::Request(SettingsRequest::Configuration)
        );
        plan.mark_received(Artifact::Config);
        plan.mark_published(Artifact::Config);
        assert_eq!(
            plan.next_reply(&mut intents),
            Reply::Request(SettingsRequest::FaultLog { entry: 0xFF })
        );
        // Fault log still in flight: the filter request must wait.
        assert_eq!(plan.next_reply(&mut intents), Reply::NothingToSend);
        plan.mark_received(Artifact::FaultLog);
        assert_eq!(
            plan.next_reply(&mut intents),
            Reply::Request(SettingsRequest::FilterCycles)
        );
    }

    #[test]
    fn test_idle_when_everything_published() {
        let mut plan = published_plan();
        let mut intents = IntentSet::default();
        assert_eq!(plan.next_reply(&mut intents), Reply::NothingToSend);
    }

    #[test]
    fn test_rearm_on_five_minute_boundary() {
        let mut plan = published_plan();
        plan.on_status_minute(10);
        assert_eq!(plan.stage(Artifact::FaultLog), FetchStage::Want);
        assert_eq!(plan.stage(Artifact::FilterCycles), FetchStage::Want);
        assert_eq!(plan.stage(Artifact::Config), FetchStage::Published);
    }

    #[test]
    fn test_rearm_fires_once_per_minute() {
        let mut plan = published_plan();
        plan.on_status_minute(10);
        let mut intents = IntentSet::default();
        assert_eq!(
            plan.next_reply(&mut intents),
            Reply::Request(SettingsRequest::FaultLog { entry: 0xFF })
        );
        // Same minute seen again: the in-flight request must not re-arm.
        plan.on_status_minute(10);
        assert_eq!(plan.stage(Artifact::FaultLog), FetchStage::Requested);
    }

    #[test]
    fn test_rearm_skips_off_boundary_minutes() {
        let mut plan = published_plan();
        plan.on_status_minute(7);
        assert_eq!(plan.stage(Artifact::FaultLog), FetchStage::Published);
    }

    #[test]
    fn test_stale_request_self_heals() {
        let mut plan = FetchPlan::default();
        plan.mark_received(Artifact::Config);
        plan.mark_published(Artifact::Config);
        let mut intents = IntentSet::default();
        // Fault log requested, response lost on the wire.
        assert_eq!(
            plan.next_reply(&mut intents),
            Reply::Request(SettingsRequest::FaultLog { entry: 0xFF })
        );
        plan.on_status_minute(15);
        assert_eq!(plan.stage(Artifact::FaultLog), FetchStage::Want);
        // Configuration has no re-arm; a lost response stays lost.
        assert_eq!(plan.stage(Artifact::Config), FetchStage::Published);
    }

    #[test]
    fn test_host_rearm_matches_minute_rearm() {
        let mut plan = published_plan();
        plan.rearm();
        assert_eq!(plan.stage(Artifact::FaultLog), FetchStage::Want);
        assert_eq!(plan.stage(Artifact::FilterCycles), FetchStage::Want);
        assert_eq!(plan.stage(Artifact::Config), FetchStage::Published);
    }
}
