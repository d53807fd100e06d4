//! System lifecycle transitions.
//!
//! The cycle is strictly `Idle → Init → Ready → Stop → Idle`. Client
//! requests drive `Idle → Init` and `Ready → Stop`; the control core drives
//! the other two once the corresponding work is done.

use axisd_common::control_unit::state::SystemState;

/// Result of a SystemState transition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition succeeded; carries the new state.
    Ok(SystemState),
    /// Transition rejected with a reason.
    Rejected(&'static str),
}

/// Event that can trigger a lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemEvent {
    /// Client asked for INIT.
    InitRequested,
    /// Axes initialised.
    InitComplete,
    /// Client asked for STOP, or the run flag was cleared.
    StopRequested,
    /// Axes disconnected.
    StopComplete,
}

#[derive(Debug, Clone, Default)]
pub struct SystemStateMachine {
    state: SystemState,
}

impl SystemStateMachine {
    pub const fn new() -> Self {
        Self {
            state: SystemState::Idle,
        }
    }

    #[inline]
    pub const fn state(&self) -> SystemState {
        self.state
    }

    /// Scans only run while READY.
    #[inline]
    pub const fn allows_scan(&self) -> bool {
        matches!(self.state, SystemState::Ready)
    }

    pub fn handle_event(&mut self, event: SystemEvent) -> TransitionResult {
        use SystemEvent::*;
        use SystemState::*;

        let next = match (self.state, event) {
            (Idle, InitRequested) => Init,
            (Init, InitComplete) => Ready,
            (Ready, StopRequested) => Stop,
            (Stop, StopComplete) => Idle,
            _ => return TransitionResult::Rejected(invalid_transition_reason(event)),
        };

        self.state = next;
        TransitionResult::Ok(next)
    }
}

fn invalid_transition_reason(event: SystemEvent) -> &'static str {
    match event {
        SystemEvent::InitRequested => "INIT only accepted while IDLE",
        SystemEvent::StopRequested => "STOP only accepted while READY",
        SystemEvent::InitComplete => "InitComplete outside INIT",
        SystemEvent::StopComplete => "StopComplete outside STOP",
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use SystemEvent::*;
    use SystemState::*;

    const EVENTS: [SystemEvent; 4] = [InitRequested, InitComplete, StopRequested, StopComplete];

    #[test]
    fn initial_state_is_idle() {
        let sm = SystemStateMachine::new();
        assert_eq!(sm.state(), Idle);
        assert!(!sm.allows_scan());
    }

    #[test]
    fn full_cycle() {
        let mut sm = SystemStateMachine::new();
        assert_eq!(sm.handle_event(InitRequested), TransitionResult::Ok(Init));
        assert_eq!(sm.handle_event(InitComplete), TransitionResult::Ok(Ready));
        assert!(sm.allows_scan());
        assert_eq!(sm.handle_event(StopRequested), TransitionResult::Ok(Stop));
        assert_eq!(sm.handle_event(StopComplete), TransitionResult::Ok(Idle));
    }

    #[test]
    fn each_state_has_exactly_one_exit() {
        let expected = [(Idle, Init), (Init, Ready), (Ready, Stop), (Stop, Idle)];
        for (from, to) in expected {
            let accepted: Vec<SystemState> = EVENTS
                .iter()
                .filter_map(|&e| {
                    let mut sm = SystemStateMachine { state: from };
                    match sm.handle_event(e) {
                        TransitionResult::Ok(s) => Some(s),
                        TransitionResult::Rejected(_) => None,
                    }
                })
                .collect();
            assert_eq!(accepted, vec![to], "from {from:?}");
        }
    }

    #[test]
    fn rejected_event_keeps_state() {
        let mut sm = SystemStateMachine::new();
        assert!(matches!(
            sm.handle_event(StopRequested),
            TransitionResult::Rejected(_)
        ));
        assert_eq!(sm.state(), Idle);

        sm.handle_event(InitRequested);
        assert_eq!(
            sm.handle_event(InitRequested),
            TransitionResult::Rejected("INIT only accepted while IDLE")
        );
        assert_eq!(sm.state(), Init);
    }
}
