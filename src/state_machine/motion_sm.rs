//! Motion state machine shared by the arrangement widgets.
//!
//! Hierarchy:
//! ```text
//! Free (superstate)                       Dragging
//!   ├── Idle        ── Grab ──────────────→  │
//!   ├── Animating   ←─ Release{coast: no} ───┤
//!   └── Coasting    ←─ Release{coast: yes} ──┘
//! ```
//!
//! Exactly one motion owns a widget's mutable rotation/offset at a time:
//! a `Grab` from any free state preempts whatever animation was running, so
//! a stale momentum loop can never write after a new drag has started.

use statig::prelude::*;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum MotionEvent {
    /// Pointer pressed on one of the widget's panes.
    Grab,
    /// Pointer released. `coast` selects momentum decay over easing.
    Release { coast: bool },
    /// A new target was set (focus change, wheel, config change).
    Retarget,
    /// The current value reached its target.
    Settled,
}

pub struct MotionMachine {
    /// Log target of the owning widget.
    pub owner: &'static str,
}

impl MotionMachine {
    pub fn new(owner: &'static str) -> Self {
        Self { owner }
    }
}

#[state_machine(
    initial = "State::idle()",
    state(derive(Debug, Clone, PartialEq, Eq))
)]
impl MotionMachine {
    #[superstate]
    fn free(&mut self, event: &MotionEvent) -> Outcome<State> {
        match event {
            MotionEvent::Grab => Transition(State::dragging()),
            MotionEvent::Retarget => Transition(State::animating()),
            _ => Handled,
        }
    }

    /// At rest on its target.
    #[state(superstate = "free")]
    fn idle(&mut self, event: &MotionEvent) -> Outcome<State> {
        match event {
            MotionEvent::Settled => Handled,
            _ => Super,
        }
    }

    /// Easing toward the target.
    #[state(superstate = "free", entry_action = "enter_animating")]
    fn animating(&mut self, event: &MotionEvent) -> Outcome<State> {
        match event {
            MotionEvent::Settled => Transition(State::idle()),
            MotionEvent::Retarget => Handled,
            _ => Super,
        }
    }

    /// Decaying release momentum; ends with a `Retarget` to a resting point.
    #[state(superstate = "free", entry_action = "enter_coasting")]
    fn coasting(&mut self, event: &MotionEvent) -> Outcome<State> {
        match event {
            MotionEvent::Settled => Transition(State::idle()),
            _ => Super,
        }
    }

    /// Pointer owns the value.
    #[state(entry_action = "enter_dragging")]
    fn dragging(&mut self, event: &MotionEvent) -> Outcome<State> {
        match event {
            MotionEvent::Release { coast: true } => Transition(State::coasting()),
            MotionEvent::Release { coast: false } => Transition(State::animating()),
            _ => Handled,
        }
    }

    #[action]
    fn enter_animating(&mut self) {
        debug!(target: "motion", owner = self.owner, "animating");
    }

    #[action]
    fn enter_coasting(&mut self) {
        debug!(target: "motion", owner = self.owner, "coasting");
    }

    #[action]
    fn enter_dragging(&mut self) {
        debug!(target: "motion", owner = self.owner, "dragging");
    }
}

impl State {
    pub fn is_dragging(&self) -> bool {
        matches!(self, State::Dragging {})
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, State::Idle {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_animates_then_settles() {
        let mut sm = MotionMachine::new("test").state_machine();
        assert!(sm.state().is_idle());

        sm.handle(&MotionEvent::Retarget);
        assert_eq!(sm.state(), &State::animating());

        sm.handle(&MotionEvent::Settled);
        assert_eq!(sm.state(), &State::idle());
    }

    #[test]
    fn grab_preempts_coasting() {
        let mut sm = MotionMachine::new("test").state_machine();
        sm.handle(&MotionEvent::Grab);
        sm.handle(&MotionEvent::Release { coast: true });
        assert_eq!(sm.state(), &State::coasting());

        sm.handle(&MotionEvent::Grab);
        assert!(sm.state().is_dragging());

        // Retargeting mid-drag does not steal the value from the pointer.
        sm.handle(&MotionEvent::Retarget);
        assert!(sm.state().is_dragging());
    }

    #[test]
    fn coasting_resolves_through_retarget() {
        let mut sm = MotionMachine::new("test").state_machine();
        sm.handle(&MotionEvent::Grab);
        sm.handle(&MotionEvent::Release { coast: true });
        sm.handle(&MotionEvent::Retarget);
        assert_eq!(sm.state(), &State::animating());
    }

    #[test]
    fn release_without_momentum_eases() {
        let mut sm = MotionMachine::new("test").state_machine();
        sm.handle(&MotionEvent::Grab);
        sm.handle(&MotionEvent::Release { coast: false });
        assert_eq!(sm.state(), &State::animating());
    }
}
