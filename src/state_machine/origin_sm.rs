//! Stage origin state machine.
//!
//! ```text
//! Easing ←→ Dragging
//! ```
//!
//! While `Easing`, the stage origin follows its target with exponential
//! smoothing and out-of-range targets are pulled back into range. While
//! `Dragging`, the origin tracks the pointer 1:1 and range pull-back is
//! paused.

use statig::prelude::*;
use tracing::debug;

#[derive(Debug, Clone)]
pub enum OriginEvent {
    /// Pointer went down on the stage root.
    Grab,
    /// Pointer released; `momentum` is the carry-over added to the target.
    Release { momentum_x: f64, momentum_y: f64 },
}

/// Shared storage: counts completed drags for diagnostics.
#[derive(Debug, Default)]
pub struct OriginMachine {
    pub drags: u64,
}

#[state_machine(
    initial = "State::easing()",
    state(derive(Debug, Clone, PartialEq, Eq))
)]
impl OriginMachine {
    /// Default mode: origin eases toward its target every frame.
    #[state]
    fn easing(&mut self, event: &OriginEvent) -> Outcome<State> {
        match event {
            OriginEvent::Grab => Transition(State::dragging()),
            OriginEvent::Release { .. } => Handled,
        }
    }

    /// Origin follows the pointer directly.
    #[state(entry_action = "enter_dragging")]
    fn dragging(&mut self, event: &OriginEvent) -> Outcome<State> {
        match event {
            OriginEvent::Grab => Handled,
            OriginEvent::Release { momentum_x, momentum_y } => {
                self.drags += 1;
                debug!(target: "stage", momentum_x, momentum_y, drags = self.drags, "drag released");
                Transition(State::easing())
            }
        }
    }

    #[action]
    fn enter_dragging(&mut self) {
        debug!(target: "stage", "drag started");
    }
}
