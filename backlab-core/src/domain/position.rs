//! Long/flat position state machine.

use serde::{Deserialize, Serialize};

/// Position held on a single ticker. Only long or flat: no short selling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionState {
    #[default]
    Flat,
    Long,
}

/// A state change triggered by a signal on one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Enter,
    Exit,
}

impl PositionState {
    /// Decide the transition for this bar's signals.
    ///
    /// Only the transition reachable from the current state is taken, so when
    /// both flags are set an exit wins while Long and an entry wins while Flat.
    /// Entry while Long and exit while Flat are no-ops.
    pub fn transition(self, entry: bool, exit: bool) -> Option<Transition> {
        match self {
            PositionState::Flat if entry => Some(Transition::Enter),
            PositionState::Long if exit => Some(Transition::Exit),
            _ => None,
        }
    }

    /// State after applying a transition.
    pub fn apply(self, transition: Transition) -> Self {
        match transition {
            Transition::Enter => PositionState::Long,
            Transition::Exit => PositionState::Flat,
        }
    }

    pub fn is_long(self) -> bool {
        self == PositionState::Long
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PositionState::Flat => "flat",
            PositionState::Long => "long",
        }
    }
}
