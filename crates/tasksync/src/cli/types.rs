//! CLI value enums and domain type conversions.

use clap::ValueEnum;

use crate::domain::RemoteState;

/// Remote issue state for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateArg {
    /// Open on the remote tracker
    Open,
    /// Closed on the remote tracker
    Closed,
}

impl std::fmt::Display for StateArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

impl From<StateArg> for RemoteState {
    fn from(arg: StateArg) -> Self {
        match arg {
            StateArg::Open => RemoteState::Open,
            StateArg::Closed => RemoteState::Closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_to_remote_state() {
        assert_eq!(RemoteState::from(StateArg::Open), RemoteState::Open);
        assert_eq!(RemoteState::from(StateArg::Closed), RemoteState::Closed);
        assert_eq!(StateArg::Closed.to_string(), "closed");
    }
}
