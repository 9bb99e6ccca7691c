//! Guest lifecycle states

use std::fmt;

/// Lifecycle of the hosted guest runtime.
///
/// Transitions only move forward:
/// `Idle -> Starting -> Running -> ExitRequested -> Exited`,
/// with `Starting -> ExitRequested` allowed when the guest never reaches its looper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Bridge constructed, no guest thread yet
    Idle,
    /// Guest thread spawned, looper not yet running
    Starting,
    /// Guest looper is servicing relay events
    Running,
    /// Either side asked the guest to stop
    ExitRequested,
    /// Guest thread returned and its resources were released
    Exited,
}

impl LifecycleState {
    /// Whether `next` is a legal successor of `self`
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Idle, Starting)
                | (Starting, Running)
                | (Starting, ExitRequested)
                | (Running, ExitRequested)
                | (ExitRequested, Exited)
        )
    }

    /// Guest thread exists and has not finished
    pub fn is_active(self) -> bool {
        matches!(self, Self::Starting | Self::Running | Self::ExitRequested)
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Exited
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Starting => write!(f, "starting"),
            Self::Running => write!(f, "running"),
            Self::ExitRequested => write!(f, "exit-requested"),
            Self::Exited => write!(f, "exited"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LifecycleState::*;

    #[test]
    fn test_forward_transitions() {
        assert!(Idle.can_transition_to(Starting));
        assert!(Starting.can_transition_to(Running));
        assert!(Starting.can_transition_to(ExitRequested));
        assert!(Running.can_transition_to(ExitRequested));
        assert!(ExitRequested.can_transition_to(Exited));
    }

    #[test]
    fn test_no_skips_or_regressions() {
        assert!(!Idle.can_transition_to(Running));
        assert!(!Idle.can_transition_to(Exited));
        assert!(!Running.can_transition_to(Exited));
        assert!(!Running.can_transition_to(Starting));
        assert!(!Exited.can_transition_to(Idle));
        assert!(!Exited.can_transition_to(ExitRequested));
    }

    #[test]
    fn test_state_predicates() {
        assert!(!Idle.is_active());
        assert!(Running.is_active());
        assert!(ExitRequested.is_active());
        assert!(Exited.is_terminal());
        assert_eq!(ExitRequested.to_string(), "exit-requested");
    }
}
