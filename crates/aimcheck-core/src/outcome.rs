use serde::{Deserialize, Serialize};

use crate::token::Token;

/// Lifecycle state of a challenge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChallengeStatus {
    #[default]
    Idle,
    Active,
    Won,
    Lost,
}

impl ChallengeStatus {
    /// Whether `self -> next` is an allowed edge.
    pub fn can_transition_to(self, next: ChallengeStatus) -> bool {
        use ChallengeStatus::*;
        matches!(
            (self, next),
            (Idle, Active) | (Active, Won) | (Active, Lost) | (Won | Lost | Active, Idle)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ChallengeStatus::Won | ChallengeStatus::Lost)
    }
}

/// Read-only record exposed to the host after a win.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeResult {
    pub score: u32,
    /// Whole seconds left on the clock at the moment of winning.
    pub time_remaining: u32,
    pub token: Token,
}

/// Extra information attached to a status notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusPayload {
    Started {
        time_left: u32,
        targets_required: u32,
    },
    /// The countdown crossed the warning threshold.
    TimeWarning { time_left: u32 },
    /// A wrong action failed the current round; a fresh round follows after
    /// `restart_in_ms`.
    RoundFailed { restart_in_ms: u64 },
    RoundRestarted,
    Won(ChallengeResult),
    Lost { score: u32 },
    Reset,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ChallengeStatus::*;

    #[test]
    fn allowed_edges() {
        assert!(Idle.can_transition_to(Active));
        assert!(Active.can_transition_to(Won));
        assert!(Active.can_transition_to(Lost));
        assert!(Won.can_transition_to(Idle));
        assert!(Lost.can_transition_to(Idle));
        assert!(Active.can_transition_to(Idle));
    }

    #[test]
    fn forbidden_edges() {
        assert!(!Idle.can_transition_to(Won));
        assert!(!Idle.can_transition_to(Lost));
        assert!(!Won.can_transition_to(Active));
        assert!(!Lost.can_transition_to(Won));
        assert!(!Active.can_transition_to(Active));
        assert!(!Idle.can_transition_to(Idle));
    }
}
