use crate::types::{PlayerId, QuizMode};

/// Reasons a command is rejected. A rejected command never mutates the session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("{command} is not allowed in mode {mode:?}")]
    WrongMode {
        command: &'static str,
        mode: QuizMode,
    },

    #[error("Invalid round config: {0}")]
    InvalidRoundConfig(String),

    #[error("Unknown participant {0}")]
    UnknownParticipant(PlayerId),

    #[error("Name {0:?} is not on the roster")]
    NotOnRoster(String),

    #[error("Participant {0} is not a winner")]
    NotAWinner(PlayerId),

    #[error("Only the admin can {0}")]
    Unauthorized(&'static str),

    #[error("Session coordinator is not running")]
    Unavailable,
}

impl SessionError {
    /// Stable wire code sent in `error` messages
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::WrongMode { .. } => "WRONG_MODE",
            SessionError::InvalidRoundConfig(_) => "INVALID_ROUND_CONFIG",
            SessionError::UnknownParticipant(_) => "UNKNOWN_PARTICIPANT",
            SessionError::NotOnRoster(_) => "NOT_ON_ROSTER",
            SessionError::NotAWinner(_) => "NOT_A_WINNER",
            SessionError::Unauthorized(_) => "UNAUTHORIZED",
            SessionError::Unavailable => "UNAVAILABLE",
        }
    }
}
