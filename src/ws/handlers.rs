//! WebSocket message dispatch
//!
//! Runs inside the coordinator task with exclusive access to the session.
//! Authorization is checked here, then dispatched to role-specific handler modules.

use crate::error::SessionError;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::Session;
use crate::types::{ConnectionId, Role};

use super::{admin, participant};

/// What a handled message produces besides the session mutation itself
#[derive(Debug, Default)]
pub struct Outcome {
    /// Sent back to the originating connection only
    pub reply: Option<ServerMessage>,
    /// Targeted messages for other connections
    pub notify: Vec<(ConnectionId, ServerMessage)>,
}

impl Outcome {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn reply(msg: ServerMessage) -> Self {
        Self {
            reply: Some(msg),
            notify: Vec::new(),
        }
    }

    /// No reply on success, the error on rejection
    pub fn from_result(result: Result<(), SessionError>) -> Self {
        match result {
            Ok(()) => Self::none(),
            Err(e) => {
                tracing::info!("Command rejected: {}", e);
                Self::reply(e.into())
            }
        }
    }
}

/// Macro to check admin authorization and return early if unauthorized
macro_rules! check_admin {
    ($role:expr, $action:expr) => {
        if *$role != Role::Admin {
            tracing::warn!("Non-admin connection tried to {}", $action);
            return Outcome::reply(SessionError::Unauthorized($action).into());
        }
    };
}

/// Handle a client message from `conn`
pub fn handle_message(
    msg: ClientMessage,
    conn: &ConnectionId,
    role: &Role,
    session: &mut Session,
) -> Outcome {
    match msg {
        // Participant messages
        ClientMessage::Join { id, name } => participant::handle_join(session, conn, id, name),

        ClientMessage::SubmitAnswer { answer_index } => {
            participant::handle_submit_answer(session, conn, answer_index)
        }

        // Admin-only commands (authorization checked before dispatch)
        ClientMessage::StartQuiz { round } => {
            check_admin!(role, "start a quiz");
            admin::handle_start_quiz(session, round)
        }

        ClientMessage::ForceEndQuiz => {
            check_admin!(role, "end a quiz");
            admin::handle_force_end_quiz(session)
        }

        ClientMessage::ShowResults => {
            check_admin!(role, "show results");
            admin::handle_show_results(session)
        }

        ClientMessage::ResetQuiz => {
            check_admin!(role, "reset the quiz");
            admin::handle_reset_quiz(session)
        }

        ClientMessage::ResetWinner { player_id } => {
            check_admin!(role, "reset winners");
            admin::handle_reset_winner(session, player_id)
        }

        ClientMessage::ResetAllWinners => {
            check_admin!(role, "reset winners");
            admin::handle_reset_all_winners(session)
        }

        ClientMessage::ClearHistory => {
            check_admin!(role, "clear history");
            admin::handle_clear_history(session)
        }

        ClientMessage::ForceLogoutParticipant { player_id } => {
            check_admin!(role, "log out participants");
            admin::handle_force_logout(session, player_id)
        }
    }
}
