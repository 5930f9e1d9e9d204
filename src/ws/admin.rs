//! Admin-only command handlers
//!
//! All handlers in this module require the Admin role.
//! Authorization is checked in the main dispatch layer before calling these.

use super::handlers::Outcome;
use crate::protocol::ServerMessage;
use crate::state::Session;
use crate::types::{PlayerId, RoundConfig};

pub fn handle_start_quiz(session: &mut Session, round: RoundConfig) -> Outcome {
    tracing::info!("Admin starting quiz: {:?}", round.question);
    Outcome::from_result(session.start_quiz(round))
}

pub fn handle_force_end_quiz(session: &mut Session) -> Outcome {
    tracing::info!("Admin ending quiz");
    Outcome::from_result(session.force_end_quiz())
}

pub fn handle_show_results(session: &mut Session) -> Outcome {
    tracing::info!("Admin showing results");
    Outcome::from_result(session.show_results().map(|_| ()))
}

pub fn handle_reset_quiz(session: &mut Session) -> Outcome {
    tracing::info!("Admin resetting quiz");
    Outcome::from_result(session.reset_quiz())
}

pub fn handle_reset_winner(session: &mut Session, player_id: PlayerId) -> Outcome {
    tracing::info!("Admin resetting winner {}", player_id);
    Outcome::from_result(session.reset_winner(player_id))
}

pub fn handle_reset_all_winners(session: &mut Session) -> Outcome {
    tracing::info!("Admin resetting all winners");
    session.reset_all_winners();
    Outcome::none()
}

pub fn handle_clear_history(session: &mut Session) -> Outcome {
    tracing::info!("Admin clearing history");
    session.clear_history();
    Outcome::none()
}

/// Removes the participant and tells their connection to drop its token
pub fn handle_force_logout(session: &mut Session, player_id: PlayerId) -> Outcome {
    tracing::info!("Admin forcing logout of {}", player_id);
    match session.force_logout(player_id) {
        Ok(conns) => Outcome {
            reply: None,
            notify: conns
                .into_iter()
                .map(|conn| (conn, ServerMessage::ForceLogout))
                .collect(),
        },
        Err(e) => Outcome::reply(e.into()),
    }
}
