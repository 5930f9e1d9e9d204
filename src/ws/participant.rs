//! Participant message handlers
//!
//! Joining the quiz and submitting answers.

use super::handlers::Outcome;
use crate::protocol::ServerMessage;
use crate::state::{Session, SubmitOutcome};
use crate::types::{Answer, ConnectionId, PlayerId};

pub fn handle_join(
    session: &mut Session,
    conn: &ConnectionId,
    token: Option<PlayerId>,
    name: String,
) -> Outcome {
    tracing::info!("Join request on {}: {:?} (token {:?})", conn, name, token);
    match session.join(conn, token, &name) {
        Ok(joined) => Outcome::reply(ServerMessage::Joined {
            player: joined.player,
        }),
        Err(e) => {
            tracing::info!("Join rejected: {}", e);
            Outcome::reply(e.into())
        }
    }
}

/// Submissions never produce a reply; rejected ones are dropped silently
pub fn handle_submit_answer(
    session: &mut Session,
    conn: &ConnectionId,
    answer_index: Option<usize>,
) -> Outcome {
    let Some(player_id) = session.player_for(conn).map(|p| p.id) else {
        tracing::debug!("Submission from unbound connection {} ignored", conn);
        return Outcome::none();
    };

    match session.submit_answer(player_id, Answer::from(answer_index)) {
        SubmitOutcome::Recorded => {}
        ignored => {
            tracing::debug!("Submission from {} ignored: {:?}", player_id, ignored);
        }
    }
    Outcome::none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::{roster, round};

    #[test]
    fn test_join_reply_carries_token() {
        let mut session = Session::new(roster());
        let outcome = handle_join(&mut session, &"c1".to_string(), None, "Carol".to_string());

        match outcome.reply {
            Some(ServerMessage::Joined { player }) => {
                assert_eq!(player.name, "Carol");
                assert!(session.participants().get(player.id).is_some());
            }
            other => panic!("Expected Joined, got {:?}", other),
        }
    }

    #[test]
    fn test_join_off_roster_replies_error() {
        let mut session = Session::new(roster());
        let outcome = handle_join(&mut session, &"c1".to_string(), Some(3), "Eve".to_string());

        match outcome.reply {
            Some(ServerMessage::Error { code, .. }) => assert_eq!(code, "NOT_ON_ROSTER"),
            other => panic!("Expected NOT_ON_ROSTER, got {:?}", other),
        }
    }

    #[test]
    fn test_submission_uses_connection_identity() {
        let mut session = Session::new(roster());
        let conn = "c1".to_string();
        handle_join(&mut session, &conn, None, "Dave".to_string());
        session.start_quiz(round(4)).unwrap();

        let outcome = handle_submit_answer(&mut session, &conn, Some(4));
        assert!(outcome.reply.is_none());
        assert_eq!(session.submissions().len(), 1);
        assert_eq!(session.submissions()[0].player_name, "Dave");

        // Unbound connection is ignored
        handle_submit_answer(&mut session, &"c2".to_string(), Some(4));
        assert_eq!(session.submissions().len(), 1);
    }
}
