use crate::error::SessionError;
use crate::roster::RosterGroup;
use crate::types::*;
use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: &str = "1.0";

/// Messages sent by participant and admin clients.
///
/// The `t` tag carries the event name, payload fields sit beside it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "t")]
pub enum ClientMessage {
    /// Join under a roster name, optionally reclaiming a previously issued id
    #[serde(rename = "participant:join")]
    Join {
        #[serde(default)]
        id: Option<PlayerId>,
        name: String,
    },
    /// The player is implied by the connection
    #[serde(rename = "participant:submitAnswer", rename_all = "camelCase")]
    SubmitAnswer {
        #[serde(default)]
        answer_index: Option<usize>,
    },
    // Admin-only messages
    #[serde(rename = "admin:startQuiz")]
    StartQuiz {
        #[serde(flatten)]
        round: RoundConfig,
    },
    #[serde(rename = "admin:resetQuiz")]
    ResetQuiz,
    #[serde(rename = "admin:forceEndQuiz")]
    ForceEndQuiz,
    #[serde(rename = "admin:showResults")]
    ShowResults,
    #[serde(rename = "admin:resetWinner", rename_all = "camelCase")]
    ResetWinner { player_id: PlayerId },
    #[serde(rename = "admin:resetAllWinners")]
    ResetAllWinners,
    #[serde(rename = "admin:clearHistory")]
    ClearHistory,
    #[serde(rename = "admin:forceLogoutParticipant", rename_all = "camelCase")]
    ForceLogoutParticipant { player_id: PlayerId },
}

impl ClientMessage {
    /// Event name as it appears on the wire
    pub fn event(&self) -> &'static str {
        match self {
            ClientMessage::Join { .. } => "participant:join",
            ClientMessage::SubmitAnswer { .. } => "participant:submitAnswer",
            ClientMessage::StartQuiz { .. } => "admin:startQuiz",
            ClientMessage::ResetQuiz => "admin:resetQuiz",
            ClientMessage::ForceEndQuiz => "admin:forceEndQuiz",
            ClientMessage::ShowResults => "admin:showResults",
            ClientMessage::ResetWinner { .. } => "admin:resetWinner",
            ClientMessage::ResetAllWinners => "admin:resetAllWinners",
            ClientMessage::ClearHistory => "admin:clearHistory",
            ClientMessage::ForceLogoutParticipant { .. } => "admin:forceLogoutParticipant",
        }
    }

    pub fn is_admin_only(&self) -> bool {
        !matches!(
            self,
            ClientMessage::Join { .. } | ClientMessage::SubmitAnswer { .. }
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum ServerMessage {
    /// First message on every connection
    #[serde(rename = "welcome", rename_all = "camelCase")]
    Welcome {
        protocol: String,
        role: Role,
        connection_id: ConnectionId,
        roster: Vec<RosterGroup>,
        state: SessionSnapshot,
    },
    /// Join accepted; `player` is the token the client should keep
    #[serde(rename = "joined")]
    Joined { player: Participant },
    /// Full session snapshot
    #[serde(rename = "stateUpdate")]
    StateUpdate(SessionSnapshot),
    /// Discard the stored identity and go back to name selection
    #[serde(rename = "server:forceLogout")]
    ForceLogout,
    #[serde(rename = "error")]
    Error { code: String, msg: String },
}

impl From<SessionError> for ServerMessage {
    fn from(err: SessionError) -> Self {
        ServerMessage::Error {
            code: err.code().to_string(),
            msg: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_join_with_and_without_token() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"t":"participant:join","id":17,"name":"Alice"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Join {
                id: Some(17),
                name: "Alice".to_string()
            }
        );

        let msg: ClientMessage =
            serde_json::from_str(r#"{"t":"participant:join","name":"Bob"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Join {
                id: None,
                name: "Bob".to_string()
            }
        );
    }

    #[test]
    fn test_parse_submit_answer() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"t":"participant:submitAnswer","answerIndex":3}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::SubmitAnswer {
                answer_index: Some(3)
            }
        );

        let msg: ClientMessage =
            serde_json::from_str(r#"{"t":"participant:submitAnswer"}"#).unwrap();
        assert_eq!(msg, ClientMessage::SubmitAnswer { answer_index: None });
    }

    #[test]
    fn test_parse_start_quiz() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"t":"admin:startQuiz","question":"Q","options":["a","b","c","d","e"],"correctAnswerIndex":2,"timeLimit":30}"#,
        )
        .unwrap();

        match msg {
            ClientMessage::StartQuiz { round } => {
                assert_eq!(round.question, "Q");
                assert_eq!(round.options.len(), 5);
                assert_eq!(round.correct_answer_index, Some(2));
                assert_eq!(round.time_limit, 30);
            }
            other => panic!("Expected StartQuiz, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_admin_commands() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"t":"admin:resetWinner","playerId":4}"#).unwrap();
        assert_eq!(msg, ClientMessage::ResetWinner { player_id: 4 });
        assert!(msg.is_admin_only());

        let msg: ClientMessage = serde_json::from_str(r#"{"t":"admin:showResults"}"#).unwrap();
        assert_eq!(msg.event(), "admin:showResults");

        assert!(serde_json::from_str::<ClientMessage>(r#"{"t":"admin:selfDestruct"}"#).is_err());
    }

    #[test]
    fn test_server_message_tags() {
        let json = serde_json::to_value(ServerMessage::ForceLogout).unwrap();
        assert_eq!(json["t"], "server:forceLogout");

        let json =
            serde_json::to_value(ServerMessage::from(SessionError::NotAWinner(3))).unwrap();
        assert_eq!(json["t"], "error");
        assert_eq!(json["code"], "NOT_A_WINNER");
    }
}
