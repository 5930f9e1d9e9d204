use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Numeric participant identity, minted by the coordinator at join time
pub type PlayerId = u64;
/// Server-side handle for one WebSocket connection (ULID string)
pub type ConnectionId = String;

/// Every round offers exactly this many answer options
pub const OPTION_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuizMode {
    #[default]
    Idle,
    FastestFinger,
    RevealAnswer,
    ShowResults,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Participant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    pub id: PlayerId,
    pub name: String,
    /// True while some connection is bound to this identity
    #[serde(default)]
    pub online: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundConfig {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer_index: Option<usize>,
    /// Seconds
    pub time_limit: u32,
}

impl RoundConfig {
    /// Whether `answer` matches the configured correct option
    pub fn is_correct(&self, answer: Answer) -> bool {
        match (answer, self.correct_answer_index) {
            (Answer::Answered(index), Some(correct)) => index == correct,
            _ => false,
        }
    }
}

/// What a participant chose. `Unanswered` is a recorded submission that
/// carries no option (it can never be correct).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<usize>", into = "Option<usize>")]
pub enum Answer {
    #[default]
    Unanswered,
    Answered(usize),
}

impl Answer {
    pub fn is_unanswered(&self) -> bool {
        matches!(self, Answer::Unanswered)
    }
}

impl From<Option<usize>> for Answer {
    fn from(value: Option<usize>) -> Self {
        value.map_or(Answer::Unanswered, Answer::Answered)
    }
}

impl From<Answer> for Option<usize> {
    fn from(value: Answer) -> Self {
        match value {
            Answer::Unanswered => None,
            Answer::Answered(index) => Some(index),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub player_id: PlayerId,
    pub player_name: String,
    /// Milliseconds since the round started, taken from the coordinator's clock
    pub timestamp: u64,
    /// Arrival order within the round, breaks timestamp ties
    pub seq: u64,
    #[serde(
        rename = "answerIndex",
        default,
        skip_serializing_if = "Answer::is_unanswered"
    )]
    pub answer: Answer,
}

/// Position of a submission in the round ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rank {
    Placed(u32),
    Unranked,
}

/// Wire form of [`Rank::Unranked`]
pub const UNRANKED_MARK: &str = "—";

impl Serialize for Rank {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Rank::Placed(n) => serializer.serialize_u32(*n),
            Rank::Unranked => serializer.serialize_str(UNRANKED_MARK),
        }
    }
}

impl<'de> Deserialize<'de> for Rank {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RankVisitor;

        impl de::Visitor<'_> for RankVisitor {
            type Value = Rank;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a positive rank or \"{}\"", UNRANKED_MARK)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Rank, E> {
                u32::try_from(v)
                    .ok()
                    .filter(|n| *n > 0)
                    .map(Rank::Placed)
                    .ok_or_else(|| E::custom("rank out of range"))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Rank, E> {
                if v == UNRANKED_MARK {
                    Ok(Rank::Unranked)
                } else {
                    Err(E::invalid_value(de::Unexpected::Str(v), &self))
                }
            }
        }

        deserializer.deserialize_any(RankVisitor)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RankedEntry {
    #[serde(flatten)]
    pub submission: Submission,
    pub rank: Rank,
    pub correct: bool,
}

/// One completed round, frozen at `showResults`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub round_config: RoundConfig,
    pub submissions: Vec<Submission>,
    pub completed_at: String,
}

/// The complete session state as sent in every `stateUpdate`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub version: u64,
    pub server_now: String,
    pub mode: QuizMode,
    pub current_round: Option<RoundConfig>,
    pub submissions: Vec<Submission>,
    pub timer: u32,
    pub participants: Vec<Participant>,
    pub winners: Vec<PlayerId>,
    pub history: Vec<Arc<HistoryItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranking: Option<Vec<RankedEntry>>,
}
