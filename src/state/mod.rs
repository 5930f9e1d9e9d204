mod history;
mod ledger;
mod mode;
mod participants;
mod winners;

pub use history::HistoryArchive;
pub use ledger::{SubmissionLedger, SubmitOutcome};
pub use mode::validate_round_config;
pub use participants::{JoinOutcome, Participants};
pub use winners::{rank_submissions, WinnerTracker};

use crate::roster::Roster;
use crate::types::*;
use std::sync::Arc;
use std::time::Instant;

/// Timing of the round in progress
#[derive(Debug, Clone, Copy, Default)]
struct RoundClock {
    started_at: Option<Instant>,
    deadline: Option<Instant>,
}

/// The authoritative quiz session.
///
/// Owned by exactly one task (see [`crate::broadcast::Coordinator`]); every
/// mutation goes through `&mut self`, so there is no interior locking. Each
/// mutation bumps `version`, which is how the coordinator decides whether a
/// new snapshot has to be published.
#[derive(Debug)]
pub struct Session {
    roster: Arc<Roster>,
    auto_end: bool,
    mode: QuizMode,
    current_round: Option<RoundConfig>,
    clock: RoundClock,
    timer: u32,
    ledger: SubmissionLedger,
    participants: Participants,
    winners: WinnerTracker,
    history: HistoryArchive,
    version: u64,
}

impl Session {
    pub fn new(roster: Arc<Roster>) -> Self {
        Self {
            roster,
            auto_end: true,
            mode: QuizMode::Idle,
            current_round: None,
            clock: RoundClock::default(),
            timer: 0,
            ledger: SubmissionLedger::default(),
            participants: Participants::default(),
            winners: WinnerTracker::default(),
            history: HistoryArchive::default(),
            version: 1,
        }
    }

    /// Whether the round ends by itself when the timer reaches zero
    pub fn with_auto_end(mut self, auto_end: bool) -> Self {
        self.auto_end = auto_end;
        self
    }

    fn touch(&mut self) {
        self.version += 1;
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    pub fn current_round(&self) -> Option<&RoundConfig> {
        self.current_round.as_ref()
    }

    pub fn timer(&self) -> u32 {
        self.timer
    }

    pub fn roster(&self) -> &Arc<Roster> {
        &self.roster
    }

    pub fn submissions(&self) -> &[Submission] {
        self.ledger.submissions()
    }

    pub fn participants(&self) -> &Participants {
        &self.participants
    }

    pub fn winners(&self) -> &WinnerTracker {
        &self.winners
    }

    pub fn history(&self) -> &HistoryArchive {
        &self.history
    }

    /// Full snapshot as seen by `role`.
    ///
    /// Participants do not see the correct answer while answering is open.
    pub fn snapshot(&self, role: &Role) -> SessionSnapshot {
        let mut current_round = self.current_round.clone();
        if *role != Role::Admin && self.mode == QuizMode::FastestFinger {
            if let Some(round) = current_round.as_mut() {
                round.correct_answer_index = None;
            }
        }

        let ranking = match (&self.mode, &self.current_round) {
            (QuizMode::ShowResults, Some(round)) => {
                Some(rank_submissions(round, self.ledger.submissions()))
            }
            _ => None,
        };

        SessionSnapshot {
            version: self.version,
            server_now: chrono::Utc::now().to_rfc3339(),
            mode: self.mode,
            current_round,
            submissions: self.ledger.submissions().to_vec(),
            timer: self.timer,
            participants: self.participants.list(),
            winners: self.winners.ids(),
            history: self.history.items().to_vec(),
            ranking,
        }
    }
}
