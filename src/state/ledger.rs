use super::Session;
use crate::types::*;
use std::time::Instant;

/// Current-round submissions, at most one per player, in arrival order
#[derive(Debug, Default, Clone)]
pub struct SubmissionLedger {
    submissions: Vec<Submission>,
    next_seq: u64,
}

impl SubmissionLedger {
    pub fn has_submitted(&self, player_id: PlayerId) -> bool {
        self.submissions.iter().any(|s| s.player_id == player_id)
    }

    /// Append a submission unless the player already has one this round
    pub fn record(
        &mut self,
        player: &Participant,
        answer: Answer,
        timestamp: u64,
    ) -> Option<&Submission> {
        if self.has_submitted(player.id) {
            return None;
        }

        self.next_seq += 1;
        self.submissions.push(Submission {
            player_id: player.id,
            player_name: player.name.clone(),
            timestamp,
            seq: self.next_seq,
            answer,
        });
        self.submissions.last()
    }

    pub fn submissions(&self) -> &[Submission] {
        &self.submissions
    }

    pub fn len(&self) -> usize {
        self.submissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.submissions.is_empty()
    }

    pub fn clear(&mut self) {
        self.submissions.clear();
        self.next_seq = 0;
    }
}

/// Result of a submission attempt. Everything except `Recorded` is a silent no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Recorded,
    NotAnswering,
    NotJoined,
    AlreadySubmitted,
    AlreadyWinner,
    InvalidOption,
}

impl Session {
    pub fn submit_answer(&mut self, player_id: PlayerId, answer: Answer) -> SubmitOutcome {
        self.submit_answer_at(player_id, answer, Instant::now())
    }

    /// Record `answer` for `player_id` as arriving at `now`
    pub fn submit_answer_at(
        &mut self,
        player_id: PlayerId,
        answer: Answer,
        now: Instant,
    ) -> SubmitOutcome {
        if self.mode != QuizMode::FastestFinger {
            return SubmitOutcome::NotAnswering;
        }
        let Some(player) = self.participants.get(player_id).cloned() else {
            return SubmitOutcome::NotJoined;
        };
        if self.winners.contains(player_id) {
            return SubmitOutcome::AlreadyWinner;
        }
        if let Answer::Answered(index) = answer {
            if index >= OPTION_COUNT {
                return SubmitOutcome::InvalidOption;
            }
        }

        let elapsed = self
            .clock
            .started_at
            .map(|start| now.saturating_duration_since(start).as_millis() as u64)
            .unwrap_or(0);

        match self.ledger.record(&player, answer, elapsed) {
            Some(submission) => {
                tracing::info!(
                    "Submission #{} from {} ({}) after {}ms: {:?}",
                    submission.seq,
                    player.name,
                    player.id,
                    elapsed,
                    answer
                );
                self.touch();
                SubmitOutcome::Recorded
            }
            None => SubmitOutcome::AlreadySubmitted,
        }
    }
}
