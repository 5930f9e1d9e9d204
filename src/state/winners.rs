use super::Session;
use crate::error::SessionError;
use crate::types::*;
use std::collections::BTreeSet;

/// Everyone who has ever answered a round correctly. Members cannot submit
/// again until they are reset.
#[derive(Debug, Default, Clone)]
pub struct WinnerTracker {
    winners: BTreeSet<PlayerId>,
}

impl WinnerTracker {
    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.winners.contains(&player_id)
    }

    /// Union every correct entry of `ranking` into the set.
    /// Returns how many players were newly added.
    pub fn absorb(&mut self, ranking: &[RankedEntry]) -> usize {
        ranking
            .iter()
            .filter(|entry| entry.correct)
            .filter(|entry| self.winners.insert(entry.submission.player_id))
            .count()
    }

    pub fn remove(&mut self, player_id: PlayerId) -> bool {
        self.winners.remove(&player_id)
    }

    pub fn clear(&mut self) -> usize {
        let count = self.winners.len();
        self.winners.clear();
        count
    }

    /// Ascending id order
    pub fn ids(&self) -> Vec<PlayerId> {
        self.winners.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.winners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.winners.is_empty()
    }
}

/// Rank a round's submissions.
///
/// Correct answers come first, ordered by `(timestamp, seq)` and numbered from 1.
/// Incorrect and unanswered submissions follow in arrival order without a rank.
pub fn rank_submissions(round: &RoundConfig, submissions: &[Submission]) -> Vec<RankedEntry> {
    let (mut correct, mut incorrect): (Vec<&Submission>, Vec<&Submission>) = submissions
        .iter()
        .partition(|s| round.is_correct(s.answer));

    correct.sort_by_key(|s| (s.timestamp, s.seq));
    incorrect.sort_by_key(|s| s.seq);

    let placed = correct.into_iter().enumerate().map(|(i, s)| RankedEntry {
        submission: s.clone(),
        rank: Rank::Placed(i as u32 + 1),
        correct: true,
    });
    let unranked = incorrect.into_iter().map(|s| RankedEntry {
        submission: s.clone(),
        rank: Rank::Unranked,
        correct: false,
    });

    placed.chain(unranked).collect()
}

impl Session {
    /// Re-admit one winner to future rounds
    pub fn reset_winner(&mut self, player_id: PlayerId) -> Result<(), SessionError> {
        if !self.winners.remove(player_id) {
            return Err(SessionError::NotAWinner(player_id));
        }
        tracing::info!("Winner {} reset", player_id);
        self.touch();
        Ok(())
    }

    pub fn reset_all_winners(&mut self) {
        let cleared = self.winners.clear();
        tracing::info!("Reset all winners ({} cleared)", cleared);
        if cleared > 0 {
            self.touch();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{join, roster, round};
    use super::*;
    use crate::state::SubmitOutcome;

    fn submission(player_id: PlayerId, timestamp: u64, seq: u64, answer: Option<usize>) -> Submission {
        Submission {
            player_id,
            player_name: format!("p{}", player_id),
            timestamp,
            seq,
            answer: answer.into(),
        }
    }

    #[test]
    fn test_ranking_orders_correct_by_timestamp() {
        // A@100 -> 2, C@98 -> 0, B@105 -> 2 with correct answer 2
        let subs = vec![
            submission(3, 98, 1, Some(0)),
            submission(1, 100, 2, Some(2)),
            submission(2, 105, 3, Some(2)),
        ];

        let ranking = rank_submissions(&round(2), &subs);
        let view: Vec<_> = ranking
            .iter()
            .map(|e| (e.submission.player_id, e.rank, e.correct))
            .collect();

        assert_eq!(
            view,
            vec![
                (1, Rank::Placed(1), true),
                (2, Rank::Placed(2), true),
                (3, Rank::Unranked, false),
            ]
        );
    }

    #[test]
    fn test_ranking_breaks_ties_by_arrival() {
        let subs = vec![
            submission(7, 500, 2, Some(1)),
            submission(8, 500, 1, Some(1)),
        ];

        let ranking = rank_submissions(&round(1), &subs);
        assert_eq!(ranking[0].submission.player_id, 8);
        assert_eq!(ranking[1].submission.player_id, 7);
        assert_eq!(ranking[1].rank, Rank::Placed(2));
    }

    #[test]
    fn test_incorrect_and_unanswered_never_ranked() {
        let subs = vec![
            submission(1, 10, 1, None),
            submission(2, 20, 2, Some(4)),
            submission(3, 30, 3, Some(0)),
        ];

        let ranking = rank_submissions(&round(0), &subs);
        assert_eq!(ranking[0].rank, Rank::Placed(1));
        // Remaining keep arrival order
        assert_eq!(ranking[1].submission.player_id, 1);
        assert_eq!(ranking[2].submission.player_id, 2);
        assert!(ranking[1..].iter().all(|e| e.rank == Rank::Unranked));
    }

    #[test]
    fn test_rank_wire_format() {
        assert_eq!(serde_json::to_value(Rank::Placed(3)).unwrap(), 3);
        assert_eq!(serde_json::to_value(Rank::Unranked).unwrap(), "—");
        assert_eq!(
            serde_json::from_str::<Rank>("\"—\"").unwrap(),
            Rank::Unranked
        );
        assert!(serde_json::from_str::<Rank>("0").is_err());
    }

    #[test]
    fn test_absorb_is_idempotent() {
        let subs = vec![submission(1, 10, 1, Some(2)), submission(2, 20, 2, Some(2))];
        let ranking = rank_submissions(&round(2), &subs);

        let mut tracker = WinnerTracker::default();
        assert_eq!(tracker.absorb(&ranking), 2);
        assert_eq!(tracker.absorb(&ranking), 0);
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_winner_excluded_until_reset() {
        let mut session = Session::new(roster());
        let a = join(&mut session, "c-a", "Alice");

        session.start_quiz(round(0)).unwrap();
        session.submit_answer(a, Answer::Answered(0));
        session.force_end_quiz().unwrap();
        session.show_results().unwrap();
        session.reset_quiz().unwrap();
        assert!(session.winners().contains(a));

        session.start_quiz(round(0)).unwrap();
        assert_eq!(
            session.submit_answer(a, Answer::Answered(0)),
            SubmitOutcome::AlreadyWinner
        );

        session.reset_winner(a).unwrap();
        assert_eq!(
            session.submit_answer(a, Answer::Answered(0)),
            SubmitOutcome::Recorded
        );
    }

    #[test]
    fn test_reset_winner_not_a_winner() {
        let mut session = Session::new(roster());
        let version = session.version();
        assert_eq!(session.reset_winner(5), Err(SessionError::NotAWinner(5)));
        assert_eq!(session.version(), version);
    }

    #[test]
    fn test_reset_all_winners_leaves_history_and_round() {
        let mut session = Session::new(roster());
        let a = join(&mut session, "c-a", "Alice");
        let b = join(&mut session, "c-b", "Bob");

        session.start_quiz(round(3)).unwrap();
        session.submit_answer(a, Answer::Answered(3));
        session.submit_answer(b, Answer::Answered(3));
        session.force_end_quiz().unwrap();
        session.show_results().unwrap();
        assert_eq!(session.winners().len(), 2);

        session.reset_all_winners();
        assert!(session.winners().is_empty());
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.mode(), QuizMode::ShowResults);
        assert_eq!(session.submissions().len(), 2);
    }
}
