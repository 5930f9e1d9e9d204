use super::{rank_submissions, RoundClock, Session};
use crate::error::SessionError;
use crate::types::*;
use std::time::{Duration, Instant};

/// Check a round config before it can be started
pub fn validate_round_config(config: &RoundConfig) -> Result<(), SessionError> {
    if config.question.trim().is_empty() {
        return Err(SessionError::InvalidRoundConfig(
            "question must not be empty".to_string(),
        ));
    }
    if config.options.len() != OPTION_COUNT {
        return Err(SessionError::InvalidRoundConfig(format!(
            "expected {} options, got {}",
            OPTION_COUNT,
            config.options.len()
        )));
    }
    if let Some(i) = config.options.iter().position(|o| o.trim().is_empty()) {
        return Err(SessionError::InvalidRoundConfig(format!(
            "option {} must not be empty",
            i
        )));
    }
    match config.correct_answer_index {
        Some(i) if i < OPTION_COUNT => {}
        Some(i) => {
            return Err(SessionError::InvalidRoundConfig(format!(
                "correct answer index {} out of range",
                i
            )))
        }
        None => {
            return Err(SessionError::InvalidRoundConfig(
                "correct answer must be set".to_string(),
            ))
        }
    }
    if config.time_limit == 0 {
        return Err(SessionError::InvalidRoundConfig(
            "time limit must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Whole seconds left until `deadline`, rounded up
fn seconds_left(deadline: Instant, now: Instant) -> u32 {
    let left = deadline.saturating_duration_since(now).as_millis();
    left.div_ceil(1000).min(u32::MAX as u128) as u32
}

impl Session {
    fn expect_mode(&self, expected: QuizMode, command: &'static str) -> Result<(), SessionError> {
        if self.mode != expected {
            return Err(SessionError::WrongMode {
                command,
                mode: self.mode,
            });
        }
        Ok(())
    }

    /// Only transitions allowed: idle -> fastest_finger -> reveal_answer -> show_results -> idle
    fn is_valid_transition(from: QuizMode, to: QuizMode) -> bool {
        use QuizMode::*;

        matches!(
            (from, to),
            (Idle, FastestFinger)
                | (FastestFinger, RevealAnswer)
                | (RevealAnswer, ShowResults)
                | (ShowResults, Idle)
        )
    }

    fn set_mode(&mut self, to: QuizMode) {
        debug_assert!(Self::is_valid_transition(self.mode, to));
        tracing::info!("Mode {:?} -> {:?}", self.mode, to);
        self.mode = to;
    }

    pub fn start_quiz(&mut self, config: RoundConfig) -> Result<(), SessionError> {
        self.start_quiz_at(config, Instant::now())
    }

    /// Open a new round at `now`
    pub fn start_quiz_at(&mut self, config: RoundConfig, now: Instant) -> Result<(), SessionError> {
        self.expect_mode(QuizMode::Idle, "startQuiz")?;
        validate_round_config(&config)?;

        let limit = Duration::from_secs(u64::from(config.time_limit));
        tracing::info!(
            "Starting round {:?} ({}s)",
            config.question,
            config.time_limit
        );

        self.timer = config.time_limit;
        self.current_round = Some(config);
        self.ledger.clear();
        self.clock = RoundClock {
            started_at: Some(now),
            deadline: Some(now + limit),
        };
        self.set_mode(QuizMode::FastestFinger);
        self.touch();
        Ok(())
    }

    /// Close answering. Shared by the admin command and the timer.
    fn end_answering(&mut self) {
        self.timer = 0;
        self.clock.deadline = None;
        self.set_mode(QuizMode::RevealAnswer);
        self.touch();
    }

    pub fn force_end_quiz(&mut self) -> Result<(), SessionError> {
        self.expect_mode(QuizMode::FastestFinger, "forceEndQuiz")?;
        tracing::info!(
            "Round ended by admin with {} submission(s)",
            self.ledger.len()
        );
        self.end_answering();
        Ok(())
    }

    /// Advance the round timer to `now`. Returns true if anything changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.mode != QuizMode::FastestFinger {
            return false;
        }
        let Some(deadline) = self.clock.deadline else {
            return false;
        };

        let left = seconds_left(deadline, now);
        let mut changed = false;
        if left != self.timer {
            self.timer = left;
            self.touch();
            changed = true;
        }

        if left == 0 && self.auto_end {
            tracing::info!(
                "Round timer expired with {} submission(s)",
                self.ledger.len()
            );
            self.end_answering();
            changed = true;
        }
        changed
    }

    /// Rank the round, fold it into history and union the correct players into
    /// the winner set. Returns the ranking.
    pub fn show_results(&mut self) -> Result<Vec<RankedEntry>, SessionError> {
        self.expect_mode(QuizMode::RevealAnswer, "showResults")?;
        let round = self
            .current_round
            .clone()
            .ok_or(SessionError::WrongMode {
                command: "showResults",
                mode: self.mode,
            })?;

        let ranking = rank_submissions(&round, self.ledger.submissions());
        let new_winners = self.winners.absorb(&ranking);
        self.history.append(HistoryItem {
            round_config: round,
            submissions: self.ledger.submissions().to_vec(),
            completed_at: chrono::Utc::now().to_rfc3339(),
        });
        tracing::info!(
            "Results: {} submission(s), {} new winner(s), history now {}",
            ranking.len(),
            new_winners,
            self.history.len()
        );

        self.set_mode(QuizMode::ShowResults);
        self.touch();
        Ok(ranking)
    }

    pub fn reset_quiz(&mut self) -> Result<(), SessionError> {
        self.expect_mode(QuizMode::ShowResults, "resetQuiz")?;
        self.current_round = None;
        self.ledger.clear();
        self.timer = 0;
        self.clock = RoundClock::default();
        self.set_mode(QuizMode::Idle);
        self.touch();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{roster, round};
    use super::*;

    #[test]
    fn test_valid_transitions() {
        use QuizMode::*;
        assert!(Session::is_valid_transition(Idle, FastestFinger));
        assert!(Session::is_valid_transition(ShowResults, Idle));
        assert!(!Session::is_valid_transition(Idle, ShowResults));
        assert!(!Session::is_valid_transition(RevealAnswer, Idle));
    }

    fn assert_rejected(mutate: impl FnOnce(&mut RoundConfig), needle: &str) {
        let mut session = Session::new(roster());
        let version = session.version();
        let mut config = round(0);
        mutate(&mut config);

        let err = session.start_quiz(config).unwrap_err();
        assert_eq!(err.code(), "INVALID_ROUND_CONFIG");
        assert!(err.to_string().contains(needle), "{} / {}", err, needle);
        assert_eq!(session.mode(), QuizMode::Idle);
        assert_eq!(session.version(), version);
    }

    #[test]
    fn test_start_quiz_validation() {
        assert_rejected(|c| c.question = "  ".to_string(), "question");
        assert_rejected(|c| c.options.truncate(4), "options");
        assert_rejected(|c| c.options[3] = String::new(), "option 3");
        assert_rejected(|c| c.correct_answer_index = None, "must be set");
        assert_rejected(|c| c.correct_answer_index = Some(5), "out of range");
        assert_rejected(|c| c.time_limit = 0, "time limit");
    }

    #[test]
    fn test_start_quiz_sets_round_and_timer() {
        let mut session = Session::new(roster());
        session.start_quiz(round(4)).unwrap();

        assert_eq!(session.mode(), QuizMode::FastestFinger);
        assert_eq!(session.timer(), 30);
        assert_eq!(session.current_round(), Some(&round(4)));
    }

    #[test]
    fn test_wrong_mode_commands_are_rejected_without_mutation() {
        let mut session = Session::new(roster());
        let version = session.version();

        assert!(matches!(
            session.force_end_quiz(),
            Err(SessionError::WrongMode { command: "forceEndQuiz", .. })
        ));
        assert!(session.show_results().is_err());
        assert!(session.reset_quiz().is_err());
        assert_eq!(session.version(), version);

        session.start_quiz(round(0)).unwrap();
        let version = session.version();
        assert!(session.start_quiz(round(1)).is_err());
        assert!(session.show_results().is_err());
        assert!(session.reset_quiz().is_err());
        assert_eq!(session.version(), version);
        assert_eq!(session.current_round(), Some(&round(0)));
    }

    #[test]
    fn test_timer_counts_down() {
        let mut session = Session::new(roster());
        let start = Instant::now();
        session.start_quiz_at(round(0), start).unwrap();

        assert!(!session.tick(start + Duration::from_millis(200)));
        assert_eq!(session.timer(), 30);

        assert!(session.tick(start + Duration::from_millis(1500)));
        assert_eq!(session.timer(), 29);

        assert!(session.tick(start + Duration::from_secs(10)));
        assert_eq!(session.timer(), 20);
        assert_eq!(session.mode(), QuizMode::FastestFinger);
    }

    #[test]
    fn test_timer_expiry_ends_answering() {
        let mut session = Session::new(roster());
        let start = Instant::now();
        session.start_quiz_at(round(0), start).unwrap();

        assert!(session.tick(start + Duration::from_secs(31)));
        assert_eq!(session.mode(), QuizMode::RevealAnswer);
        assert_eq!(session.timer(), 0);

        // Admin end racing the timer is a harmless no-op
        let version = session.version();
        assert!(session.force_end_quiz().is_err());
        assert!(!session.tick(start + Duration::from_secs(32)));
        assert_eq!(session.version(), version);
    }

    #[test]
    fn test_timer_without_auto_end_waits_for_admin() {
        let mut session = Session::new(roster()).with_auto_end(false);
        let start = Instant::now();
        session.start_quiz_at(round(0), start).unwrap();

        assert!(session.tick(start + Duration::from_secs(40)));
        assert_eq!(session.timer(), 0);
        assert_eq!(session.mode(), QuizMode::FastestFinger);
        assert!(!session.tick(start + Duration::from_secs(41)));

        session.force_end_quiz().unwrap();
        assert_eq!(session.mode(), QuizMode::RevealAnswer);
    }

    #[test]
    fn test_force_end_zeroes_timer() {
        let mut session = Session::new(roster());
        session.start_quiz(round(0)).unwrap();
        session.force_end_quiz().unwrap();

        assert_eq!(session.timer(), 0);
        assert!(!session.tick(Instant::now() + Duration::from_secs(60)));
    }

    #[test]
    fn test_show_results_with_no_submissions() {
        let mut session = Session::new(roster());
        session.start_quiz(round(0)).unwrap();
        session.force_end_quiz().unwrap();

        let ranking = session.show_results().unwrap();
        assert!(ranking.is_empty());
        assert_eq!(session.history().len(), 1);
        assert!(session.winners().is_empty());
    }

    #[test]
    fn test_seconds_left_rounds_up() {
        let now = Instant::now();
        assert_eq!(seconds_left(now + Duration::from_millis(1), now), 1);
        assert_eq!(seconds_left(now + Duration::from_millis(1000), now), 1);
        assert_eq!(seconds_left(now + Duration::from_millis(1001), now), 2);
        assert_eq!(seconds_left(now, now + Duration::from_secs(1)), 0);
    }
}
