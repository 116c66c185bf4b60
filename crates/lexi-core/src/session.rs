use std::sync::atomic::{AtomicU64, Ordering};

use lexi_config::quiz::QuizConfig;
use lexi_types::{Language, QuizGuard, QuizMode, QuizQuestion, Word};
use rand::Rng;

use crate::quiz::{self, BlockReason};

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizState {
    /// Waiting for the first word snapshot
    Loading,
    Blocked(BlockReason),
    Ready(ActiveQuestion),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveQuestion {
    pub id: u64,
    pub question: QuizQuestion,
    pub status: QuestionStatus,
    /// Wrong answers given so far
    pub attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionStatus {
    Open,
    Correct,
    Revealed,
    Skipped,
}

impl QuestionStatus {
    pub fn is_locked(&self) -> bool {
        !matches!(self, QuestionStatus::Open)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Correct,
    Incorrect,
    EmptyAnswer,
    Revealed,
    Skipped,
}

/// Score change owed for an action, tagged with the question it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scored {
    pub guard: QuizGuard,
    pub delta: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub feedback: Feedback,
    pub message: String,
    pub scored: Option<Scored>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuizError {
    #[error("No question is active")]
    NoQuestion,

    #[error("This question is already finished")]
    Locked,

    #[error("\"{0}\" is not one of the choices")]
    NotAnOption(String),

    #[error("Skipping is only available in the hard quiz")]
    SkipUnavailable,

    #[error("Answer, reveal or skip the question first")]
    StillOpen,
}

fn points(delta: i64) -> String {
    match delta.abs() {
        1 => "1 point".to_string(),
        n => format!("{n} points"),
    }
}

fn disclosure(q: &QuizQuestion) -> String {
    format!(
        "The word \"{}\" (in {}) translates to \"{}\" in {}.",
        q.prompt,
        Language::label(&q.prompt_language),
        q.correct_answer,
        Language::label(&q.target_language)
    )
}

/// One quiz run in a single mode
///
/// The session owns the word snapshot it draws from and walks
/// `Loading -> Ready -> (locked) -> Ready ...`, or lands in `Blocked` when the
/// snapshot cannot support the mode. Score changes are returned, not applied.
pub struct QuizSession {
    id: u64,
    mode: QuizMode,
    config: QuizConfig,
    words: Vec<Word>,
    state: QuizState,
    next_question: u64,
}

impl QuizSession {
    pub fn new(mode: QuizMode, config: QuizConfig) -> Self {
        Self {
            id: NEXT_SESSION.fetch_add(1, Ordering::Relaxed),
            mode,
            config,
            words: Vec::new(),
            state: QuizState::Loading,
            next_question: 1,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    pub fn state(&self) -> &QuizState {
        &self.state
    }

    pub fn active(&self) -> Option<&ActiveQuestion> {
        match &self.state {
            QuizState::Ready(active) => Some(active),
            _ => None,
        }
    }

    pub fn question(&self) -> Option<&QuizQuestion> {
        self.active().map(|a| &a.question)
    }

    /// Identity of the current question
    pub fn guard(&self) -> Option<QuizGuard> {
        self.active().map(|a| QuizGuard {
            session: self.id,
            question: a.id,
        })
    }

    /// Whether a late result still belongs to what is on screen
    pub fn is_current(&self, guard: QuizGuard) -> bool {
        self.guard() == Some(guard)
    }

    /// First snapshot arrived
    pub fn load<R: Rng>(&mut self, words: Vec<Word>, rng: &mut R) -> &QuizState {
        self.words = words;
        self.generate(rng)
    }

    /// New snapshot while running
    ///
    /// A question on screen is kept; the new words are used from the next
    /// question on. A loading or blocked session retries generation.
    pub fn refresh<R: Rng>(&mut self, words: Vec<Word>, rng: &mut R) -> &QuizState {
        self.words = words;
        match self.state {
            QuizState::Loading | QuizState::Blocked(_) => self.generate(rng),
            QuizState::Ready(_) => &self.state,
        }
    }

    fn generate<R: Rng>(&mut self, rng: &mut R) -> &QuizState {
        self.state = match quiz::generate(self.mode, &self.words, &self.config, rng) {
            Ok(question) => {
                let id = self.next_question;
                self.next_question += 1;
                QuizState::Ready(ActiveQuestion {
                    id,
                    question,
                    status: QuestionStatus::Open,
                    attempts: 0,
                })
            }
            Err(reason) => {
                tracing::info!("quiz {} blocked: {reason}", self.id);
                QuizState::Blocked(reason)
            }
        };
        &self.state
    }

    fn open_question(&mut self) -> Result<(&mut ActiveQuestion, QuizGuard), QuizError> {
        let session = self.id;
        match &mut self.state {
            QuizState::Ready(active) if active.status.is_locked() => Err(QuizError::Locked),
            QuizState::Ready(active) => {
                let guard = QuizGuard {
                    session,
                    question: active.id,
                };
                Ok((active, guard))
            }
            _ => Err(QuizError::NoQuestion),
        }
    }

    /// Grade a selected option (multiple choice) or typed text (free text)
    pub fn answer(&mut self, input: &str) -> Result<Outcome, QuizError> {
        let mode = self.mode;
        let delta = quiz::reward(mode, &self.config.scoring);
        let (active, guard) = self.open_question()?;

        let correct = match mode {
            QuizMode::MultipleChoice => {
                if input.is_empty() {
                    return Ok(Outcome {
                        feedback: Feedback::EmptyAnswer,
                        message: "Please select an answer.".to_string(),
                        scored: None,
                    });
                }
                if !active.question.options.iter().any(|o| o == input) {
                    return Err(QuizError::NotAnOption(input.to_string()));
                }
                quiz::grade_choice(input, &active.question.correct_answer)
            }
            QuizMode::FreeText => {
                if input.trim().is_empty() {
                    return Ok(Outcome {
                        feedback: Feedback::EmptyAnswer,
                        message: "Please enter a word.".to_string(),
                        scored: None,
                    });
                }
                quiz::grade_typed(input, &active.question.correct_answer)
            }
        };

        if !correct {
            active.attempts += 1;
            return Ok(Outcome {
                feedback: Feedback::Incorrect,
                message: "Incorrect. Please try again.".to_string(),
                scored: None,
            });
        }

        active.status = QuestionStatus::Correct;
        let message = match mode {
            QuizMode::MultipleChoice => format!(
                "Correct! You have earned {}! {}",
                points(delta),
                disclosure(&active.question)
            ),
            QuizMode::FreeText => format!("Correct! You have won {}.", points(delta)),
        };

        Ok(Outcome {
            feedback: Feedback::Correct,
            message,
            scored: Some(Scored { guard, delta }),
        })
    }

    /// Show the answer, paying the reveal penalty
    pub fn reveal(&mut self) -> Result<Outcome, QuizError> {
        let delta = quiz::reveal_penalty(self.mode, &self.config.scoring);
        let (active, guard) = self.open_question()?;

        active.status = QuestionStatus::Revealed;
        Ok(Outcome {
            feedback: Feedback::Revealed,
            message: format!(
                "You have lost {}! {}",
                points(delta),
                disclosure(&active.question)
            ),
            scored: Some(Scored { guard, delta }),
        })
    }

    /// Give up on the question without seeing the answer
    pub fn skip(&mut self) -> Result<Outcome, QuizError> {
        let delta = quiz::skip_penalty(self.mode, &self.config.scoring)
            .ok_or(QuizError::SkipUnavailable)?;
        let (active, guard) = self.open_question()?;

        active.status = QuestionStatus::Skipped;
        Ok(Outcome {
            feedback: Feedback::Skipped,
            message: format!("Question skipped. You have lost {}.", points(delta)),
            scored: Some(Scored { guard, delta }),
        })
    }

    /// Move on from a finished question
    pub fn advance<R: Rng>(&mut self, rng: &mut R) -> Result<&QuizState, QuizError> {
        match &self.state {
            QuizState::Ready(active) if active.status.is_locked() => Ok(self.generate(rng)),
            QuizState::Ready(_) => Err(QuizError::StillOpen),
            _ => Err(QuizError::NoQuestion),
        }
    }
}

#[cfg(test)]
mod tests {
    use lexi_types::Translation;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn words() -> Vec<Word> {
        vec![
            Word::new("1", "Dog", "en", vec![Translation::new("es", "Perro")]),
            Word::new("2", "Gato", "es", vec![Translation::new("en", "Cat")]),
            Word::new("3", "Chat", "fr", vec![Translation::new("en", "Cat")]),
            Word::new("4", "Cane", "it", vec![Translation::new("en", "Dog")]),
        ]
    }

    fn ready(mode: QuizMode, seed: u64) -> (QuizSession, ChaCha8Rng) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut session = QuizSession::new(mode, QuizConfig::default());
        session.load(words(), &mut rng);
        assert!(session.active().is_some());
        (session, rng)
    }

    fn wrong_option(session: &QuizSession) -> String {
        let q = session.question().unwrap();
        q.options
            .iter()
            .find(|o| **o != q.correct_answer)
            .cloned()
            .unwrap()
    }

    #[test]
    fn starts_loading_then_ready() {
        let session = QuizSession::new(QuizMode::MultipleChoice, QuizConfig::default());
        assert_eq!(session.state(), &QuizState::Loading);

        for seed in 0..50 {
            let (session, _) = ready(QuizMode::MultipleChoice, seed);
            let q = session.question().unwrap();
            let source = words().into_iter().find(|w| w.text == q.prompt).unwrap();
            assert!(source.translations.iter().any(|t| t.text == q.correct_answer));
        }
    }

    #[test]
    fn too_few_words_block() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut session = QuizSession::new(QuizMode::MultipleChoice, QuizConfig::default());
        let mut few = words();
        few.truncate(3);

        let state = session.load(few, &mut rng);
        assert!(matches!(state, QuizState::Blocked(BlockReason::NotEnoughWords { .. })));
        assert_eq!(session.guard(), None);

        let mut hard = QuizSession::new(QuizMode::FreeText, QuizConfig::default());
        assert_eq!(
            hard.load(Vec::new(), &mut rng),
            &QuizState::Blocked(BlockReason::NoWords)
        );
    }

    #[test]
    fn blocked_session_recovers_on_refresh() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut session = QuizSession::new(QuizMode::MultipleChoice, QuizConfig::default());
        let mut few = words();
        few.truncate(2);
        session.load(few, &mut rng);

        assert!(matches!(session.refresh(words(), &mut rng), QuizState::Ready(_)));
    }

    #[test]
    fn refresh_keeps_the_question_on_screen() {
        let (mut session, mut rng) = ready(QuizMode::FreeText, 4);
        let before = session.guard();
        session.refresh(Vec::new(), &mut rng);
        assert_eq!(session.guard(), before);
    }

    #[test]
    fn correct_choice_scores_and_locks() {
        let (mut session, _) = ready(QuizMode::MultipleChoice, 1);
        let guard = session.guard().unwrap();
        let correct = session.question().unwrap().correct_answer.clone();

        let outcome = session.answer(&correct).unwrap();
        assert_eq!(outcome.feedback, Feedback::Correct);
        assert_eq!(outcome.scored, Some(Scored { guard, delta: 1 }));
        assert!(outcome.message.starts_with("Correct! You have earned 1 point!"));

        assert_eq!(session.answer(&correct), Err(QuizError::Locked));
        assert_eq!(session.reveal(), Err(QuizError::Locked));
    }

    #[test]
    fn wrong_choice_keeps_question_open() {
        let (mut session, _) = ready(QuizMode::MultipleChoice, 2);
        let wrong = wrong_option(&session);

        let outcome = session.answer(&wrong).unwrap();
        assert_eq!(outcome.feedback, Feedback::Incorrect);
        assert_eq!(outcome.scored, None);
        assert_eq!(session.active().unwrap().attempts, 1);
        assert_eq!(session.active().unwrap().status, QuestionStatus::Open);

        assert_eq!(
            session.answer("not offered"),
            Err(QuizError::NotAnOption("not offered".to_string()))
        );
        assert_eq!(session.answer("").unwrap().feedback, Feedback::EmptyAnswer);
    }

    #[test]
    fn typed_answer_ignores_case_and_padding() {
        let (mut session, _) = ready(QuizMode::FreeText, 3);
        let correct = session.question().unwrap().correct_answer.clone();

        assert_eq!(session.answer("   ").unwrap().feedback, Feedback::EmptyAnswer);
        assert_eq!(session.answer("zzz").unwrap().feedback, Feedback::Incorrect);

        let outcome = session
            .answer(&format!("  {}  ", correct.to_uppercase()))
            .unwrap();
        assert_eq!(outcome.feedback, Feedback::Correct);
        assert_eq!(outcome.scored.unwrap().delta, 2);
        assert_eq!(outcome.message, "Correct! You have won 2 points.");
    }

    #[test]
    fn reveal_charges_once_after_wrong_attempts() {
        let (mut session, _) = ready(QuizMode::MultipleChoice, 5);
        let wrong = wrong_option(&session);
        session.answer(&wrong).unwrap();
        session.answer(&wrong).unwrap();

        let outcome = session.reveal().unwrap();
        assert_eq!(outcome.scored.unwrap().delta, -1);
        assert!(outcome.message.contains(&session.question().unwrap().correct_answer));
        assert_eq!(session.reveal(), Err(QuizError::Locked));

        let (mut hard, _) = ready(QuizMode::FreeText, 5);
        hard.answer("zzz").unwrap();
        assert_eq!(hard.reveal().unwrap().scored.unwrap().delta, -2);
        assert_eq!(hard.skip(), Err(QuizError::Locked));
    }

    #[test]
    fn skip_only_in_free_text() {
        let (mut session, _) = ready(QuizMode::MultipleChoice, 6);
        assert_eq!(session.skip(), Err(QuizError::SkipUnavailable));

        let (mut hard, _) = ready(QuizMode::FreeText, 6);
        let outcome = hard.skip().unwrap();
        assert_eq!(outcome.feedback, Feedback::Skipped);
        assert_eq!(outcome.scored.unwrap().delta, -1);
        assert!(!outcome.message.contains(&hard.question().unwrap().correct_answer));
        assert_eq!(hard.answer("anything"), Err(QuizError::Locked));
    }

    #[test]
    fn advance_requires_a_finished_question() {
        let (mut session, mut rng) = ready(QuizMode::FreeText, 7);
        assert_eq!(session.advance(&mut rng).unwrap_err(), QuizError::StillOpen);

        let first = session.guard().unwrap();
        session.skip().unwrap();
        session.advance(&mut rng).unwrap();

        let second = session.guard().unwrap();
        assert_ne!(first, second);
        assert!(!session.is_current(first));
        assert!(session.is_current(second));
        assert_eq!(session.active().unwrap().status, QuestionStatus::Open);
    }

    #[test]
    fn guards_differ_between_sessions() {
        let (a, _) = ready(QuizMode::FreeText, 8);
        let (b, _) = ready(QuizMode::FreeText, 8);
        assert!(!b.is_current(a.guard().unwrap()));
    }
}
