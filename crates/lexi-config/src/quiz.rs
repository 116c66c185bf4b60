use serde::{Deserialize, Serialize};

fn default_choice_min_words() -> usize {
    4
}

fn default_typed_min_words() -> usize {
    1
}

fn default_distractor_count() -> usize {
    3
}

fn default_max_distractor_attempts() -> usize {
    64
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
    #[serde(default = "default_choice_min_words")]
    pub choice_min_words: usize,
    #[serde(default = "default_typed_min_words")]
    pub typed_min_words: usize,
    #[serde(default = "default_distractor_count")]
    pub distractor_count: usize,
    /// Rejection-sampling budget before falling back to the candidate pool
    #[serde(default = "default_max_distractor_attempts")]
    pub max_distractor_attempts: usize,
    pub scoring: ScoringConfig,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            choice_min_words: default_choice_min_words(),
            typed_min_words: default_typed_min_words(),
            distractor_count: default_distractor_count(),
            max_distractor_attempts: default_max_distractor_attempts(),
            scoring: ScoringConfig::default(),
        }
    }
}

/// Score deltas per quiz event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub choice_correct: i64,
    pub choice_reveal: i64,
    pub typed_correct: i64,
    pub typed_reveal: i64,
    pub typed_skip: i64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            choice_correct: 1,
            choice_reveal: -1,
            typed_correct: 2,
            typed_reveal: -2,
            typed_skip: -1,
        }
    }
}
