//! Question generation and grading
//!
//! Everything here is a pure function of the word snapshot and the supplied
//! random source, so a seeded generator reproduces a quiz exactly.

use lexi_config::ScoringConfig;
use lexi_config::quiz::QuizConfig;
use lexi_types::{QuizMode, QuizQuestion, Word};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::preprocess::fold;

/// Why a quiz cannot produce questions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlockReason {
    #[error("No words found. Please add words in the Add Word section.")]
    NoWords,

    #[error(
        "You need at least {required} words with translations to play this quiz (you have {found}). Please add more words in the Add Word section."
    )]
    NotEnoughWords { required: usize, found: usize },

    #[error(
        "Your words do not have enough different translations to build the answer choices. Please add more words in the Add Word section."
    )]
    InsufficientDistractors,
}

/// Words that can be asked: at least one translation
pub fn eligible(words: &[Word]) -> Vec<&Word> {
    words.iter().filter(|w| w.is_eligible()).collect()
}

pub fn min_words(mode: QuizMode, config: &QuizConfig) -> usize {
    match mode {
        QuizMode::MultipleChoice => config.choice_min_words.max(config.distractor_count + 1),
        QuizMode::FreeText => config.typed_min_words.max(1),
    }
}

pub fn check_preconditions(
    mode: QuizMode,
    words: &[Word],
    config: &QuizConfig,
) -> Result<(), BlockReason> {
    if words.is_empty() {
        return Err(BlockReason::NoWords);
    }

    let required = min_words(mode, config);
    let found = words.iter().filter(|w| w.is_eligible()).count();
    if found < required {
        return Err(BlockReason::NotEnoughWords { required, found });
    }

    Ok(())
}

/// Build a random question from the snapshot
pub fn generate<R: Rng>(
    mode: QuizMode,
    words: &[Word],
    config: &QuizConfig,
    rng: &mut R,
) -> Result<QuizQuestion, BlockReason> {
    check_preconditions(mode, words, config)?;

    let pool = eligible(words);
    let chosen = rng.gen_range(0..pool.len());
    let word = pool[chosen];
    let translation = &word.translations[rng.gen_range(0..word.translations.len())];

    let (distractors, options) = match mode {
        QuizMode::MultipleChoice => {
            let distractors = pick_distractors(&pool, chosen, &translation.text, config, rng)?;
            let mut options = Vec::with_capacity(distractors.len() + 1);
            options.push(translation.text.clone());
            options.extend(distractors.iter().cloned());
            options.shuffle(rng);
            (distractors, options)
        }
        QuizMode::FreeText => (Vec::new(), Vec::new()),
    };

    Ok(QuizQuestion {
        prompt: word.text.clone(),
        prompt_language: word.primary_language.clone(),
        correct_answer: translation.text.clone(),
        target_language: translation.language.clone(),
        distractors,
        options,
    })
}

/// Wrong answers taken from the other words
///
/// Rejection sampling runs for at most `max_distractor_attempts` draws. If that
/// leaves gaps, the remaining distinct candidates (translations first, then
/// headwords of the other words) fill them in shuffled order.
fn pick_distractors<R: Rng>(
    pool: &[&Word],
    chosen: usize,
    correct: &str,
    config: &QuizConfig,
    rng: &mut R,
) -> Result<Vec<String>, BlockReason> {
    let count = config.distractor_count;
    let others: Vec<&Word> = pool
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != chosen)
        .map(|(_, w)| *w)
        .collect();

    let mut picked: Vec<String> = Vec::with_capacity(count);
    let mut attempts = 0;

    while picked.len() < count && attempts < config.max_distractor_attempts {
        attempts += 1;
        let Some(word) = others.choose(rng) else {
            break;
        };
        let Some(translation) = word.translations.choose(rng) else {
            continue;
        };
        if translation.text != correct && !picked.contains(&translation.text) {
            picked.push(translation.text.clone());
        }
    }

    if picked.len() < count {
        tracing::debug!(
            "distractor sampling found {}/{count} after {attempts} draws, filling from pool",
            picked.len()
        );

        let mut translations: Vec<&str> = others
            .iter()
            .flat_map(|w| w.translations.iter().map(|t| t.text.as_str()))
            .collect();
        let mut headwords: Vec<&str> = others.iter().map(|w| w.text.as_str()).collect();
        translations.shuffle(rng);
        headwords.shuffle(rng);

        for candidate in translations.into_iter().chain(headwords) {
            if picked.len() == count {
                break;
            }
            if candidate != correct && !picked.iter().any(|p| p == candidate) {
                picked.push(candidate.to_string());
            }
        }
    }

    if picked.len() < count {
        return Err(BlockReason::InsufficientDistractors);
    }

    Ok(picked)
}

/// Typed answer: trimmed, case-insensitive
pub fn grade_typed(input: &str, correct: &str) -> bool {
    fold(input) == fold(correct)
}

/// Selected option: exact match
pub fn grade_choice(selected: &str, correct: &str) -> bool {
    selected == correct
}

pub fn reward(mode: QuizMode, scoring: &ScoringConfig) -> i64 {
    match mode {
        QuizMode::MultipleChoice => scoring.choice_correct,
        QuizMode::FreeText => scoring.typed_correct,
    }
}

pub fn reveal_penalty(mode: QuizMode, scoring: &ScoringConfig) -> i64 {
    match mode {
        QuizMode::MultipleChoice => scoring.choice_reveal,
        QuizMode::FreeText => scoring.typed_reveal,
    }
}

/// Skipping exists only for typed answers
pub fn skip_penalty(mode: QuizMode, scoring: &ScoringConfig) -> Option<i64> {
    match mode {
        QuizMode::MultipleChoice => None,
        QuizMode::FreeText => Some(scoring.typed_skip),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use lexi_types::Translation;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn word(id: &str, text: &str, lang: &str, translations: &[(&str, &str)]) -> Word {
        Word::new(
            id,
            text,
            lang,
            translations
                .iter()
                .map(|(l, t)| Translation::new(*l, *t))
                .collect(),
        )
    }

    fn four_words() -> Vec<Word> {
        vec![
            word("1", "Dog", "en", &[("es", "Perro")]),
            word("2", "Gato", "es", &[("en", "Cat")]),
            word("3", "Chat", "fr", &[("en", "Cat")]),
            word("4", "Cane", "it", &[("en", "Dog")]),
        ]
    }

    #[test]
    fn multiple_choice_needs_four_eligible_words() {
        let config = QuizConfig::default();
        let mut words = four_words();
        words[3].translations.clear();

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let err = generate(QuizMode::MultipleChoice, &words, &config, &mut rng).unwrap_err();
        assert_eq!(err, BlockReason::NotEnoughWords { required: 4, found: 3 });
    }

    #[test]
    fn free_text_needs_one_eligible_word() {
        let config = QuizConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        assert_eq!(
            generate(QuizMode::FreeText, &[], &config, &mut rng).unwrap_err(),
            BlockReason::NoWords
        );

        let bare = vec![word("1", "Dog", "en", &[])];
        assert_eq!(
            generate(QuizMode::FreeText, &bare, &config, &mut rng).unwrap_err(),
            BlockReason::NotEnoughWords { required: 1, found: 0 }
        );
    }

    #[test]
    fn four_words_always_give_four_distinct_options() {
        let config = QuizConfig::default();
        let words = four_words();

        for seed in 0..200 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let q = generate(QuizMode::MultipleChoice, &words, &config, &mut rng).unwrap();

            let distinct: HashSet<&String> = q.options.iter().collect();
            assert_eq!(q.options.len(), 4, "seed {seed}");
            assert_eq!(distinct.len(), 4, "seed {seed}: {:?}", q.options);
            assert!(q.options.contains(&q.correct_answer));
            assert!(!q.distractors.contains(&q.correct_answer));

            let source = words.iter().find(|w| w.text == q.prompt).unwrap();
            assert_eq!(source.primary_language, q.prompt_language);
            assert!(
                source
                    .translations
                    .iter()
                    .any(|t| t.text == q.correct_answer && t.language == q.target_language)
            );
        }
    }

    #[test]
    fn saturated_pool_blocks_instead_of_looping() {
        let config = QuizConfig::default();
        let words = vec![
            word("1", "A", "en", &[("es", "X")]),
            word("2", "A", "fr", &[("es", "X")]),
            word("3", "A", "it", &[("en", "X")]),
            word("4", "A", "es", &[("en", "X")]),
        ];

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert_eq!(
            generate(QuizMode::MultipleChoice, &words, &config, &mut rng).unwrap_err(),
            BlockReason::InsufficientDistractors
        );
    }

    #[test]
    fn same_seed_same_question() {
        let config = QuizConfig::default();
        let words = four_words();

        let mut a = ChaCha8Rng::seed_from_u64(42);
        let mut b = ChaCha8Rng::seed_from_u64(42);
        assert_eq!(
            generate(QuizMode::MultipleChoice, &words, &config, &mut a).unwrap(),
            generate(QuizMode::MultipleChoice, &words, &config, &mut b).unwrap()
        );
    }

    #[test]
    fn free_text_question_has_no_options() {
        let config = QuizConfig::default();
        let words = vec![word("1", "Dog", "en", &[("es", "Perro"), ("fr", "Chien")])];
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let q = generate(QuizMode::FreeText, &words, &config, &mut rng).unwrap();
        assert!(q.options.is_empty());
        assert!(q.distractors.is_empty());
        assert!(["Perro", "Chien"].contains(&q.correct_answer.as_str()));
    }

    #[test]
    fn grading_rules() {
        assert!(grade_typed("  perro ", "Perro"));
        assert!(!grade_typed("perros", "Perro"));
        assert!(grade_choice("Perro", "Perro"));
        assert!(!grade_choice("perro", "Perro"));
    }

    #[test]
    fn deltas_per_mode() {
        let scoring = ScoringConfig::default();
        assert_eq!(reward(QuizMode::MultipleChoice, &scoring), 1);
        assert_eq!(reward(QuizMode::FreeText, &scoring), 2);
        assert_eq!(reveal_penalty(QuizMode::MultipleChoice, &scoring), -1);
        assert_eq!(reveal_penalty(QuizMode::FreeText, &scoring), -2);
        assert_eq!(skip_penalty(QuizMode::MultipleChoice, &scoring), None);
        assert_eq!(skip_penalty(QuizMode::FreeText, &scoring), Some(-1));
    }
}
