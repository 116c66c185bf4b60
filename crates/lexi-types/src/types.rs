use serde::{Deserialize, Serialize};

pub type LanguageCode = String;
pub type WordId = String;
pub type UserId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub language: LanguageCode,
    #[serde(rename = "translation")]
    pub text: String,
}

impl Translation {
    pub fn new(language: impl Into<LanguageCode>, text: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            text: text.into(),
        }
    }
}

/// Stored shape of `user_words/{uid}/{wordId}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordDocument {
    #[serde(rename = "word")]
    pub text: String,
    #[serde(rename = "primaryLanguage")]
    pub primary_language: LanguageCode,
    #[serde(default)]
    pub translations: Vec<Translation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub id: WordId,
    pub text: String,
    pub primary_language: LanguageCode,
    pub translations: Vec<Translation>,
}

impl Word {
    pub fn new(
        id: impl Into<WordId>,
        text: impl Into<String>,
        primary_language: impl Into<LanguageCode>,
        translations: Vec<Translation>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            primary_language: primary_language.into(),
            translations,
        }
    }

    pub fn from_document(id: WordId, doc: WordDocument) -> Self {
        Self {
            id,
            text: doc.text,
            primary_language: doc.primary_language,
            translations: doc.translations,
        }
    }

    pub fn to_document(&self) -> WordDocument {
        WordDocument {
            text: self.text.clone(),
            primary_language: self.primary_language.clone(),
            translations: self.translations.clone(),
        }
    }

    /// Words without translations cannot be quizzed
    pub fn is_eligible(&self) -> bool {
        !self.translations.is_empty()
    }
}

/// Unvalidated form input for a word
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordDraft {
    pub text: String,
    pub primary_language: Option<LanguageCode>,
    pub translations: Vec<DraftTranslation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftTranslation {
    pub language: Option<LanguageCode>,
    pub text: String,
}

impl DraftTranslation {
    pub fn new(language: impl Into<LanguageCode>, text: impl Into<String>) -> Self {
        Self {
            language: Some(language.into()),
            text: text.into(),
        }
    }
}

impl WordDraft {
    pub fn new(text: impl Into<String>, primary_language: impl Into<LanguageCode>) -> Self {
        Self {
            text: text.into(),
            primary_language: Some(primary_language.into()),
            translations: Vec::new(),
        }
    }

    pub fn with_translation(
        mut self,
        language: impl Into<LanguageCode>,
        text: impl Into<String>,
    ) -> Self {
        self.translations.push(DraftTranslation::new(language, text));
        self
    }

    /// Prefill an edit form from a stored word
    pub fn from_word(word: &Word) -> Self {
        Self {
            text: word.text.clone(),
            primary_language: Some(word.primary_language.clone()),
            translations: word
                .translations
                .iter()
                .map(|t| DraftTranslation::new(t.language.clone(), t.text.clone()))
                .collect(),
        }
    }
}

/// Stored shape of `users/{uid}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default = "default_user_name")]
    pub name: String,
    #[serde(default)]
    pub score: i64,
}

fn default_user_name() -> String {
    "User".to_string()
}

impl UserProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            score: 0,
        }
    }
}

/// Validation failures reported for a word draft
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error)]
pub enum ErrorKind {
    #[error("Word is required")]
    EmptyText,

    #[error("Primary language is required")]
    MissingPrimaryLanguage,

    #[error("Only supported languages can be selected")]
    UnsupportedLanguage,

    #[error("Each translation must have a language and a translation")]
    IncompleteTranslation,

    #[error("Each translation must have a unique language and different from the primary language")]
    DuplicateLanguage,

    #[error("The number of translations must not exceed the available languages")]
    TooManyTranslations,

    #[error("This word already exists in the selected language")]
    DuplicateWord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuizMode {
    MultipleChoice,
    /// Typed answers ("hard" quiz)
    FreeText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    pub prompt: String,
    pub prompt_language: LanguageCode,
    pub correct_answer: String,
    pub target_language: LanguageCode,
    pub distractors: Vec<String>,
    /// Shuffled correct answer + distractors, empty in free-text mode
    pub options: Vec<String>,
}

/// Identifies the question a pending result belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuizGuard {
    pub session: u64,
    pub question: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordQuery {
    pub search: String,
    pub language: Option<LanguageCode>,
    pub order: SortOrder,
}

#[derive(Debug, Clone)]
pub enum AppEvent {
    Register {
        email: String,
        password: String,
        name: String,
    },
    Login {
        email: String,
        password: String,
    },
    Logout,
    AddWord(WordDraft),
    UpdateWord {
        id: WordId,
        draft: WordDraft,
    },
    DeleteWord(WordId),
    ListWords(WordQuery),
    StartQuiz(QuizMode),
    Answer(String),
    RevealAnswer,
    SkipQuestion,
    NextQuestion,
    LeaveQuiz,
    ShowScore,
    Quit,

    WordsChanged(Vec<Word>),
    ScoreApplied {
        guard: QuizGuard,
        result: Result<i64, String>,
    },

    SignedIn {
        name: String,
    },
    SignedOut,
    AuthFailed(String),
    ValidationFailed(Vec<ErrorKind>),
    WordSaved {
        id: WordId,
        text: String,
    },
    WordDeleted(WordId),
    ShowWords {
        words: Vec<Word>,
        count: usize,
    },
    ShowQuestion {
        mode: QuizMode,
        question: QuizQuestion,
    },
    QuizFeedback(String),
    QuizBlocked(String),
    ScoreChanged(i64),
    Notice(String),
    Failure(String),
}
