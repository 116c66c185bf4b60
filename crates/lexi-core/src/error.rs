use lexi_store::{AuthError, StoreError};

use crate::repository::WordError;
use crate::session::QuizError;
use crate::validation::ValidationErrors;

#[derive(Debug, thiserror::Error)]
pub enum LexiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Invalid(#[from] ValidationErrors),

    #[error(transparent)]
    Quiz(#[from] QuizError),

    #[error(transparent)]
    Word(#[from] WordError),

    #[error("Not signed in")]
    SignedOut,

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl LexiError {
    /// Text safe to show to the user
    pub fn user_message(&self) -> String {
        match self {
            LexiError::Auth(err) => err.to_string(),
            LexiError::Invalid(err) => err.to_string(),
            LexiError::Quiz(err) => err.to_string(),
            LexiError::SignedOut => "Please sign in first.".to_string(),
            LexiError::Store(_) | LexiError::Decode(_) | LexiError::Word(WordError::Store(_)) => {
                "Something went wrong. Please try again.".to_string()
            }
            LexiError::Word(err) => err.to_string(),
        }
    }
}
