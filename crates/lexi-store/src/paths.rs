//! Logical document paths

use lexi_types::{UserId, WordId};

/// Profile document: name and score
pub fn user(uid: &UserId) -> String {
    format!("users/{uid}")
}

/// Collection of a user's words
pub fn user_words(uid: &UserId) -> String {
    format!("user_words/{uid}")
}

pub fn user_word(uid: &UserId, id: &WordId) -> String {
    format!("user_words/{uid}/{id}")
}
