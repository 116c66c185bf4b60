pub mod language;
pub mod types;

pub use language::{LANGUAGES, Language};
pub use types::*;
