pub mod auth;
pub mod error;
pub mod preprocess;
pub mod quiz;
pub mod repository;
pub mod score;
pub mod session;
pub mod state;
pub mod validation;
pub mod words;

pub use error::LexiError;
