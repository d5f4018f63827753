pub mod anki;
pub mod core;
pub mod launcher;
pub mod persistence;
pub mod vocab;

pub use crate::core::AnkiError;
