pub mod errors;

pub use errors::AnkiError;
