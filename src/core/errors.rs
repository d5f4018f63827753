use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnkiError {
    #[error("Anki is not reachable: {0}")]
    RemoteUnavailable(String),

    #[error("AnkiConnect rejected '{action}': {message}")]
    RemoteRequestFailed { action: String, message: String },

    #[error("Unexpected result for '{action}': {source}")]
    UnexpectedResult {
        action: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed vocabulary input: {0}")]
    MalformedInput(String),

    #[error("Failed to launch Anki: {0}")]
    Launch(String),

    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnkiError {
    pub fn request_failed(action: &str, message: impl Into<String>) -> Self {
        AnkiError::RemoteRequestFailed { action: action.to_string(), message: message.into() }
    }

    /// True when the endpoint itself could not be reached, as opposed to a
    /// request the endpoint answered with an error.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, AnkiError::RemoteUnavailable(_))
    }
}

impl From<std::io::Error> for AnkiError {
    fn from(error: std::io::Error) -> Self {
        AnkiError::Io(Box::new(error))
    }
}

impl From<reqwest::Error> for AnkiError {
    fn from(error: reqwest::Error) -> Self {
        AnkiError::RemoteUnavailable(error.to_string())
    }
}
