use std::{
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{
    json,
    Value,
};

use super::types::{
    NewNote,
    NoteId,
    NoteInfo,
    Request,
    PROTOCOL_VERSION,
};
use crate::{
    core::AnkiError,
    persistence::Settings,
};

/// Moves one request envelope to the automation endpoint and hands back the
/// raw response envelope. Implementations do not retry.
#[async_trait]
pub trait AnkiTransport: Send + Sync {
    async fn send(&self, action: &str, body: Value) -> Result<Value, AnkiError>;
}

/// HTTP transport talking to a running AnkiConnect add-on.
pub struct AnkiConnect {
    client: Client,
    endpoint: String,
}

impl AnkiConnect {
    pub fn new(
        endpoint: &str,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, AnkiError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .no_proxy()
            .build()
            .map_err(|e| AnkiError::RemoteUnavailable(format!("HTTP client build failed: {e}")))?;

        Ok(Self { client, endpoint: endpoint.to_string() })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, AnkiError> {
        Self::new(
            &settings.endpoint,
            Duration::from_secs(settings.request_timeout_secs),
            Duration::from_secs(settings.connect_timeout_secs),
        )
    }
}

#[async_trait]
impl AnkiTransport for AnkiConnect {
    async fn send(&self, action: &str, body: Value) -> Result<Value, AnkiError> {
        let response = self.client.post(&self.endpoint).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(AnkiError::request_failed(
                action,
                format!("HTTP {} from {}", response.status(), self.endpoint),
            ));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| AnkiError::request_failed(action, format!("invalid response body: {e}")))
    }
}

/// Typed gateway over an [`AnkiTransport`]. Cloning shares the transport.
#[derive(Clone)]
pub struct AnkiClient {
    transport: Arc<dyn AnkiTransport>,
}

impl AnkiClient {
    pub fn new(transport: Arc<dyn AnkiTransport>) -> Self {
        Self { transport }
    }

    pub fn connect(settings: &Settings) -> Result<Self, AnkiError> {
        Ok(Self::new(Arc::new(AnkiConnect::from_settings(settings)?)))
    }

    /// Issues `action` and deserializes the envelope's `result` into `R`.
    pub async fn call<R: DeserializeOwned>(
        &self,
        action: &str,
        params: Option<Value>,
    ) -> Result<R, AnkiError> {
        let body = serde_json::to_value(Request { action, version: PROTOCOL_VERSION, params })?;
        debug!("AnkiConnect -> {action}");

        let response = self.transport.send(action, body).await?;
        read_result(action, response)
    }

    pub async fn version(&self) -> Result<u32, AnkiError> {
        self.call("version", None).await
    }

    pub async fn deck_names(&self) -> Result<Vec<String>, AnkiError> {
        self.call("deckNames", Some(json!({}))).await
    }

    pub async fn add_note(&self, note: &NewNote) -> Result<NoteId, AnkiError> {
        self.call("addNote", Some(json!({ "note": note }))).await
    }

    pub async fn find_notes(&self, query: &str) -> Result<Vec<NoteId>, AnkiError> {
        self.call("findNotes", Some(json!({ "query": query }))).await
    }

    /// One entry per requested id, in request order. Anki answers `{}` for an
    /// id that no longer exists; such entries come back as `None`.
    pub async fn notes_info(&self, note_ids: &[NoteId]) -> Result<Vec<Option<NoteInfo>>, AnkiError> {
        let raw: Vec<Value> = self.call("notesInfo", Some(json!({ "notes": note_ids }))).await?;
        Ok(raw
            .into_iter()
            .map(|entry| match serde_json::from_value::<NoteInfo>(entry) {
                Ok(note) => Some(note),
                Err(e) => {
                    debug!("Unreadable notesInfo entry: {e}");
                    None
                }
            })
            .collect())
    }

    pub async fn add_tags(&self, note_ids: &[NoteId], tags: &[&str]) -> Result<(), AnkiError> {
        self.call("addTags", Some(json!({ "notes": note_ids, "tags": tags.join(" ") }))).await
    }

    pub async fn remove_tags(&self, note_ids: &[NoteId], tags: &[&str]) -> Result<(), AnkiError> {
        self.call("removeTags", Some(json!({ "notes": note_ids, "tags": tags.join(" ") }))).await
    }

    pub async fn update_model(&self, model_name: &str, css: &str) -> Result<(), AnkiError> {
        self.call("updateModel", Some(json!({ "modelName": model_name, "css": css }))).await
    }
}

fn read_result<R: DeserializeOwned>(action: &str, response: Value) -> Result<R, AnkiError> {
    let Value::Object(mut envelope) = response else {
        return Err(AnkiError::request_failed(action, "response is not a JSON object"));
    };

    match envelope.remove("error") {
        None | Some(Value::Null) => {}
        Some(Value::String(message)) => return Err(AnkiError::request_failed(action, message)),
        Some(other) => return Err(AnkiError::request_failed(action, other.to_string())),
    }

    let result = envelope
        .remove("result")
        .ok_or_else(|| AnkiError::request_failed(action, "response has no result field"))?;

    serde_json::from_value(result)
        .map_err(|source| AnkiError::UnexpectedResult { action: action.to_string(), source })
}
