use std::{
    path::PathBuf,
    process::{
        Child,
        Command,
    },
    time::Duration,
};

use async_trait::async_trait;
use log::info;

use crate::{
    anki::{
        wait_awake,
        AnkiClient,
    },
    core::AnkiError,
    persistence::Settings,
};

/// The locally installed flashcard application.
#[async_trait]
pub trait AppProcess: Send + Sync {
    async fn is_running(&self) -> bool;

    /// Starts the application and returns once it accepts requests.
    async fn launch(&self) -> Result<Option<Child>, AnkiError>;
}

/// Launches the application if it is not already answering.
pub async fn ensure_running<P: AppProcess + ?Sized>(process: &P) -> Result<Option<Child>, AnkiError> {
    if process.is_running().await {
        return Ok(None);
    }
    process.launch().await
}

/// Treats "AnkiConnect answers" as "Anki is running", and starts the first
/// executable found among the configured paths otherwise.
pub struct AnkiLauncher {
    client: AnkiClient,
    app_paths: Vec<PathBuf>,
    wake_interval: Duration,
    wake_attempts: u32,
}

impl AnkiLauncher {
    pub fn new(client: AnkiClient, settings: &Settings) -> Self {
        Self {
            client,
            app_paths: settings.app_paths.clone(),
            wake_interval: Duration::from_secs(settings.wake_interval_secs),
            wake_attempts: settings.wake_attempts,
        }
    }

    pub fn find_executable(&self) -> Option<&PathBuf> {
        self.app_paths.iter().find(|path| path.is_file())
    }
}

#[async_trait]
impl AppProcess for AnkiLauncher {
    async fn is_running(&self) -> bool {
        self.client.version().await.is_ok()
    }

    async fn launch(&self) -> Result<Option<Child>, AnkiError> {
        let path = self.find_executable().ok_or_else(|| {
            AnkiError::Launch(format!("could not find an Anki installation in {:?}", self.app_paths))
        })?;

        info!("Starting Anki from {}", path.display());
        let child = Command::new(path)
            .spawn()
            .map_err(|e| AnkiError::Launch(format!("{}: {}", path.display(), e)))?;

        wait_awake(&self.client, self.wake_interval, self.wake_attempts).await?;
        Ok(Some(child))
    }
}
