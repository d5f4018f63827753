use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};

use log::{
    info,
    warn,
};
use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    anki::import::DEFAULT_NOTE_MODEL,
    core::AnkiError,
};

const APP_NAME: &str = "ankihelper";
pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub endpoint: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub wake_attempts: u32,
    pub wake_interval_secs: u64,
    pub note_model: String,
    pub app_paths: Vec<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8765".to_string(),
            request_timeout_secs: 30,
            connect_timeout_secs: 5,
            wake_attempts: 10,
            wake_interval_secs: 2,
            note_model: DEFAULT_NOTE_MODEL.to_string(),
            app_paths: default_app_paths(),
        }
    }
}

impl Settings {
    pub fn load() -> Self {
        load_json_or_default(&get_data_file_path(SETTINGS_FILE))
    }

    pub fn save(&self) -> Result<PathBuf, AnkiError> {
        let path = get_data_file_path(SETTINGS_FILE);
        save_json(self, &path)?;
        Ok(path)
    }
}

/// Where Anki usually lives on this platform.
pub fn default_app_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if cfg!(windows) {
        for var in ["ProgramFiles", "ProgramFiles(x86)"] {
            if let Some(dir) = std::env::var_os(var) {
                paths.push(PathBuf::from(dir).join("Anki").join("anki.exe"));
            }
        }
        if let Some(local) = dirs::data_local_dir() {
            paths.push(local.join("Programs").join("Anki").join("anki.exe"));
        }
    } else if cfg!(target_os = "macos") {
        paths.push(PathBuf::from("/Applications/Anki.app/Contents/MacOS/anki"));
    } else {
        paths.push(PathBuf::from("/usr/bin/anki"));
        paths.push(PathBuf::from("/usr/local/bin/anki"));
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".local").join("bin").join("anki"));
        }
    }

    paths
}

pub fn get_app_data_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        let app_dir = data_dir.join(APP_NAME);
        let _ = fs::create_dir_all(&app_dir);
        app_dir
    } else {
        PathBuf::from(".")
    }
}

pub fn get_data_file_path(filename: &str) -> PathBuf {
    get_app_data_dir().join(filename)
}

pub fn save_json<T: Serialize>(data: &T, path: &Path) -> Result<(), AnkiError> {
    let json = serde_json::to_string_pretty(data)?;
    fs::write(path, json)?;
    info!("Data saved to: {}", path.display());
    Ok(())
}

pub fn load_json<T: for<'de> Deserialize<'de> + Default>(path: &Path) -> Result<T, AnkiError> {
    if !path.exists() {
        return Ok(T::default());
    }

    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

pub fn load_json_or_default<T: for<'de> Deserialize<'de> + Default>(path: &Path) -> T {
    match load_json::<T>(path) {
        Ok(data) => data,
        Err(e) => {
            warn!("Failed to load {}: {}. Using defaults.", path.display(), e);
            T::default()
        }
    }
}
