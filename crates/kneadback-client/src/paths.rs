use crate::error::{ClientError, Result};
use std::env;
use std::path::PathBuf;

const APP_DIR: &str = "kneadback";
pub const QUEUE_FILENAME: &str = "queue.jsonl";

pub fn data_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os("XDG_DATA_HOME") {
        let path = PathBuf::from(dir);
        if path.as_os_str().is_empty() {
            return Err(ClientError::InvalidDataPath(path));
        }
        return Ok(path.join(APP_DIR));
    }

    let home = dirs::home_dir().ok_or(ClientError::MissingHomeDir)?;
    Ok(home.join(".local").join("share").join(APP_DIR))
}

pub fn default_queue_path() -> Result<PathBuf> {
    Ok(data_dir()?.join(QUEUE_FILENAME))
}

/// Explicit path (flag, config or env) wins over the XDG default.
pub fn resolve_queue_path(custom: Option<PathBuf>) -> Result<PathBuf> {
    match custom {
        Some(path) if path.as_os_str().is_empty() => Err(ClientError::InvalidDataPath(path)),
        Some(path) => Ok(path),
        None => default_queue_path(),
    }
}
