//! Small JSON cache of user preferences that survives restarts.

use serde::{Deserialize, Serialize};
use std::{io, path::Path};
use tokio::fs;
use tracing::error;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_url: Option<String>,
}

pub async fn load_preferences(path: &Path) -> Preferences {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(prefs) => prefs,
            Err(err) => {
                error!("failed to parse preferences file: {err}");
                Preferences::default()
            }
        },
        Err(err) if err.kind() == io::ErrorKind::NotFound => Preferences::default(),
        Err(err) => {
            error!("failed to read preferences file: {err}");
            Preferences::default()
        }
    }
}

pub async fn persist_preferences(path: &Path, prefs: &Preferences) -> io::Result<()> {
    let payload = serde_json::to_vec_pretty(prefs)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, payload).await
}
