use std::{env, path::PathBuf};

/// Local development origin used when the app runs on a loopback host.
pub const LOCAL_DEV_API: &str = "http://localhost:5000/api";

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_ORIGIN: &str = "http://localhost";
const DEFAULT_PREFS_PATH: &str = "data/preferences.json";

/// Startup configuration, resolved once and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_base_url: String,
    pub id_token: Option<String>,
    pub prefs_path: PathBuf,
}

impl Config {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            id_token: None,
            prefs_path: PathBuf::from(DEFAULT_PREFS_PATH),
        }
    }

    pub fn from_env() -> Self {
        let override_url = non_empty_var("PANTRY_API_BASE_URL");
        let host = non_empty_var("PANTRY_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let origin = non_empty_var("PANTRY_ORIGIN").unwrap_or_else(|| DEFAULT_ORIGIN.to_string());

        let mut config = Config::new(resolve_base_url(override_url.as_deref(), &host, &origin));
        config.id_token = non_empty_var("PANTRY_ID_TOKEN");
        config.prefs_path = resolve_prefs_path();
        config
    }
}

/// Explicit override first, then the loopback dev origin, then `/api` on the
/// serving origin.
pub fn resolve_base_url(override_url: Option<&str>, host: &str, origin: &str) -> String {
    if let Some(url) = override_url {
        return url.trim_end_matches('/').to_string();
    }

    if host == "localhost" || host == "127.0.0.1" {
        return LOCAL_DEV_API.to_string();
    }

    format!("{}/api", origin.trim_end_matches('/'))
}

pub fn resolve_prefs_path() -> PathBuf {
    if let Ok(path) = env::var("PANTRY_PREFS_PATH") {
        return PathBuf::from(path);
    }

    PathBuf::from(DEFAULT_PREFS_PATH)
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
