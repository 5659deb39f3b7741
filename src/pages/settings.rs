use crate::api::endpoints;
use crate::errors::{ApiError, PageError, ValidationError};
use crate::models::{ApiKeyCheck, ApiKeyStatus};
use crate::state::AppServices;
use crate::storage::{Preferences, load_preferences, persist_preferences};
use serde_json::json;
use std::path::PathBuf;
use tracing::{error, info, warn};

pub struct SettingsPage {
    services: AppServices,
    prefs_path: PathBuf,
    prefs: Preferences,
    configured: bool,
}

impl SettingsPage {
    pub fn new(services: AppServices, prefs_path: PathBuf) -> Self {
        Self {
            services,
            prefs_path,
            prefs: Preferences::default(),
            configured: false,
        }
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Reads the cached preferences, then asks the backend for the key status.
    pub async fn load(&mut self) -> bool {
        self.prefs = load_preferences(&self.prefs_path).await;
        self.check_status().await
    }

    pub async fn check_status(&mut self) -> bool {
        self.configured = match self
            .services
            .api
            .get_as::<ApiKeyStatus>(endpoints::API_KEY_STATUS)
            .await
        {
            Ok(status) => status.configured,
            Err(err) => {
                error!("error checking API key status: {err}");
                false
            }
        };
        self.configured
    }

    async fn test_and_save(&self, api_key: &str) -> Result<bool, ApiError> {
        let body = json!({ "api_key": api_key });
        let check: ApiKeyCheck = self.services.api.post_as(endpoints::API_KEY_TEST, &body).await?;
        if !check.valid {
            return Ok(false);
        }
        self.services.api.post(endpoints::API_KEY_SAVE, &body).await?;
        Ok(true)
    }

    /// Tests the key, saves it on the backend and caches it locally.
    /// `Ok(false)` means the backend judged the key invalid.
    pub async fn save_api_key(&mut self, api_key: &str) -> Result<bool, PageError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            let err = ValidationError::MissingApiKey;
            self.services.toasts.error(&err.to_string());
            return Err(err.into());
        }

        let _loading = self.services.loading.begin();
        match self.test_and_save(api_key).await {
            Ok(true) => {
                self.prefs.api_key = Some(api_key.to_string());
                self.prefs.backend_url = Some(self.services.api.base_url().to_string());
                if let Err(err) = persist_preferences(&self.prefs_path, &self.prefs).await {
                    warn!("could not cache preferences: {err}");
                }
                self.configured = true;
                info!("API key configured");
                self.services.toasts.success("API key saved successfully!");
                Ok(true)
            }
            Ok(false) => {
                self.services
                    .toasts
                    .error("Invalid API key. Please check and try again.");
                Ok(false)
            }
            Err(err) => {
                error!("error saving API key: {err}");
                self.services
                    .toasts
                    .error("Failed to save API key. Please try again.");
                Err(err.into())
            }
        }
    }
}
