use crate::api::ApiClient;
use crate::feedback::{Confirmer, LoadingTracker, Notifier};
use std::sync::Arc;

/// Services shared by every page controller, built once at startup.
#[derive(Clone)]
pub struct AppServices {
    pub api: ApiClient,
    pub toasts: Arc<dyn Notifier>,
    pub confirm: Arc<dyn Confirmer>,
    pub loading: LoadingTracker,
}

impl AppServices {
    pub fn new(api: ApiClient, toasts: Arc<dyn Notifier>, confirm: Arc<dyn Confirmer>) -> Self {
        Self {
            api,
            toasts,
            confirm,
            loading: LoadingTracker::new(),
        }
    }
}
