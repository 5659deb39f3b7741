use pantry_client::{
    ApiClient, AppServices, AuthManager, AuthProvider, Config, StaticTokenProvider,
    feedback::{AutoConfirm, ToastLog, report_unexpected},
    freshness::{classify_at, days_until, expiry_label, today},
    pages::{FridgePage, SettingsPage, grocery::format_quantity},
};
use std::{
    error::Error,
    io::{self, Write},
    sync::Arc,
};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let toasts = Arc::new(ToastLog::echoing());
    if let Err(err) = run(Arc::clone(&toasts)).await {
        report_unexpected(toasts.as_ref(), err.as_ref());
        return Err(err);
    }

    Ok(())
}

async fn run(toasts: Arc<ToastLog>) -> Result<(), Box<dyn Error>> {
    let config = Config::from_env();
    info!("using backend {}", config.api_base_url);

    let provider = Arc::new(StaticTokenProvider::new(config.id_token.clone()));
    let auth = Arc::new(AuthManager::new(provider.clone(), toasts.clone()));
    auth.handle_auth_state_changed(provider.current_user().await)
        .await;

    let api = ApiClient::new(&config, auth);
    let services = AppServices::new(api, toasts, Arc::new(AutoConfirm(false)));

    let mut fridge = FridgePage::new(services.clone());
    if let Err(err) = fridge.load_items().await {
        warn!("showing demo inventory: {err}");
    }

    let mut settings = SettingsPage::new(services, config.prefs_path.clone());
    let configured = settings.load().await;

    let today = today();
    let mut out = io::stdout().lock();
    for item in fridge.items() {
        let freshness = classify_at(today, item.expiration_date);
        let expiry = match item.expiration_date {
            Some(date) => format!("{} ({date})", expiry_label(days_until(today, date))),
            None => "no expiry date".to_string(),
        };
        writeln!(
            out,
            "{:<14} {:<24} {:>6} {:<8} {}",
            freshness.as_str(),
            item.name,
            format_quantity(item.quantity),
            item.unit,
            expiry
        )?;
    }

    let stats = fridge.stats();
    writeln!(
        out,
        "total={} fresh={} expiring_soon={} expired={}",
        stats.total, stats.fresh, stats.expiring_soon, stats.expired
    )?;
    writeln!(
        out,
        "api_key_configured={configured} api_key_cached={}",
        settings.preferences().api_key.is_some()
    )?;

    Ok(())
}
