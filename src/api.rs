use crate::config::Config;
use crate::errors::{ApiError, AuthError};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, Url, header::CONTENT_TYPE};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Anything able to produce a bearer token for the current session.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// `Ok(None)` when nobody is signed in.
    async fn id_token(&self) -> Result<Option<String>, AuthError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

#[async_trait]
impl TokenSource for NoAuth {
    async fn id_token(&self) -> Result<Option<String>, AuthError> {
        Ok(None)
    }
}

/// Single point of HTTP communication with the backend. Cloning shares the
/// connection pool and token source.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl ApiClient {
    pub fn new(config: &Config, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            http: Client::new(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    pub fn unauthenticated(config: &Config) -> Self {
        Self::new(config, Arc::new(NoAuth))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> Result<Url, ApiError> {
        let raw = if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        };
        Url::parse(&raw).map_err(|err| ApiError::InvalidUrl(format!("{raw}: {err}")))
    }

    /// Sends one request and returns the unwrapped payload. No retry.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        self.execute(method, endpoint, &[], body).await
    }

    async fn execute(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let url = self.url(endpoint)?;
        debug!("{method} {url}");

        let mut builder = self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, "application/json");
        if !query.is_empty() {
            builder = builder.query(query);
        }
        match self.tokens.id_token().await {
            Ok(Some(token)) => builder = builder.bearer_auth(token),
            Ok(None) => {}
            Err(err) => warn!("could not get auth token, sending unauthenticated: {err}"),
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("application/json"));
        let text = response.text().await?;

        let body = if !is_json {
            Value::String(text)
        } else if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(err) if status.is_success() => return Err(err.into()),
                Err(_) => Value::Null,
            }
        };

        if !status.is_success() {
            let message = error_message(&body, status);
            warn!("request to {endpoint} failed with {status}: {message}");
            return Err(ApiError::Server { status, message });
        }

        Ok(unwrap_envelope(body))
    }

    pub async fn get(&self, endpoint: &str) -> Result<Value, ApiError> {
        self.request(Method::GET, endpoint, None).await
    }

    pub async fn get_with_query(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<Value, ApiError> {
        self.execute(Method::GET, endpoint, query, None).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<Value, ApiError> {
        let body = serde_json::to_value(body)?;
        self.request(Method::POST, endpoint, Some(&body)).await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<Value, ApiError> {
        let body = serde_json::to_value(body)?;
        self.request(Method::PUT, endpoint, Some(&body)).await
    }

    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<Value, ApiError> {
        let body = serde_json::to_value(body)?;
        self.request(Method::PATCH, endpoint, Some(&body)).await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<Value, ApiError> {
        self.request(Method::DELETE, endpoint, None).await
    }

    pub async fn get_as<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        Ok(serde_json::from_value(self.get(endpoint).await?)?)
    }

    pub async fn post_as<B, T>(&self, endpoint: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        Ok(serde_json::from_value(self.post(endpoint, body).await?)?)
    }
}

/// Returns `body.data` when the body is an envelope, else the body itself.
/// A `data` of null, false, 0 or "" does not count as an envelope.
pub fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.get("data").is_some_and(is_truthy) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// `error`, then `message`, then a generic status line.
pub fn error_message(body: &Value, status: StatusCode) -> String {
    ["error", "message"]
        .iter()
        .find_map(|key| match body.get(*key) {
            Some(Value::String(text)) if !text.is_empty() => Some(text.clone()),
            _ => None,
        })
        .unwrap_or_else(|| format!("API Error: {}", status.as_u16()))
}

/// Pulls `key` out of an object payload, falling back to the payload itself
/// for endpoints that answer with the bare resource.
pub fn field_or_self(payload: Value, key: &str) -> Value {
    match payload {
        Value::Object(mut map) if map.contains_key(key) => map.remove(key).unwrap_or(Value::Null),
        other => other,
    }
}

pub mod endpoints {
    use chrono::NaiveDate;

    pub const FRIDGE_ITEMS: &str = "/fridge/items";
    pub const FRIDGE_SUGGEST_RECIPES: &str = "/fridge/suggest-recipes";

    pub const GROCERY_ITEMS: &str = "/grocery/items";
    pub const GROCERY_PURCHASED: &str = "/grocery/purchased";
    pub const GROCERY_FROM_MEAL_PLAN: &str = "/grocery/from-meal-plan";

    pub const MEAL_PLANS: &str = "/meal-plans";
    pub const MEAL_PLANS_GENERATE: &str = "/meal-plans/generate";

    pub const NUTRITION_GOALS: &str = "/nutrition/goals";
    pub const NUTRITION_LOG_MEAL: &str = "/nutrition/log-meal";
    pub const NUTRITION_WATER: &str = "/nutrition/water-intake";

    pub const RECIPES_GENERATE: &str = "/recipes/generate-with-ai";

    pub const API_KEY_STATUS: &str = "/settings/gemini-api-key/status";
    pub const API_KEY_TEST: &str = "/settings/gemini-api-key/test";
    pub const API_KEY_SAVE: &str = "/settings/gemini-api-key/save";

    pub fn fridge_item(id: &str) -> String {
        format!("{FRIDGE_ITEMS}/{id}")
    }

    pub fn grocery_item(index: usize) -> String {
        format!("{GROCERY_ITEMS}/{index}")
    }

    pub fn grocery_toggle(index: usize) -> String {
        format!("/grocery/toggle-purchased/{index}")
    }

    pub fn meal_plan(id: &str) -> String {
        format!("{MEAL_PLANS}/{id}")
    }

    pub fn nutrition_daily(date: NaiveDate) -> String {
        format!("/nutrition/daily/{}", date.format("%Y-%m-%d"))
    }

    pub fn nutrition_meal(id: &str) -> String {
        format!("/nutrition/meals/{id}")
    }

    pub fn recipe(id: &str) -> String {
        format!("/recipes/{id}")
    }
}
