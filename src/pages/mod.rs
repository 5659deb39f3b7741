//! Page controllers. Each owns its collection, talks to the backend through
//! the shared [`AppServices`](crate::state::AppServices) and turns every
//! failure into a toast before handing the `Result` back.

pub mod fridge;
pub mod grocery;
pub mod meal_planner;
pub mod nutrition;
pub mod recipe_generator;
pub mod settings;

pub use fridge::{FridgeFilter, FridgePage, RecipeSuggestion};
pub use grocery::GroceryListPage;
pub use meal_planner::MealPlannerPage;
pub use nutrition::NutritionTrackerPage;
pub use recipe_generator::RecipeGeneratorPage;
pub use settings::SettingsPage;

use crate::errors::ApiError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

/// Server text is shown verbatim; anything else gets the page's own wording.
pub(crate) fn api_error_message(err: &ApiError, fallback: &str) -> String {
    match err {
        ApiError::Server { message, .. } => message.clone(),
        _ => fallback.to_string(),
    }
}

/// Reads a list that may arrive bare or under `key`, skipping entries that do
/// not decode.
pub(crate) fn decode_list<T: DeserializeOwned>(payload: Value, key: &str) -> Vec<T> {
    let list = match payload {
        Value::Array(list) => list,
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(list)) => list,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    list.into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(item) => Some(item),
            Err(err) => {
                warn!("skipping malformed {key} entry: {err}");
                None
            }
        })
        .collect()
}
