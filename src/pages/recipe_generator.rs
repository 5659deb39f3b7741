use super::api_error_message;
use crate::api::{endpoints, field_or_self};
use crate::errors::{PageError, ValidationError};
use crate::recipe::{Recipe, normalize, normalize_list};
use crate::state::AppServices;
use serde_json::{Value, json};
use tracing::{error, info};

const MAX_COOKING_TIME: u32 = 60;
const DEFAULT_SERVINGS: u32 = 2;

pub struct RecipeGeneratorPage {
    services: AppServices,
    ingredients: Vec<String>,
    recipes: Vec<Recipe>,
    pub dietary_preferences: Vec<String>,
}

impl RecipeGeneratorPage {
    pub fn new(services: AppServices) -> Self {
        Self {
            services,
            ingredients: Vec::new(),
            recipes: Vec::new(),
            dietary_preferences: Vec::new(),
        }
    }

    pub fn ingredients(&self) -> &[String] {
        &self.ingredients
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    /// Returns false when the ingredient was blank or already selected.
    pub fn add_ingredient(&mut self, ingredient: &str) -> bool {
        let ingredient = ingredient.trim();
        if ingredient.is_empty() || self.ingredients.iter().any(|i| i == ingredient) {
            return false;
        }
        self.ingredients.push(ingredient.to_string());
        true
    }

    pub fn remove_ingredient(&mut self, ingredient: &str) {
        self.ingredients.retain(|i| i != ingredient.trim());
    }

    pub async fn generate(&mut self) -> Result<usize, PageError> {
        if self.ingredients.is_empty() {
            let err = ValidationError::NoIngredients;
            self.services.toasts.warning(&err.to_string());
            return Err(err.into());
        }

        let _loading = self.services.loading.begin();
        let body = json!({
            "ingredients": self.ingredients,
            "dietary_preferences": self.dietary_preferences,
            "max_cooking_time": MAX_COOKING_TIME,
            "servings": DEFAULT_SERVINGS,
        });

        match self.services.api.post(endpoints::RECIPES_GENERATE, &body).await {
            Ok(payload) => {
                self.recipes = match payload.get("recipe") {
                    Some(recipe) => normalize(recipe).into_iter().collect(),
                    None => normalize_list(&payload),
                };
                info!("generated {} recipes", self.recipes.len());
                self.services.toasts.success("Recipe generated successfully!");
                Ok(self.recipes.len())
            }
            Err(err) => {
                error!("error generating recipes: {err}");
                self.services.toasts.error(&api_error_message(
                    &err,
                    "Failed to generate recipes. Please try again.",
                ));
                Err(err.into())
            }
        }
    }

    pub async fn open_recipe(&self, id: &str) -> Result<Recipe, PageError> {
        let fetched = match self.services.api.get(&endpoints::recipe(id)).await {
            Ok(payload) => {
                let value: Value = field_or_self(payload, "recipe");
                normalize(&value).ok_or(PageError::NotFound)
            }
            Err(err) => Err(PageError::Api(err)),
        };

        if let Err(err) = &fetched {
            error!("error loading recipe {id}: {err}");
            let message = match err {
                PageError::Api(api) => api_error_message(api, "Failed to load recipe"),
                _ => "Failed to load recipe".to_string(),
            };
            self.services.toasts.error(&message);
        }
        fetched
    }
}
