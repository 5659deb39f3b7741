//! Canonical recipe shape. Endpoints disagree on field names
//! (`cookTimeMinutes` / `cooking_time`, `servingSize` / `servings`), so every
//! recipe is passed through [`normalize`] before the rest of the crate sees it.

use crate::models::NutritionTotals;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeIngredient {
    pub name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Recipe {
    pub id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub ingredients: Vec<RecipeIngredient>,
    pub instructions: Vec<String>,
    pub nutrition: Option<NutritionTotals>,
    pub cook_time_minutes: Option<u32>,
    pub prep_time_minutes: Option<u32>,
    pub serving_size: Option<u32>,
    pub difficulty: Option<String>,
}

impl Recipe {
    pub fn total_time_minutes(&self) -> Option<u32> {
        match (self.prep_time_minutes, self.cook_time_minutes) {
            (None, None) => None,
            (prep, cook) => Some(prep.unwrap_or(0) + cook.unwrap_or(0)),
        }
    }
}

/// Maps any backend spelling of a recipe onto [`Recipe`]. Returns `None` when
/// the value is not an object.
pub fn normalize(value: &Value) -> Option<Recipe> {
    let obj = value.as_object()?;

    Some(Recipe {
        id: text(obj, &["id", "_id"]),
        title: text(obj, &["title", "name"]).unwrap_or_else(|| "Untitled recipe".to_string()),
        description: text(obj, &["description"]),
        ingredients: obj
            .get("ingredients")
            .and_then(Value::as_array)
            .map(|list| list.iter().filter_map(ingredient).collect())
            .unwrap_or_default(),
        instructions: obj
            .get("instructions")
            .or_else(|| obj.get("steps"))
            .map(instructions)
            .unwrap_or_default(),
        nutrition: obj
            .get("nutrition")
            .or_else(|| obj.get("nutritional_info"))
            .filter(|v| v.is_object())
            .and_then(|v| serde_json::from_value(v.clone()).ok()),
        cook_time_minutes: minutes(obj, &["cookTimeMinutes", "cooking_time", "cook_time"]),
        prep_time_minutes: minutes(obj, &["prepTimeMinutes", "prep_time"]),
        serving_size: minutes(obj, &["servingSize", "servings"]),
        difficulty: text(obj, &["difficulty"]),
    })
}

/// Accepts a bare array or any object holding one under `recipes`.
pub fn normalize_list(value: &Value) -> Vec<Recipe> {
    let list = match value {
        Value::Array(list) => list,
        Value::Object(obj) => match obj.get("recipes").and_then(Value::as_array) {
            Some(list) => list,
            None => return normalize(value).into_iter().collect(),
        },
        _ => return Vec::new(),
    };
    list.iter().filter_map(normalize).collect()
}

fn text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn minutes(obj: &Map<String, Value>, keys: &[&str]) -> Option<u32> {
    keys.iter()
        .find_map(|key| obj.get(*key).and_then(number))
        .filter(|n| *n >= 0.0)
        .map(|n| n.round() as u32)
}

fn ingredient(value: &Value) -> Option<RecipeIngredient> {
    match value {
        Value::String(name) if !name.trim().is_empty() => Some(RecipeIngredient {
            name: name.trim().to_string(),
            quantity: None,
            unit: None,
        }),
        Value::Object(obj) => Some(RecipeIngredient {
            name: text(obj, &["name", "ingredient", "item"])?,
            quantity: ["quantity", "amount"]
                .iter()
                .find_map(|key| obj.get(*key).and_then(number)),
            unit: text(obj, &["unit"]),
        }),
        _ => None,
    }
}

fn instructions(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => s
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        Value::Array(steps) => steps
            .iter()
            .filter_map(|step| match step {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Object(obj) => text(obj, &["instruction", "text", "step"]),
                _ => None,
            })
            .filter(|step| !step.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}
