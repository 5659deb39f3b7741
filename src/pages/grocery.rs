use super::{api_error_message, decode_list};
use crate::api::{endpoints, field_or_self};
use crate::catalog::GroceryCategory;
use crate::errors::{ApiError, PageError};
use crate::models::{GroceryItem, NewGroceryItem};
use crate::state::AppServices;
use crate::stats::{GroceryProgress, grocery_progress};
use chrono::NaiveDate;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use tracing::{error, info, warn};

const DEFAULT_LIST_NAME: &str = "Grocery List";

pub struct GroceryListPage {
    services: AppServices,
    items: Vec<GroceryItem>,
    list_name: Option<String>,
}

/// `2.0` prints as `2`, `0.5` as `0.5`.
pub fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 {
        format!("{quantity:.0}")
    } else {
        quantity.to_string()
    }
}

impl GroceryListPage {
    pub fn new(services: AppServices) -> Self {
        Self {
            services,
            items: Vec::new(),
            list_name: None,
        }
    }

    pub fn items(&self) -> &[GroceryItem] {
        &self.items
    }

    pub fn list_name(&self) -> &str {
        self.list_name.as_deref().unwrap_or(DEFAULT_LIST_NAME)
    }

    pub fn purchased(&self) -> Vec<&GroceryItem> {
        self.items.iter().filter(|item| item.purchased).collect()
    }

    pub fn unpurchased(&self) -> Vec<&GroceryItem> {
        self.items.iter().filter(|item| !item.purchased).collect()
    }

    pub fn grouped_by_category(&self) -> BTreeMap<GroceryCategory, Vec<&GroceryItem>> {
        let mut groups: BTreeMap<_, Vec<_>> = BTreeMap::new();
        for item in &self.items {
            groups.entry(item.category).or_default().push(item);
        }
        groups
    }

    pub fn progress(&self) -> GroceryProgress {
        grocery_progress(&self.items)
    }

    async fn refresh(&mut self) -> Result<(), ApiError> {
        let payload = self.services.api.get(endpoints::GROCERY_ITEMS).await?;
        if let Some(name) = payload.get("listName").and_then(Value::as_str) {
            self.list_name = Some(name.to_string());
        }
        self.items = decode_list(payload, "items");
        Ok(())
    }

    pub async fn load_items(&mut self) -> Result<(), PageError> {
        let _loading = self.services.loading.begin();
        match self.refresh().await {
            Ok(()) => {
                info!("loaded {} grocery items", self.items.len());
                Ok(())
            }
            Err(err) => {
                error!("error loading grocery list: {err}");
                self.services
                    .toasts
                    .error(&api_error_message(&err, "Failed to load grocery list"));
                Err(err.into())
            }
        }
    }

    pub async fn add_item(&mut self, draft: &NewGroceryItem) -> Result<(), PageError> {
        let payload = match draft.validate() {
            Ok(payload) => payload,
            Err(err) => {
                self.services.toasts.error(&err.to_string());
                return Err(err.into());
            }
        };

        let _loading = self.services.loading.begin();
        match self.services.api.post(endpoints::GROCERY_ITEMS, &payload).await {
            Ok(value) => {
                let item = serde_json::from_value(field_or_self(value, "item")).unwrap_or_else(|_| {
                    GroceryItem {
                        name: payload.name.clone(),
                        quantity: payload.quantity,
                        unit: payload.unit.to_string(),
                        category: payload.category,
                        purchased: false,
                    }
                });
                self.items.push(item);
                self.services.toasts.success("Item added to list");
                Ok(())
            }
            Err(err) => {
                error!("error adding grocery item: {err}");
                self.services
                    .toasts
                    .error(&api_error_message(&err, "Failed to add item"));
                Err(err.into())
            }
        }
    }

    pub async fn edit_item(&mut self, index: usize, draft: &NewGroceryItem) -> Result<(), PageError> {
        let Some(purchased) = self.items.get(index).map(|item| item.purchased) else {
            return Err(PageError::NotFound);
        };
        let payload = match draft.validate() {
            Ok(payload) => payload,
            Err(err) => {
                self.services.toasts.error(&err.to_string());
                return Err(err.into());
            }
        };

        let _loading = self.services.loading.begin();
        if let Err(err) = self
            .services
            .api
            .put(&endpoints::grocery_item(index), &payload)
            .await
        {
            error!("error saving grocery item {index}: {err}");
            self.services
                .toasts
                .error(&api_error_message(&err, "Failed to save changes"));
            return Err(err.into());
        }

        self.items[index] = GroceryItem {
            name: payload.name,
            quantity: payload.quantity,
            unit: payload.unit.to_string(),
            category: payload.category,
            purchased,
        };
        self.services.toasts.success("Item updated successfully!");
        Ok(())
    }

    pub async fn delete_item(&mut self, index: usize) -> Result<(), PageError> {
        if index >= self.items.len() {
            return Err(PageError::NotFound);
        }
        if !self
            .services
            .confirm
            .confirm("Are you sure you want to delete this item?")
        {
            return Err(PageError::Cancelled);
        }

        let _loading = self.services.loading.begin();
        if let Err(err) = self.services.api.delete(&endpoints::grocery_item(index)).await {
            error!("error deleting grocery item {index}: {err}");
            self.services
                .toasts
                .error(&api_error_message(&err, "Failed to delete item"));
            return Err(err.into());
        }

        self.items.remove(index);
        self.services.toasts.success("Item removed");
        Ok(())
    }

    /// Buying an item first records it in the fridge; the purchase flag is
    /// only sent once that insert succeeded. The list is reloaded afterwards.
    pub async fn toggle_purchased(&mut self, index: usize) -> Result<(), PageError> {
        let Some(item) = self.items.get(index).cloned() else {
            return Err(PageError::NotFound);
        };
        let _loading = self.services.loading.begin();

        if !item.purchased {
            if let Err(err) = self
                .services
                .api
                .post(endpoints::FRIDGE_ITEMS, &item.to_fridge_payload())
                .await
            {
                error!("could not add {} to fridge, not marking purchased: {err}", item.name);
                self.services
                    .toasts
                    .error(&api_error_message(&err, "Failed to add item to fridge"));
                return Err(err.into());
            }
        }

        if let Err(err) = self
            .services
            .api
            .post(&endpoints::grocery_toggle(index), &json!({}))
            .await
        {
            error!("error toggling grocery item {index}: {err}");
            self.services
                .toasts
                .error(&api_error_message(&err, "Failed to update item"));
            return Err(err.into());
        }

        if let Err(err) = self.refresh().await {
            warn!("reload after toggle failed, flipping locally: {err}");
            if let Some(local) = self.items.get_mut(index) {
                local.purchased = !item.purchased;
            }
        }

        if item.purchased {
            self.services.toasts.info(&format!("{} moved back to the list", item.name));
        } else {
            self.services
                .toasts
                .success(&format!("{} added to your fridge", item.name));
        }
        Ok(())
    }

    /// Returns how many items were cleared.
    pub async fn clear_purchased(&mut self) -> Result<usize, PageError> {
        let count = self.items.iter().filter(|item| item.purchased).count();
        if count == 0 {
            self.services.toasts.info("No completed items to clear");
            return Ok(0);
        }
        if !self
            .services
            .confirm
            .confirm(&format!("Clear {count} completed items?"))
        {
            return Err(PageError::Cancelled);
        }

        let _loading = self.services.loading.begin();
        if let Err(err) = self.services.api.delete(endpoints::GROCERY_PURCHASED).await {
            error!("error clearing purchased items: {err}");
            self.services
                .toasts
                .error(&api_error_message(&err, "Failed to clear completed items"));
            return Err(err.into());
        }

        self.items.retain(|item| !item.purchased);
        self.services
            .toasts
            .success(&format!("{count} completed items cleared"));
        Ok(count)
    }

    pub async fn generate_from_meal_plan(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<usize, PageError> {
        let _loading = self.services.loading.begin();
        let body = json!({
            "start_date": start.format("%Y-%m-%d").to_string(),
            "end_date": end.format("%Y-%m-%d").to_string(),
        });

        match self
            .services
            .api
            .post(endpoints::GROCERY_FROM_MEAL_PLAN, &body)
            .await
        {
            Ok(payload) => {
                self.items = decode_list(payload, "items");
                self.list_name = Some(format!("Meal Plan {start} to {end}"));
                let count = self.items.len();
                self.services
                    .toasts
                    .success(&format!("{count} items added from meal plan!"));
                Ok(count)
            }
            Err(err) => {
                error!("error generating from meal plan: {err}");
                self.services.toasts.error(&api_error_message(
                    &err,
                    "Failed to generate from meal plan. Please try again.",
                ));
                Err(err.into())
            }
        }
    }

    /// Plain-text copy of the items still to buy, grouped by category.
    pub fn share_text(&self) -> String {
        let mut text = format!("{}\n\n", self.list_name());
        let mut groups: BTreeMap<GroceryCategory, Vec<&GroceryItem>> = BTreeMap::new();
        for item in self.unpurchased() {
            groups.entry(item.category).or_default().push(item);
        }

        for (category, items) in groups {
            text.push_str(&format!("{category}:\n"));
            for item in items {
                text.push_str(&format!("  • {}", item.name));
                if item.quantity > 0.0 {
                    text.push_str(&format!(" ({} {})", format_quantity(item.quantity), item.unit));
                }
                text.push('\n');
            }
            text.push('\n');
        }
        text
    }
}
