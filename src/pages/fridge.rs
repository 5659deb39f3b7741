use super::{api_error_message, decode_list};
use crate::api::{endpoints, field_or_self};
use crate::catalog::{FridgeCategory, Unit};
use crate::errors::{ApiError, PageError};
use crate::freshness::{Freshness, classify_at, today};
use crate::models::{
    DEFAULT_LOCATION, FridgeItem, FridgeItemChanges, FridgeItemPayload, ItemId, NewFridgeItem,
};
use crate::recipe::{Recipe, normalize, normalize_list};
use crate::state::AppServices;
use crate::stats::{FridgeStats, fridge_stats};
use chrono::{Duration, NaiveDate};
use serde_json::json;
use tracing::{error, info, warn};

pub const DEMO_WARNING: &str = "Using demo items - could not load from server";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FridgeFilter {
    pub search: String,
    pub category: Option<FridgeCategory>,
    pub freshness: Option<Freshness>,
}

impl FridgeFilter {
    pub fn matches_at(&self, today: NaiveDate, item: &FridgeItem) -> bool {
        let search = self.search.trim().to_lowercase();
        if !search.is_empty() && !item.name.to_lowercase().contains(&search) {
            return false;
        }
        if self.category.is_some_and(|category| category != item.category) {
            return false;
        }
        if let Some(freshness) = self.freshness {
            return classify_at(today, item.expiration_date) == freshness;
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecipeSuggestion {
    pub recipe: Recipe,
    pub similar: Vec<Recipe>,
}

/// Fixed sample inventory shown when the backend cannot be reached.
pub fn demo_items(today: NaiveDate) -> Vec<FridgeItem> {
    let demo = |n: u8, name: &str, category, quantity, unit: Unit, days| FridgeItem {
        id: ItemId::Demo(n),
        name: name.to_string(),
        category,
        quantity,
        unit: unit.to_string(),
        expiration_date: Some(today + Duration::days(days)),
        location: DEFAULT_LOCATION.to_string(),
        notes: String::new(),
    };

    vec![
        demo(1, "Milk", FridgeCategory::Dairy, 1.0, Unit::Liter, 7),
        demo(2, "Chicken Breast", FridgeCategory::Meat, 2.0, Unit::Pieces, 2),
        demo(3, "Spinach", FridgeCategory::Produce, 1.0, Unit::Bag, 3),
        demo(4, "Rice", FridgeCategory::Pantry, 1.0, Unit::Kilogram, 365),
    ]
}

fn payload_of(item: &FridgeItem) -> FridgeItemPayload {
    FridgeItemPayload {
        name: item.name.clone(),
        quantity: item.quantity,
        unit: Unit::parse(&item.unit).unwrap_or(Unit::Pieces),
        category: item.category,
        expiration_date: item.expiration_date,
        location: item.location.clone(),
        notes: item.notes.clone(),
    }
}

fn suggestion_failure_message(err: &ApiError) -> (bool, &'static str) {
    let text = err.to_string();
    if text.contains("No ingredients in fridge") || text.contains("Add some ingredients") {
        (
            true,
            "No ingredients found in your fridge. Please add some ingredients first!",
        )
    } else if text.contains("AI services not available") {
        (false, "AI service not configured. Please check API key.")
    } else {
        (false, "Failed to suggest recipes. Please try again.")
    }
}

pub struct FridgePage {
    services: AppServices,
    items: Vec<FridgeItem>,
    pub filter: FridgeFilter,
}

impl FridgePage {
    pub fn new(services: AppServices) -> Self {
        Self {
            services,
            items: Vec::new(),
            filter: FridgeFilter::default(),
        }
    }

    pub fn items(&self) -> &[FridgeItem] {
        &self.items
    }

    pub fn filtered_items(&self) -> Vec<&FridgeItem> {
        self.filtered_items_at(today())
    }

    pub fn filtered_items_at(&self, today: NaiveDate) -> Vec<&FridgeItem> {
        self.items
            .iter()
            .filter(|item| self.filter.matches_at(today, item))
            .collect()
    }

    pub fn clear_filters(&mut self) {
        self.filter = FridgeFilter::default();
    }

    pub fn stats(&self) -> FridgeStats {
        fridge_stats(&self.items)
    }

    pub fn pending_count(&self) -> usize {
        self.items.iter().filter(|item| item.id.is_pending()).count()
    }

    /// On failure the page falls back to the demo inventory; the error is
    /// still returned.
    pub async fn load_items(&mut self) -> Result<(), PageError> {
        let _loading = self.services.loading.begin();

        match self.services.api.get(endpoints::FRIDGE_ITEMS).await {
            Ok(payload) => {
                self.items = decode_list(payload, "items");
                info!("loaded {} fridge items", self.items.len());
                Ok(())
            }
            Err(err) => {
                error!("error loading fridge items: {err}");
                self.services.toasts.warning(DEMO_WARNING);
                self.items = demo_items(today());
                Err(err.into())
            }
        }
    }

    pub fn seed_demo_items(&mut self) {
        self.items = demo_items(today());
        self.services.toasts.success("Demo items added to your fridge");
    }

    /// Validates, inserts a pending record, then reconciles it with the
    /// server's answer. Returns the id the item ends up with.
    pub async fn add_item(&mut self, draft: &NewFridgeItem) -> Result<ItemId, PageError> {
        let payload = match draft.validate() {
            Ok(payload) => payload,
            Err(err) => {
                self.services.toasts.error(&err.to_string());
                return Err(err.into());
            }
        };

        let pending_id = ItemId::new_pending();
        self.items.push(payload.clone().into_item(pending_id.clone()));

        let _loading = self.services.loading.begin();
        match self.create_remote(&payload).await {
            Ok(Some(item)) => {
                let id = item.id.clone();
                self.replace(&pending_id, item);
                self.services.toasts.success("Ingredient added successfully!");
                Ok(id)
            }
            Ok(None) => {
                let mut id = pending_id.clone();
                if self.reload_after_insert(&pending_id).await {
                    if let Some(saved) = self
                        .items
                        .iter()
                        .rev()
                        .find(|item| item.name == payload.name && !item.id.is_local_only())
                    {
                        id = saved.id.clone();
                    }
                }
                self.services.toasts.success("Ingredient added successfully!");
                Ok(id)
            }
            Err(err) if err.is_transport() => {
                warn!("backend unreachable, keeping {pending_id} locally: {err}");
                self.services
                    .toasts
                    .warning("Saved locally - will sync when the server is reachable");
                Ok(pending_id)
            }
            Err(err) => {
                error!("error adding ingredient: {err}");
                self.items.retain(|item| item.id != pending_id);
                self.services.toasts.error(&api_error_message(
                    &err,
                    "Failed to add ingredient. Please try again.",
                ));
                Err(err.into())
            }
        }
    }

    /// Retries every pending record. Stops at the first transport failure and
    /// returns how many records were persisted.
    pub async fn sync_pending(&mut self) -> usize {
        let pending: Vec<FridgeItem> = self
            .items
            .iter()
            .filter(|item| item.id.is_pending())
            .cloned()
            .collect();

        let mut synced = 0;
        for item in pending {
            match self.create_remote(&payload_of(&item)).await {
                Ok(Some(saved)) => {
                    self.replace(&item.id, saved);
                    synced += 1;
                }
                Ok(None) => {
                    if self.reload_after_insert(&item.id).await {
                        synced += 1;
                    }
                }
                Err(err) if err.is_transport() => {
                    warn!("sync stopped, backend unreachable: {err}");
                    break;
                }
                Err(err) => {
                    error!("server rejected pending item {}: {err}", item.name);
                    self.items.retain(|other| other.id != item.id);
                    self.services.toasts.error(&api_error_message(
                        &err,
                        "Failed to add ingredient. Please try again.",
                    ));
                }
            }
        }

        if synced > 0 {
            info!("synced {synced} pending fridge items");
        }
        synced
    }

    /// `Ok(None)` means the backend accepted the item but did not echo it back.
    async fn create_remote(
        &self,
        payload: &FridgeItemPayload,
    ) -> Result<Option<FridgeItem>, ApiError> {
        let value = match self.services.api.post(endpoints::FRIDGE_ITEMS, payload).await {
            Ok(value) => value,
            // a 2xx whose body is not valid JSON still means the insert happened
            Err(ApiError::Decode(err)) => {
                warn!("fridge insert accepted with an unreadable body: {err}");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };
        match serde_json::from_value(field_or_self(value, "item")) {
            Ok(item) => Ok(Some(item)),
            Err(err) => {
                warn!("fridge insert accepted without an item in the response: {err}");
                Ok(None)
            }
        }
    }

    /// Re-reads the server list after an insert whose response carried no
    /// item. Other pending records survive the reload; `saved` is dropped
    /// since the server copy replaces it. On failure nothing changes and
    /// `saved` stays pending.
    async fn reload_after_insert(&mut self, saved: &ItemId) -> bool {
        match self.services.api.get(endpoints::FRIDGE_ITEMS).await {
            Ok(payload) => {
                let mut items: Vec<FridgeItem> = decode_list(payload, "items");
                items.extend(
                    self.items
                        .iter()
                        .filter(|item| item.id.is_pending() && &item.id != saved)
                        .cloned(),
                );
                self.items = items;
                true
            }
            Err(err) => {
                warn!("reload after insert failed, keeping {saved} locally: {err}");
                false
            }
        }
    }

    fn replace(&mut self, id: &ItemId, item: FridgeItem) {
        match self.items.iter_mut().find(|existing| &existing.id == id) {
            Some(slot) => *slot = item,
            None => self.items.push(item),
        }
    }

    pub async fn update_item(
        &mut self,
        id: &ItemId,
        changes: &FridgeItemChanges,
    ) -> Result<(), PageError> {
        let Some(index) = self.items.iter().position(|item| &item.id == id) else {
            return Err(PageError::NotFound);
        };
        if let Err(err) = changes.validate() {
            self.services.toasts.error(&err.to_string());
            return Err(err.into());
        }

        if !id.is_local_only() {
            let _loading = self.services.loading.begin();
            let endpoint = endpoints::fridge_item(&id.to_string());
            match self.services.api.put(&endpoint, changes).await {
                Ok(value) => {
                    let updated = serde_json::from_value::<FridgeItem>(field_or_self(value, "item"));
                    if let Ok(item) = updated {
                        self.items[index] = item;
                        self.services.toasts.success("Item updated");
                        return Ok(());
                    }
                }
                Err(err) => {
                    error!("error updating item {id}: {err}");
                    self.services
                        .toasts
                        .error(&api_error_message(&err, "Failed to update item"));
                    return Err(err.into());
                }
            }
        }

        changes.apply_to(&mut self.items[index]);
        self.services.toasts.success("Item updated");
        Ok(())
    }

    /// Local-only records (demo or pending) are dropped without a request.
    pub async fn delete_item(&mut self, id: &ItemId) -> Result<(), PageError> {
        if !self.items.iter().any(|item| &item.id == id) {
            return Err(PageError::NotFound);
        }

        if !id.is_local_only() {
            let _loading = self.services.loading.begin();
            let endpoint = endpoints::fridge_item(&id.to_string());
            if let Err(err) = self.services.api.delete(&endpoint).await {
                error!("error deleting item {id}: {err}");
                self.services
                    .toasts
                    .error(&api_error_message(&err, "Failed to delete item"));
                return Err(err.into());
            }
        }

        self.items.retain(|item| &item.id != id);
        self.services.toasts.success("Item removed");
        Ok(())
    }

    /// Ingredient availability is decided by the backend, not by the local
    /// list, which may be stale.
    pub async fn suggest_recipes(&self) -> Result<Option<RecipeSuggestion>, PageError> {
        let _loading = self.services.loading.begin();
        let body = json!({
            "dietary_preferences": [],
            "difficulty": "medium",
            "servings": 4,
        });

        let result = match self
            .services
            .api
            .post(endpoints::FRIDGE_SUGGEST_RECIPES, &body)
            .await
        {
            Ok(result) => result,
            Err(err) => {
                error!("error suggesting recipes: {err}");
                let (is_warning, message) = suggestion_failure_message(&err);
                if is_warning {
                    self.services.toasts.warning(message);
                } else {
                    self.services.toasts.error(message);
                }
                return Err(err.into());
            }
        };

        let Some(recipe) = result.get("recipe").and_then(normalize) else {
            return Ok(None);
        };
        let similar = result
            .get("similar_recipes")
            .map(normalize_list)
            .unwrap_or_default();

        self.services.toasts.success("Recipe suggested successfully!");
        Ok(Some(RecipeSuggestion { recipe, similar }))
    }
}
