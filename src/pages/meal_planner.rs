use super::{api_error_message, decode_list};
use crate::api::{endpoints, field_or_self};
use crate::errors::{ApiError, PageError};
use crate::freshness::today;
use crate::models::{Day, MealEntry, MealPlan, MealSlot, MealType};
use crate::state::AppServices;
use crate::stats::{MealPlanCounts, meal_plan_counts};
use chrono::{Datelike, Duration, NaiveDate};
use serde_json::{Value, json};
use tracing::{error, info, warn};

/// Sunday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn servings_label(servings: u32) -> String {
    if servings == 1 {
        "1 serving".to_string()
    } else {
        format!("{servings} servings")
    }
}

fn capitalized(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub struct MealPlannerPage {
    services: AppServices,
    week_start: NaiveDate,
    plan: MealPlan,
    /// Sent verbatim with auto-generate requests.
    pub preferences: Value,
}

impl MealPlannerPage {
    pub fn new(services: AppServices) -> Self {
        Self::starting_at(services, today())
    }

    pub fn starting_at(services: AppServices, date: NaiveDate) -> Self {
        let start = week_start(date);
        Self {
            services,
            week_start: start,
            plan: MealPlan::empty(start),
            preferences: json!({}),
        }
    }

    pub fn week_start(&self) -> NaiveDate {
        self.week_start
    }

    pub fn week_end(&self) -> NaiveDate {
        self.week_start + Duration::days(6)
    }

    pub fn plan(&self) -> &MealPlan {
        &self.plan
    }

    pub fn counts(&self) -> MealPlanCounts {
        meal_plan_counts(&self.plan)
    }

    pub async fn navigate_week(&mut self, weeks: i64) -> Result<(), PageError> {
        self.week_start += Duration::weeks(weeks);
        self.plan = MealPlan::empty(self.week_start);
        self.load_plan().await
    }

    async fn fetch_plan(&self) -> Result<Option<MealPlan>, ApiError> {
        let query = [
            ("start_date", iso(self.week_start)),
            ("end_date", iso(self.week_end())),
        ];
        let payload = self
            .services
            .api
            .get_with_query(endpoints::MEAL_PLANS, &query)
            .await?;
        Ok(decode_list::<MealPlan>(payload, "meal_plans").into_iter().next())
    }

    /// Falls back to an empty week when nothing is stored or the request fails.
    pub async fn load_plan(&mut self) -> Result<(), PageError> {
        let _loading = self.services.loading.begin();
        match self.fetch_plan().await {
            Ok(Some(mut plan)) => {
                plan.fill_missing_days();
                self.plan = plan;
                Ok(())
            }
            Ok(None) => {
                self.plan = MealPlan::empty(self.week_start);
                Ok(())
            }
            Err(err) => {
                error!("error loading meal plan: {err}");
                self.plan = MealPlan::empty(self.week_start);
                self.services
                    .toasts
                    .warning("Could not load meal plan - starting with an empty week");
                Err(err.into())
            }
        }
    }

    /// Breakfast, lunch and dinner are overwritten; snacks accumulate.
    pub fn add_to_slot(&mut self, day: Day, meal: MealType, entry: MealEntry) {
        let title = entry.recipe_title.clone();
        let meals = self.plan.day_mut(day);
        match meals.slot_mut(meal) {
            Some(slot) => *slot = MealSlot::Planned(entry),
            None => meals.snacks.push(entry),
        }
        self.services
            .toasts
            .success(&format!("Added {title} to {day} {meal}!"));
    }

    pub fn remove_from_slot(
        &mut self,
        day: Day,
        meal: MealType,
        recipe_id: &str,
    ) -> Result<(), PageError> {
        let meals = self.plan.day_mut(day);
        let removed = match meals.slot_mut(meal) {
            Some(slot) if !slot.is_empty() => {
                *slot = MealSlot::Cleared;
                true
            }
            Some(_) => false,
            None => {
                let before = meals.snacks.len();
                meals.snacks.retain(|snack| snack.recipe_id != recipe_id);
                meals.snacks.len() != before
            }
        };

        if !removed {
            return Err(PageError::NotFound);
        }
        self.services.toasts.success("Meal removed from plan");
        Ok(())
    }

    pub fn set_servings(
        &mut self,
        day: Day,
        meal: MealType,
        recipe_id: &str,
        servings: u32,
    ) -> Result<(), PageError> {
        let meals = self.plan.day_mut(day);
        let entry = if meal == MealType::Snack {
            meals
                .snacks
                .iter_mut()
                .find(|snack| snack.recipe_id == recipe_id)
        } else {
            match meals.slot_mut(meal) {
                Some(MealSlot::Planned(entry)) if entry.recipe_id == recipe_id => Some(entry),
                _ => None,
            }
        };

        let entry = entry.ok_or(PageError::NotFound)?;
        entry.servings = servings.max(1);
        Ok(())
    }

    /// Replaces the whole week after an explicit confirmation.
    pub async fn auto_generate(&mut self) -> Result<(), PageError> {
        if !self
            .services
            .confirm
            .confirm("This will replace your current meal plan. Continue?")
        {
            return Err(PageError::Cancelled);
        }

        let _loading = self.services.loading.begin();
        let body = json!({
            "start_date": iso(self.week_start),
            "end_date": iso(self.week_end()),
            "preferences": self.preferences,
        });

        let generated = match self
            .services
            .api
            .post(endpoints::MEAL_PLANS_GENERATE, &body)
            .await
        {
            Ok(value) => serde_json::from_value::<MealPlan>(field_or_self(value, "meal_plan"))
                .map_err(ApiError::from),
            Err(err) => Err(err),
        };

        match generated {
            Ok(mut plan) => {
                plan.fill_missing_days();
                self.plan = plan;
                self.services.toasts.success("Meal plan generated successfully!");
                Ok(())
            }
            Err(err) => {
                error!("error generating meal plan: {err}");
                self.services.toasts.error(&api_error_message(
                    &err,
                    "Failed to generate meal plan. Please try again.",
                ));
                Err(err.into())
            }
        }
    }

    /// Creates the plan on first save, updates it afterwards.
    pub async fn save(&mut self) -> Result<(), PageError> {
        let _loading = self.services.loading.begin();
        let result = match self.plan.id.clone() {
            Some(id) => self.services.api.put(&endpoints::meal_plan(&id), &self.plan).await,
            None => self.services.api.post(endpoints::MEAL_PLANS, &self.plan).await,
        };

        match result {
            Ok(value) => {
                match serde_json::from_value::<MealPlan>(field_or_self(value, "meal_plan")) {
                    Ok(mut saved) => {
                        saved.fill_missing_days();
                        self.plan = saved;
                    }
                    Err(err) => warn!("save response did not contain a meal plan: {err}"),
                }
                info!("saved meal plan for week of {}", self.week_start);
                self.services.toasts.success("Meal plan saved successfully!");
                Ok(())
            }
            Err(err) => {
                error!("error saving meal plan: {err}");
                self.services.toasts.error(&api_error_message(
                    &err,
                    "Failed to save meal plan. Please try again.",
                ));
                Err(err.into())
            }
        }
    }

    /// Plain-text rendering of the week, or `None` when nothing is planned.
    pub fn export_text(&self) -> Option<String> {
        if self.counts().total == 0 {
            self.services.toasts.warning("No meals to export");
            return None;
        }

        let mut text = format!("Meal Plan ({} - {})\n\n", self.week_start, self.week_end());
        for day in Day::ALL {
            let Some(meals) = self.plan.day(day) else {
                continue;
            };
            text.push_str(&format!("{}:\n", capitalized(day.as_str())));
            for meal in [MealType::Breakfast, MealType::Lunch, MealType::Dinner] {
                if let Some(entry) = meals.slot(meal).and_then(MealSlot::entry) {
                    text.push_str(&format!(
                        "  {}: {} ({})\n",
                        capitalized(meal.as_str()),
                        entry.recipe_title,
                        servings_label(entry.servings)
                    ));
                }
            }
            if !meals.snacks.is_empty() {
                let snacks: Vec<String> = meals
                    .snacks
                    .iter()
                    .map(|snack| format!("{} ({})", snack.recipe_title, snack.servings))
                    .collect();
                text.push_str(&format!("  Snacks: {}\n", snacks.join(", ")));
            }
            text.push('\n');
        }
        Some(text)
    }
}
