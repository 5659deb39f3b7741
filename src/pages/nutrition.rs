use super::api_error_message;
use crate::api::{endpoints, field_or_self};
use crate::errors::{ApiError, PageError, ValidationError};
use crate::freshness::today;
use crate::models::{
    LoggedMeal, MealType, NutritionGoals, NutritionLog, NutritionTotals, clamp_water,
};
use crate::state::AppServices;
use crate::stats::{MacroBreakdown, macro_breakdown};
use chrono::{Duration, NaiveDate};
use serde_json::{Value, json};
use tracing::{debug, error, warn};

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Meal entered by the user for the current day.
#[derive(Debug, Clone, PartialEq)]
pub struct MealLogEntry {
    pub name: String,
    pub meal_type: MealType,
    pub nutrition: NutritionTotals,
    pub recipe_id: Option<String>,
}

pub struct NutritionTrackerPage {
    services: AppServices,
    date: NaiveDate,
    log: NutritionLog,
    goals: NutritionGoals,
}

impl NutritionTrackerPage {
    pub fn new(services: AppServices) -> Self {
        Self::on(services, today())
    }

    pub fn on(services: AppServices, date: NaiveDate) -> Self {
        Self {
            services,
            date,
            log: NutritionLog::empty(date),
            goals: NutritionGoals::default(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn log(&self) -> &NutritionLog {
        &self.log
    }

    pub fn goals(&self) -> &NutritionGoals {
        &self.goals
    }

    pub fn water_glasses(&self) -> u8 {
        self.log.water_intake_glasses
    }

    pub fn macro_breakdown(&self) -> MacroBreakdown {
        macro_breakdown(&self.log.totals)
    }

    /// Missing or unreachable goals leave the defaults in place.
    pub async fn load_goals(&mut self) -> Result<(), PageError> {
        let fetched = match self.services.api.get(endpoints::NUTRITION_GOALS).await {
            Ok(value) => serde_json::from_value::<Option<NutritionGoals>>(field_or_self(value, "goals"))
                .map_err(ApiError::from),
            Err(err) => Err(err),
        };

        match fetched {
            Ok(goals) => {
                self.goals = goals.unwrap_or_default();
                Ok(())
            }
            Err(err) => {
                warn!("error loading nutrition goals, using defaults: {err}");
                self.goals = NutritionGoals::default();
                Err(err.into())
            }
        }
    }

    pub async fn save_goals(&mut self, goals: NutritionGoals) -> Result<(), PageError> {
        let _loading = self.services.loading.begin();
        match self.services.api.post(endpoints::NUTRITION_GOALS, &goals).await {
            Ok(_) => {
                self.goals = goals;
                self.services
                    .toasts
                    .success("Nutrition goals updated successfully!");
                Ok(())
            }
            Err(err) => {
                error!("error saving nutrition goals: {err}");
                self.services.toasts.error(&api_error_message(
                    &err,
                    "Failed to save goals. Please try again.",
                ));
                Err(err.into())
            }
        }
    }

    async fn fetch_day(&self) -> Result<NutritionLog, ApiError> {
        let payload = self
            .services
            .api
            .get(&endpoints::nutrition_daily(self.date))
            .await?;
        let mut value = field_or_self(payload, "nutrition");
        if let Value::Object(map) = &mut value {
            map.entry("date").or_insert_with(|| json!(iso(self.date)));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// A failed load shows an empty day rather than the previous one.
    pub async fn load_day(&mut self) -> Result<(), PageError> {
        let _loading = self.services.loading.begin();
        match self.fetch_day().await {
            Ok(log) => {
                self.log = log;
                Ok(())
            }
            Err(err) => {
                error!("error loading daily nutrition for {}: {err}", self.date);
                self.log = NutritionLog::empty(self.date);
                self.services.toasts.error("Failed to load nutrition data");
                Err(err.into())
            }
        }
    }

    pub async fn previous_day(&mut self) -> Result<(), PageError> {
        self.set_date_at(today(), self.date - Duration::days(1)).await
    }

    pub async fn next_day(&mut self) -> Result<(), PageError> {
        self.next_day_at(today()).await
    }

    pub async fn next_day_at(&mut self, today: NaiveDate) -> Result<(), PageError> {
        self.set_date_at(today, self.date + Duration::days(1)).await
    }

    pub async fn set_date(&mut self, date: NaiveDate) -> Result<(), PageError> {
        self.set_date_at(today(), date).await
    }

    /// The cursor never moves past `today`.
    pub async fn set_date_at(&mut self, today: NaiveDate, date: NaiveDate) -> Result<(), PageError> {
        if date > today {
            debug!("refusing to move nutrition cursor to {date}");
            return Err(ValidationError::FutureDate.into());
        }
        self.date = date;
        self.load_day().await
    }

    pub async fn adjust_water(&mut self, delta: i64) -> Result<(), PageError> {
        let current = i64::from(self.log.water_intake_glasses);
        self.set_water(current.saturating_add(delta)).await
    }

    /// Clamps to the daily goal range, updates the local count, then persists
    /// it on its own. A failed save keeps the local count.
    pub async fn set_water(&mut self, glasses: i64) -> Result<(), PageError> {
        let glasses = clamp_water(glasses);
        self.log.water_intake_glasses = glasses;

        let body = json!({ "date": iso(self.date), "glasses": glasses });
        if let Err(err) = self.services.api.post(endpoints::NUTRITION_WATER, &body).await {
            error!("error updating water intake: {err}");
            self.services
                .toasts
                .error(&api_error_message(&err, "Failed to update water intake"));
            return Err(err.into());
        }
        Ok(())
    }

    pub async fn log_meal(&mut self, entry: MealLogEntry) -> Result<(), PageError> {
        let name = entry.name.trim().to_string();
        if name.is_empty() {
            self.services.toasts.error("Please enter a meal name");
            return Err(ValidationError::MissingName.into());
        }

        let meal = LoggedMeal {
            id: None,
            meal_name: name.clone(),
            meal_type: entry.meal_type.to_string(),
            date: self.date,
            nutrition: entry.nutrition,
            recipe: entry.recipe_id,
        };

        let _loading = self.services.loading.begin();
        if let Err(err) = self.services.api.post(endpoints::NUTRITION_LOG_MEAL, &meal).await {
            error!("error logging meal: {err}");
            self.services
                .toasts
                .error(&api_error_message(&err, "Failed to log meal. Please try again."));
            return Err(err.into());
        }

        self.services
            .toasts
            .success(&format!("{name} logged successfully!"));
        // a failed refresh is reported by load_day itself
        let _ = self.load_day().await;
        Ok(())
    }

    pub async fn delete_meal(&mut self, meal_id: &str) -> Result<(), PageError> {
        if !self
            .services
            .confirm
            .confirm("Are you sure you want to delete this meal entry?")
        {
            return Err(PageError::Cancelled);
        }

        let _loading = self.services.loading.begin();
        if let Err(err) = self
            .services
            .api
            .delete(&endpoints::nutrition_meal(meal_id))
            .await
        {
            error!("error deleting meal {meal_id}: {err}");
            self.services.toasts.error("Failed to delete meal");
            return Err(err.into());
        }

        self.services.toasts.success("Meal deleted successfully");
        let _ = self.load_day().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::config::Config;
    use crate::feedback::{AutoConfirm, ToastLog};
    use std::sync::Arc;

    fn page(date: NaiveDate) -> NutritionTrackerPage {
        // nothing listens on port 9, so every request fails fast
        let services = AppServices::new(
            ApiClient::unauthenticated(&Config::new("http://127.0.0.1:9")),
            Arc::new(ToastLog::new()),
            Arc::new(AutoConfirm(false)),
        );
        NutritionTrackerPage::on(services, date)
    }

    #[tokio::test]
    async fn cursor_stops_at_today() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let mut page = page(today);
        let result = page.next_day_at(today).await;
        assert!(matches!(
            result,
            Err(PageError::Validation(ValidationError::FutureDate))
        ));
        assert_eq!(page.date(), today);
    }

    #[tokio::test]
    async fn water_is_clamped_even_when_saving_fails() {
        let mut page = page(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
        for _ in 0..9 {
            let _ = page.adjust_water(1).await;
        }
        assert_eq!(page.water_glasses(), 8);

        let _ = page.set_water(-3).await;
        assert_eq!(page.water_glasses(), 0);
        let _ = page.adjust_water(-1).await;
        assert_eq!(page.water_glasses(), 0);
    }

    #[tokio::test]
    async fn unreachable_goals_fall_back_to_defaults() {
        let mut page = page(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
        assert!(page.load_goals().await.is_err());
        assert_eq!(*page.goals(), NutritionGoals::default());
        assert_eq!(page.goals().calories, 2000.0);
    }

    #[test]
    fn empty_day_has_zero_breakdown() {
        let page = page(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
        assert_eq!(page.macro_breakdown(), MacroBreakdown::default());
    }

    #[tokio::test]
    async fn declined_delete_is_cancelled() {
        let mut page = page(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
        assert!(matches!(page.delete_meal("m1").await, Err(PageError::Cancelled)));
    }
}
