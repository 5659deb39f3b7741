use crate::catalog::GroceryCategory;
use crate::freshness::{Freshness, classify_at, today};
use crate::models::{FridgeItem, GroceryItem, MealPlan, MealSlot, NutritionTotals};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FridgeStats {
    pub total: usize,
    pub fresh: usize,
    pub expiring_soon: usize,
    pub expired: usize,
}

pub fn fridge_stats(items: &[FridgeItem]) -> FridgeStats {
    fridge_stats_at(today(), items)
}

pub fn fridge_stats_at(today: NaiveDate, items: &[FridgeItem]) -> FridgeStats {
    let mut stats = FridgeStats {
        total: items.len(),
        ..FridgeStats::default()
    };

    for item in items {
        match classify_at(today, item.expiration_date) {
            Freshness::Fresh => stats.fresh += 1,
            Freshness::ExpiringSoon => stats.expiring_soon += 1,
            Freshness::Expired => stats.expired += 1,
        }
    }

    stats
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MacroBreakdown {
    pub protein_pct: f64,
    pub carbs_pct: f64,
    pub fat_pct: f64,
}

/// Share of macro energy per nutrient, not of logged calories.
pub fn macro_breakdown(totals: &NutritionTotals) -> MacroBreakdown {
    const PROTEIN_KCAL: f64 = 4.0;
    const CARBS_KCAL: f64 = 4.0;
    const FAT_KCAL: f64 = 9.0;

    let protein = totals.protein.max(0.0) * PROTEIN_KCAL;
    let carbs = totals.carbs.max(0.0) * CARBS_KCAL;
    let fat = totals.fat.max(0.0) * FAT_KCAL;
    let total = protein + carbs + fat;

    if total <= 0.0 || !total.is_finite() {
        return MacroBreakdown::default();
    }

    MacroBreakdown {
        protein_pct: protein / total * 100.0,
        carbs_pct: carbs / total * 100.0,
        fat_pct: fat / total * 100.0,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MealPlanCounts {
    pub breakfasts: usize,
    pub lunches: usize,
    pub dinners: usize,
    pub snacks: usize,
    pub total: usize,
}

pub fn meal_plan_counts(plan: &MealPlan) -> MealPlanCounts {
    let planned = |slot: &MealSlot| usize::from(!slot.is_empty());

    let mut counts = MealPlanCounts::default();
    for day in plan.meals.values() {
        counts.breakfasts += planned(&day.breakfast);
        counts.lunches += planned(&day.lunch);
        counts.dinners += planned(&day.dinner);
        counts.snacks += day.snacks.len();
    }
    counts.total = counts.breakfasts + counts.lunches + counts.dinners + counts.snacks;
    counts
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroceryProgress {
    pub total: usize,
    pub purchased: usize,
    pub progress_pct: f64,
    pub by_category: BTreeMap<GroceryCategory, usize>,
}

pub fn grocery_progress(items: &[GroceryItem]) -> GroceryProgress {
    let purchased = items.iter().filter(|item| item.purchased).count();
    let mut by_category = BTreeMap::new();
    for item in items {
        *by_category.entry(item.category).or_insert(0) += 1;
    }

    let progress_pct = if items.is_empty() {
        0.0
    } else {
        purchased as f64 / items.len() as f64 * 100.0
    };

    GroceryProgress {
        total: items.len(),
        purchased,
        progress_pct,
        by_category,
    }
}
