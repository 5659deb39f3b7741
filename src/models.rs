use crate::catalog::{FridgeCategory, GroceryCategory, Unit, categorize, categorize_fridge};
use crate::errors::ValidationError;
use crate::serde_helper::{number_or_string, optional_date, optional_string};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{collections::BTreeMap, fmt};
use uuid::Uuid;

pub const DEFAULT_LOCATION: &str = "Main fridge";
pub const WATER_GOAL_GLASSES: u8 = 8;

const DEMO_PREFIX: &str = "demo-";
const PENDING_PREFIX: &str = "local-";

/// Identity of a fridge item. Only `Persisted` ids exist on the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ItemId {
    Persisted(String),
    /// Created locally and not yet acknowledged by the backend.
    Pending(Uuid),
    /// Part of the built-in sample inventory.
    Demo(u8),
}

impl ItemId {
    pub fn new_pending() -> Self {
        ItemId::Pending(Uuid::new_v4())
    }

    pub fn is_local_only(&self) -> bool {
        !matches!(self, ItemId::Persisted(_))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ItemId::Pending(_))
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        if let Some(n) = value.strip_prefix(DEMO_PREFIX).and_then(|n| n.parse().ok()) {
            return ItemId::Demo(n);
        }
        if let Some(id) = value
            .strip_prefix(PENDING_PREFIX)
            .and_then(|id| Uuid::parse_str(id).ok())
        {
            return ItemId::Pending(id);
        }
        ItemId::Persisted(value)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        ItemId::from(value.to_string())
    }
}

impl From<ItemId> for String {
    fn from(value: ItemId) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Persisted(id) => f.write_str(id),
            ItemId::Pending(id) => write!(f, "{PENDING_PREFIX}{id}"),
            ItemId::Demo(n) => write!(f, "{DEMO_PREFIX}{n}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawFridgeItem")]
pub struct FridgeItem {
    pub id: ItemId,
    pub name: String,
    pub category: FridgeCategory,
    pub quantity: f64,
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<NaiveDate>,
    pub location: String,
    pub notes: String,
}

/// Wire shape of a fridge item; the backend sends both the stored
/// (`ingredientName`, `expirationDate`) and the display (`name`, `expiryDate`)
/// spellings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFridgeItem {
    id: ItemId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    ingredient_name: Option<String>,
    #[serde(default)]
    category: Option<FridgeCategory>,
    #[serde(default, deserialize_with = "number_or_string")]
    quantity: f64,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default, deserialize_with = "optional_date")]
    expiration_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "optional_date")]
    expiry_date: Option<NaiveDate>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

impl From<RawFridgeItem> for FridgeItem {
    fn from(raw: RawFridgeItem) -> Self {
        let name = raw.name.or(raw.ingredient_name).unwrap_or_default();
        let category = raw.category.unwrap_or_else(|| categorize_fridge(&name));
        FridgeItem {
            id: raw.id,
            category,
            name,
            quantity: raw.quantity.max(0.0),
            unit: raw.unit.unwrap_or_default(),
            expiration_date: raw.expiration_date.or(raw.expiry_date),
            location: raw.location.unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            notes: raw.notes.unwrap_or_default(),
        }
    }
}

/// Add-ingredient form contents before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewFridgeItem {
    pub name: String,
    pub quantity: f64,
    pub unit: Option<Unit>,
    pub category: Option<FridgeCategory>,
    pub expiration_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FridgeItemPayload {
    pub name: String,
    pub quantity: f64,
    pub unit: Unit,
    pub category: FridgeCategory,
    pub expiration_date: Option<NaiveDate>,
    pub location: String,
    pub notes: String,
}

impl NewFridgeItem {
    pub fn validate(&self) -> Result<FridgeItemPayload, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingName);
        }
        // NaN fails this comparison too
        if !(self.quantity > 0.0) {
            return Err(ValidationError::InvalidQuantity);
        }
        let unit = self.unit.ok_or(ValidationError::MissingUnit)?;

        Ok(FridgeItemPayload {
            name: name.to_string(),
            quantity: self.quantity,
            unit,
            category: self.category.unwrap_or_else(|| categorize_fridge(name)),
            expiration_date: self.expiration_date,
            location: self
                .location
                .clone()
                .filter(|loc| !loc.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            notes: self.notes.clone(),
        })
    }
}

impl FridgeItemPayload {
    pub fn into_item(self, id: ItemId) -> FridgeItem {
        FridgeItem {
            id,
            name: self.name,
            category: self.category,
            quantity: self.quantity,
            unit: self.unit.to_string(),
            expiration_date: self.expiration_date,
            location: self.location,
            notes: self.notes,
        }
    }
}

/// Partial update for an existing fridge item.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FridgeItemChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl FridgeItemChanges {
    /// Same quantity rule as a new item; absent fields are left alone.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.quantity {
            // NaN fails this comparison too
            Some(quantity) if !(quantity > 0.0) => Err(ValidationError::InvalidQuantity),
            _ => Ok(()),
        }
    }

    pub fn apply_to(&self, item: &mut FridgeItem) {
        if let Some(quantity) = self.quantity {
            item.quantity = quantity.max(0.0);
        }
        if let Some(unit) = self.unit {
            item.unit = unit.to_string();
        }
        if let Some(date) = self.expiration_date {
            item.expiration_date = Some(date);
        }
        if let Some(location) = &self.location {
            item.location = location.clone();
        }
        if let Some(notes) = &self.notes {
            item.notes = notes.clone();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroceryItem {
    pub name: String,
    #[serde(default, deserialize_with = "number_or_string")]
    pub quantity: f64,
    #[serde(default = "default_grocery_unit")]
    pub unit: String,
    #[serde(default)]
    pub category: GroceryCategory,
    #[serde(default)]
    pub purchased: bool,
}

fn default_grocery_unit() -> String {
    Unit::Pieces.to_string()
}

impl GroceryItem {
    /// Fridge record created when this item is marked as bought.
    pub fn to_fridge_payload(&self) -> FridgeItemPayload {
        FridgeItemPayload {
            name: self.name.clone(),
            quantity: if self.quantity > 0.0 { self.quantity } else { 1.0 },
            unit: Unit::parse(&self.unit).unwrap_or(Unit::Pieces),
            category: FridgeCategory::from(self.category),
            expiration_date: None,
            location: DEFAULT_LOCATION.to_string(),
            notes: String::new(),
        }
    }
}

/// Add/edit form for the grocery list. Category and unit are closed sets.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGroceryItem {
    pub name: String,
    pub quantity: f64,
    pub unit: Unit,
    pub category: Option<GroceryCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroceryItemPayload {
    pub name: String,
    pub quantity: f64,
    pub unit: Unit,
    pub category: GroceryCategory,
}

impl NewGroceryItem {
    pub fn validate(&self) -> Result<GroceryItemPayload, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingName);
        }
        if !(self.quantity > 0.0) {
            return Err(ValidationError::InvalidQuantity);
        }
        Ok(GroceryItemPayload {
            name: name.to_string(),
            quantity: self.quantity,
            unit: self.unit,
            category: self.category.unwrap_or_else(|| categorize(name)),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    #[serde(alias = "snacks")]
    Snack,
}

impl MealType {
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Day column of the planner grid; weeks start on Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Sunday,
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Day::Sunday => "sunday",
            Day::Monday => "monday",
            Day::Tuesday => "tuesday",
            Day::Wednesday => "wednesday",
            Day::Thursday => "thursday",
            Day::Friday => "friday",
            Day::Saturday => "saturday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealEntry {
    pub recipe_id: String,
    pub recipe_title: String,
    #[serde(default = "default_servings")]
    pub servings: u32,
}

fn default_servings() -> u32 {
    1
}

/// A breakfast, lunch or dinner cell. `Unset` and `Cleared` both travel as
/// `null` and render the same, but stay distinguishable locally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MealSlot {
    #[default]
    Unset,
    Cleared,
    Planned(MealEntry),
}

impl MealSlot {
    pub fn entry(&self) -> Option<&MealEntry> {
        match self {
            MealSlot::Planned(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entry().is_none()
    }
}

impl Serialize for MealSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entry().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MealSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<MealEntry>::deserialize(deserializer)?
            .map(MealSlot::Planned)
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayMeals {
    #[serde(default)]
    pub breakfast: MealSlot,
    #[serde(default)]
    pub lunch: MealSlot,
    #[serde(default)]
    pub dinner: MealSlot,
    #[serde(default)]
    pub snacks: Vec<MealEntry>,
}

impl DayMeals {
    pub fn slot(&self, meal: MealType) -> Option<&MealSlot> {
        match meal {
            MealType::Breakfast => Some(&self.breakfast),
            MealType::Lunch => Some(&self.lunch),
            MealType::Dinner => Some(&self.dinner),
            MealType::Snack => None,
        }
    }

    pub fn slot_mut(&mut self, meal: MealType) -> Option<&mut MealSlot> {
        match meal {
            MealType::Breakfast => Some(&mut self.breakfast),
            MealType::Lunch => Some(&mut self.lunch),
            MealType::Dinner => Some(&mut self.dinner),
            MealType::Snack => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlan {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub meals: BTreeMap<Day, DayMeals>,
}

impl MealPlan {
    pub fn empty(start_date: NaiveDate) -> Self {
        let mut plan = MealPlan {
            id: None,
            start_date,
            end_date: start_date + Duration::days(6),
            meals: BTreeMap::new(),
        };
        plan.fill_missing_days();
        plan
    }

    pub fn fill_missing_days(&mut self) {
        for day in Day::ALL {
            self.meals.entry(day).or_default();
        }
    }

    pub fn day(&self, day: Day) -> Option<&DayMeals> {
        self.meals.get(&day)
    }

    pub fn day_mut(&mut self, day: Day) -> &mut DayMeals {
        self.meals.entry(day).or_default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionTotals {
    #[serde(default, deserialize_with = "number_or_string")]
    pub calories: f64,
    #[serde(default, deserialize_with = "number_or_string")]
    pub protein: f64,
    #[serde(default, deserialize_with = "number_or_string")]
    pub carbs: f64,
    #[serde(default, deserialize_with = "number_or_string")]
    pub fat: f64,
    #[serde(default, deserialize_with = "number_or_string")]
    pub fiber: f64,
    #[serde(default, deserialize_with = "number_or_string")]
    pub sodium: f64,
    #[serde(default, deserialize_with = "number_or_string")]
    pub sugar: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedMeal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub meal_name: String,
    #[serde(default = "default_meal_type")]
    pub meal_type: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub nutrition: NutritionTotals,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "optional_string")]
    pub recipe: Option<String>,
}

fn default_meal_type() -> String {
    "other".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionLog {
    pub date: NaiveDate,
    #[serde(rename = "total_nutrition", alias = "totals", default)]
    pub totals: NutritionTotals,
    #[serde(default)]
    pub meals: Vec<LoggedMeal>,
    #[serde(rename = "water_intake", default, deserialize_with = "water_glasses")]
    pub water_intake_glasses: u8,
}

impl NutritionLog {
    pub fn empty(date: NaiveDate) -> Self {
        NutritionLog {
            date,
            totals: NutritionTotals::default(),
            meals: Vec::new(),
            water_intake_glasses: 0,
        }
    }
}

pub fn clamp_water(glasses: i64) -> u8 {
    glasses.clamp(0, i64::from(WATER_GOAL_GLASSES)) as u8
}

fn water_glasses<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let glasses = number_or_string(deserializer)?;
    Ok(clamp_water(glasses.round() as i64))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NutritionGoals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub sodium: f64,
    pub sugar: f64,
}

impl Default for NutritionGoals {
    fn default() -> Self {
        NutritionGoals {
            calories: 2000.0,
            protein: 150.0,
            carbs: 250.0,
            fat: 65.0,
            fiber: 25.0,
            sodium: 2300.0,
            sugar: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ApiKeyStatus {
    #[serde(default)]
    pub configured: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ApiKeyCheck {
    #[serde(default)]
    pub valid: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn item_id_prefixes() {
        assert_eq!(ItemId::from("demo-3"), ItemId::Demo(3));
        assert_eq!(ItemId::from("abc123"), ItemId::Persisted("abc123".into()));
        let pending = ItemId::new_pending();
        assert_eq!(ItemId::from(pending.to_string()), pending);
        assert!(pending.is_local_only());
        assert!(!ItemId::from("abc123").is_local_only());
        // a "demo-" prefix without a number is an ordinary server id
        assert_eq!(ItemId::from("demo-x"), ItemId::Persisted("demo-x".into()));
    }

    #[test]
    fn fridge_item_normalizes_both_spellings() {
        let item: FridgeItem = serde_json::from_value(json!({
            "id": "f1",
            "ingredientName": "Eggs",
            "name": "Eggs",
            "quantity": "12",
            "unit": "pieces",
            "expirationDate": "2026-02-01",
            "expiryDate": "2026-02-01"
        }))
        .unwrap();
        assert_eq!(item.name, "Eggs");
        assert_eq!(item.quantity, 12.0);
        assert_eq!(item.category, FridgeCategory::Dairy);
        assert_eq!(item.expiration_date, NaiveDate::from_ymd_opt(2026, 2, 1));
        assert_eq!(item.location, DEFAULT_LOCATION);
    }

    #[test]
    fn negative_quantities_are_clamped() {
        let item: FridgeItem = serde_json::from_value(json!({
            "id": "f2", "name": "Flour", "quantity": -1, "unit": "kg"
        }))
        .unwrap();
        assert_eq!(item.quantity, 0.0);
    }

    #[test]
    fn fridge_form_validation() {
        let mut form = NewFridgeItem {
            name: "  ".into(),
            quantity: 1.0,
            unit: Some(Unit::Liter),
            ..Default::default()
        };
        assert_eq!(form.validate(), Err(ValidationError::MissingName));

        form.name = "Milk".into();
        form.quantity = 0.0;
        assert_eq!(form.validate(), Err(ValidationError::InvalidQuantity));
        form.quantity = f64::NAN;
        assert_eq!(form.validate(), Err(ValidationError::InvalidQuantity));

        form.quantity = 1.0;
        form.unit = None;
        assert_eq!(form.validate(), Err(ValidationError::MissingUnit));

        form.unit = Some(Unit::Liter);
        let payload = form.validate().unwrap();
        assert_eq!(payload.category, FridgeCategory::Dairy);
        assert_eq!(payload.location, DEFAULT_LOCATION);
    }

    #[test]
    fn changes_reject_non_positive_quantity() {
        let mut changes = FridgeItemChanges {
            quantity: Some(-2.0),
            ..Default::default()
        };
        assert_eq!(changes.validate(), Err(ValidationError::InvalidQuantity));
        changes.quantity = Some(f64::NAN);
        assert_eq!(changes.validate(), Err(ValidationError::InvalidQuantity));
        changes.quantity = None;
        changes.notes = Some("opened".into());
        assert_eq!(changes.validate(), Ok(()));
    }

    #[test]
    fn meal_slot_null_round_trip() {
        let day: DayMeals = serde_json::from_value(json!({
            "breakfast": {"recipe_id": "r1", "recipe_title": "Oats", "servings": 2},
            "lunch": null,
            "snacks": []
        }))
        .unwrap();
        assert!(matches!(day.breakfast, MealSlot::Planned(_)));
        assert_eq!(day.lunch, MealSlot::Unset);
        assert_eq!(day.dinner, MealSlot::Unset);

        let mut cleared = day.clone();
        cleared.breakfast = MealSlot::Cleared;
        let value = serde_json::to_value(&cleared).unwrap();
        assert!(value["breakfast"].is_null());
    }

    #[test]
    fn empty_plan_has_seven_days() {
        let start = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let plan = MealPlan::empty(start);
        assert_eq!(plan.meals.len(), 7);
        assert_eq!(plan.end_date, NaiveDate::from_ymd_opt(2026, 10, 24).unwrap());
    }

    #[test]
    fn nutrition_log_water_is_clamped() {
        let log: NutritionLog = serde_json::from_value(json!({
            "date": "2026-10-18",
            "total_nutrition": {"calories": 1200, "protein": "60"},
            "water_intake": 11
        }))
        .unwrap();
        assert_eq!(log.water_intake_glasses, 8);
        assert_eq!(log.totals.protein, 60.0);
    }

    #[test]
    fn goals_fill_missing_fields_with_defaults() {
        let goals: NutritionGoals = serde_json::from_value(json!({"calories": 1800})).unwrap();
        assert_eq!(goals.calories, 1800.0);
        assert_eq!(goals.sodium, 2300.0);
    }
}
