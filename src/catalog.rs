//! Closed vocabularies for categories and units, and the single keyword-based
//! category detector.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum FridgeCategory {
    Produce,
    Dairy,
    Meat,
    Pantry,
    Frozen,
    Beverages,
    #[default]
    Other,
}

impl FridgeCategory {
    pub const ALL: [FridgeCategory; 7] = [
        FridgeCategory::Produce,
        FridgeCategory::Dairy,
        FridgeCategory::Meat,
        FridgeCategory::Pantry,
        FridgeCategory::Frozen,
        FridgeCategory::Beverages,
        FridgeCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FridgeCategory::Produce => "produce",
            FridgeCategory::Dairy => "dairy",
            FridgeCategory::Meat => "meat",
            FridgeCategory::Pantry => "pantry",
            FridgeCategory::Frozen => "frozen",
            FridgeCategory::Beverages => "beverages",
            FridgeCategory::Other => "other",
        }
    }

    pub fn from_label(label: &str) -> Self {
        let label = label.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == label)
            .unwrap_or(FridgeCategory::Other)
    }
}

impl From<String> for FridgeCategory {
    fn from(value: String) -> Self {
        FridgeCategory::from_label(&value)
    }
}

impl From<GroceryCategory> for FridgeCategory {
    fn from(value: GroceryCategory) -> Self {
        match value {
            GroceryCategory::Produce => FridgeCategory::Produce,
            GroceryCategory::MeatSeafood => FridgeCategory::Meat,
            GroceryCategory::Dairy => FridgeCategory::Dairy,
            GroceryCategory::Pantry | GroceryCategory::Bakery | GroceryCategory::Snacks => {
                FridgeCategory::Pantry
            }
            GroceryCategory::Frozen => FridgeCategory::Frozen,
            GroceryCategory::Beverages => FridgeCategory::Beverages,
            GroceryCategory::Other => FridgeCategory::Other,
        }
    }
}

impl fmt::Display for FridgeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(from = "String")]
pub enum GroceryCategory {
    Produce,
    #[serde(rename = "Meat & Seafood")]
    MeatSeafood,
    Dairy,
    Pantry,
    Frozen,
    Bakery,
    Beverages,
    Snacks,
    #[default]
    Other,
}

impl GroceryCategory {
    pub const ALL: [GroceryCategory; 9] = [
        GroceryCategory::Produce,
        GroceryCategory::MeatSeafood,
        GroceryCategory::Dairy,
        GroceryCategory::Pantry,
        GroceryCategory::Frozen,
        GroceryCategory::Bakery,
        GroceryCategory::Beverages,
        GroceryCategory::Snacks,
        GroceryCategory::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            GroceryCategory::Produce => "Produce",
            GroceryCategory::MeatSeafood => "Meat & Seafood",
            GroceryCategory::Dairy => "Dairy",
            GroceryCategory::Pantry => "Pantry",
            GroceryCategory::Frozen => "Frozen",
            GroceryCategory::Bakery => "Bakery",
            GroceryCategory::Beverages => "Beverages",
            GroceryCategory::Snacks => "Snacks",
            GroceryCategory::Other => "Other",
        }
    }

    /// Unrecognised labels land in `Other`.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        if label.eq_ignore_ascii_case("meat") {
            return GroceryCategory::MeatSeafood;
        }
        Self::ALL
            .into_iter()
            .find(|category| category.label().eq_ignore_ascii_case(label))
            .unwrap_or(GroceryCategory::Other)
    }
}

impl From<String> for GroceryCategory {
    fn from(value: String) -> Self {
        GroceryCategory::from_label(&value)
    }
}

impl fmt::Display for GroceryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const CATEGORY_KEYWORDS: &[(GroceryCategory, &[&str])] = &[
    (
        GroceryCategory::Frozen,
        &["frozen", "ice cream"],
    ),
    (
        GroceryCategory::Produce,
        &[
            "apple", "banana", "orange", "lettuce", "tomato", "onion", "carrot", "potato",
            "spinach", "broccoli", "cucumber", "bell pepper", "avocado", "lemon", "lime", "garlic",
            "squash",
        ],
    ),
    (
        GroceryCategory::MeatSeafood,
        &[
            "chicken", "beef", "steak", "pork", "fish", "salmon", "shrimp", "turkey", "ham",
            "bacon", "sausage",
        ],
    ),
    (
        GroceryCategory::Dairy,
        &["milk", "cheese", "yogurt", "butter", "cream", "egg"],
    ),
    (
        GroceryCategory::Bakery,
        &["bread", "bagel", "muffin", "cake", "cookie"],
    ),
    (
        GroceryCategory::Beverages,
        &["water", "juice", "soda", "coffee", "tea", "wine", "beer"],
    ),
    (
        GroceryCategory::Snacks,
        &["chip", "cracker", "nut", "popcorn", "candy", "chocolate"],
    ),
    (
        GroceryCategory::Pantry,
        &[
            "rice", "pasta", "flour", "sugar", "salt", "pepper", "oil", "vinegar", "sauce",
            "spice", "herb",
        ],
    ),
];

/// First matching keyword group wins; frozen goods are checked before produce
/// so that "frozen spinach" is not filed as fresh produce. Keywords match
/// whole words (plural `s`/`es` allowed), so "steak" is not "tea".
pub fn categorize(name: &str) -> GroceryCategory {
    let lower = name.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect();

    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| has_phrase(&words, keyword)))
        .map(|(category, _)| *category)
        .unwrap_or(GroceryCategory::Other)
}

fn has_phrase(words: &[&str], phrase: &str) -> bool {
    let parts: Vec<&str> = phrase.split(' ').collect();
    words.windows(parts.len()).any(|window| {
        window
            .iter()
            .zip(&parts)
            .all(|(word, part)| is_word_form(word, part))
    })
}

fn is_word_form(word: &str, keyword: &str) -> bool {
    word.strip_prefix(keyword)
        .is_some_and(|rest| matches!(rest, "" | "s" | "es"))
}

pub fn categorize_fridge(name: &str) -> FridgeCategory {
    FridgeCategory::from(categorize(name))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Unit {
    Pieces,
    Kilogram,
    Gram,
    Pound,
    Ounce,
    Liter,
    Milliliter,
    Cup,
    Tablespoon,
    Teaspoon,
    Bag,
    Box,
    Can,
    Jar,
    Bottle,
    Bunch,
    Clove,
    Bulb,
    Dozen,
}

impl Unit {
    pub const ALL: [Unit; 19] = [
        Unit::Pieces,
        Unit::Kilogram,
        Unit::Gram,
        Unit::Pound,
        Unit::Ounce,
        Unit::Liter,
        Unit::Milliliter,
        Unit::Cup,
        Unit::Tablespoon,
        Unit::Teaspoon,
        Unit::Bag,
        Unit::Box,
        Unit::Can,
        Unit::Jar,
        Unit::Bottle,
        Unit::Bunch,
        Unit::Clove,
        Unit::Bulb,
        Unit::Dozen,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Pieces => "pieces",
            Unit::Kilogram => "kg",
            Unit::Gram => "g",
            Unit::Pound => "lb",
            Unit::Ounce => "oz",
            Unit::Liter => "liter",
            Unit::Milliliter => "ml",
            Unit::Cup => "cup",
            Unit::Tablespoon => "tbsp",
            Unit::Teaspoon => "tsp",
            Unit::Bag => "bag",
            Unit::Box => "box",
            Unit::Can => "can",
            Unit::Jar => "jar",
            Unit::Bottle => "bottle",
            Unit::Bunch => "bunch",
            Unit::Clove => "clove",
            Unit::Bulb => "bulb",
            Unit::Dozen => "dozen",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        let unit = match value.as_str() {
            "pcs" | "pc" | "piece" | "pieces" => Unit::Pieces,
            "l" | "litre" | "liter" | "liters" => Unit::Liter,
            "kilogram" | "kilograms" => Unit::Kilogram,
            "gram" | "grams" => Unit::Gram,
            "pound" | "pounds" | "lbs" => Unit::Pound,
            "ounce" | "ounces" => Unit::Ounce,
            other => return Self::ALL.into_iter().find(|unit| unit.as_str() == other),
        };
        Some(unit)
    }
}

impl TryFrom<String> for Unit {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Unit::parse(&value).ok_or_else(|| format!("unknown unit '{value}'"))
    }
}

impl From<Unit> for String {
    fn from(value: Unit) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
