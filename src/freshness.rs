//! Expiration-date classification. Every view and statistic uses this module;
//! there is no second implementation anywhere in the crate.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Inclusive upper bound, in days, of the "expiring soon" window.
pub const EXPIRING_SOON_DAYS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Freshness {
    Expired,
    ExpiringSoon,
    Fresh,
}

impl Freshness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Freshness::Expired => "expired",
            Freshness::ExpiringSoon => "expiring-soon",
            Freshness::Fresh => "fresh",
        }
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn days_until(today: NaiveDate, date: NaiveDate) -> i64 {
    (date - today).num_days()
}

/// Items without an expiration date never expire.
pub fn classify_at(today: NaiveDate, expiration: Option<NaiveDate>) -> Freshness {
    let Some(date) = expiration else {
        return Freshness::Fresh;
    };

    match days_until(today, date) {
        days if days < 0 => Freshness::Expired,
        days if days <= EXPIRING_SOON_DAYS => Freshness::ExpiringSoon,
        _ => Freshness::Fresh,
    }
}

pub fn expiry_label(days_until: i64) -> String {
    match days_until {
        days if days < 0 => "Expired".to_string(),
        0 => "Expires today".to_string(),
        1 => "Expires tomorrow".to_string(),
        days => format!("Expires in {days} days"),
    }
}
