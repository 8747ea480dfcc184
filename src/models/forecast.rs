use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::hubspot::PropertyMap;

pub const PROP_DATE: &str = "date";
pub const PROP_DATETIME: &str = "datetime";
pub const PROP_DEALS_NEXT_7_DAYS: &str = "deals_next_7_days";
pub const PROP_REVENUE_NEXT_7_DAYS: &str = "revenue_next_7_days";

/// Result of one pass over the pipeline's deals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastAggregate {
    /// Deals closing at or before this instant are counted.
    pub window_end: DateTime<Utc>,
    pub deal_count: u64,
    pub total_value: Decimal,
    /// Ids of counted deals, in the order they were scanned.
    pub matched_deal_ids: Vec<String>,
    /// Deals left out because their close date could not be read.
    #[serde(default)]
    pub skipped_deal_ids: Vec<String>,
}

impl ForecastAggregate {
    pub fn empty(window_end: DateTime<Utc>) -> Self {
        Self {
            window_end,
            deal_count: 0,
            total_value: Decimal::ZERO,
            matched_deal_ids: Vec::new(),
            skipped_deal_ids: Vec::new(),
        }
    }
}

/// The daily forecast record as written to the custom object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub date: NaiveDate,
    pub datetime: DateTime<Utc>,
    pub deals_next_7_days: u64,
    pub revenue_next_7_days: Decimal,
}

impl ForecastRecord {
    /// Record for the UTC calendar day containing `now`.
    pub fn for_day(aggregate: &ForecastAggregate, now: DateTime<Utc>) -> Self {
        let date = now.date_naive();
        Self {
            date,
            datetime: utc_midnight(date),
            deals_next_7_days: aggregate.deal_count,
            revenue_next_7_days: aggregate.total_value,
        }
    }

    pub fn to_properties(&self) -> PropertyMap {
        let mut props = PropertyMap::new();
        props.insert(PROP_DATE.into(), date_key(self.date));
        props.insert(
            PROP_DATETIME.into(),
            self.datetime.to_rfc3339_opts(SecondsFormat::Millis, true),
        );
        props.insert(
            PROP_DEALS_NEXT_7_DAYS.into(),
            self.deals_next_7_days.to_string(),
        );
        props.insert(
            PROP_REVENUE_NEXT_7_DAYS.into(),
            self.revenue_next_7_days.normalize().to_string(),
        );
        props
    }
}

/// `YYYY-MM-DD`, the natural key of a forecast record.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn utc_midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}
