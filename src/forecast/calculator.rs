use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::models::forecast::utc_midnight;
use crate::models::{Deal, ForecastAggregate};

pub const FORECAST_WINDOW_DAYS: i64 = 7;

/// Reduce `deals` to the forecast for the window ending `now + 7 days`.
///
/// The window is a fixed 168h offset and has no lower bound: a deal whose
/// close date is already past still counts. A deal closing exactly at the
/// window end is included.
pub fn compute_forecast(deals: &[Deal], now: DateTime<Utc>) -> ForecastAggregate {
    let window_end = now + Duration::days(FORECAST_WINDOW_DAYS);
    let mut agg = ForecastAggregate::empty(window_end);

    for deal in deals {
        let Some(close_date) = deal.close_date.as_deref().and_then(parse_close_date) else {
            tracing::warn!(
                deal_id = %deal.id,
                closedate = ?deal.close_date,
                "Skipping deal with unreadable close date"
            );
            agg.skipped_deal_ids.push(deal.id.clone());
            continue;
        };

        if close_date > window_end {
            continue;
        }

        agg.deal_count += 1;
        agg.total_value += deal_amount(deal);
        agg.matched_deal_ids.push(deal.id.clone());
    }

    agg
}

/// Close dates come back as epoch milliseconds; RFC 3339 and bare dates are
/// also accepted.
pub fn parse_close_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(millis) = raw.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(utc_midnight)
}

pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

/// Amount of a counted deal. Missing or malformed amounts count as zero.
fn deal_amount(deal: &Deal) -> Decimal {
    match deal.amount.as_deref().map(str::trim) {
        None | Some("") => Decimal::ZERO,
        Some(raw) => parse_amount(raw).unwrap_or_else(|| {
            tracing::warn!(deal_id = %deal.id, amount = raw, "Unreadable deal amount, counting as zero");
            Decimal::ZERO
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 5, 12, 0, 0).unwrap()
    }

    fn deal(id: &str, amount: Option<&str>, close: DateTime<Utc>) -> Deal {
        Deal {
            id: id.into(),
            pipeline: Some("default".into()),
            amount: amount.map(str::to_string),
            close_date: Some(close.timestamp_millis().to_string()),
        }
    }

    #[test]
    fn test_only_deals_inside_window_are_counted() {
        let deals = vec![
            deal("d1", Some("100"), now() + Duration::days(1)),
            deal("d2", Some("50"), now() + Duration::days(10)),
        ];

        let agg = compute_forecast(&deals, now());

        assert_eq!(agg.deal_count, 1);
        assert_eq!(agg.total_value, Decimal::from(100));
        assert_eq!(agg.matched_deal_ids, vec!["d1".to_string()]);
        assert_eq!(agg.window_end, now() + Duration::hours(168));
    }

    #[test]
    fn test_window_end_is_inclusive() {
        let boundary = now() + Duration::days(7);
        let deals = vec![
            deal("edge", Some("10"), boundary),
            deal("after", Some("10"), boundary + Duration::milliseconds(1)),
        ];

        let agg = compute_forecast(&deals, now());

        assert_eq!(agg.matched_deal_ids, vec!["edge".to_string()]);
    }

    #[test]
    fn test_past_close_dates_are_counted() {
        let deals = vec![deal("overdue", Some("75.25"), now() - Duration::days(30))];

        let agg = compute_forecast(&deals, now());

        assert_eq!(agg.deal_count, 1);
        assert_eq!(agg.total_value, Decimal::new(7525, 2));
    }

    #[test]
    fn test_empty_pipeline() {
        let agg = compute_forecast(&[], now());

        assert_eq!(agg.deal_count, 0);
        assert_eq!(agg.total_value, Decimal::ZERO);
        assert!(agg.matched_deal_ids.is_empty());
        assert!(agg.skipped_deal_ids.is_empty());
    }

    #[test]
    fn test_scan_order_preserved() {
        let deals = vec![
            deal("c", Some("1"), now() + Duration::days(3)),
            deal("a", Some("2"), now() + Duration::days(9)),
            deal("b", Some("3"), now() + Duration::days(1)),
            deal("a2", Some("4"), now()),
        ];

        let agg = compute_forecast(&deals, now());

        assert_eq!(agg.matched_deal_ids, vec!["c", "b", "a2"]);
        assert_eq!(agg.total_value, Decimal::from(8));
    }

    #[test]
    fn test_decimal_sum_is_exact() {
        let deals = vec![
            deal("d1", Some("0.1"), now()),
            deal("d2", Some("0.2"), now()),
        ];

        let agg = compute_forecast(&deals, now());

        assert_eq!(agg.total_value, Decimal::new(3, 1));
    }

    #[test]
    fn test_malformed_amount_counts_as_zero() {
        let deals = vec![
            deal("good", Some("250"), now()),
            deal("bad", Some("n/a"), now()),
            deal("missing", None, now()),
            deal("blank", Some(""), now()),
        ];

        let agg = compute_forecast(&deals, now());

        assert_eq!(agg.deal_count, 4);
        assert_eq!(agg.total_value, Decimal::from(250));
    }

    #[test]
    fn test_unreadable_close_date_is_skipped() {
        let mut no_date = deal("no-date", Some("10"), now());
        no_date.close_date = None;
        let mut garbage = deal("garbage", Some("10"), now());
        garbage.close_date = Some("next tuesday".into());

        let deals = vec![no_date, garbage, deal("ok", Some("5"), now())];
        let agg = compute_forecast(&deals, now());

        assert_eq!(agg.matched_deal_ids, vec!["ok".to_string()]);
        assert_eq!(agg.skipped_deal_ids, vec!["no-date", "garbage"]);
        assert_eq!(agg.total_value, Decimal::from(5));
    }

    #[test]
    fn test_parse_close_date_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 6, 7, 0, 0, 0).unwrap();

        assert_eq!(parse_close_date("1717718400000"), Some(expected));
        assert_eq!(parse_close_date(" 1717718400000 "), Some(expected));
        assert_eq!(parse_close_date("2024-06-07T00:00:00.000Z"), Some(expected));
        assert_eq!(parse_close_date("2024-06-07"), Some(expected));
        assert_eq!(parse_close_date(""), None);
        assert_eq!(parse_close_date("soon"), None);
    }

    #[test]
    fn test_parse_amount_formats() {
        assert_eq!(parse_amount("1500"), Some(Decimal::from(1500)));
        assert_eq!(parse_amount(" 99.99 "), Some(Decimal::new(9999, 2)));
        assert_eq!(parse_amount("1e3"), Some(Decimal::from(1000)));
        assert_eq!(parse_amount("$5"), None);
    }
}
