//! Derived View
//!
//! Pure projection of [`DashboardState`] into chart-ready shapes. Nothing
//! here mutates state or talks to the network.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use std::fmt::Display;

use crate::config::DisplayConfig;
use crate::insights::DashboardState;

/// Placeholder for a date that does not parse
pub const INVALID_DATE: &str = "Invalid Date";

/// One summary card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    pub title: &'static str,
    pub value: String,
}

/// One point on the orders-by-date line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: String,
    pub total: f64,
}

/// One bar of a ranking chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub name: String,
    pub value: f64,
}

/// One slice of the new-vs-repeat pie
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice {
    pub name: &'static str,
    pub value: f64,
}

/// Everything the presentation surface draws
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub cards: Vec<Card>,
    pub series: Vec<SeriesPoint>,
    pub customers: Vec<Bar>,
    pub products: Vec<Bar>,
    pub split: Vec<Slice>,
    pub loading: bool,
    pub error: Option<String>,
}

impl DashboardView {
    /// Project state using the local time zone for dates
    pub fn project(state: &DashboardState, display: &DisplayConfig) -> Self {
        Self::project_in(state, display, &Local)
    }

    /// Project state, formatting series dates in `tz`
    pub fn project_in<Tz>(state: &DashboardState, display: &DisplayConfig, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let summary = &state.summary;
        let money = |v: f64| format!("{}{:.2}", display.currency_symbol, v);

        let cards = vec![
            Card {
                title: "Customers",
                value: summary.customers.to_string(),
            },
            Card {
                title: "Orders",
                value: summary.orders.to_string(),
            },
            Card {
                title: "Revenue",
                value: money(summary.revenue),
            },
            Card {
                title: "Avg Order Value",
                value: money(summary.average_order_value),
            },
        ];

        let series = state
            .series
            .iter()
            .map(|row| SeriesPoint {
                date: display_date(&row.order_date, tz, &display.date_format),
                total: row.total,
            })
            .collect();

        let customers = state
            .top_customers
            .iter()
            .map(|c| Bar {
                name: c.name.clone(),
                value: c.spend,
            })
            .collect();

        let products = state
            .top_products
            .iter()
            .map(|p| Bar {
                name: p.title.clone(),
                value: p.revenue,
            })
            .collect();

        let split = vec![
            Slice {
                name: "New",
                value: state.new_vs_repeat.new,
            },
            Slice {
                name: "Repeat",
                value: state.new_vs_repeat.repeat,
            },
        ];

        Self {
            cards,
            series,
            customers,
            products,
            split,
            loading: state.loading,
            error: state.error.clone(),
        }
    }
}

/// Format a raw API date for display in `tz`.
///
/// Accepts RFC 3339 timestamps, ISO date-times with a `+HHMM` offset, bare
/// `YYYY-MM-DD` dates (read as UTC midnight) and zone-less date-times with
/// either a `T` or a space separator, seconds optional (read as local to
/// `tz`). Anything else renders as [`INVALID_DATE`].
pub fn display_date<Tz>(raw: &str, tz: &Tz, format: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match parse_date(raw.trim(), tz) {
        Some(dt) => dt.format(checked_format(format)).to_string(),
        None => INVALID_DATE.to_string(),
    }
}

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

fn parse_date<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(tz));
    }

    if let Some(dt) = OFFSET_FORMATS
        .iter()
        .find_map(|f| DateTime::parse_from_str(raw, f).ok())
    {
        return Some(dt.with_timezone(tz));
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|midnight| Utc.from_utc_datetime(&midnight).with_timezone(tz));
    }

    LOCAL_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
        .and_then(|naive| tz.from_local_datetime(&naive).earliest())
}

/// `format` when it is a valid strftime pattern, else the default
fn checked_format(format: &str) -> &str {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        tracing::warn!(format, "Invalid date format, using default");
        DEFAULT_FORMAT
    } else {
        format
    }
}

const DEFAULT_FORMAT: &str = "%-m/%-d/%Y";
