//! Data Transfer Objects
//!
//! Wire shapes for the insights API. Every numeric field goes through
//! [`lenient_number`], so a missing or malformed value reads as zero
//! instead of failing the whole response.

use serde::{Deserialize, Deserializer, Serialize};

// ============================================
// Auth
// ============================================

/// Body of `POST /auth/login`
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response of `POST /auth/login`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    /// Numeric on the wire; kept as raw JSON and stringified on persist
    #[serde(default)]
    pub tenant_id: serde_json::Value,
}

// ============================================
// Insights
// ============================================

/// Response of `GET /insights/summary`
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    #[serde(default, deserialize_with = "lenient_number")]
    pub customers: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub orders: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub revenue: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub average_order_value: f64,
}

/// One element of `GET /insights/orders-by-date`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrdersByDate {
    #[serde(default)]
    pub order_date: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total: f64,
}

/// One element of `GET /insights/top-customers`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TopCustomer {
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub spend: f64,
}

/// One element of `GET /insights/top-products`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TopProduct {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub revenue: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub units: f64,
}

/// Response of `GET /insights/new-vs-repeat`
///
/// The two counts are not checked against the summary's customer total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct NewVsRepeat {
    #[serde(default, deserialize_with = "lenient_number")]
    pub new: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub repeat: f64,
}

// ============================================
// Coercion
// ============================================

/// Coerce an arbitrary JSON value to a number.
///
/// Falsy values (`null`, `false`, `0`, `""`) and anything that does not
/// parse become `0.0`. Numeric strings are parsed after trimming, `true` is
/// `1.0`. The result is always finite.
pub fn coerce_number(value: &serde_json::Value) -> f64 {
    use serde_json::Value;

    let n = match value {
        Value::Null => 0.0,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().unwrap_or(0.0)
            }
        }
        Value::Array(_) | Value::Object(_) => 0.0,
    };

    if n.is_finite() {
        n
    } else {
        0.0
    }
}

/// Serde adapter around [`coerce_number`]
pub fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(coerce_number(&value))
}

/// Labels may arrive as numbers or null; render them as text
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}
