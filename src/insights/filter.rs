//! Date Range Filter
//!
//! Optional `from`/`to` bounds for the orders-by-date series. An empty
//! bound and a cleared bound are the same thing: neither is sent.

use chrono::NaiveDate;

/// Optional lower/upper bounds, each an ISO `YYYY-MM-DD` string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateRange {
    from: Option<String>,
    to: Option<String>,
}

impl DateRange {
    /// No bounds
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn new(from: Option<&str>, to: Option<&str>) -> Self {
        Self {
            from: normalize(from),
            to: normalize(to),
        }
    }

    pub fn from(&self) -> Option<&str> {
        self.from.as_deref()
    }

    pub fn to(&self) -> Option<&str> {
        self.to.as_deref()
    }

    /// Set the lower bound; `""` clears it
    pub fn set_from(&mut self, from: &str) {
        self.from = normalize(Some(from));
    }

    /// Set the upper bound; `""` clears it
    pub fn set_to(&mut self, to: &str) {
        self.to = normalize(Some(to));
    }

    /// Reset both bounds
    pub fn clear(&mut self) {
        self.from = None;
        self.to = None;
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// `from=..&to=..` with only the bounds that are set; empty when none are
    pub fn query_string(&self) -> String {
        let mut pairs = Vec::with_capacity(2);
        if let Some(from) = &self.from {
            pairs.push(format!("from={}", urlencoding::encode(from)));
        }
        if let Some(to) = &self.to {
            pairs.push(format!("to={}", urlencoding::encode(to)));
        }
        pairs.join("&")
    }

    /// Append the query string to `path`, or return `path` unchanged
    pub fn apply(&self, path: &str) -> String {
        let query = self.query_string();
        if query.is_empty() {
            path.to_string()
        } else {
            format!("{}?{}", path, query)
        }
    }

    /// Human-readable label, e.g. "2024-01-01 → any"
    pub fn label(&self) -> String {
        if self.is_unbounded() {
            return "All dates".to_string();
        }
        format!(
            "{} → {}",
            self.from.as_deref().unwrap_or("any"),
            self.to.as_deref().unwrap_or("any")
        )
    }
}

fn normalize(bound: Option<&str>) -> Option<String> {
    bound
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_string)
}

/// Validate a user-entered bound. `""` is accepted and means "no bound".
pub fn parse_bound(s: &str) -> Result<String, String> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(String::new());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| format!("Invalid date: {}. Use YYYY-MM-DD", s))
}
