//! Dashboard State
//!
//! View state shared between the loader (writer) and the renderer (reader).

use crate::api::{NewVsRepeat, OrdersByDate, Summary, TopCustomer, TopProduct};

/// Everything the dashboard shows, as last fetched
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    pub summary: Summary,
    /// Server order, never re-sorted
    pub series: Vec<OrdersByDate>,
    pub top_customers: Vec<TopCustomer>,
    pub top_products: Vec<TopProduct>,
    pub new_vs_repeat: NewVsRepeat,
    /// True while a load cycle is in flight
    pub loading: bool,
    /// Message of the last failed cycle
    pub error: Option<String>,
    /// Generation of the load cycle allowed to write
    pub generation: u64,
}

impl DashboardState {
    /// Fresh state: zeroed metrics and `loading` set until the first cycle ends
    pub fn new() -> Self {
        Self {
            summary: Summary::default(),
            series: Vec::new(),
            top_customers: Vec::new(),
            top_products: Vec::new(),
            new_vs_repeat: NewVsRepeat::default(),
            loading: true,
            error: None,
            generation: 0,
        }
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}
