//! Insights API
//!
//! Client side of the remote insights HTTP API.
//!
//! # Endpoints
//!
//! ## Auth
//! - `POST /auth/login` - Exchange credentials for a bearer token
//!
//! ## Insights (bearer token required)
//! - `GET /insights/summary` - Customer, order and revenue totals
//! - `GET /insights/orders-by-date` - Order totals per day, `from`/`to` optional
//! - `GET /insights/top-customers` - Top customers by spend
//! - `GET /insights/top-products` - Top products by revenue
//! - `GET /insights/new-vs-repeat` - New vs repeat customer counts

pub mod client;
pub mod dto;
pub mod error;

pub use client::{ApiClient, RequestOptions};
pub use dto::{
    coerce_number, LoginRequest, LoginResponse, NewVsRepeat, OrdersByDate, Summary, TopCustomer,
    TopProduct,
};
pub use error::{ApiError, ApiResult};

/// Endpoint paths
pub mod paths {
    pub const LOGIN: &str = "/auth/login";
    pub const SUMMARY: &str = "/insights/summary";
    pub const ORDERS_BY_DATE: &str = "/insights/orders-by-date";
    pub const TOP_CUSTOMERS: &str = "/insights/top-customers";
    pub const TOP_PRODUCTS: &str = "/insights/top-products";
    pub const NEW_VS_REPEAT: &str = "/insights/new-vs-repeat";
}
