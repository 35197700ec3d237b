//! Presentation
//!
//! - [`derived`]: pure projection of dashboard state into chart data
//! - [`render`]: text rendering of the projected view

pub mod derived;
pub mod render;

pub use derived::{display_date, Bar, Card, DashboardView, SeriesPoint, Slice, INVALID_DATE};
pub use render::{render_dashboard, render_login, LOADING};
