//! Insights Loading
//!
//! Keeps the dashboard's view state in sync with the insights API.
//!
//! ## Data Flow
//!
//! 1. The session guard admits the dashboard with a [`Session`](crate::session::Session)
//! 2. [`InsightsLoader`] fetches the five endpoints into [`DashboardState`]
//! 3. A [`DateRange`] change starts a new cycle; older cycles are discarded

mod filter;
mod loader;
mod state;

pub use filter::{parse_bound, DateRange};
pub use loader::{InsightsLoader, LoadOutcome, DEFAULT_LOAD_ERROR};
pub use state::DashboardState;
