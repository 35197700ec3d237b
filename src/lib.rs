//! # Insights Dashboard
//!
//! Terminal client for tenant business metrics served by a remote insights
//! API: customer and order totals, revenue, orders per day, top customers
//! and products, and the new-vs-repeat customer split.
//!
//! ## Modules
//!
//! - [`api`]: HTTP client wrapper and wire types
//! - [`session`]: persisted credential, route guard
//! - [`insights`]: load cycles keeping dashboard state in sync
//! - [`view`]: derived chart data and text rendering
//! - [`app`]: login, logout and navigation between the routes
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use insights_dashboard::{App, Config, Navigation, Route};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let app = App::from_config(Config::load_default())?;
//!
//!     app.login("you@example.com", "secret").await?;
//!
//!     // Entering the dashboard starts its first load cycle
//!     if let Navigation::Dashboard(mut page) = app.navigate(Route::Dashboard).await? {
//!         page.loaded().await;
//!         println!("{}", page.render().await);
//!
//!         // Narrowing the date range starts a new load cycle
//!         if let Some(cycle) = page.set_from("2024-01-01") {
//!             cycle.await?;
//!         }
//!         println!("{}", page.render().await);
//!     }
//!
//!     app.logout().await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod app;
pub mod config;
pub mod insights;
pub mod session;
pub mod view;

// Re-export top-level types for convenience
pub use api::{ApiClient, ApiError, ApiResult, RequestOptions};

pub use app::{App, AppError, DashboardPage, Navigation};

pub use config::{generate_default_config, Config, ConfigError, DisplayConfig, LoggingConfig};

pub use insights::{DashboardState, DateRange, InsightsLoader, LoadOutcome};

pub use session::{
    Admission, CredentialStore, FileStore, MemoryStore, Route, Session, SessionError,
};

pub use view::{render_dashboard, DashboardView};
