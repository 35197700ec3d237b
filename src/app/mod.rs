//! Application
//!
//! Wires configuration, the API client and the credential store together,
//! and implements the three routes:
//!
//! - `/` - dispatch to `/dashboard` or `/login`
//! - `/login` - exchange credentials for a session
//! - `/dashboard` - guarded; loads insights on entry

mod dashboard;

pub use dashboard::DashboardPage;

use std::sync::Arc;
use thiserror::Error;

use crate::api::{paths, ApiClient, ApiError, LoginRequest, LoginResponse};
use crate::config::{Config, ConfigError};
use crate::insights::InsightsLoader;
use crate::session::{
    dispatch_root, guard, Admission, CredentialStore, FileStore, Route, Session, SessionError,
};

/// Message shown when a login failure carries no text of its own
pub const DEFAULT_LOGIN_ERROR: &str = "Login failed";

/// Where a navigation ended up
pub enum Navigation {
    /// Login view; `redirected` is set when a guard sent us here
    Login { redirected: bool },
    /// Dashboard admitted; its entry load cycle is already running
    Dashboard(DashboardPage),
}

impl Navigation {
    pub fn route(&self) -> Route {
        match self {
            Navigation::Login { .. } => Route::Login,
            Navigation::Dashboard(_) => Route::Dashboard,
        }
    }
}

/// Top-level client application
pub struct App {
    config: Config,
    client: Arc<ApiClient>,
    store: Arc<dyn CredentialStore>,
}

impl App {
    /// Build an app around an explicit credential store
    pub fn new(config: Config, store: Arc<dyn CredentialStore>) -> Result<Self, AppError> {
        let client = Arc::new(ApiClient::new(config.api.base_url.clone())?);
        Ok(Self {
            config,
            client,
            store,
        })
    }

    /// Build an app persisting its session in the configured file
    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let store = Arc::new(FileStore::new(config.session.resolved_path()));
        Self::new(config, store)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Enter `route`, applying the root dispatcher and the session guard.
    ///
    /// An admitted dashboard is mounted: its first load cycle starts right
    /// away. Await it with [`DashboardPage::loaded`].
    pub async fn navigate(&self, route: Route) -> Result<Navigation, AppError> {
        let route = match route {
            Route::Root => dispatch_root(self.store.as_ref()).await?,
            other => other,
        };
        tracing::debug!(route = %route, "Navigating");

        match route {
            route if route.is_protected() => match guard(self.store.as_ref()).await? {
                Admission::Admit(session) => {
                    let mut page = self.dashboard(session);
                    page.mount();
                    Ok(Navigation::Dashboard(page))
                }
                Admission::Redirect(_) => Ok(Navigation::Login { redirected: true }),
            },
            _ => Ok(Navigation::Login { redirected: false }),
        }
    }

    /// Dashboard for an already admitted session; nothing is loaded yet
    pub fn dashboard(&self, session: Session) -> DashboardPage {
        let loader = InsightsLoader::new(Arc::clone(&self.client));
        DashboardPage::new(loader, session, self.config.display.clone())
    }

    /// `POST /auth/login`; on success persist the session and go to the dashboard
    pub async fn login(&self, email: &str, password: &str) -> Result<Route, AppError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response: LoginResponse = self
            .client
            .post_json(paths::LOGIN, &body, None)
            .await
            .map_err(|e| {
                let message = match e.to_string() {
                    m if m.is_empty() => DEFAULT_LOGIN_ERROR.to_string(),
                    m => m,
                };
                tracing::warn!(error = %message, "Login failed");
                AppError::Login(message)
            })?;

        let session = Session::new(response.token, tenant_to_string(&response.tenant_id));
        session.persist(self.store.as_ref()).await?;
        tracing::info!(tenant = ?session.tenant_id(), "Logged in");

        Ok(Route::Dashboard)
    }

    /// Clear the persisted session and go to login
    pub async fn logout(&self) -> Result<Route, AppError> {
        Session::clear(self.store.as_ref()).await?;
        tracing::info!("Logged out");
        Ok(Route::Login)
    }
}

/// Tenant ids are stored as text; numbers are written without quotes
fn tenant_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Login was rejected or could not be completed
    #[error("{0}")]
    Login(String),
}
