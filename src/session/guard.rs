//! Route Guard
//!
//! Client-side routes and the gate in front of the protected dashboard.

use std::fmt;
use std::str::FromStr;

use super::{CredentialStore, Session, SessionError};

/// Navigable routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// `/`, resolves to login or dashboard
    Root,
    Login,
    Dashboard,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Root => "/",
            Route::Login => "/login",
            Route::Dashboard => "/dashboard",
        }
    }

    /// Whether entering this route requires a session
    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Dashboard)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Route {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_end_matches('/') {
            "" => Ok(Route::Root),
            "/login" | "login" => Ok(Route::Login),
            "/dashboard" | "dashboard" => Ok(Route::Dashboard),
            other => Err(format!("Unknown route: {}. Use: /, /login, /dashboard", other)),
        }
    }
}

/// Result of entering a protected view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Page may load; the session drives the data-loading step
    Admit(Session),
    /// No credential; go here and do nothing else
    Redirect(Route),
}

/// Gate a protected view on the persisted token
pub async fn guard(store: &dyn CredentialStore) -> Result<Admission, SessionError> {
    match Session::load(store).await? {
        Some(session) => Ok(Admission::Admit(session)),
        None => {
            tracing::debug!("No session token, redirecting to {}", Route::Login);
            Ok(Admission::Redirect(Route::Login))
        }
    }
}

/// Resolve `/` to the dashboard when a token is present, else login
pub async fn dispatch_root(store: &dyn CredentialStore) -> Result<Route, SessionError> {
    let has_session = Session::load(store).await?.is_some();
    Ok(if has_session {
        Route::Dashboard
    } else {
        Route::Login
    })
}
