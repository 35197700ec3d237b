//! Dashboard Page
//!
//! Owns the admitted session, the date-range filter and the loader.
//! Mounting the page starts the first load cycle; any change to the filter
//! starts another.

use tokio::task::JoinHandle;

use crate::config::DisplayConfig;
use crate::insights::{DashboardState, DateRange, InsightsLoader, LoadOutcome};
use crate::session::Session;
use crate::view::{render_dashboard, DashboardView};

/// A mounted dashboard
pub struct DashboardPage {
    loader: InsightsLoader,
    session: Session,
    filter: DateRange,
    display: DisplayConfig,
    mount: Option<JoinHandle<LoadOutcome>>,
}

impl DashboardPage {
    pub fn new(loader: InsightsLoader, session: Session, display: DisplayConfig) -> Self {
        Self {
            loader,
            session,
            filter: DateRange::unbounded(),
            display,
            mount: None,
        }
    }

    /// Start the entry load cycle in the background
    pub(crate) fn mount(&mut self) {
        self.mount = Some(self.spawn_reload());
    }

    /// Hand over the entry cycle, if it has not been taken yet
    pub fn take_mount(&mut self) -> Option<JoinHandle<LoadOutcome>> {
        self.mount.take()
    }

    /// Wait for the entry cycle; a page that was never mounted, or whose
    /// entry cycle was already taken, runs a fresh cycle instead
    pub async fn loaded(&mut self) -> LoadOutcome {
        match self.take_mount() {
            Some(cycle) => cycle
                .await
                .unwrap_or_else(|e| LoadOutcome::Failed(e.to_string())),
            None => self.reload().await,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn filter(&self) -> &DateRange {
        &self.filter
    }

    pub fn loader(&self) -> &InsightsLoader {
        &self.loader
    }

    /// Run a load cycle with the current filter and wait for it
    pub async fn reload(&self) -> LoadOutcome {
        self.loader.load(&self.session, &self.filter).await
    }

    /// Start a load cycle in the background
    pub fn spawn_reload(&self) -> JoinHandle<LoadOutcome> {
        let loader = self.loader.clone();
        let session = self.session.clone();
        let filter = self.filter.clone();
        tokio::spawn(async move { loader.load(&session, &filter).await })
    }

    /// Replace the filter; starts a cycle only when it actually changed
    pub fn set_filter(&mut self, filter: DateRange) -> Option<JoinHandle<LoadOutcome>> {
        if filter == self.filter {
            return None;
        }
        tracing::debug!(from = ?filter.from(), to = ?filter.to(), "Date filter changed");
        self.filter = filter;
        Some(self.spawn_reload())
    }

    pub fn set_from(&mut self, from: &str) -> Option<JoinHandle<LoadOutcome>> {
        let mut filter = self.filter.clone();
        filter.set_from(from);
        self.set_filter(filter)
    }

    pub fn set_to(&mut self, to: &str) -> Option<JoinHandle<LoadOutcome>> {
        let mut filter = self.filter.clone();
        filter.set_to(to);
        self.set_filter(filter)
    }

    /// The "clear" action: drop both bounds
    pub fn clear_filter(&mut self) -> Option<JoinHandle<LoadOutcome>> {
        self.set_filter(DateRange::unbounded())
    }

    pub async fn state(&self) -> DashboardState {
        self.loader.snapshot().await
    }

    /// Derived view of the current state
    pub async fn view(&self) -> DashboardView {
        DashboardView::project(&self.loader.snapshot().await, &self.display)
    }

    /// Text rendering of the current state
    pub async fn render(&self) -> String {
        render_dashboard(&self.view().await, &self.filter, self.session.tenant_id())
    }
}
