//! Insights Loader
//!
//! Fetches the five insights endpoints in sequence and publishes each
//! result into the shared [`DashboardState`] as soon as it arrives.
//!
//! ## Cycle rules
//!
//! 1. A cycle takes the next generation number, sets `loading` and clears
//!    the previous error.
//! 2. Steps run strictly one after another: summary, orders-by-date (the
//!    only filtered call), top customers, top products, new-vs-repeat.
//! 3. The first failing step ends the cycle. Data written by earlier steps
//!    stays; the error message is published.
//! 4. Only the newest cycle may write. An older cycle that is still in
//!    flight is not cancelled, but stops at its next step and its results
//!    are dropped.

use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::filter::DateRange;
use super::state::DashboardState;
use crate::api::{
    paths, ApiClient, ApiError, NewVsRepeat, OrdersByDate, Summary, TopCustomer, TopProduct,
};
use crate::session::Session;

/// Message shown when a failure carries no text of its own
pub const DEFAULT_LOAD_ERROR: &str = "Failed to load data";

/// How a load cycle ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// All five steps were published
    Completed,
    /// A step failed; the message was published as the dashboard error
    Failed(String),
    /// A newer cycle started; nothing further was written
    Superseded,
}

/// Why a cycle stopped early
enum StepError {
    Superseded,
    Api(ApiError),
}

impl From<ApiError> for StepError {
    fn from(e: ApiError) -> Self {
        StepError::Api(e)
    }
}

/// Drives load cycles against one shared state
#[derive(Clone)]
pub struct InsightsLoader {
    client: Arc<ApiClient>,
    state: Arc<RwLock<DashboardState>>,
}

impl InsightsLoader {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self::with_state(client, Arc::new(RwLock::new(DashboardState::new())))
    }

    pub fn with_state(client: Arc<ApiClient>, state: Arc<RwLock<DashboardState>>) -> Self {
        Self { client, state }
    }

    /// Shared state handle
    pub fn state(&self) -> Arc<RwLock<DashboardState>> {
        Arc::clone(&self.state)
    }

    /// Snapshot of the current state
    pub async fn snapshot(&self) -> DashboardState {
        self.state.read().await.clone()
    }

    /// Run one full cycle for `session` with `filter`
    pub async fn load(&self, session: &Session, filter: &DateRange) -> LoadOutcome {
        let generation = self.begin().await;
        tracing::debug!(generation, filter = %filter.label(), "Starting insights load");

        match self.run(generation, session, filter).await {
            Ok(()) => {
                let finished = self
                    .commit(generation, |s| s.loading = false)
                    .await
                    .is_ok();
                if !finished {
                    return self.superseded(generation);
                }
                tracing::info!(generation, "Insights loaded");
                LoadOutcome::Completed
            }
            Err(StepError::Superseded) => self.superseded(generation),
            Err(StepError::Api(e)) => {
                let message = match e.to_string() {
                    m if m.is_empty() => DEFAULT_LOAD_ERROR.to_string(),
                    m => m,
                };
                tracing::warn!(generation, error = %message, status = ?e.status(), "Insights load failed");

                let published = self
                    .commit(generation, |s| {
                        s.error = Some(message.clone());
                        s.loading = false;
                    })
                    .await
                    .is_ok();
                if published {
                    LoadOutcome::Failed(message)
                } else {
                    self.superseded(generation)
                }
            }
        }
    }

    async fn run(
        &self,
        generation: u64,
        session: &Session,
        filter: &DateRange,
    ) -> Result<(), StepError> {
        let summary: Summary = self.fetch(generation, paths::SUMMARY, session).await?;
        self.commit(generation, |s| s.summary = summary).await?;

        let series: Vec<OrdersByDate> = self
            .fetch(generation, &filter.apply(paths::ORDERS_BY_DATE), session)
            .await?;
        self.commit(generation, |s| s.series = series).await?;

        let customers: Vec<TopCustomer> =
            self.fetch(generation, paths::TOP_CUSTOMERS, session).await?;
        self.commit(generation, |s| s.top_customers = customers).await?;

        let products: Vec<TopProduct> =
            self.fetch(generation, paths::TOP_PRODUCTS, session).await?;
        self.commit(generation, |s| s.top_products = products).await?;

        let split: NewVsRepeat = self.fetch(generation, paths::NEW_VS_REPEAT, session).await?;
        self.commit(generation, |s| s.new_vs_repeat = split).await?;

        Ok(())
    }

    /// Take the next generation and reset the cycle flags
    async fn begin(&self) -> u64 {
        let mut state = self.state.write().await;
        state.generation += 1;
        state.loading = true;
        state.error = None;
        state.generation
    }

    async fn is_current(&self, generation: u64) -> bool {
        self.state.read().await.generation == generation
    }

    /// Fetch one endpoint unless the cycle is already stale
    async fn fetch<T: DeserializeOwned>(
        &self,
        generation: u64,
        path: &str,
        session: &Session,
    ) -> Result<T, StepError> {
        if !self.is_current(generation).await {
            return Err(StepError::Superseded);
        }
        Ok(self.client.get_json(path, Some(session.token())).await?)
    }

    /// Apply `update` only while `generation` is still the newest cycle
    async fn commit<F>(&self, generation: u64, update: F) -> Result<(), StepError>
    where
        F: FnOnce(&mut DashboardState),
    {
        let mut state = self.state.write().await;
        if state.generation != generation {
            return Err(StepError::Superseded);
        }
        update(&mut state);
        Ok(())
    }

    fn superseded(&self, generation: u64) -> LoadOutcome {
        tracing::debug!(generation, "Discarding results of superseded load");
        LoadOutcome::Superseded
    }
}
