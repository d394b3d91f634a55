//! Caller-owned periodic recomputation for live dashboards.
//!
//! The service itself stays stateless; the timer lives here, in a handle the
//! caller can cancel or restart with a new interval.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::RefreshInterval;
use crate::error::Result;
use crate::filter::FilterParams;
use crate::service::TagStatsService;
use crate::source::LeadSource;
use crate::statistics::TagStatistics;

pub type RefreshSink = mpsc::Sender<Result<TagStatistics>>;

pub struct RefreshTask<S: LeadSource + 'static> {
    service: Arc<TagStatsService<S>>,
    filters: FilterParams,
    interval: RefreshInterval,
    sink: RefreshSink,
    handle: Option<JoinHandle<()>>,
}

impl<S: LeadSource + 'static> RefreshTask<S> {
    /// Spawn the loop. The first computation runs immediately, then once per
    /// interval. Must be called inside a tokio runtime.
    pub fn start(
        service: Arc<TagStatsService<S>>,
        filters: FilterParams,
        interval: RefreshInterval,
        sink: RefreshSink,
    ) -> Self {
        let mut task = Self {
            service,
            filters,
            interval,
            sink,
            handle: None,
        };
        task.spawn();
        task
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("Statistics refresh cancelled");
        }
    }

    /// Cancel and start again with a new interval, keeping service, filters
    /// and sink.
    pub fn restart(&mut self, interval: RefreshInterval) {
        self.cancel();
        self.interval = interval;
        self.spawn();
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Resolves when the loop ends on its own: the receiver went away or the
    /// loop panicked. Stays pending while the loop runs; returns at once if
    /// the task was cancelled. Safe to drop and call again.
    pub async fn stopped(&mut self) -> std::result::Result<(), JoinError> {
        let Some(handle) = self.handle.as_mut() else {
            return Ok(());
        };
        let outcome = handle.await;
        self.handle = None;
        outcome
    }

    pub fn interval(&self) -> RefreshInterval {
        self.interval
    }

    fn spawn(&mut self) {
        let service = Arc::clone(&self.service);
        let filters = self.filters.clone();
        let sink = self.sink.clone();
        let period = self.interval.as_duration();

        self.handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let result = service.compute_statistics(&filters).await;
                if let Err(ref e) = result {
                    warn!(error = %e, "Scheduled statistics refresh failed");
                }
                if sink.send(result).await.is_err() {
                    debug!("Refresh receiver dropped, stopping loop");
                    break;
                }
            }
        }));

        info!(interval_secs = period.as_secs(), "Statistics refresh started");
    }
}

impl<S: LeadSource + 'static> Drop for RefreshTask<S> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
