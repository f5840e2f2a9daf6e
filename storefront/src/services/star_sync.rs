// storefront/src/services/star_sync.rs

//! Mirrors the repository's stargazers into the verification table, once on
//! demand or periodically from a background worker.

use crate::errors::Result;
use crate::models::UpsertOutcome;
use crate::services::github::StarChecker;
use crate::store::{SharedStore, VerificationStore};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
  pub total_stargazers: usize,
  pub new_users: usize,
  pub updated_users: usize,
  pub errors: Vec<String>,
  /// Why paging ended before the last page; the sync is partial when set.
  pub stopped_early: Option<String>,
}

#[instrument(name = "star_sync::sync_stargazers", skip_all)]
pub async fn sync_stargazers<S>(store: &S, stars: &dyn StarChecker) -> Result<SyncSummary>
where
  S: VerificationStore + ?Sized,
{
  let listing = stars.stargazers().await?;
  let mut summary = SyncSummary {
    total_stargazers: listing.stargazers.len(),
    stopped_early: listing.stopped_early,
    ..Default::default()
  };

  for stargazer in listing.stargazers {
    let starred_at = stargazer.starred_at.unwrap_or_else(Utc::now);
    match store
      .upsert_stargazer(&stargazer.login, starred_at, stars.repo_owner(), stars.repo_name())
      .await
    {
      Ok(UpsertOutcome::Inserted) => summary.new_users += 1,
      Ok(UpsertOutcome::Updated) => summary.updated_users += 1,
      Ok(UpsertOutcome::Unchanged) => {}
      Err(e) => summary.errors.push(format!("{}: {}", stargazer.login, e)),
    }
  }

  info!(
    total = summary.total_stargazers,
    new = summary.new_users,
    updated = summary.updated_users,
    errors = summary.errors.len(),
    partial = summary.stopped_early.is_some(),
    "Stargazer sync finished."
  );
  Ok(summary)
}

/// Background task running `sync_stargazers` every `interval` until cancelled.
pub struct StarSyncWorker {
  store: SharedStore,
  stars: Arc<dyn StarChecker>,
  interval: Duration,
  shutdown: CancellationToken,
}

impl StarSyncWorker {
  pub fn new(store: SharedStore, stars: Arc<dyn StarChecker>, interval: Duration, shutdown: CancellationToken) -> Self {
    Self {
      store,
      stars,
      interval,
      shutdown,
    }
  }

  /// Runs one sync immediately, then one per tick. A failed run is logged
  /// and the next tick proceeds.
  pub async fn run(self) {
    info!(interval_secs = self.interval.as_secs(), "Star sync worker started.");
    let mut ticker = tokio::time::interval(self.interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
      tokio::select! {
        _ = self.shutdown.cancelled() => {
          info!("Star sync worker shutting down.");
          break;
        }
        _ = ticker.tick() => {
          match sync_stargazers(self.store.as_ref(), self.stars.as_ref()).await {
            Ok(summary) if !summary.errors.is_empty() || summary.stopped_early.is_some() => {
              warn!(
                errors = summary.errors.len(),
                stopped_early = ?summary.stopped_early,
                "Star sync completed with errors."
              );
            }
            Ok(_) => {}
            Err(e) => error!(error = %e, "Star sync run failed."),
          }
        }
      }
    }
  }

  /// Spawns the worker unless the interval is zero or GitHub is not configured.
  pub fn spawn(self) -> Option<tokio::task::JoinHandle<()>> {
    if self.interval.is_zero() {
      info!("Star sync disabled (interval 0).");
      return None;
    }
    if !self.stars.is_configured() {
      warn!("Star sync disabled: GitHub token not configured.");
      return None;
    }
    Some(tokio::spawn(self.run()))
  }
}
