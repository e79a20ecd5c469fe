use std::time::Duration;

use chrono::{Days, NaiveDate};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::AppError;
use crate::services::SummaryService;

#[derive(Debug, Default, Serialize)]
pub struct SnapshotRunStats {
    pub date: Option<NaiveDate>,
    pub summaries_written: usize,
    pub summaries_removed: u64,
}

/// Periodically freezes yesterday's summaries and prunes old snapshots.
pub struct SnapshotScheduler {
    summaries: SummaryService,
    interval: Duration,
    retention_days: Option<u64>,
}

impl SnapshotScheduler {
    pub fn new(summaries: SummaryService, interval_secs: u64, retention_days: Option<u64>) -> Self {
        Self {
            summaries,
            interval: Duration::from_secs(interval_secs.max(1)),
            retention_days,
        }
    }

    /// Runs forever; a failed run is logged and the loop keeps going.
    pub async fn start(self) {
        info!("Starting snapshot scheduler (interval: {:?})", self.interval);

        loop {
            tokio::time::sleep(self.interval).await;

            match self.run_once().await {
                Ok(stats) => {
                    info!(
                        "Snapshot run completed - date: {:?}, written: {}, removed: {}",
                        stats.date, stats.summaries_written, stats.summaries_removed
                    );
                }
                Err(e) => {
                    warn!("Snapshot run failed: {:?}", e);
                }
            }
        }
    }

    pub async fn run_once(&self) -> Result<SnapshotRunStats, AppError> {
        let yesterday = self
            .summaries
            .today()
            .checked_sub_days(Days::new(1))
            .ok_or(AppError::InternalServerError)?;

        let summaries_written = self.summaries.snapshot_all_users(yesterday).await?;
        let summaries_removed = match self.retention_days {
            Some(days) => self.summaries.clean_old_summaries(days).await?,
            None => 0,
        };

        Ok(SnapshotRunStats {
            date: Some(yesterday),
            summaries_written,
            summaries_removed,
        })
    }
}
