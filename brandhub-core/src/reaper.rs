use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::service::ThumbnailCacheService;

/// Background task driving
/// [`ThumbnailCacheService::clear_expired_thumbnails`] on a fixed
/// interval. A failed pass is logged and the next tick retried; the task
/// runs until its handle is aborted at shutdown.
#[derive(Debug)]
pub struct ExpiryReaperTask {
    service: ThumbnailCacheService,
    interval: Duration,
}

impl ExpiryReaperTask {
    /// Use the service's configured reap interval.
    pub fn new(service: ThumbnailCacheService) -> Self {
        let interval = service.config().reap_interval;
        Self { service, interval }
    }

    pub fn with_interval(
        service: ThumbnailCacheService,
        interval: Duration,
    ) -> Self {
        Self { service, interval }
    }

    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately; skip it so startup isn't
            // spent walking a cache nothing has aged out of yet.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match self.service.clear_expired_thumbnails().await {
                    Ok(0) => {}
                    Ok(reclaimed) => {
                        info!(reclaimed, "expiry reaper pass complete");
                    }
                    Err(err) => {
                        warn!(%err, "expiry reaper pass failed");
                    }
                }
            }
        })
    }
}
