//! The periodic fetch → evaluate → dispatch loop.

use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{
    alert::{Dispatcher, Notifier},
    feed::FeedClient,
    observer::ObserverDirectory,
    threshold::Thresholds,
};

/// Poll the feed forever: an immediate first cycle at startup, then one
/// cycle per `period`.
///
/// Each cycle is awaited before the next tick is honored, so at most one
/// cycle is ever in flight; a tick falling due mid-cycle is delayed rather
/// than stacked. No failure escapes a cycle: a failed fetch is treated as
/// "no breach" and the loop carries on at the next tick.
pub async fn run<D, N>(
    feed: &FeedClient,
    thresholds: Thresholds,
    dispatcher: &Dispatcher<D, N>,
    period: Duration,
) where
    D: ObserverDirectory,
    N: Notifier,
{
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        cycle(feed, thresholds, dispatcher).await;
    }
}

async fn cycle<D, N>(feed: &FeedClient, thresholds: Thresholds, dispatcher: &Dispatcher<D, N>)
where
    D: ObserverDirectory,
    N: Notifier,
{
    let reading = match feed.fetch().await {
        Ok(reading) => reading,
        Err(e) => {
            warn!("fetching reading failed, treating as no breach: {e}");
            return;
        }
    };

    debug!(mq135 = reading.mq135, mq3 = reading.mq3, "fetched reading");

    let breaches = thresholds.exceeded(&reading);
    if breaches.any() {
        info!(%breaches, "thresholds breached, fanning out alerts");
        dispatcher.dispatch(&reading).await;
    } else {
        debug!("reading within thresholds");
    }
}
