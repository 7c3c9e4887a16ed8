use std::{path::PathBuf, time::Duration};

use aircheck::{
    alert::{Dispatcher, LogNotifier},
    feed::FeedClient,
    observer::Limits,
    scheduler,
    threshold::Thresholds,
};
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

mod directory;

use directory::JsonDirectory;

/// Poll an air-quality sensor feed and alert observers near the anchor.
#[derive(Debug, StructOpt)]
struct Opt {
    /// Feed endpoint returning the two-channel JSON document.
    #[structopt(long, env = "FEED_URL")]
    feed_url: String,

    /// Seconds between polls.
    #[structopt(long, env = "POLL_INTERVAL_SECS", default_value = "120")]
    poll_interval_secs: u64,

    /// MQ135 breach threshold.
    #[structopt(long, env = "MQ135_THRESHOLD", default_value = "750")]
    mq135_threshold: f64,

    /// MQ3 breach threshold.
    #[structopt(long, env = "MQ3_THRESHOLD", default_value = "1500")]
    mq3_threshold: f64,

    /// Greatest distance from the anchor still alerted, kilometers.
    #[structopt(long, env = "MAX_DISTANCE_KM", default_value = "3")]
    max_distance_km: f64,

    /// Greatest gap between location reports still alerted, minutes.
    #[structopt(long, env = "MAX_ELAPSED_MINUTES", default_value = "6")]
    max_elapsed_minutes: f64,

    /// Identity of the anchor observer.
    #[structopt(long, env = "ANCHOR_IDENTITY", default_value = "Admin@gmail.com")]
    anchor_identity: String,

    /// Path to the JSON observer directory.
    #[structopt(long, env = "OBSERVERS_FILE", default_value = "observers.json")]
    observers_file: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let opt = Opt::from_args();

    let feed = FeedClient::new(opt.feed_url.as_str());
    let thresholds = Thresholds {
        mq135: opt.mq135_threshold,
        mq3: opt.mq3_threshold,
    };
    let limits = Limits {
        max_distance_km: opt.max_distance_km,
        max_elapsed_minutes: opt.max_elapsed_minutes,
    };
    let dispatcher = Dispatcher::new(
        JsonDirectory::new(opt.observers_file),
        LogNotifier,
        limits,
        opt.anchor_identity,
    );

    tracing::info!(
        interval_secs = opt.poll_interval_secs,
        "starting poll loop"
    );
    scheduler::run(
        &feed,
        thresholds,
        &dispatcher,
        Duration::from_secs(opt.poll_interval_secs),
    )
    .await;

    Ok(())
}
