//! Alert composition and fan-out over eligible observers.

use std::future::Future;

use tracing::{debug, error, info, warn};

use crate::{
    feed::SensorReading,
    observer::{Assessment, Limits, Observer, ObserverDirectory, Proximity},
};

/// One composed alert, ready to hand to a [`Notifier`].
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    /// Recipient address.
    pub recipient: String,
    /// MQ135 reading that triggered the cycle.
    pub mq135: f64,
    /// MQ3 reading that triggered the cycle.
    pub mq3: f64,
    /// Distance from the anchor, kilometers. A computed distance of
    /// exactly zero is reported as 1 so the alert text never claims
    /// "within 0km"; the eligibility decision is made on the raw value.
    pub distance_km: f64,
    /// Gap between the two location reports, minutes.
    pub elapsed_minutes: f64,
}

impl Alert {
    /// Display name alerts are sent under.
    pub const SENDER: &'static str = "Air Pro";
    /// Subject line.
    pub const SUBJECT: &'static str = "Air Quality Alert";

    fn compose(recipient: String, reading: &SensorReading, proximity: &Proximity) -> Self {
        let distance_km = if proximity.distance_km == 0.0 {
            1.0
        } else {
            proximity.distance_km
        };

        Self {
            recipient,
            mq135: reading.mq135,
            mq3: reading.mq3,
            distance_km,
            elapsed_minutes: proximity.elapsed_minutes,
        }
    }

    /// HTML body of the alert.
    #[must_use]
    pub fn html_body(&self) -> String {
        format!(
            "<h1>{}</h1>\n\
             <p>MQ135 ({}) and MQ3 ({}) levels around you within {:.2}km, \
             within {:.2}minutes</p>\n\
             <p>Air pollution exceeds the threshold. Please take necessary precautions.</p>",
            Self::SUBJECT, self.mq135, self.mq3, self.distance_km, self.elapsed_minutes
        )
    }
}

/// Delivery seam for composed alerts.
///
/// A failed send only ever affects its own recipient; the dispatcher logs
/// it and moves on.
pub trait Notifier: Send + Sync {
    /// Attempt to deliver one alert.
    fn send(&self, alert: &Alert) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// [`Notifier`] that records composed alerts in the log instead of
/// delivering them, mirroring the reference deployment where outbound
/// email is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn send(&self, alert: &Alert) -> anyhow::Result<()> {
        info!(
            recipient = %alert.recipient,
            subject = Alert::SUBJECT,
            distance_km = alert.distance_km,
            elapsed_minutes = alert.elapsed_minutes,
            "composed alert (delivery disabled)"
        );
        Ok(())
    }
}

/// Fans one breached reading out to every eligible observer.
#[derive(Debug)]
pub struct Dispatcher<D, N> {
    directory: D,
    notifier: N,
    limits: Limits,
    anchor_identity: String,
}

impl<D: ObserverDirectory, N: Notifier> Dispatcher<D, N> {
    /// Build a dispatcher around its collaborators.
    pub fn new(
        directory: D,
        notifier: N,
        limits: Limits,
        anchor_identity: impl Into<String>,
    ) -> Self {
        Self {
            directory,
            notifier,
            limits,
            anchor_identity: anchor_identity.into(),
        }
    }

    /// Alert every observer eligible against the anchor for `reading`.
    ///
    /// Returns the number of alerts handed to the notifier. Per-observer
    /// failures (missing fields, failed sends) are logged and skipped; a
    /// missing anchor or a directory failure aborts this fan-out with a
    /// logged error and a zero count, never a panic.
    pub async fn dispatch(&self, reading: &SensorReading) -> usize {
        let anchor = match self.directory.find_by_identity(&self.anchor_identity).await {
            Ok(Some(anchor)) => anchor,
            Ok(None) => {
                error!(
                    identity = %self.anchor_identity,
                    "anchor observer not found, skipping fan-out"
                );
                return 0;
            }
            Err(e) => {
                error!("loading anchor observer failed: {e:#}");
                return 0;
            }
        };

        let candidates = match self.directory.subscribed().await {
            Ok(candidates) => candidates,
            Err(e) => {
                error!("listing subscribed observers failed: {e:#}");
                return 0;
            }
        };

        let mut sent = 0;
        for candidate in candidates {
            match self.limits.assess(&anchor, &candidate) {
                Assessment::Incomplete => {
                    warn!(
                        identity = %candidate.identity,
                        "skipping observer with missing contact or location fields"
                    );
                }
                Assessment::OutOfRange(proximity) => {
                    debug!(identity = %candidate.identity, ?proximity, "observer out of range");
                }
                Assessment::Eligible(proximity) => {
                    // Eligibility implies the email is present.
                    let Some(recipient) = candidate.email else {
                        continue;
                    };

                    let alert = Alert::compose(recipient, reading, &proximity);
                    if let Err(e) = self.notifier.send(&alert).await {
                        error!(recipient = %alert.recipient, "sending alert failed: {e:#}");
                    } else {
                        sent += 1;
                    }
                }
            }
        }

        info!(
            sent,
            mq135 = reading.mq135,
            mq3 = reading.mq3,
            "alert fan-out complete"
        );

        sent
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::{Alert, Dispatcher, Notifier};
    use crate::{
        feed::SensorReading,
        observer::{Limits, Observer, ObserverDirectory},
    };

    const ANCHOR: &str = "Admin@gmail.com";

    #[derive(Debug, Default)]
    struct FixedDirectory {
        observers: Vec<Observer>,
    }

    impl ObserverDirectory for FixedDirectory {
        async fn find_by_identity(&self, identity: &str) -> anyhow::Result<Option<Observer>> {
            Ok(self
                .observers
                .iter()
                .find(|o| o.identity == identity)
                .cloned())
        }

        async fn subscribed(&self) -> anyhow::Result<Vec<Observer>> {
            Ok(self
                .observers
                .iter()
                .filter(|o| o.subscribed)
                .cloned()
                .collect())
        }
    }

    #[derive(Debug, Default, Clone)]
    struct RecordingNotifier {
        sent: Arc<Mutex<Vec<Alert>>>,
    }

    impl Notifier for RecordingNotifier {
        async fn send(&self, alert: &Alert) -> anyhow::Result<()> {
            self.sent.lock().unwrap().push(alert.clone());
            Ok(())
        }
    }

    fn observer(identity: &str, lat: &str, lon: &str, reported_at: &str) -> Observer {
        Observer {
            identity: identity.to_owned(),
            email: Some(format!("{identity}@example.com")),
            latitude: Some(lat.to_owned()),
            longitude: Some(lon.to_owned()),
            reported_at: Some(reported_at.to_owned()),
            subscribed: true,
        }
    }

    fn anchor() -> Observer {
        Observer {
            identity: ANCHOR.to_owned(),
            email: Some(ANCHOR.to_owned()),
            latitude: Some("12.97".to_owned()),
            longitude: Some("77.59".to_owned()),
            reported_at: Some("2024-06-01T10:00:00Z".to_owned()),
            subscribed: false,
        }
    }

    fn dispatcher(
        observers: Vec<Observer>,
    ) -> (Dispatcher<FixedDirectory, RecordingNotifier>, RecordingNotifier) {
        let notifier = RecordingNotifier::default();
        let dispatcher = Dispatcher::new(
            FixedDirectory { observers },
            notifier.clone(),
            Limits::default(),
            ANCHOR,
        );
        (dispatcher, notifier)
    }

    fn reading() -> SensorReading {
        SensorReading {
            mq135: 800.0,
            mq3: 200.0,
        }
    }

    #[tokio::test]
    async fn alerts_the_nearby_fresh_observer_once() {
        let (dispatcher, notifier) = dispatcher(vec![
            anchor(),
            observer("nearby", "12.98", "77.60", "2024-06-01T10:03:00Z"),
        ]);

        assert_eq!(dispatcher.dispatch(&reading()).await, 1);

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, "nearby@example.com");
        assert_eq!(sent[0].mq135, 800.0);
        assert!(sent[0].distance_km < 3.0);
        assert_eq!(sent[0].elapsed_minutes, 3.0);
    }

    #[tokio::test]
    async fn skips_the_distant_observer() {
        // ~10 km north of the anchor.
        let (dispatcher, notifier) = dispatcher(vec![
            anchor(),
            observer("nearby", "12.98", "77.60", "2024-06-01T10:03:00Z"),
            observer("distant", "13.06", "77.59", "2024-06-01T10:03:00Z"),
        ]);

        assert_eq!(dispatcher.dispatch(&reading()).await, 1);

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, "nearby@example.com");
    }

    #[tokio::test]
    async fn observer_with_missing_fields_does_not_abort_the_batch() {
        let mut incomplete = observer("incomplete", "12.98", "77.60", "2024-06-01T10:03:00Z");
        incomplete.latitude = None;

        let (dispatcher, notifier) = dispatcher(vec![
            anchor(),
            incomplete,
            observer("nearby", "12.98", "77.60", "2024-06-01T10:03:00Z"),
        ]);

        assert_eq!(dispatcher.dispatch(&reading()).await, 1);
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_anchor_yields_no_alerts() {
        let (dispatcher, notifier) = dispatcher(vec![observer(
            "nearby",
            "12.98",
            "77.60",
            "2024-06-01T10:03:00Z",
        )]);

        assert_eq!(dispatcher.dispatch(&reading()).await, 0);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn coincident_observer_is_reported_at_one_kilometer() {
        let (dispatcher, notifier) = dispatcher(vec![
            anchor(),
            observer("colocated", "12.97", "77.59", "2024-06-01T10:01:00Z"),
        ]);

        assert_eq!(dispatcher.dispatch(&reading()).await, 1);

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent[0].distance_km, 1.0);
        assert_eq!(sent[0].elapsed_minutes, 1.0);
    }

    #[test]
    fn body_names_both_readings_and_the_window() {
        let alert = Alert {
            recipient: "nearby@example.com".to_owned(),
            mq135: 800.0,
            mq3: 200.0,
            distance_km: 1.55,
            elapsed_minutes: 3.0,
        };

        let body = alert.html_body();
        assert!(body.contains("MQ135 (800)"));
        assert!(body.contains("MQ3 (200)"));
        assert!(body.contains("within 1.55km"));
        assert!(body.contains("within 3.00minutes"));
    }
}
