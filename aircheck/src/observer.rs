//! Observer records and the spatial-temporal eligibility filter.

use std::future::Future;

use serde::Deserialize;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::geo;

/// A registered observer, as projected out of the external directory.
///
/// Position and timestamp are held the way the directory stores them:
/// optional text. Parsing happens during assessment, so one malformed
/// record can never take down a whole fan-out batch.
#[derive(Debug, Clone, Deserialize)]
pub struct Observer {
    /// Opaque identity token.
    pub identity: String,
    /// Address alerts are sent to. Never eligible while absent.
    #[serde(default)]
    pub email: Option<String>,
    /// Last known latitude, decimal degrees.
    #[serde(default)]
    pub latitude: Option<String>,
    /// Last known longitude, decimal degrees.
    #[serde(default)]
    pub longitude: Option<String>,
    /// RFC 3339 instant of the last location report. Never eligible while
    /// absent.
    #[serde(default)]
    pub reported_at: Option<String>,
    /// Whether the observer opted into alerts.
    #[serde(default)]
    pub subscribed: bool,
}

/// Read access to the observer directory.
///
/// The directory is maintained by collaborators outside this engine; each
/// cycle only queries snapshots and never writes records back.
pub trait ObserverDirectory: Send + Sync {
    /// Look up a single observer by its identity token.
    fn find_by_identity(
        &self,
        identity: &str,
    ) -> impl Future<Output = anyhow::Result<Option<Observer>>> + Send;

    /// All observers that opted into alerts.
    fn subscribed(&self) -> impl Future<Output = anyhow::Result<Vec<Observer>>> + Send;
}

/// Spatial and temporal admission window for the eligibility filter.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Greatest admissible distance from the anchor, kilometers.
    pub max_distance_km: f64,
    /// Greatest admissible gap between location reports, minutes.
    pub max_elapsed_minutes: f64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_distance_km: 3.0,
            max_elapsed_minutes: 6.0,
        }
    }
}

/// Distance and report-time gap between a candidate and the anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proximity {
    /// Great-circle distance, kilometers.
    pub distance_km: f64,
    /// Absolute gap between the two location reports in minutes, rounded
    /// to two decimals.
    pub elapsed_minutes: f64,
}

/// Outcome of screening one candidate against the anchor.
#[derive(Debug, Clone, Copy)]
pub enum Assessment {
    /// The candidate is missing its email, position, or timestamp.
    Incomplete,
    /// All fields present, but outside the distance or freshness window.
    OutOfRange(Proximity),
    /// Close enough in space and time to be alerted.
    Eligible(Proximity),
}

impl Limits {
    /// Screen `candidate` against `anchor`.
    ///
    /// Unparseable coordinates or timestamps (on either side) produce NaN
    /// distances or gaps, which fail [`Limits::admits`] and land in
    /// [`Assessment::OutOfRange`].
    #[must_use]
    pub fn assess(&self, anchor: &Observer, candidate: &Observer) -> Assessment {
        let (Some(_), Some(lat), Some(lon), Some(reported_at)) = (
            candidate.email.as_deref(),
            candidate.latitude.as_deref(),
            candidate.longitude.as_deref(),
            candidate.reported_at.as_deref(),
        ) else {
            return Assessment::Incomplete;
        };

        let distance_km = geo::haversine_km(
            anchor
                .latitude
                .as_deref()
                .map_or(f64::NAN, geo::parse_coordinate),
            anchor
                .longitude
                .as_deref()
                .map_or(f64::NAN, geo::parse_coordinate),
            geo::parse_coordinate(lat),
            geo::parse_coordinate(lon),
        );

        let proximity = Proximity {
            distance_km,
            elapsed_minutes: elapsed_minutes(anchor.reported_at.as_deref(), reported_at),
        };

        if self.admits(&proximity) {
            Assessment::Eligible(proximity)
        } else {
            Assessment::OutOfRange(proximity)
        }
    }

    /// Whether `proximity` falls inside the window. Strict at both
    /// boundaries: a candidate at exactly the maximum distance or age is
    /// not admitted.
    #[must_use]
    pub fn admits(&self, proximity: &Proximity) -> bool {
        proximity.distance_km < self.max_distance_km
            && proximity.elapsed_minutes < self.max_elapsed_minutes
    }
}

/// |candidate − anchor| in minutes, rounded to two decimals. NaN when
/// either timestamp is absent or unparseable.
fn elapsed_minutes(anchor: Option<&str>, candidate: &str) -> f64 {
    let (Some(Ok(anchor)), Ok(candidate)) = (
        anchor.map(|t| OffsetDateTime::parse(t, &Rfc3339)),
        OffsetDateTime::parse(candidate, &Rfc3339),
    ) else {
        return f64::NAN;
    };

    let minutes = (candidate - anchor).abs().as_seconds_f64() / 60.0;
    (minutes * 100.0).round() / 100.0
}
