use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geo::{self, Coordinate};

/// A route point supplied from outside (GPX, CSV, manual entry)
///
/// Carries position only; speed and time are synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    #[serde(flatten)]
    pub position: Coordinate,
}

impl Waypoint {
    pub fn new(lat: f64, lon: f64, altitude: f64) -> Self {
        Self {
            position: Coordinate::new(lat, lon, altitude),
        }
    }
}

impl From<Coordinate> for Waypoint {
    fn from(position: Coordinate) -> Self {
        Self { position }
    }
}

/// A single synthesized track sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(flatten)]
    pub position: Coordinate,
    pub timestamp: DateTime<Utc>,
    /// Speed in km/h
    pub speed: f64,
    /// Cumulative distance since the track start in km
    pub distance: f64,
}

impl Record {
    /// Great-circle distance to another point in km
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        geo::distance_km(&self.position, other)
    }

    /// Seconds elapsed since `start`, with sub-second precision
    pub fn elapsed_since(&self, start: DateTime<Utc>) -> f64 {
        seconds_between(start, self.timestamp)
    }
}

pub(crate) fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to - from;
    match delta.num_nanoseconds() {
        Some(nanos) => nanos as f64 / 1e9,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "@{}: lat={} lon={} alt={} speed={:.3} distance={:.5}",
            self.timestamp.format("%H:%M:%S%.3f"),
            self.position.lat,
            self.position.lon,
            self.position.altitude,
            self.speed,
            self.distance
        )
    }
}
