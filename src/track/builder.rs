//! Waypoint-driven track synthesis
//!
//! [`TrackBuilder`] walks from waypoint to waypoint in one-second steps,
//! emitting a [`Record`] per step. Speed comes from the fade-in ramp for the
//! first seconds and from the [`SpeedWave`] afterwards. Every waypoint is hit
//! exactly by a record whose timestamp is the fractional second it was reached.
//! [`TrackBuilder::finalize`] rewrites the end of the track as a fade-out.

use chrono::{DateTime, Duration, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use super::fade::FadeEnvelope;
use super::record::{Record, Waypoint};
use super::wave::{SlopeOptions, SpeedWave};
use crate::error::TrackError;
use crate::geo::{self, Coordinate};
use crate::models::ActivityType;

/// Default probability of a rare slope at each cycle boundary
pub const DEFAULT_RARE_SPEED_CHANCE: f64 = 0.1;
/// Default fade-in and fade-out duration before jitter
pub const DEFAULT_FADE_DURATION_SECS: u32 = 45;
/// Default share of the speed removed at the very start and end
pub const DEFAULT_FADE_FRACTION: f64 = 0.5;
/// Slowest speed a step may use; keeps the stepping loop moving
pub const MIN_STEP_SPEED_KMH: f64 = 0.5;
/// Waypoints closer than this to the last record are skipped
pub const COINCIDENT_WAYPOINT_KM: f64 = 1e-9;

/// Everything a [`TrackBuilder`] needs up front
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSettings {
    pub start: DateTime<Utc>,
    /// Desired average speed in km/h
    pub desired_speed: f64,
    pub common_speed: SlopeOptions,
    pub rare_speed: SlopeOptions,
    pub rare_speed_chance: f64,
    pub fade_duration_secs: u32,
    pub fade_fraction: f64,
    /// Seed for the generator; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl TrackSettings {
    /// Settings with the default speed options of `activity_type`
    pub fn for_activity(activity_type: ActivityType, start: DateTime<Utc>, desired_speed: f64) -> Self {
        Self {
            start,
            desired_speed,
            common_speed: activity_type.default_common_speed(),
            rare_speed: activity_type.default_rare_speed(),
            rare_speed_chance: DEFAULT_RARE_SPEED_CHANCE,
            fade_duration_secs: DEFAULT_FADE_DURATION_SECS,
            fade_fraction: DEFAULT_FADE_FRACTION,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Lifecycle of a track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    /// No waypoint yet
    Empty,
    /// At least one waypoint, more may follow
    InProgress,
    /// Fade-out applied, read-only
    Finalized,
}

/// Synthesizes a timed track from waypoints
#[derive(Debug, Clone)]
pub struct TrackBuilder {
    start: DateTime<Utc>,
    desired_speed: f64,
    wave: SpeedWave,
    fade: FadeEnvelope,
    rng: ChaCha8Rng,
    records: Vec<Record>,
    state: TrackState,
}

impl TrackBuilder {
    pub fn new(settings: &TrackSettings) -> Self {
        let mut rng = match settings.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let fade = FadeEnvelope::new(settings.fade_duration_secs, settings.fade_fraction, &mut rng);
        let wave = SpeedWave::new(
            settings.common_speed,
            settings.rare_speed,
            settings.rare_speed_chance,
            settings.desired_speed,
        );

        debug!(
            fade_in_secs = fade.fade_in().duration_secs,
            fade_out_secs = fade.fade_out().duration_secs,
            desired_speed = settings.desired_speed,
            "track builder created"
        );

        Self {
            start: settings.start,
            desired_speed: settings.desired_speed,
            wave,
            fade,
            rng,
            records: Vec::new(),
            state: TrackState::Empty,
        }
    }

    pub fn state(&self) -> TrackState {
        self.state
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn fade(&self) -> &FadeEnvelope {
        &self.fade
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Total distance in km
    pub fn total_distance(&self) -> f64 {
        self.records.last().map_or(0.0, |r| r.distance)
    }

    /// Seconds from the start to the last record
    pub fn total_duration_secs(&self) -> f64 {
        self.records
            .last()
            .map_or(0.0, |r| r.elapsed_since(self.start))
    }

    pub fn total_duration(&self) -> Duration {
        self.records
            .last()
            .map_or_else(Duration::zero, |r| r.timestamp - self.start)
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.records.last().map_or(self.start, |r| r.timestamp)
    }

    /// Extend the track to `waypoint`
    pub fn add_waypoint(&mut self, waypoint: &Waypoint) -> Result<(), TrackError> {
        let target = waypoint.position;
        if !(-90.0..=90.0).contains(&target.lat) {
            return Err(TrackError::InvalidLatitude(target.lat));
        }
        if !(-180.0..=180.0).contains(&target.lon) {
            return Err(TrackError::InvalidLongitude(target.lon));
        }

        match self.state {
            TrackState::Finalized => Err(TrackError::Finalized),
            TrackState::Empty => {
                self.records.push(Record {
                    position: target,
                    timestamp: self.start,
                    speed: self.fade.start_speed(self.desired_speed),
                    distance: 0.0,
                });
                self.state = TrackState::InProgress;
                debug!(lat = target.lat, lon = target.lon, "track started");
                Ok(())
            }
            TrackState::InProgress => {
                let before = self.records.len();
                self.advance_to(&target);
                let added = self.records.len() - before;
                if added == 0 {
                    warn!(lat = target.lat, lon = target.lon, "skipping waypoint coincident with track end");
                } else {
                    debug!(
                        lat = target.lat,
                        lon = target.lon,
                        records = added,
                        distance_km = self.total_distance(),
                        "waypoint reached"
                    );
                }
                Ok(())
            }
        }
    }

    /// Add each waypoint in order, stopping at the first error
    pub fn add_waypoints<'a, I>(&mut self, waypoints: I) -> Result<(), TrackError>
    where
        I: IntoIterator<Item = &'a Waypoint>,
    {
        for waypoint in waypoints {
            self.add_waypoint(waypoint)?;
        }
        Ok(())
    }

    /// Apply the fade-out and freeze the track
    ///
    /// On error the track is left untouched.
    pub fn finalize(&mut self) -> Result<(), TrackError> {
        if self.state == TrackState::Finalized {
            return Err(TrackError::AlreadyFinalized);
        }

        let start_index = self.fade.fade_out_start(&self.records)?;
        let tail = self.records.split_off(start_index + 1);
        let anchor = self.records[start_index];

        for target in &tail {
            self.fade_out_to(&target.position, &anchor);
        }

        self.state = TrackState::Finalized;
        info!(
            records = self.records.len(),
            distance_km = self.total_distance(),
            duration_secs = self.total_duration_secs(),
            "track finalized"
        );
        Ok(())
    }

    fn next_speed(&mut self) -> f64 {
        let elapsed = self.total_duration_secs();
        let speed = match self.fade.fade_in_speed(self.desired_speed, elapsed) {
            Some(speed) => speed,
            None => self.wave.next_speed(&mut self.rng),
        };
        speed.max(MIN_STEP_SPEED_KMH)
    }

    fn advance_to(&mut self, target: &Coordinate) {
        while let Some(prev) = self.pending_from(target) {
            let speed = self.next_speed();
            let (record, reached) = step_towards(&prev, target, speed);
            self.records.push(record);
            if reached {
                break;
            }
        }
    }

    fn fade_out_to(&mut self, target: &Coordinate, anchor: &Record) {
        while let Some(prev) = self.pending_from(target) {
            let since_start = prev.elapsed_since(anchor.timestamp);
            let speed = self
                .fade
                .fade_out_speed(anchor.speed, since_start)
                .max(MIN_STEP_SPEED_KMH);
            let (record, reached) = step_towards(&prev, target, speed);
            self.records.push(record);
            if reached {
                break;
            }
        }
    }

    /// Last record, unless it already sits on `target`
    fn pending_from(&self, target: &Coordinate) -> Option<Record> {
        self.records
            .last()
            .filter(|last| last.distance_to(target) > COINCIDENT_WAYPOINT_KM)
            .copied()
    }
}

/// Produce the record one step after `prev` on the way to `target`
///
/// When the step would overshoot, the record lands exactly on `target` at the
/// fractional second it is reached; the returned flag is then true.
fn step_towards(prev: &Record, target: &Coordinate, speed: f64) -> (Record, bool) {
    let remaining = prev.distance_to(target);
    let step = speed / 3600.0;

    if step >= remaining {
        let nanos = ((remaining / speed * 3600.0) * 1e9).round().max(1.0) as i64;
        let record = Record {
            position: *target,
            timestamp: prev.timestamp + Duration::nanoseconds(nanos),
            speed,
            distance: prev.distance + remaining,
        };
        return (record, true);
    }

    let record = Record {
        position: geo::interpolate(&prev.position, target, step / remaining),
        timestamp: prev.timestamp + Duration::seconds(1),
        speed,
        distance: prev.distance + step,
    };
    (record, false)
}
