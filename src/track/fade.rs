//! Start and end speed ramps
//!
//! A run doesn't start or stop at full speed. The first seconds of a track
//! ramp linearly from a faded floor up to the desired speed, and the last
//! seconds ramp back down. Both windows are jittered once per activity so two
//! tracks built from the same settings don't share an identical envelope.

use rand::Rng;
use tracing::debug;

use super::record::Record;
use crate::error::TrackError;

/// Fraction by which fade durations are randomly stretched or shrunk
pub const FADE_JITTER_FRACTION: f64 = 0.25;

/// One fade window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeWindow {
    /// Length of the ramp in whole seconds
    pub duration_secs: u32,
    /// Share of the speed that is faded, 0..=1
    pub fraction: f64,
}

impl FadeWindow {
    /// Window with the duration moved by up to ±25%
    pub fn jittered<R: Rng>(duration_secs: u32, fraction: f64, rng: &mut R) -> Self {
        let amplitude = (duration_secs as f64 * FADE_JITTER_FRACTION) as i64;
        let jitter = rng.gen_range(-amplitude..=amplitude);
        Self {
            duration_secs: (duration_secs as i64 + jitter).max(1) as u32,
            fraction,
        }
    }

    /// Speed change per second when ramping `speed` over this window
    pub fn rate(&self, speed: f64) -> f64 {
        speed * self.fraction / self.duration_secs as f64
    }

    /// Lowest speed of the ramp
    pub fn floor(&self, speed: f64) -> f64 {
        speed * (1.0 - self.fraction)
    }
}

/// Fade-in and fade-out windows of one activity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeEnvelope {
    fade_in: FadeWindow,
    fade_out: FadeWindow,
}

impl FadeEnvelope {
    /// Draw independent fade-in and fade-out windows around `duration_secs`
    pub fn new<R: Rng>(duration_secs: u32, fraction: f64, rng: &mut R) -> Self {
        Self {
            fade_in: FadeWindow::jittered(duration_secs, fraction, rng),
            fade_out: FadeWindow::jittered(duration_secs, fraction, rng),
        }
    }

    /// Envelope with exact windows, no jitter
    pub fn fixed(fade_in: FadeWindow, fade_out: FadeWindow) -> Self {
        Self { fade_in, fade_out }
    }

    pub fn fade_in(&self) -> FadeWindow {
        self.fade_in
    }

    pub fn fade_out(&self) -> FadeWindow {
        self.fade_out
    }

    /// Speed of the very first record
    pub fn start_speed(&self, desired: f64) -> f64 {
        self.fade_in.floor(desired)
    }

    /// Fade-in speed for the second starting at `elapsed`
    ///
    /// Returns `None` once the fade-in is over and the speed wave takes over.
    pub fn fade_in_speed(&self, desired: f64, elapsed: f64) -> Option<f64> {
        if elapsed >= self.fade_in.duration_secs as f64 {
            return None;
        }
        let speed = self.fade_in.floor(desired) + self.fade_in.rate(desired) * (elapsed + 1.0);
        Some(speed.min(desired))
    }

    /// Fade-out speed for the second starting `since_start` seconds after the
    /// fade-out began at `start_speed`
    pub fn fade_out_speed(&self, start_speed: f64, since_start: f64) -> f64 {
        let window = self.fade_out;
        let progress = (since_start + 1.0).min(window.duration_secs as f64);
        (start_speed - window.rate(start_speed) * progress).max(window.floor(start_speed))
    }

    /// Index of the record the fade-out should start from
    ///
    /// Slowing down covers less ground per second, so the fade-out can't just
    /// begin `duration` seconds before the end. Scan forward until decelerating
    /// from a record's speed over the whole window covers the distance still left.
    pub fn fade_out_start(&self, records: &[Record]) -> Result<usize, TrackError> {
        let window = self.fade_out;
        let seconds = window.duration_secs as f64;

        let (first, last) = match (records.first(), records.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                return Err(TrackError::TrackTooShort {
                    duration: 0.0,
                    fade_out: window.duration_secs,
                })
            }
        };

        let duration = last.elapsed_since(first.timestamp);
        if duration < seconds {
            return Err(TrackError::TrackTooShort {
                duration,
                fade_out: window.duration_secs,
            });
        }

        let last_index = records.len() - 1;
        let mut index = records
            .len()
            .saturating_sub(window.duration_secs as usize + 1);

        while index < last_index {
            let record = &records[index];
            let speed = record.speed / 3600.0;
            let deceleration = window.rate(speed);
            let covered = speed * seconds - deceleration * seconds * seconds / 2.0;
            if covered >= last.distance - record.distance {
                break;
            }
            index += 1;
        }

        debug!(
            index,
            records = records.len(),
            fade_out_secs = window.duration_secs,
            "fade-out start located"
        );
        Ok(index)
    }
}
