//! Track synthesis
//!
//! Turns a list of waypoints into a second-by-second track with a plausible
//! speed profile.

pub mod builder;
pub mod fade;
pub mod record;
pub mod wave;

pub use builder::{TrackBuilder, TrackSettings, TrackState};
pub use fade::{FadeEnvelope, FadeWindow};
pub use record::{Record, Waypoint};
pub use wave::{SlopeKind, SlopeOptions, SpeedWave};
