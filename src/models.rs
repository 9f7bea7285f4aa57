use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::track::wave::SlopeOptions;

/// Sports fitsynth can synthesize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Run,
    Ride,
}

impl ActivityType {
    /// Display name, also written into the activity_type developer field
    pub fn name(&self) -> &'static str {
        match self {
            ActivityType::Run => "Run",
            ActivityType::Ride => "Ride",
        }
    }

    /// FIT sport enum value
    pub fn fit_sport(&self) -> u8 {
        match self {
            ActivityType::Run => 1,
            ActivityType::Ride => 2,
        }
    }

    /// Gentle slopes used most of the time
    pub fn default_common_speed(&self) -> SlopeOptions {
        match self {
            ActivityType::Run => SlopeOptions {
                slope: 0.4,
                amplitude: 1.5,
                min_period: 20,
                max_period: 50,
            },
            ActivityType::Ride => SlopeOptions {
                slope: 0.6,
                amplitude: 2.5,
                min_period: 30,
                max_period: 60,
            },
        }
    }

    /// Steeper slopes picked occasionally
    pub fn default_rare_speed(&self) -> SlopeOptions {
        match self {
            ActivityType::Run => SlopeOptions {
                slope: 1.0,
                amplitude: 2.5,
                min_period: 15,
                max_period: 30,
            },
            ActivityType::Ride => SlopeOptions {
                slope: 1.2,
                amplitude: 4.0,
                min_period: 20,
                max_period: 40,
            },
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActivityType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "run" | "running" => Ok(ActivityType::Run),
            "ride" | "cycling" | "bike" => Ok(ActivityType::Ride),
            other => Err(ConfigError::Parse {
                field: "activity_type".to_string(),
                reason: format!("unknown activity type '{}' (expected run or ride)", other),
            }),
        }
    }
}

/// Descriptive data of one synthesized activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityMetadata {
    pub name: String,
    pub description: String,
    pub activity_type: ActivityType,
    pub start: DateTime<Utc>,
}
