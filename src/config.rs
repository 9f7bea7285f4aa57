use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::fit::types::Endianness;
use crate::logging::LogConfig;
use crate::models::{ActivityMetadata, ActivityType};
use crate::track::builder::{
    TrackSettings, DEFAULT_FADE_DURATION_SECS, DEFAULT_FADE_FRACTION, DEFAULT_RARE_SPEED_CHANCE,
};
use crate::track::wave::SlopeOptions;

/// Slowest desired speed accepted, km/h
pub const MIN_DESIRED_SPEED: f64 = 1.0;
/// Highest probability of a rare slope
pub const MAX_RARE_SPEED_CHANCE: f64 = 0.5;
/// Shortest fade duration accepted, seconds
pub const MIN_FADE_DURATION_SECS: u32 = 20;
/// Shortest slope period accepted, seconds
pub const MIN_SLOPE_PERIOD_SECS: u32 = 5;
/// Oldest start accepted, in calendar years before the current one
pub const MAX_START_AGE_YEARS: i32 = 10;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// What to synthesize
    pub activity: ActivityConfig,

    /// Device the activity is attributed to
    #[serde(default)]
    pub device: DeviceProfile,

    /// Output preferences
    #[serde(default)]
    pub output: OutputSettings,

    /// Logging
    #[serde(default)]
    pub logging: LogConfig,
}

/// Activity description and speed tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityConfig {
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub activity_type: ActivityType,

    /// Start time; the current time when absent
    pub start: Option<DateTime<Utc>>,

    /// Desired average speed in km/h
    pub desired_speed: f64,

    /// Probability of a rare slope, defaults to 0.1
    pub rare_speed_chance: Option<f64>,

    /// Fade duration before jitter, defaults to 45 s
    pub fade_duration_secs: Option<u32>,

    /// Share of speed faded at start and end, defaults to 0.5
    pub fade_fraction: Option<f64>,

    /// Generator seed for reproducible tracks
    pub seed: Option<u64>,

    /// Gentle slopes; activity-type defaults when absent
    pub common_speed: Option<SlopeOptions>,

    /// Steep slopes; activity-type defaults when absent
    pub rare_speed: Option<SlopeOptions>,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        ActivityConfig {
            name: "Morning Run".to_string(),
            description: String::new(),
            activity_type: ActivityType::Run,
            start: None,
            desired_speed: 10.0,
            rare_speed_chance: None,
            fade_duration_secs: None,
            fade_fraction: None,
            seed: None,
            common_speed: None,
            rare_speed: None,
        }
    }
}

impl ActivityConfig {
    /// Validate and turn into builder settings
    ///
    /// `now` stands in for a missing start time.
    pub fn resolve(&self, now: DateTime<Utc>) -> std::result::Result<TrackSettings, ConfigError> {
        if let Some(start) = self.start {
            validate_start(start, now)?;
        }

        if !(self.desired_speed >= MIN_DESIRED_SPEED) {
            return Err(ConfigError::out_of_range(
                "activity.desired_speed",
                format!("{} km/h is below {} km/h", self.desired_speed, MIN_DESIRED_SPEED),
            ));
        }

        let rare_speed_chance = self.rare_speed_chance.unwrap_or(DEFAULT_RARE_SPEED_CHANCE);
        if !(0.0..=MAX_RARE_SPEED_CHANCE).contains(&rare_speed_chance) {
            return Err(ConfigError::out_of_range(
                "activity.rare_speed_chance",
                format!("{} isn't in [0, {}]", rare_speed_chance, MAX_RARE_SPEED_CHANCE),
            ));
        }

        let fade_duration_secs = self.fade_duration_secs.unwrap_or(DEFAULT_FADE_DURATION_SECS);
        if fade_duration_secs < MIN_FADE_DURATION_SECS {
            return Err(ConfigError::out_of_range(
                "activity.fade_duration_secs",
                format!("{}s is shorter than {}s", fade_duration_secs, MIN_FADE_DURATION_SECS),
            ));
        }

        let fade_fraction = self.fade_fraction.unwrap_or(DEFAULT_FADE_FRACTION);
        if !(0.0..=1.0).contains(&fade_fraction) {
            return Err(ConfigError::out_of_range(
                "activity.fade_fraction",
                format!("{} isn't in [0, 1]", fade_fraction),
            ));
        }

        let common_speed = self
            .common_speed
            .unwrap_or_else(|| self.activity_type.default_common_speed());
        validate_slope("activity.common_speed", &common_speed)?;

        let rare_speed = self
            .rare_speed
            .unwrap_or_else(|| self.activity_type.default_rare_speed());
        validate_slope("activity.rare_speed", &rare_speed)?;

        Ok(TrackSettings {
            start: self.start.unwrap_or(now),
            desired_speed: self.desired_speed,
            common_speed,
            rare_speed,
            rare_speed_chance,
            fade_duration_secs,
            fade_fraction,
            seed: self.seed,
        })
    }

    pub fn metadata(&self, start: DateTime<Utc>) -> ActivityMetadata {
        ActivityMetadata {
            name: self.name.clone(),
            description: self.description.clone(),
            activity_type: self.activity_type,
            start,
        }
    }
}

/// Start times are checked by calendar year, so a later hour today still passes
fn validate_start(start: DateTime<Utc>, now: DateTime<Utc>) -> std::result::Result<(), ConfigError> {
    if start.year() < now.year() - MAX_START_AGE_YEARS {
        return Err(ConfigError::out_of_range(
            "activity.start",
            format!("{} is more than {} years ago", start, MAX_START_AGE_YEARS),
        ));
    }
    if start.year() > now.year() {
        return Err(ConfigError::out_of_range(
            "activity.start",
            format!("{} is in the future", start),
        ));
    }
    Ok(())
}

fn validate_slope(field: &str, options: &SlopeOptions) -> std::result::Result<(), ConfigError> {
    if !(0.0..=std::f64::consts::FRAC_PI_2).contains(&options.slope) {
        return Err(ConfigError::out_of_range(
            field,
            format!("slope {} isn't in [0, pi/2]", options.slope),
        ));
    }
    if !(options.amplitude >= 0.0) || !options.amplitude.is_finite() {
        return Err(ConfigError::out_of_range(
            field,
            format!("amplitude {} must be a non-negative number", options.amplitude),
        ));
    }
    if options.min_period < MIN_SLOPE_PERIOD_SECS {
        return Err(ConfigError::out_of_range(
            field,
            format!("min_period {}s is shorter than {}s", options.min_period, MIN_SLOPE_PERIOD_SECS),
        ));
    }
    if options.min_period > options.max_period {
        return Err(ConfigError::out_of_range(
            field,
            format!(
                "min_period {}s exceeds max_period {}s",
                options.min_period, options.max_period
            ),
        ));
    }
    Ok(())
}

/// Recording device written into the file-id, device-info and developer fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceProfile {
    /// Version of the recording application
    pub app_version: u32,
    pub mobile_app_version: String,
    pub manufacturer: String,
    pub model: String,
    pub os_version: String,
    /// FIT manufacturer id
    pub manufacturer_id: u16,
    /// FIT product id
    pub product_id: u16,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        DeviceProfile {
            app_version: 1221988,
            mobile_app_version: "230.10 (1221988)".to_string(),
            manufacturer: "Xiaomi".to_string(),
            model: "Redmi Note 9 Pro".to_string(),
            os_version: "10".to_string(),
            manufacturer_id: 265,
            product_id: 102,
        }
    }
}

impl DeviceProfile {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.app_version == 0 {
            return Err(ConfigError::out_of_range("device.app_version", "must not be zero"));
        }
        let strings = [
            ("device.mobile_app_version", &self.mobile_app_version),
            ("device.manufacturer", &self.manufacturer),
            ("device.model", &self.model),
            ("device.os_version", &self.os_version),
        ];
        for (field, value) in strings {
            if value.trim().is_empty() {
                return Err(ConfigError::out_of_range(field, "must not be empty"));
            }
            if value.len() >= u8::MAX as usize {
                return Err(ConfigError::out_of_range(field, "must be shorter than 255 bytes"));
            }
        }
        Ok(())
    }
}

/// Output preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OutputSettings {
    /// Byte order of the FIT file
    pub endianness: Endianness,

    /// Default output path
    pub path: Option<PathBuf>,

    /// Leave developer fields out of the FIT file
    pub skip_developer_fields: bool,
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content =
            toml::to_string_pretty(self).with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".fitsynth")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::debug!(path = %config_path.display(), error = %err, "using default configuration");
                Self::default()
            }
        }
    }

    /// Check every section that has rules
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.activity.resolve(Utc::now())?;
        self.device.validate()
    }
}
