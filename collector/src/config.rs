use std::{fmt, path::Path, time::Duration};

use reqwest::Url;
use serde::Deserialize;

use crate::error::{Error, Result};

pub const DEFAULT_DATABASE: &str = "sensors";

#[derive(Debug, Clone)]
pub struct Config {
    pub interval: Duration,
    pub source: SourceConfig,
    pub sink: SinkConfig,
}

#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub latitude: f64,
    pub longitude: f64,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct SinkConfig {
    pub endpoint: Url,
    pub database: String,
    /// Not passed to the influx client.
    pub token: Option<String>,
}

// on-disk layout, everything optional so that missing keys are reported as invalid
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    influx: RawInflux,
    #[serde(default)]
    weathermap: RawWeatherMap,
    interval: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawInflux {
    server: Option<String>,
    token: Option<String>,
    database: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawWeatherMap {
    latitude: Option<f64>,
    longitude: Option<f64>,
    apikey: Option<String>,
}

fn required<T>(value: Option<T>, key: &str) -> Result<T> {
    value.ok_or_else(|| Error::ConfigInvalid(format!("missing `{key}`")))
}

impl Config {
    /// Reads and validates the config file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let buf = std::fs::read(path).map_err(|source| Error::ConfigNotReadable {
            path: path.to_owned(),
            source,
        })?;
        Self::from_slice(&buf)
    }

    pub fn from_slice(buf: &[u8]) -> Result<Self> {
        let raw: RawConfig = serde_yaml::from_slice(buf)?;
        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> Result<Self> {
        let interval = required(raw.interval, "interval")?;
        let interval = humantime::parse_duration(interval.trim())
            .map_err(|e| Error::ConfigInvalid(format!("interval {interval:?}: {e}")))?;
        if interval.is_zero() {
            return Err(Error::ConfigInvalid("interval must be positive".into()));
        }

        let latitude = required(raw.weathermap.latitude, "weathermap.latitude")?;
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::ConfigInvalid(format!(
                "latitude {latitude} not in [-90, 90]"
            )));
        }
        let longitude = required(raw.weathermap.longitude, "weathermap.longitude")?;
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::ConfigInvalid(format!(
                "longitude {longitude} not in [-180, 180]"
            )));
        }
        let api_key = required(raw.weathermap.apikey, "weathermap.apikey")?;
        if api_key.trim().is_empty() {
            return Err(Error::ConfigInvalid("`weathermap.apikey` is empty".into()));
        }

        let server = required(raw.influx.server, "influx.server")?;
        let endpoint = Url::parse(server.trim())
            .map_err(|e| Error::ConfigInvalid(format!("influx.server {server:?}: {e}")))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(Error::ConfigInvalid(format!(
                "influx.server {server:?}: expected an http(s) url"
            )));
        }
        let database = raw
            .influx
            .database
            .filter(|db| !db.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());
        let token = raw.influx.token.filter(|t| !t.is_empty());

        Ok(Self {
            interval,
            source: SourceConfig {
                latitude,
                longitude,
                api_key,
            },
            sink: SinkConfig {
                endpoint,
                database,
                token,
            },
        })
    }
}

// secrets are never printed
impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "interval={} lat={} lon={} apikey=<redacted> influx={} db={} token={}",
            humantime::format_duration(self.interval),
            self.source.latitude,
            self.source.longitude,
            self.sink.endpoint,
            self.sink.database,
            if self.sink.token.is_some() { "<set>" } else { "<unset>" },
        )
    }
}
