use std::{io, path::PathBuf};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot read config {path}: {source}")]
    ConfigNotReadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot parse config: {0}")]
    ConfigMalformed(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    ConfigInvalid(String),
    #[error("cannot create influx client: {0}")]
    SinkInitFailed(String),
    #[error("weather api unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("weather api request timed out")]
    UpstreamTimeout,
    #[error("cannot decode weather api response: {0}")]
    UpstreamMalformed(#[source] serde_json::Error),
    #[error("influx unavailable: {0}")]
    SinkUnavailable(String),
    #[error("influx rejected write ({status}): {body}")]
    SinkRejected { status: u16, body: String },
}

impl Error {
    /// Name of the error kind, as it appears in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::ConfigNotReadable { .. } => "ConfigNotReadable",
            Error::ConfigMalformed(_) => "ConfigMalformed",
            Error::ConfigInvalid(_) => "ConfigInvalid",
            Error::SinkInitFailed(_) => "SinkInitFailed",
            Error::UpstreamUnavailable(_) => "UpstreamUnavailable",
            Error::UpstreamTimeout => "UpstreamTimeout",
            Error::UpstreamMalformed(_) => "UpstreamMalformed",
            Error::SinkUnavailable(_) => "SinkUnavailable",
            Error::SinkRejected { .. } => "SinkRejected",
        }
    }
}
