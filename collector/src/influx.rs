use std::time::Duration;

use common::Measurement;
use log::{debug, info};
use reqwest::{header::CONTENT_TYPE, Url};

use crate::config::SinkConfig;
use crate::error::{Error, Result};
use crate::poller::Sink;

pub const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

fn request_error(err: reqwest::Error) -> Error {
    Error::SinkUnavailable(err.to_string())
}

/// Writes measurements through the InfluxDB 1.x `/write` endpoint.
///
/// One client is created at startup and reused for every write. Failed writes are not retried.
pub struct InfluxClient {
    client: reqwest::Client,
    write_url: Url,
}

impl InfluxClient {
    pub fn new(config: &SinkConfig) -> Result<Self> {
        Self::with_timeout(config, WRITE_TIMEOUT)
    }

    pub fn with_timeout(config: &SinkConfig, timeout: Duration) -> Result<Self> {
        let mut base = config.endpoint.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let mut write_url = base
            .join("write")
            .map_err(|e| Error::SinkInitFailed(e.to_string()))?;
        write_url
            .query_pairs_mut()
            .append_pair("db", &config.database)
            .append_pair("precision", "s");

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::SinkInitFailed(e.to_string()))?;

        Ok(Self { client, write_url })
    }

    /// Sends a batch holding exactly `mes`.
    pub async fn write(&self, mes: &Measurement) -> Result<()> {
        let line = mes.to_line_protocol();
        debug!("writing to influx: {line}");

        let res = self
            .client
            .post(self.write_url.clone())
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(line)
            .send()
            .await
            .map_err(request_error)?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(Error::SinkRejected {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        info!(
            "wrote measurement: ts={} temperature={:?} humidity={:?} pressure={:?}",
            mes.observed_at.timestamp(),
            mes.temperature_celsius,
            mes.relative_humidity_percent,
            mes.pressure_hpa
        );
        Ok(())
    }
}

impl Sink for InfluxClient {
    async fn write(&self, mes: &Measurement) -> Result<()> {
        InfluxClient::write(self, mes).await
    }
}
