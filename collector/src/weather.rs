use std::time::Duration;

use common::Conditions;
use log::debug;
use reqwest::{header::ACCEPT, Url};

use crate::config::SourceConfig;
use crate::error::{Error, Result};
use crate::poller::Source;

pub const API_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// only the fields we consume, everything else in the payload is ignored
#[derive(Debug, Default, serde::Deserialize)]
struct Payload {
    #[serde(default)]
    main: Option<Main>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct Main {
    #[serde(rename = "temp")]
    temperature: Option<f64>, // °C
    humidity: Option<f64>, // percent
    pressure: Option<f64>, // hPa
}

/// Decodes a current-weather response body.
pub fn decode(body: &[u8]) -> Result<Conditions> {
    let payload: Payload = serde_json::from_slice(body).map_err(Error::UpstreamMalformed)?;
    let main = payload.main.unwrap_or_default();
    Ok(Conditions::observed(
        main.temperature,
        main.humidity,
        main.pressure,
    ))
}

fn request_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::UpstreamTimeout
    } else {
        // the url carries the api key
        Error::UpstreamUnavailable(err.without_url().to_string())
    }
}

pub struct WeatherClient {
    client: reqwest::Client,
    url: Url,
}

impl WeatherClient {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        Self::with_endpoint(config, API_URL, REQUEST_TIMEOUT)
    }

    pub fn with_endpoint(config: &SourceConfig, base_url: &str, timeout: Duration) -> Result<Self> {
        let url = Url::parse_with_params(
            base_url,
            &[
                ("units", "metric".to_string()),
                ("lat", config.latitude.to_string()),
                ("lon", config.longitude.to_string()),
                ("appid", config.api_key.clone()),
            ],
        )
        .map_err(|e| Error::UpstreamUnavailable(format!("bad url {base_url:?}: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(request_error)?;

        Ok(Self { client, url })
    }

    /// Fetches the current conditions at the configured location.
    pub async fn fetch(&self) -> Result<Conditions> {
        let res = self
            .client
            .get(self.url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(request_error)?;

        let status = res.status();
        if !status.is_success() {
            return Err(Error::UpstreamUnavailable(format!("http status {status}")));
        }

        let body = res.bytes().await.map_err(request_error)?;
        let conditions = decode(&body)?;
        debug!("weather api: {conditions:?}");
        Ok(conditions)
    }
}

impl Source for WeatherClient {
    async fn fetch(&self) -> Result<Conditions> {
        WeatherClient::fetch(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::Stub;

    fn source() -> SourceConfig {
        SourceConfig {
            latitude: 48.14,
            longitude: 11.58,
            api_key: "K".to_string(),
        }
    }

    #[test]
    fn decode_keeps_positive_values() {
        let c = decode(br#"{"main":{"temp":20.5,"humidity":55,"pressure":1013}}"#).unwrap();
        assert_eq!(c.temperature, Some(20.5));
        assert_eq!(c.humidity, Some(55.0));
        assert_eq!(c.pressure, Some(1013.0));
    }

    #[test]
    fn decode_drops_negative_temperature() {
        let c = decode(br#"{"main":{"temp":-3.2,"humidity":80,"pressure":1002}}"#).unwrap();
        assert_eq!(c.temperature, None);
        assert_eq!(c.humidity, Some(80.0));
        assert_eq!(c.pressure, Some(1002.0));
    }

    #[test]
    fn decode_tolerates_unknown_and_missing_fields() {
        let body = br#"{
            "coord": {"lon": 11.58, "lat": 48.14},
            "weather": [{"id": 800, "main": "Clear"}],
            "main": {"temp": 12.1, "feels_like": 11.0, "pressure": null},
            "name": "Munich"
        }"#;
        let c = decode(body).unwrap();
        assert_eq!(c.temperature, Some(12.1));
        assert_eq!(c.humidity, None);
        assert_eq!(c.pressure, None);

        assert!(decode(br#"{"cod": 200}"#).unwrap().is_empty());
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = decode(b"<html>bad gateway</html>").unwrap_err();
        assert_eq!(err.kind(), "UpstreamMalformed");

        let err = decode(br#"{"main":{"temp":"warm"}}"#).unwrap_err();
        assert_eq!(err.kind(), "UpstreamMalformed");
    }

    #[test]
    fn request_url_carries_location_and_units() {
        let client = WeatherClient::new(&source()).unwrap();
        assert_eq!(
            client.url.as_str(),
            "https://api.openweathermap.org/data/2.5/weather?units=metric&lat=48.14&lon=11.58&appid=K"
        );
    }

    #[tokio::test]
    async fn fetch_decodes_response() {
        let mut stub = Stub::respond(200, r#"{"main":{"temp":20.5,"humidity":55,"pressure":1013}}"#).await;
        let client = WeatherClient::with_endpoint(&source(), &stub.url, REQUEST_TIMEOUT).unwrap();

        let c = client.fetch().await.unwrap();
        assert_eq!(c.temperature, Some(20.5));

        let req = stub.request().await;
        assert!(req.starts_with("GET /?units=metric&lat=48.14&lon=11.58&appid=K "));
    }

    #[tokio::test]
    async fn fetch_fails_on_error_status() {
        let stub = Stub::respond(503, "").await;
        let client = WeatherClient::with_endpoint(&source(), &stub.url, REQUEST_TIMEOUT).unwrap();

        let err = client.fetch().await.unwrap_err();
        assert_eq!(err.kind(), "UpstreamUnavailable");
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn fetch_times_out() {
        let stub = Stub::silent().await;
        let client =
            WeatherClient::with_endpoint(&source(), &stub.url, Duration::from_millis(200)).unwrap();

        let err = client.fetch().await.unwrap_err();
        assert_eq!(err.kind(), "UpstreamTimeout");
    }
}
