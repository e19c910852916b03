//! HTTP export of room telemetry.

use std::time::Duration;

use doodle_room::{Telemetry, TelemetryError, TelemetryEvent};
use serde::Serialize;

/// Path for roster and turn-holder changes.
pub const ROOM_STATUS_PATH: &str = "rooms/update-room-status";
/// Path for turns that ran out of time.
pub const TIMEOUT_PATH: &str = "games/handle-timeout/kalambury";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Posts each event as JSON to a collector.
///
/// One request per event, no retries. A non-2xx answer is an error.
#[derive(Debug, Clone)]
pub struct HttpTelemetry {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTelemetry {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TelemetryError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TelemetryError::Request(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The full URL an event is posted to.
    pub fn url_for(&self, event: &TelemetryEvent) -> String {
        let path = match event {
            TelemetryEvent::RoomStatus(_) => ROOM_STATUS_PATH,
            TelemetryEvent::Timeout(_) => TIMEOUT_PATH,
        };
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn post<B: Serialize>(&self, url: String, body: &B) -> Result<(), TelemetryError> {
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| TelemetryError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TelemetryError::Status(status.as_u16()));
        }
        tracing::trace!(%url, "telemetry delivered");
        Ok(())
    }
}

impl Telemetry for HttpTelemetry {
    async fn report(&self, event: TelemetryEvent) -> Result<(), TelemetryError> {
        let url = self.url_for(&event);
        match &event {
            TelemetryEvent::RoomStatus(report) => self.post(url, report).await,
            TelemetryEvent::Timeout(report) => self.post(url, report).await,
        }
    }
}

/// The exporter a server runs with: HTTP when a collector URL is
/// configured, nothing otherwise.
#[derive(Debug, Clone, Default)]
pub enum ServerTelemetry {
    #[default]
    Disabled,
    Http(HttpTelemetry),
}

impl ServerTelemetry {
    /// HTTP export to `export_url`, or disabled when it is `None`.
    pub fn from_url(export_url: Option<&str>) -> Result<Self, TelemetryError> {
        match export_url {
            Some(url) => Ok(Self::Http(HttpTelemetry::new(url)?)),
            None => Ok(Self::Disabled),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

impl Telemetry for ServerTelemetry {
    async fn report(&self, event: TelemetryEvent) -> Result<(), TelemetryError> {
        match self {
            Self::Disabled => Ok(()),
            Self::Http(http) => http.report(event).await,
        }
    }
}
