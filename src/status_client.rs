use crate::error::{ParseError, PingError, TransportError};
use crate::types::{PingResult, PositionSample};
use futures::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

/// One position report, sent as a form-encoded POST body
#[derive(Debug, Clone, PartialEq)]
pub struct PositionReport {
    pub device_id: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl PositionReport {
    /// Body fields in wire order: `deviceId`, `lat`, `lng`
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("deviceId", self.device_id.clone()),
            ("lat", self.latitude.to_string()),
            ("lng", self.longitude.to_string()),
        ]
    }
}

/// Remote status endpoint capability: deliver a report, hand back the raw
/// response body.
pub trait StatusEndpoint: Send + Sync {
    fn post_report(&self, report: PositionReport) -> BoxFuture<'static, Result<String, TransportError>>;
}

/// Status endpoint reached over HTTP with reqwest.
///
/// # Error Handling
/// - Timeout: `TransportError::Timeout`
/// - Non-2xx status: `TransportError::HttpStatus`
/// - Connection or body failure: `Request` / `Body`
///
/// No retries; the next scheduled tick is the retry.
pub struct HttpStatusEndpoint {
    client: reqwest::Client,
    url: String,
}

impl HttpStatusEndpoint {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("proximity_alert/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                log::warn!(
                    "[status] client builder failed ({}), falling back to defaults without a {:?} timeout",
                    e,
                    timeout
                );
                reqwest::Client::new()
            });

        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl StatusEndpoint for HttpStatusEndpoint {
    fn post_report(&self, report: PositionReport) -> BoxFuture<'static, Result<String, TransportError>> {
        let request = self.client.post(&self.url).form(&report.form_fields());

        async move {
            let response = request.send().await.map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Request(e.to_string())
                }
            })?;

            let status = response.status();
            if !status.is_success() {
                return Err(TransportError::HttpStatus(status.as_u16()));
            }

            response.text().await.map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Body(e.to_string())
                }
            })
        }
        .boxed()
    }
}

/// Sends the cached position on each tick and interprets the reply
pub struct RemoteStatusClient {
    endpoint: Arc<dyn StatusEndpoint>,
    device_id: String,
}

impl RemoteStatusClient {
    pub fn new(endpoint: Arc<dyn StatusEndpoint>, device_id: impl Into<String>) -> Self {
        Self {
            endpoint,
            device_id: device_id.into(),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub async fn ping(&self, sample: &PositionSample) -> Result<PingResult, PingError> {
        let report = PositionReport {
            device_id: self.device_id.clone(),
            latitude: sample.latitude,
            longitude: sample.longitude,
        };
        let body = self.endpoint.post_report(report).await?;
        Ok(parse_ping_body(&body)?)
    }
}

/// Span from the first `{` to the last `}` of a mixed-content body
pub fn extract_json_span(body: &str) -> Option<&str> {
    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&body[start..=end])
}

/// Parse a status response that may wrap its JSON object in HTML or other
/// text.
///
/// Fields are loosely typed: integers, floats (rounded) and numeric strings
/// are accepted. `minDistance` takes precedence over `distance` when both
/// keys are present. A distance that is missing, negative or unparseable is
/// absent; the `within*` counts fall back to 0 the same way. Values beyond
/// `u32::MAX` saturate.
pub fn parse_ping_body(body: &str) -> Result<PingResult, ParseError> {
    let span = extract_json_span(body).ok_or(ParseError::NoJsonSpan)?;
    let fields: Map<String, Value> =
        serde_json::from_str(span).map_err(|e| ParseError::Malformed(e.to_string()))?;

    let distance = ["minDistance", "distance"]
        .iter()
        .find_map(|key| fields.get(*key).filter(|v| !v.is_null()))
        .and_then(coerce_count);

    Ok(PingResult {
        distance,
        within150: count_field(&fields, "within150"),
        within200: count_field(&fields, "within200"),
        within500: count_field(&fields, "within500"),
    })
}

fn count_field(fields: &Map<String, Value>, key: &str) -> u32 {
    fields.get(key).and_then(coerce_count).unwrap_or(0)
}

/// Coerce a loosely typed JSON value into a non-negative whole number
fn coerce_count(value: &Value) -> Option<u32> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !raw.is_finite() || raw < 0.0 {
        return None;
    }

    // saturate: anything past u32::MAX is still "far away"
    Some(raw.round().min(f64::from(u32::MAX)) as u32)
}
