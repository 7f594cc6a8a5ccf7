//! ArcGIS geoprocessing adapter for the terrain and elevation profile services

use crate::ports::GeoprocessingService;
use async_trait::async_trait;
use geoflow_core::error::{GeoflowError, Result};
use geoflow_core::models::{JobId, OutputSelector, ProfileRequest, RemoteJobStatus, StatusReport};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

/// Profile service speaking the ArcGIS GP REST job protocol
pub struct EsriProfileService {
    /// Task URL, e.g. ".../GPServer/Profile"
    base_url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl EsriProfileService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, context: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .query(&[("f", "json")])
            .send()
            .await
            .map_err(|e| GeoflowError::transport(context, e))?;

        read_body(response, context).await
    }
}

#[async_trait]
impl GeoprocessingService for EsriProfileService {
    type Request = ProfileRequest;
    type Output = Vec<[f64; 3]>;

    async fn submit(&self, request: &ProfileRequest) -> Result<JobId> {
        let polyline = feature_set(request)?.to_string();
        let sample_distance = request.sample_distance.to_string();
        let form = [
            ("f", "json"),
            ("polyline", polyline.as_str()),
            ("dem", request.dem.as_str()),
            ("sampleDistance", sample_distance.as_str()),
        ];

        let response = self
            .client
            .post(format!("{}/submitJob", self.base_url))
            .form(&form)
            .send()
            .await
            .map_err(|e| GeoflowError::transport("submitting profile job", e))?;

        let submitted: SubmitResponse = read_body(response, "submitting profile job").await?;
        tracing::info!(
            job_id = %submitted.job_id,
            status = ?submitted.job_status,
            sample_distance = request.sample_distance,
            "Submitted profile job"
        );
        Ok(JobId::new(submitted.job_id))
    }

    async fn poll_once(&self, job_id: &JobId) -> Result<StatusReport> {
        let url = format!("{}/jobs/{}", self.base_url, job_id);
        let body: JobStatusResponse = self.get_json(&url, "checking profile job status").await?;
        Ok(body.into_report())
    }

    async fn fetch_result(&self, job_id: &JobId, selector: OutputSelector) -> Result<Vec<[f64; 3]>> {
        let url = format!("{}/jobs/{}/results/{}", self.base_url, job_id, selector);
        let body: Value = self.get_json(&url, "fetching profile result").await?;
        let samples = parse_samples(&body)?;
        tracing::debug!(job_id = %job_id, samples = samples.len(), "Fetched profile samples");
        Ok(samples)
    }
}

/// Decode a response body, mapping non-success statuses and ESRI error
/// envelopes to `RemoteResponse`
async fn read_body<T: DeserializeOwned>(response: reqwest::Response, context: &str) -> Result<T> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| GeoflowError::transport(context, e))?;

    if !status.is_success() {
        return Err(GeoflowError::RemoteResponse { status: status.as_u16(), body: text });
    }

    decode(&text)
}

fn decode<T: DeserializeOwned>(text: &str) -> Result<T> {
    let value: Value = serde_json::from_str(text)?;
    if let Some(error) = value.get("error") {
        let envelope: ErrorEnvelope = serde_json::from_value(error.clone())?;
        return Err(GeoflowError::RemoteResponse {
            status: envelope.code.unwrap_or(500),
            body: envelope.message,
        });
    }
    Ok(serde_json::from_value(value)?)
}

/// Build the `polyline` input parameter as an ESRI feature set
fn feature_set(request: &ProfileRequest) -> Result<Value> {
    let wkid = wkid_of(&request.crs)?;
    Ok(json!({
        "geometryType": "esriGeometryPolyline",
        "features": [{
            "geometry": {
                "paths": [request.coordinates],
                "spatialReference": { "wkid": wkid }
            }
        }],
        "sr": { "wkid": wkid }
    }))
}

fn wkid_of(code: &str) -> Result<u32> {
    let trimmed = code.trim();
    let digits = match trimmed.get(..5) {
        Some(prefix) if prefix.eq_ignore_ascii_case("epsg:") => &trimmed[5..],
        _ => trimmed,
    };
    digits
        .parse()
        .map_err(|_| GeoflowError::invalid_input("crs", format!("'{}' has no EPSG number", code)))
}

/// Extract `[x, y, z]` samples from a result parameter body.
///
/// Accepts both `{ value: { features } }` and a bare `{ features }`. Point
/// features take z from `attributes.Z`, falling back to `geometry.z`;
/// polyline features contribute every three-dimensional path vertex.
/// Samples without an elevation are skipped.
fn parse_samples(body: &Value) -> Result<Vec<[f64; 3]>> {
    let features = body
        .get("value")
        .and_then(|v| v.get("features"))
        .or_else(|| body.get("features"))
        .and_then(Value::as_array)
        .ok_or_else(|| GeoflowError::Serialization("Result has no feature list".to_string()))?;

    let mut samples = Vec::new();
    for feature in features {
        let geometry: ResultGeometry = serde_json::from_value(
            feature.get("geometry").cloned().unwrap_or(Value::Null),
        )?;

        match geometry {
            ResultGeometry::Point { x, y, z } => {
                let z = feature
                    .get("attributes")
                    .and_then(|a| a.get("Z"))
                    .and_then(Value::as_f64)
                    .or(z);
                match z {
                    Some(z) => samples.push([x, y, z]),
                    None => tracing::debug!(x, y, "Dropping profile point without elevation"),
                }
            }
            ResultGeometry::Polyline { paths } => {
                for vertex in paths.into_iter().flatten() {
                    match vertex.as_slice() {
                        [x, y, z, ..] => samples.push([*x, *y, *z]),
                        _ => tracing::debug!(?vertex, "Dropping profile vertex without elevation"),
                    }
                }
            }
        }
    }

    Ok(samples)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    job_id: String,
    job_status: RemoteJobStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobStatusResponse {
    job_status: RemoteJobStatus,
    #[serde(default)]
    messages: Vec<JobMessage>,
}

impl JobStatusResponse {
    fn into_report(self) -> StatusReport {
        let messages = self.messages.into_iter().map(|m| m.description).collect();
        StatusReport::new(self.job_status.into()).with_messages(messages)
    }
}

#[derive(Debug, Deserialize)]
struct JobMessage {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    code: Option<u16>,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResultGeometry {
    Point { x: f64, y: f64, z: Option<f64> },
    Polyline { paths: Vec<Vec<Vec<f64>>> },
}
