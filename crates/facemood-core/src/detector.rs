//! Face detection via the Google Cloud Vision `images:annotate` REST endpoint.
//!
//! Sends the image as base64 with a single `FACE_DETECTION` feature request
//! and maps the returned face annotations onto [`FaceRecord`]s.

use crate::types::{FaceRecord, Likelihood, Vertex};
use base64::Engine;
use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";
pub const DEFAULT_MAX_RESULTS: u32 = 4;

const FACE_DETECTION_FEATURE: &str = "FACE_DETECTION";

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("vision API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("vision API error {code}: {message}")]
    Api { code: i32, message: String },
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Anything that turns image bytes into face records.
pub trait FaceDetector {
    fn detect(&self, image: &[u8], max_results: u32) -> Result<Vec<FaceRecord>, DetectorError>;
}

/// Connection settings for [`VisionClient`].
#[derive(Debug, Clone)]
pub struct VisionConfig {
    pub endpoint: String,
    /// Sent as the `key` query parameter.
    pub api_key: Option<String>,
    /// Sent as `Authorization: Bearer <token>`.
    pub access_token: Option<String>,
    /// `None` blocks until the service answers.
    pub timeout: Option<Duration>,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            access_token: None,
            timeout: None,
        }
    }
}

// --- Wire format ---

#[derive(Serialize)]
struct AnnotateRequest<'a> {
    requests: [ImageRequest<'a>; 1],
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    image: ImageContent,
    features: [Feature<'a>; 1],
}

#[derive(Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Feature<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    max_results: u32,
}

#[derive(Deserialize, Default)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageResponse>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    #[serde(default)]
    face_annotations: Vec<FaceAnnotation>,
    error: Option<ApiStatus>,
}

#[derive(Deserialize)]
struct ApiStatus {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FaceAnnotation {
    #[serde(default)]
    bounding_poly: BoundingPoly,
    #[serde(default)]
    detection_confidence: f32,
    #[serde(default)]
    anger_likelihood: Likelihood,
    #[serde(default)]
    joy_likelihood: Likelihood,
    #[serde(default)]
    surprise_likelihood: Likelihood,
    #[serde(default)]
    sorrow_likelihood: Likelihood,
}

#[derive(Deserialize, Default)]
struct BoundingPoly {
    #[serde(default)]
    vertices: Vec<Vertex>,
}

impl From<FaceAnnotation> for FaceRecord {
    fn from(a: FaceAnnotation) -> Self {
        FaceRecord {
            bounding_poly: a.bounding_poly.vertices,
            detection_confidence: a.detection_confidence,
            anger: a.anger_likelihood,
            joy: a.joy_likelihood,
            surprise: a.surprise_likelihood,
            sorrow: a.sorrow_likelihood,
        }
    }
}

/// Blocking Vision API client.
pub struct VisionClient {
    client: Client,
    config: VisionConfig,
}

impl VisionClient {
    pub fn new(config: VisionConfig) -> Result<Self, DetectorError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        if config.api_key.is_none() && config.access_token.is_none() {
            tracing::warn!("no API key or access token configured; request will be unauthenticated");
        }
        Ok(Self { client, config })
    }

    fn request_body(image: &[u8], max_results: u32) -> AnnotateRequest<'static> {
        let content = base64::engine::general_purpose::STANDARD.encode(image);
        AnnotateRequest {
            requests: [ImageRequest {
                image: ImageContent { content },
                features: [Feature {
                    kind: FACE_DETECTION_FEATURE,
                    max_results,
                }],
            }],
        }
    }
}

impl FaceDetector for VisionClient {
    fn detect(&self, image: &[u8], max_results: u32) -> Result<Vec<FaceRecord>, DetectorError> {
        tracing::debug!(
            endpoint = %self.config.endpoint,
            bytes = image.len(),
            max_results,
            "sending face detection request"
        );

        let mut request = self
            .client
            .post(&self.config.endpoint)
            .json(&Self::request_body(image, max_results));
        if let Some(key) = &self.config.api_key {
            request = request.query(&[("key", key)]);
        }
        if let Some(token) = &self.config.access_token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(DetectorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text()?;
        let parsed: AnnotateResponse =
            serde_json::from_str(&text).map_err(|e| DetectorError::Decode(e.to_string()))?;

        let first = parsed.responses.into_iter().next().unwrap_or_default();
        if let Some(err) = first.error {
            return Err(DetectorError::Api {
                code: err.code,
                message: err.message,
            });
        }

        let faces: Vec<FaceRecord> = first.face_annotations.into_iter().map(FaceRecord::from).collect();
        tracing::info!(faces = faces.len(), "face detection complete");
        Ok(faces)
    }
}
