//! Face matching via an external vision API
//!
//! Two-phase flow: detect a single face in the uploaded photo, then ask the
//! vision service to compare it against the faces detected in the registered
//! students' profile photos. Only candidates at or above
//! [`SIMILARITY_THRESHOLD`] are reported.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sdir_common::config::VisionConfig;
use sdir_common::StudentRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("sdir/", env!("CARGO_PKG_VERSION"));

/// Minimum confidence for a candidate to count as a match
pub const SIMILARITY_THRESHOLD: f64 = 0.60;

/// Vision matcher errors
#[derive(Debug, Error)]
pub enum FaceError {
    #[error("No face detected in the uploaded photo")]
    NoFaceDetected,

    #[error("Multiple faces detected; upload a photo with exactly one face")]
    MultipleFacesDetected,

    #[error("The uploaded data is not a readable image")]
    InvalidImage,

    #[error("No registered student matched the uploaded photo")]
    NoSimilarMatch,

    #[error("No registered profile photo contains a detectable face")]
    NoRegisteredFaces,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// A student matched by face similarity
#[derive(Debug, Clone, Serialize)]
pub struct FaceMatch {
    pub student: StudentRecord,
    pub confidence: f64,
    pub similarity: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetectedFace {
    face_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SimilarCandidate {
    face_id: String,
    confidence: f64,
}

/// Client for the external face detection and comparison service
pub struct FaceClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl FaceClient {
    pub fn new(config: &VisionConfig) -> Result<Self, FaceError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FaceError::Network(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Detect faces in an image and return their face ids
    async fn detect(&self, image: &[u8]) -> Result<Vec<String>, FaceError> {
        let url = format!("{}/face/v1.0/detect", self.endpoint);
        let response = self
            .http
            .post(&url)
            .query(&[
                ("returnFaceId", "true"),
                ("recognitionModel", "recognition_04"),
                ("detectionModel", "detection_01"),
            ])
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .header("Content-Type", "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await
            .map_err(|e| FaceError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST {
            return Err(FaceError::InvalidImage);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FaceError::Api(status.as_u16(), body));
        }

        let faces: Vec<DetectedFace> = response
            .json()
            .await
            .map_err(|e| FaceError::Parse(e.to_string()))?;
        Ok(faces.into_iter().map(|f| f.face_id).collect())
    }

    /// Detect exactly one face in the probe image
    async fn detect_single(&self, image: &[u8]) -> Result<String, FaceError> {
        let mut faces = self.detect(image).await?;
        match faces.len() {
            0 => Err(FaceError::NoFaceDetected),
            1 => Ok(faces.remove(0)),
            _ => Err(FaceError::MultipleFacesDetected),
        }
    }

    /// Compare one face against a set of candidate faces
    async fn find_similars(
        &self,
        face_id: &str,
        candidate_ids: &[String],
    ) -> Result<Vec<SimilarCandidate>, FaceError> {
        let url = format!("{}/face/v1.0/findsimilars", self.endpoint);
        let body = serde_json::json!({
            "faceId": face_id,
            "faceIds": candidate_ids,
            "maxNumOfCandidatesReturned": 10,
            "mode": "matchPerson",
        });
        let response = self
            .http
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| FaceError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FaceError::Api(status.as_u16(), body));
        }

        response
            .json()
            .await
            .map_err(|e| FaceError::Parse(e.to_string()))
    }

    /// Match an uploaded photo against the registered students' profile photos
    pub async fn find_similar_students(
        &self,
        photo: &[u8],
        students: &[StudentRecord],
    ) -> Result<Vec<FaceMatch>, FaceError> {
        let probe_id = self.detect_single(photo).await?;

        // Faces from registered photos; students without a detectable face
        // are skipped rather than failing the whole search.
        let mut candidate_ids = Vec::new();
        let mut by_face_id: HashMap<String, &StudentRecord> = HashMap::new();
        for student in students {
            let Some(avatar) = student.avatar_url.as_deref() else {
                continue;
            };
            let Some(bytes) = data_url_bytes(avatar) else {
                continue;
            };
            match self.detect(&bytes).await {
                Ok(face_ids) => {
                    if let Some(face_id) = face_ids.into_iter().next() {
                        candidate_ids.push(face_id.clone());
                        by_face_id.insert(face_id, student);
                    }
                }
                Err(e) => {
                    warn!(student_id = record_id(student), "Skipping profile photo: {e}");
                }
            }
        }

        if candidate_ids.is_empty() {
            return Err(FaceError::NoRegisteredFaces);
        }
        debug!(candidates = candidate_ids.len(), "Comparing against registered faces");

        let candidates = self.find_similars(&probe_id, &candidate_ids).await?;

        let mut matches: Vec<FaceMatch> = candidates
            .into_iter()
            .filter(|c| c.confidence >= SIMILARITY_THRESHOLD)
            .filter_map(|c| {
                by_face_id.get(&c.face_id).map(|student| FaceMatch {
                    student: (*student).clone(),
                    confidence: c.confidence,
                    similarity: (c.confidence * 100.0).round() as i32,
                })
            })
            .collect();

        if matches.is_empty() {
            return Err(FaceError::NoSimilarMatch);
        }

        matches.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        Ok(matches)
    }
}

/// Store-assigned id for log lines; records not yet created have none
fn record_id(record: &StudentRecord) -> &str {
    record.id.as_deref().unwrap_or("-")
}

/// Decode the payload of a base64 data URL; returns None for any other form
fn data_url_bytes(url: &str) -> Option<Vec<u8>> {
    let rest = url.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    if !meta.ends_with(";base64") {
        return None;
    }
    BASE64.decode(payload).ok()
}
