//! HTTP provider for the synthesis backend
//!
//! `POST {base}/generate/text-to-3d` and `/generate/texture` take a JSON
//! `{"prompt": ...}` body; `/generate/image-to-3d` takes a multipart upload
//! with a single `file` field. Success responses carry the raw asset bytes.
//! `GET {base}/` reports `{"status": "running", "gpu": bool}`.

use crate::config::KilnConfig;
use crate::provider::*;
use kiln_core::{KilnError, Result};
use kiln_media::NormalizedImage;
use serde::Deserialize;
use std::io::Read;
use std::time::Duration;

const UPLOAD_FILE_NAME: &str = "input_image.jpg";
const HEALTH_TIMEOUT_SECS: u64 = 5;
const RETRY_BASE_DELAY_MS: u64 = 500;

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
    #[serde(default)]
    gpu: bool,
}

pub struct HttpProvider {
    base_url: String,
    timeout: Duration,
    retries: u32,
}

impl HttpProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration, retries: u32) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            timeout,
            retries,
        }
    }

    pub fn from_config(config: &KilnConfig) -> Self {
        Self::new(
            config.backend.url.clone(),
            config.request_timeout(),
            config.backend.retries,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, modality: Modality) -> String {
        format!("{}/generate/{}", self.base_url, modality.endpoint())
    }

    fn send_once(&self, url: &str, request: &GenerateRequest) -> std::result::Result<Vec<u8>, ureq::Error> {
        let agent = build_agent(self.timeout);
        let response = match &request.payload {
            Payload::Text(prompt) => agent
                .post(url)
                .header("Content-Type", "application/json")
                .send_json(serde_json::json!({ "prompt": prompt }))?,
            Payload::Image(image) => {
                let boundary = format!("kiln-{}", uuid::Uuid::new_v4().simple());
                let body = multipart_body(&boundary, image);
                agent
                    .post(url)
                    .header(
                        "Content-Type",
                        &format!("multipart/form-data; boundary={}", boundary),
                    )
                    .send(&body[..])?
            }
        };

        let mut reader = response.into_body().into_reader();
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

impl GenerationProvider for HttpProvider {
    fn name(&self) -> &str {
        "http"
    }

    fn health_check(&self) -> Result<ProviderStatus> {
        let agent = build_agent(Duration::from_secs(HEALTH_TIMEOUT_SECS));
        let url = format!("{}/", self.base_url);

        let health = agent
            .get(&url)
            .call()
            .and_then(|mut ok| ok.body_mut().read_json::<HealthResponse>());

        Ok(match health {
            Ok(h) if h.status == "running" => ProviderStatus::Available { gpu: h.gpu },
            Ok(h) => ProviderStatus::Unavailable(format!("backend status '{}'", h.status)),
            Err(e) => ProviderStatus::Unavailable(e.to_string()),
        })
    }

    fn generate(&self, request: &GenerateRequest) -> Result<Vec<u8>> {
        let url = self.endpoint(request.modality);
        let attempts = self.retries as usize + 1;

        for attempt in 0..attempts {
            tracing::debug!(%url, attempt, "sending generation request");
            match self.send_once(&url, request) {
                Ok(bytes) => return Ok(bytes),
                Err(e) => {
                    if attempt + 1 < attempts && is_retryable_error(&e) {
                        tracing::debug!(error = %e, attempt, "retrying generation request");
                        sleep_backoff(attempt);
                        continue;
                    }
                    return Err(KilnError::GenerationError(format!(
                        "{} request failed: {}",
                        request.modality, e
                    )));
                }
            }
        }

        Err(KilnError::GenerationError(format!(
            "{} request failed after retries",
            request.modality
        )))
    }
}

/// Single-part `multipart/form-data` body with the image in field `file`
pub fn multipart_body(boundary: &str, image: &NormalizedImage) -> Vec<u8> {
    let content_type = image::guess_format(image.bytes())
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream");

    let mut body = Vec::with_capacity(image.bytes().len() + 256);
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            UPLOAD_FILE_NAME
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(image.bytes());
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

fn build_agent(timeout: Duration) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .proxy(None)
        .build();
    config.into()
}

fn is_retryable_error(e: &ureq::Error) -> bool {
    match e {
        ureq::Error::Timeout(_)
        | ureq::Error::Io(_)
        | ureq::Error::ConnectionFailed
        | ureq::Error::HostNotFound => true,
        ureq::Error::StatusCode(code) => matches!(code, 429 | 500 | 502 | 503 | 504),
        _ => false,
    }
}

fn sleep_backoff(attempt: usize) {
    let delay_ms = RETRY_BASE_DELAY_MS.saturating_mul(1u64 << attempt.min(16));
    std::thread::sleep(Duration::from_millis(delay_ms));
}
