//! Image Download Module
//!
//! Blocking HTTP fetch of image bytes with bounded retries and exponential
//! backoff on transient failures. The payload is validated against the
//! declared content type and known image magic bytes before anything tries
//! to decode it: providers have been seen returning HTML error pages with a
//! 200 status.

use tracing::{debug, warn};

use crate::config::DatasetConfig;
use crate::utils::backoff::Backoff;
use crate::utils::error::{MedPlantError, Result};

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_MAGIC: &[u8] = &[0xff, 0xd8, 0xff];
const GIF87A_MAGIC: &[u8] = b"GIF87a";
const GIF89A_MAGIC: &[u8] = b"GIF89a";

/// Minimum plausible size of an image payload header
const MIN_PAYLOAD_LEN: usize = 12;

/// Identify a payload by its leading magic bytes
pub fn sniff_image_format(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(PNG_MAGIC) {
        Some("PNG")
    } else if bytes.starts_with(JPEG_MAGIC) {
        Some("JPEG")
    } else if bytes.starts_with(GIF87A_MAGIC) || bytes.starts_with(GIF89A_MAGIC) {
        Some("GIF")
    } else {
        None
    }
}

/// Validate a response payload before decoding.
///
/// Checks, in order: the declared content type carries an `image/` prefix,
/// the payload is large enough to hold an image header, and the leading
/// bytes match a known image signature.
pub fn validate_payload(content_type: Option<&str>, bytes: &[u8], url: &str) -> Result<()> {
    match content_type {
        Some(ct) if ct.starts_with("image/") => {}
        Some(ct) => {
            return Err(MedPlantError::InvalidPayload(
                url.to_string(),
                format!("invalid content type: {}", ct),
            ));
        }
        None => {
            return Err(MedPlantError::InvalidPayload(
                url.to_string(),
                "missing content type".to_string(),
            ));
        }
    }

    if bytes.len() < MIN_PAYLOAD_LEN {
        return Err(MedPlantError::InvalidPayload(
            url.to_string(),
            "payload too small to be a valid image".to_string(),
        ));
    }

    if sniff_image_format(bytes).is_none() {
        return Err(MedPlantError::InvalidPayload(
            url.to_string(),
            "leading bytes match no known image signature".to_string(),
        ));
    }

    Ok(())
}

enum AttemptError {
    /// Connection problems, timeouts, 429 and 5xx responses
    Transient(String),
    /// Everything else; retrying would not help
    Fatal(MedPlantError),
}

/// Blocking image downloader with retry and backoff
pub struct Downloader {
    http: reqwest::blocking::Client,
    max_retries: u32,
    backoff: Backoff,
}

impl Downloader {
    /// Create a downloader from the dataset configuration
    pub fn new(config: &DatasetConfig) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| MedPlantError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            max_retries: config.max_retries,
            backoff: config.backoff(),
        })
    }

    /// Fetch and validate image bytes.
    ///
    /// Transient failures are retried up to the configured bound with
    /// exponentially increasing delays; validation failures are returned
    /// immediately since the payload will not improve on retry.
    pub fn fetch_image_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let mut last_error = String::new();

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                warn!(
                    "Attempt {}/{} for {} after: {}",
                    attempt + 1,
                    self.max_retries,
                    url,
                    last_error
                );
                self.backoff.sleep(attempt - 1);
            }

            match self.try_fetch(url) {
                Ok(bytes) => {
                    debug!("Downloaded {} bytes from {}", bytes.len(), url);
                    return Ok(bytes);
                }
                Err(AttemptError::Fatal(e)) => return Err(e),
                Err(AttemptError::Transient(message)) => last_error = message,
            }
        }

        Err(MedPlantError::Download(
            url.to_string(),
            format!("after {} attempts: {}", self.max_retries, last_error),
        ))
    }

    fn try_fetch(&self, url: &str) -> std::result::Result<Vec<u8>, AttemptError> {
        let response = self
            .http
            .get(url)
            .header("Accept", "image/jpeg,image/png,image/gif")
            .send()
            .map_err(|e| AttemptError::Transient(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 || status.is_server_error() {
            return Err(AttemptError::Transient(format!("status {}", status)));
        }
        if !status.is_success() {
            return Err(AttemptError::Fatal(MedPlantError::Download(
                url.to_string(),
                format!("status {}", status),
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let bytes = response
            .bytes()
            .map_err(|e| AttemptError::Transient(e.to_string()))?
            .to_vec();

        validate_payload(content_type.as_deref(), &bytes, url).map_err(AttemptError::Fatal)?;

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn jpeg_bytes() -> Vec<u8> {
        let img = image::DynamicImage::new_rgb8(8, 8);
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Jpeg)
            .unwrap();
        bytes
    }

    fn fast_config() -> DatasetConfig {
        DatasetConfig {
            max_retries: 3,
            backoff_base_ms: 1,
            backoff_cap_ms: 2,
            ..Default::default()
        }
    }

    fn serve_responses(responses: Vec<tiny_http::Response<Cursor<Vec<u8>>>>) -> String {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let url = format!("http://{}/image", server.server_addr().to_ip().unwrap());
        std::thread::spawn(move || {
            for response in responses {
                let request = match server.recv() {
                    Ok(r) => r,
                    Err(_) => return,
                };
                let _ = request.respond(response);
            }
        });
        url
    }

    fn response_with_type(
        body: Vec<u8>,
        content_type: &str,
        status: u32,
    ) -> tiny_http::Response<Cursor<Vec<u8>>> {
        tiny_http::Response::from_data(body)
            .with_status_code(tiny_http::StatusCode(status as u16))
            .with_header(
                tiny_http::Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes())
                    .unwrap(),
            )
    }

    #[test]
    fn test_sniff_image_format() {
        assert_eq!(sniff_image_format(&jpeg_bytes()), Some("JPEG"));
        assert_eq!(sniff_image_format(b"GIF89a-trailing-data"), Some("GIF"));
        assert_eq!(sniff_image_format(b"\x89PNG\r\n\x1a\n0000"), Some("PNG"));
        assert_eq!(sniff_image_format(b"<html><body>error"), None);
    }

    #[test]
    fn test_validate_rejects_json_body_at_magic_check() {
        // A provider returning JSON with an image content type must fail
        // the magic-byte check, before any decode is attempted.
        let body = br#"{"error": "rate limit exceeded", "padding": "xxxx"}"#;
        let err = validate_payload(Some("image/jpeg"), body, "https://x/a.jpg").unwrap_err();
        match err {
            MedPlantError::InvalidPayload(_, reason) => {
                assert!(reason.contains("signature"), "unexpected reason: {}", reason)
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_non_image_content_type() {
        let err =
            validate_payload(Some("text/html"), &jpeg_bytes(), "https://x/a.jpg").unwrap_err();
        match err {
            MedPlantError::InvalidPayload(_, reason) => {
                assert!(reason.contains("content type"))
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_truncated_payload() {
        let err = validate_payload(Some("image/jpeg"), &[0xff, 0xd8], "u").unwrap_err();
        assert!(matches!(err, MedPlantError::InvalidPayload(_, _)));
    }

    #[test]
    fn test_validate_accepts_real_jpeg() {
        assert!(validate_payload(Some("image/jpeg"), &jpeg_bytes(), "u").is_ok());
    }

    #[test]
    fn test_fetch_succeeds() {
        let url = serve_responses(vec![response_with_type(jpeg_bytes(), "image/jpeg", 200)]);
        let downloader = Downloader::new(&fast_config()).unwrap();
        let bytes = downloader.fetch_image_bytes(&url).unwrap();
        assert_eq!(sniff_image_format(&bytes), Some("JPEG"));
    }

    #[test]
    fn test_fetch_retries_transient_server_error() {
        let url = serve_responses(vec![
            response_with_type(b"boom".to_vec(), "text/plain", 500),
            response_with_type(jpeg_bytes(), "image/jpeg", 200),
        ]);
        let downloader = Downloader::new(&fast_config()).unwrap();
        assert!(downloader.fetch_image_bytes(&url).is_ok());
    }

    #[test]
    fn test_fetch_gives_up_after_bounded_retries() {
        let url = serve_responses(vec![
            response_with_type(b"boom".to_vec(), "text/plain", 503),
            response_with_type(b"boom".to_vec(), "text/plain", 503),
            response_with_type(b"boom".to_vec(), "text/plain", 503),
        ]);
        let downloader = Downloader::new(&fast_config()).unwrap();
        let err = downloader.fetch_image_bytes(&url).unwrap_err();
        assert!(matches!(err, MedPlantError::Download(_, _)));
    }

    #[test]
    fn test_fetch_does_not_retry_not_found() {
        let url = serve_responses(vec![response_with_type(b"gone".to_vec(), "text/plain", 404)]);
        let downloader = Downloader::new(&fast_config()).unwrap();
        let err = downloader.fetch_image_bytes(&url).unwrap_err();
        assert!(matches!(err, MedPlantError::Download(_, _)));
    }

    #[test]
    fn test_fetch_rejects_html_masquerading_as_success() {
        let url = serve_responses(vec![response_with_type(
            b"<html><body>not found</body></html>".to_vec(),
            "image/jpeg",
            200,
        )]);
        let downloader = Downloader::new(&fast_config()).unwrap();
        let err = downloader.fetch_image_bytes(&url).unwrap_err();
        assert!(matches!(err, MedPlantError::InvalidPayload(_, _)));
    }
}
