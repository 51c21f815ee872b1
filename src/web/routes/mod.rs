pub(crate) mod files;
pub(crate) mod index;
pub(crate) mod jobs;
pub(crate) mod stream;
pub(crate) mod video_info;

use serde::Deserialize;

use crate::downloader::DownloadError;

/// JSON body shared by `/video_info`, `/download` and `/stream_download`
#[derive(Debug, Default, Deserialize)]
pub(crate) struct MediaRequest {
    #[serde(default)]
    pub(crate) url: Option<String>,
    #[serde(default)]
    pub(crate) format_id: Option<String>,
}

impl MediaRequest {
    /// Decode a request body. The Content-Type header is not consulted and
    /// an empty body counts as `{}`. Malformed JSON is an `InvalidUrl` failure.
    pub(crate) fn from_body(body: &[u8]) -> Result<Self, DownloadError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| DownloadError::InvalidUrl(format!("Invalid request body: {}", e)))
    }

    pub(crate) fn url(&self) -> Result<&str, DownloadError> {
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| DownloadError::InvalidUrl("URL is required".to_string()))
    }

    pub(crate) fn format_id(&self) -> Option<&str> {
        self.format_id
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fields() {
        let req: MediaRequest = serde_json::from_str(r#"{"url": "  ", "format_id": ""}"#).unwrap();
        assert!(req.url().is_err());
        assert!(req.format_id().is_none());

        let req: MediaRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.url().unwrap_err().to_string(), "URL is required");
    }

    #[test]
    fn test_from_body() {
        let req = MediaRequest::from_body(br#"{"url": "https://x.com/u/status/1"}"#).unwrap();
        assert_eq!(req.url().unwrap(), "https://x.com/u/status/1");

        let req = MediaRequest::from_body(b"").unwrap();
        assert!(req.url().is_err());

        let err = MediaRequest::from_body(br#"{"url": 123}"#).unwrap_err();
        assert_eq!(err.kind(), crate::downloader::ErrorKind::InvalidUrl);
        assert!(err.to_string().starts_with("Invalid request body"));

        assert!(MediaRequest::from_body(b"url=https://x.com").is_err());
    }

    #[test]
    fn test_values_are_trimmed() {
        let req: MediaRequest =
            serde_json::from_str(r#"{"url": " https://x.com/u/status/1 ", "format_id": " 720 "}"#)
                .unwrap();
        assert_eq!(req.url().unwrap(), "https://x.com/u/status/1");
        assert_eq!(req.format_id(), Some("720"));
    }
}
