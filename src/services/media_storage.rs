/// Client for the external media host (Cloudinary upload API)
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::config::CloudinaryConfig;
use crate::error::ApiError;
use crate::utils::UploadedFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn resource_type(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadedMedia {
    #[serde(rename = "secure_url")]
    pub url: String,
    pub public_id: String,
    pub resource_type: String,
    /// Present for audio/video uploads
    #[serde(default)]
    pub duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct HostErrorBody {
    error: HostErrorMessage,
}

#[derive(Debug, Deserialize)]
struct HostErrorMessage {
    message: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Clone)]
pub struct MediaStorage {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

impl MediaStorage {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self, kind: MediaKind, action: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name,
            kind.resource_type(),
            action
        )
    }

    pub async fn upload(&self, file: UploadedFile, kind: MediaKind) -> Result<UploadedMedia, ApiError> {
        if file.bytes.is_empty() {
            return Err(ApiError::bad_request(format!("{} is empty", file.filename)));
        }

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign_params(&[("timestamp", timestamp.as_str())], &self.config.api_secret);
        let size = file.bytes.len();

        let mut part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.filename.clone());
        if let Some(mime) = file.content_type.as_deref() {
            part = part.mime_str(mime)?;
        }

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        log::info!("Uploading {} ({} bytes) to media host", file.filename, size);

        let response = self
            .client
            .post(self.endpoint(kind, "upload"))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<HostErrorBody>()
                .await
                .map(|b| b.error.message)
                .unwrap_or_else(|_| status.to_string());
            log::error!("Media upload of {} failed: {}", file.filename, message);
            return Err(ApiError::Upload(message));
        }

        let media = response.json::<UploadedMedia>().await?;
        log::info!("Uploaded {} as {}", file.filename, media.public_id);
        Ok(media)
    }

    /// Remove a previously uploaded asset by its delivery URL. Returns whether the host deleted it.
    pub async fn delete(&self, url: &str, kind: MediaKind) -> Result<bool, ApiError> {
        let Some(public_id) = public_id_from_url(url) else {
            log::warn!("Cannot derive a public id from {}", url);
            return Ok(false);
        };

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("public_id", public_id.as_str()), ("timestamp", timestamp.as_str())],
            &self.config.api_secret,
        );

        let params = [
            ("public_id", public_id.as_str()),
            ("timestamp", timestamp.as_str()),
            ("api_key", self.config.api_key.as_str()),
            ("signature", signature.as_str()),
            ("signature_algorithm", "sha256"),
        ];

        let response = self
            .client
            .post(self.endpoint(kind, "destroy"))
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Upload(format!(
                "Deleting {} failed with {}",
                public_id,
                response.status()
            )));
        }

        let body = response.json::<DestroyResponse>().await?;
        Ok(body.result == "ok")
    }

    /// `delete` for cleanup paths: the document change already happened, so only log failures
    pub async fn delete_quietly(&self, url: &str, kind: MediaKind) {
        if url.is_empty() {
            return;
        }
        match self.delete(url, kind).await {
            Ok(true) => log::info!("Deleted media {}", url),
            Ok(false) => log::warn!("Media host did not delete {}", url),
            Err(e) => log::error!("Failed to delete media {}: {}", url, e),
        }
    }
}

/// Signature over alphabetically sorted `key=value` pairs followed by the API secret
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, &str)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// `https://res.cloudinary.com/<cloud>/image/upload/v123/folder/name.jpg` -> `folder/name`
pub fn public_id_from_url(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("/upload/")?;
    let rest = rest.split(['?', '#']).next()?;

    let mut segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
    if let Some(first) = segments.first() {
        let is_version = first.len() > 1
            && first.starts_with('v')
            && first[1..].chars().all(|c| c.is_ascii_digit());
        if is_version {
            segments.remove(0);
        }
    }

    let last = segments.pop()?;
    let stem = last.rsplit_once('.').map_or(last, |(stem, _)| stem);
    segments.push(stem);

    let public_id = segments.join("/");
    (!public_id.is_empty()).then_some(public_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_id_from_url() {
        assert_eq!(
            public_id_from_url("https://res.cloudinary.com/demo/image/upload/v1712345678/avatars/jane.png"),
            Some("avatars/jane".to_string())
        );
        assert_eq!(
            public_id_from_url("http://res.cloudinary.com/demo/video/upload/v1/clip.mp4?x=1"),
            Some("clip".to_string())
        );
        assert_eq!(
            public_id_from_url("https://res.cloudinary.com/demo/image/upload/thumb"),
            Some("thumb".to_string())
        );
        assert_eq!(public_id_from_url("https://example.com/nothing.png"), None);
        assert_eq!(public_id_from_url(""), None);
    }

    #[test]
    fn test_sign_params_is_order_independent() {
        let a = sign_params(&[("timestamp", "1700000000"), ("public_id", "x")], "secret");
        let b = sign_params(&[("public_id", "x"), ("timestamp", "1700000000")], "secret");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        let expected = {
            let mut hasher = Sha256::new();
            hasher.update(b"public_id=x&timestamp=1700000000secret");
            hex::encode(hasher.finalize())
        };
        assert_eq!(a, expected);
    }

    #[test]
    fn test_sign_params_depends_on_secret() {
        let a = sign_params(&[("timestamp", "1")], "one");
        let b = sign_params(&[("timestamp", "1")], "two");
        assert_ne!(a, b);
    }

    #[actix_web::test]
    async fn test_empty_upload_is_rejected_locally() {
        let storage = MediaStorage::new(CloudinaryConfig {
            cloud_name: "demo".into(),
            api_key: "key".into(),
            api_secret: "secret".into(),
            api_base: "http://127.0.0.1:9".into(),
        });
        let file = UploadedFile {
            filename: "empty.png".into(),
            content_type: None,
            bytes: Vec::new(),
        };
        let err = storage.upload(file, MediaKind::Image).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
