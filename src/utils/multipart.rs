use std::collections::HashMap;

use actix_multipart::Multipart;
use futures::StreamExt;

use crate::error::ApiError;

const MAX_TEXT_FIELD: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Multipart body split into text fields and file parts (first file per name wins)
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    pub async fn read(mut payload: Multipart, max_file_size: usize) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(item) = payload.next().await {
            let mut field = item?;
            let name = field.name().unwrap_or("").to_string();
            if name.is_empty() {
                continue;
            }
            let filename = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(str::to_string);
            let content_type = field.content_type().map(|m| m.to_string());

            let limit = if filename.is_some() { max_file_size } else { MAX_TEXT_FIELD };
            let mut data = Vec::new();
            while let Some(chunk) = field.next().await {
                let chunk = chunk?;
                if data.len() + chunk.len() > limit {
                    log::warn!("Multipart field '{}' exceeds {} bytes", name, limit);
                    return Err(ApiError::bad_request(format!("{} is too large", name)));
                }
                data.extend_from_slice(&chunk);
            }

            match filename {
                Some(filename) => form.insert_file(
                    &name,
                    UploadedFile {
                        filename,
                        content_type,
                        bytes: data,
                    },
                ),
                None => form.insert_text(&name, String::from_utf8_lossy(&data).to_string()),
            }
        }

        Ok(form)
    }

    pub fn insert_text(&mut self, name: &str, value: String) {
        self.fields.insert(name.to_string(), value);
    }

    pub fn insert_file(&mut self, name: &str, file: UploadedFile) {
        // Empty file inputs still send a part with a blank filename
        if file.bytes.is_empty() && file.filename.is_empty() {
            return;
        }
        self.files.entry(name.to_string()).or_insert(file);
    }

    /// Trimmed text value, `None` when missing or blank
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn require_text(&self, name: &str) -> Result<String, ApiError> {
        self.text(name)
            .map(str::to_string)
            .ok_or_else(|| ApiError::bad_request(format!("{} is required", name)))
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name).filter(|f| !f.bytes.is_empty())
    }

    pub fn require_file(&mut self, name: &str) -> Result<UploadedFile, ApiError> {
        self.take_file(name)
            .ok_or_else(|| ApiError::bad_request(format!("{} file is required", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(bytes: &[u8]) -> UploadedFile {
        UploadedFile {
            filename: "avatar.png".to_string(),
            content_type: Some("image/png".to_string()),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn test_text_fields_are_trimmed() {
        let mut form = MultipartForm::default();
        form.insert_text("title", "  My video ".to_string());
        form.insert_text("description", "   ".to_string());

        assert_eq!(form.text("title"), Some("My video"));
        assert_eq!(form.text("description"), None);
        assert!(form.require_text("description").is_err());
        assert!(form.require_text("missing").is_err());
    }

    #[test]
    fn test_files_are_taken_once() {
        let mut form = MultipartForm::default();
        form.insert_file("avatar", file(b"png"));
        form.insert_file("avatar", file(b"second"));

        let avatar = form.require_file("avatar").unwrap();
        assert_eq!(avatar.bytes, b"png");
        assert!(form.take_file("avatar").is_none());
    }

    #[test]
    fn test_empty_file_counts_as_missing() {
        let mut form = MultipartForm::default();
        form.insert_file("coverImage", file(b""));
        assert!(form.take_file("coverImage").is_none());
    }
}
