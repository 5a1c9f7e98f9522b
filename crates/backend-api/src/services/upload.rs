//! Attachment storage boundary.
//!
//! The message service only ever sees `AttachmentUploader`; the default
//! implementation writes blobs to a local directory and serves them by
//! URL. Swapping in an object-store-backed uploader is a wiring change.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use duplex_config::UploadsConfig;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct StoredAttachment {
    pub url: String,
    pub mime_type: String,
}

#[async_trait]
pub trait AttachmentUploader: Send + Sync {
    async fn store(
        &self,
        bytes: &[u8],
        mime_type: &str,
        file_name: &str,
    ) -> Result<StoredAttachment>;
}

pub struct DiskUploader {
    dir: PathBuf,
    base_url: String,
}

impl DiskUploader {
    pub fn new(config: &UploadsConfig) -> Self {
        Self {
            dir: PathBuf::from(&config.dir),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl AttachmentUploader for DiskUploader {
    async fn store(
        &self,
        bytes: &[u8],
        mime_type: &str,
        file_name: &str,
    ) -> Result<StoredAttachment> {
        let stored_name = format!("{}-{}", Uuid::new_v4(), sanitize_file_name(file_name));
        let path = self.dir.join(&stored_name);

        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create upload directory {}", self.dir.display()))?;
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("failed to write attachment {}", path.display()))?;

        Ok(StoredAttachment {
            url: format!("{}/{}", self.base_url, stored_name),
            mime_type: mime_type.to_string(),
        })
    }
}

fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

/// Decode a base64 payload that may be a raw base64 string or a
/// `data:<mime>;base64,<payload>` data URI. Returns the bytes and the MIME
/// type embedded in the URI, if any.
pub fn decode_base64_payload(payload: &str) -> Result<(Vec<u8>, Option<String>)> {
    let (mime, data) = match payload.strip_prefix("data:") {
        Some(rest) => {
            let (header, data) = rest
                .split_once(',')
                .context("malformed data URI: missing comma")?;
            let mime = header.strip_suffix(";base64").unwrap_or(header);
            let mime = (!mime.is_empty()).then(|| mime.to_string());
            (mime, data)
        }
        None => (None, payload),
    };

    let bytes = STANDARD
        .decode(data.trim())
        .context("invalid base64 attachment data")?;
    Ok((bytes, mime))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn disk_uploader_writes_blob_and_returns_served_url() {
        let temp_dir = TempDir::new().unwrap();
        let uploader = DiskUploader::new(&UploadsConfig {
            dir: temp_dir.path().display().to_string(),
            base_url: "/uploads/".to_string(),
        });

        let stored = uploader
            .store(b"hello", "text/plain", "notes.txt")
            .await
            .unwrap();

        assert!(stored.url.starts_with("/uploads/"));
        assert!(stored.url.ends_with("notes.txt"));
        assert_eq!(stored.mime_type, "text/plain");

        let stored_name = stored.url.strip_prefix("/uploads/").unwrap();
        let on_disk = std::fs::read(temp_dir.path().join(stored_name)).unwrap();
        assert_eq!(on_disk, b"hello");
    }

    #[test]
    fn decode_handles_data_uris_and_raw_base64() {
        let (bytes, mime) = decode_base64_payload("data:image/png;base64,aGk=").unwrap();
        assert_eq!(bytes, b"hi");
        assert_eq!(mime.as_deref(), Some("image/png"));

        let (bytes, mime) = decode_base64_payload("aGk=").unwrap();
        assert_eq!(bytes, b"hi");
        assert!(mime.is_none());
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_base64_payload("data:image/png;base64").is_err());
        assert!(decode_base64_payload("not base64!!!").is_err());
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_file_name(""), "file");
    }
}
