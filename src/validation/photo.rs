use crate::validation::errors::ValidationError;
use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;

/// Photo embedded as base64 image data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoData {
    mime_type: String,
    base64: String,
}

impl PhotoData {
    /// Parse `data:image/<type>;base64,<payload>`.
    pub fn from_data_uri(uri: &str) -> Result<Self, ValidationError> {
        let invalid = |why: &str| ValidationError::InvalidInputFormat(why.to_string());

        let rest = uri
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| invalid("photo must be a data URI"))?;
        let (mime_type, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| invalid("photo data URI must be base64 encoded"))?;

        if !mime_type.starts_with("image/") || mime_type.len() <= "image/".len() {
            return Err(invalid("photo data URI must carry an image MIME type"));
        }
        if payload.is_empty() {
            return Err(invalid("photo data is empty"));
        }
        STANDARD
            .decode(payload)
            .map_err(|e| ValidationError::InvalidInputFormat(format!("photo is not valid base64: {e}")))?;

        Ok(Self {
            mime_type: mime_type.to_string(),
            base64: payload.to_string(),
        })
    }

    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            base64: STANDARD.encode(bytes),
        }
    }

    /// Read an image file, guessing the MIME type from its extension.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mime_type = mime_for_path(path)
            .with_context(|| format!("Unsupported image type: {}", path.display()))?;
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read photo {}", path.display()))?;
        Ok(Self::from_bytes(mime_type, &bytes))
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn base64_data(&self) -> &str {
        &self.base64
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }
}

fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "heic" => Some("image/heic"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_image_data_uri() {
        let photo = PhotoData::from_data_uri("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(photo.mime_type(), "image/png");
        assert_eq!(photo.base64_data(), "aGVsbG8=");
        assert_eq!(photo.to_data_uri(), "data:image/png;base64,aGVsbG8=");
    }

    #[test]
    fn test_rejects_malformed_uris() {
        for uri in [
            "aGVsbG8=",
            "data:image/png,aGVsbG8=",
            "data:text/plain;base64,aGVsbG8=",
            "data:image/;base64,aGVsbG8=",
            "data:image/jpeg;base64,",
            "data:image/jpeg;base64,not base64!!",
        ] {
            let err = PhotoData::from_data_uri(uri).unwrap_err();
            assert!(matches!(err, ValidationError::InvalidInputFormat(_)), "{uri}");
        }
    }

    #[test]
    fn test_from_bytes_encodes() {
        let photo = PhotoData::from_bytes("image/jpeg", b"hello");
        assert_eq!(photo.base64_data(), "aGVsbG8=");
    }

    #[test]
    fn test_mime_guess() {
        assert_eq!(mime_for_path(Path::new("house.JPG")), Some("image/jpeg"));
        assert_eq!(mime_for_path(Path::new("house.webp")), Some("image/webp"));
        assert_eq!(mime_for_path(Path::new("house.txt")), None);
        assert_eq!(mime_for_path(Path::new("house")), None);
    }
}
