use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::debug;

use super::domain::AttachedFile;

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("unable to read {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} is not a file")]
    NotAFile(String),
    #[error("malformed data URL for {0}")]
    MalformedDataUrl(String),
    #[error("invalid base64 payload for {name}: {source}")]
    InvalidBase64 {
        name: String,
        #[source]
        source: base64::DecodeError,
    },
}

/// Turns user selected files into [`AttachedFile`] payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileEncoder;

impl FileEncoder {
    /// Reads the whole file and encodes it. The MIME type is guessed from the extension.
    pub async fn encode_path(&self, path: &Path) -> Result<AttachedFile, EncodeError> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| EncodeError::NotAFile(path.display().to_string()))?;

        let bytes = tokio::fs::read(path).await.map_err(|source| EncodeError::Read {
            name: name.clone(),
            source,
        })?;

        let mime_type = mime_guess::from_path(path).first_or_octet_stream();
        debug!(file = %name, size = bytes.len(), mime = %mime_type, "encoded document");
        Ok(self.encode_bytes(name, mime_type.essence_str(), &bytes))
    }

    pub fn encode_bytes(
        &self,
        name: impl Into<String>,
        mime_type: &str,
        bytes: &[u8],
    ) -> AttachedFile {
        AttachedFile {
            name: name.into(),
            mime_type: mime_type.to_string(),
            content_base64: STANDARD.encode(bytes),
        }
    }

    /// Accepts a browser `data:<mime>;base64,<payload>` URL and keeps only the payload.
    pub fn from_data_url(
        &self,
        name: impl Into<String>,
        data_url: &str,
    ) -> Result<AttachedFile, EncodeError> {
        let name = name.into();
        let (header, payload) = data_url
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(','))
            .ok_or_else(|| EncodeError::MalformedDataUrl(name.clone()))?;

        let media = header
            .strip_suffix(";base64")
            .ok_or_else(|| EncodeError::MalformedDataUrl(name.clone()))?;
        let mime_type = match media.split(';').next() {
            Some(essence) if !essence.is_empty() => essence.to_string(),
            _ => mime::APPLICATION_OCTET_STREAM.essence_str().to_string(),
        };

        STANDARD
            .decode(payload)
            .map_err(|source| EncodeError::InvalidBase64 {
                name: name.clone(),
                source,
            })?;

        Ok(AttachedFile {
            name,
            mime_type,
            content_base64: payload.to_string(),
        })
    }
}
