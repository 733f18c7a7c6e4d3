use std::path::Path;

use base64::Engine;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::error::{Error, Result};

/// MIME type sent for attachments whose content type could not be detected.
pub const FALLBACK_MIME_TYPE: &str = "image/png";

/// Whether an attachment is displayed as an image or as an opaque file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    File,
}

/// A user-supplied file sent alongside a message.
///
/// The same source file yields two encodings: `url` is a local handle used to
/// point at the file on screen, while `base64` is the payload placed on the
/// wire. Both are kept until the message is sent (and afterwards, since the
/// full history is resent on every turn).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Unique identifier of the attachment.
    pub id: String,

    /// Display kind.
    #[serde(rename = "type")]
    pub kind: AttachmentKind,

    /// Local display handle (a `file://` URL).
    pub url: String,

    /// Base64-encoded file contents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,

    /// File name shown to the user.
    pub name: String,

    /// Detected content type, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl Attachment {
    /// Create an attachment from already-encoded parts.
    pub fn new(
        kind: AttachmentKind,
        url: impl Into<String>,
        base64: Option<String>,
        name: impl Into<String>,
        mime_type: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            url: url.into(),
            base64,
            name: name.into(),
            mime_type,
        }
    }

    /// Read a file and produce both its display handle and transport payload.
    ///
    /// The content type is guessed from the file extension. Files with an
    /// `image/*` type are displayed as images; everything else is a file.
    pub async fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| Error::io(format!("failed to read {}", path.display()), err))?;
        let absolute = tokio::fs::canonicalize(path)
            .await
            .map_err(|err| Error::io(format!("failed to resolve {}", path.display()), err))?;
        let url = Url::from_file_path(&absolute).map_err(|_| {
            Error::validation(format!("cannot build a file URL for {}", absolute.display()))
        })?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| absolute.display().to_string());

        let mime_type = media_type_for(path);
        let kind = match mime_type {
            Some(mime) if mime.starts_with("image/") => AttachmentKind::Image,
            _ => AttachmentKind::File,
        };
        let data = base64::engine::general_purpose::STANDARD.encode(&bytes);

        Ok(Self::new(
            kind,
            url.to_string(),
            Some(data),
            name,
            mime_type.map(str::to_string),
        ))
    }

    /// The MIME type placed on the wire for this attachment.
    pub fn wire_mime_type(&self) -> &str {
        self.mime_type.as_deref().unwrap_or(FALLBACK_MIME_TYPE)
    }
}

/// Guess a content type from a file extension.
pub fn media_type_for(path: &Path) -> Option<&'static str> {
    mime_guess::from_path(path).first_raw()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn media_types_from_extensions() {
        assert_eq!(media_type_for(Path::new("cat.PNG")), Some("image/png"));
        assert_eq!(media_type_for(Path::new("dog.jpeg")), Some("image/jpeg"));
        assert_eq!(media_type_for(Path::new("report.pdf")), Some("application/pdf"));
        assert_eq!(media_type_for(Path::new("Makefile")), None);
    }

    #[test]
    fn less_common_types_are_detected() {
        assert_eq!(media_type_for(Path::new("logo.svg")), Some("image/svg+xml"));
        assert_eq!(media_type_for(Path::new("scan.bmp")), Some("image/bmp"));
        assert_eq!(
            media_type_for(Path::new("memo.docx")),
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
        );
    }

    #[test]
    fn unknown_type_falls_back_to_png_on_the_wire() {
        let attachment = Attachment::new(
            AttachmentKind::File,
            "file:///tmp/blob",
            Some("AAAA".to_string()),
            "blob",
            None,
        );
        assert_eq!(attachment.wire_mime_type(), FALLBACK_MIME_TYPE);
    }

    #[test]
    fn serialization_uses_type_and_camel_case() {
        let attachment = Attachment {
            id: "a1".to_string(),
            kind: AttachmentKind::Image,
            url: "file:///tmp/cat.png".to_string(),
            base64: Some("SGVsbG8=".to_string()),
            name: "cat.png".to_string(),
            mime_type: Some("image/png".to_string()),
        };
        let json = serde_json::to_value(&attachment).unwrap();
        assert_eq!(json["type"], "image");
        assert_eq!(json["mimeType"], "image/png");
        assert_eq!(json["base64"], "SGVsbG8=");
    }

    #[test]
    fn deserializes_records_without_optional_fields() {
        let json = r#"{"id":"a1","type":"file","url":"blob:1","name":"notes"}"#;
        let attachment: Attachment = serde_json::from_str(json).unwrap();
        assert_eq!(attachment.kind, AttachmentKind::File);
        assert!(attachment.base64.is_none());
        assert!(attachment.mime_type.is_none());
    }

    #[tokio::test]
    async fn from_path_encodes_file() {
        let dir = std::env::temp_dir().join(format!("sesame-attach-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path: PathBuf = dir.join("hello.png");
        tokio::fs::write(&path, b"Hello World").await.unwrap();

        let attachment = Attachment::from_path(&path).await.unwrap();
        assert_eq!(attachment.kind, AttachmentKind::Image);
        assert_eq!(attachment.name, "hello.png");
        assert_eq!(attachment.base64.as_deref(), Some("SGVsbG8gV29ybGQ="));
        assert!(attachment.url.starts_with("file://"));
        assert_eq!(attachment.wire_mime_type(), "image/png");

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn from_path_missing_file_is_io_error() {
        let err = Attachment::from_path("/definitely/not/here.png")
            .await
            .unwrap_err();
        assert!(err.is_io());
    }
}
