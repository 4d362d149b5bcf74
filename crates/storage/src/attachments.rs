use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg"];

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("File type not allowed: {0}")]
    NotAllowed(String),
    #[error("Attachment not found on disk: {0}")]
    NotFound(String),
    #[error("Empty upload")]
    Empty,
}

/// An attachment read back from the store.
#[derive(Debug, Clone)]
pub struct AttachmentFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub data: Vec<u8>,
}

/// Receipts saved under one directory with a timestamped unique name.
#[derive(Debug, Clone)]
pub struct AttachmentStore {
    dir: PathBuf,
}

impl AttachmentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes the upload and returns the stored file name, which is what
    /// goes into `transactions.attachment_path`.
    pub async fn save(
        &self,
        original_name: &str,
        data: &[u8],
        now: NaiveDateTime,
    ) -> Result<String, AttachmentError> {
        if data.is_empty() {
            return Err(AttachmentError::Empty);
        }
        let ext = extension(original_name)
            .filter(|e| ALLOWED_EXTENSIONS.contains(&e.as_str()))
            .ok_or_else(|| AttachmentError::NotAllowed(original_name.to_string()))?;

        let short_id = uuid::Uuid::new_v4().simple().to_string();
        let stored = format!(
            "{}_{}_{}",
            now.format("%Y%m%d_%H%M%S"),
            &short_id[..8],
            sanitize_file_name(original_name, &ext)
        );

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&stored), data).await?;
        tracing::info!(file = %stored, bytes = data.len(), "stored attachment");
        Ok(stored)
    }

    /// Only the final path component is honoured, so stored names cannot
    /// escape the attachments directory.
    pub async fn read(&self, stored: &str) -> Result<AttachmentFile, AttachmentError> {
        let file_name = Path::new(stored)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AttachmentError::NotFound(stored.to_string()))?
            .to_string();

        let data = match tokio::fs::read(self.dir.join(&file_name)).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AttachmentError::NotFound(file_name));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(AttachmentFile {
            content_type: content_type(&file_name),
            file_name,
            data,
        })
    }
}

fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Keeps ASCII alphanumerics, `-` and `_` from the file stem; anything else
/// becomes `_`.
pub fn sanitize_file_name(name: &str, ext: &str) -> String {
    let base = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("anexo");
    let mut clean: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(64)
        .collect();
    if clean.trim_matches('_').is_empty() {
        clean = "anexo".to_string();
    }
    format!("{clean}.{ext}")
}

pub fn is_previewable_image(name: &str) -> bool {
    matches!(extension(name).as_deref(), Some("png" | "jpg" | "jpeg"))
}

pub fn content_type(name: &str) -> &'static str {
    match extension(name).as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(14, 5, 9)
            .unwrap()
    }

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize_file_name("Nota fiscal 03-24.PDF", "pdf"), "Nota_fiscal_03-24.pdf");
        assert_eq!(sanitize_file_name("recibo ção.png", "png"), "recibo___o.png");
        assert_eq!(sanitize_file_name("../../???.png", "png"), "anexo.png");
    }

    #[test]
    fn previewable_only_for_images() {
        assert!(is_previewable_image("foto.JPG"));
        assert!(is_previewable_image("x.png"));
        assert!(!is_previewable_image("boleto.pdf"));
    }

    #[tokio::test]
    async fn save_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = AttachmentStore::new(dir.path().join("attachments"));

        let stored = store.save("Recibo Luz.pdf", b"%PDF-1.4", now()).await.unwrap();
        assert!(stored.starts_with("20240310_140509_"));
        assert!(stored.ends_with("_Recibo_Luz.pdf"));

        let file = store.read(&stored).await.unwrap();
        assert_eq!(file.data, b"%PDF-1.4");
        assert_eq!(file.content_type, "application/pdf");
    }

    #[tokio::test]
    async fn rejects_disallowed_and_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = AttachmentStore::new(dir.path());

        assert!(matches!(
            store.save("script.exe", b"MZ", now()).await,
            Err(AttachmentError::NotAllowed(_))
        ));
        assert!(matches!(
            store.save("vazio.png", b"", now()).await,
            Err(AttachmentError::Empty)
        ));
        assert!(matches!(
            store.read("../../etc/passwd").await,
            Err(AttachmentError::NotFound(_))
        ));
    }
}
