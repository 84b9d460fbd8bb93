use std::io::Write;
use std::path::Path;

use reqwest::Url;
use tempfile::TempPath;

use crate::error::CaptureError;
use crate::prediction::ScanUpload;

/// Size shown to users as the upload limit. Not enforced.
pub const ADVISORY_MAX_BYTES: usize = 10 * 1024 * 1024;

/// A user-selected scan plus its temporary preview copy.
///
/// The preview file lives until [`UploadedAsset::release`] is called (or the
/// asset is dropped). The orchestrator releases it on reset and before a
/// replacement asset is captured.
#[derive(Debug)]
pub struct UploadedAsset {
    file_name: String,
    media_type: &'static str,
    bytes: Vec<u8>,
    preview: Option<TempPath>,
    preview_url: Url,
}

impl UploadedAsset {
    /// Copy `bytes` into a preview file and wrap them as an asset.
    ///
    /// Callers guarantee `bytes` is non-empty; no type or size validation
    /// happens here.
    pub fn capture(file_name: &str, bytes: Vec<u8>) -> Result<Self, CaptureError> {
        let media_type = media_type_for(file_name);
        let suffix = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();

        let mut file = tempfile::Builder::new()
            .prefix("ct-preview-")
            .suffix(&suffix)
            .tempfile()
            .map_err(CaptureError::Preview)?;
        file.write_all(&bytes).map_err(CaptureError::Preview)?;
        file.flush().map_err(CaptureError::Preview)?;
        let preview = file.into_temp_path();

        let preview_url = Url::from_file_path(&preview).map_err(|()| {
            CaptureError::Preview(std::io::Error::other(format!(
                "preview path {} is not absolute",
                preview.display()
            )))
        })?;

        if bytes.len() > ADVISORY_MAX_BYTES {
            log::warn!(
                "{file_name} is {} bytes, above the advertised {} MB limit",
                bytes.len(),
                ADVISORY_MAX_BYTES / 1_048_576
            );
        }
        log::info!("Captured {file_name} ({media_type}), preview at {preview_url}");

        Ok(Self {
            file_name: file_name.to_string(),
            media_type,
            bytes,
            preview: Some(preview),
            preview_url,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn media_type(&self) -> &'static str {
        self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// `file://` URL of the preview copy.
    pub fn preview_url(&self) -> &Url {
        &self.preview_url
    }

    /// Snapshot of the payload for the predict request.
    pub fn to_upload(&self) -> ScanUpload {
        ScanUpload {
            file_name: self.file_name.clone(),
            media_type: self.media_type,
            bytes: self.bytes.clone(),
        }
    }

    /// Size as shown on the upload card, e.g. "1.25 MB".
    pub fn size_label(&self) -> String {
        format!("{:.2} MB", self.bytes.len() as f64 / 1_048_576.0)
    }

    /// Delete the preview file.
    pub fn release(mut self) {
        if let Some(preview) = self.preview.take() {
            let shown = preview.display().to_string();
            match preview.close() {
                Ok(()) => log::debug!("Released preview {shown}"),
                Err(e) => log::warn!("Failed to release preview {shown}: {e}"),
            }
        }
    }
}

/// Read a file from disk for capture, rejecting empty files.
pub fn read_scan(path: &Path) -> Result<(String, Vec<u8>), CaptureError> {
    let bytes = std::fs::read(path).map_err(|source| CaptureError::Read {
        path: path.display().to_string(),
        source,
    })?;
    if bytes.is_empty() {
        return Err(CaptureError::Empty(path.display().to_string()));
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scan".into());
    Ok((name, bytes))
}

fn media_type_for(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("dcm") => "application/dicom",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_writes_preview_and_release_removes_it() {
        let asset = UploadedAsset::capture("chest.png", vec![1, 2, 3]).unwrap();
        let path = asset.preview_url().to_file_path().unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);
        assert_eq!(asset.media_type(), "image/png");
        assert!(path.to_string_lossy().ends_with(".png"));

        asset.release();
        assert!(!path.exists());
    }

    #[test]
    fn media_types_follow_extension() {
        assert_eq!(media_type_for("a.JPG"), "image/jpeg");
        assert_eq!(media_type_for("a.jpeg"), "image/jpeg");
        assert_eq!(media_type_for("scan.dcm"), "application/dicom");
        assert_eq!(media_type_for("noext"), "application/octet-stream");
    }

    #[test]
    fn size_label_in_megabytes() {
        let asset = UploadedAsset::capture("x.png", vec![0; 1_310_720]).unwrap();
        assert_eq!(asset.size_label(), "1.25 MB");
        asset.release();
    }

    #[test]
    fn read_scan_rejects_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.png");
        std::fs::write(&path, b"").unwrap();
        assert!(matches!(read_scan(&path), Err(CaptureError::Empty(_))));

        std::fs::write(&path, b"png").unwrap();
        let (name, bytes) = read_scan(&path).unwrap();
        assert_eq!(name, "empty.png");
        assert_eq!(bytes, b"png");
    }

    #[test]
    fn read_scan_reports_missing_files() {
        let err = read_scan(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, CaptureError::Read { .. }));
    }
}
