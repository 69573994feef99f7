use std::path::Path;

use anyhow::{Context, Result};

use super::category::CategoryId;

/// A GPS position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// An image attached to a report.
#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Photo {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a photo from disk, guessing its MIME type from the extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read photo: {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "foto".to_string());
        let mime_type = Self::guess_mime_type(&file_name);
        Ok(Self::new(file_name, mime_type, bytes))
    }

    fn guess_mime_type(file_name: &str) -> &'static str {
        let ext = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "webp" => "image/webp",
            "heic" => "image/heic",
            _ => "application/octet-stream",
        }
    }
}

/// The in-progress report held by the form until it is submitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportDraft {
    pub description: String,
    pub category: CategoryId,
    pub photo: Option<Photo>,
    pub coordinate: Option<Coordinate>,
}

impl ReportDraft {
    pub fn new(category: CategoryId, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            category,
            photo: None,
            coordinate: None,
        }
    }

    /// Reset the per-report fields after a successful submission.
    /// Category and position stay so a follow-up report can reuse them.
    pub fn clear_after_submit(&mut self) {
        self.description.clear();
        self.photo = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_guess_mime_type() {
        assert_eq!(Photo::guess_mime_type("buraco.JPG"), "image/jpeg");
        assert_eq!(Photo::guess_mime_type("poste.png"), "image/png");
        assert_eq!(Photo::guess_mime_type("IMG_0001.heic"), "image/heic");
        assert_eq!(Photo::guess_mime_type("sem_extensao"), "application/octet-stream");
    }

    #[test]
    fn test_photo_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rua.jpeg");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&[0xFF, 0xD8, 0xFF]).unwrap();

        let photo = Photo::from_path(&path).unwrap();
        assert_eq!(photo.file_name, "rua.jpeg");
        assert_eq!(photo.mime_type, "image/jpeg");
        assert_eq!(photo.bytes, vec![0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn test_photo_from_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Photo::from_path(&dir.path().join("nope.png")).is_err());
    }

    #[test]
    fn test_clear_after_submit_keeps_category_and_position() {
        let mut draft = ReportDraft::new(2, "Poste apagado");
        draft.coordinate = Some(Coordinate::new(-22.9, -42.0));
        draft.photo = Some(Photo::new("a.png", "image/png", vec![1]));

        draft.clear_after_submit();

        assert!(draft.description.is_empty());
        assert!(draft.photo.is_none());
        assert_eq!(draft.category, 2);
        assert_eq!(draft.coordinate, Some(Coordinate::new(-22.9, -42.0)));
    }
}
