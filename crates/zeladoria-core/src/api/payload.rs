use crate::models::{CategoryId, Coordinate, Photo, ReportDraft};

pub const FIELD_DESCRIPTION: &str = "descricao";
pub const FIELD_CATEGORY: &str = "categoria";
pub const FIELD_LATITUDE: &str = "latitude";
pub const FIELD_LONGITUDE: &str = "longitude";
pub const FIELD_PHOTO: &str = "foto_problema";

/// A validated report, ready to be encoded as a multipart body.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportPayload {
    pub description: String,
    pub category: CategoryId,
    pub latitude: f64,
    pub longitude: f64,
    pub photo: Photo,
}

impl ReportPayload {
    /// Build a payload from a draft, or `None` if the photo or position is missing.
    pub fn from_draft(draft: &ReportDraft) -> Option<Self> {
        let photo = draft.photo.clone()?;
        let Coordinate { latitude, longitude } = draft.coordinate?;
        Some(Self {
            description: draft.description.clone(),
            category: draft.category,
            latitude,
            longitude,
            photo,
        })
    }

    /// Text parts of the body, in the order they are sent.
    ///
    /// Coordinates use Rust's float formatting, which always writes a `.`
    /// separator and round-trips to the same `f64`.
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            (FIELD_DESCRIPTION, self.description.clone()),
            (FIELD_CATEGORY, self.category.to_string()),
            (FIELD_LATITUDE, self.latitude.to_string()),
            (FIELD_LONGITUDE, self.longitude.to_string()),
        ]
    }

    /// Names of every part in the body, file part last
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.text_fields().into_iter().map(|(k, _)| k).collect();
        names.push(FIELD_PHOTO);
        names
    }

    pub fn into_form(self) -> Result<reqwest::multipart::Form, reqwest::Error> {
        let mut form = reqwest::multipart::Form::new();
        for (name, value) in self.text_fields() {
            form = form.text(name, value);
        }
        let photo = reqwest::multipart::Part::bytes(self.photo.bytes)
            .file_name(self.photo.file_name)
            .mime_str(&self.photo.mime_type)?;
        Ok(form.part(FIELD_PHOTO, photo))
    }
}
