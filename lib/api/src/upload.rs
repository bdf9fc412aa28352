//! Multipart upload parsing for `/make-glb`

use actix_multipart::Multipart;
use artbox_core::{NewArtwork, OwnerId};
use futures_util::TryStreamExt;
use std::collections::HashMap;
use thiserror::Error;

/// Form field holding the image file
pub const IMAGE_FIELD: &str = "image";

/// Largest accepted image upload
pub const DEFAULT_MAX_FILE_BYTES: usize = 32 * 1024 * 1024;

/// Largest accepted text field
pub const DEFAULT_MAX_FIELD_BYTES: usize = 64 * 1024;

/// Room left for text fields and multipart framing on top of the file cap
const FORM_HEADROOM_BYTES: usize = 1024 * 1024;

/// Size caps enforced while the multipart stream is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_file_bytes: usize,
    pub max_field_bytes: usize,
    /// Cap on all part bodies together
    pub max_total_bytes: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self::for_file_size(DEFAULT_MAX_FILE_BYTES)
    }
}

impl UploadLimits {
    /// Limits sized around a maximum image size
    pub fn for_file_size(max_file_bytes: usize) -> Self {
        Self {
            max_file_bytes,
            max_field_bytes: DEFAULT_MAX_FIELD_BYTES,
            max_total_bytes: max_file_bytes.saturating_add(FORM_HEADROOM_BYTES),
        }
    }
}

/// Reasons an upload is rejected before any processing happens
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UploadError {
    #[error("No file uploaded. Please select an image file.")]
    NoFile,

    #[error("No file selected. Please choose an image.")]
    NoFilename,

    #[error("Invalid file type. Please upload an image file (JPG, PNG, etc.).")]
    InvalidType,

    #[error("Artwork name is required.")]
    MissingName,

    #[error("Invalid value for '{0}'")]
    InvalidNumber(&'static str),

    #[error("Malformed upload: {0}")]
    Multipart(String),

    #[error("File is too large. The limit is {0} bytes.")]
    FileTooLarge(usize),

    #[error("Field '{0}' is too large.")]
    FieldTooLarge(String),

    #[error("Upload is too large. The limit is {0} bytes.")]
    RequestTooLarge(usize),
}

impl UploadError {
    /// Whether the upload was refused for its size
    pub fn is_too_large(&self) -> bool {
        matches!(
            self,
            UploadError::FileTooLarge(_) | UploadError::FieldTooLarge(_) | UploadError::RequestTooLarge(_)
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Everything a `/make-glb` request carried
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub image: Option<UploadedFile>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    /// Drain a multipart stream into memory
    ///
    /// Stops at the first chunk that would push a part or the whole form past
    /// `limits`; nothing beyond the cap is buffered.
    pub async fn read(mut payload: Multipart, limits: &UploadLimits) -> Result<Self, UploadError> {
        let mut form = UploadForm::default();
        let mut total = 0usize;

        while let Some(mut field) = payload
            .try_next()
            .await
            .map_err(|e| UploadError::Multipart(e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let filename = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(str::to_string);
            let content_type = field.content_type().map(|m| m.essence_str().to_string());

            let is_image = name == IMAGE_FIELD;
            let part_limit = if is_image {
                limits.max_file_bytes
            } else {
                limits.max_field_bytes
            };

            let mut data = Vec::new();
            while let Some(chunk) = field
                .try_next()
                .await
                .map_err(|e| UploadError::Multipart(e.to_string()))?
            {
                total += chunk.len();
                if total > limits.max_total_bytes {
                    return Err(UploadError::RequestTooLarge(limits.max_total_bytes));
                }
                if data.len() + chunk.len() > part_limit {
                    return Err(if is_image {
                        UploadError::FileTooLarge(limits.max_file_bytes)
                    } else {
                        UploadError::FieldTooLarge(name)
                    });
                }
                data.extend_from_slice(&chunk);
            }

            if is_image {
                form.image = Some(UploadedFile {
                    filename: filename.unwrap_or_default(),
                    content_type,
                    data,
                });
            } else if filename.is_none() {
                form.fields
                    .insert(name, String::from_utf8_lossy(&data).into_owned());
            }
        }

        Ok(form)
    }

    fn text(&self, key: &str) -> Option<String> {
        self.fields
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn parsed<T: std::str::FromStr>(&self, key: &'static str) -> Result<Option<T>, UploadError> {
        self.text(key)
            .map(|v| v.parse::<T>().map_err(|_| UploadError::InvalidNumber(key)))
            .transpose()
    }

    /// Validate the form and turn it into an insert payload
    ///
    /// Checks run in a fixed order: file present, filename present, image
    /// content type, name, then numeric fields.
    pub fn into_new_artwork(self) -> Result<NewArtwork, UploadError> {
        let image = self.image.as_ref().ok_or(UploadError::NoFile)?;
        if image.filename.is_empty() {
            return Err(UploadError::NoFilename);
        }
        let is_image = image
            .content_type
            .as_deref()
            .map(|ct| ct.starts_with("image/"))
            .unwrap_or(false);
        if !is_image {
            return Err(UploadError::InvalidType);
        }

        let name = self.text("name").ok_or(UploadError::MissingName)?;
        let price = self.parsed::<f64>("price")?;
        if matches!(price, Some(p) if !p.is_finite()) {
            return Err(UploadError::InvalidNumber("price"));
        }
        let year_created = self.parsed::<i32>("year_created")?;
        let owner_id = self.parsed::<u64>("owner_id")?.map(OwnerId);

        let new = NewArtwork {
            owner_id,
            name,
            description: self.text("description"),
            price,
            artwork_type: self.text("artwork_type"),
            artist: self.text("artist"),
            year_created,
            dimensions: self.text("dimensions"),
            medium: self.text("medium"),
            style: self.text("style"),
            filename: String::new(),
            image_data: Vec::new(),
            model_data: None,
        };

        let image = self.image.unwrap_or_default();
        Ok(NewArtwork {
            filename: image.filename,
            image_data: image.data,
            ..new
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(fields: &[(&str, &str)]) -> UploadForm {
        UploadForm {
            image: Some(UploadedFile {
                filename: "sunset.png".to_string(),
                content_type: Some("image/png".to_string()),
                data: vec![1, 2, 3],
            }),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_full_form() {
        let new = form(&[
            ("name", "  Sunset "),
            ("price", "120.5"),
            ("year_created", "1999"),
            ("owner_id", "4"),
            ("artist", "Ana"),
            ("style", ""),
        ])
        .into_new_artwork()
        .unwrap();

        assert_eq!(new.name, "Sunset");
        assert_eq!(new.price, Some(120.5));
        assert_eq!(new.year_created, Some(1999));
        assert_eq!(new.owner_id, Some(OwnerId(4)));
        assert_eq!(new.artist.as_deref(), Some("Ana"));
        assert_eq!(new.style, None);
        assert_eq!(new.filename, "sunset.png");
        assert_eq!(new.image_data, vec![1, 2, 3]);
    }

    #[test]
    fn test_file_checks_come_first() {
        let mut missing = form(&[]);
        missing.image = None;
        assert_eq!(missing.into_new_artwork().unwrap_err(), UploadError::NoFile);

        let mut unnamed = form(&[]);
        if let Some(image) = unnamed.image.as_mut() {
            image.filename.clear();
        }
        assert_eq!(unnamed.into_new_artwork().unwrap_err(), UploadError::NoFilename);

        let mut text = form(&[("name", "x")]);
        if let Some(image) = text.image.as_mut() {
            image.content_type = Some("text/plain".to_string());
        }
        assert_eq!(text.into_new_artwork().unwrap_err(), UploadError::InvalidType);

        let mut untyped = form(&[("name", "x")]);
        if let Some(image) = untyped.image.as_mut() {
            image.content_type = None;
        }
        assert_eq!(untyped.into_new_artwork().unwrap_err(), UploadError::InvalidType);
    }

    #[test]
    fn test_name_required() {
        assert_eq!(form(&[]).into_new_artwork().unwrap_err(), UploadError::MissingName);
        assert_eq!(
            form(&[("name", "   ")]).into_new_artwork().unwrap_err(),
            UploadError::MissingName
        );
    }

    #[test]
    fn test_bad_numbers() {
        assert_eq!(
            form(&[("name", "x"), ("price", "cheap")]).into_new_artwork().unwrap_err(),
            UploadError::InvalidNumber("price")
        );
        assert_eq!(
            form(&[("name", "x"), ("price", "NaN")]).into_new_artwork().unwrap_err(),
            UploadError::InvalidNumber("price")
        );
        assert_eq!(
            form(&[("name", "x"), ("year_created", "1999.5")]).into_new_artwork().unwrap_err(),
            UploadError::InvalidNumber("year_created")
        );
        assert_eq!(
            form(&[("name", "x"), ("owner_id", "-1")]).into_new_artwork().unwrap_err(),
            UploadError::InvalidNumber("owner_id")
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            UploadError::NoFile.to_string(),
            "No file uploaded. Please select an image file."
        );
        assert_eq!(UploadError::MissingName.to_string(), "Artwork name is required.");
        assert_eq!(
            UploadError::FileTooLarge(4096).to_string(),
            "File is too large. The limit is 4096 bytes."
        );
    }

    #[test]
    fn test_limits() {
        let limits = UploadLimits::default();
        assert_eq!(limits.max_file_bytes, DEFAULT_MAX_FILE_BYTES);
        assert_eq!(limits.max_field_bytes, DEFAULT_MAX_FIELD_BYTES);
        assert!(limits.max_total_bytes > limits.max_file_bytes);
        assert_eq!(UploadLimits::for_file_size(usize::MAX).max_total_bytes, usize::MAX);

        assert!(UploadError::FieldTooLarge("name".to_string()).is_too_large());
        assert!(UploadError::RequestTooLarge(1).is_too_large());
        assert!(!UploadError::NoFile.is_too_large());
    }
}
