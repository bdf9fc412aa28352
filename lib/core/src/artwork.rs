use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::defaults::DEFAULT_NAME;
use crate::error::{Error, Result};

/// Identity of a stored artwork, assigned by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtworkId(pub u64);

impl fmt::Display for ArtworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of the user who uploaded an artwork
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub u64);

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An uploaded artwork with its source image and generated model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtworkRecord {
    pub id: ArtworkId,
    pub owner_id: Option<OwnerId>,
    pub name: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub artwork_type: Option<String>,
    pub artist: Option<String>,
    pub year_created: Option<i32>,
    pub dimensions: Option<String>,
    pub medium: Option<String>,
    pub style: Option<String>,
    /// Original upload filename
    pub filename: String,
    /// Source image bytes, always present
    pub image_data: Vec<u8>,
    /// Generated GLB bytes, present once mesh generation succeeded
    pub model_data: Option<Vec<u8>>,
    pub created_at: DateTime<Utc>,
}

impl ArtworkRecord {
    /// Materialize a record from an insert payload
    pub fn from_new(id: ArtworkId, new: NewArtwork) -> Self {
        Self::from_new_at(id, new, Utc::now())
    }

    /// Materialize a record with an explicit creation time
    pub fn from_new_at(id: ArtworkId, new: NewArtwork, created_at: DateTime<Utc>) -> Self {
        let name = match clean_text(Some(new.name)) {
            Some(name) => name,
            None => DEFAULT_NAME.to_string(),
        };

        Self {
            id,
            owner_id: new.owner_id,
            name,
            description: clean_text(new.description),
            price: new.price,
            artwork_type: clean_text(new.artwork_type),
            artist: clean_text(new.artist),
            year_created: new.year_created,
            dimensions: clean_text(new.dimensions),
            medium: clean_text(new.medium),
            style: clean_text(new.style),
            filename: new.filename,
            image_data: new.image_data,
            model_data: new.model_data,
            created_at,
        }
    }

    #[inline]
    pub fn has_model(&self) -> bool {
        self.model_data.is_some()
    }

    pub fn summary(&self) -> ArtworkSummary {
        ArtworkSummary::from(self)
    }
}

impl AsRef<ArtworkRecord> for ArtworkRecord {
    fn as_ref(&self) -> &ArtworkRecord {
        self
    }
}

/// Insert payload for a new artwork
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewArtwork {
    pub owner_id: Option<OwnerId>,
    pub name: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub artwork_type: Option<String>,
    pub artist: Option<String>,
    pub year_created: Option<i32>,
    pub dimensions: Option<String>,
    pub medium: Option<String>,
    pub style: Option<String>,
    pub filename: String,
    pub image_data: Vec<u8>,
    pub model_data: Option<Vec<u8>>,
}

impl NewArtwork {
    pub fn new(name: impl Into<String>, filename: impl Into<String>, image_data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            filename: filename.into(),
            image_data,
            ..Default::default()
        }
    }

    /// Check the invariants a record must hold before it is stored
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidInput("Artwork name is required.".to_string()));
        }
        if self.image_data.is_empty() {
            return Err(Error::InvalidInput("Image data is required.".to_string()));
        }
        Ok(())
    }
}

/// A partial metadata edit
///
/// `None` leaves a field unchanged. For optional fields `Some(None)` clears
/// the stored value. Binary payloads are never edited.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtworkUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub price: Option<Option<f64>>,
    pub artwork_type: Option<Option<String>>,
    pub artist: Option<Option<String>>,
    pub year_created: Option<Option<i32>>,
    pub dimensions: Option<Option<String>>,
    pub medium: Option<Option<String>>,
    pub style: Option<Option<String>>,
}

impl ArtworkUpdate {
    /// Parse an edit from a JSON object
    ///
    /// Only keys present in the object are touched. Strings are trimmed and an
    /// empty string or `null` clears an optional field. Numbers may be given
    /// as JSON numbers or numeric strings.
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::InvalidInput("Expected a JSON object".to_string()))?;

        let mut update = ArtworkUpdate::default();

        if let Some(v) = obj.get("name") {
            update.name = Some(json_text("name", v)?.unwrap_or_default());
        }
        if let Some(v) = obj.get("description") {
            update.description = Some(json_text("description", v)?);
        }
        if let Some(v) = obj.get("price") {
            update.price = Some(json_number("price", v)?);
        }
        if let Some(v) = obj.get("artwork_type") {
            update.artwork_type = Some(json_text("artwork_type", v)?);
        }
        if let Some(v) = obj.get("artist") {
            update.artist = Some(json_text("artist", v)?);
        }
        if let Some(v) = obj.get("year_created") {
            update.year_created = Some(json_year(v)?);
        }
        if let Some(v) = obj.get("dimensions") {
            update.dimensions = Some(json_text("dimensions", v)?);
        }
        if let Some(v) = obj.get("medium") {
            update.medium = Some(json_text("medium", v)?);
        }
        if let Some(v) = obj.get("style") {
            update.style = Some(json_text("style", v)?);
        }

        Ok(update)
    }

    pub fn is_empty(&self) -> bool {
        *self == ArtworkUpdate::default()
    }

    /// Apply the edit in place
    ///
    /// Fails without touching the record when the new name is empty.
    pub fn apply(&self, record: &mut ArtworkRecord) -> Result<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(Error::InvalidInput("Artwork name cannot be empty.".to_string()));
            }
        }

        if let Some(name) = &self.name {
            record.name = name.trim().to_string();
        }
        if let Some(description) = &self.description {
            record.description = clean_text(description.clone());
        }
        if let Some(price) = self.price {
            record.price = price;
        }
        if let Some(artwork_type) = &self.artwork_type {
            record.artwork_type = clean_text(artwork_type.clone());
        }
        if let Some(artist) = &self.artist {
            record.artist = clean_text(artist.clone());
        }
        if let Some(year) = self.year_created {
            record.year_created = year;
        }
        if let Some(dimensions) = &self.dimensions {
            record.dimensions = clean_text(dimensions.clone());
        }
        if let Some(medium) = &self.medium {
            record.medium = clean_text(medium.clone());
        }
        if let Some(style) = &self.style {
            record.style = clean_text(style.clone());
        }

        Ok(())
    }
}

/// JSON view of a record without its binary payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtworkSummary {
    pub id: ArtworkId,
    pub name: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub artwork_type: Option<String>,
    pub artist: Option<String>,
    pub year_created: Option<i32>,
    pub dimensions: Option<String>,
    pub medium: Option<String>,
    pub style: Option<String>,
    pub created_at: String,
    pub filename: String,
    pub owner_id: Option<OwnerId>,
    pub has_model: bool,
}

impl From<&ArtworkRecord> for ArtworkSummary {
    fn from(record: &ArtworkRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            description: record.description.clone(),
            price: record.price,
            artwork_type: record.artwork_type.clone(),
            artist: record.artist.clone(),
            year_created: record.year_created,
            dimensions: record.dimensions.clone(),
            medium: record.medium.clone(),
            style: record.style.clone(),
            created_at: record.created_at.to_rfc3339(),
            filename: record.filename.clone(),
            owner_id: record.owner_id,
            has_model: record.has_model(),
        }
    }
}

/// Trim a text field; blank values become `None`
pub fn clean_text(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == s.len() {
            Some(s)
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn json_text(field: &str, value: &Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(clean_text(Some(s.clone()))),
        Value::Number(n) => Ok(Some(n.to_string())),
        _ => Err(Error::InvalidInput(format!("Field '{}' must be a string", field))),
    }
}

fn json_number(field: &str, value: &Value) -> Result<Option<f64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| Error::InvalidInput(format!("Field '{}' must be a number", field))),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| Error::InvalidInput(format!("Field '{}' must be a number", field))),
        _ => Err(Error::InvalidInput(format!("Field '{}' must be a number", field))),
    }
}

fn json_year(value: &Value) -> Result<Option<i32>> {
    let invalid = || Error::InvalidInput("Field 'year_created' must be an integer".to_string());
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .and_then(|y| i32::try_from(y).ok())
            .map(Some)
            .ok_or_else(invalid),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s.trim().parse::<i32>().map(Some).map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}
