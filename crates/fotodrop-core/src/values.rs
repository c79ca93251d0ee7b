//! Validated scalar wrappers for upload attributes.
//!
//! Each wrapper rejects invalid input at construction, so an invalid
//! instance is never observable. Deserialization routes through the same
//! constructors via `try_from`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Maximum accepted filename length, in characters.
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Image MIME types accepted for upload.
pub const ALLOWED_CONTENT_TYPES: &[&str] =
    &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// An original upload filename: non-empty, at most 255 characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Filename(String);

impl Filename {
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::EmptyFilename);
        }
        if name.chars().count() > MAX_FILENAME_LENGTH {
            return Err(DomainError::FilenameTooLong);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercase extension after the last dot, if any.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.0.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_lowercase())
    }
}

impl TryFrom<String> for Filename {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Filename> for String {
    fn from(value: Filename) -> Self {
        value.0
    }
}

impl fmt::Display for Filename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A strictly positive file size in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct FileSize(u64);

impl FileSize {
    pub fn new(bytes: u64) -> Result<Self, DomainError> {
        if bytes == 0 {
            return Err(DomainError::ZeroFileSize);
        }
        Ok(Self(bytes))
    }

    pub fn bytes(&self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for FileSize {
    type Error = DomainError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FileSize> for u64 {
    fn from(value: FileSize) -> Self {
        value.0
    }
}

/// An image MIME type from the closed allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentType(String);

impl ContentType {
    pub fn new(content_type: &str) -> Result<Self, DomainError> {
        let normalized = content_type.trim().to_lowercase();
        if !ALLOWED_CONTENT_TYPES.contains(&normalized.as_str()) {
            return Err(DomainError::UnsupportedContentType(
                content_type.to_string(),
            ));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ContentType {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<ContentType> for String {
    fn from(value: ContentType) -> Self {
        value.0
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_rejects_empty() {
        assert_eq!(Filename::new(""), Err(DomainError::EmptyFilename));
        assert_eq!(Filename::new("   "), Err(DomainError::EmptyFilename));
    }

    #[test]
    fn test_filename_rejects_overlong() {
        let name = "a".repeat(MAX_FILENAME_LENGTH + 1);
        assert_eq!(Filename::new(name), Err(DomainError::FilenameTooLong));
        assert!(Filename::new("a".repeat(MAX_FILENAME_LENGTH)).is_ok());
    }

    #[test]
    fn test_filename_extension() {
        let name = Filename::new("Holiday.Trip.JPG").unwrap();
        assert_eq!(name.extension().as_deref(), Some("jpg"));

        assert_eq!(Filename::new("noext").unwrap().extension(), None);
        assert_eq!(Filename::new(".hidden").unwrap().extension(), None);
        assert_eq!(Filename::new("trailing.").unwrap().extension(), None);
    }

    #[test]
    fn test_file_size_rejects_zero() {
        assert_eq!(FileSize::new(0), Err(DomainError::ZeroFileSize));
        assert_eq!(FileSize::new(1).unwrap().bytes(), 1);
    }

    #[test]
    fn test_content_type_allow_list() {
        assert!(ContentType::new("image/jpeg").is_ok());
        assert!(ContentType::new("image/webp").is_ok());
        assert_eq!(
            ContentType::new("IMAGE/PNG").unwrap().as_str(),
            "image/png"
        );

        assert_eq!(
            ContentType::new("application/pdf"),
            Err(DomainError::UnsupportedContentType(
                "application/pdf".to_string()
            ))
        );
        assert!(ContentType::new("video/mp4").is_err());
    }

    #[test]
    fn test_scalars_reject_invalid_on_deserialize() {
        assert!(serde_json::from_str::<Filename>("\"\"").is_err());
        assert!(serde_json::from_str::<FileSize>("0").is_err());
        assert!(serde_json::from_str::<ContentType>("\"text/html\"").is_err());
        assert!(serde_json::from_str::<ContentType>("\"image/png\"").is_ok());
    }
}
