use chrono::{DateTime, Utc};
use common::storage::{StorageKey, extension_of};
use thiserror::Error;

use crate::config::UploadConfig;

const MAX_FILENAME_CHARS: usize = 255;

/// Upload category, inferred from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Image,
    Video,
    Document,
    Audio,
    Archive,
}

impl FileCategory {
    const ALL: [FileCategory; 5] = [
        FileCategory::Image,
        FileCategory::Video,
        FileCategory::Document,
        FileCategory::Audio,
        FileCategory::Archive,
    ];

    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            FileCategory::Image => &["jpg", "jpeg", "png", "gif", "webp", "svg", "bmp"],
            FileCategory::Video => &["mp4", "mpeg", "mov", "avi", "flv", "webm", "mkv"],
            FileCategory::Document => &[
                "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "csv",
            ],
            FileCategory::Audio => &["mp3", "wav", "ogg", "flac", "aac", "m4a"],
            FileCategory::Archive => &["zip", "rar", "7z", "tar", "gz"],
        }
    }

    /// Category for a lowercase extension, or `None` if it is not allowed.
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.extensions().contains(&ext))
    }

    /// Directory under `public/` holding this category's objects.
    pub fn dir(self) -> &'static str {
        match self {
            FileCategory::Image => "images",
            FileCategory::Video => "videos",
            FileCategory::Document => "documents",
            FileCategory::Audio => "audios",
            FileCategory::Archive => "archives",
        }
    }

    pub fn max_bytes(self, config: &UploadConfig) -> u64 {
        match self {
            FileCategory::Image => config.image_max_bytes,
            FileCategory::Video => config.video_max_bytes,
            FileCategory::Document => config.document_max_bytes,
            FileCategory::Audio => config.audio_max_bytes,
            FileCategory::Archive => config.archive_max_bytes,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FileCategory::Image => "image",
            FileCategory::Video => "video",
            FileCategory::Document => "document",
            FileCategory::Audio => "audio",
            FileCategory::Archive => "archive",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("File is empty")]
    Empty,
    #[error("Filename cannot be empty")]
    MissingFilename,
    #[error("Filename is too long (max {MAX_FILENAME_CHARS} characters)")]
    FilenameTooLong,
    #[error("Invalid filename: path separators are not allowed")]
    PathSeparator,
    #[error("Invalid filename: '..' is not allowed")]
    PathTraversal,
    #[error("Invalid filename: control characters are not allowed")]
    ControlCharacter,
    #[error("Invalid filename: hidden files (starting with '.') are not allowed")]
    Hidden,
    #[error("Cannot determine file extension")]
    MissingExtension,
    #[error("Unsupported file extension: .{0}")]
    UnsupportedExtension(String),
    #[error("{category} files may be at most {limit_mib} MiB (got {size} bytes)")]
    TooLarge {
        category: &'static str,
        limit_mib: u64,
        size: u64,
    },
}

/// A validated upload, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUpload {
    pub filename: String,
    pub category: FileCategory,
    pub content_type: String,
}

impl ValidatedUpload {
    /// `public/<category>/<yyyy>/<mm>/<dd>/<uuid>.<ext>`
    pub fn storage_key(&self, now: DateTime<Utc>) -> StorageKey {
        StorageKey::generate(&format!("public/{}", self.category.dir()), &self.filename, now)
    }
}

/// Validate a flat filename (no directory components).
pub fn validate_filename(filename: &str) -> Result<&str, UploadError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(UploadError::MissingFilename);
    }
    if trimmed.chars().count() > MAX_FILENAME_CHARS {
        return Err(UploadError::FilenameTooLong);
    }
    // Also rejects NUL and CR/LF, which would break Content-Disposition.
    if trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err(UploadError::ControlCharacter);
    }
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(UploadError::PathSeparator);
    }
    if trimmed.contains("..") {
        return Err(UploadError::PathTraversal);
    }
    if trimmed.starts_with('.') {
        return Err(UploadError::Hidden);
    }

    Ok(trimmed)
}

/// Check name, extension and size of an incoming file.
pub fn validate_upload(
    filename: &str,
    size: u64,
    config: &UploadConfig,
) -> Result<ValidatedUpload, UploadError> {
    if size == 0 {
        return Err(UploadError::Empty);
    }

    let filename = validate_filename(filename)?;
    let ext = extension_of(filename)
        .map(|e| e.to_ascii_lowercase())
        .ok_or(UploadError::MissingExtension)?;
    let category =
        FileCategory::from_extension(&ext).ok_or(UploadError::UnsupportedExtension(ext))?;

    let limit = category.max_bytes(config);
    if size > limit {
        return Err(UploadError::TooLarge {
            category: category.name(),
            limit_mib: limit / (1024 * 1024),
            size,
        });
    }

    let content_type = mime_guess::from_path(filename)
        .first_or_octet_stream()
        .to_string();

    Ok(ValidatedUpload {
        filename: filename.to_string(),
        category,
        content_type,
    })
}
