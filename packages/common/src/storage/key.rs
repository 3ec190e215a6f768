use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use super::error::StorageError;

const MAX_KEY_LEN: usize = 1024;

/// A validated object key within the bucket.
///
/// Keys are relative (`public/images/2026/01/21/<uuid>.png`): no leading slash,
/// no empty or `.`/`..` segments, no backslashes.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    /// Parse and validate an existing key.
    pub fn parse(s: &str) -> Result<Self, StorageError> {
        if s.is_empty() {
            return Err(StorageError::InvalidKey("key is empty".into()));
        }
        if s.len() > MAX_KEY_LEN {
            return Err(StorageError::InvalidKey(format!(
                "key exceeds {MAX_KEY_LEN} bytes"
            )));
        }
        if s.contains('\\') || s.contains('\0') {
            return Err(StorageError::InvalidKey(format!(
                "key contains a forbidden character: {s}"
            )));
        }
        if s
            .split('/')
            .any(|seg| seg.is_empty() || seg == "." || seg == "..")
        {
            return Err(StorageError::InvalidKey(format!(
                "key has an empty or relative segment: {s}"
            )));
        }
        Ok(Self(s.to_string()))
    }

    /// Generate a fresh key of the form `{prefix}/{yyyy}/{mm}/{dd}/{uuid}{.ext}`.
    ///
    /// The extension is taken from the original filename, lowercased.
    pub fn generate(prefix: &str, original_name: &str, now: DateTime<Utc>) -> Self {
        let ext = extension_of(original_name)
            .map(|e| format!(".{}", e.to_ascii_lowercase()))
            .unwrap_or_default();
        Self(format!(
            "{}/{:04}/{:02}/{:02}/{}{}",
            prefix.trim_matches('/'),
            now.year(),
            now.month(),
            now.day(),
            uuid::Uuid::new_v4(),
            ext
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// CDN path for this key (leading slash).
    pub fn cdn_path(&self) -> String {
        cdn_path(&self.0)
    }
}

/// CDN path for a raw key.
pub fn cdn_path(key: &str) -> String {
    format!("/{}", key.trim_start_matches('/'))
}

/// Extension after the last dot, if any and non-empty.
pub fn extension_of(filename: &str) -> Option<&str> {
    match filename.rfind('.') {
        Some(idx) if idx + 1 < filename.len() => Some(&filename[idx + 1..]),
        _ => None,
    }
}

impl fmt::Debug for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StorageKey({})", self.0)
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for StorageKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for StorageKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
