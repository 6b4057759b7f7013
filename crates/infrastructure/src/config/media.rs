//! Media handling configuration: cache directory, size caps, allowed
//! extensions per category, feeding `domain::MediaRouter`.

use std::collections::HashMap;

use domain::MediaCategory;
use serde::{Deserialize, Serialize};

/// Media handling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Local directory attachments are downloaded into before relaying.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,

    /// Maximum size, in mebibytes, accepted per media category.
    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: MaxSizeConfig,

    /// File extensions (without leading dot, lowercase) classified into
    /// each category. Extensions absent from every list still classify as
    /// `document` — the Media Router never fails closed on an unknown
    /// extension, only on size.
    #[serde(default = "default_allowed_types")]
    pub allowed_types: AllowedTypesConfig,

    /// Timeout, in seconds, for a single attachment download.
    #[serde(default = "default_download_timeout")]
    pub download_timeout_sec: u64,
}

/// Per-category byte size caps, in mebibytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaxSizeConfig {
    pub image: u64,
    pub video: u64,
    pub voice: u64,
    pub document: u64,
}

impl MaxSizeConfig {
    /// Convert into the `HashMap<MediaCategory, u64>` shape
    /// `domain::MediaRouter::new` expects.
    #[must_use]
    pub fn as_category_map(&self) -> HashMap<MediaCategory, u64> {
        let mut map = HashMap::new();
        map.insert(MediaCategory::Image, self.image);
        map.insert(MediaCategory::Video, self.video);
        map.insert(MediaCategory::Voice, self.voice);
        map.insert(MediaCategory::Document, self.document);
        map
    }
}

/// Per-category allowed file extensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowedTypesConfig {
    pub image: Vec<String>,
    pub video: Vec<String>,
    pub voice: Vec<String>,
    pub document: Vec<String>,
}

fn default_cache_dir() -> String {
    "./data/media".to_string()
}

fn default_max_size_mb() -> MaxSizeConfig {
    MaxSizeConfig {
        image: 16,
        video: 64,
        voice: 16,
        document: 100,
    }
}

fn default_allowed_types() -> AllowedTypesConfig {
    AllowedTypesConfig {
        image: vec!["jpg", "jpeg", "png", "gif", "webp"]
            .into_iter()
            .map(String::from)
            .collect(),
        video: vec!["mp4", "mov", "avi", "webm"]
            .into_iter()
            .map(String::from)
            .collect(),
        voice: vec!["ogg", "opus", "m4a", "mp3"]
            .into_iter()
            .map(String::from)
            .collect(),
        document: vec!["pdf", "doc", "docx", "txt", "zip"]
            .into_iter()
            .map(String::from)
            .collect(),
    }
}

const fn default_download_timeout() -> u64 {
    15
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            max_size_mb: default_max_size_mb(),
            allowed_types: default_allowed_types(),
            download_timeout_sec: default_download_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_size_converts_to_category_map() {
        let map = default_max_size_mb().as_category_map();
        assert_eq!(map.get(&MediaCategory::Image), Some(&16));
        assert_eq!(map.get(&MediaCategory::Document), Some(&100));
    }
}
