//! Media Router (C3) — extension-based attachment classifier
//!
//! A pure, stateless classifier: given a file name or path, decide which of
//! `{image, video, voice, document}` it belongs to, and look up the
//! configured byte-size cap for a category.

use std::collections::HashMap;

use crate::value_objects::MediaCategory;

/// Extension → category table, built once from configuration. Extension
/// comparison is case-insensitive; entries may be given with or without a
/// leading dot.
#[derive(Debug, Clone, Default)]
pub struct MediaRouter {
    image: Vec<String>,
    video: Vec<String>,
    voice: Vec<String>,
    document: Vec<String>,
    max_size_bytes: HashMap<MediaCategory, u64>,
}

impl MediaRouter {
    /// Build a router from per-category allowed-extension lists and
    /// per-category size caps in mebibytes.
    #[must_use]
    pub fn new(
        image: &[String],
        video: &[String],
        voice: &[String],
        document: &[String],
        max_size_mb: &HashMap<MediaCategory, u64>,
    ) -> Self {
        let mut max_size_bytes = HashMap::with_capacity(max_size_mb.len());
        for (category, mb) in max_size_mb {
            max_size_bytes.insert(*category, mb.saturating_mul(1_048_576));
        }
        Self {
            image: normalize_list(image),
            video: normalize_list(video),
            voice: normalize_list(voice),
            document: normalize_list(document),
            max_size_bytes,
        }
    }

    /// Classify a file name or path into a media category. `document` is
    /// the default when no configured list claims the extension.
    #[must_use]
    pub fn classify(&self, file_name: &str) -> MediaCategory {
        let ext = extension_of(file_name);
        if self.image.iter().any(|e| e == &ext) {
            MediaCategory::Image
        } else if self.video.iter().any(|e| e == &ext) {
            MediaCategory::Video
        } else if self.voice.iter().any(|e| e == &ext) {
            MediaCategory::Voice
        } else if self.document.iter().any(|e| e == &ext) {
            MediaCategory::Document
        } else {
            MediaCategory::Document
        }
    }

    /// The configured byte-size cap for a category, if any was configured.
    #[must_use]
    pub fn max_size_bytes(&self, category: MediaCategory) -> Option<u64> {
        self.max_size_bytes.get(&category).copied()
    }

    /// Whether `size_bytes` exceeds the configured cap for `category`. A
    /// category with no configured cap never rejects on size.
    #[must_use]
    pub fn exceeds_limit(&self, category: MediaCategory, size_bytes: u64) -> bool {
        self.max_size_bytes(category)
            .is_some_and(|limit| size_bytes > limit)
    }
}

fn normalize_list(list: &[String]) -> Vec<String> {
    list.iter()
        .map(|e| e.trim_start_matches('.').to_lowercase())
        .collect()
}

fn extension_of(file_name: &str) -> String {
    file_name
        .rsplit('.')
        .next()
        .filter(|ext| *ext != file_name)
        .unwrap_or_default()
        .to_lowercase()
}
