use super::rendition::Resolution;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque, globally unique video identifier.
///
/// Doubles as the blob-store key of the original upload and as the key
/// prefix of its rendition set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type), sqlx(transparent))]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key prefix under which the renditions are published, e.g. `v1/`.
    pub fn rendition_prefix(&self) -> String {
        format!("{}/", self.0)
    }
}

impl Default for VideoId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for VideoId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for VideoId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persisted video record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Video {
    pub id: VideoId,
    pub name: String,
    pub processed: bool,
    /// Null until the original upload is durably stored.
    #[serde(rename = "uploaded")]
    pub uploaded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: VideoId::new(),
            name: name.into(),
            processed: false,
            uploaded_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// A video is picked up by the pipeline iff its upload is confirmed and
    /// it has not been processed yet.
    pub fn is_eligible(&self) -> bool {
        !self.processed && self.uploaded_at.is_some()
    }

    /// Public playback link of one rendition's manifest.
    pub fn playback_url(&self, cdn_base: &str, resolution: Resolution) -> String {
        format!(
            "{}/{}/{}",
            cdn_base.trim_end_matches('/'),
            self.id,
            resolution.manifest_name()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rendition::DEFAULT_PLAYBACK;

    #[test]
    fn test_new_video_is_not_eligible_until_uploaded() {
        let mut video = Video::new("holiday");
        assert!(!video.processed);
        assert!(!video.is_eligible());

        video.uploaded_at = Some(Utc::now());
        assert!(video.is_eligible());

        video.processed = true;
        assert!(!video.is_eligible());
    }

    #[test]
    fn test_rendition_prefix() {
        assert_eq!(VideoId::from("v1").rendition_prefix(), "v1/");
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(VideoId::new(), VideoId::new());
    }

    #[test]
    fn test_playback_url() {
        let mut video = Video::new("clip");
        video.id = VideoId::from("v1");

        assert_eq!(
            video.playback_url("https://cdn.example.com/", DEFAULT_PLAYBACK),
            "https://cdn.example.com/v1/quality_1280x720.m3u8"
        );
        assert_eq!(
            video.playback_url("https://cdn.example.com", DEFAULT_PLAYBACK),
            "https://cdn.example.com/v1/quality_1280x720.m3u8"
        );
    }
}
