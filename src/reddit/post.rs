// src/reddit/post.rs

use serde::Deserialize;
use std::collections::HashMap;

pub const DEFAULT_TITLE: &str = "Reddit Post";

/// The fields of a Reddit post object the classifier looks at.
///
/// Reddit sends `null` for most absent blocks, so everything is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedditPost {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub is_gallery: Option<bool>,
    #[serde(default)]
    pub gallery_data: Option<GalleryData>,
    #[serde(default)]
    pub media_metadata: Option<HashMap<String, MediaMetadata>>,
    #[serde(default)]
    pub post_hint: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub media: Option<Media>,
    #[serde(default)]
    pub preview: Option<Preview>,
}

impl RedditPost {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_TITLE)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GalleryData {
    #[serde(default)]
    pub items: Vec<GalleryItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GalleryItem {
    pub media_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaMetadata {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub s: Option<MediaSource>,
}

/// Largest rendition of a gallery item; which key is set depends on the media type
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaSource {
    #[serde(default)]
    pub u: Option<String>,
    #[serde(default)]
    pub gif: Option<String>,
    #[serde(default)]
    pub mp4: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Media {
    #[serde(default)]
    pub reddit_video: Option<RedditVideo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedditVideo {
    #[serde(default)]
    pub fallback_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Preview {
    #[serde(default)]
    pub images: Option<Vec<PreviewImage>>,
    #[serde(default)]
    pub reddit_video_preview: Option<RedditVideo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreviewImage {
    pub source: ImageSource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageSource {
    pub url: String,
}

/// Pulls the post out of a `/comments/<id>.json` response:
/// `[ {data: {children: [ {data: <post>} ]}}, <comments listing> ]`.
pub fn post_from_listing(listing: &serde_json::Value) -> Option<serde_json::Value> {
    listing.pointer("/0/data/children/0/data").cloned()
}
