// src/reddit/classify.rs

use super::post::RedditPost;

/// The post shapes media can be pulled from, in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostShape {
    Gallery,
    HostedImage,
    HostedVideo,
    RichVideo,
    PreviewImages,
    ImgurLink,
}

/// Result of classifying one post. `shape == None` means nothing matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub shape: Option<PostShape>,
    pub urls: Vec<String>,
    pub title: String,
}

struct Strategy {
    shape: PostShape,
    matches: fn(&RedditPost) -> bool,
    extract: fn(&RedditPost) -> Vec<String>,
}

const STRATEGIES: &[Strategy] = &[
    Strategy { shape: PostShape::Gallery, matches: is_gallery, extract: gallery_urls },
    Strategy { shape: PostShape::HostedImage, matches: is_hosted_image, extract: hosted_image_url },
    Strategy { shape: PostShape::HostedVideo, matches: is_hosted_video, extract: hosted_video_url },
    Strategy { shape: PostShape::RichVideo, matches: is_rich_video, extract: rich_video_url },
    Strategy { shape: PostShape::PreviewImages, matches: has_preview_images, extract: preview_image_urls },
    Strategy { shape: PostShape::ImgurLink, matches: is_imgur_link, extract: imgur_url },
];

const MEDIA_EXTENSIONS: &[&str] = &[".jpg", ".png", ".gif", ".mp4"];

/// Picks the first matching shape and extracts its media URLs.
///
/// Later shapes are not consulted once one matches, even if the match
/// yields no URLs (a gallery whose items are all still processing).
pub fn classify(post: &RedditPost) -> Classification {
    let title = post.title().to_string();
    match STRATEGIES.iter().find(|s| (s.matches)(post)) {
        Some(strategy) => Classification { shape: Some(strategy.shape), urls: (strategy.extract)(post), title },
        None => Classification { shape: None, urls: Vec::new(), title },
    }
}

fn unescape(url: &str) -> String {
    url.replace("&amp;", "&")
}

fn hint_is(post: &RedditPost, hint: &str) -> bool {
    post.post_hint.as_deref() == Some(hint)
}

fn is_gallery(post: &RedditPost) -> bool {
    post.is_gallery == Some(true)
}

fn gallery_urls(post: &RedditPost) -> Vec<String> {
    let (Some(gallery), Some(metadata)) = (&post.gallery_data, &post.media_metadata) else {
        return Vec::new();
    };
    gallery
        .items
        .iter()
        .filter_map(|item| metadata.get(&item.media_id))
        .filter(|meta| meta.status.as_deref() == Some("valid"))
        .filter_map(|meta| {
            let s = meta.s.as_ref()?;
            [&s.u, &s.gif, &s.mp4, &s.url]
                .into_iter()
                .flatten()
                .find(|url| !url.is_empty())
                .map(|url| unescape(url))
        })
        .collect()
}

fn is_hosted_image(post: &RedditPost) -> bool {
    hint_is(post, "image") && post.url.is_some()
}

fn hosted_image_url(post: &RedditPost) -> Vec<String> {
    post.url.iter().cloned().collect()
}

fn is_hosted_video(post: &RedditPost) -> bool {
    hint_is(post, "hosted:video") && post.media.is_some()
}

fn hosted_video_url(post: &RedditPost) -> Vec<String> {
    post.media
        .as_ref()
        .and_then(|m| m.reddit_video.as_ref())
        .and_then(|v| v.fallback_url.clone())
        .into_iter()
        .collect()
}

fn is_rich_video(post: &RedditPost) -> bool {
    hint_is(post, "rich:video") && post.preview.is_some()
}

fn rich_video_url(post: &RedditPost) -> Vec<String> {
    post.preview
        .as_ref()
        .and_then(|p| p.reddit_video_preview.as_ref())
        .and_then(|v| v.fallback_url.clone())
        .into_iter()
        .collect()
}

fn has_preview_images(post: &RedditPost) -> bool {
    post.preview.as_ref().is_some_and(|p| p.images.is_some())
}

fn preview_image_urls(post: &RedditPost) -> Vec<String> {
    post.preview
        .as_ref()
        .and_then(|p| p.images.as_ref())
        .map(|images| images.iter().map(|img| unescape(&img.source.url)).collect())
        .unwrap_or_default()
}

fn is_imgur_link(post: &RedditPost) -> bool {
    post.url.as_deref().is_some_and(|url| url.contains("imgur.com"))
}

fn imgur_url(post: &RedditPost) -> Vec<String> {
    post.url.as_deref().map(with_media_extension).into_iter().collect()
}

/// Imgur page links serve the image when `.jpg` is appended.
pub fn with_media_extension(url: &str) -> String {
    if MEDIA_EXTENSIONS.iter().any(|ext| url.ends_with(ext)) {
        url.to_string()
    } else {
        format!("{url}.jpg")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn post(value: Value) -> RedditPost {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn gallery_takes_first_present_key_in_item_order() {
        let p = post(json!({
            "title": "Gallery",
            "is_gallery": true,
            "gallery_data": {"items": [{"media_id": "b"}, {"media_id": "a"}, {"media_id": "c"}]},
            "media_metadata": {
                "a": {"status": "valid", "s": {"url": "https://i.redd.it/a.png?w=1&amp;s=2"}},
                "b": {"status": "valid", "s": {"gif": "https://i.redd.it/b.gif?x=1&amp;y=2"}},
                "c": {"status": "failed"}
            }
        }));

        let c = classify(&p);

        assert_eq!(c.shape, Some(PostShape::Gallery));
        assert_eq!(c.urls, vec!["https://i.redd.it/b.gif?x=1&y=2", "https://i.redd.it/a.png?w=1&s=2"]);
        assert_eq!(c.title, "Gallery");
    }

    #[test]
    fn gallery_without_valid_items_does_not_fall_through() {
        let p = post(json!({
            "is_gallery": true,
            "gallery_data": {"items": [{"media_id": "a"}]},
            "media_metadata": {"a": {"status": "unprocessed"}},
            "preview": {"images": [{"source": {"url": "https://preview/a.jpg"}}]}
        }));

        let c = classify(&p);

        assert_eq!(c.shape, Some(PostShape::Gallery));
        assert!(c.urls.is_empty());
    }

    #[test]
    fn hosted_image_uses_post_url() {
        let c = classify(&post(json!({"post_hint": "image", "url": "https://i.redd.it/x.jpg"})));
        assert_eq!(c.shape, Some(PostShape::HostedImage));
        assert_eq!(c.urls, vec!["https://i.redd.it/x.jpg"]);
    }

    #[test]
    fn hosted_video_returns_fallback_url_only() {
        let c = classify(&post(json!({
            "post_hint": "hosted:video",
            "url": "https://v.redd.it/abc",
            "media": {"reddit_video": {"fallback_url": "https://v.redd.it/abc/DASH_720.mp4?source=fallback"}},
            "preview": {"images": [{"source": {"url": "https://preview/thumb.jpg"}}]}
        })));
        assert_eq!(c.shape, Some(PostShape::HostedVideo));
        assert_eq!(c.urls, vec!["https://v.redd.it/abc/DASH_720.mp4?source=fallback"]);
    }

    #[test]
    fn rich_video_uses_preview_fallback() {
        let c = classify(&post(json!({
            "post_hint": "rich:video",
            "preview": {"reddit_video_preview": {"fallback_url": "https://v.redd.it/gif/DASH_480.mp4"}}
        })));
        assert_eq!(c.shape, Some(PostShape::RichVideo));
        assert_eq!(c.urls, vec!["https://v.redd.it/gif/DASH_480.mp4"]);
    }

    #[test]
    fn preview_images_are_unescaped() {
        let c = classify(&post(json!({
            "post_hint": "link",
            "preview": {"images": [
                {"source": {"url": "https://preview.redd.it/1.jpg?a=1&amp;b=2"}},
                {"source": {"url": "https://preview.redd.it/2.jpg"}}
            ]}
        })));
        assert_eq!(c.shape, Some(PostShape::PreviewImages));
        assert_eq!(c.urls, vec!["https://preview.redd.it/1.jpg?a=1&b=2", "https://preview.redd.it/2.jpg"]);
    }

    #[test]
    fn imgur_link_gets_jpg_exactly_once() {
        let c = classify(&post(json!({"url": "https://imgur.com/AbC123"})));
        assert_eq!(c.shape, Some(PostShape::ImgurLink));
        assert_eq!(c.urls, vec!["https://imgur.com/AbC123.jpg"]);

        assert_eq!(with_media_extension("https://i.imgur.com/AbC123.jpg"), "https://i.imgur.com/AbC123.jpg");
        assert_eq!(with_media_extension("https://i.imgur.com/AbC123.mp4"), "https://i.imgur.com/AbC123.mp4");
        assert_eq!(with_media_extension(&with_media_extension("https://imgur.com/x")), "https://imgur.com/x.jpg");
    }

    #[test]
    fn unmatched_post_is_empty_with_title() {
        let c = classify(&post(json!({
            "title": "Just text",
            "post_hint": "self",
            "url": "https://www.reddit.com/r/rust/comments/abc/just_text/"
        })));
        assert_eq!(c, Classification { shape: None, urls: Vec::new(), title: "Just text".into() });
    }
}
