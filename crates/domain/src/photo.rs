use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Comment, CommentId, PhotoId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaUrls {
    pub thumbnail: Option<String>,
    pub medium: Option<String>,
    pub large: Option<String>,
    pub original: Option<String>,
}

impl MediaUrls {
    /// Largest rendition suitable for full-screen display.
    pub fn best_for_display(&self) -> Option<&str> {
        self.large
            .as_deref()
            .or(self.medium.as_deref())
            .or(self.original.as_deref())
            .or(self.thumbnail.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    pub id: PhotoId,
    pub media_type: MediaType,
    pub filename: String,
    pub file_size: Option<u64>,
    pub urls: MediaUrls,
    pub dimensions: Option<Dimensions>,
    pub is_favorite: bool,
    pub favorites_count: u32,
    pub comments: Vec<Comment>,
    pub comments_count: u32,
    pub duration_secs: Option<f64>,
}

/// Photo as reported by the backend, before count normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPhoto {
    pub id: PhotoId,
    pub media_type: MediaType,
    pub filename: String,
    pub file_size: Option<u64>,
    pub urls: MediaUrls,
    pub dimensions: Option<Dimensions>,
    pub is_favorite: bool,
    pub favorites_count: Option<i64>,
    pub comments: Vec<Comment>,
    pub comments_count: Option<i64>,
    pub duration_secs: Option<f64>,
}

impl RawPhoto {
    pub fn normalize(self) -> Photo {
        let carried = self.comments.len() as u32;
        let comments_count = self
            .comments_count
            .map(clamp_count)
            .unwrap_or(carried)
            .max(carried);
        Photo {
            id: self.id,
            media_type: self.media_type,
            filename: self.filename,
            file_size: self.file_size,
            urls: self.urls,
            dimensions: self.dimensions,
            is_favorite: self.is_favorite,
            favorites_count: self.favorites_count.map(clamp_count).unwrap_or(0),
            comments: self.comments,
            comments_count,
            duration_secs: self.duration_secs.filter(|secs| secs.is_finite() && *secs > 0.0),
        }
    }
}

fn is_video_url(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    detect_media_type(Path::new(path)) == Some(MediaType::Video)
}

fn clamp_count(value: i64) -> u32 {
    value.clamp(0, i64::from(u32::MAX)) as u32
}

/// State captured before an optimistic favorite toggle, used to roll back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FavoriteSnapshot {
    pub is_favorite: bool,
    pub favorites_count: u32,
}

impl Photo {
    pub fn is_video(&self) -> bool {
        self.media_type == MediaType::Video
    }

    /// Still image to show for this item. Videos use their poster frame
    /// and never resolve to the video file itself.
    pub fn display_url(&self) -> Option<&str> {
        match self.media_type {
            MediaType::Image => self.urls.best_for_display(),
            MediaType::Video => [&self.urls.thumbnail, &self.urls.medium, &self.urls.large]
                .into_iter()
                .filter_map(|url| url.as_deref())
                .find(|url| !is_video_url(url)),
        }
    }

    pub fn toggle_favorite(&mut self) -> FavoriteSnapshot {
        let snapshot = FavoriteSnapshot {
            is_favorite: self.is_favorite,
            favorites_count: self.favorites_count,
        };
        self.is_favorite = !self.is_favorite;
        self.favorites_count = if self.is_favorite {
            self.favorites_count.saturating_add(1)
        } else {
            self.favorites_count.saturating_sub(1)
        };
        snapshot
    }

    pub fn restore_favorite(&mut self, snapshot: FavoriteSnapshot) {
        self.is_favorite = snapshot.is_favorite;
        self.favorites_count = snapshot.favorites_count;
    }

    pub fn push_comment(&mut self, comment: Comment) {
        self.comments.push(comment);
        self.sync_comment_count();
    }

    pub fn remove_comment(&mut self, comment_id: &CommentId) -> Option<Comment> {
        let position = self
            .comments
            .iter()
            .position(|comment| &comment.id == comment_id)?;
        let removed = self.comments.remove(position);
        self.sync_comment_count();
        Some(removed)
    }

    /// Puts a comment back at `index`, clamped to the end of the list.
    pub fn insert_comment(&mut self, index: usize, comment: Comment) {
        let index = index.min(self.comments.len());
        self.comments.insert(index, comment);
        self.sync_comment_count();
    }

    pub fn set_comments(&mut self, comments: Vec<Comment>) {
        self.comments = comments;
        self.sync_comment_count();
    }

    pub fn replace_comment(&mut self, comment_id: &CommentId, comment: Comment) -> bool {
        match self
            .comments
            .iter_mut()
            .find(|existing| &existing.id == comment_id)
        {
            Some(existing) => {
                *existing = comment;
                true
            }
            None => false,
        }
    }

    fn sync_comment_count(&mut self) {
        self.comments_count = self.comments.len() as u32;
    }
}

pub fn detect_media_type(path: &Path) -> Option<MediaType> {
    let ext = path.extension().and_then(|ext| ext.to_str())?;

    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" | "png" | "webp" | "heic" | "gif" | "tif" | "tiff" => {
            Some(MediaType::Image)
        }
        "mp4" | "mov" | "m4v" | "webm" => Some(MediaType::Video),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) fn sample_photo(id: &str, media_type: MediaType) -> Photo {
    Photo {
        id: PhotoId::new(id).expect("id"),
        media_type,
        filename: format!("{id}.jpg"),
        file_size: Some(1024),
        urls: MediaUrls::default(),
        dimensions: None,
        is_favorite: false,
        favorites_count: 0,
        comments: Vec::new(),
        comments_count: 0,
        duration_secs: None,
    }
}
