//! JSON bodies exchanged with the gallery backend and their mapping onto
//! domain types. Every endpoint decodes into its own struct.

use serde::{Deserialize, Serialize};
use shotbook_application::ApplicationError;
use shotbook_domain::{
    Annotation, ClientIdentity, Comment, CommentId, Dimensions, DownloadResolution,
    DuplicateMatch, EngagementEvent, Gallery, GalleryId, GalleryPage, GalleryPermissions,
    GuestIdentity, MediaType, MediaUrls, NewComment, Pagination, PhotoId, Privacy, RawPhoto,
};
use tracing::warn;

/// List endpoints answer either with a bare array or with a wrapping object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListBody<T> {
    Bare(Vec<T>),
    Wrapped {
        #[serde(
            alias = "templates",
            alias = "workflows",
            alias = "appointments",
            alias = "comments",
            alias = "duplicates"
        )]
        items: Vec<T>,
    },
}

impl<T> ListBody<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            Self::Bare(items) | Self::Wrapped { items } => items,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageBody {
    #[serde(default)]
    pub gallery: Option<GalleryBody>,
    /// Decoded one by one so a single malformed photo only costs itself.
    #[serde(default)]
    pub photos: Vec<serde_json::Value>,
    #[serde(default)]
    pub pagination: PaginationBody,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PaginationBody {
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PermissionsBody {
    pub allow_downloads: Option<bool>,
    pub allow_comments: Option<bool>,
    pub allow_edits: Option<bool>,
    pub allow_favorites: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GalleryBody {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub client_email: Option<String>,
    #[serde(default)]
    pub permissions: PermissionsBody,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub layout_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PhotoBody {
    pub id: String,
    #[serde(default, alias = "type")]
    pub media_type: Option<MediaType>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub urls: MediaUrls,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub favorites_count: Option<i64>,
    #[serde(default)]
    pub comments: Vec<CommentBody>,
    #[serde(default)]
    pub comments_count: Option<i64>,
    #[serde(default, alias = "duration")]
    pub duration_secs: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentBody {
    pub id: String,
    #[serde(default)]
    pub photo_id: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default, alias = "author_name")]
    pub author: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub annotation: Option<String>,
    #[serde(default, alias = "video_timestamp")]
    pub video_timestamp_secs: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DuplicateBody {
    #[serde(alias = "id")]
    pub photo_id: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadedBody {
    #[serde(alias = "photo_id")]
    pub id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct GuestBody<'a> {
    pub share_token: Option<&'a str>,
    pub guest_email: Option<&'a str>,
    pub guest_name: Option<&'a str>,
}

impl<'a> From<&'a GuestIdentity> for GuestBody<'a> {
    fn from(guest: &'a GuestIdentity) -> Self {
        Self {
            share_token: guest.share_token.as_deref(),
            guest_email: guest.email.as_deref(),
            guest_name: guest.name.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct NewCommentBody<'a> {
    pub text: &'a str,
    pub annotation: Option<String>,
    pub video_timestamp: Option<f64>,
    #[serde(flatten)]
    pub guest: GuestBody<'a>,
}

impl<'a> NewCommentBody<'a> {
    pub(crate) fn new(
        comment: &'a NewComment,
        guest: &'a GuestIdentity,
    ) -> Result<Self, ApplicationError> {
        let annotation = comment
            .annotation
            .as_ref()
            .map(Annotation::to_payload)
            .transpose()?;
        Ok(Self {
            text: &comment.text,
            annotation,
            video_timestamp: comment.video_timestamp_secs,
            guest: GuestBody::from(guest),
        })
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct DownloadBody<'a> {
    pub photo_ids: Vec<&'a str>,
    pub resolution: DownloadResolution,
}

#[derive(Debug, Serialize)]
pub(crate) struct EventBody<'a> {
    pub gallery_id: &'a str,
    pub photo_id: Option<&'a str>,
    pub event_type: shotbook_domain::EngagementKind,
    pub duration_ms: u64,
}

impl<'a> From<&'a EngagementEvent> for EventBody<'a> {
    fn from(event: &'a EngagementEvent) -> Self {
        Self {
            gallery_id: event.gallery_id.as_str(),
            photo_id: event.photo_id.as_ref().map(PhotoId::as_str),
            event_type: event.kind,
            duration_ms: event.elapsed_ms,
        }
    }
}

impl PageBody {
    pub(crate) fn into_domain(self) -> Result<GalleryPage, ApplicationError> {
        let gallery = self.gallery.map(GalleryBody::into_domain).transpose()?;
        let photos = self.photos.into_iter().filter_map(decode_photo).collect();
        Ok(GalleryPage {
            gallery,
            photos,
            pagination: Pagination {
                has_more: self.pagination.has_more,
                next_key: self.pagination.next_key,
            },
        })
    }
}

fn decode_photo(value: serde_json::Value) -> Option<RawPhoto> {
    let id = value
        .get("id")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("<missing>")
        .to_string();
    let decoded = serde_json::from_value::<PhotoBody>(value)
        .map_err(|error| ApplicationError::Decode(error.to_string()))
        .and_then(PhotoBody::into_domain);
    match decoded {
        Ok(photo) => Some(photo),
        Err(error) => {
            warn!(photo_id = %id, %error, "skipping malformed photo");
            None
        }
    }
}

impl GalleryBody {
    fn into_domain(self) -> Result<Gallery, ApplicationError> {
        let defaults = GalleryPermissions::default();
        let permissions = GalleryPermissions {
            allow_downloads: self
                .permissions
                .allow_downloads
                .unwrap_or(defaults.allow_downloads),
            allow_comments: self
                .permissions
                .allow_comments
                .unwrap_or(defaults.allow_comments),
            allow_edits: self.permissions.allow_edits.unwrap_or(defaults.allow_edits),
            allow_favorites: self
                .permissions
                .allow_favorites
                .unwrap_or(defaults.allow_favorites),
        };
        let privacy = if self.is_private {
            Privacy::Private {
                password: self.password.unwrap_or_default(),
            }
        } else {
            Privacy::Public
        };
        Ok(Gallery {
            id: GalleryId::new(self.id)?,
            name: self.name,
            description: self.description,
            client: ClientIdentity {
                name: self.client_name,
                email: self.client_email,
            },
            permissions,
            privacy,
            tags: self.tags,
            layout_id: self.layout_id,
        })
    }
}

impl PhotoBody {
    pub(crate) fn into_domain(self) -> Result<RawPhoto, ApplicationError> {
        let id = PhotoId::new(self.id)?;
        let comments = self
            .comments
            .into_iter()
            .map(|comment| comment.into_domain(&id))
            .collect::<Result<Vec<_>, _>>()?;
        let dimensions = match (self.width, self.height) {
            (Some(width), Some(height)) if width > 0 && height > 0 => {
                Some(Dimensions { width, height })
            }
            _ => None,
        };
        Ok(RawPhoto {
            media_type: self.media_type.unwrap_or(MediaType::Image),
            filename: self.filename.unwrap_or_else(|| id.to_string()),
            id,
            file_size: self.file_size,
            urls: self.urls,
            dimensions,
            is_favorite: self.is_favorite,
            favorites_count: self.favorites_count,
            comments,
            comments_count: self.comments_count,
            duration_secs: self.duration_secs,
        })
    }
}

impl CommentBody {
    /// `parent` is used when the comment does not name its photo.
    pub(crate) fn into_domain(self, parent: &PhotoId) -> Result<Comment, ApplicationError> {
        let photo_id = match self.photo_id {
            Some(photo_id) => PhotoId::new(photo_id)?,
            None => parent.clone(),
        };
        // A malformed drawing should not hide the comment text.
        let annotation = self.annotation.and_then(|payload| {
            Annotation::from_payload(&payload)
                .map_err(|error| warn!(comment_id = %self.id, %error, "annotation dropped"))
                .ok()
        });
        Ok(Comment {
            id: CommentId::new(self.id)?,
            photo_id,
            text: self.text,
            author: self.author,
            created_at: self.created_at,
            annotation,
            video_timestamp_secs: self.video_timestamp_secs,
        })
    }
}

impl DuplicateBody {
    pub(crate) fn into_domain(self) -> Result<DuplicateMatch, ApplicationError> {
        Ok(DuplicateMatch {
            photo_id: PhotoId::new(self.photo_id)?,
            filename: self.filename,
            file_size: self.file_size,
            thumbnail_url: self.thumbnail_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use shotbook_domain::{DownloadResponse, EmailTemplate, Point};

    use super::*;

    #[test]
    fn malformed_photos_are_skipped_and_the_rest_of_the_page_kept() {
        let json = r#"{
            "photos": [
                {"id": "p1", "type": "image"},
                {"id": "p2", "type": "hologram"},
                {"id": "p3", "comments": [{"id": " ", "text": "blank id"}]},
                {"id": "p4", "type": "video"}
            ],
            "pagination": {"has_more": false}
        }"#;

        let page = serde_json::from_str::<PageBody>(json)
            .expect("json")
            .into_domain()
            .expect("domain");

        let ids: Vec<&str> = page.photos.iter().map(|photo| photo.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p4"]);
        assert_eq!(page.photos[1].media_type, MediaType::Video);
    }

    #[test]
    fn page_body_maps_counts_urls_and_cursor() {
        let json = r#"{
            "gallery": {"id": "g1", "name": "Wedding", "is_private": true, "password": "pw",
                        "permissions": {"allow_downloads": false}},
            "photos": [
                {"id": "p1", "type": "image", "filename": "a.jpg", "width": 4000, "height": 3000,
                 "urls": {"thumbnail": "https://cdn/t.jpg", "large": "https://cdn/l.jpg"},
                 "favorites_count": -2, "comments": [{"id": "c1", "text": "nice"}]},
                {"id": "p2", "media_type": "video", "duration": 12.5, "comments_count": 7}
            ],
            "pagination": {"has_more": true, "next_key": "opaque=="}
        }"#;

        let page = serde_json::from_str::<PageBody>(json)
            .expect("json")
            .into_domain()
            .expect("domain");

        let gallery = page.gallery.expect("gallery");
        assert!(!gallery.permissions.allow_downloads);
        assert!(gallery.permissions.allow_favorites);
        assert_eq!(
            gallery.privacy,
            Privacy::Private {
                password: "pw".to_string()
            }
        );
        assert_eq!(page.pagination.next_key.as_deref(), Some("opaque=="));

        let first = page.photos[0].clone().normalize();
        assert_eq!(first.favorites_count, 0);
        assert_eq!(first.comments_count, 1);
        assert_eq!(first.comments[0].photo_id.as_str(), "p1");
        assert_eq!(first.urls.best_for_display(), Some("https://cdn/l.jpg"));
        assert_eq!(
            first.dimensions,
            Some(Dimensions {
                width: 4000,
                height: 3000
            })
        );

        let second = page.photos[1].clone().normalize();
        assert!(second.is_video());
        assert_eq!(second.comments_count, 7);
        assert_eq!(second.filename, "p2");
    }

    #[test]
    fn malformed_annotation_keeps_the_comment() {
        let body: CommentBody =
            serde_json::from_str(r#"{"id": "c1", "text": "here", "annotation": "not json"}"#)
                .expect("json");
        let comment = body
            .into_domain(&PhotoId::new("p").expect("id"))
            .expect("comment");
        assert_eq!(comment.text, "here");
        assert!(comment.annotation.is_none());
    }

    #[test]
    fn comment_body_serializes_annotation_as_string() {
        let comment = NewComment {
            photo_id: PhotoId::new("p").expect("id"),
            text: "crop".to_string(),
            annotation: Some(
                Annotation::new(vec![
                    Point::normalized(0.1, 0.2).expect("point"),
                    Point::normalized(0.3, 0.4).expect("point"),
                ])
                .expect("annotation"),
            ),
            video_timestamp_secs: None,
        };
        let guest = GuestIdentity {
            share_token: Some("tok".to_string()),
            email: Some("sam@example.com".to_string()),
            name: None,
        };

        let value = serde_json::to_value(NewCommentBody::new(&comment, &guest).expect("body"))
            .expect("json");
        assert_eq!(value["annotation"], r#"[{"x":0.1,"y":0.2},{"x":0.3,"y":0.4}]"#);
        assert_eq!(value["guest_email"], "sam@example.com");
        assert_eq!(value["share_token"], "tok");
    }

    #[test]
    fn list_bodies_accept_bare_and_wrapped_arrays() {
        let bare: ListBody<DuplicateBody> =
            serde_json::from_str(r#"[{"id": "p9", "filename": "a.jpg"}]"#).expect("bare");
        let wrapped: ListBody<DuplicateBody> =
            serde_json::from_str(r#"{"duplicates": [{"photo_id": "p9"}]}"#).expect("wrapped");
        assert_eq!(bare.into_vec().len(), 1);
        assert_eq!(wrapped.into_vec()[0].photo_id, "p9");

        let templates: ListBody<EmailTemplate> = serde_json::from_str(
            r#"{"templates": [{"id": "t", "name": "n", "subject": "s", "body": "b"}]}"#,
        )
        .expect("templates");
        assert_eq!(templates.into_vec()[0].id, "t");
    }

    #[test]
    fn download_responses_decode_by_status() {
        let redirect: DownloadResponse =
            serde_json::from_str(r#"{"status": "redirect", "url": "https://cdn/a.zip"}"#)
                .expect("redirect");
        let pending: DownloadResponse =
            serde_json::from_str(r#"{"status": "pending", "job_id": "j1"}"#).expect("pending");
        assert_eq!(
            redirect,
            DownloadResponse::Redirect {
                url: "https://cdn/a.zip".to_string()
            }
        );
        assert_eq!(
            pending,
            DownloadResponse::Pending {
                job_id: "j1".to_string()
            }
        );
    }
}
