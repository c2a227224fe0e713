use serde::{Deserialize, Serialize};

use crate::{GalleryId, RawPhoto};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientIdentity {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryPermissions {
    pub allow_downloads: bool,
    pub allow_comments: bool,
    pub allow_edits: bool,
    pub allow_favorites: bool,
}

impl Default for GalleryPermissions {
    fn default() -> Self {
        Self {
            allow_downloads: true,
            allow_comments: true,
            allow_edits: false,
            allow_favorites: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "visibility", rename_all = "lowercase")]
pub enum Privacy {
    #[default]
    Public,
    Private { password: String },
}

/// Cursor for the next page. `next_key` is opaque and echoed back verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub has_more: bool,
    pub next_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gallery {
    pub id: GalleryId,
    pub name: String,
    pub description: Option<String>,
    pub client: ClientIdentity,
    pub permissions: GalleryPermissions,
    pub privacy: Privacy,
    pub tags: Vec<String>,
    pub layout_id: Option<String>,
}

/// One page of a gallery listing.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryPage {
    pub gallery: Option<Gallery>,
    pub photos: Vec<RawPhoto>,
    pub pagination: Pagination,
}

/// Who is acting when an unauthenticated client favorites or comments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestIdentity {
    pub share_token: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl GuestIdentity {
    pub fn has_email(&self) -> bool {
        self.email
            .as_deref()
            .is_some_and(|email| email.contains('@') && !email.trim().is_empty())
    }
}
