mod appointment;
mod comment;
mod download;
mod engagement;
mod error;
mod feed;
mod gallery;
mod ids;
mod lightbox;
mod photo;
mod settings;
mod template;
mod upload;
mod workflow;

pub use appointment::{Appointment, NewAppointment};
pub use comment::{Annotation, Comment, NewComment, Point};
pub use download::{DownloadRequest, DownloadResolution, DownloadResponse};
pub use engagement::{
    EngagementEvent, EngagementKind, EngagementSession, IMAGE_VIEW_THRESHOLD_MS,
};
pub use error::DomainError;
pub use feed::{CommitOutcome, GalleryFeed, LoadMode, LoadTicket};
pub use gallery::{
    ClientIdentity, Gallery, GalleryPage, GalleryPermissions, GuestIdentity, Pagination, Privacy,
};
pub use ids::{CommentId, GalleryId, PhotoId};
pub use lightbox::{
    AnnotationStage, Direction, Key, Lightbox, LightboxEffect, LightboxInput, LightboxItem,
    LightboxState, LightboxTimings,
};
pub use photo::{
    detect_media_type, Dimensions, FavoriteSnapshot, MediaType, MediaUrls, Photo, RawPhoto,
};
pub use settings::{slugify, GallerySettings, SeoSettings};
pub use template::{EmailTemplate, RenderedEmail};
pub use upload::{
    DuplicateDecision, DuplicateMatch, QueueStep, UploadCandidate, UploadOutcome, UploadQueue,
};
pub use workflow::{Workflow, WorkflowStep, WorkflowStepKind};
