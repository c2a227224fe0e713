use std::path::{Path, PathBuf};

use shotbook_domain::{
    Appointment, Comment, CommentId, DownloadRequest, DownloadResponse, DuplicateDecision,
    DuplicateMatch, EmailTemplate, EngagementEvent, GalleryId, GalleryPage, GallerySettings,
    GuestIdentity, NewAppointment, NewComment, PhotoId, UploadCandidate, Workflow,
};

use crate::ApplicationError;

pub trait GalleryApi {
    fn fetch_page(
        &self,
        gallery_id: &GalleryId,
        limit: usize,
        cursor: Option<&str>,
    ) -> Result<GalleryPage, ApplicationError>;

    fn update_settings(
        &self,
        gallery_id: &GalleryId,
        settings: &GallerySettings,
    ) -> Result<(), ApplicationError>;
}

pub trait FavoritesApi {
    fn set_favorite(
        &self,
        photo_id: &PhotoId,
        favorite: bool,
        guest: &GuestIdentity,
    ) -> Result<(), ApplicationError>;
}

pub trait CommentsApi {
    fn list_comments(&self, photo_id: &PhotoId) -> Result<Vec<Comment>, ApplicationError>;

    fn create_comment(
        &self,
        comment: &NewComment,
        guest: &GuestIdentity,
    ) -> Result<Comment, ApplicationError>;

    fn delete_comment(&self, comment_id: &CommentId) -> Result<(), ApplicationError>;
}

pub trait DuplicateChecker {
    fn find_duplicates(
        &self,
        gallery_id: &GalleryId,
        filename: &str,
        file_size: u64,
    ) -> Result<Vec<DuplicateMatch>, ApplicationError>;
}

pub trait UploadManager {
    fn upload(
        &self,
        gallery_id: &GalleryId,
        file: &UploadCandidate,
    ) -> Result<PhotoId, ApplicationError>;
}

pub trait DownloadApi {
    fn request_download(
        &self,
        gallery_id: &GalleryId,
        request: &DownloadRequest,
    ) -> Result<DownloadResponse, ApplicationError>;
}

/// Studio-side CRUD: email templates, onboarding workflows, appointments.
pub trait StudioApi {
    fn list_templates(&self) -> Result<Vec<EmailTemplate>, ApplicationError>;

    fn update_template(&self, template: &EmailTemplate) -> Result<(), ApplicationError>;

    fn list_workflows(&self) -> Result<Vec<Workflow>, ApplicationError>;

    fn update_workflow(&self, workflow: &Workflow) -> Result<(), ApplicationError>;

    fn list_appointments(&self) -> Result<Vec<Appointment>, ApplicationError>;

    fn create_appointment(
        &self,
        appointment: &NewAppointment,
    ) -> Result<Appointment, ApplicationError>;
}

/// Fire-and-forget delivery; callers only log failures.
pub trait AnalyticsSink {
    fn record(&self, event: EngagementEvent) -> Result<(), ApplicationError>;
}

pub trait DuplicateResolver {
    fn resolve(
        &self,
        candidate: &UploadCandidate,
        duplicates: &[DuplicateMatch],
    ) -> Result<DuplicateDecision, ApplicationError>;
}

pub trait GuestPrompt {
    /// Asks for a fresh guest identity. `None` means the user declined.
    fn prompt_guest(
        &self,
        current: &GuestIdentity,
    ) -> Result<Option<GuestIdentity>, ApplicationError>;
}

#[derive(Debug, Clone, Default)]
pub struct UploadScan {
    pub scanned_files: usize,
    pub candidates: Vec<UploadCandidate>,
}

pub trait UploadScanner {
    fn scan_folder(&self, folder: &Path) -> Result<UploadScan, ApplicationError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRequest {
    pub photo_id: PhotoId,
    pub url: String,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedMedia {
    pub photo_id: PhotoId,
    pub generation: u64,
    pub width: u32,
    pub height: u32,
    /// `0RGB` pixels, row-major.
    pub pixels: Vec<u32>,
}

/// Background media decoding for the lightbox window.
pub trait MediaLoader {
    fn submit(&self, request: MediaRequest) -> Result<(), ApplicationError>;

    fn try_receive(&self) -> Result<Option<LoadedMedia>, ApplicationError>;
}

/// Raw bytes behind an absolute media URL.
pub trait MediaSource: Send + Sync {
    fn fetch_media(&self, url: &str) -> Result<Vec<u8>, ApplicationError>;
}

pub trait Clock {
    fn now_millis(&self) -> u64;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadProgress {
    pub completed: usize,
    pub total: usize,
    pub current: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub scanned_files: usize,
    pub uploaded: Vec<PhotoId>,
    pub skipped: Vec<String>,
    pub failed: Vec<(String, String)>,
}
