use std::collections::HashMap;
use std::path::PathBuf;

use shotbook_domain::{
    Annotation, CommentId, DownloadResolution, EmailTemplate, GalleryId, GallerySettings,
    NewAppointment, PhotoId, Workflow,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadGalleryCommand {
    pub load_more: bool,
}

#[derive(Debug, Clone)]
pub struct ToggleFavoriteCommand {
    pub photo_id: PhotoId,
}

#[derive(Debug, Clone)]
pub struct AddCommentCommand {
    pub photo_id: PhotoId,
    pub text: String,
    pub annotation: Option<Annotation>,
    pub video_timestamp_secs: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct DeleteCommentCommand {
    pub photo_id: PhotoId,
    pub comment_id: CommentId,
}

#[derive(Debug, Clone)]
pub struct UploadFolderCommand {
    pub folder: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct RequestDownloadCommand {
    pub photo_ids: Vec<PhotoId>,
    pub resolution: DownloadResolution,
}

#[derive(Debug, Clone)]
pub struct UpdateSettingsCommand {
    pub gallery_id: GalleryId,
    pub settings: GallerySettings,
}

#[derive(Debug, Clone)]
pub struct PreviewTemplateCommand {
    pub template_id: String,
    pub values: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct UpdateTemplateCommand {
    pub template: EmailTemplate,
}

#[derive(Debug, Clone)]
pub struct UpdateWorkflowCommand {
    pub workflow: Workflow,
}

#[derive(Debug, Clone)]
pub struct BookAppointmentCommand {
    pub appointment: NewAppointment,
}
