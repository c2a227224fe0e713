mod engagement;
mod error;
mod ports;
mod service;
mod studio;
mod uploads;
mod use_cases;
mod viewer;

#[cfg(test)]
mod test_support;

pub use engagement::EngagementTracker;
pub use error::ApplicationError;
pub use ports::{
    AnalyticsSink, Clock, CommentsApi, DownloadApi, DuplicateChecker, DuplicateResolver,
    FavoritesApi, GalleryApi, GuestPrompt, LoadedMedia, MediaLoader, MediaRequest, MediaSource,
    StudioApi, UploadManager, UploadProgress, UploadReport, UploadScan, UploadScanner,
};
pub use service::{ApplicationService, ServicePorts};
pub use use_cases::{
    AddCommentCommand, BookAppointmentCommand, DeleteCommentCommand, LoadGalleryCommand,
    PreviewTemplateCommand, RequestDownloadCommand, ToggleFavoriteCommand, UpdateSettingsCommand,
    UpdateTemplateCommand, UpdateWorkflowCommand, UploadFolderCommand,
};
pub use viewer::ViewerSession;
