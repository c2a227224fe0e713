use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use shotbook_domain::{
    Appointment, Comment, CommentId, DownloadRequest, DownloadResponse, DuplicateDecision,
    DuplicateMatch, EmailTemplate, EngagementEvent, Gallery, GalleryId, GalleryPage,
    GalleryPermissions, GallerySettings, GuestIdentity, MediaType, MediaUrls, NewAppointment,
    NewComment, Pagination, PhotoId, Privacy, RawPhoto, UploadCandidate, Workflow,
};

use crate::{
    AnalyticsSink, ApplicationError, ApplicationService, Clock, CommentsApi, DownloadApi,
    DuplicateChecker, DuplicateResolver, FavoritesApi, GalleryApi, GuestPrompt, ServicePorts,
    StudioApi, UploadManager, UploadScan, UploadScanner,
};

/// One in-memory stand-in for every port. Scripted results are consumed in
/// order; when a script runs dry the call succeeds.
#[derive(Default)]
pub struct FakeBackend {
    pub pages: RefCell<VecDeque<Result<GalleryPage, ApplicationError>>>,
    pub page_cursors: RefCell<Vec<Option<String>>>,
    pub saved_settings: RefCell<Vec<GallerySettings>>,

    pub favorite_results: RefCell<VecDeque<Result<(), ApplicationError>>>,
    pub favorite_calls: RefCell<Vec<(PhotoId, bool, GuestIdentity)>>,

    pub comment_results: RefCell<VecDeque<Result<Comment, ApplicationError>>>,
    pub stored_comments: RefCell<Vec<Comment>>,
    pub deleted_comments: RefCell<Vec<CommentId>>,
    pub fail_deletes: Cell<bool>,

    pub duplicate_names: RefCell<Vec<String>>,
    pub fail_duplicate_checks: Cell<bool>,
    pub duplicate_checks: Cell<usize>,
    pub uploaded: RefCell<Vec<String>>,
    pub fail_uploads_named: RefCell<Vec<String>>,
    pub scan: RefCell<Vec<UploadCandidate>>,
    pub decisions: RefCell<VecDeque<DuplicateDecision>>,

    pub download_calls: RefCell<Vec<DownloadRequest>>,

    pub templates: RefCell<Vec<EmailTemplate>>,
    pub saved_templates: RefCell<Vec<EmailTemplate>>,
    pub workflows: RefCell<Vec<Workflow>>,
    pub saved_workflows: RefCell<Vec<Workflow>>,
    pub appointments: RefCell<Vec<Appointment>>,

    pub events: RefCell<Vec<EngagementEvent>>,
    pub fail_analytics: Cell<bool>,

    pub prompt_reply: RefCell<Option<GuestIdentity>>,
    pub prompts: Cell<usize>,

    pub now: Cell<u64>,
}

impl FakeBackend {
    pub fn shared() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn push_page(&self, page: GalleryPage) {
        self.pages.borrow_mut().push_back(Ok(page));
    }

    pub fn advance(&self, millis: u64) {
        self.now.set(self.now.get() + millis);
    }
}

pub fn service(backend: &Rc<FakeBackend>) -> ApplicationService {
    let ports = ServicePorts {
        galleries: Box::new(Rc::clone(backend)),
        favorites: Box::new(Rc::clone(backend)),
        comments: Box::new(Rc::clone(backend)),
        duplicates: Box::new(Rc::clone(backend)),
        uploads: Box::new(Rc::clone(backend)),
        downloads: Box::new(Rc::clone(backend)),
        studio: Box::new(Rc::clone(backend)),
        analytics: Box::new(Rc::clone(backend)),
        scanner: Box::new(Rc::clone(backend)),
        resolver: Box::new(Rc::clone(backend)),
        guest_prompt: Box::new(Rc::clone(backend)),
        clock: Box::new(Rc::clone(backend)),
    };
    ApplicationService::new(
        ports,
        2,
        GuestIdentity {
            share_token: Some("share".to_string()),
            email: None,
            name: Some("Guest".to_string()),
        },
    )
}

pub fn gallery_id() -> GalleryId {
    GalleryId::new("g1").expect("id")
}

pub fn photo_id(id: &str) -> PhotoId {
    PhotoId::new(id).expect("id")
}

pub fn raw_photo(id: &str, media_type: MediaType) -> RawPhoto {
    RawPhoto {
        id: photo_id(id),
        media_type,
        filename: format!("{id}.jpg"),
        file_size: Some(100),
        urls: MediaUrls::default(),
        dimensions: None,
        is_favorite: false,
        favorites_count: Some(3),
        comments: Vec::new(),
        comments_count: None,
        duration_secs: None,
    }
}

pub fn gallery(permissions: GalleryPermissions) -> Gallery {
    Gallery {
        id: gallery_id(),
        name: "Wedding".to_string(),
        description: None,
        client: Default::default(),
        permissions,
        privacy: Privacy::Public,
        tags: Vec::new(),
        layout_id: None,
    }
}

pub fn page(ids: &[&str], next_key: Option<&str>) -> GalleryPage {
    GalleryPage {
        gallery: Some(gallery(GalleryPermissions::default())),
        photos: ids
            .iter()
            .map(|id| raw_photo(id, MediaType::Image))
            .collect(),
        pagination: Pagination {
            has_more: next_key.is_some(),
            next_key: next_key.map(str::to_string),
        },
    }
}

pub fn candidate(name: &str) -> UploadCandidate {
    UploadCandidate {
        path: PathBuf::from(format!("/photos/{name}")),
        filename: name.to_string(),
        file_size: 2048,
        media_type: MediaType::Image,
        dimensions: None,
    }
}

pub fn auth_error() -> ApplicationError {
    ApplicationError::from_status(401, "guest email required")
}

impl GalleryApi for Rc<FakeBackend> {
    fn fetch_page(
        &self,
        _gallery_id: &GalleryId,
        _limit: usize,
        cursor: Option<&str>,
    ) -> Result<GalleryPage, ApplicationError> {
        self.page_cursors
            .borrow_mut()
            .push(cursor.map(str::to_string));
        self.pages.borrow_mut().pop_front().unwrap_or_else(|| {
            Err(ApplicationError::Transport("no scripted page".to_string()))
        })
    }

    fn update_settings(
        &self,
        _gallery_id: &GalleryId,
        settings: &GallerySettings,
    ) -> Result<(), ApplicationError> {
        self.saved_settings.borrow_mut().push(settings.clone());
        Ok(())
    }
}

impl FavoritesApi for Rc<FakeBackend> {
    fn set_favorite(
        &self,
        photo_id: &PhotoId,
        favorite: bool,
        guest: &GuestIdentity,
    ) -> Result<(), ApplicationError> {
        self.favorite_calls
            .borrow_mut()
            .push((photo_id.clone(), favorite, guest.clone()));
        self.favorite_results.borrow_mut().pop_front().unwrap_or(Ok(()))
    }
}

impl CommentsApi for Rc<FakeBackend> {
    fn list_comments(&self, _photo_id: &PhotoId) -> Result<Vec<Comment>, ApplicationError> {
        Ok(self.stored_comments.borrow().clone())
    }

    fn create_comment(
        &self,
        comment: &NewComment,
        guest: &GuestIdentity,
    ) -> Result<Comment, ApplicationError> {
        if let Some(scripted) = self.comment_results.borrow_mut().pop_front() {
            return scripted;
        }
        let saved = Comment {
            id: CommentId::new(format!("c{}", self.stored_comments.borrow().len() + 1))
                .expect("id"),
            photo_id: comment.photo_id.clone(),
            text: comment.text.clone(),
            author: guest.name.clone(),
            created_at: Some("2026-10-14T10:00:00Z".to_string()),
            annotation: comment.annotation.clone(),
            video_timestamp_secs: comment.video_timestamp_secs,
        };
        self.stored_comments.borrow_mut().push(saved.clone());
        Ok(saved)
    }

    fn delete_comment(&self, comment_id: &CommentId) -> Result<(), ApplicationError> {
        if self.fail_deletes.get() {
            return Err(ApplicationError::from_status(500, "delete failed"));
        }
        self.deleted_comments.borrow_mut().push(comment_id.clone());
        Ok(())
    }
}

impl DuplicateChecker for Rc<FakeBackend> {
    fn find_duplicates(
        &self,
        _gallery_id: &GalleryId,
        filename: &str,
        file_size: u64,
    ) -> Result<Vec<DuplicateMatch>, ApplicationError> {
        self.duplicate_checks.set(self.duplicate_checks.get() + 1);
        if self.fail_duplicate_checks.get() {
            return Err(ApplicationError::Transport("connection reset".to_string()));
        }
        if !self.duplicate_names.borrow().iter().any(|name| name == filename) {
            return Ok(Vec::new());
        }
        Ok(vec![DuplicateMatch {
            photo_id: PhotoId::new(format!("existing-{filename}")).expect("id"),
            filename: filename.to_string(),
            file_size: Some(file_size),
            thumbnail_url: None,
        }])
    }
}

impl UploadManager for Rc<FakeBackend> {
    fn upload(
        &self,
        _gallery_id: &GalleryId,
        file: &UploadCandidate,
    ) -> Result<PhotoId, ApplicationError> {
        if self.fail_uploads_named.borrow().contains(&file.filename) {
            return Err(ApplicationError::from_status(413, "too large"));
        }
        self.uploaded.borrow_mut().push(file.filename.clone());
        Ok(PhotoId::new(format!("new-{}", file.filename)).expect("id"))
    }
}

impl DownloadApi for Rc<FakeBackend> {
    fn request_download(
        &self,
        _gallery_id: &GalleryId,
        request: &DownloadRequest,
    ) -> Result<DownloadResponse, ApplicationError> {
        self.download_calls.borrow_mut().push(request.clone());
        Ok(DownloadResponse::Pending {
            job_id: "job-1".to_string(),
        })
    }
}

impl StudioApi for Rc<FakeBackend> {
    fn list_templates(&self) -> Result<Vec<EmailTemplate>, ApplicationError> {
        Ok(self.templates.borrow().clone())
    }

    fn update_template(&self, template: &EmailTemplate) -> Result<(), ApplicationError> {
        self.saved_templates.borrow_mut().push(template.clone());
        Ok(())
    }

    fn list_workflows(&self) -> Result<Vec<Workflow>, ApplicationError> {
        Ok(self.workflows.borrow().clone())
    }

    fn update_workflow(&self, workflow: &Workflow) -> Result<(), ApplicationError> {
        self.saved_workflows.borrow_mut().push(workflow.clone());
        Ok(())
    }

    fn list_appointments(&self) -> Result<Vec<Appointment>, ApplicationError> {
        Ok(self.appointments.borrow().clone())
    }

    fn create_appointment(
        &self,
        appointment: &NewAppointment,
    ) -> Result<Appointment, ApplicationError> {
        let created = Appointment {
            id: format!("apt-{}", self.appointments.borrow().len() + 1),
            title: appointment.title.clone(),
            client_email: appointment.client_email.clone(),
            starts_at: appointment.starts_at,
            ends_at: appointment.ends_at,
        };
        self.appointments.borrow_mut().push(created.clone());
        Ok(created)
    }
}

impl AnalyticsSink for Rc<FakeBackend> {
    fn record(&self, event: EngagementEvent) -> Result<(), ApplicationError> {
        if self.fail_analytics.get() {
            return Err(ApplicationError::Transport("analytics offline".to_string()));
        }
        self.events.borrow_mut().push(event);
        Ok(())
    }
}

impl UploadScanner for Rc<FakeBackend> {
    fn scan_folder(&self, _folder: &Path) -> Result<UploadScan, ApplicationError> {
        let candidates = self.scan.borrow().clone();
        Ok(UploadScan {
            scanned_files: candidates.len() + 1,
            candidates,
        })
    }
}

impl DuplicateResolver for Rc<FakeBackend> {
    fn resolve(
        &self,
        _candidate: &UploadCandidate,
        _duplicates: &[DuplicateMatch],
    ) -> Result<DuplicateDecision, ApplicationError> {
        Ok(self
            .decisions
            .borrow_mut()
            .pop_front()
            .unwrap_or(DuplicateDecision::Skip))
    }
}

impl GuestPrompt for Rc<FakeBackend> {
    fn prompt_guest(
        &self,
        _current: &GuestIdentity,
    ) -> Result<Option<GuestIdentity>, ApplicationError> {
        self.prompts.set(self.prompts.get() + 1);
        Ok(self.prompt_reply.borrow().clone())
    }
}

impl Clock for Rc<FakeBackend> {
    fn now_millis(&self) -> u64 {
        self.now.get()
    }
}
