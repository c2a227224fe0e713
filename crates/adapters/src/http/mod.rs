mod wire;

use std::time::Duration;

use reqwest::blocking::{multipart, Client, RequestBuilder, Response};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shotbook_application::{
    ApplicationError, CommentsApi, DownloadApi, DuplicateChecker, FavoritesApi, GalleryApi,
    MediaSource, StudioApi, UploadManager,
};
use shotbook_domain::{
    Appointment, Comment, CommentId, DownloadRequest, DownloadResponse, DuplicateMatch,
    EmailTemplate, EngagementEvent, GalleryId, GalleryPage, GallerySettings, GuestIdentity,
    NewAppointment, NewComment, PhotoId, UploadCandidate, Workflow,
};
use tracing::{debug, trace};

use crate::analytics::AnalyticsTransport;
use wire::{
    CommentBody, DownloadBody, DuplicateBody, EventBody, GuestBody, ListBody, NewCommentBody,
    PageBody, UploadedBody,
};

const SHARE_TOKEN_HEADER: &str = "X-Share-Token";

#[derive(Debug, Clone)]
pub struct RestClientConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    pub share_token: Option<String>,
    pub timeout: Duration,
}

/// Blocking JSON client for the gallery backend. Cloning shares the
/// underlying connection pool.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: Client,
    base_url: String,
    api_token: Option<String>,
    share_token: Option<String>,
}

impl RestClient {
    pub fn new(config: RestClientConfig) -> Result<Self, ApplicationError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApplicationError::InvalidInput(format!(
                "api url must start with http:// or https://, got {:?}",
                config.base_url
            )));
        }
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("shotbook/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|error| ApplicationError::Transport(error.to_string()))?;
        Ok(Self {
            http,
            base_url,
            api_token: config.api_token.filter(|token| !token.trim().is_empty()),
            share_token: config.share_token.filter(|token| !token.trim().is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URLs pass through; paths are resolved against the API root.
    pub fn resolve(&self, url_or_path: &str) -> String {
        if url_or_path.starts_with("http://") || url_or_path.starts_with("https://") {
            url_or_path.to_string()
        } else {
            format!("{}/{}", self.base_url, url_or_path.trim_start_matches('/'))
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.resolve(path);
        trace!(%method, %url, "request");
        let mut builder = self.http.request(method, url);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(token) = &self.share_token {
            builder = builder.header(SHARE_TOKEN_HEADER, token);
        }
        builder
    }

    fn send(&self, builder: RequestBuilder) -> Result<Response, ApplicationError> {
        let response = builder
            .send()
            .map_err(|error| ApplicationError::Transport(error.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        let message = error_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
        debug!(status = status.as_u16(), %message, "backend rejected request");
        Err(ApplicationError::from_status(status.as_u16(), message))
    }

    fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ApplicationError> {
        let text = self
            .send(builder)?
            .text()
            .map_err(|error| ApplicationError::Transport(error.to_string()))?;
        decode(&text)
    }

    fn send_empty(&self, builder: RequestBuilder) -> Result<(), ApplicationError> {
        self.send(builder).map(|_| ())
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApplicationError> {
        self.send_json(self.request(Method::GET, path))
    }

    fn write_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<(), ApplicationError> {
        self.send_empty(self.request(method, path).json(body))
    }
}

pub(crate) fn decode<T: DeserializeOwned>(text: &str) -> Result<T, ApplicationError> {
    serde_json::from_str(text).map_err(|error| ApplicationError::Decode(error.to_string()))
}

/// Pulls a human-readable message out of an error body.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        for key in ["error", "message", "detail"] {
            if let Some(message) = value.get(key).and_then(serde_json::Value::as_str) {
                return Some(message.to_string());
            }
        }
    }
    Some(trimmed.chars().take(200).collect())
}

pub(crate) mod paths {
    use shotbook_domain::{CommentId, GalleryId, PhotoId};

    pub fn gallery_photos(gallery_id: &GalleryId) -> String {
        format!("/galleries/{gallery_id}/photos")
    }

    pub fn gallery_settings(gallery_id: &GalleryId) -> String {
        format!("/galleries/{gallery_id}/settings")
    }

    pub fn gallery_duplicates(gallery_id: &GalleryId) -> String {
        format!("/galleries/{gallery_id}/duplicates")
    }

    pub fn gallery_download(gallery_id: &GalleryId) -> String {
        format!("/galleries/{gallery_id}/download")
    }

    pub fn photo_favorite(photo_id: &PhotoId) -> String {
        format!("/photos/{photo_id}/favorite")
    }

    pub fn photo_comments(photo_id: &PhotoId) -> String {
        format!("/photos/{photo_id}/comments")
    }

    pub fn comment(comment_id: &CommentId) -> String {
        format!("/comments/{comment_id}")
    }

    pub fn email_template(id: &str) -> String {
        format!("/email-templates/{id}")
    }

    pub fn workflow(id: &str) -> String {
        format!("/workflows/{id}")
    }

    pub const EMAIL_TEMPLATES: &str = "/email-templates";
    pub const WORKFLOWS: &str = "/workflows";
    pub const APPOINTMENTS: &str = "/appointments";
    pub const ANALYTICS_EVENTS: &str = "/analytics/events";
}

impl GalleryApi for RestClient {
    fn fetch_page(
        &self,
        gallery_id: &GalleryId,
        limit: usize,
        cursor: Option<&str>,
    ) -> Result<GalleryPage, ApplicationError> {
        let mut builder = self
            .request(Method::GET, &paths::gallery_photos(gallery_id))
            .query(&[("limit", limit.to_string())]);
        if let Some(cursor) = cursor {
            builder = builder.query(&[("next_key", cursor)]);
        }
        let body: PageBody = self.send_json(builder)?;
        body.into_domain()
    }

    fn update_settings(
        &self,
        gallery_id: &GalleryId,
        settings: &GallerySettings,
    ) -> Result<(), ApplicationError> {
        self.write_json(Method::PUT, &paths::gallery_settings(gallery_id), settings)
    }
}

impl FavoritesApi for RestClient {
    fn set_favorite(
        &self,
        photo_id: &PhotoId,
        favorite: bool,
        guest: &GuestIdentity,
    ) -> Result<(), ApplicationError> {
        let method = if favorite { Method::POST } else { Method::DELETE };
        self.write_json(method, &paths::photo_favorite(photo_id), &GuestBody::from(guest))
    }
}

impl CommentsApi for RestClient {
    fn list_comments(&self, photo_id: &PhotoId) -> Result<Vec<Comment>, ApplicationError> {
        let body: ListBody<CommentBody> = self.get_json(&paths::photo_comments(photo_id))?;
        body.into_vec()
            .into_iter()
            .map(|comment| comment.into_domain(photo_id))
            .collect()
    }

    fn create_comment(
        &self,
        comment: &NewComment,
        guest: &GuestIdentity,
    ) -> Result<Comment, ApplicationError> {
        let body = NewCommentBody::new(comment, guest)?;
        let created: CommentBody = self.send_json(
            self.request(Method::POST, &paths::photo_comments(&comment.photo_id))
                .json(&body),
        )?;
        created.into_domain(&comment.photo_id)
    }

    fn delete_comment(&self, comment_id: &CommentId) -> Result<(), ApplicationError> {
        self.send_empty(self.request(Method::DELETE, &paths::comment(comment_id)))
    }
}

impl DuplicateChecker for RestClient {
    fn find_duplicates(
        &self,
        gallery_id: &GalleryId,
        filename: &str,
        file_size: u64,
    ) -> Result<Vec<DuplicateMatch>, ApplicationError> {
        let builder = self
            .request(Method::GET, &paths::gallery_duplicates(gallery_id))
            .query(&[("filename", filename.to_string()), ("size", file_size.to_string())]);
        let body: ListBody<DuplicateBody> = self.send_json(builder)?;
        body.into_vec()
            .into_iter()
            .map(DuplicateBody::into_domain)
            .collect()
    }
}

impl UploadManager for RestClient {
    fn upload(
        &self,
        gallery_id: &GalleryId,
        file: &UploadCandidate,
    ) -> Result<PhotoId, ApplicationError> {
        let mut form = multipart::Form::new()
            .text("filename", file.filename.clone())
            .text("file_size", file.file_size.to_string())
            .file("file", &file.path)
            .map_err(|error| ApplicationError::Io(format!("{}: {error}", file.path.display())))?;
        if let Some(dimensions) = file.dimensions {
            form = form
                .text("width", dimensions.width.to_string())
                .text("height", dimensions.height.to_string());
        }
        let uploaded: UploadedBody = self.send_json(
            self.request(Method::POST, &paths::gallery_photos(gallery_id))
                .multipart(form),
        )?;
        Ok(PhotoId::new(uploaded.id)?)
    }
}

impl DownloadApi for RestClient {
    fn request_download(
        &self,
        gallery_id: &GalleryId,
        request: &DownloadRequest,
    ) -> Result<DownloadResponse, ApplicationError> {
        let body = DownloadBody {
            photo_ids: request.photo_ids.iter().map(PhotoId::as_str).collect(),
            resolution: request.resolution,
        };
        self.send_json(
            self.request(Method::POST, &paths::gallery_download(gallery_id))
                .json(&body),
        )
    }
}

impl StudioApi for RestClient {
    fn list_templates(&self) -> Result<Vec<EmailTemplate>, ApplicationError> {
        let body: ListBody<EmailTemplate> = self.get_json(paths::EMAIL_TEMPLATES)?;
        Ok(body.into_vec())
    }

    fn update_template(&self, template: &EmailTemplate) -> Result<(), ApplicationError> {
        self.write_json(Method::PUT, &paths::email_template(&template.id), template)
    }

    fn list_workflows(&self) -> Result<Vec<Workflow>, ApplicationError> {
        let body: ListBody<Workflow> = self.get_json(paths::WORKFLOWS)?;
        Ok(body.into_vec())
    }

    fn update_workflow(&self, workflow: &Workflow) -> Result<(), ApplicationError> {
        self.write_json(Method::PUT, &paths::workflow(&workflow.id), workflow)
    }

    fn list_appointments(&self) -> Result<Vec<Appointment>, ApplicationError> {
        let body: ListBody<Appointment> = self.get_json(paths::APPOINTMENTS)?;
        Ok(body.into_vec())
    }

    fn create_appointment(
        &self,
        appointment: &NewAppointment,
    ) -> Result<Appointment, ApplicationError> {
        self.send_json(self.request(Method::POST, paths::APPOINTMENTS).json(appointment))
    }
}

impl MediaSource for RestClient {
    fn fetch_media(&self, url: &str) -> Result<Vec<u8>, ApplicationError> {
        let bytes = self
            .send(self.request(Method::GET, url))?
            .bytes()
            .map_err(|error| ApplicationError::Transport(error.to_string()))?;
        Ok(bytes.to_vec())
    }
}

impl AnalyticsTransport for RestClient {
    fn deliver(&self, event: &EngagementEvent) -> Result<(), ApplicationError> {
        self.write_json(Method::POST, paths::ANALYTICS_EVENTS, &EventBody::from(event))
    }
}
