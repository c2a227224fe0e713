use shotbook_domain::{
    Appointment, DownloadRequest, DownloadResponse, EmailTemplate, EngagementEvent, GalleryFeed,
    GallerySettings, RenderedEmail, Workflow,
};
use tracing::{info, warn};

use crate::service::ensure_allowed;
use crate::{
    ApplicationError, ApplicationService, BookAppointmentCommand, PreviewTemplateCommand,
    RequestDownloadCommand, UpdateSettingsCommand, UpdateTemplateCommand, UpdateWorkflowCommand,
};

impl ApplicationService {
    pub fn request_download(
        &self,
        feed: &GalleryFeed,
        command: RequestDownloadCommand,
    ) -> Result<DownloadResponse, ApplicationError> {
        ensure_allowed(feed, "downloads", |permissions| permissions.allow_downloads)?;
        let gallery_id = feed.gallery_id().clone();
        let single = match command.photo_ids.as_slice() {
            [only] => Some(only.clone()),
            _ => None,
        };
        let response = self.ports.downloads.request_download(
            &gallery_id,
            &DownloadRequest {
                photo_ids: command.photo_ids,
                resolution: command.resolution,
            },
        )?;

        if let Err(error) = self
            .ports
            .analytics
            .record(EngagementEvent::download(gallery_id.clone(), single))
        {
            warn!(%gallery_id, %error, "download event dropped");
        }
        info!(%gallery_id, ?response, "download requested");
        Ok(response)
    }

    /// Validates and canonicalizes settings, then saves them. Returns what was sent.
    pub fn update_gallery_settings(
        &self,
        command: UpdateSettingsCommand,
    ) -> Result<GallerySettings, ApplicationError> {
        let settings = command.settings.normalized()?;
        self.ports
            .galleries
            .update_settings(&command.gallery_id, &settings)?;
        info!(
            gallery_id = %command.gallery_id,
            slug = %settings.seo.slug,
            "gallery settings saved"
        );
        Ok(settings)
    }

    pub fn list_templates(&self) -> Result<Vec<EmailTemplate>, ApplicationError> {
        self.ports.studio.list_templates()
    }

    pub fn preview_template(
        &self,
        command: PreviewTemplateCommand,
    ) -> Result<RenderedEmail, ApplicationError> {
        let template = self
            .list_templates()?
            .into_iter()
            .find(|template| template.id == command.template_id)
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("email template {}", command.template_id))
            })?;
        Ok(template.render(&command.values)?)
    }

    pub fn update_template(&self, command: UpdateTemplateCommand) -> Result<(), ApplicationError> {
        command.template.validate()?;
        self.ports.studio.update_template(&command.template)
    }

    pub fn list_workflows(&self) -> Result<Vec<Workflow>, ApplicationError> {
        self.ports.studio.list_workflows()
    }

    pub fn update_workflow(&self, command: UpdateWorkflowCommand) -> Result<(), ApplicationError> {
        command.workflow.validate()?;
        self.ports.studio.update_workflow(&command.workflow)
    }

    pub fn list_appointments(&self) -> Result<Vec<Appointment>, ApplicationError> {
        let mut appointments = self.ports.studio.list_appointments()?;
        appointments.sort_by_key(|appointment| appointment.starts_at);
        Ok(appointments)
    }

    /// Books a slot after checking it against everything already booked.
    pub fn book_appointment(
        &self,
        command: BookAppointmentCommand,
    ) -> Result<Appointment, ApplicationError> {
        let booked = self.ports.studio.list_appointments()?;
        command.appointment.validate_against(&booked)?;
        let created = self.ports.studio.create_appointment(&command.appointment)?;
        info!(id = %created.id, starts_at = %created.starts_at, "appointment booked");
        Ok(created)
    }
}
