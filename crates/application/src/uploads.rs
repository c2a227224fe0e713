use shotbook_domain::{GalleryFeed, QueueStep, UploadQueue};
use tracing::{debug, info, warn};

use crate::{
    ApplicationError, ApplicationService, UploadFolderCommand, UploadProgress, UploadReport,
};

impl ApplicationService {
    /// Scans a folder, resolves duplicates one file at a time, uploads the
    /// surviving batch and finally reloads the feed.
    pub fn process_upload_queue(
        &self,
        feed: &mut GalleryFeed,
        command: UploadFolderCommand,
        on_progress: &mut dyn FnMut(&UploadProgress),
    ) -> Result<UploadReport, ApplicationError> {
        if command.folder.as_os_str().is_empty() {
            return Err(ApplicationError::InvalidInput(
                "upload folder must not be empty".to_string(),
            ));
        }

        let scan = self.ports.scanner.scan_folder(&command.folder)?;
        let gallery_id = feed.gallery_id().clone();
        let mut report = UploadReport {
            scanned_files: scan.scanned_files,
            ..UploadReport::default()
        };

        let mut queue = UploadQueue::new(scan.candidates);
        let outcome = loop {
            match queue.advance() {
                QueueStep::Check(candidate) => {
                    let result = self.ports.duplicates.find_duplicates(
                        &gallery_id,
                        &candidate.filename,
                        candidate.file_size,
                    );
                    if let Err(error) = &result {
                        warn!(
                            file = %candidate.filename,
                            %error,
                            "duplicate check failed; uploading anyway"
                        );
                    }
                    queue.record_check(result)?;
                }
                QueueStep::NeedsDecision {
                    candidate,
                    duplicates,
                } => {
                    let decision = self.ports.resolver.resolve(&candidate, &duplicates)?;
                    debug!(file = %candidate.filename, ?decision, "duplicate resolved");
                    queue.decide(decision)?;
                }
                QueueStep::Finished(outcome) => break outcome,
            }
        };

        report.skipped = outcome
            .skipped
            .iter()
            .map(|candidate| candidate.filename.clone())
            .collect();
        if outcome.accepted.is_empty() {
            info!(%gallery_id, skipped = report.skipped.len(), "nothing to upload");
            return Ok(report);
        }

        let total = outcome.accepted.len();
        for (completed, file) in outcome.accepted.iter().enumerate() {
            on_progress(&UploadProgress {
                completed,
                total,
                current: Some(file.path.clone()),
            });
            match self.ports.uploads.upload(&gallery_id, file) {
                Ok(photo_id) => report.uploaded.push(photo_id),
                Err(error) => {
                    warn!(file = %file.filename, %error, "upload failed");
                    report.failed.push((file.filename.clone(), error.to_string()));
                }
            }
        }
        on_progress(&UploadProgress {
            completed: total,
            total,
            current: None,
        });

        if let Err(error) = self.reload_gallery(feed) {
            warn!(%gallery_id, %error, "reload after upload failed");
        }
        info!(
            %gallery_id,
            uploaded = report.uploaded.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            "upload finished"
        );
        Ok(report)
    }
}
