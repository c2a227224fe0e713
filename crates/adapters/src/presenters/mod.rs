use shotbook_application::UploadReport;
use shotbook_domain::{
    Appointment, Comment, DownloadResponse, EmailTemplate, GalleryFeed, MediaType, Photo,
    RenderedEmail, Workflow,
};

pub fn present_feed_header(feed: &GalleryFeed) -> String {
    let name = feed
        .gallery()
        .map(|gallery| gallery.name.as_str())
        .unwrap_or("(untitled gallery)");
    let more = if feed.pagination().has_more {
        ", more available"
    } else {
        ""
    };
    format!(
        "gallery {} \"{}\": {} items in {} pages{}",
        feed.gallery_id(),
        name,
        feed.photos().len(),
        feed.pages_loaded(),
        more
    )
}

pub fn present_photo_row(photo: &Photo) -> String {
    let kind = match photo.media_type {
        MediaType::Image => "IMAGE",
        MediaType::Video => "VIDEO",
    };
    let size = photo
        .dimensions
        .map(|dims| format!("{}x{}", dims.width, dims.height))
        .unwrap_or_else(|| "-".to_string());
    let favorite = if photo.is_favorite { "*" } else { " " };
    format!(
        "{}\t{}\t{}\t{}{}\t{} comments\t{}",
        photo.id, kind, size, favorite, photo.favorites_count, photo.comments_count, photo.filename
    )
}

pub fn present_comment(comment: &Comment) -> String {
    let author = comment.author.as_deref().unwrap_or("anonymous");
    let mut line = format!("[{}] {}: {}", comment.id, author, comment.text);
    if let Some(annotation) = &comment.annotation {
        line.push_str(&format!(" (markup, {} points)", annotation.points().len()));
    }
    if let Some(at) = comment.video_timestamp_secs {
        line.push_str(&format!(" @{at:.1}s"));
    }
    line
}

pub fn present_upload_report(report: &UploadReport) -> String {
    let mut lines = vec![format!(
        "scanned {} files, uploaded {}, skipped {}, failed {}",
        report.scanned_files,
        report.uploaded.len(),
        report.skipped.len(),
        report.failed.len()
    )];
    for name in &report.skipped {
        lines.push(format!("skipped duplicate {name}"));
    }
    for (name, reason) in &report.failed {
        lines.push(format!("failed {name}: {reason}"));
    }
    lines.join("\n")
}

pub fn present_download(response: &DownloadResponse) -> String {
    match response {
        DownloadResponse::Redirect { url } => format!("download ready: {url}"),
        DownloadResponse::Pending { job_id } => {
            format!("download is being prepared (job {job_id}); you will be notified")
        }
    }
}

pub fn present_template_row(template: &EmailTemplate) -> String {
    let placeholders = template
        .placeholders()
        .map(|names| names.join(","))
        .unwrap_or_else(|error| format!("invalid: {error}"));
    format!(
        "{}\t{}\t{}\t[{}]",
        template.id, template.name, template.subject, placeholders
    )
}

pub fn present_rendered_email(email: &RenderedEmail) -> String {
    format!("Subject: {}\n\n{}", email.subject, email.body)
}

pub fn present_workflow(workflow: &Workflow) -> String {
    let mut lines = vec![format!(
        "{}\t{} ({} steps)",
        workflow.id,
        workflow.name,
        workflow.steps.len()
    )];
    for (step, day) in workflow.schedule() {
        lines.push(format!("  day {day:>3}  {:?}  {}", step.kind, step.title));
    }
    lines.join("\n")
}

pub fn present_appointment(appointment: &Appointment) -> String {
    format!(
        "{}\t{} - {}\t{}\t{}",
        appointment.id,
        appointment.starts_at.format("%Y-%m-%d %H:%M"),
        appointment.ends_at.format("%H:%M"),
        appointment.title,
        appointment.client_email
    )
}
