mod config;
mod logging;
mod prompt;
mod viewer;

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use config::AppConfig;
use prompt::TerminalPrompt;
use serde::de::DeserializeOwned;
use shotbook_adapters::{
    present_appointment, present_comment, present_download, present_feed_header,
    present_photo_row, present_rendered_email, present_template_row, present_upload_report,
    present_workflow, BackgroundAnalyticsSink, BackgroundMediaLoader, RestClient, SystemClock,
    WalkdirUploadScanner,
};
use shotbook_application::{
    AddCommentCommand, ApplicationError, ApplicationService, BookAppointmentCommand,
    DeleteCommentCommand, PreviewTemplateCommand, RequestDownloadCommand, ServicePorts,
    ToggleFavoriteCommand, UpdateSettingsCommand, UpdateTemplateCommand, UpdateWorkflowCommand,
    UploadFolderCommand, UploadProgress, ViewerSession,
};
use shotbook_domain::{
    CommentId, EmailTemplate, GalleryFeed, GalleryId, GallerySettings, NewAppointment, PhotoId,
    Workflow,
};
use viewer::ViewerOptions;

fn main() -> ExitCode {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("{error}");
            return ExitCode::from(1);
        }
    };
    logging::init_logging(&config.log_filter);

    let args: Vec<String> = std::env::args().collect();
    let command = match parse_command(&args) {
        Ok(command) => command,
        Err(error) => return exit_with(error),
    };

    let client = match RestClient::new(config.rest_client_config()) {
        Ok(client) => client,
        Err(error) => {
            eprintln!("failed to configure the API client: {error}");
            return ExitCode::from(1);
        }
    };
    let service = match build_application_service(&config, &client) {
        Ok(service) => service,
        Err(error) => return exit_with(error),
    };

    match run_command(command, &service, &client, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => exit_with(error),
    }
}

fn exit_with(error: CommandError) -> ExitCode {
    match error {
        CommandError::Usage(msg) => {
            eprintln!("{msg}");
            print_usage();
            ExitCode::from(2)
        }
        CommandError::Runtime(msg) => {
            eprintln!("{msg}");
            ExitCode::from(1)
        }
    }
}

fn build_application_service(
    config: &AppConfig,
    client: &RestClient,
) -> Result<ApplicationService, CommandError> {
    let analytics = BackgroundAnalyticsSink::new(Arc::new(client.clone()))
        .map_err(|error| CommandError::Runtime(error.to_string()))?;
    let prompt = TerminalPrompt::stdio();
    let ports = ServicePorts {
        galleries: Box::new(client.clone()),
        favorites: Box::new(client.clone()),
        comments: Box::new(client.clone()),
        duplicates: Box::new(client.clone()),
        uploads: Box::new(client.clone()),
        downloads: Box::new(client.clone()),
        studio: Box::new(client.clone()),
        analytics: Box::new(analytics),
        scanner: Box::new(WalkdirUploadScanner),
        resolver: Box::new(prompt.clone()),
        guest_prompt: Box::new(prompt),
        clock: Box::new(SystemClock),
    };
    Ok(ApplicationService::new(ports, config.page_size, config.guest()))
}

/// Where the viewer opens: a position in the first page, or a photo that
/// may sit on a later page.
#[derive(Debug, Clone, PartialEq)]
enum StartAt {
    Index(usize),
    Photo(PhotoId),
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    List {
        gallery_id: GalleryId,
        all: bool,
    },
    View {
        gallery_id: GalleryId,
        start: StartAt,
    },
    Favorite {
        gallery_id: GalleryId,
        photo_id: PhotoId,
    },
    Comments {
        gallery_id: GalleryId,
        photo_id: PhotoId,
    },
    Comment {
        gallery_id: GalleryId,
        photo_id: PhotoId,
        text: String,
    },
    Uncomment {
        gallery_id: GalleryId,
        photo_id: PhotoId,
        comment_id: CommentId,
    },
    Upload {
        gallery_id: GalleryId,
        folder: PathBuf,
    },
    Download {
        gallery_id: GalleryId,
    },
    Settings {
        gallery_id: GalleryId,
        file: PathBuf,
    },
    Templates,
    TemplatePreview {
        template_id: String,
        values: HashMap<String, String>,
    },
    TemplateUpdate {
        file: PathBuf,
    },
    Workflows,
    WorkflowUpdate {
        file: PathBuf,
    },
    Appointments,
    Book {
        appointment: NewAppointment,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum CommandError {
    Usage(String),
    Runtime(String),
}

fn runtime(context: &str) -> impl Fn(ApplicationError) -> CommandError + '_ {
    move |error| CommandError::Runtime(format!("{context} failed: {error}"))
}

fn parse_command(args: &[String]) -> Result<Command, CommandError> {
    let Some(name) = args.get(1) else {
        return Err(CommandError::Usage("missing command".to_string()));
    };
    let rest = &args[2..];

    match name.as_str() {
        "list" => {
            let gallery_id = gallery_arg(rest)?;
            let all = match rest.get(1).map(String::as_str) {
                None => false,
                Some("--all") => true,
                Some(other) => {
                    return Err(CommandError::Usage(format!("unexpected argument: {other}")))
                }
            };
            Ok(Command::List { gallery_id, all })
        }
        "view" => {
            let gallery_id = gallery_arg(rest)?;
            let start = match rest.get(1) {
                None => StartAt::Index(0),
                Some(raw) if raw.bytes().all(|byte| byte.is_ascii_digit()) => {
                    let index = raw
                        .parse::<usize>()
                        .map_err(|_| CommandError::Usage(format!("invalid start index: {raw}")))?;
                    StartAt::Index(index)
                }
                Some(_) => StartAt::Photo(photo_arg(rest)?),
            };
            Ok(Command::View { gallery_id, start })
        }
        "favorite" => Ok(Command::Favorite {
            gallery_id: gallery_arg(rest)?,
            photo_id: photo_arg(rest)?,
        }),
        "comments" => Ok(Command::Comments {
            gallery_id: gallery_arg(rest)?,
            photo_id: photo_arg(rest)?,
        }),
        "uncomment" => Ok(Command::Uncomment {
            gallery_id: gallery_arg(rest)?,
            photo_id: photo_arg(rest)?,
            comment_id: CommentId::new(required(rest, 2, "comment id")?)
                .map_err(|error| CommandError::Usage(format!("invalid comment id: {error}")))?,
        }),
        "comment" => {
            let text = rest.get(2..).unwrap_or_default().join(" ");
            if text.trim().is_empty() {
                return Err(CommandError::Usage("missing comment text".to_string()));
            }
            Ok(Command::Comment {
                gallery_id: gallery_arg(rest)?,
                photo_id: photo_arg(rest)?,
                text,
            })
        }
        "upload" => Ok(Command::Upload {
            gallery_id: gallery_arg(rest)?,
            folder: required(rest, 1, "folder path")?.into(),
        }),
        "download" => Ok(Command::Download {
            gallery_id: gallery_arg(rest)?,
        }),
        "settings" => Ok(Command::Settings {
            gallery_id: gallery_arg(rest)?,
            file: required(rest, 1, "settings file")?.into(),
        }),
        "templates" => Ok(Command::Templates),
        "template-preview" => {
            let template_id = required(rest, 0, "template id")?.to_string();
            let mut values = HashMap::new();
            for pair in &rest[1..] {
                let (key, value) = pair.split_once('=').ok_or_else(|| {
                    CommandError::Usage(format!("expected key=value, got: {pair}"))
                })?;
                values.insert(key.trim().to_string(), value.to_string());
            }
            Ok(Command::TemplatePreview {
                template_id,
                values,
            })
        }
        "template-update" => Ok(Command::TemplateUpdate {
            file: required(rest, 0, "template file")?.into(),
        }),
        "workflows" => Ok(Command::Workflows),
        "workflow-update" => Ok(Command::WorkflowUpdate {
            file: required(rest, 0, "workflow file")?.into(),
        }),
        "appointments" => Ok(Command::Appointments),
        "book" => Ok(Command::Book {
            appointment: NewAppointment {
                title: required(rest, 0, "title")?.to_string(),
                client_email: required(rest, 1, "client email")?.to_string(),
                starts_at: timestamp_arg(required(rest, 2, "start time")?)?,
                ends_at: timestamp_arg(required(rest, 3, "end time")?)?,
            },
        }),
        other => Err(CommandError::Usage(format!("unknown command: {other}"))),
    }
}

fn required<'a>(rest: &'a [String], index: usize, what: &str) -> Result<&'a str, CommandError> {
    rest.get(index)
        .map(String::as_str)
        .ok_or_else(|| CommandError::Usage(format!("missing {what}")))
}

fn gallery_arg(rest: &[String]) -> Result<GalleryId, CommandError> {
    GalleryId::new(required(rest, 0, "gallery id")?)
        .map_err(|error| CommandError::Usage(format!("invalid gallery id: {error}")))
}

fn photo_arg(rest: &[String]) -> Result<PhotoId, CommandError> {
    PhotoId::new(required(rest, 1, "photo id")?)
        .map_err(|error| CommandError::Usage(format!("invalid photo id: {error}")))
}

fn timestamp_arg(raw: &str) -> Result<DateTime<Utc>, CommandError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|time| time.with_timezone(&Utc))
        .map_err(|error| CommandError::Usage(format!("invalid RFC 3339 time {raw}: {error}")))
}

fn read_json<T: DeserializeOwned>(file: &PathBuf) -> Result<T, CommandError> {
    let text = std::fs::read_to_string(file).map_err(|error| {
        CommandError::Runtime(format!("failed to read {}: {error}", file.display()))
    })?;
    serde_json::from_str(&text)
        .map_err(|error| CommandError::Runtime(format!("invalid {}: {error}", file.display())))
}

/// Loads the gallery and the photo's current comments from the server.
fn load_with_comments(
    service: &ApplicationService,
    gallery_id: GalleryId,
    photo_id: &PhotoId,
) -> Result<GalleryFeed, CommandError> {
    let mut feed = load_feed(service, gallery_id, true)?;
    ensure_photo(&feed, photo_id)?;
    service
        .refresh_comments(&mut feed, photo_id)
        .map_err(runtime("comment list"))?;
    Ok(feed)
}

fn load_feed(
    service: &ApplicationService,
    gallery_id: GalleryId,
    all: bool,
) -> Result<GalleryFeed, CommandError> {
    let mut feed = GalleryFeed::new(gallery_id);
    if all {
        service.load_all(&mut feed).map_err(runtime("gallery load"))?;
    } else {
        service
            .reload_gallery(&mut feed)
            .map_err(runtime("gallery load"))?;
    }
    Ok(feed)
}

fn ensure_photo(feed: &GalleryFeed, photo_id: &PhotoId) -> Result<(), CommandError> {
    if feed.photo(photo_id).is_none() {
        return Err(CommandError::Runtime(format!(
            "photo {photo_id} is not in gallery {}",
            feed.gallery_id()
        )));
    }
    Ok(())
}

fn run_command(
    command: Command,
    service: &ApplicationService,
    client: &RestClient,
    config: &AppConfig,
) -> Result<(), CommandError> {
    match command {
        Command::List { gallery_id, all } => {
            let feed = load_feed(service, gallery_id, all)?;
            println!("{}", present_feed_header(&feed));
            for photo in feed.photos() {
                println!("{}", present_photo_row(photo));
            }
            Ok(())
        }
        Command::View { gallery_id, start } => {
            let feed = load_feed(service, gallery_id, matches!(start, StartAt::Photo(_)))?;
            if feed.photos().is_empty() {
                println!("{}", present_feed_header(&feed));
                return Ok(());
            }
            let start_index = match &start {
                StartAt::Index(index) => *index,
                StartAt::Photo(photo_id) => feed.index_of(photo_id).ok_or_else(|| {
                    CommandError::Runtime(format!(
                        "photo {photo_id} is not in gallery {}",
                        feed.gallery_id()
                    ))
                })?,
            };
            let loader = BackgroundMediaLoader::new(Arc::new(client.clone()))
                .map_err(runtime("media loader start"))?;
            let mut session = ViewerSession::new(service, feed, config.lightbox.timings());
            viewer::launch_viewer(
                &mut session,
                &loader,
                ViewerOptions {
                    start_index,
                    slideshow_interval_ms: config.lightbox.slideshow_interval_ms,
                },
            )
            .map_err(CommandError::Runtime)
        }
        Command::Favorite {
            gallery_id,
            photo_id,
        } => {
            let mut feed = load_feed(service, gallery_id, true)?;
            ensure_photo(&feed, &photo_id)?;
            let favorite = service
                .toggle_favorite(
                    &mut feed,
                    ToggleFavoriteCommand {
                        photo_id: photo_id.clone(),
                    },
                )
                .map_err(runtime("favorite"))?;
            println!(
                "{} {photo_id}",
                if favorite { "favorited" } else { "unfavorited" }
            );
            if let Some(photo) = feed.photo(&photo_id) {
                println!("{}", present_photo_row(photo));
            }
            Ok(())
        }
        Command::Comments {
            gallery_id,
            photo_id,
        } => {
            let feed = load_with_comments(service, gallery_id, &photo_id)?;
            let comments = feed
                .photo(&photo_id)
                .map(|photo| photo.comments.as_slice())
                .unwrap_or_default();
            if comments.is_empty() {
                println!("no comments on {photo_id}");
            }
            for comment in comments {
                println!("{}", present_comment(comment));
            }
            Ok(())
        }
        Command::Uncomment {
            gallery_id,
            photo_id,
            comment_id,
        } => {
            let mut feed = load_with_comments(service, gallery_id, &photo_id)?;
            service
                .delete_comment(
                    &mut feed,
                    DeleteCommentCommand {
                        photo_id: photo_id.clone(),
                        comment_id: comment_id.clone(),
                    },
                )
                .map_err(runtime("comment delete"))?;
            println!("deleted comment {comment_id} from {photo_id}");
            Ok(())
        }
        Command::Comment {
            gallery_id,
            photo_id,
            text,
        } => {
            let mut feed = load_feed(service, gallery_id, true)?;
            ensure_photo(&feed, &photo_id)?;
            let comment = service
                .add_comment(
                    &mut feed,
                    AddCommentCommand {
                        photo_id,
                        text,
                        annotation: None,
                        video_timestamp_secs: None,
                    },
                )
                .map_err(runtime("comment"))?;
            println!("{}", present_comment(&comment));
            Ok(())
        }
        Command::Upload { gallery_id, folder } => {
            let mut feed = load_feed(service, gallery_id, false)?;
            let mut progress = |update: &UploadProgress| {
                let current = update
                    .current
                    .as_ref()
                    .and_then(|path| path.file_name())
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                eprint!("\ruploading {}/{} {current:<40}", update.completed, update.total);
                let _ = std::io::stderr().flush();
            };
            let report = service
                .process_upload_queue(&mut feed, UploadFolderCommand { folder }, &mut progress)
                .map_err(runtime("upload"))?;
            eprintln!();
            println!("{}", present_upload_report(&report));
            Ok(())
        }
        Command::Download { gallery_id } => {
            let feed = load_feed(service, gallery_id, false)?;
            let response = service
                .request_download(&feed, RequestDownloadCommand::default())
                .map_err(runtime("download"))?;
            println!("{}", present_download(&response));
            Ok(())
        }
        Command::Settings { gallery_id, file } => {
            let settings: GallerySettings = read_json(&file)?;
            let saved = service
                .update_gallery_settings(UpdateSettingsCommand {
                    gallery_id,
                    settings,
                })
                .map_err(runtime("settings update"))?;
            println!("saved settings for \"{}\" (slug {})", saved.name, saved.seo.slug);
            Ok(())
        }
        Command::Templates => {
            let templates = service.list_templates().map_err(runtime("template list"))?;
            if templates.is_empty() {
                println!("no email templates");
            }
            for template in &templates {
                println!("{}", present_template_row(template));
            }
            Ok(())
        }
        Command::TemplatePreview {
            template_id,
            values,
        } => {
            let rendered = service
                .preview_template(PreviewTemplateCommand {
                    template_id,
                    values,
                })
                .map_err(runtime("template preview"))?;
            println!("{}", present_rendered_email(&rendered));
            Ok(())
        }
        Command::TemplateUpdate { file } => {
            let template: EmailTemplate = read_json(&file)?;
            let id = template.id.clone();
            service
                .update_template(UpdateTemplateCommand { template })
                .map_err(runtime("template update"))?;
            println!("saved email template {id}");
            Ok(())
        }
        Command::WorkflowUpdate { file } => {
            let workflow: Workflow = read_json(&file)?;
            let summary = present_workflow(&workflow);
            service
                .update_workflow(UpdateWorkflowCommand { workflow })
                .map_err(runtime("workflow update"))?;
            println!("saved workflow {summary}");
            Ok(())
        }
        Command::Workflows => {
            let workflows = service.list_workflows().map_err(runtime("workflow list"))?;
            if workflows.is_empty() {
                println!("no workflows");
            }
            for workflow in &workflows {
                println!("{}", present_workflow(workflow));
            }
            Ok(())
        }
        Command::Appointments => {
            let appointments = service
                .list_appointments()
                .map_err(runtime("appointment list"))?;
            if appointments.is_empty() {
                println!("no appointments");
            }
            for appointment in &appointments {
                println!("{}", present_appointment(appointment));
            }
            Ok(())
        }
        Command::Book { appointment } => {
            let booked = service
                .book_appointment(BookAppointmentCommand { appointment })
                .map_err(runtime("booking"))?;
            println!("booked {}", present_appointment(&booked));
            Ok(())
        }
    }
}

fn print_usage() {
    println!("usage:");
    println!("  shotbook list <gallery_id> [--all]");
    println!("  shotbook view <gallery_id> [start_index | photo_id]");
    println!("  shotbook favorite <gallery_id> <photo_id>");
    println!("  shotbook comments <gallery_id> <photo_id>");
    println!("  shotbook comment <gallery_id> <photo_id> <text...>");
    println!("  shotbook uncomment <gallery_id> <photo_id> <comment_id>");
    println!("  shotbook upload <gallery_id> <folder>");
    println!("  shotbook download <gallery_id>");
    println!("  shotbook settings <gallery_id> <settings.json>");
    println!("  shotbook templates");
    println!("  shotbook template-preview <template_id> <key=value>...");
    println!("  shotbook template-update <template.json>");
    println!("  shotbook workflows");
    println!("  shotbook workflow-update <workflow.json>");
    println!("  shotbook appointments");
    println!("  shotbook book <title> <client_email> <starts_at> <ends_at>");
}
