use std::path::Path;

use shotbook_application::{ApplicationError, UploadScan, UploadScanner};
use shotbook_domain::{detect_media_type, Dimensions, MediaType, UploadCandidate};
use tracing::debug;
use walkdir::WalkDir;

/// Walks a folder for uploadable media. Files come back sorted by path so
/// the duplicate prompts follow a predictable order.
#[derive(Debug, Default)]
pub struct WalkdirUploadScanner;

impl UploadScanner for WalkdirUploadScanner {
    fn scan_folder(&self, folder: &Path) -> Result<UploadScan, ApplicationError> {
        if !folder.is_dir() {
            return Err(ApplicationError::InvalidInput(format!(
                "folder does not exist or is not a directory: {}",
                folder.display()
            )));
        }

        let mut scan = UploadScan::default();
        let walker = WalkDir::new(folder).sort_by_file_name();
        for entry in walker.into_iter().filter_map(Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            scan.scanned_files += 1;

            let path = entry.path();
            let Some(media_type) = detect_media_type(path) else {
                continue;
            };
            let Some(filename) = path.file_name().and_then(|name| name.to_str()) else {
                debug!(path = %path.display(), "skipping file with a non UTF-8 name");
                continue;
            };
            let metadata = entry
                .metadata()
                .map_err(|error| ApplicationError::Io(error.to_string()))?;
            let dimensions = match media_type {
                MediaType::Image => probe_dimensions(path),
                MediaType::Video => None,
            };

            scan.candidates.push(UploadCandidate {
                path: path.to_path_buf(),
                filename: filename.to_string(),
                file_size: metadata.len(),
                media_type,
                dimensions,
            });
        }
        Ok(scan)
    }
}

fn probe_dimensions(path: &Path) -> Option<Dimensions> {
    match image::image_dimensions(path) {
        Ok((width, height)) => Some(Dimensions { width, height }),
        Err(error) => {
            debug!(path = %path.display(), %error, "could not read image dimensions");
            None
        }
    }
}
