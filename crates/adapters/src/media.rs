use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use image::imageops::FilterType;
use shotbook_application::{
    ApplicationError, LoadedMedia, MediaLoader, MediaRequest, MediaSource,
};
use tracing::{debug, warn};

pub const DEFAULT_MAX_WIDTH: u32 = 1920;
pub const DEFAULT_MAX_HEIGHT: u32 = 1080;

/// Fetches and decodes lightbox media on a worker thread. Only the most
/// recent selection is worth showing, so queued requests for older
/// generations are skipped and stale results are never returned.
pub struct BackgroundMediaLoader {
    latest_generation: Arc<AtomicU64>,
    submit_tx: mpsc::Sender<MediaRequest>,
    result_rx: Mutex<mpsc::Receiver<LoadedMedia>>,
}

impl BackgroundMediaLoader {
    pub fn new(source: Arc<dyn MediaSource>) -> Result<Self, ApplicationError> {
        Self::with_bounds(source, DEFAULT_MAX_WIDTH, DEFAULT_MAX_HEIGHT)
    }

    pub fn with_bounds(
        source: Arc<dyn MediaSource>,
        max_width: u32,
        max_height: u32,
    ) -> Result<Self, ApplicationError> {
        let (submit_tx, submit_rx) = mpsc::channel::<MediaRequest>();
        let (result_tx, result_rx) = mpsc::channel::<LoadedMedia>();
        let latest_generation = Arc::new(AtomicU64::new(0));
        spawn_worker(
            submit_rx,
            result_tx,
            Arc::clone(&latest_generation),
            source,
            (max_width.max(1), max_height.max(1)),
        )?;
        Ok(Self {
            latest_generation,
            submit_tx,
            result_rx: Mutex::new(result_rx),
        })
    }
}

impl MediaLoader for BackgroundMediaLoader {
    fn submit(&self, request: MediaRequest) -> Result<(), ApplicationError> {
        self.latest_generation
            .fetch_max(request.generation, Ordering::SeqCst);
        self.submit_tx
            .send(request)
            .map_err(|error| ApplicationError::Io(format!("failed to enqueue media load: {error}")))
    }

    fn try_receive(&self) -> Result<Option<LoadedMedia>, ApplicationError> {
        let receiver = self
            .result_rx
            .lock()
            .map_err(|_| ApplicationError::Io("media result lock poisoned".to_string()))?;
        let mut newest = None;
        loop {
            match receiver.try_recv() {
                Ok(media) => newest = Some(media),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    return Err(ApplicationError::Io(
                        "media result channel disconnected".to_string(),
                    ))
                }
            }
        }
        let latest = self.latest_generation.load(Ordering::SeqCst);
        Ok(newest.filter(|media| media.generation == latest))
    }
}

fn spawn_worker(
    submit_rx: mpsc::Receiver<MediaRequest>,
    result_tx: mpsc::Sender<LoadedMedia>,
    latest_generation: Arc<AtomicU64>,
    source: Arc<dyn MediaSource>,
    bounds: (u32, u32),
) -> Result<(), ApplicationError> {
    thread::Builder::new()
        .name("shotbook-media".to_string())
        .spawn(move || {
            while let Ok(mut request) = submit_rx.recv() {
                while let Ok(next) = submit_rx.try_recv() {
                    request = next;
                }
                if request.generation < latest_generation.load(Ordering::SeqCst) {
                    continue;
                }
                let loaded = source
                    .fetch_media(&request.url)
                    .and_then(|bytes| decode_pixels(&bytes, bounds));
                let (width, height, pixels) = match loaded {
                    Ok(decoded) => decoded,
                    Err(error) => {
                        warn!(photo_id = %request.photo_id, %error, "media load failed");
                        continue;
                    }
                };
                if request.generation < latest_generation.load(Ordering::SeqCst) {
                    debug!(photo_id = %request.photo_id, "discarding superseded media");
                    continue;
                }
                let media = LoadedMedia {
                    photo_id: request.photo_id,
                    generation: request.generation,
                    width,
                    height,
                    pixels,
                };
                if result_tx.send(media).is_err() {
                    return;
                }
            }
        })
        .map(|_| ())
        .map_err(|error| ApplicationError::Io(format!("failed to start media worker: {error}")))
}

/// Decodes encoded image bytes into `0RGB` pixels no larger than `bounds`,
/// keeping the aspect ratio.
pub fn decode_pixels(
    bytes: &[u8],
    (max_width, max_height): (u32, u32),
) -> Result<(u32, u32, Vec<u32>), ApplicationError> {
    let image = image::load_from_memory(bytes)
        .map_err(|error| ApplicationError::Decode(error.to_string()))?;
    if image.width() == 0 || image.height() == 0 {
        return Err(ApplicationError::Decode("image has no pixels".to_string()));
    }
    let image = if image.width() > max_width || image.height() > max_height {
        image.resize(max_width, max_height, FilterType::Triangle)
    } else {
        image
    };
    let rgb = image.to_rgb8();
    let pixels = rgb
        .pixels()
        .map(|pixel| {
            let [red, green, blue] = pixel.0;
            (u32::from(red) << 16) | (u32::from(green) << 8) | u32::from(blue)
        })
        .collect();
    Ok((rgb.width(), rgb.height(), pixels))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::time::{Duration, Instant};

    use image::{DynamicImage, ImageBuffer, ImageOutputFormat, Rgb};
    use shotbook_domain::PhotoId;

    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let pixels = ImageBuffer::from_pixel(width, height, Rgb([200_u8, 100_u8, 50_u8]));
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(pixels)
            .write_to(&mut bytes, ImageOutputFormat::Png)
            .expect("encode png");
        bytes.into_inner()
    }

    struct StaticSource(Vec<u8>);

    impl MediaSource for StaticSource {
        fn fetch_media(&self, url: &str) -> Result<Vec<u8>, ApplicationError> {
            if url.ends_with("missing.png") {
                return Err(ApplicationError::from_status(404, "missing"));
            }
            Ok(self.0.clone())
        }
    }

    fn request(id: &str, generation: u64) -> MediaRequest {
        MediaRequest {
            photo_id: PhotoId::new(id).expect("id"),
            url: format!("https://cdn.example.com/{id}.png"),
            generation,
        }
    }

    #[test]
    fn decode_scales_down_and_packs_rgb() {
        let (width, height, pixels) = decode_pixels(&png(400, 200), (100, 100)).expect("decode");
        assert_eq!((width, height), (100, 50));
        assert_eq!(pixels.len(), 5_000);
        assert_eq!(pixels[0], 0x00C8_6432);
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        assert!(matches!(
            decode_pixels(b"definitely not an image", (10, 10)),
            Err(ApplicationError::Decode(_))
        ));
    }

    #[test]
    fn only_the_latest_generation_is_delivered() {
        let loader =
            BackgroundMediaLoader::new(Arc::new(StaticSource(png(8, 8)))).expect("loader");
        for generation in 1..=5 {
            loader
                .submit(request(&format!("p{generation}"), generation))
                .expect("submit");
        }

        let deadline = Instant::now() + Duration::from_millis(2_000);
        let media = loop {
            if let Some(media) = loader.try_receive().expect("poll") {
                break media;
            }
            assert!(Instant::now() < deadline, "timed out waiting for media");
            thread::sleep(Duration::from_millis(10));
        };
        assert_eq!(media.generation, 5);
        assert_eq!(media.photo_id.as_str(), "p5");
        assert_eq!((media.width, media.height), (8, 8));
    }
}
