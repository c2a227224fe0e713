pub mod analytics;
pub mod fs;
pub mod http;
pub mod media;
pub mod presenters;

pub use analytics::{AnalyticsTransport, BackgroundAnalyticsSink, DispatchStats};
pub use fs::{SystemClock, WalkdirUploadScanner};
pub use http::{RestClient, RestClientConfig};
pub use media::{decode_pixels, BackgroundMediaLoader};
pub use presenters::{
    present_appointment, present_comment, present_download, present_feed_header,
    present_photo_row, present_rendered_email, present_template_row, present_upload_report,
    present_workflow,
};
