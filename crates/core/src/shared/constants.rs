use std::time::Duration;

/// API version date sent with every Visual Recognition v3 request.
pub const DEFAULT_API_VERSION: &str = "2018-03-19";

pub const DEFAULT_LOCALE: &str = "en";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// File name of the single transient capture slot.
pub const CAPTURE_SLOT_NAME: &str = "capture.jpg";

pub const CREDENTIALS_FILE_NAME: &str = "credentials.json";

pub const APP_DIR_NAME: &str = "Visual Tags";

pub const ENV_SERVICE_URL: &str = "VISUAL_RECOGNITION_URL";
pub const ENV_API_KEY: &str = "VISUAL_RECOGNITION_APIKEY";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp", "gif"];
