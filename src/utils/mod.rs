pub mod error;
pub mod fs;
pub mod validation;

pub use error::{GatewayError, ReviveError, ReviveResult, TranscodeError, ValidationError};
pub use fs::{download_file_name, save_download};
pub use validation::{ensure_image_upload, sniff_media_type};
