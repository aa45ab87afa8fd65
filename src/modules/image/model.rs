use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::constants::{Env, DEFAULT_ALLOWED_EXTENSIONS, DEFAULT_MAX_FILE_SIZE};
use crate::modules::image::schema::ImageEntity;

/// New image metadata to insert into database
#[derive(Debug, Clone)]
pub struct NewImage {
    pub user_id: Uuid,
    pub original_filename: String,
    pub original_path: String,
    pub processed_path: String,
}

/// Image upload configuration
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_file_size: usize,
    pub allowed_extensions: Vec<String>,
    pub original_dir: String,
    pub processed_dir: String,
}

impl UploadConfig {
    pub fn with_upload_dir(upload_dir: &str) -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            original_dir: format!("{upload_dir}/original"),
            processed_dir: format!("{upload_dir}/processed"),
        }
    }
}

impl From<&Env> for UploadConfig {
    fn from(env: &Env) -> Self {
        Self {
            max_file_size: env.max_file_size,
            allowed_extensions: env.allowed_extensions.clone(),
            ..Self::with_upload_dir(&env.upload_dir)
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProcessRequest {
    #[validate(length(min = 1, message = "Filter name cannot be empty"))]
    pub filter_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub image_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub filter: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageSummary {
    pub id: Uuid,
    pub original_filename: String,
    pub original_path: String,
    pub processed_path: String,
    pub filter_name: Option<String>,
    pub filter_value: Option<String>,
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}

impl From<ImageEntity> for ImageSummary {
    fn from(entity: ImageEntity) -> Self {
        ImageSummary {
            filter_name: entity.resolved_filter_name(),
            filter_value: entity.resolved_filter_value(),
            id: entity.id,
            original_filename: entity.original_filename,
            original_path: entity.original_path,
            processed_path: entity.processed_path,
            uploaded_at: entity.uploaded_at,
        }
    }
}

/// Base64 data URI representation returned by the serve endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ServeResponse {
    pub image_data: String,
    pub filename: String,
}

/// Raw image content with the MIME type of the original upload.
#[derive(Debug)]
pub struct ImageFile {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub filename: String,
}
