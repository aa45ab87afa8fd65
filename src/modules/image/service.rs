use std::path::Path;
use std::sync::Arc;

use actix_web::web;
use base64::{engine::general_purpose::STANDARD, Engine};
use log::{error, info, warn};
use uuid::Uuid;

use crate::api::error;
use crate::modules::image::{
    filter,
    model::{
        ImageFile, ImageSummary, NewImage, ProcessResponse, ServeResponse, UploadConfig,
        UploadResponse,
    },
    repository::ImageRepository,
    schema::{legacy_filter, ImageEntity},
    storage,
};
use crate::modules::user::schema::UserEntity;

pub struct ImageService<R>
where
    R: ImageRepository + Send + Sync,
{
    image_repo: Arc<R>,
    config: UploadConfig,
}

/// Runs CPU-bound image work off the async workers.
async fn run_blocking<F, T>(f: F) -> Result<T, error::SystemError>
where
    F: FnOnce() -> Result<T, error::SystemError> + Send + 'static,
    T: Send + 'static,
{
    web::block(f).await.map_err(|e| error::SystemError::InternalError(Box::new(e)))?
}

fn mime_type_for(filename: &str) -> String {
    mime_guess::from_path(filename).first_or_octet_stream().essence_str().to_string()
}

/// Ownership guard shared by every operation on an existing image.
fn authorize(
    image: ImageEntity,
    owner: &UserEntity,
    action: &str,
) -> Result<ImageEntity, error::SystemError> {
    if !image.is_owned_by(&owner.id) {
        warn!("Unauthorized attempt to {} image {} by user {}", action, image.id, owner.email);
        return Err(error::SystemError::forbidden(format!(
            "Not authorized to {action} this image"
        )));
    }
    Ok(image)
}

impl<R> ImageService<R>
where
    R: ImageRepository + Send + Sync,
{
    pub fn new(image_repo: Arc<R>, config: UploadConfig) -> Self {
        info!("ImageService initialized, storing files under {}", config.original_dir);
        Self { image_repo, config }
    }

    pub fn max_file_size(&self) -> usize {
        self.config.max_file_size
    }

    fn validate_metadata(&self, filename: &str, file_size: usize) -> Result<(), error::SystemError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default();

        if !self.config.allowed_extensions.contains(&extension) {
            return Err(error::SystemError::bad_request(format!(
                "File extension not allowed. Allowed extensions: {}",
                self.config.allowed_extensions.join(", ")
            )));
        }

        if file_size > self.config.max_file_size {
            return Err(error::SystemError::bad_request(format!(
                "File too large. Maximum size is {}MB",
                self.config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(())
    }

    /// Extension, size and a full decode. Hands the bytes back on success.
    async fn validate_upload(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<Vec<u8>, error::SystemError> {
        self.validate_metadata(filename, bytes.len())?;

        run_blocking(move || match image::load_from_memory(&bytes) {
            Ok(_) => Ok(bytes),
            Err(_) => Err(error::SystemError::bad_request("Invalid image file")),
        })
        .await
    }

    async fn find_owned(
        &self,
        image_id: &Uuid,
        owner: &UserEntity,
        action: &str,
    ) -> Result<ImageEntity, error::SystemError> {
        let image = self.image_repo.find_by_id(image_id).await?.ok_or_else(|| {
            warn!("Attempt to {} non-existent image: {}", action, image_id);
            error::SystemError::not_found("Image not found")
        })?;

        authorize(image, owner, action)
    }

    pub async fn upload(
        &self,
        owner: &UserEntity,
        original_filename: String,
        bytes: Vec<u8>,
    ) -> Result<UploadResponse, error::SystemError> {
        info!("Image upload attempt by user: {}", owner.email);

        let bytes = self.validate_upload(&original_filename, bytes).await?;

        tokio::fs::create_dir_all(&self.config.processed_dir).await?;
        let original_path =
            storage::save(&bytes, &self.config.original_dir, &original_filename).await?;
        let processed_path = storage::join(
            &self.config.processed_dir,
            &format!("processed_{}", storage::file_name(&original_path)),
        );

        let new_image = NewImage {
            user_id: owner.id,
            original_filename,
            original_path,
            processed_path,
        };

        let image = match self.image_repo.create(&new_image).await {
            Ok(image) => image,
            Err(e) => {
                // the original file stays on disk without a record
                error!("Image record creation failed, orphaned file: {}", new_image.original_path);
                return Err(e);
            }
        };

        info!(
            "Image uploaded successfully: {} by the user: {}",
            image.original_filename, owner.email
        );
        Ok(UploadResponse { image_id: image.id })
    }

    pub async fn apply_filter(
        &self,
        image_id: &Uuid,
        owner: &UserEntity,
        filter_name: &str,
    ) -> Result<ProcessResponse, error::SystemError> {
        info!("Image processing attempt {} with filter {}", image_id, filter_name);
        let image = self.find_owned(image_id, owner, "process").await?;

        let original_path = storage::normalize_path(&image.original_path);
        let processed_path = storage::normalize_path(&image.processed_path);

        if !storage::exists(&original_path).await {
            error!("Original image not found in the path: {}", original_path);
            return Err(error::SystemError::not_found(format!(
                "Original image file not found at path: {original_path}"
            )));
        }

        let input = storage::read(&original_path).await?;
        let name = filter_name.to_string();
        let output = run_blocking(move || filter::apply(&input, &name)).await?;

        storage::write(&processed_path, &output).await.map_err(|e| {
            error!("Error saving processed image to path {}: {}", processed_path, e);
            error::SystemError::processing(format!(
                "Error saving processed image at path: {processed_path}"
            ))
        })?;
        if !storage::exists(&processed_path).await {
            return Err(error::SystemError::processing(format!(
                "Error saving processed image at path: {processed_path}"
            )));
        }

        self.image_repo.update_filter_name(&image.id, filter_name).await?;

        info!("Image {} successfully processed with {} filter", image_id, filter_name);
        Ok(ProcessResponse { filter: filter_name.to_string() })
    }

    pub async fn list(&self, owner: &UserEntity) -> Result<Vec<ImageSummary>, error::SystemError> {
        info!("Getting list of images for the user: {}", owner.email);
        let images = self.image_repo.find_by_user(&owner.id).await?;
        Ok(images.into_iter().map(ImageSummary::from).collect())
    }

    /// Processed file when present, else the original.
    async fn resolve_file(&self, image: &ImageEntity) -> Result<String, error::SystemError> {
        let processed_path = storage::normalize_path(&image.processed_path);
        let file_path = if storage::exists(&processed_path).await {
            processed_path
        } else {
            storage::normalize_path(&image.original_path)
        };

        if !storage::exists(&file_path).await {
            error!("Image file not found in the path: {}", file_path);
            return Err(error::SystemError::not_found(format!(
                "Image file not found at path: {file_path}"
            )));
        }

        Ok(file_path)
    }

    pub async fn fetch(
        &self,
        image_id: &Uuid,
        owner: &UserEntity,
    ) -> Result<ImageFile, error::SystemError> {
        info!("Image file request {} by user: {}", image_id, owner.email);
        let image = self.find_owned(image_id, owner, "access").await?;
        let file_path = self.resolve_file(&image).await?;
        let bytes = storage::read(&file_path).await?;

        Ok(ImageFile {
            bytes,
            mime_type: mime_type_for(&image.original_filename),
            filename: image.original_filename,
        })
    }

    pub async fn serve(
        &self,
        image_id: &Uuid,
        owner: &UserEntity,
    ) -> Result<ServeResponse, error::SystemError> {
        let file = self.fetch(image_id, owner).await?;
        Ok(ServeResponse {
            image_data: format!("data:{};base64,{}", file.mime_type, STANDARD.encode(&file.bytes)),
            filename: file.filename,
        })
    }

    pub async fn delete(&self, image_id: &Uuid, owner: &UserEntity) -> Result<(), error::SystemError> {
        info!("Image deletion attempt {} by user: {}", image_id, owner.email);
        let image = self.find_owned(image_id, owner, "delete").await?;

        for path in [&image.original_path, &image.processed_path] {
            let path = storage::normalize_path(path);
            if storage::exists(&path).await {
                if let Err(e) = storage::delete(&path).await {
                    warn!("Could not remove file {}: {}", path, e);
                }
            }
        }

        self.image_repo.delete(&image.id).await?;

        info!("Image {} successfully removed", image_id);
        Ok(())
    }

    /// Moves legacy `transformations` lists into the discrete filter fields.
    pub async fn migrate_legacy(&self) -> Result<usize, error::SystemError> {
        let legacy = self.image_repo.find_legacy().await?;

        for image in &legacy {
            let (filter_name, filter_value) = legacy_filter(&image.transformations);
            self.image_repo
                .replace_legacy(&image.id, filter_name.as_deref(), filter_value.as_deref())
                .await?;
        }

        if !legacy.is_empty() {
            info!("Migrated {} image record(s) from legacy transformations", legacy.len());
        }
        Ok(legacy.len())
    }
}
