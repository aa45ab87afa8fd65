//! In-memory repositories and image fixtures shared by the unit tests.

use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Mutex};

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use uuid::Uuid;

use crate::api::error::{self, DbErrorMeta};
use crate::modules::image::{
    model::{NewImage, UploadConfig},
    repository::ImageRepository,
    schema::ImageEntity,
};
use crate::modules::user::{
    model::{InsertUser, UpdateUser},
    repository::UserRepository,
    schema::{UserEntity, UserRole},
    service::UserService,
};

pub const TEST_SECRET: &str = "test-secret-key";

fn email_conflict() -> error::SystemError {
    error::SystemError::Conflict(Some(DbErrorMeta {
        code: Some("23505".to_string()),
        constraint: Some("users_email_key".to_string()),
        message: "duplicate key value violates unique constraint \"users_email_key\"".to_string(),
    }))
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<UserEntity>>,
}

impl InMemoryUserRepository {
    pub fn set_active(&self, id: &Uuid, is_active: bool) {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == *id) {
            user.is_active = is_active;
        }
    }
}

#[async_trait::async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == *id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, error::SystemError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.email == email).cloned())
    }

    async fn find_all(&self) -> Result<Vec<UserEntity>, error::SystemError> {
        Ok(self.users.lock().unwrap().clone())
    }

    async fn create(&self, user: &InsertUser) -> Result<UserEntity, error::SystemError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(email_conflict());
        }

        let now = chrono::Utc::now();
        let entity = UserEntity {
            id: Uuid::now_v7(),
            name: user.name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            is_active: true,
            role: UserRole::User,
            created_at: now,
            updated_at: now,
        };
        users.push(entity.clone());
        Ok(entity)
    }

    async fn update(&self, id: &Uuid, user: &UpdateUser) -> Result<UserEntity, error::SystemError> {
        let mut users = self.users.lock().unwrap();
        if let Some(email) = &user.email {
            if users.iter().any(|u| u.email == *email && u.id != *id) {
                return Err(email_conflict());
            }
        }

        let entity = users
            .iter_mut()
            .find(|u| u.id == *id)
            .ok_or_else(|| error::SystemError::not_found("User not found"))?;

        if let Some(name) = &user.name {
            entity.name = name.clone();
        }
        if let Some(last_name) = &user.last_name {
            entity.last_name = last_name.clone();
        }
        if let Some(email) = &user.email {
            entity.email = email.clone();
        }
        if let Some(password_hash) = &user.password_hash {
            entity.password_hash = password_hash.clone();
        }
        entity.updated_at = chrono::Utc::now();
        Ok(entity.clone())
    }
}

#[derive(Default)]
pub struct InMemoryImageRepository {
    images: Mutex<Vec<ImageEntity>>,
}

impl InMemoryImageRepository {
    /// Stores a record as-is, bypassing `create`.
    pub fn insert(&self, image: ImageEntity) -> Uuid {
        let id = image.id;
        self.images.lock().unwrap().push(image);
        id
    }

    pub fn is_empty(&self) -> bool {
        self.images.lock().unwrap().is_empty()
    }
}

#[async_trait::async_trait]
impl ImageRepository for InMemoryImageRepository {
    async fn create(&self, image: &NewImage) -> Result<ImageEntity, error::SystemError> {
        let now = chrono::Utc::now();
        let entity = ImageEntity {
            id: Uuid::now_v7(),
            user_id: image.user_id,
            original_filename: image.original_filename.clone(),
            original_path: image.original_path.clone(),
            processed_path: image.processed_path.clone(),
            filter_name: None,
            filter_value: None,
            transformations: Vec::new(),
            uploaded_at: now,
            updated_at: now,
        };
        self.images.lock().unwrap().push(entity.clone());
        Ok(entity)
    }

    async fn find_by_id(&self, image_id: &Uuid) -> Result<Option<ImageEntity>, error::SystemError> {
        Ok(self.images.lock().unwrap().iter().find(|i| i.id == *image_id).cloned())
    }

    async fn find_by_user(&self, user_id: &Uuid) -> Result<Vec<ImageEntity>, error::SystemError> {
        Ok(self.images.lock().unwrap().iter().filter(|i| i.user_id == *user_id).cloned().collect())
    }

    async fn update_filter_name(
        &self,
        image_id: &Uuid,
        filter_name: &str,
    ) -> Result<ImageEntity, error::SystemError> {
        let mut images = self.images.lock().unwrap();
        let image = images
            .iter_mut()
            .find(|i| i.id == *image_id)
            .ok_or_else(|| error::SystemError::not_found("Image not found"))?;
        image.filter_name = Some(filter_name.to_string());
        image.updated_at = chrono::Utc::now();
        Ok(image.clone())
    }

    async fn delete(&self, image_id: &Uuid) -> Result<bool, error::SystemError> {
        let mut images = self.images.lock().unwrap();
        let before = images.len();
        images.retain(|i| i.id != *image_id);
        Ok(images.len() < before)
    }

    async fn find_legacy(&self) -> Result<Vec<ImageEntity>, error::SystemError> {
        Ok(self
            .images
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.has_legacy_transformations())
            .cloned()
            .collect())
    }

    async fn replace_legacy(
        &self,
        image_id: &Uuid,
        filter_name: Option<&str>,
        filter_value: Option<&str>,
    ) -> Result<(), error::SystemError> {
        let mut images = self.images.lock().unwrap();
        if let Some(image) = images.iter_mut().find(|i| i.id == *image_id) {
            image.filter_name = filter_name.map(str::to_string);
            image.filter_value = filter_value.map(str::to_string);
            image.transformations.clear();
            image.updated_at = chrono::Utc::now();
        }
        Ok(())
    }
}

pub fn user_service() -> UserService {
    UserService::with_dependencies(Arc::new(InMemoryUserRepository::default()), TEST_SECRET, 3600)
}

pub fn upload_config(dir: &Path) -> UploadConfig {
    UploadConfig::with_upload_dir(&dir.to_string_lossy())
}

pub fn sample_user(email: &str) -> UserEntity {
    let now = chrono::Utc::now();
    UserEntity {
        id: Uuid::now_v7(),
        name: "Test".to_string(),
        last_name: "User".to_string(),
        email: email.to_string(),
        password_hash: String::new(),
        is_active: true,
        role: UserRole::User,
        created_at: now,
        updated_at: now,
    }
}

/// A record written before filters were stored as discrete fields.
pub fn legacy_image(user_id: Uuid, transformations: &[&str]) -> ImageEntity {
    let now = chrono::Utc::now();
    let id = Uuid::now_v7();
    ImageEntity {
        id,
        user_id,
        original_filename: "legacy.png".to_string(),
        original_path: format!("uploads/original/{id}.png"),
        processed_path: format!("uploads/processed/processed_{id}.png"),
        filter_name: None,
        filter_value: None,
        transformations: transformations.iter().map(|t| t.to_string()).collect(),
        uploaded_at: now,
        updated_at: now,
    }
}

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width.max(1)) as u8, (y * 255 / height.max(1)) as u8, 128])
    })
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(DynamicImage::ImageRgb8(gradient(width, height)), ImageFormat::Png)
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(DynamicImage::ImageRgb8(gradient(width, height)), ImageFormat::Jpeg)
}

/// A 4x4 PNG filled with a single color.
pub fn solid_png(color: [u8; 3]) -> Vec<u8> {
    encode(DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb(color))), ImageFormat::Png)
}
