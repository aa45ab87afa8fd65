use uuid::Uuid;

use crate::{
    api::error,
    modules::image::{model::NewImage, schema::ImageEntity},
};

#[async_trait::async_trait]
pub trait ImageRepository {
    async fn create(&self, image: &NewImage) -> Result<ImageEntity, error::SystemError>;

    async fn find_by_id(&self, image_id: &Uuid) -> Result<Option<ImageEntity>, error::SystemError>;

    async fn find_by_user(&self, user_id: &Uuid) -> Result<Vec<ImageEntity>, error::SystemError>;

    /// Records the active filter. `filter_value` is left untouched.
    async fn update_filter_name(
        &self,
        image_id: &Uuid,
        filter_name: &str,
    ) -> Result<ImageEntity, error::SystemError>;

    async fn delete(&self, image_id: &Uuid) -> Result<bool, error::SystemError>;

    /// Records that still carry a `transformations` list and no discrete filter fields.
    async fn find_legacy(&self) -> Result<Vec<ImageEntity>, error::SystemError>;

    /// Writes the discrete filter fields and clears `transformations`.
    async fn replace_legacy(
        &self,
        image_id: &Uuid,
        filter_name: Option<&str>,
        filter_value: Option<&str>,
    ) -> Result<(), error::SystemError>;
}
