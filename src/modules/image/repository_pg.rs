use uuid::Uuid;

use crate::{
    api::error,
    modules::image::{model::NewImage, repository::ImageRepository, schema::ImageEntity},
};

#[derive(Clone)]
pub struct ImageRepositoryPg {
    pool: sqlx::PgPool,
}

impl ImageRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ImageRepository for ImageRepositoryPg {
    async fn create(&self, image: &NewImage) -> Result<ImageEntity, error::SystemError> {
        let id = Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext));
        let entity = sqlx::query_as::<_, ImageEntity>(
            r#"
            INSERT INTO images (id, user_id, original_filename, original_path, processed_path)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(image.user_id)
        .bind(&image.original_filename)
        .bind(&image.original_path)
        .bind(&image.processed_path)
        .fetch_one(&self.pool)
        .await?;

        Ok(entity)
    }

    async fn find_by_id(&self, image_id: &Uuid) -> Result<Option<ImageEntity>, error::SystemError> {
        let image = sqlx::query_as::<_, ImageEntity>("SELECT * FROM images WHERE id = $1")
            .bind(image_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(image)
    }

    async fn find_by_user(&self, user_id: &Uuid) -> Result<Vec<ImageEntity>, error::SystemError> {
        let images = sqlx::query_as::<_, ImageEntity>(
            "SELECT * FROM images WHERE user_id = $1 ORDER BY uploaded_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(images)
    }

    async fn update_filter_name(
        &self,
        image_id: &Uuid,
        filter_name: &str,
    ) -> Result<ImageEntity, error::SystemError> {
        let image = sqlx::query_as::<_, ImageEntity>(
            r#"
            UPDATE images
            SET filter_name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(image_id)
        .bind(filter_name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| error::SystemError::not_found("Image not found"))?;

        Ok(image)
    }

    async fn delete(&self, image_id: &Uuid) -> Result<bool, error::SystemError> {
        let rows = sqlx::query("DELETE FROM images WHERE id = $1")
            .bind(image_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows > 0)
    }

    async fn find_legacy(&self) -> Result<Vec<ImageEntity>, error::SystemError> {
        let images = sqlx::query_as::<_, ImageEntity>(
            r#"
            SELECT * FROM images
            WHERE filter_name IS NULL AND cardinality(transformations) > 0
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(images)
    }

    async fn replace_legacy(
        &self,
        image_id: &Uuid,
        filter_name: Option<&str>,
        filter_value: Option<&str>,
    ) -> Result<(), error::SystemError> {
        sqlx::query(
            r#"
            UPDATE images
            SET filter_name = $2, filter_value = $3, transformations = '{}'
            WHERE id = $1
            "#,
        )
        .bind(image_id)
        .bind(filter_name)
        .bind(filter_value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
