use actix_multipart::Multipart;
use actix_web::{
    http::header::{ContentDisposition, DispositionParam, DispositionType},
    web, HttpRequest, HttpResponse,
};
use futures_util::TryStreamExt;
use uuid::Uuid;

use crate::api::{error, success};
use crate::middlewares::get_extensions;
use crate::modules::image::{model, repository::ImageRepository, service::ImageService};
use crate::modules::user::schema::UserEntity;
use crate::utils::ValidatedJson;

/// Takes the first multipart field that carries a filename. Reading stops one byte past
/// the size limit so the service can reject it without buffering the whole body.
pub async fn upload_image<R>(
    mut payload: Multipart,
    req: HttpRequest,
    image_service: web::Data<ImageService<R>>,
) -> Result<success::Success<model::UploadResponse>, error::Error>
where
    R: ImageRepository + Send + Sync + 'static,
{
    let owner = get_extensions::<UserEntity>(&req)?;
    let limit = image_service.max_file_size();

    while let Some(mut field) =
        payload.try_next().await.map_err(|e| error::Error::bad_request(e.to_string()))?
    {
        let Some(filename) =
            field.content_disposition().and_then(|cd| cd.get_filename()).map(str::to_string)
        else {
            continue;
        };

        let mut bytes = Vec::new();
        while let Some(chunk) =
            field.try_next().await.map_err(|e| error::Error::bad_request(e.to_string()))?
        {
            bytes.extend_from_slice(&chunk);
            if bytes.len() > limit {
                break;
            }
        }

        let result = image_service.upload(&owner, filename, bytes).await?;
        return Ok(success::Success::created(Some(result)).message("Image uploaded successfully"));
    }

    Err(error::Error::bad_request("No file found in request"))
}

pub async fn process_image<R>(
    image_id: web::Path<Uuid>,
    req: HttpRequest,
    image_service: web::Data<ImageService<R>>,
    body: ValidatedJson<model::ProcessRequest>,
) -> Result<success::Success<model::ProcessResponse>, error::Error>
where
    R: ImageRepository + Send + Sync + 'static,
{
    let owner = get_extensions::<UserEntity>(&req)?;
    let result = image_service.apply_filter(&image_id, &owner, &body.0.filter_name).await?;
    Ok(success::Success::ok(Some(result)).message("Filter applied successfully"))
}

pub async fn list_images<R>(
    req: HttpRequest,
    image_service: web::Data<ImageService<R>>,
) -> Result<success::Success<Vec<model::ImageSummary>>, error::Error>
where
    R: ImageRepository + Send + Sync + 'static,
{
    let owner = get_extensions::<UserEntity>(&req)?;
    let images = image_service.list(&owner).await?;
    Ok(success::Success::ok(Some(images)).message("Images retrieved successfully"))
}

pub async fn delete_image<R>(
    image_id: web::Path<Uuid>,
    req: HttpRequest,
    image_service: web::Data<ImageService<R>>,
) -> Result<success::Success<()>, error::Error>
where
    R: ImageRepository + Send + Sync + 'static,
{
    let owner = get_extensions::<UserEntity>(&req)?;
    image_service.delete(&image_id, &owner).await?;
    Ok(success::Success::ok(None).message("Image deleted successfully"))
}

pub async fn serve_image<R>(
    image_id: web::Path<Uuid>,
    req: HttpRequest,
    image_service: web::Data<ImageService<R>>,
) -> Result<success::Success<model::ServeResponse>, error::Error>
where
    R: ImageRepository + Send + Sync + 'static,
{
    let owner = get_extensions::<UserEntity>(&req)?;
    let served = image_service.serve(&image_id, &owner).await?;
    Ok(success::Success::ok(Some(served)))
}

pub async fn get_image_file<R>(
    image_id: web::Path<Uuid>,
    req: HttpRequest,
    image_service: web::Data<ImageService<R>>,
) -> Result<HttpResponse, error::Error>
where
    R: ImageRepository + Send + Sync + 'static,
{
    let owner = get_extensions::<UserEntity>(&req)?;
    let file = image_service.fetch(&image_id, &owner).await?;

    Ok(HttpResponse::Ok()
        .content_type(file.mime_type)
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(file.filename)],
        })
        .body(file.bytes))
}
