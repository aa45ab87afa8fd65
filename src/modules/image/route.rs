use actix_web::middleware::from_fn;
use actix_web::web::{self, resource, scope, ServiceConfig};

use crate::middlewares::authentication;
use crate::modules::image::{handle::*, repository::ImageRepository};

pub fn configure<R>(cfg: &mut ServiceConfig)
where
    R: ImageRepository + Send + Sync + 'static,
{
    cfg.service(
        scope("/images")
            .wrap(from_fn(authentication))
            .service(resource("/upload").route(web::post().to(upload_image::<R>)))
            .service(resource("/").route(web::get().to(list_images::<R>)))
            .service(resource("/{image_id}").route(web::delete().to(delete_image::<R>)))
            .service(resource("/{image_id}/process").route(web::post().to(process_image::<R>)))
            .service(resource("/{image_id}/serve").route(web::get().to(serve_image::<R>)))
            .service(resource("/{image_id}/file").route(web::get().to(get_image_file::<R>))),
    );
}
