use crate::middlewares::authentication;
use crate::modules::user::handle::*;
use actix_web::middleware::from_fn;
use actix_web::web::{self, resource, scope, ServiceConfig};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/auth")
            .service(resource("/register").route(web::post().to(register)))
            .service(resource("/login").route(web::post().to(login)))
            .service(
                resource("/update-me")
                    .route(web::put().to(update_me))
                    .wrap(from_fn(authentication)),
            ),
    )
    .service(
        scope("/users")
            .service(resource("/").route(web::get().to(list_users)).wrap(from_fn(authentication)))
            .service(
                resource("/{id}")
                    .route(web::get().to(get_user))
                    .route(web::put().to(update_user)),
            ),
    );
}
