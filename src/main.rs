use actix_cors::Cors;
use actix_web::{self, http::header, middleware::Logger, web, App, HttpResponse, HttpServer};
use std::sync::Arc;

use crate::modules::{
    image::{model::UploadConfig, repository_pg::ImageRepositoryPg, service::ImageService},
    user::{repository_pg::UserRepositoryPg, service::UserService},
};

mod api;
mod configs;
mod constants;
mod middlewares;
mod modules;
#[cfg(test)]
mod test;
mod utils;

#[actix_web::get("/")]
async fn root() -> &'static str {
    "Image filter API is running"
}

#[actix_web::get("/health")]
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let env = constants::Env::from_env().map_err(|e| std::io::Error::other(e.to_string()))?;
    log::info!("Environment loaded");

    let db_pool = configs::connect_database(&env.database_url)
        .await
        .map_err(|e| std::io::Error::other(format!("Database connection error: {e}")))?;

    let user_repo = UserRepositoryPg::new(db_pool.clone());
    let image_repo = ImageRepositoryPg::new(db_pool.clone());

    let user_service = web::Data::new(UserService::with_dependencies(
        Arc::new(user_repo),
        &env.jwt_secret,
        env.access_token_expiration,
    ));
    let image_service =
        web::Data::new(ImageService::new(Arc::new(image_repo), UploadConfig::from(&env)));

    match image_service.migrate_legacy().await {
        Ok(0) => {}
        Ok(count) => log::info!("Legacy migration updated {} image record(s)", count),
        Err(e) => log::error!("Legacy migration failed: {}", e),
    }

    let bind = (env.ip.clone(), env.port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let frontend_url = env.frontend_url.clone();
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&frontend_url)
            .allow_any_method()
            .allow_any_header()
            .expose_headers([header::CONTENT_DISPOSITION])
            .supports_credentials();

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(user_service.clone())
            .app_data(image_service.clone())
            .service(root)
            .service(health_check)
            .configure(modules::user::route::configure)
            .configure(modules::image::route::configure::<ImageRepositoryPg>)
    })
    .bind(bind)?
    .run()
    .await
}
