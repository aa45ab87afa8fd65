use actix_web::{
    cookie::{time, Cookie, SameSite},
    web, HttpRequest,
};
use uuid::Uuid;

use crate::constants::ACCESS_TOKEN_COOKIE;
use crate::middlewares::get_extensions;
use crate::modules::user::schema::UserEntity;
use crate::modules::user::{model, service::UserService};
use crate::{
    api::{error, success},
    utils::ValidatedJson,
};

pub async fn register(
    user_service: web::Data<UserService>,
    user_data: ValidatedJson<model::RegisterModel>,
) -> Result<success::Success<model::UserResponse>, error::Error> {
    let user = user_service.register(user_data.0).await?;
    Ok(success::Success::ok(Some(user)).message("User registered successfully"))
}

pub async fn login(
    user_service: web::Data<UserService>,
    user_data: ValidatedJson<model::LoginModel>,
) -> Result<success::Success<model::LoginResponse>, error::Error> {
    let (access_token, user) = user_service.login(user_data.0).await?;
    let access_cookie = Cookie::build(ACCESS_TOKEN_COOKIE, access_token.clone())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(user_service.token_ttl() as i64))
        .finish();

    let response = model::LoginResponse { access_token, token_type: "bearer", user };
    Ok(success::Success::ok(Some(response))
        .message("Login successful")
        .cookies(vec![access_cookie]))
}

pub async fn update_me(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    user_data: ValidatedJson<model::UpdateMeModel>,
) -> Result<success::Success<model::UserResponse>, error::Error> {
    let id = get_extensions::<UserEntity>(&req)?.id;
    let user = user_service.update_me(id, user_data.0).await?;
    Ok(success::Success::ok(Some(user)).message("Profile updated successfully"))
}

pub async fn get_user(
    user_service: web::Data<UserService>,
    user_id: web::Path<Uuid>,
) -> Result<success::Success<model::UserResponse>, error::Error> {
    let user = user_service.get_by_id(user_id.into_inner()).await?;
    Ok(success::Success::ok(Some(user)).message("User retrieved successfully"))
}

pub async fn list_users(
    user_service: web::Data<UserService>,
) -> Result<success::Success<Vec<model::UserResponse>>, error::Error> {
    let users = user_service.list().await?;
    Ok(success::Success::ok(Some(users)).message("Users retrieved successfully"))
}

pub async fn update_user(
    user_service: web::Data<UserService>,
    user_id: web::Path<Uuid>,
    user_data: ValidatedJson<model::UpdateUserModel>,
) -> Result<success::Success<model::UserResponse>, error::Error> {
    let user = user_service.update(user_id.into_inner(), user_data.0).await?;
    Ok(success::Success::ok(Some(user)).message("User updated successfully"))
}
