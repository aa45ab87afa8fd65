use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header,
    middleware::Next,
    web, Error, HttpMessage, HttpRequest,
};

use crate::{api::error, constants::ACCESS_TOKEN_COOKIE, modules::user::service::UserService};

/// Token from `Authorization: Bearer <token>`, falling back to the login cookie.
fn extract_token(req: &ServiceRequest) -> Option<String> {
    let from_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| {
            let (scheme, token) = h.split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then(|| token.trim().to_string())
        });

    from_header.or_else(|| req.cookie(ACCESS_TOKEN_COOKIE).map(|c| c.value().to_string()))
}

pub async fn authentication<B>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<B>, Error>
where
    B: MessageBody + 'static,
{
    let token = extract_token(&req)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| error::Error::unauthorized("Could not validate credentials"))?;

    let user_service = req
        .app_data::<web::Data<UserService>>()
        .cloned()
        .ok_or(error::Error::InternalServer)?;

    let user = user_service.authenticate(&token).await.map_err(error::Error::from)?;

    req.extensions_mut().insert(user);

    next.call(req).await
}

pub fn get_extensions<T>(req: &HttpRequest) -> Result<T, error::Error>
where
    T: Clone + 'static,
{
    let extensions = req.extensions();

    let value = extensions
        .get::<T>()
        .ok_or_else(|| error::Error::unauthorized("Unauthorized"))?
        .clone();

    Ok(value)
}
