use actix_web::{web, FromRequest};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, SaltString},
    Argon2, PasswordVerifier,
};
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{api::error, modules::user::schema::UserRole};

lazy_static::lazy_static! {
  static ref ARGON2: Argon2<'static> = Argon2::default();
}

pub fn hash_password(password: &str) -> Result<String, error::SystemError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = ARGON2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Returns `false` for a wrong password and for a hash that cannot be parsed.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed_hash) => ARGON2.verify_password(password.as_bytes(), &parsed_hash).is_ok(),
        Err(_) => false,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: uuid::Uuid,
    pub email: String,
    pub role: UserRole,
    pub iat: u64,
    pub exp: u64,
}

impl Claims {
    pub fn new(sub: &uuid::Uuid, email: &str, role: &UserRole, ttl: u64) -> Self {
        let now = chrono::Utc::now().timestamp() as u64;
        Claims { sub: *sub, email: email.to_string(), role: role.clone(), iat: now, exp: now + ttl }
    }

    pub fn encode(&self, secret: &[u8]) -> Result<String, error::SystemError> {
        let header = Header::new(Algorithm::HS256);
        let token = encode(&header, self, &EncodingKey::from_secret(secret))?;
        Ok(token)
    }

    pub fn decode(token: &str, secret: &[u8]) -> Result<Self, error::SystemError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.leeway = 0;
        let token_data = decode::<Self>(token, &DecodingKey::from_secret(secret), &validation)?;
        Ok(token_data.claims)
    }
}

pub struct ValidatedJson<T>(pub T);

impl<T> FromRequest for ValidatedJson<T>
where
    T: Validate + serde::de::DeserializeOwned + 'static,
{
    type Error = error::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        let fut = web::Json::<T>::from_request(req, payload);

        Box::pin(async move {
            let json = fut.await.map_err(|e| error::Error::unprocessable(e.to_string()))?;
            let model = json.into_inner();
            model.validate().map_err(|e| error::Error::unprocessable(e.to_string()))?;
            Ok(ValidatedJson(model))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const SECRET: &[u8] = b"test-secret";

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("hunter22").unwrap();
        assert_ne!(hash, "hunter22");
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
    }

    #[test]
    fn test_hash_is_salted() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_malformed_hash_returns_false() {
        assert!(!verify_password("anything", "not-a-phc-string"));
        assert!(!verify_password("anything", ""));
    }

    #[test]
    fn test_token_roundtrip_keeps_claims() {
        let id = Uuid::now_v7();
        let token = Claims::new(&id, "ana@example.com", &UserRole::User, 60).encode(SECRET).unwrap();
        let claims = Claims::decode(&token, SECRET).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.email, "ana@example.com");
        assert_eq!(claims.role, UserRole::User);
        assert_eq!(claims.exp - claims.iat, 60);
    }

    #[test]
    fn test_token_with_wrong_secret_rejected() {
        let token = Claims::new(&Uuid::now_v7(), "ana@example.com", &UserRole::User, 60)
            .encode(SECRET)
            .unwrap();
        assert!(Claims::decode(&token, b"other-secret").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let mut claims = Claims::new(&Uuid::now_v7(), "ana@example.com", &UserRole::User, 60);
        claims.iat -= 120;
        claims.exp = claims.iat + 60;
        let token = claims.encode(SECRET).unwrap();
        assert!(matches!(Claims::decode(&token, SECRET), Err(error::SystemError::JwtError(_))));
    }

    #[test]
    fn test_malformed_token_rejected() {
        assert!(Claims::decode("not.a.token", SECRET).is_err());
        assert!(Claims::decode("", SECRET).is_err());
    }
}
