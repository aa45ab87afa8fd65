use log::{info, warn};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error;
use crate::modules::user::model::{
    LoginModel, RegisterModel, UpdateMeModel, UpdateUser, UpdateUserModel, UserResponse,
};
use crate::modules::user::schema::UserEntity;
use crate::modules::user::{model::InsertUser, repository::UserRepository};
use crate::utils::{hash_password, verify_password, Claims};

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository + Send + Sync>,
    jwt_secret: Arc<str>,
    token_ttl: u64,
}

impl UserService {
    pub fn with_dependencies(
        repo: Arc<dyn UserRepository + Send + Sync>,
        jwt_secret: &str,
        token_ttl: u64,
    ) -> Self {
        info!("UserService initialized with dependencies");
        UserService { repo, jwt_secret: Arc::from(jwt_secret), token_ttl }
    }

    /// Token lifetime in seconds.
    pub fn token_ttl(&self) -> u64 {
        self.token_ttl
    }

    pub async fn register(&self, user: RegisterModel) -> Result<UserResponse, error::SystemError> {
        let password_hash = hash_password(&user.password)?;

        let new_user = InsertUser {
            name: user.name,
            last_name: user.last_name,
            email: user.email,
            password_hash,
        };

        let entity = self.repo.create(&new_user).await?;
        info!("User registered: {}", entity.email);
        Ok(UserResponse::from(entity))
    }

    pub async fn login(
        &self,
        user: LoginModel,
    ) -> Result<(String, UserResponse), error::SystemError> {
        let user_entity = self
            .repo
            .find_by_email(&user.email)
            .await?
            .ok_or_else(|| error::SystemError::unauthorized("Incorrect email or password"))?;

        if !verify_password(&user.password, &user_entity.password_hash) {
            warn!("Failed login attempt for {}", user.email);
            return Err(error::SystemError::unauthorized("Incorrect email or password"));
        }

        if !user_entity.is_active {
            return Err(error::SystemError::unauthorized("Inactive user"));
        }

        let access_token =
            Claims::new(&user_entity.id, &user_entity.email, &user_entity.role, self.token_ttl)
                .encode(self.jwt_secret.as_bytes())?;

        info!("User logged in: {}", user_entity.email);
        Ok((access_token, UserResponse::from(user_entity)))
    }

    /// Resolves a bearer token to an existing, active user.
    pub async fn authenticate(&self, token: &str) -> Result<UserEntity, error::SystemError> {
        let claims = Claims::decode(token, self.jwt_secret.as_bytes())
            .map_err(|_| error::SystemError::unauthorized("Could not validate credentials"))?;

        let user = self
            .repo
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| error::SystemError::unauthorized("Could not validate credentials"))?;

        if !user.is_active {
            return Err(error::SystemError::unauthorized("Inactive user"));
        }

        Ok(user)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<UserResponse, error::SystemError> {
        self.repo
            .find_by_id(&id)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| error::SystemError::not_found("User not found"))
    }

    pub async fn list(&self) -> Result<Vec<UserResponse>, error::SystemError> {
        let users = self.repo.find_all().await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    pub async fn update_me(
        &self,
        id: Uuid,
        user: UpdateMeModel,
    ) -> Result<UserResponse, error::SystemError> {
        let update_user = UpdateUser {
            name: user.name,
            last_name: user.last_name,
            email: None,
            password_hash: user.password.as_deref().map(hash_password).transpose()?,
        };
        self.apply_update(id, update_user).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        user: UpdateUserModel,
    ) -> Result<UserResponse, error::SystemError> {
        let update_user = UpdateUser {
            name: user.name,
            last_name: user.last_name,
            email: user.email,
            password_hash: user.password.as_deref().map(hash_password).transpose()?,
        };
        self.apply_update(id, update_user).await
    }

    async fn apply_update(
        &self,
        id: Uuid,
        update_user: UpdateUser,
    ) -> Result<UserResponse, error::SystemError> {
        if update_user.is_empty() {
            return Err(error::SystemError::bad_request("No fields to update"));
        }

        let entity = self.repo.update(&id, &update_user).await?;
        info!("User {} updated", id);
        Ok(UserResponse::from(entity))
    }
}
