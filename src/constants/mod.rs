use crate::api::error::SystemError;

pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];
pub const DEFAULT_MAX_FILE_SIZE: usize = 5 * 1024 * 1024; // 5MB
pub const DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES: u64 = 1440; // 24 hours
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Process configuration, read once at startup and handed to every component that needs it.
#[derive(Debug, Clone)]
pub struct Env {
    pub jwt_secret: String,
    pub access_token_expiration: u64,
    pub database_url: String,
    pub frontend_url: String,
    pub ip: String,
    pub port: u16,
    pub upload_dir: String,
    pub max_file_size: usize,
    pub allowed_extensions: Vec<String>,
}

impl Env {
    pub fn from_env() -> Result<Self, SystemError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, SystemError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key).filter(|v| !v.is_empty()).ok_or_else(|| {
                SystemError::config(format!("{key} must be set in .env file or environment variable"))
            })
        };

        let jwt_secret = required("SECRET_KEY")?;
        let database_url = required("DATABASE_URL")?;

        let access_token_minutes = parse_or(
            &lookup,
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES,
        )?;
        let max_file_size = parse_or(&lookup, "MAX_FILE_SIZE", DEFAULT_MAX_FILE_SIZE)?;
        let port = parse_or(&lookup, "PORT", 8080u16)?;

        let frontend_url =
            lookup("FRONTEND_URL").unwrap_or_else(|| "http://localhost:5173".to_string());
        let ip = lookup("IP").unwrap_or_else(|| "127.0.0.1".to_string());
        let upload_dir = lookup("UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string());

        let allowed_extensions = match lookup("ALLOWED_EXTENSIONS") {
            Some(raw) => raw
                .split(',')
                .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
            None => DEFAULT_ALLOWED_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
        };

        Ok(Env {
            jwt_secret,
            access_token_expiration: access_token_minutes * 60,
            database_url,
            frontend_url,
            ip,
            port,
            upload_dir,
            max_file_size,
            allowed_extensions,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, SystemError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| SystemError::config(format!("{key} must be a valid number"))),
        None => Ok(default),
    }
}
