//! Local file storage for image bytes.
//!
//! Every path handed out or accepted here is normalized to forward slashes. Records keep
//! these strings and later requests compare them against the file system, so the
//! normalization has to be stable across hosts.

use std::io::ErrorKind;
use std::path::Path;

use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::api::error::SystemError;

pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let absolute = unified.starts_with('/');

    let mut parts: Vec<&str> = Vec::new();
    for part in unified.split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

pub fn join(dir: &str, file_name: &str) -> String {
    normalize_path(&format!("{dir}/{file_name}"))
}

/// Last path segment.
pub fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Random id plus the extension of the uploaded name.
fn unique_filename(original_filename: &str) -> String {
    let extension =
        Path::new(original_filename).extension().and_then(|ext| ext.to_str()).unwrap_or("");
    let uuid = Uuid::now_v7();
    if extension.is_empty() {
        uuid.to_string()
    } else {
        format!("{}.{}", uuid, extension)
    }
}

fn map_not_found(path: &str, err: std::io::Error) -> SystemError {
    if err.kind() == ErrorKind::NotFound {
        SystemError::not_found(format!("File not found at path: {path}"))
    } else {
        SystemError::Io(err)
    }
}

/// Writes `bytes` under a freshly generated name inside `destination_dir` and returns the
/// normalized path. Never overwrites an existing file.
pub async fn save(
    bytes: &[u8],
    destination_dir: &str,
    original_filename: &str,
) -> Result<String, SystemError> {
    tokio::fs::create_dir_all(destination_dir).await?;

    let file_path = join(destination_dir, &unique_filename(original_filename));
    let mut file =
        tokio::fs::OpenOptions::new().write(true).create_new(true).open(&file_path).await?;
    file.write_all(bytes).await?;
    file.flush().await?;

    Ok(file_path)
}

/// Writes `bytes` to `path`, replacing whatever was there.
pub async fn write(path: &str, bytes: &[u8]) -> Result<(), SystemError> {
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

pub async fn read(path: &str) -> Result<Vec<u8>, SystemError> {
    tokio::fs::read(path).await.map_err(|e| map_not_found(path, e))
}

pub async fn delete(path: &str) -> Result<(), SystemError> {
    tokio::fs::remove_file(path).await.map_err(|e| map_not_found(path, e))
}

pub async fn exists(path: &str) -> bool {
    tokio::fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false)
}
