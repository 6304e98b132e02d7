use axum::Json;
use axum::extract::multipart::{Field, MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use super::AppState;
use super::error::ApiError;

/// Name of the multipart part carrying the file
const FILE_FIELD: &str = "file";

/// Errors that can occur while saving an upload
#[derive(Debug, Error)]
pub enum UploadError {
  #[error("malformed upload: {0}")]
  Multipart(#[from] MultipartError),

  #[error("error when saving file: {0}")]
  Io(#[from] std::io::Error),

  #[error("invalid file name '{0}'")]
  InvalidFilename(String),

  #[error("file name '{0}' is reserved")]
  ReservedFilename(String),
}

/// Destination of uploaded files and the names saved so far
pub struct Uploads {
  dir: PathBuf,
  /// Files an upload must never overwrite, such as the item store
  reserved: Vec<PathBuf>,
  saved: Mutex<Vec<String>>,
}

impl Uploads {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self {
      dir: dir.into(),
      reserved: Vec::new(),
      saved: Mutex::new(Vec::new()),
    }
  }

  /// Refuse uploads that would land on `path`
  pub fn reserve(mut self, path: impl AsRef<Path>) -> Self {
    self.reserved.push(normalize(path.as_ref()));
    self
  }

  fn is_reserved(&self, path: &Path) -> bool {
    let path = normalize(path);
    self.reserved.iter().any(|reserved| *reserved == path)
  }

  /// Names of files saved during this process lifetime
  pub fn saved(&self) -> Vec<String> {
    match self.saved.lock() {
      Ok(saved) => saved.clone(),
      Err(poisoned) => poisoned.into_inner().clone(),
    }
  }

  fn record(&self, name: String) {
    match self.saved.lock() {
      Ok(mut saved) => saved.push(name),
      Err(poisoned) => poisoned.into_inner().push(name),
    }
  }

  /// Stream `field` into the upload directory under `client_name`
  async fn save(&self, client_name: &str, field: Field<'_>) -> Result<String, UploadError> {
    let name = sanitize_filename(client_name)?;
    let path = self.dir.join(&name);
    if self.is_reserved(&path) {
      return Err(UploadError::ReservedFilename(name));
    }

    if let Err(e) = write_field(&path, field).await {
      // Best effort, the partial file is useless either way
      let _ = tokio::fs::remove_file(&path).await;
      return Err(e);
    }

    self.record(name.clone());
    Ok(name)
  }
}

/// Keep only the final component of a client supplied name
fn sanitize_filename(client_name: &str) -> Result<String, UploadError> {
  Path::new(client_name)
    .file_name()
    .and_then(|name| name.to_str())
    .map(str::to_string)
    .ok_or_else(|| UploadError::InvalidFilename(client_name.to_string()))
}

/// Resolve the parent directory so differently spelled paths compare equal
fn normalize(path: &Path) -> PathBuf {
  let parent = path
    .parent()
    .filter(|parent| !parent.as_os_str().is_empty())
    .unwrap_or_else(|| Path::new("."));
  match (std::fs::canonicalize(parent), path.file_name()) {
    (Ok(dir), Some(name)) => dir.join(name),
    _ => path.to_path_buf(),
  }
}

async fn write_field(path: &Path, mut field: Field<'_>) -> Result<(), UploadError> {
  let mut file = tokio::fs::File::create(path).await?;
  while let Some(chunk) = field.chunk().await? {
    file.write_all(&chunk).await?;
  }
  file.flush().await?;
  Ok(())
}

/// POST /upload
pub async fn upload_file(
  State(state): State<AppState>,
  multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ApiError> {
  let no_file = Json(json!({ "message": "No file upload" }));

  let Ok(mut multipart) = multipart else {
    return Ok(no_file);
  };

  while let Some(field) = multipart.next_field().await.map_err(UploadError::from)? {
    if field.name() != Some(FILE_FIELD) {
      continue;
    }
    let client_name = field.file_name().unwrap_or_default().to_string();

    return match state.uploads.save(&client_name, field).await {
      Ok(name) => {
        info!(
          "Saved upload {} ({} this session)",
          name,
          state.uploads.saved().len()
        );
        Ok(Json(json!({ "Result": "OK" })))
      }
      Err(e) => {
        warn!("Failed to save upload '{}': {}", client_name, e);
        Err(e.into())
      }
    };
  }

  Ok(no_file)
}
