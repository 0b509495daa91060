//! Reads the uploaded photo out of the form and stores it in the input directory.

use std::path::{Path, PathBuf};

use axum::body::Bytes;
use axum::extract::Multipart;
use tokio::fs;
use tracing::debug;

use crate::error::AppError;

/// A photo received from the upload form.
#[derive(Clone, Debug)]
pub struct UploadedImage {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Pulls the first field named `field_name` out of a multipart submission.
pub async fn read_image_field(
    multipart: &mut Multipart,
    field_name: &str,
) -> Result<UploadedImage, AppError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                return Err(AppError::BadRequest(format!("failed to read form: {err}")));
            }
        };
        if field.name() != Some(field_name) {
            continue;
        }
        let content_type = field.content_type().map(|value| value.to_string());
        let file_name = field.file_name().unwrap_or("").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| AppError::BadRequest(format!("failed to read file: {err}")))?;
        if stored_name(&file_name).is_none() {
            return Err(AppError::BadRequest(format!(
                "field {field_name} has no usable file name"
            )));
        }
        return Ok(UploadedImage {
            file_name,
            content_type,
            bytes,
        });
    }
    Err(AppError::BadRequest(format!("missing file field {field_name}")))
}

/// Final path component of a client-supplied name, so uploads stay inside the input directory.
/// Names ending in a separator carry no file name and are rejected.
fn stored_name(file_name: &str) -> Option<&str> {
    if file_name.ends_with(['/', '\\']) {
        return None;
    }
    Path::new(file_name)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.trim().is_empty())
}

/// Writes the upload unchanged under its original name. A later upload with the
/// same name replaces the earlier file.
pub async fn save_upload(dir: &Path, image: &UploadedImage) -> std::io::Result<PathBuf> {
    let name = stored_name(&image.file_name).ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("unusable upload file name {:?}", image.file_name),
        )
    })?;
    fs::create_dir_all(dir).await?;
    let path = dir.join(name);
    fs::write(&path, &image.bytes).await?;
    debug!("saved upload {} ({} bytes)", path.display(), image.bytes.len());
    Ok(path)
}
