//! `/images` endpoints.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use utoipa::ToSchema;

use hopital_core::{HopitalError, ImageUpload};

use crate::{api_error, ApiError, AppState};

/// Multipart body of `POST /images/upload`.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
pub(crate) struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
    maladie_id: i64,
}

#[utoipa::path(
    post,
    path = "/images/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image stored", body = String, content_type = "text/plain"),
        (status = 417, description = "Upload rejected, with the reason", body = String, content_type = "text/plain")
    )
)]
/// Upload an image and attach it to a maladie
///
/// Every failure, including an unknown maladie or an oversized file, is
/// reported as `417 Expectation Failed` with a readable message.
#[axum::debug_handler]
pub(crate) async fn upload_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<String, ApiError> {
    let (upload, maladie_id) = match read_form(multipart).await {
        Ok(form) => form,
        Err(e) => return Err(upload_failed("", &e.to_string())),
    };
    let file_name = upload.file_name.clone().unwrap_or_default();

    let maladie_id = match maladie_id.as_deref().map(str::trim) {
        Some(raw) => match raw.parse::<i64>() {
            Ok(id) => id,
            Err(_) => {
                return Err(upload_failed(
                    &file_name,
                    &format!("invalid maladieId: {raw}"),
                ))
            }
        },
        None => return Err(upload_failed(&file_name, "maladieId is required")),
    };

    match state.images.store(upload, maladie_id).await {
        Ok(info) => Ok(format!("Image uploaded successfully: {}", info.name)),
        Err(e) => Err(upload_failed(&file_name, &e.to_string())),
    }
}

async fn read_form(
    mut multipart: Multipart,
) -> Result<(ImageUpload, Option<String>), MultipartError> {
    let mut upload = ImageUpload::default();
    let mut maladie_id = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("file") => {
                upload.file_name = field.file_name().map(str::to_string);
                upload.content_type = field.content_type().map(str::to_string);
                upload.data = field.bytes().await?.to_vec();
            }
            Some("maladieId") => maladie_id = Some(field.text().await?),
            _ => {}
        }
    }

    Ok((upload, maladie_id))
}

fn upload_failed(file_name: &str, reason: &str) -> ApiError {
    tracing::error!("Failed to upload image {}: {}", file_name, reason);
    (
        StatusCode::EXPECTATION_FAILED,
        format!("Could not upload the image: {file_name}. Error: {reason}"),
    )
}

#[utoipa::path(
    get,
    path = "/images/{id}",
    params(("id" = i64, Path, description = "Image id")),
    responses(
        (status = 200, description = "Raw image bytes with their stored content type"),
        (status = 404, description = "Image not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_image(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    match state.images.get_image(id).await {
        Ok(Some(image)) => {
            Ok(([(header::CONTENT_TYPE, image.content_type)], image.data).into_response())
        }
        Ok(None) => Err((StatusCode::NOT_FOUND, format!("Image not found with ID: {id}"))),
        Err(e) => Err(api_error("Get image", e)),
    }
}

#[utoipa::path(
    delete,
    path = "/images/{id}",
    params(("id" = i64, Path, description = "Image id")),
    responses(
        (status = 200, description = "Image deleted", body = String, content_type = "text/plain"),
        (status = 404, description = "Image not found", body = String, content_type = "text/plain")
    )
)]
#[axum::debug_handler]
pub(crate) async fn delete_image(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<String, ApiError> {
    match state.images.delete_image(id).await {
        Ok(()) => Ok(format!("Image deleted successfully with ID: {id}")),
        Err(e @ HopitalError::NotFound { .. }) => {
            tracing::error!("Failed to delete image with ID {}: {}", id, e);
            Err((
                StatusCode::NOT_FOUND,
                format!("Could not delete the image with ID: {id}. Error: {e}"),
            ))
        }
        Err(e) => Err(api_error("Delete image", e)),
    }
}
