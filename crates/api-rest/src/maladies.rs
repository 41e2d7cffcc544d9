//! `/maladies` endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use utoipa::IntoParams;

use api_shared::{ImageInfoDto, MaladieDto, MaladieStats, PatientDto};

use crate::{api_error, not_found, ApiError, AppState, JsonBody};

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route("/maladies", get(list_maladies).post(create_maladie))
        .route("/maladies/stats", get(maladie_stats))
        .route(
            "/maladies/:id",
            get(get_maladie)
                .put(update_maladie)
                .patch(patch_maladie)
                .delete(delete_maladie),
        )
        .route("/maladies/:id/patients", get(maladie_patients))
        .route("/maladies/:id/images", get(maladie_images))
        // Shares the `:id` segment with the routes above; it carries a name here.
        .route("/maladies/:id/maladies", get(maladie_by_name))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct MaladieQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
    nom: Option<String>,
}

#[utoipa::path(
    get,
    path = "/maladies",
    params(MaladieQuery),
    responses((status = 200, description = "Maladies matching the query", body = [MaladieDto]))
)]
/// List maladies, optionally narrowed by type and/or name
///
/// With both `type` and `nom` the result holds at most one maladie matching
/// both. With only `nom` it holds at most the first maladie of that name.
#[axum::debug_handler]
pub(crate) async fn list_maladies(
    State(state): State<AppState>,
    Query(query): Query<MaladieQuery>,
) -> Result<Json<Vec<MaladieDto>>, ApiError> {
    let svc = &state.maladies;
    let result = match (query.kind.as_deref(), query.nom.as_deref()) {
        (Some(kind), Some(nom)) => svc
            .get_maladie_by_type_and_name(kind, nom)
            .await
            .map(|m| m.into_iter().collect()),
        (Some(kind), None) => svc.get_maladies_by_type(kind).await,
        (None, Some(nom)) => svc
            .get_maladie_by_name(nom)
            .await
            .map(|m| m.into_iter().collect()),
        (None, None) => svc.get_all_maladies().await,
    };

    result.map(Json).map_err(|e| api_error("List maladies", e))
}

#[utoipa::path(
    post,
    path = "/maladies",
    request_body = MaladieDto,
    responses(
        (status = 201, description = "Maladie created", body = MaladieDto),
        (status = 400, description = "Invalid body")
    )
)]
/// Create a maladie; any `id` in the body is ignored
#[axum::debug_handler]
pub(crate) async fn create_maladie(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<MaladieDto>,
) -> Result<(StatusCode, Json<MaladieDto>), ApiError> {
    match state.maladies.create_maladie(&req).await {
        Ok(created) => Ok((StatusCode::CREATED, Json(created))),
        Err(e) => Err(api_error("Create maladie", e)),
    }
}

#[utoipa::path(
    get,
    path = "/maladies/{id}",
    params(("id" = i64, Path, description = "Maladie id")),
    responses(
        (status = 200, description = "Maladie", body = MaladieDto),
        (status = 404, description = "Maladie not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_maladie(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MaladieDto>, ApiError> {
    match state.maladies.get_maladie_by_id(id).await {
        Ok(Some(maladie)) => Ok(Json(maladie)),
        Ok(None) => Err(not_found("Maladie")),
        Err(e) => Err(api_error("Get maladie", e)),
    }
}

#[utoipa::path(
    put,
    path = "/maladies/{id}",
    params(("id" = i64, Path, description = "Maladie id")),
    request_body = MaladieDto,
    responses(
        (status = 200, description = "Maladie replaced", body = MaladieDto),
        (status = 400, description = "Invalid body"),
        (status = 404, description = "Maladie not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn update_maladie(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(req): JsonBody<MaladieDto>,
) -> Result<Json<MaladieDto>, ApiError> {
    match state.maladies.update_maladie(id, &req).await {
        Ok(Some(maladie)) => Ok(Json(maladie)),
        Ok(None) => Err(not_found("Maladie")),
        Err(e) => Err(api_error("Update maladie", e)),
    }
}

#[utoipa::path(
    patch,
    path = "/maladies/{id}",
    params(("id" = i64, Path, description = "Maladie id")),
    request_body = Object,
    responses(
        (status = 200, description = "Maladie updated", body = MaladieDto),
        (status = 400, description = "Invalid value"),
        (status = 404, description = "Maladie not found")
    )
)]
/// Update `nom`, `type`, `symptomes` or `traitements` of a maladie
#[axum::debug_handler]
pub(crate) async fn patch_maladie(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(updates): JsonBody<Map<String, Value>>,
) -> Result<Json<MaladieDto>, ApiError> {
    match state.maladies.patch_maladie(id, &updates).await {
        Ok(Some(maladie)) => Ok(Json(maladie)),
        Ok(None) => Err(not_found("Maladie")),
        Err(e) => Err(api_error("Patch maladie", e)),
    }
}

#[utoipa::path(
    delete,
    path = "/maladies/{id}",
    params(("id" = i64, Path, description = "Maladie id")),
    responses(
        (status = 204, description = "Maladie deleted with its images"),
        (status = 404, description = "Maladie not found")
    )
)]
/// Delete a maladie
///
/// Linked patients are kept and lose the link; the maladie's images are
/// deleted.
#[axum::debug_handler]
pub(crate) async fn delete_maladie(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .maladies
        .delete_maladie(id)
        .await
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(|e| api_error("Delete maladie", e))
}

#[utoipa::path(
    get,
    path = "/maladies/{id}/patients",
    params(("id" = i64, Path, description = "Maladie id")),
    responses(
        (status = 200, description = "Patients of the maladie, without nested maladies", body = [PatientDto]),
        (status = 404, description = "Maladie not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn maladie_patients(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<PatientDto>>, ApiError> {
    match state.maladies.get_patients_by_maladie_id(id).await {
        Ok(Some(list)) => Ok(Json(list)),
        Ok(None) => Err(not_found("Maladie")),
        Err(e) => Err(api_error("Maladie patients", e)),
    }
}

#[utoipa::path(
    get,
    path = "/maladies/{id}/images",
    params(("id" = i64, Path, description = "Maladie id")),
    responses(
        (status = 200, description = "Image metadata", body = [ImageInfoDto]),
        (status = 404, description = "Maladie not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn maladie_images(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<ImageInfoDto>>, ApiError> {
    match state.images.list_images_for_maladie(id).await {
        Ok(Some(list)) => Ok(Json(list)),
        Ok(None) => Err(not_found("Maladie")),
        Err(e) => Err(api_error("Maladie images", e)),
    }
}

#[utoipa::path(
    get,
    path = "/maladies/{name}/maladies",
    params(("name" = String, Path, description = "Exact maladie name")),
    responses(
        (status = 200, description = "First maladie with this name", body = MaladieDto),
        (status = 404, description = "No maladie with this name")
    )
)]
#[axum::debug_handler]
pub(crate) async fn maladie_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<MaladieDto>, ApiError> {
    match state.maladies.get_maladie_by_name(&name).await {
        Ok(Some(maladie)) => Ok(Json(maladie)),
        Ok(None) => Err(not_found("Maladie")),
        Err(e) => Err(api_error("Maladie by name", e)),
    }
}

#[utoipa::path(
    get,
    path = "/maladies/stats",
    responses((status = 200, description = "Maladie statistics", body = MaladieStats))
)]
#[axum::debug_handler]
pub(crate) async fn maladie_stats(
    State(state): State<AppState>,
) -> Result<Json<MaladieStats>, ApiError> {
    state
        .maladies
        .get_maladies_stats()
        .await
        .map(Json)
        .map_err(|e| api_error("Maladie stats", e))
}
