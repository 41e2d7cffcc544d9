//! `/patients` endpoints.

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

use api_shared::{MaladieDto, PatientCreateUpdateDto, PatientDto, PatientStats, StadePatient};

use crate::{api_error, not_found, ApiError, AppState, JsonBody};

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route("/patients", get(list_patients).post(create_patient))
        .route("/patients/search", get(search_patient))
        .route("/patients/by-name", get(patients_by_name))
        .route("/patients/by-stade", get(patients_by_stade))
        .route("/patients/by-traitement", get(patients_by_traitement))
        .route("/patients/filter", get(filter_patients))
        .route("/patients/stats", get(patient_stats))
        .route(
            "/patients/:id",
            get(get_patient)
                .put(update_patient)
                .patch(patch_patient)
                .delete(delete_patient),
        )
        .route("/patients/:id/maladies", get(patient_maladies))
        .route("/patients/:id/dossier", get(patient_dossier))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct SearchQuery {
    email: Option<String>,
    telephone: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct NomQuery {
    nom: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct StadeQuery {
    stade: StadePatient,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct TraitementQuery {
    traitement: String,
}

/// Every criterion is optional; blank values are ignored.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct FilterQuery {
    nom: Option<String>,
    /// One of `STADE_I`..`STADE_IV`.
    stade: Option<String>,
    traitement: Option<String>,
}

#[utoipa::path(
    get,
    path = "/patients",
    responses(
        (status = 200, description = "List of patients", body = [PatientDto]),
        (status = 500, description = "Internal server error")
    )
)]
/// List all patients with their maladie summaries
#[axum::debug_handler]
pub(crate) async fn list_patients(
    State(state): State<AppState>,
) -> Result<Json<Vec<PatientDto>>, ApiError> {
    state
        .patients
        .get_all_patients()
        .await
        .map(Json)
        .map_err(|e| api_error("List patients", e))
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = PatientCreateUpdateDto,
    responses(
        (status = 201, description = "Patient created", body = PatientDto),
        (status = 400, description = "Invalid body or unknown maladie ids"),
        (status = 409, description = "Email or telephone already used"),
        (status = 500, description = "Internal server error")
    )
)]
/// Create a new patient record
///
/// The patient is linked to every maladie named in `maladieIds`; if any of
/// them does not exist nothing is created.
#[axum::debug_handler]
pub(crate) async fn create_patient(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<PatientCreateUpdateDto>,
) -> Result<(StatusCode, Json<PatientDto>), ApiError> {
    match state.patients.create_patient(&req).await {
        Ok(created) => Ok((StatusCode::CREATED, Json(created))),
        Err(e) => Err(api_error("Create patient", e)),
    }
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    params(("id" = i64, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient", body = PatientDto),
        (status = 404, description = "Patient not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PatientDto>, ApiError> {
    match state.patients.get_patient_by_id(id).await {
        Ok(Some(patient)) => Ok(Json(patient)),
        Ok(None) => Err(not_found("Patient")),
        Err(e) => Err(api_error("Get patient", e)),
    }
}

#[utoipa::path(
    put,
    path = "/patients/{id}",
    params(("id" = i64, Path, description = "Patient id")),
    request_body = PatientCreateUpdateDto,
    responses(
        (status = 200, description = "Patient replaced", body = PatientDto),
        (status = 400, description = "Invalid body or unknown maladie ids"),
        (status = 404, description = "Patient not found"),
        (status = 409, description = "Email or telephone already used")
    )
)]
/// Replace every field, collection and maladie link of a patient
#[axum::debug_handler]
pub(crate) async fn update_patient(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(req): JsonBody<PatientCreateUpdateDto>,
) -> Result<Json<PatientDto>, ApiError> {
    match state.patients.update_patient(id, &req).await {
        Ok(Some(patient)) => Ok(Json(patient)),
        Ok(None) => Err(not_found("Patient")),
        Err(e) => Err(api_error("Update patient", e)),
    }
}

#[utoipa::path(
    patch,
    path = "/patients/{id}",
    params(("id" = i64, Path, description = "Patient id")),
    request_body = Object,
    responses(
        (status = 200, description = "Patient updated", body = PatientDto),
        (status = 400, description = "Invalid value or unknown maladie ids"),
        (status = 404, description = "Patient not found")
    )
)]
/// Update selected fields of a patient
///
/// Accepted keys: `nom`, `prenom`, `email`, `telephone`, `numUrgence`,
/// `groupeSanguin`, `stade`, `symptomesManifester`, `traitementSuivie`,
/// `maladieIds`. Other keys are ignored.
#[axum::debug_handler]
pub(crate) async fn patch_patient(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(updates): JsonBody<Map<String, Value>>,
) -> Result<Json<PatientDto>, ApiError> {
    match state.patients.partial_update_patient(id, &updates).await {
        Ok(Some(patient)) => Ok(Json(patient)),
        Ok(None) => Err(not_found("Patient")),
        Err(e) => Err(api_error("Patch patient", e)),
    }
}

#[utoipa::path(
    delete,
    path = "/patients/{id}",
    params(("id" = i64, Path, description = "Patient id")),
    responses(
        (status = 204, description = "Patient deleted"),
        (status = 404, description = "Patient not found")
    )
)]
/// Delete a patient; its maladies are kept
#[axum::debug_handler]
pub(crate) async fn delete_patient(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .patients
        .delete_patient(id)
        .await
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(|e| api_error("Delete patient", e))
}

#[utoipa::path(
    get,
    path = "/patients/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching patient", body = PatientDto),
        (status = 400, description = "Neither email nor telephone given"),
        (status = 404, description = "No matching patient")
    )
)]
/// Find a patient by email or, failing that, by telephone
///
/// When both are given only the email is used.
#[axum::debug_handler]
pub(crate) async fn search_patient(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<PatientDto>, ApiError> {
    let email = query.email.filter(|e| !e.trim().is_empty());
    let found = match (email, query.telephone) {
        (Some(email), _) => state.patients.find_by_email(&email).await,
        (None, Some(telephone)) => state.patients.find_by_telephone(telephone).await,
        (None, None) => {
            return Err((
                StatusCode::BAD_REQUEST,
                "email or telephone is required".into(),
            ))
        }
    };

    match found {
        Ok(Some(patient)) => Ok(Json(patient)),
        Ok(None) => Err(not_found("Patient")),
        Err(e) => Err(api_error("Search patient", e)),
    }
}

#[utoipa::path(
    get,
    path = "/patients/by-name",
    params(NomQuery),
    responses((status = 200, description = "Patients with exactly this name", body = [PatientDto]))
)]
#[axum::debug_handler]
pub(crate) async fn patients_by_name(
    State(state): State<AppState>,
    Query(query): Query<NomQuery>,
) -> Result<Json<Vec<PatientDto>>, ApiError> {
    state
        .patients
        .find_by_nom(&query.nom)
        .await
        .map(Json)
        .map_err(|e| api_error("Patients by name", e))
}

#[utoipa::path(
    get,
    path = "/patients/by-stade",
    params(StadeQuery),
    responses((status = 200, description = "Patients at this stage", body = [PatientDto]))
)]
#[axum::debug_handler]
pub(crate) async fn patients_by_stade(
    State(state): State<AppState>,
    Query(query): Query<StadeQuery>,
) -> Result<Json<Vec<PatientDto>>, ApiError> {
    state
        .patients
        .find_by_stade(query.stade)
        .await
        .map(Json)
        .map_err(|e| api_error("Patients by stade", e))
}

#[utoipa::path(
    get,
    path = "/patients/by-traitement",
    params(TraitementQuery),
    responses((status = 200, description = "Patients following a matching treatment", body = [PatientDto]))
)]
#[axum::debug_handler]
pub(crate) async fn patients_by_traitement(
    State(state): State<AppState>,
    Query(query): Query<TraitementQuery>,
) -> Result<Json<Vec<PatientDto>>, ApiError> {
    state
        .patients
        .find_by_traitement(&query.traitement)
        .await
        .map(Json)
        .map_err(|e| api_error("Patients by traitement", e))
}

#[utoipa::path(
    get,
    path = "/patients/filter",
    params(FilterQuery),
    responses(
        (status = 200, description = "Patients matching every given criterion", body = [PatientDto]),
        (status = 400, description = "Unknown stage")
    )
)]
#[axum::debug_handler]
pub(crate) async fn filter_patients(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Vec<PatientDto>>, ApiError> {
    let stade = match query.stade.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => match s.parse::<StadePatient>() {
            Ok(stade) => Some(stade),
            Err(e) => return Err((StatusCode::BAD_REQUEST, e.to_string())),
        },
        None => None,
    };

    state
        .patients
        .find_by_nom_and_stade_and_traitement(
            query.nom.as_deref(),
            stade,
            query.traitement.as_deref(),
        )
        .await
        .map(Json)
        .map_err(|e| api_error("Filter patients", e))
}

#[utoipa::path(
    get,
    path = "/patients/stats",
    responses((status = 200, description = "Patient statistics", body = PatientStats))
)]
#[axum::debug_handler]
pub(crate) async fn patient_stats(
    State(state): State<AppState>,
) -> Result<Json<PatientStats>, ApiError> {
    state
        .patients
        .get_patient_stats()
        .await
        .map(Json)
        .map_err(|e| api_error("Patient stats", e))
}

#[utoipa::path(
    get,
    path = "/patients/{id}/maladies",
    params(("id" = i64, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Maladies of the patient", body = [MaladieDto]),
        (status = 404, description = "Patient not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn patient_maladies(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<MaladieDto>>, ApiError> {
    match state.patients.get_maladies_by_patient_id(id).await {
        Ok(Some(list)) => Ok(Json(list)),
        Ok(None) => Err(not_found("Patient")),
        Err(e) => Err(api_error("Patient maladies", e)),
    }
}

#[utoipa::path(
    get,
    path = "/patients/{id}/dossier",
    params(("id" = i64, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Printable medical record", body = String, content_type = "text/plain"),
        (status = 404, description = "Patient not found")
    )
)]
/// Plain-text medical record of a patient
#[axum::debug_handler]
pub(crate) async fn patient_dossier(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<String, ApiError> {
    match state.patients.dossier(id).await {
        Ok(Some(text)) => Ok(text),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            format!("Aucun dossier trouvé pour l'ID patient: {id}"),
        )),
        Err(e) => Err(api_error("Patient dossier", e)),
    }
}
