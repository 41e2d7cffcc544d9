//! # API REST
//!
//! REST API implementation for the hospital records backend.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status codes)
//!
//! Uses `api-shared` for the transfer objects and `hopital-core` for every
//! data operation.

#![warn(rust_2018_idioms)]

mod images;
mod maladies;
mod patients;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, FromRequest, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{
    HealthRes, HealthService, ImageInfoDto, MaladieDto, MaladieStats, MaladieSummaryDto,
    PatientCreateUpdateDto, PatientDto, PatientStats, StadePatient,
};
use hopital_core::{
    CoreConfig, Database, HopitalError, ImageService, MaladieService, PatientService,
};

/// Room left for multipart boundaries and the `maladieId` field on uploads.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Application state shared across REST API handlers
///
/// Contains the services needed by the REST API endpoints. Every service
/// shares the same database pool.
#[derive(Clone)]
pub struct AppState {
    cfg: Arc<CoreConfig>,
    db: Database,
    patients: PatientService,
    maladies: MaladieService,
    images: ImageService,
}

impl AppState {
    pub fn new(db: Database, cfg: Arc<CoreConfig>) -> Self {
        Self {
            patients: PatientService::new(db.clone()),
            maladies: MaladieService::new(db.clone()),
            images: ImageService::new(db.clone(), cfg.clone()),
            cfg,
            db,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        patients::list_patients,
        patients::create_patient,
        patients::get_patient,
        patients::update_patient,
        patients::patch_patient,
        patients::delete_patient,
        patients::search_patient,
        patients::patients_by_name,
        patients::patients_by_stade,
        patients::patients_by_traitement,
        patients::filter_patients,
        patients::patient_stats,
        patients::patient_maladies,
        patients::patient_dossier,
        maladies::list_maladies,
        maladies::create_maladie,
        maladies::get_maladie,
        maladies::update_maladie,
        maladies::patch_maladie,
        maladies::delete_maladie,
        maladies::maladie_patients,
        maladies::maladie_images,
        maladies::maladie_by_name,
        maladies::maladie_stats,
        images::upload_image,
        images::get_image,
        images::delete_image,
    ),
    components(schemas(
        HealthRes,
        PatientDto,
        PatientCreateUpdateDto,
        PatientStats,
        StadePatient,
        MaladieDto,
        MaladieSummaryDto,
        MaladieStats,
        ImageInfoDto,
        images::UploadForm,
    ))
)]
struct ApiDoc;

/// Builds the complete REST router.
///
/// The request body limit is raised to the configured image size plus
/// multipart framing so uploads at the limit are accepted.
pub fn router(state: AppState) -> Router {
    let body_limit = state
        .cfg
        .max_image_bytes()
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/health", get(health))
        .merge(patients::routes())
        .merge(maladies::routes())
        .route("/images/upload", post(images::upload_image))
        .route(
            "/images/:id",
            get(images::get_image).delete(images::delete_image),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Reports whether the service is up and its database answers.
#[axum::debug_handler]
async fn health(State(state): State<AppState>) -> Json<HealthRes> {
    let database_ok = match state.db.health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("Database health check error: {:?}", e);
            false
        }
    };
    Json(HealthService::with_database(database_ok))
}

pub(crate) type ApiError = (StatusCode, String);

/// Maps a core error onto a status code, logging it first.
///
/// Client mistakes carry their message; anything else is reported as an
/// opaque internal error.
pub(crate) fn api_error(context: &str, err: HopitalError) -> ApiError {
    tracing::error!("{} error: {:?}", context, err);
    match err {
        HopitalError::InvalidInput(_)
        | HopitalError::InvalidField { .. }
        | HopitalError::MissingMaladies(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        HopitalError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        HopitalError::Conflict(_) => (StatusCode::CONFLICT, err.to_string()),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".into()),
    }
}

pub(crate) fn not_found(what: &str) -> ApiError {
    (StatusCode::NOT_FOUND, format!("{what} not found"))
}

/// JSON request body whose decoding failures answer `400 Bad Request`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(BadBody))]
pub(crate) struct JsonBody<T>(pub T);

pub(crate) struct BadBody(String);

impl From<JsonRejection> for BadBody {
    fn from(rejection: JsonRejection) -> Self {
        let message = rejection.body_text();
        tracing::error!("Invalid request body: {}", message);
        Self(message)
    }
}

impl IntoResponse for BadBody {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, self.0).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, Response};
    use serde_json::{json, Value};
    use tower::ServiceExt; // for `oneshot`

    async fn app_with_limit(max_image_bytes: usize) -> Router {
        let db = Database::open_in_memory().await.unwrap();
        let cfg = CoreConfig::new("sqlite::memory:".into(), max_image_bytes).unwrap();
        router(AppState::new(db, Arc::new(cfg)))
    }

    async fn app() -> Router {
        app_with_limit(1024).await
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response<Body> {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.clone().oneshot(request).await.unwrap()
    }

    async fn body_bytes(response: Response<Body>) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    async fn body_json(response: Response<Body>) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    async fn body_text(response: Response<Body>) -> String {
        String::from_utf8(body_bytes(response).await).unwrap()
    }

    async fn create_maladie(app: &Router, nom: &str, kind: &str) -> i64 {
        let response = send(
            app,
            "POST",
            "/maladies",
            Some(json!({"nom": nom, "type": kind, "symptomes": ["fievre"]})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["id"].as_i64().unwrap()
    }

    fn multipart_request(file_name: &str, data: &[u8], maladie_id: &str) -> Request<Body> {
        let boundary = "hopital-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(
            format!(
                "\r\n--{boundary}\r\nContent-Disposition: form-data; name=\"maladieId\"\r\n\r\n{maladie_id}\r\n--{boundary}--\r\n"
            )
            .as_bytes(),
        );

        Request::builder()
            .method("POST")
            .uri("/images/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_database() {
        let app = app().await;
        let response = send(&app, "GET", "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["ok"], true);
    }

    #[tokio::test]
    async fn patient_crud_round() {
        let app = app().await;
        let grippe = create_maladie(&app, "Grippe", "virale").await;

        let response = send(
            &app,
            "POST",
            "/patients",
            Some(json!({
                "nom": "Dupont",
                "prenom": "Jean",
                "email": "jean@example.fr",
                "stade": "STADE_II",
                "maladieIds": [grippe]
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        let id = created["id"].as_i64().unwrap();
        assert_eq!(created["maladiesAffectees"][0]["nom"], "Grippe");

        let response = send(&app, "GET", &format!("/patients/{id}"), None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(
            &app,
            "PUT",
            &format!("/patients/{id}"),
            Some(json!({"nom": "Dupont", "prenom": "Jeanne"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let updated = body_json(response).await;
        assert_eq!(updated["prenom"], "Jeanne");
        assert_eq!(updated["maladiesAffectees"], json!([]));

        let response = send(
            &app,
            "PATCH",
            &format!("/patients/{id}"),
            Some(json!({"groupeSanguin": "AB+"})),
        )
        .await;
        assert_eq!(body_json(response).await["groupeSanguin"], "AB+");

        let response = send(&app, "DELETE", &format!("/patients/{id}"), None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&app, "GET", &format!("/patients/{id}"), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = send(&app, "DELETE", &format!("/patients/{id}"), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn patient_errors_map_to_status_codes() {
        let app = app().await;

        let response = send(
            &app,
            "POST",
            "/patients",
            Some(json!({"nom": "A", "prenom": "B", "maladieIds": [404]})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("404"));

        let body = json!({"nom": "A", "prenom": "B", "telephone": 600000000});
        let response = send(&app, "POST", "/patients", Some(body.clone())).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let response = send(&app, "POST", "/patients", Some(body)).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = send(&app, "PUT", "/patients/99", Some(json!({"nom": "A", "prenom": "B"}))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn undecodable_bodies_are_bad_requests() {
        let app = app().await;

        for body in [
            json!({"nom": "A", "prenom": "B", "stade": "STADE_X"}),
            json!({"nom": "A", "prenom": "B", "telephone": "abc"}),
            json!({"prenom": "B"}),
        ] {
            let response = send(&app, "POST", "/patients", Some(body.clone())).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        }

        let response = send(&app, "POST", "/maladies", Some(json!({"type": "x"}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&app, "POST", "/patients", Some(json!({"nom": "A", "prenom": "B"}))).await;
        let id = body_json(response).await["id"].as_i64().unwrap();
        let response = send(
            &app,
            "PUT",
            &format!("/patients/{id}"),
            Some(json!({"nom": "A", "prenom": "B", "stade": "STADE_X"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&app, "PATCH", &format!("/patients/{id}"), Some(json!([1, 2]))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn patient_searches() {
        let app = app().await;
        for (nom, email, stade, traitement) in [
            ("Martin", "m@example.fr", "STADE_I", "aspirine"),
            ("Petit", "p@example.fr", "STADE_IV", "chimiotherapie"),
        ] {
            let response = send(
                &app,
                "POST",
                "/patients",
                Some(json!({
                    "nom": nom,
                    "prenom": "X",
                    "email": email,
                    "stade": stade,
                    "traitementSuivie": [traitement]
                })),
            )
            .await;
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = send(&app, "GET", "/patients/search?email=p@example.fr", None).await;
        assert_eq!(body_json(response).await["nom"], "Petit");
        let response = send(&app, "GET", "/patients/search?email=zz@example.fr", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = send(&app, "GET", "/patients/search", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&app, "GET", "/patients/by-name?nom=Martin", None).await;
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);
        let response = send(&app, "GET", "/patients/by-stade?stade=STADE_IV", None).await;
        assert_eq!(body_json(response).await[0]["nom"], "Petit");
        let response = send(&app, "GET", "/patients/by-traitement?traitement=chimio", None).await;
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);
        let response = send(&app, "GET", "/patients/filter?stade=&nom=t", None).await;
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);
        let response = send(&app, "GET", "/patients/filter?stade=STADE_X", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&app, "GET", "/patients/stats", None).await;
        let stats = body_json(response).await;
        assert_eq!(stats["totalPatients"], 2);
        assert_eq!(stats["criticalPatientsCount"], 1);
    }

    #[tokio::test]
    async fn patient_maladies_and_dossier() {
        let app = app().await;
        let grippe = create_maladie(&app, "Grippe", "virale").await;
        let response = send(
            &app,
            "POST",
            "/patients",
            Some(json!({"nom": "Roux", "prenom": "Ana", "maladieIds": [grippe]})),
        )
        .await;
        let id = body_json(response).await["id"].as_i64().unwrap();

        let response = send(&app, "GET", &format!("/patients/{id}/maladies"), None).await;
        assert_eq!(body_json(response).await[0]["symptomes"], json!(["fievre"]));

        let response = send(&app, "GET", &format!("/patients/{id}/dossier"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
        assert!(body_text(response).await.contains("Dossier Médical de Roux Ana"));

        let response = send(&app, "GET", "/patients/77/dossier", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn maladie_queries_and_delete() {
        let app = app().await;
        let grippe = create_maladie(&app, "Grippe", "virale").await;
        create_maladie(&app, "Covid", "virale").await;
        create_maladie(&app, "Asthme", "chronique").await;

        let response = send(&app, "GET", "/maladies", None).await;
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 3);
        let response = send(&app, "GET", "/maladies?type=virale", None).await;
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);
        let response = send(&app, "GET", "/maladies?type=virale&nom=Asthme", None).await;
        assert_eq!(body_json(response).await, json!([]));
        let response = send(&app, "GET", "/maladies?nom=Asthme", None).await;
        assert_eq!(body_json(response).await[0]["type"], "chronique");

        let response = send(&app, "GET", "/maladies/Covid/maladies", None).await;
        assert_eq!(body_json(response).await["nom"], "Covid");
        let response = send(&app, "GET", "/maladies/Peste/maladies", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        send(
            &app,
            "POST",
            "/patients",
            Some(json!({"nom": "Roux", "prenom": "Ana", "maladieIds": [grippe]})),
        )
        .await;
        let response = send(&app, "GET", &format!("/maladies/{grippe}/patients"), None).await;
        let patients = body_json(response).await;
        assert_eq!(patients[0]["maladiesAffectees"], json!([]));

        let response = send(&app, "GET", "/maladies/stats", None).await;
        let stats = body_json(response).await;
        assert_eq!(stats["total de maladies"], 3);
        assert_eq!(stats["patients par maladie"]["Grippe"], 1);

        let response = send(
            &app,
            "PATCH",
            &format!("/maladies/{grippe}"),
            Some(json!({"traitements": ["repos"]})),
        )
        .await;
        assert_eq!(body_json(response).await["traitements"], json!(["repos"]));

        let response = send(&app, "DELETE", &format!("/maladies/{grippe}"), None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let response = send(&app, "GET", &format!("/maladies/{grippe}"), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = send(&app, "GET", &format!("/maladies/{grippe}/patients"), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn image_upload_fetch_and_delete() {
        let app = app().await;
        let maladie = create_maladie(&app, "Fracture", "traumatique").await;

        let response = app
            .clone()
            .oneshot(multipart_request("radio.png", b"\x89PNG", &maladie.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_text(response).await,
            "Image uploaded successfully: radio.png"
        );

        let response = send(&app, "GET", &format!("/maladies/{maladie}/images"), None).await;
        let images = body_json(response).await;
        assert_eq!(images[0]["size"], 4);
        let image_id = images[0]["id"].as_i64().unwrap();

        let response = send(&app, "GET", &format!("/images/{image_id}"), None).await;
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(body_bytes(response).await, b"\x89PNG");

        let response = send(&app, "DELETE", &format!("/images/{image_id}"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let response = send(&app, "DELETE", &format!("/images/{image_id}"), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = send(&app, "GET", &format!("/images/{image_id}"), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn image_upload_failures_are_expectation_failed() {
        let app = app_with_limit(8).await;
        let maladie = create_maladie(&app, "Fracture", "traumatique").await;

        let response = app
            .clone()
            .oneshot(multipart_request("big.png", &[0; 9], &maladie.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::EXPECTATION_FAILED);
        assert!(body_text(response)
            .await
            .starts_with("Could not upload the image: big.png"));

        let response = app
            .clone()
            .oneshot(multipart_request("a.png", &[1], "999"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::EXPECTATION_FAILED);

        let response = app
            .clone()
            .oneshot(multipart_request("a.png", &[1], "abc"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::EXPECTATION_FAILED);
    }
}
