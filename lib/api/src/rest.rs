use actix_cors::Cors;
use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer, Result as ActixResult};
use artbox_core::defaults::DEFAULT_TOP_N;
use artbox_core::{ArtworkId, ArtworkRecord, ArtworkSummary, ArtworkUpdate, Error, OwnerId};
use artbox_mesh::{MeshBuilder, MeshError};
use artbox_similarity::SimilarityRanker;
use artbox_storage::ArtworkStore;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::populate::{find_images, populate_from_folder};
use crate::upload::{UploadForm, UploadLimits};

const PROCESSING_FAILED: &str = "Failed to process image. Please try a different image.";

/// Server-side settings not owned by a library crate
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Folder scanned by `/admin/populate`
    pub import_dir: PathBuf,
    /// Recommendation count when the request gives none
    pub default_top_n: usize,
    /// Size caps for `/make-glb`
    pub upload_limits: UploadLimits,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            import_dir: PathBuf::from("./data/images"),
            default_top_n: DEFAULT_TOP_N,
            upload_limits: UploadLimits::default(),
        }
    }
}

/// Shared handler state
pub struct AppState {
    pub store: Arc<ArtworkStore>,
    pub mesh: MeshBuilder,
    pub ranker: SimilarityRanker,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(store: Arc<ArtworkStore>, mesh: MeshBuilder, ranker: SimilarityRanker, config: ApiConfig) -> Self {
        Self { store, mesh, ranker, config }
    }
}

#[derive(Deserialize)]
struct RecommendationQuery {
    top_n: Option<usize>,
}

enum UploadFailure {
    Mesh(MeshError),
    Store(Error),
}

pub struct RestApi;

impl RestApi {
    pub async fn start(state: Arc<AppState>, port: u16) -> std::io::Result<()> {
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(86400);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(state.clone()))
                .configure(configure)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }
}

/// Register every route; handlers expect `web::Data<Arc<AppState>>`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/make-glb", web::post().to(make_glb))
        .route("/artworks", web::get().to(list_artworks))
        .route("/owners/{owner_id}/artworks", web::get().to(owner_artworks))
        .route("/api/artwork/{id}", web::get().to(get_artwork))
        .route("/api/artwork/{id}", web::put().to(update_artwork))
        .route("/api/artwork/{id}", web::delete().to(delete_artwork))
        .route("/api/artwork/{id}/recommendations", web::get().to(recommendations))
        .route("/artwork/{id}/image", web::get().to(artwork_image))
        .route("/artwork/{id}/glb", web::get().to(artwork_glb))
        .route("/admin/populate", web::get().to(populate_status))
        .route("/admin/populate", web::post().to(populate));
}

fn failure(status: StatusCode, message: impl std::fmt::Display) -> HttpResponse {
    HttpResponse::build(status).json(json!({
        "success": false,
        "error": message.to_string()
    }))
}

fn not_found(message: &str) -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "error": message }))
}

fn summaries(records: &[Arc<ArtworkRecord>]) -> Vec<ArtworkSummary> {
    records.iter().map(|r| r.summary()).collect()
}

async fn health(req: HttpRequest) -> ActixResult<HttpResponse> {
    let header = |name: &str| req.headers().get(name).and_then(|v| v.to_str().ok());

    let mobile = header("X-Mobile-Request") == Some("true");
    let user_agent: String = header("User-Agent").unwrap_or("unknown").chars().take(100).collect();
    let wants_json = header("Accept")
        .map(|a| a.starts_with("application/json"))
        .unwrap_or(false);

    if wants_json {
        Ok(HttpResponse::Ok().json(json!({
            "status": "OK",
            "timestamp": chrono::Local::now().to_rfc3339(),
            "mobile_detected": mobile,
            "user_agent": user_agent
        })))
    } else {
        Ok(HttpResponse::Ok()
            .content_type("text/plain")
            .body(format!("OK - Mobile: {}", mobile)))
    }
}

async fn make_glb(
    state: web::Data<Arc<AppState>>,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    let form = match UploadForm::read(payload, &state.config.upload_limits).await {
        Ok(form) => form,
        Err(e) if e.is_too_large() => {
            warn!("Rejected oversized upload: {}", e);
            return Ok(failure(StatusCode::PAYLOAD_TOO_LARGE, e));
        }
        Err(e) => return Ok(failure(StatusCode::BAD_REQUEST, e)),
    };
    let new = match form.into_new_artwork() {
        Ok(new) => new,
        Err(e) => {
            info!("Rejected upload: {}", e);
            return Ok(failure(StatusCode::BAD_REQUEST, e));
        }
    };

    info!(
        name = %new.name,
        filename = %new.filename,
        bytes = new.image_data.len(),
        "Processing upload"
    );

    let store = Arc::clone(&state.store);
    let mesh = state.mesh;
    let outcome = web::block(move || {
        let mut new = new;
        let model = mesh.build(&new.image_data).map_err(UploadFailure::Mesh)?;
        new.model_data = Some(model);
        store.insert(new).map_err(UploadFailure::Store)
    })
    .await;

    match outcome {
        Ok(Ok(record)) => {
            info!(id = %record.id, "Artwork saved");
            Ok(HttpResponse::Ok().json(json!({
                "success": true,
                "artwork_id": record.id
            })))
        }
        Ok(Err(UploadFailure::Mesh(e))) => {
            warn!("Mesh generation failed: {}", e);
            Ok(failure(StatusCode::INTERNAL_SERVER_ERROR, PROCESSING_FAILED))
        }
        Ok(Err(UploadFailure::Store(Error::InvalidInput(msg)))) => {
            Ok(failure(StatusCode::BAD_REQUEST, msg))
        }
        Ok(Err(UploadFailure::Store(e))) => {
            error!("Failed to store artwork: {}", e);
            Ok(failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Server error while processing image: {}", e),
            ))
        }
        Err(e) => {
            error!("Upload worker failed: {}", e);
            Ok(failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Server error while processing image: {}", e),
            ))
        }
    }
}

async fn list_artworks(state: web::Data<Arc<AppState>>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(summaries(&state.store.list())))
}

async fn owner_artworks(
    state: web::Data<Arc<AppState>>,
    path: web::Path<u64>,
) -> ActixResult<HttpResponse> {
    let owner = OwnerId(path.into_inner());
    Ok(HttpResponse::Ok().json(summaries(&state.store.list_by_owner(owner))))
}

async fn get_artwork(
    state: web::Data<Arc<AppState>>,
    path: web::Path<u64>,
) -> ActixResult<HttpResponse> {
    match state.store.get(ArtworkId(path.into_inner())) {
        Some(record) => Ok(HttpResponse::Ok().json(record.summary())),
        None => Ok(not_found("Artwork not found")),
    }
}

async fn update_artwork(
    state: web::Data<Arc<AppState>>,
    path: web::Path<u64>,
    body: web::Json<serde_json::Value>,
) -> ActixResult<HttpResponse> {
    let id = ArtworkId(path.into_inner());
    let update = match ArtworkUpdate::from_json(&body) {
        Ok(update) => update,
        Err(e) => return Ok(failure(StatusCode::BAD_REQUEST, e)),
    };

    match state.store.update(id, &update) {
        Ok(record) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Artwork updated successfully",
            "artwork": record.summary()
        }))),
        Err(Error::ArtworkNotFound(_)) => Ok(failure(StatusCode::NOT_FOUND, "Artwork not found")),
        Err(e @ Error::InvalidInput(_)) => Ok(failure(StatusCode::BAD_REQUEST, e)),
        Err(e) => {
            error!(%id, "Update failed: {}", e);
            Ok(failure(StatusCode::INTERNAL_SERVER_ERROR, e))
        }
    }
}

async fn delete_artwork(
    state: web::Data<Arc<AppState>>,
    path: web::Path<u64>,
) -> ActixResult<HttpResponse> {
    let id = ArtworkId(path.into_inner());
    match state.store.delete(id) {
        Ok(Some(record)) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": format!("Artwork \"{}\" deleted successfully", record.name)
        }))),
        Ok(None) => Ok(failure(StatusCode::NOT_FOUND, "Artwork not found")),
        Err(e) => {
            error!(%id, "Delete failed: {}", e);
            Ok(failure(StatusCode::INTERNAL_SERVER_ERROR, e))
        }
    }
}

async fn artwork_image(
    state: web::Data<Arc<AppState>>,
    path: web::Path<u64>,
) -> ActixResult<HttpResponse> {
    let id = ArtworkId(path.into_inner());
    let record = match state.store.get(id) {
        Some(record) if !record.image_data.is_empty() => record,
        _ => return Ok(not_found("Image not found")),
    };

    let format = image::guess_format(&record.image_data).ok();
    let content_type = format
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream");
    let extension = format
        .and_then(|f| f.extensions_str().first().copied())
        .unwrap_or("bin");

    Ok(HttpResponse::Ok()
        .content_type(content_type)
        .insert_header((
            "Content-Disposition",
            format!("inline; filename=\"artwork-{}.{}\"", id, extension),
        ))
        .body(record.image_data.clone()))
}

async fn artwork_glb(
    state: web::Data<Arc<AppState>>,
    path: web::Path<u64>,
) -> ActixResult<HttpResponse> {
    let id = ArtworkId(path.into_inner());
    let model = match state.store.get(id).and_then(|r| r.model_data.clone()) {
        Some(model) => model,
        None => return Ok(not_found("GLB not found")),
    };

    Ok(HttpResponse::Ok()
        .content_type("model/gltf-binary")
        .insert_header((
            "Content-Disposition",
            format!("inline; filename=\"artwork-{}.glb\"", id),
        ))
        .body(model))
}

async fn recommendations(
    state: web::Data<Arc<AppState>>,
    path: web::Path<u64>,
    query: web::Query<RecommendationQuery>,
) -> ActixResult<HttpResponse> {
    let id = ArtworkId(path.into_inner());
    let target = match state.store.get(id) {
        Some(target) => target,
        None => return Ok(not_found("Artwork not found")),
    };
    let top_n = query.top_n.unwrap_or(state.config.default_top_n);

    let store = Arc::clone(&state.store);
    let ranker = state.ranker;
    let recs = web::block(move || ranker.recommend(store.as_ref(), &target, top_n)).await?;

    Ok(HttpResponse::Ok().json(json!({
        "artwork_id": id,
        "recommendations": recs
    })))
}

async fn populate_status(state: web::Data<Arc<AppState>>) -> ActixResult<HttpResponse> {
    match find_images(&state.config.import_dir) {
        Ok(images) => Ok(HttpResponse::Ok().json(json!({
            "artwork_count": state.store.count(),
            "image_count": images.len(),
            "import_dir": state.config.import_dir.display().to_string()
        }))),
        Err(e) => Ok(failure(StatusCode::INTERNAL_SERVER_ERROR, e)),
    }
}

async fn populate(state: web::Data<Arc<AppState>>) -> ActixResult<HttpResponse> {
    let store = Arc::clone(&state.store);
    let mesh = state.mesh;
    let dir = state.config.import_dir.clone();
    info!(dir = %dir.display(), "Populating gallery");

    let result = web::block(move || populate_from_folder(&store, &mesh, &dir)).await?;
    match result {
        Ok(report) => {
            info!(processed = report.processed, skipped = report.skipped, "Populate finished");
            Ok(HttpResponse::Ok().json(json!({
                "success": true,
                "processed": report.processed,
                "skipped": report.skipped,
                "total_artworks": state.store.count()
            })))
        }
        Err(e) => {
            error!("Populate failed: {}", e);
            Ok(failure(StatusCode::INTERNAL_SERVER_ERROR, e))
        }
    }
}
