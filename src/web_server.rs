use crate::asset::Asset;
use crate::catalog_stores::sqlite::SqliteCatalog;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::scanner::DirectoryScanner;
use crate::thumbnail::ThumbnailResolver;
use actix_files::NamedFile;
use actix_web::{web, App, HttpResponse, HttpServer};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Everything the handlers share. The catalog sits behind a mutex so a scan
/// is the only writer while it runs.
pub struct AppState {
    catalog: Mutex<SqliteCatalog>,
    resolver: ThumbnailResolver,
    scan_root: PathBuf,
    static_dir: PathBuf,
}

impl AppState {
    pub fn new(
        catalog: SqliteCatalog,
        resolver: ThumbnailResolver,
        scan_root: impl Into<PathBuf>,
        static_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            catalog: Mutex::new(catalog),
            resolver,
            scan_root: scan_root.into(),
            static_dir: static_dir.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let catalog = SqliteCatalog::open(Path::new(&config.database_path))?;
        let resolver = ThumbnailResolver::new(&config.thumbnail_directory)?;
        Ok(Self::new(
            catalog,
            resolver,
            &config.scan_directory,
            &config.static_directory,
        ))
    }
}

#[derive(Deserialize, Debug)]
struct AssetQuery {
    tag: Option<String>,
}

#[derive(Serialize, Debug)]
struct WebTag {
    id: i64,
    name: String,
}

#[derive(Deserialize, Debug)]
struct AddTagRequest {
    asset_id: Option<i64>,
    tag_name: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RemoveTagRequest {
    asset_id: Option<i64>,
    tag_id: Option<i64>,
}

/// Runs `f` against the locked catalog on the blocking pool. A lock poisoned
/// by an earlier panic is recovered, since every catalog write is a single
/// SQLite statement and leaves nothing half-applied.
async fn with_catalog<F, R>(state: web::Data<AppState>, f: F) -> Result<R, AppError>
where
    F: FnOnce(&SqliteCatalog, &AppState) -> Result<R, AppError> + Send + 'static,
    R: Send + 'static,
{
    web::block(move || {
        let catalog = state.catalog.lock().unwrap_or_else(|poisoned| {
            log::warn!("Recovering catalog lock after a panicked request");
            poisoned.into_inner()
        });
        f(&*catalog, state.get_ref())
    })
    .await?
}

async fn index(state: web::Data<AppState>) -> Result<NamedFile, AppError> {
    NamedFile::open_async(state.static_dir.join("index.html"))
        .await
        .map_err(|e| {
            log::error!("Error serving index.html: {}", e);
            AppError::Io(e)
        })
}

async fn scan_files(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    log::debug!("Scan requested for {:?}", state.scan_root);
    let count = with_catalog(state, |catalog, state| {
        Ok(DirectoryScanner::new(catalog, state.resolver.clone()).scan(&state.scan_root))
    })
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": format!("Scanned {} files", count),
        "count": count,
    })))
}

async fn api_assets(
    state: web::Data<AppState>,
    query: web::Query<AssetQuery>,
) -> Result<HttpResponse, AppError> {
    log::debug!("Received request for assets with query: {:?}", query);
    let tag = query.into_inner().tag;
    let assets: Vec<Asset> =
        with_catalog(state, move |catalog, _| catalog.list_assets(tag.as_deref())).await?;
    Ok(HttpResponse::Ok().json(assets))
}

async fn api_tags(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let tags = with_catalog(state, |catalog, _| catalog.list_tags()).await?;
    let web_tags: Vec<WebTag> = tags
        .into_iter()
        .map(|t| WebTag {
            id: t.id,
            name: t.name,
        })
        .collect();
    Ok(HttpResponse::Ok().json(web_tags))
}

async fn add_tag(
    state: web::Data<AppState>,
    body: web::Json<AddTagRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let (asset_id, tag_name) = match (body.asset_id, body.tag_name) {
        (Some(id), Some(name)) if !name.trim().is_empty() => (id, name),
        _ => return Err(AppError::BadRequest("Missing required fields".into())),
    };

    with_catalog(state, move |catalog, _| catalog.add_tag(asset_id, &tag_name)).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Tag added successfully",
    })))
}

async fn remove_tag(
    state: web::Data<AppState>,
    body: web::Json<RemoveTagRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let (asset_id, tag_id) = match (body.asset_id, body.tag_id) {
        (Some(asset_id), Some(tag_id)) => (asset_id, tag_id),
        _ => return Err(AppError::BadRequest("Missing required fields".into())),
    };

    with_catalog(state, move |catalog, _| catalog.remove_tag(asset_id, tag_id)).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Tag removed successfully",
    })))
}

/// Registers the API routes. File serving is added by [`start_web_server`].
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/scan", web::get().to(scan_files))
        .route("/api/assets", web::get().to(api_assets))
        .route("/api/tags", web::get().to(api_tags))
        .route("/add_tag", web::post().to(add_tag))
        .route("/remove_tag", web::post().to(remove_tag));
}

pub async fn start_web_server(config: &AppConfig, state: AppState) -> std::io::Result<()> {
    let thumbnail_dir = state.resolver.thumbnail_dir().to_path_buf();
    let static_dir = state.static_dir.clone();
    let state = web::Data::new(state);

    log::info!("Starting web server on {}:{}", config.web_host, config.web_port);
    log::debug!(
        "Serving thumbnails from {:?} and static files from {:?}",
        thumbnail_dir,
        static_dir
    );

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(actix_files::Files::new("/thumbnails", &thumbnail_dir))
            .service(actix_files::Files::new("/static", &static_dir))
            .configure(configure)
            .default_service(web::to(index))
    })
    .bind((config.web_host.as_str(), config.web_port))?
    .run()
    .await
}
