use crate::catalog::{CatalogApi, CatalogClient};
use crate::config::Config;
use crate::error::StoreError;
use crate::favorites::{FavoritesStore, FileStorage};
use crate::models::{MovieId, MovieSummary};
use crate::present::{self, DetailPage, TrailerLink};
use crate::view::{MovieDetailView, MovieListView};
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogApi>,
    pub favorites: Arc<Mutex<FavoritesStore>>,
}

impl AppState {
    pub fn new(catalog: Arc<dyn CatalogApi>, favorites: FavoritesStore) -> Self {
        Self {
            catalog,
            favorites: Arc::new(Mutex::new(favorites)),
        }
    }
}

pub async fn run_server(config: Config) -> Result<()> {
    let catalog: Arc<dyn CatalogApi> = Arc::new(CatalogClient::from_config(&config));
    info!("Catalog endpoint: {}", config.catalog_base_url);

    let storage = Arc::new(FileStorage::new(config.favorites_dir.clone()));
    info!("Favorites stored in {:?}", config.favorites_dir);
    let favorites = FavoritesStore::open(storage);

    let app = build_router(AppState::new(catalog, favorites));

    info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/popular", get(popular))
        .route("/api/search", get(search))
        .route("/api/movies/:id", get(movie_detail))
        .route("/api/movies/:id/trailer", get(movie_trailer))
        .route("/api/movies/:id/images", get(movie_images))
        .route("/api/favorites", get(list_favorites).post(add_favorite))
        .route(
            "/api/favorites/:id",
            get(favorite_status).delete(remove_favorite),
        )
        .route("/api/favorites/:id/toggle", post(toggle_favorite))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    query: String,
}

async fn popular(State(state): State<AppState>) -> Response {
    let mut view = MovieListView::new();
    view.load_popular(state.catalog.as_ref()).await;
    let favorites = state.favorites.lock().await;
    let body = view
        .into_state()
        .map(|movies| present::cards(movies, &favorites));
    Json(body).into_response()
}

async fn search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    let mut view = MovieListView::new();
    if !view.search(state.catalog.as_ref(), &params.query).await {
        return error_response(StatusCode::BAD_REQUEST, "search query must not be empty");
    }
    let favorites = state.favorites.lock().await;
    let body = view
        .into_state()
        .map(|movies| present::cards(movies, &favorites));
    Json(body).into_response()
}

async fn movie_detail(State(state): State<AppState>, Path(id): Path<MovieId>) -> Response {
    let mut view = MovieDetailView::new();
    view.load(state.catalog.as_ref(), id).await;
    let favorites = state.favorites.lock().await;
    let body = view
        .into_state()
        .map(|detail| DetailPage::new(detail, &favorites));
    Json(body).into_response()
}

async fn movie_trailer(State(state): State<AppState>, Path(id): Path<MovieId>) -> Response {
    match state.catalog.fetch_trailer(id).await {
        Some(trailer) => Json(TrailerLink::from(trailer)).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "No trailer available for this movie"),
    }
}

async fn movie_images(State(state): State<AppState>, Path(id): Path<MovieId>) -> Response {
    match state.catalog.fetch_images(id).await {
        Some(images) => Json(images).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "No images available for this movie"),
    }
}

async fn list_favorites(State(state): State<AppState>) -> Response {
    let favorites = state.favorites.lock().await;
    let cards = present::cards(favorites.list_favorites(), &favorites);
    Json(cards).into_response()
}

async fn favorite_status(State(state): State<AppState>, Path(id): Path<MovieId>) -> Response {
    let favorite = state.favorites.lock().await.is_favorite(id);
    Json(json!({ "id": id, "favorite": favorite })).into_response()
}

async fn add_favorite(State(state): State<AppState>, Json(movie): Json<MovieSummary>) -> Response {
    let id = movie.id;
    let result = with_favorites(&state, move |store| {
        store.add_to_favorites(movie).map(|_| true)
    })
    .await;
    favorite_result(id, result)
}

async fn remove_favorite(State(state): State<AppState>, Path(id): Path<MovieId>) -> Response {
    let result = with_favorites(&state, move |store| {
        store.remove_from_favorites(id).map(|_| false)
    })
    .await;
    favorite_result(id, result)
}

async fn toggle_favorite(
    State(state): State<AppState>,
    Path(id): Path<MovieId>,
    Json(movie): Json<MovieSummary>,
) -> Response {
    if movie.id != id {
        return error_response(StatusCode::BAD_REQUEST, "movie id does not match path");
    }
    let result = with_favorites(&state, move |store| store.toggle(movie)).await;
    favorite_result(id, result)
}

/// Runs a persisting mutation on the blocking pool. The store lock is held
/// until the write finishes, so writes reach storage in mutation order.
async fn with_favorites<F>(state: &AppState, f: F) -> Result<bool, StoreError>
where
    F: FnOnce(&mut FavoritesStore) -> Result<bool, StoreError> + Send + 'static,
{
    let mut store = state.favorites.clone().lock_owned().await;
    tokio::task::spawn_blocking(move || f(&mut store))
        .await
        .unwrap_or_else(|e| Err(StoreError::Io(std::io::Error::other(e))))
}

fn favorite_result(id: MovieId, result: Result<bool, StoreError>) -> Response {
    match result {
        Ok(favorite) => Json(json!({ "id": id, "favorite": favorite })).into_response(),
        Err(e) => {
            error!("Failed to persist favorites: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save favorites")
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "status": "error", "message": message }))).into_response()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
