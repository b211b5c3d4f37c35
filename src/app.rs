use crate::config::Config;
use crate::favorites::{FavoritesService, SortBy, ToggleOutcome};
use crate::models::{FavoriteMovie, MovieSummary};
use crate::store::{FavoritesStore, SqliteStore};
use crate::tmdb::{TmdbApi, TmdbClient};
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{info, warn};

const MAX_BODY_BYTES: usize = 64 * 1024;
const DEFAULT_MIN_RATING: f64 = 7.0;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn TmdbApi>,
    pub favorites: FavoritesService,
    pub image_base_url: String,
}

pub async fn run_server(config: Config) -> Result<()> {
    let store: Arc<dyn FavoritesStore> =
        Arc::new(SqliteStore::connect(&config.database_url).await?);
    let catalog: Arc<dyn TmdbApi> = Arc::new(TmdbClient::new(config.tmdb.clone()));
    let favorites = FavoritesService::new(catalog.clone(), store);

    let state = AppState {
        catalog,
        favorites,
        image_base_url: config.tmdb.image_base_url.clone(),
    };
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(trending))
        .route("/popular", get(popular))
        .route("/now-playing", get(now_playing))
        .route("/search", get(search))
        .route("/movie/:id", get(movie_detail))
        .route("/favorites", get(favorites_page))
        .route("/favorites/top", get(top_favorites))
        .route("/favorites/add/:id", post(add_favorite))
        .route("/favorites/remove/:id", delete(remove_favorite))
        .route("/favorites/toggle/:id", post(toggle_favorite))
        .route("/favorites/check/:id", get(check_favorite))
        .route("/error", get(error_page))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

#[derive(Serialize)]
struct Listing {
    page_title: String,
    movies: Vec<MovieSummary>,
    image_base_url: String,
}

#[derive(Serialize)]
struct DetailResponse {
    movie: MovieSummary,
    is_in_favorites: bool,
    image_base_url: String,
}

#[derive(Serialize)]
struct FavoritesResponse {
    favorites: Vec<FavoriteMovie>,
    total: i64,
    image_base_url: String,
}

async fn health() -> &'static str {
    "OK"
}

async fn trending(State(state): State<AppState>) -> Json<Listing> {
    info!("Loading home page with trending movies");
    Json(Listing {
        page_title: "Trending Movies".to_string(),
        movies: state.catalog.trending().await,
        image_base_url: state.image_base_url.clone(),
    })
}

async fn popular(State(state): State<AppState>) -> Json<Listing> {
    info!("Loading popular movies page");
    Json(Listing {
        page_title: "Popular Movies".to_string(),
        movies: state.catalog.popular().await,
        image_base_url: state.image_base_url.clone(),
    })
}

async fn now_playing(State(state): State<AppState>) -> Json<Listing> {
    info!("Loading now playing movies page");
    Json(Listing {
        page_title: "Now Playing".to_string(),
        movies: state.catalog.now_playing().await,
        image_base_url: state.image_base_url.clone(),
    })
}

#[derive(Deserialize)]
struct SearchParams {
    q: Option<String>,
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<Listing> {
    let query = params.q.unwrap_or_default();
    info!("Searching movies with query: {}", query);

    let page_title = if query.trim().is_empty() {
        "Search Movies".to_string()
    } else {
        format!("Search Results for: {}", query.trim())
    };

    Json(Listing {
        page_title,
        movies: state.catalog.search(&query).await,
        image_base_url: state.image_base_url.clone(),
    })
}

async fn movie_detail(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    info!("Loading movie details for ID: {}", id);
    match state.catalog.detail(id).await {
        Some(movie) => {
            let is_in_favorites = state.favorites.is_favorite(id).await;
            Json(DetailResponse {
                movie,
                is_in_favorites,
                image_base_url: state.image_base_url.clone(),
            })
            .into_response()
        }
        None => {
            warn!("Movie not found with ID: {}", id);
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "movie not found" })),
            )
                .into_response()
        }
    }
}

#[derive(Deserialize)]
struct FavoritesParams {
    sort: Option<String>,
    search: Option<String>,
}

async fn favorites_page(
    State(state): State<AppState>,
    Query(params): Query<FavoritesParams>,
) -> Json<FavoritesResponse> {
    info!(
        "Loading favorites page with sort: {:?} and search: {:?}",
        params.sort, params.search
    );
    let sort = SortBy::parse(params.sort.as_deref());
    let page = state.favorites.page(sort, params.search.as_deref()).await;
    Json(FavoritesResponse {
        favorites: page.movies,
        total: page.total,
        image_base_url: state.image_base_url.clone(),
    })
}

#[derive(Deserialize)]
struct TopParams {
    min_rating: Option<f64>,
}

async fn top_favorites(
    State(state): State<AppState>,
    Query(params): Query<TopParams>,
) -> Json<Vec<FavoriteMovie>> {
    let min_rating = params.min_rating.unwrap_or(DEFAULT_MIN_RATING);
    info!("Loading top rated favorites with minimum rating {}", min_rating);
    Json(state.favorites.top_rated(min_rating).await)
}

async fn add_favorite(State(state): State<AppState>, Path(id): Path<i64>) -> &'static str {
    info!("Adding movie to favorites with ID: {}", id);
    if state.favorites.add(id).await {
        "success"
    } else {
        "already_exists"
    }
}

async fn remove_favorite(State(state): State<AppState>, Path(id): Path<i64>) -> &'static str {
    info!("Removing movie from favorites with ID: {}", id);
    if state.favorites.remove(id).await {
        "success"
    } else {
        "not_found"
    }
}

async fn toggle_favorite(State(state): State<AppState>, Path(id): Path<i64>) -> &'static str {
    info!("Toggling favorite status for movie ID: {}", id);
    let outcome = state.favorites.toggle(id).await;
    if outcome == ToggleOutcome::Error {
        warn!("Toggle for movie {} hit an inconsistent state", id);
    }
    outcome.as_str()
}

async fn check_favorite(State(state): State<AppState>, Path(id): Path<i64>) -> Json<bool> {
    Json(state.favorites.is_favorite(id).await)
}

async fn error_page() -> Json<serde_json::Value> {
    Json(json!({ "error": "Something went wrong. Please try again." }))
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
