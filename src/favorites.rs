use crate::models::FavoriteMovie;
use crate::store::FavoritesStore;
use crate::tmdb::TmdbApi;
use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Result of a toggle: `Error` covers the caught inconsistency where the
/// underlying add/remove reports failure in a state that should have
/// succeeded (a race, or a store fault).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    Error,
}

impl ToggleOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToggleOutcome::Added => "added",
            ToggleOutcome::Removed => "removed",
            ToggleOutcome::Error => "error",
        }
    }
}

/// Favorites list ordering. Anything unrecognized falls back to rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    Rating,
    Date,
}

impl SortBy {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("date") => SortBy::Date,
            _ => SortBy::Rating,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FavoritesPage {
    pub movies: Vec<FavoriteMovie>,
    /// Size of the whole collection, not of the filtered view above.
    pub total: i64,
}

/// Reconciles favorite add/remove requests against the store and the
/// catalog. Every operation converts failures into outcome codes; nothing
/// here returns an error to the presentation layer.
#[derive(Clone)]
pub struct FavoritesService {
    catalog: Arc<dyn TmdbApi>,
    store: Arc<dyn FavoritesStore>,
}

impl FavoritesService {
    pub fn new(catalog: Arc<dyn TmdbApi>, store: Arc<dyn FavoritesStore>) -> Self {
        Self { catalog, store }
    }

    /// Add a movie to favorites by catalog id. Returns `false` when it is
    /// already present, when the catalog has no detail for it, or on any
    /// store failure. Idempotent: a second add is a no-op.
    pub async fn add(&self, tmdb_id: i64) -> bool {
        match self.try_add(tmdb_id).await {
            Ok(added) => added,
            Err(e) => {
                error!("Error adding movie {} to favorites: {:#}", tmdb_id, e);
                false
            }
        }
    }

    async fn try_add(&self, tmdb_id: i64) -> Result<bool> {
        if self.store.exists(tmdb_id).await? {
            info!("Movie {} is already in favorites", tmdb_id);
            return Ok(false);
        }

        let Some(detail) = self.catalog.detail(tmdb_id).await else {
            error!("Could not fetch movie details for TMDB ID {}", tmdb_id);
            return Ok(false);
        };

        let movie = FavoriteMovie::snapshot_of(&detail);
        // Two concurrent adds can both pass the exists check; the primary
        // key settles it, and a rejected insert reads as "already exists".
        if let Err(e) = self.store.insert(&movie).await {
            warn!("Insert for movie {} rejected: {:#}", tmdb_id, e);
            return Ok(false);
        }

        info!("Added movie '{}' to favorites", movie.title);
        Ok(true)
    }

    /// Remove a movie from favorites. Returns `false` when it was not there
    /// or on any store failure. Idempotent: a second remove is a no-op.
    pub async fn remove(&self, tmdb_id: i64) -> bool {
        match self.try_remove(tmdb_id).await {
            Ok(removed) => removed,
            Err(e) => {
                error!("Error removing movie {} from favorites: {:#}", tmdb_id, e);
                false
            }
        }
    }

    async fn try_remove(&self, tmdb_id: i64) -> Result<bool> {
        let Some(movie) = self.store.find_by_id(tmdb_id).await? else {
            info!("Movie {} not found in favorites", tmdb_id);
            return Ok(false);
        };
        self.store.delete(&movie).await?;
        info!("Removed movie '{}' from favorites", movie.title);
        Ok(true)
    }

    /// Pure existence check; store errors read as "not a favorite".
    pub async fn is_favorite(&self, tmdb_id: i64) -> bool {
        match self.store.exists(tmdb_id).await {
            Ok(found) => found,
            Err(e) => {
                error!("Error checking favorite status for {}: {:#}", tmdb_id, e);
                false
            }
        }
    }

    pub async fn toggle(&self, tmdb_id: i64) -> ToggleOutcome {
        if self.is_favorite(tmdb_id).await {
            if self.remove(tmdb_id).await {
                ToggleOutcome::Removed
            } else {
                ToggleOutcome::Error
            }
        } else if self.add(tmdb_id).await {
            ToggleOutcome::Added
        } else {
            ToggleOutcome::Error
        }
    }

    /// Resolve the favorites listing. A non-blank search term wins over the
    /// sort selector; the total always reflects the whole collection.
    pub async fn page(&self, sort: SortBy, search: Option<&str>) -> FavoritesPage {
        let movies = match search.map(str::trim).filter(|s| !s.is_empty()) {
            Some(term) => self.store.search_by_title(term).await,
            None => match sort {
                SortBy::Date => self.store.all_by_release_date_desc().await,
                SortBy::Rating => self.store.all_by_rating_desc().await,
            },
        };
        let movies = movies.unwrap_or_else(|e| {
            error!("Error loading favorites: {:#}", e);
            Vec::new()
        });
        let total = self.store.count().await.unwrap_or_else(|e| {
            error!("Error counting favorites: {:#}", e);
            0
        });
        FavoritesPage { movies, total }
    }

    pub async fn top_rated(&self, min_rating: f64) -> Vec<FavoriteMovie> {
        self.store
            .all_with_min_rating(min_rating)
            .await
            .unwrap_or_else(|e| {
                error!("Error loading top rated favorites: {:#}", e);
                Vec::new()
            })
    }
}
