use chrono::NaiveDate;
use serde::Serialize;

/// One movie as returned by the TMDB catalog. Everything except `id` and
/// `title` is optional; list endpoints routinely omit fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieSummary {
    pub id: i64,
    pub title: String,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i64>,
    pub original_language: Option<String>,
    pub original_title: Option<String>,
    pub adult: Option<bool>,
    pub popularity: Option<f64>,
    pub genre_ids: Vec<i64>,
    pub video: Option<bool>,
}

/// A favorited movie as persisted in the local table, keyed by the TMDB id.
///
/// This is a snapshot taken at add-time: it is never refreshed from the
/// catalog afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct FavoriteMovie {
    pub tmdb_id: i64,
    pub title: String,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i64>,
    pub language: Option<String>,
    pub original_title: Option<String>,
    pub adult: Option<bool>,
    pub popularity: Option<f64>,
}

impl FavoriteMovie {
    /// Copy the catalog-keyed fields out of a summary. Genre ids and the
    /// video flag are listing decoration and are not persisted.
    pub fn snapshot_of(summary: &MovieSummary) -> Self {
        Self {
            tmdb_id: summary.id,
            title: summary.title.clone(),
            overview: summary.overview.clone(),
            poster_path: summary.poster_path.clone(),
            backdrop_path: summary.backdrop_path.clone(),
            release_date: summary.release_date,
            vote_average: summary.vote_average,
            vote_count: summary.vote_count,
            language: summary.original_language.clone(),
            original_title: summary.original_title.clone(),
            adult: summary.adult,
            popularity: summary.popularity,
        }
    }
}
