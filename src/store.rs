use crate::models::FavoriteMovie;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Column list for the `favorite_movies` table.
const COLUMNS: &str = "tmdb_id, title, overview, poster_path, backdrop_path, \
    release_date, vote_average, vote_count, language, original_title, adult, popularity";

// tmdb_id is declared BIGINT (not INTEGER) on purpose: that keeps the
// implicit rowid, whose allocation order records insertion order and breaks
// sort ties deterministically.
const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS favorite_movies (
    tmdb_id BIGINT PRIMARY KEY,
    title TEXT NOT NULL,
    overview TEXT,
    poster_path TEXT,
    backdrop_path TEXT,
    release_date DATE,
    vote_average DOUBLE,
    vote_count BIGINT,
    language TEXT,
    original_title TEXT,
    adult BOOLEAN,
    popularity DOUBLE
)";

/// Durable favorites collection, keyed by TMDB id. `insert` is the last line
/// of defense against duplicates: the primary key rejects a second row even
/// when two adds race past their `exists` prechecks.
#[async_trait]
pub trait FavoritesStore: Send + Sync {
    async fn exists(&self, tmdb_id: i64) -> Result<bool>;
    async fn insert(&self, movie: &FavoriteMovie) -> Result<()>;
    async fn find_by_id(&self, tmdb_id: i64) -> Result<Option<FavoriteMovie>>;
    async fn delete(&self, movie: &FavoriteMovie) -> Result<()>;
    async fn all_by_rating_desc(&self) -> Result<Vec<FavoriteMovie>>;
    async fn all_by_release_date_desc(&self) -> Result<Vec<FavoriteMovie>>;
    async fn search_by_title(&self, term: &str) -> Result<Vec<FavoriteMovie>>;
    async fn all_with_min_rating(&self, min_rating: f64) -> Result<Vec<FavoriteMovie>>;
    async fn count(&self) -> Result<i64>;
}

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the favorites database and bootstrap the
    /// schema.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .context("invalid DATABASE_URL")?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("failed to open favorites database")?;
        sqlx::query(SCHEMA)
            .execute(&pool)
            .await
            .context("failed to create favorite_movies table")?;
        Ok(Self { pool })
    }

    /// A throwaway in-memory store. One connection only; a pool would hand
    /// each connection its own private memory database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .context("failed to open in-memory database")?;
        sqlx::query(SCHEMA)
            .execute(&pool)
            .await
            .context("failed to create favorite_movies table")?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl FavoritesStore for SqliteStore {
    async fn exists(&self, tmdb_id: i64) -> Result<bool> {
        let found: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM favorite_movies WHERE tmdb_id = ?)")
                .bind(tmdb_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(found)
    }

    async fn insert(&self, movie: &FavoriteMovie) -> Result<()> {
        let query = format!(
            "INSERT INTO favorite_movies ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        );
        sqlx::query(&query)
            .bind(movie.tmdb_id)
            .bind(&movie.title)
            .bind(&movie.overview)
            .bind(&movie.poster_path)
            .bind(&movie.backdrop_path)
            .bind(movie.release_date)
            .bind(movie.vote_average)
            .bind(movie.vote_count)
            .bind(&movie.language)
            .bind(&movie.original_title)
            .bind(movie.adult)
            .bind(movie.popularity)
            .execute(&self.pool)
            .await
            .context("insert rejected")?;
        Ok(())
    }

    async fn find_by_id(&self, tmdb_id: i64) -> Result<Option<FavoriteMovie>> {
        let query = format!("SELECT {COLUMNS} FROM favorite_movies WHERE tmdb_id = ?");
        let movie = sqlx::query_as::<_, FavoriteMovie>(&query)
            .bind(tmdb_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(movie)
    }

    async fn delete(&self, movie: &FavoriteMovie) -> Result<()> {
        sqlx::query("DELETE FROM favorite_movies WHERE tmdb_id = ?")
            .bind(movie.tmdb_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn all_by_rating_desc(&self) -> Result<Vec<FavoriteMovie>> {
        let query = format!(
            "SELECT {COLUMNS} FROM favorite_movies ORDER BY vote_average DESC, rowid ASC"
        );
        let movies = sqlx::query_as::<_, FavoriteMovie>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(movies)
    }

    async fn all_by_release_date_desc(&self) -> Result<Vec<FavoriteMovie>> {
        // SQLite sorts NULL below every value, so DESC puts undated rows last.
        let query = format!(
            "SELECT {COLUMNS} FROM favorite_movies ORDER BY release_date DESC, rowid ASC"
        );
        let movies = sqlx::query_as::<_, FavoriteMovie>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(movies)
    }

    async fn search_by_title(&self, term: &str) -> Result<Vec<FavoriteMovie>> {
        let query = format!(
            "SELECT {COLUMNS} FROM favorite_movies \
             WHERE lower(title) LIKE '%' || lower(?) || '%'"
        );
        let movies = sqlx::query_as::<_, FavoriteMovie>(&query)
            .bind(term)
            .fetch_all(&self.pool)
            .await?;
        Ok(movies)
    }

    async fn all_with_min_rating(&self, min_rating: f64) -> Result<Vec<FavoriteMovie>> {
        let query = format!(
            "SELECT {COLUMNS} FROM favorite_movies \
             WHERE vote_average >= ? ORDER BY vote_average DESC, rowid ASC"
        );
        let movies = sqlx::query_as::<_, FavoriteMovie>(&query)
            .bind(min_rating)
            .fetch_all(&self.pool)
            .await?;
        Ok(movies)
    }

    async fn count(&self) -> Result<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM favorite_movies")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }
}
