use crate::config::TmdbConfig;
use crate::models::MovieSummary;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;
use tracing::{error, warn};

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    config: TmdbConfig,
}

/// Catalog boundary. Transport and decode failures never cross it: list
/// calls degrade to an empty list, `detail` to `None`.
#[async_trait]
pub trait TmdbApi: Send + Sync {
    async fn trending(&self) -> Vec<MovieSummary>;
    async fn popular(&self) -> Vec<MovieSummary>;
    async fn now_playing(&self) -> Vec<MovieSummary>;
    async fn search(&self, query: &str) -> Vec<MovieSummary>;
    async fn detail(&self, id: i64) -> Option<MovieSummary>;
}

impl TmdbClient {
    pub fn new(config: TmdbConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .context("request failed")?;
        let status = res.status();
        let text = res.text().await.context("reading body failed")?;
        if !status.is_success() {
            return Err(anyhow!("{} -> {}", url, text));
        }
        let parsed: Value = serde_json::from_str(&text).context("JSON parse failed")?;
        Ok(parsed)
    }

    async fn fetch_listing(&self, url: &str, what: &str) -> Vec<MovieSummary> {
        match self.get_json(url).await {
            Ok(body) => extract_results(&body),
            Err(e) => {
                error!("Error fetching {}: {:#}", what, e);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    async fn trending(&self) -> Vec<MovieSummary> {
        let url = format!(
            "{}/trending/movie/day?api_key={}",
            self.config.base_url, self.config.api_key
        );
        self.fetch_listing(&url, "trending movies").await
    }

    async fn popular(&self) -> Vec<MovieSummary> {
        let url = format!(
            "{}/movie/popular?api_key={}",
            self.config.base_url, self.config.api_key
        );
        self.fetch_listing(&url, "popular movies").await
    }

    async fn now_playing(&self) -> Vec<MovieSummary> {
        let url = format!(
            "{}/movie/now_playing?api_key={}",
            self.config.base_url, self.config.api_key
        );
        self.fetch_listing(&url, "now playing movies").await
    }

    async fn search(&self, query: &str) -> Vec<MovieSummary> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        let url = format!(
            "{}/search/movie?api_key={}&query={}&include_adult=false",
            self.config.base_url,
            self.config.api_key,
            urlencoding::encode(query)
        );
        self.fetch_listing(&url, "search results").await
    }

    async fn detail(&self, id: i64) -> Option<MovieSummary> {
        let url = format!(
            "{}/movie/{id}?api_key={}",
            self.config.base_url, self.config.api_key
        );
        match self.get_json(&url).await {
            Ok(body) => map_movie(&body),
            Err(e) => {
                error!("Error fetching movie details for ID {}: {:#}", id, e);
                None
            }
        }
    }
}

/// Pull the `results` list out of a wrapped TMDB response. A missing key is
/// an empty listing; a malformed item is skipped, never the whole list.
fn extract_results(body: &Value) -> Vec<MovieSummary> {
    let Some(results) = body.get("results").and_then(Value::as_array) else {
        return Vec::new();
    };
    results.iter().filter_map(map_movie).collect()
}

/// Map one raw movie object field by field. `id` and `title` are required;
/// every other field falls back to absent on its own.
fn map_movie(raw: &Value) -> Option<MovieSummary> {
    let (Some(id), Some(title)) = (int_field(raw, "id"), string_field(raw, "title")) else {
        warn!("Skipping catalog item without id/title");
        return None;
    };

    Some(MovieSummary {
        id,
        title,
        overview: string_field(raw, "overview"),
        poster_path: string_field(raw, "poster_path"),
        backdrop_path: string_field(raw, "backdrop_path"),
        release_date: date_field(raw, "release_date"),
        vote_average: float_field(raw, "vote_average"),
        vote_count: int_field(raw, "vote_count"),
        original_language: string_field(raw, "original_language"),
        original_title: string_field(raw, "original_title"),
        adult: bool_field(raw, "adult"),
        popularity: float_field(raw, "popularity"),
        genre_ids: int_list_field(raw, "genre_ids"),
        video: bool_field(raw, "video"),
    })
}

fn string_field(raw: &Value, key: &str) -> Option<String> {
    raw.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn int_field(raw: &Value, key: &str) -> Option<i64> {
    let value = raw.get(key)?;
    value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))
}

fn float_field(raw: &Value, key: &str) -> Option<f64> {
    raw.get(key).and_then(Value::as_f64)
}

fn bool_field(raw: &Value, key: &str) -> Option<bool> {
    raw.get(key).and_then(Value::as_bool)
}

fn int_list_field(raw: &Value, key: &str) -> Vec<i64> {
    raw.get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default()
}

fn date_field(raw: &Value, key: &str) -> Option<NaiveDate> {
    let text = raw
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())?;
    match NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            warn!("Could not parse release date: {}", text);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TmdbConfig;
    use serde_json::json;

    fn dummy_config() -> TmdbConfig {
        TmdbConfig {
            api_key: "test-key".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            image_base_url: "http://images.invalid".to_string(),
        }
    }

    #[test]
    fn maps_complete_item() {
        let raw = json!({
            "id": 42,
            "title": "Dune",
            "overview": "Desert planet",
            "poster_path": "/dune.jpg",
            "backdrop_path": "/dune-wide.jpg",
            "release_date": "2021-10-22",
            "vote_average": 8.1,
            "vote_count": 9000,
            "original_language": "en",
            "original_title": "Dune",
            "adult": false,
            "popularity": 312.5,
            "genre_ids": [878, 12],
            "video": false
        });

        let movie = map_movie(&raw).expect("complete item must map");
        assert_eq!(movie.id, 42);
        assert_eq!(movie.title, "Dune");
        assert_eq!(movie.release_date, NaiveDate::from_ymd_opt(2021, 10, 22));
        assert_eq!(movie.vote_average, Some(8.1));
        assert_eq!(movie.genre_ids, vec![878, 12]);
    }

    #[test]
    fn missing_vote_average_leaves_rating_absent() {
        let raw = json!({ "id": 1, "title": "Quiet Film" });
        let movie = map_movie(&raw).expect("id and title are enough");
        assert_eq!(movie.vote_average, None);
        assert_eq!(movie.vote_count, None);
        assert_eq!(movie.overview, None);
    }

    #[test]
    fn unparseable_release_date_is_dropped_field_wise() {
        let raw = json!({ "id": 2, "title": "Undated", "release_date": "sometime-soon" });
        let movie = map_movie(&raw).expect("bad date must not kill the item");
        assert_eq!(movie.release_date, None);
    }

    #[test]
    fn numeric_fields_accept_any_json_number() {
        // vote_count arrives as a float, vote_average as an integer
        let raw = json!({ "id": 3, "title": "Loose Types", "vote_count": 120.0, "vote_average": 7 });
        let movie = map_movie(&raw).expect("numbers narrow to the target type");
        assert_eq!(movie.vote_count, Some(120));
        assert_eq!(movie.vote_average, Some(7.0));
    }

    #[test]
    fn item_without_title_is_skipped_but_rest_survive() {
        let body = json!({
            "page": 1,
            "results": [
                { "id": 10, "title": "Kept" },
                { "id": 11 },
                { "id": 12, "title": "Also Kept" }
            ]
        });

        let movies = extract_results(&body);
        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].title, "Kept");
        assert_eq!(movies[1].title, "Also Kept");
    }

    #[test]
    fn missing_results_key_yields_empty_list() {
        let body = json!({ "status_message": "Invalid API key" });
        assert!(extract_results(&body).is_empty());
    }

    #[tokio::test]
    async fn blank_search_query_returns_empty_without_network() {
        // base_url points at a closed port, so any attempted request would
        // fail; the short-circuit never gets that far.
        let client = TmdbClient::new(dummy_config());
        assert!(client.search("").await.is_empty());
        assert!(client.search("   ").await.is_empty());
    }
}
