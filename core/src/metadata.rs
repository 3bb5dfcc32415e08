pub mod models;

use async_trait::async_trait;
use log::debug;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;

use crate::error::{CoreError, CoreResult};
use crate::resolver::SourceResolver;
pub use models::{
    CastMember, ContentDetails, ContentSummary, Credits, Genre, MediaType, SearchResult, Video,
    parse_year,
};
use models::Page;

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Read access to the metadata provider - allows for mocking in tests
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Titles trending today
    async fn trending(&self, kind: MediaType) -> CoreResult<Vec<ContentSummary>>;

    async fn popular_movies(&self) -> CoreResult<Vec<ContentSummary>>;

    async fn top_rated_movies(&self) -> CoreResult<Vec<ContentSummary>>;

    /// Movies and shows matching `query`; people are filtered out
    async fn search(&self, query: &str) -> CoreResult<Vec<ContentSummary>>;

    /// Details of one title with its videos
    async fn details(&self, kind: MediaType, id: u64) -> CoreResult<ContentDetails>;

    async fn similar(&self, kind: MediaType, id: u64) -> CoreResult<Vec<ContentSummary>>;

    async fn credits(&self, kind: MediaType, id: u64) -> CoreResult<Credits>;
}

/// TMDB v3 client
pub struct TmdbClient {
    http: HttpClient,
    api_key: String,
    base_url: String,
}

impl TmdbClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: HttpClient::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the client at another API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> CoreResult<T> {
        let url = format!("{}/{}", self.base_url, path);
        debug!("GET {} {:?}", url, params);

        let response = self
            .http
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CoreError::Metadata(format!(
                "{} returned status {}: {}",
                path, status, body
            )));
        }

        Ok(response.json().await?)
    }

    async fn listing(&self, path: &str, params: &[(&str, &str)]) -> CoreResult<Vec<ContentSummary>> {
        let page: Page<ContentSummary> = self.get(path, params).await?;
        Ok(page.results)
    }
}

#[async_trait]
impl MetadataSource for TmdbClient {
    async fn trending(&self, kind: MediaType) -> CoreResult<Vec<ContentSummary>> {
        self.listing(&format!("trending/{}/day", kind.as_path()), &[]).await
    }

    async fn popular_movies(&self) -> CoreResult<Vec<ContentSummary>> {
        self.listing("movie/popular", &[]).await
    }

    async fn top_rated_movies(&self) -> CoreResult<Vec<ContentSummary>> {
        self.listing("movie/top_rated", &[]).await
    }

    async fn search(&self, query: &str) -> CoreResult<Vec<ContentSummary>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let results = self
            .listing("search/multi", &[("query", query), ("include_adult", "false")])
            .await?;
        Ok(retain_titles(results))
    }

    async fn details(&self, kind: MediaType, id: u64) -> CoreResult<ContentDetails> {
        let path = format!("{}/{}", kind.as_path(), id);
        let mut details: ContentDetails = self.get(&path, &[("append_to_response", "videos")]).await?;
        // Detail records never carry media_type
        details.summary.media_type.get_or_insert(kind);
        Ok(details)
    }

    async fn similar(&self, kind: MediaType, id: u64) -> CoreResult<Vec<ContentSummary>> {
        self.listing(&format!("{}/{}/similar", kind.as_path(), id), &[]).await
    }

    async fn credits(&self, kind: MediaType, id: u64) -> CoreResult<Credits> {
        self.get(&format!("{}/{}/credits", kind.as_path(), id), &[]).await
    }
}

/// Keep movies and shows, dropping people and anything else
pub fn retain_titles(results: Vec<ContentSummary>) -> Vec<ContentSummary> {
    results
        .into_iter()
        .filter(|item| item.media_type.map(|t| t.is_title()).unwrap_or(true))
        .collect()
}

/// Mark which search hits have a full asset in the catalog.
///
/// Only movies can resolve; shows are always unavailable.
pub fn annotate_availability(results: Vec<ContentSummary>, resolver: &SourceResolver) -> Vec<SearchResult> {
    results
        .into_iter()
        .map(|item| {
            let streaming_available = item.kind() == MediaType::Movie
                && resolver
                    .resolve(item.display_title(), item.release_year(), Some(item.id))
                    .matched;
            SearchResult {
                item,
                streaming_available,
            }
        })
        .collect()
}
