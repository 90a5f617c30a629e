use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::CatalogError;
use crate::models::{
    select_trailer, MovieDetail, MovieId, MovieImages, MovieSummary, Page, Trailer, Video,
};

pub const TMDB_BASE: &str = "https://api.themoviedb.org/3";
const DETAIL_APPENDS: &str = "credits,videos,similar,reviews";

/// Read-only access to the movie catalog.
///
/// List lookups report failures so the list view can show its error state.
/// Single-movie lookups fail soft: any failure is logged and collapses to
/// `None`, which callers treat as "not found or unavailable".
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn fetch_popular(&self) -> Result<Vec<MovieSummary>, CatalogError>;
    async fn search(&self, query: &str) -> Result<Vec<MovieSummary>, CatalogError>;
    async fn fetch_details(&self, id: MovieId) -> Option<MovieDetail>;
    async fn fetch_trailer(&self, id: MovieId) -> Option<Trailer>;
    async fn fetch_images(&self, id: MovieId) -> Option<MovieImages>;
}

#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl CatalogClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.catalog_base_url.clone(), config.api_key.clone())
    }

    pub async fn try_fetch_details(&self, id: MovieId) -> Result<MovieDetail, CatalogError> {
        self.get_json(
            &format!("/movie/{id}"),
            &[("append_to_response", DETAIL_APPENDS)],
        )
        .await
    }

    pub async fn try_fetch_videos(&self, id: MovieId) -> Result<Vec<Video>, CatalogError> {
        let page: Page<Video> = self.get_json(&format!("/movie/{id}/videos"), &[]).await?;
        Ok(page.results)
    }

    pub async fn try_fetch_images(&self, id: MovieId) -> Result<MovieImages, CatalogError> {
        self.get_json(&format!("/movie/{id}/images"), &[]).await
    }

    /// Builds the request URL. Parameter values are percent-encoded here and
    /// nowhere else; the key always goes first.
    fn url(&self, path: &str, params: &[(&str, &str)]) -> String {
        let mut url = format!(
            "{}{path}?api_key={}",
            self.base_url,
            urlencoding::encode(&self.api_key)
        );
        for (name, value) in params {
            url.push('&');
            url.push_str(name);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, CatalogError> {
        debug!(path = %path, "catalog request");
        let res = self.client.get(self.url(path, params)).send().await?;
        let status = res.status();
        let text = res.text().await?;
        if status == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            return Err(CatalogError::Service(format!("{path} -> {status}: {text}")));
        }
        serde_json::from_str(&text)
            .map_err(|e| CatalogError::Service(format!("{path}: unexpected payload: {e}")))
    }
}

#[async_trait]
impl CatalogApi for CatalogClient {
    async fn fetch_popular(&self) -> Result<Vec<MovieSummary>, CatalogError> {
        let page: Page<MovieSummary> = self.get_json("/movie/popular", &[]).await?;
        Ok(page.results)
    }

    async fn search(&self, query: &str) -> Result<Vec<MovieSummary>, CatalogError> {
        let page: Page<MovieSummary> = self.get_json("/search/movie", &[("query", query)]).await?;
        Ok(page.results)
    }

    async fn fetch_details(&self, id: MovieId) -> Option<MovieDetail> {
        match self.try_fetch_details(id).await {
            Ok(detail) => Some(detail),
            Err(e) => {
                warn!("Failed to fetch details for movie {}: {}", id, e);
                None
            }
        }
    }

    async fn fetch_trailer(&self, id: MovieId) -> Option<Trailer> {
        match self.try_fetch_videos(id).await {
            Ok(videos) => select_trailer(&videos),
            Err(e) => {
                warn!("Failed to fetch trailer for movie {}: {}", id, e);
                None
            }
        }
    }

    async fn fetch_images(&self, id: MovieId) -> Option<MovieImages> {
        match self.try_fetch_images(id).await {
            Ok(images) => Some(images),
            Err(e) => {
                warn!("Failed to fetch images for movie {}: {}", id, e);
                None
            }
        }
    }
}
