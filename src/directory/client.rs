use crate::directory::cache::TtlCache;
use crate::directory::types::{RawLesson, SearchHit, TargetKind};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Search answers fast or not at all.
const SEARCH_TIMEOUT: Duration = Duration::from_secs(2);
/// Schedule payloads are larger; give the service more room.
const SCHEDULE_TIMEOUT: Duration = Duration::from_secs(10);
/// Group/teacher ids change rarely.
const SEARCH_TTL: Duration = Duration::from_secs(60 * 60);
/// Short enough to surface same-day schedule changes within minutes.
const SCHEDULE_TTL: Duration = Duration::from_secs(2 * 60);

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory request timed out")]
    Timeout,
    #[error("directory response failed validation: {0}")]
    MalformedResponse(String),
    #[error("directory transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for DirectoryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DirectoryError::Timeout
        } else if err.is_decode() {
            DirectoryError::MalformedResponse(err.to_string())
        } else {
            DirectoryError::Transport(err.to_string())
        }
    }
}

/// Remote directory/schedule service interface. Kept as a trait so the
/// conversation engine and the subscription broadcaster can run against
/// a mock in tests.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn search_groups(&self, term: &str) -> Result<Vec<SearchHit>, DirectoryError>;

    async fn search_teachers(&self, term: &str) -> Result<Vec<SearchHit>, DirectoryError>;

    async fn fetch_lessons(
        &self,
        target_id: &str,
        kind: TargetKind,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawLesson>, DirectoryError>;
}

/// HTTP client for the university RUZ directory, with per-operation TTL
/// caches keyed by the full argument tuple.
pub struct RuzClient {
    http: reqwest::Client,
    base_url: String,
    search_cache: TtlCache<Vec<SearchHit>>,
    lessons_cache: TtlCache<Vec<RawLesson>>,
}

impl RuzClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            search_cache: TtlCache::new(SEARCH_TTL),
            lessons_cache: TtlCache::new(SCHEDULE_TTL),
        }
    }

    async fn search(
        &self,
        term: &str,
        kind: TargetKind,
    ) -> Result<Vec<SearchHit>, DirectoryError> {
        let cache_key = format!("search:{}:{term}", kind.as_api_str());
        if let Some(hits) = self.search_cache.get(&cache_key).await {
            return Ok(hits);
        }

        let hits: Vec<SearchHit> = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(&[("term", term), ("type", kind.as_api_str())])
            .timeout(SEARCH_TIMEOUT)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| {
                warn!("malformed search response for {} {:?}: {e}", term, kind);
                DirectoryError::MalformedResponse(e.to_string())
            })?;

        // The service occasionally pads results with id-less entries;
        // group labels arrive in mixed case with stray whitespace.
        let hits: Vec<SearchHit> = hits
            .into_iter()
            .filter(|hit| !hit.id.is_empty())
            .map(|hit| SearchHit {
                label: match kind {
                    TargetKind::Group => hit.label.trim().to_uppercase(),
                    TargetKind::Lecturer => hit.label.trim().to_owned(),
                },
                ..hit
            })
            .collect();

        self.search_cache.insert(cache_key, hits.clone()).await;
        Ok(hits)
    }
}

#[async_trait]
impl Directory for RuzClient {
    async fn search_groups(&self, term: &str) -> Result<Vec<SearchHit>, DirectoryError> {
        self.search(term, TargetKind::Group).await
    }

    async fn search_teachers(&self, term: &str) -> Result<Vec<SearchHit>, DirectoryError> {
        self.search(term, TargetKind::Lecturer).await
    }

    async fn fetch_lessons(
        &self,
        target_id: &str,
        kind: TargetKind,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawLesson>, DirectoryError> {
        let start_str = start.format("%Y.%m.%d").to_string();
        let end_str = end.format("%Y.%m.%d").to_string();
        let cache_key = format!(
            "lessons:{}:{target_id}:{start_str}:{end_str}",
            kind.as_api_str()
        );
        if let Some(lessons) = self.lessons_cache.get(&cache_key).await {
            return Ok(lessons);
        }

        let lessons: Vec<RawLesson> = self
            .http
            .get(format!(
                "{}/schedule/{}/{target_id}",
                self.base_url,
                kind.as_api_str()
            ))
            .query(&[("start", start_str.as_str()), ("finish", end_str.as_str()), ("lng", "1")])
            .timeout(SCHEDULE_TIMEOUT)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| {
                warn!(
                    "malformed schedule response for {:?} id {}: {e}",
                    kind, target_id
                );
                DirectoryError::MalformedResponse(e.to_string())
            })?;

        self.lessons_cache.insert(cache_key, lessons.clone()).await;
        Ok(lessons)
    }
}
