use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Datelike, Days, NaiveDate};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::error::ApiError;
use super::types::{Article, FeaturedFeed, Feed, Page, PageSummary};

pub const API_BASE: &str = "https://en.wikipedia.org/api/rest_v1";
const USER_AGENT: &str = concat!(
    "wikiscroll/",
    env!("CARGO_PKG_VERSION"),
    " (terminal reader; https://github.com/wikiscroll/wikiscroll)"
);
const CACHE_TTL: Duration = Duration::from_secs(300);
const CACHE_CAPACITY: usize = 32;
/// Random summaries requested per page.
pub const PAGE_SIZE: usize = 10;
/// How many days back the trending feed reaches.
pub const MAX_TRENDING_DAYS: usize = 14;

struct CacheEntry<T> {
    data: T,
    fetched_at: Instant,
}

impl<T> CacheEntry<T> {
    fn is_fresh(&self) -> bool {
        self.fetched_at.elapsed() < CACHE_TTL
    }
}

pub struct WikiClient {
    http: reqwest::Client,
    base_url: String,
    featured_cache: Arc<RwLock<HashMap<NaiveDate, CacheEntry<Vec<Article>>>>>,
}

impl WikiClient {
    pub fn new() -> Self {
        Self::with_base_url(API_BASE)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "falling back to default http client");
                reqwest::Client::new()
            });
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            featured_cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn clear_cache(&self) {
        self.featured_cache.write().await.clear();
    }

    /// Fetches page `page` of `feed`. Articles whose id is in `exclude` are
    /// left out.
    pub async fn fetch_page(
        &self,
        feed: Feed,
        page: usize,
        today: NaiveDate,
        exclude: &HashSet<u64>,
    ) -> Result<Page, ApiError> {
        let articles = match feed {
            Feed::Random => self.fetch_random().await?,
            Feed::Trending => {
                if page >= MAX_TRENDING_DAYS {
                    return Ok(Page::default());
                }
                let Some(day) = today.checked_sub_days(Days::new(page as u64 + 1)) else {
                    return Ok(Page::default());
                };
                self.fetch_most_read(day).await?
            }
        };

        let mut seen = exclude.clone();
        let articles: Vec<Article> = articles
            .into_iter()
            .filter(|article| seen.insert(article.id))
            .collect();
        let has_more = match feed {
            Feed::Random => true,
            Feed::Trending => page + 1 < MAX_TRENDING_DAYS,
        };
        debug!(?feed, page, count = articles.len(), has_more, "fetched page");
        Ok(Page { articles, has_more })
    }

    async fn fetch_random(&self) -> Result<Vec<Article>, ApiError> {
        let futures: Vec<_> = (0..PAGE_SIZE).map(|_| self.fetch_random_summary()).collect();
        let results = futures::future::join_all(futures).await;

        let mut articles = Vec::with_capacity(results.len());
        let mut first_error = None;
        for result in results {
            match result {
                Ok(summary) => articles.extend(Article::from_summary(summary)),
                Err(err) => {
                    debug!(error = %err, "random summary failed");
                    first_error.get_or_insert(err);
                }
            }
        }
        match first_error {
            Some(err) if articles.is_empty() => Err(err),
            _ => Ok(articles),
        }
    }

    async fn fetch_random_summary(&self) -> Result<PageSummary, ApiError> {
        let url = format!("{}/page/random/summary", self.base_url);
        let summary = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(summary)
    }

    /// Most-read articles for `day`. A day the feed has not been published
    /// for yields no articles.
    async fn fetch_most_read(&self, day: NaiveDate) -> Result<Vec<Article>, ApiError> {
        {
            let cache = self.featured_cache.read().await;
            if let Some(entry) = cache.get(&day)
                && entry.is_fresh()
            {
                return Ok(entry.data.clone());
            }
        }

        let url = format!(
            "{}/feed/featured/{:04}/{:02}/{:02}",
            self.base_url,
            day.year(),
            day.month(),
            day.day()
        );
        let response = self.http.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(%day, "no featured feed");
            return Ok(Vec::new());
        }
        let feed: FeaturedFeed = response.error_for_status()?.json().await?;
        let articles: Vec<Article> = feed
            .mostread
            .map(|most_read| most_read.articles)
            .unwrap_or_default()
            .into_iter()
            .filter_map(Article::from_summary)
            .collect();

        {
            let mut cache = self.featured_cache.write().await;
            if cache.len() >= CACHE_CAPACITY && !cache.contains_key(&day) {
                let oldest = cache
                    .iter()
                    .min_by_key(|(_, entry)| entry.fetched_at)
                    .map(|(&key, _)| key);
                if let Some(oldest) = oldest {
                    cache.remove(&oldest);
                }
            }
            cache.insert(
                day,
                CacheEntry {
                    data: articles.clone(),
                    fetched_at: Instant::now(),
                },
            );
        }

        Ok(articles)
    }

    #[cfg(test)]
    async fn cached_days(&self) -> usize {
        self.featured_cache.read().await.len()
    }
}

impl Default for WikiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for WikiClient {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            featured_cache: Arc::clone(&self.featured_cache),
        }
    }
}
