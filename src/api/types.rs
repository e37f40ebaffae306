use serde::{Deserialize, Serialize};

use crate::viewport::{FeedItem, MarkerKey};

/// Page summary as returned by `/page/random/summary` and inside the
/// featured feed's most-read list.
#[derive(Debug, Clone, Deserialize)]
pub struct PageSummary {
    pub pageid: Option<u64>,
    pub title: String,
    pub displaytitle: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub extract: String,
    /// ISO 8601 time of the last edit.
    pub timestamp: Option<String>,
    /// Only present in most-read lists.
    pub views: Option<u64>,
    pub content_urls: Option<ContentUrls>,
    #[serde(rename = "type")]
    pub page_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentUrls {
    pub desktop: Option<PageUrl>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageUrl {
    pub page: String,
}

/// Response for `/feed/featured/{yyyy}/{mm}/{dd}`. Only the most-read
/// section is used.
#[derive(Debug, Clone, Deserialize)]
pub struct FeaturedFeed {
    pub mostread: Option<MostRead>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MostRead {
    #[serde(default)]
    pub articles: Vec<PageSummary>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub id: u64,
    pub title: String,
    pub description: Option<String>,
    pub extract: String,
    pub url: String,
    pub views: Option<u64>,
    /// Unix seconds of the last edit.
    pub edited_at: Option<i64>,
}

impl Article {
    /// Disambiguation pages and summaries without a page id are skipped.
    pub fn from_summary(summary: PageSummary) -> Option<Self> {
        if summary.page_type.as_deref() == Some("disambiguation") {
            return None;
        }
        let id = summary.pageid?;
        let title = summary
            .displaytitle
            .as_deref()
            .map(strip_tags)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| summary.title.clone());
        let url = summary
            .content_urls
            .and_then(|urls| urls.desktop)
            .map(|desktop| desktop.page)
            .unwrap_or_else(|| wiki_url(&summary.title));
        let edited_at = summary
            .timestamp
            .as_deref()
            .and_then(|ts| chrono::DateTime::parse_from_rfc3339(ts).ok())
            .map(|dt| dt.timestamp());

        Some(Article {
            id,
            title,
            description: summary.description.filter(|d| !d.is_empty()),
            extract: summary.extract.trim().to_string(),
            url,
            views: summary.views,
            edited_at,
        })
    }
}

impl FeedItem for Article {
    fn marker_key(&self) -> MarkerKey {
        MarkerKey(self.id)
    }
}

/// Fallback article URL built from the canonical title.
pub fn wiki_url(title: &str) -> String {
    format!("https://en.wikipedia.org/wiki/{}", title.replace(' ', "_"))
}

/// Removes markup from a display title and decodes entities.
pub fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    html_escape::decode_html_entities(text.trim()).to_string()
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Feed {
    #[default]
    Random,
    Trending,
}

impl Feed {
    pub fn label(&self) -> &'static str {
        match self {
            Feed::Random => "Random",
            Feed::Trending => "Trending",
        }
    }

    pub fn all() -> &'static [Feed] {
        &[Feed::Random, Feed::Trending]
    }

    pub fn next(self) -> Feed {
        let feeds = Feed::all();
        let idx = feeds.iter().position(|&f| f == self).unwrap_or(0);
        feeds[(idx + 1) % feeds.len()]
    }
}

/// One fetched page of articles.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub articles: Vec<Article>,
    pub has_more: bool,
}
