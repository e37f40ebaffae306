use crate::api::Article;
use crate::time::now_unix;

#[derive(Debug, Clone, PartialEq)]
pub struct StorableArticle {
    pub id: u64,
    pub title: String,
    pub description: Option<String>,
    pub extract: String,
    pub url: String,
    pub views: Option<u64>,
    pub edited_at: Option<i64>,
    pub fetched_at: u64,
    pub seen_at: Option<u64>,
}

impl From<&Article> for StorableArticle {
    fn from(article: &Article) -> Self {
        StorableArticle {
            id: article.id,
            title: article.title.clone(),
            description: article.description.clone(),
            extract: article.extract.clone(),
            url: article.url.clone(),
            views: article.views,
            edited_at: article.edited_at,
            fetched_at: now_unix(),
            seen_at: None,
        }
    }
}

impl From<StorableArticle> for Article {
    fn from(stored: StorableArticle) -> Self {
        Article {
            id: stored.id,
            title: stored.title,
            description: stored.description,
            extract: stored.extract,
            url: stored.url,
            views: stored.views,
            edited_at: stored.edited_at,
        }
    }
}
