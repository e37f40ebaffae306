mod db;
mod migrations;
mod queries;
mod types;

use std::collections::HashSet;
use std::io;
use std::path::PathBuf;

use rusqlite::Connection;
use tokio::sync::{mpsc, oneshot};

pub use types::StorableArticle;

use crate::api::Article;
use crate::time::now_unix;

pub enum StorageLocation {
    Path(PathBuf),
    #[cfg(test)]
    InMemory,
}

#[derive(Debug)]
pub enum StorageError {
    Sqlite(rusqlite::Error),
    Channel(String),
    Migration { version: i64, error: String },
    NoDbPathParent,
    IO(io::Error),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Sqlite(e) => write!(f, "Database error: {}", e),
            StorageError::Channel(msg) => write!(f, "Channel error: {}", msg),
            StorageError::Migration { version, error } => {
                write!(f, "Migration {} failed: {}", version, error)
            }
            StorageError::NoDbPathParent => write!(f, "db path did not have a parent dir"),
            StorageError::IO(e) => write!(f, "io: {e}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::Sqlite(e)
    }
}

impl<T> From<mpsc::error::SendError<T>> for StorageError {
    fn from(e: mpsc::error::SendError<T>) -> Self {
        StorageError::Channel(e.to_string())
    }
}

impl From<oneshot::error::RecvError> for StorageError {
    fn from(e: oneshot::error::RecvError) -> Self {
        StorageError::Channel(e.to_string())
    }
}

pub(crate) enum StorageCommand {
    SaveArticles {
        articles: Vec<StorableArticle>,
        reply: oneshot::Sender<Result<(), StorageError>>,
    },
    GetArticle {
        id: u64,
        reply: oneshot::Sender<Result<Option<StorableArticle>, StorageError>>,
    },
    MarkSeen {
        article: StorableArticle,
        reply: oneshot::Sender<Result<(), StorageError>>,
    },
    SeenIds {
        reply: oneshot::Sender<Result<HashSet<u64>, StorageError>>,
    },
}

/// Handle to the SQLite worker thread. Cheap to clone.
#[derive(Clone)]
pub struct Storage {
    cmd_tx: mpsc::Sender<StorageCommand>,
}

impl Storage {
    pub fn open(location: StorageLocation) -> Result<Self, StorageError> {
        let (cmd_tx, cmd_rx) = mpsc::channel(64);

        let conn = match location {
            StorageLocation::Path(path) => {
                let parent = path.parent().ok_or(StorageError::NoDbPathParent)?;
                if !parent.exists() {
                    std::fs::create_dir_all(parent).map_err(StorageError::IO)?;
                }
                Connection::open(&path)?
            }
            #[cfg(test)]
            StorageLocation::InMemory => Connection::open_in_memory()?,
        };

        migrations::run_migrations(&conn)?;
        std::thread::spawn(move || {
            db::run_worker(conn, cmd_rx);
        });

        Ok(Self { cmd_tx })
    }

    pub async fn save_articles(&self, articles: &[Article]) -> Result<(), StorageError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(StorageCommand::SaveArticles {
                articles: articles.iter().map(StorableArticle::from).collect(),
                reply: tx,
            })
            .await?;
        rx.await?
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub async fn get_article(&self, id: u64) -> Result<Option<StorableArticle>, StorageError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(StorageCommand::GetArticle { id, reply: tx })
            .await?;
        rx.await?
    }

    /// Marks an article seen, saving it first if needed, so the mark holds
    /// whichever of this and `save_articles` reaches the worker first.
    pub async fn mark_seen(&self, article: &Article) -> Result<(), StorageError> {
        let (tx, rx) = oneshot::channel();
        let mut article = StorableArticle::from(article);
        article.seen_at = Some(now_unix());
        self.cmd_tx
            .send(StorageCommand::MarkSeen { article, reply: tx })
            .await?;
        rx.await?
    }

    pub async fn seen_ids(&self) -> Result<HashSet<u64>, StorageError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx.send(StorageCommand::SeenIds { reply: tx }).await?;
        rx.await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ArticleBuilder;

    #[tokio::test]
    async fn test_article_round_trip() {
        let storage = Storage::open(StorageLocation::InMemory).unwrap();
        let article = ArticleBuilder::new()
            .id(123)
            .title("Ada Lovelace")
            .description("English mathematician")
            .views(4200)
            .build();

        storage.save_articles(&[article.clone()]).await.unwrap();

        let loaded = storage.get_article(123).await.unwrap().unwrap();
        assert_eq!(loaded.title, "Ada Lovelace");
        assert_eq!(loaded.description.as_deref(), Some("English mathematician"));
        assert_eq!(loaded.views, Some(4200));
        assert!(loaded.seen_at.is_none());
        assert_eq!(Article::from(loaded), article);
    }

    #[tokio::test]
    async fn test_nonexistent_article_returns_none() {
        let storage = Storage::open(StorageLocation::InMemory).unwrap();
        assert!(storage.get_article(999_999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mark_seen() {
        let storage = Storage::open(StorageLocation::InMemory).unwrap();
        let articles = vec![
            ArticleBuilder::new().id(1).build(),
            ArticleBuilder::new().id(2).build(),
        ];
        storage.save_articles(&articles).await.unwrap();
        assert!(storage.seen_ids().await.unwrap().is_empty());

        storage.mark_seen(&articles[1]).await.unwrap();

        assert_eq!(storage.seen_ids().await.unwrap(), HashSet::from([2]));
        let loaded = storage.get_article(2).await.unwrap().unwrap();
        assert!(loaded.seen_at.is_some());
    }

    #[tokio::test]
    async fn test_mark_seen_before_save_keeps_the_mark() {
        let storage = Storage::open(StorageLocation::InMemory).unwrap();
        let article = ArticleBuilder::new().id(7).title("Lake Baikal").build();

        storage.mark_seen(&article).await.unwrap();
        storage.save_articles(&[article]).await.unwrap();

        assert_eq!(storage.seen_ids().await.unwrap(), HashSet::from([7]));
        let loaded = storage.get_article(7).await.unwrap().unwrap();
        assert_eq!(loaded.title, "Lake Baikal");
        assert!(loaded.seen_at.is_some());
    }

    #[tokio::test]
    async fn test_mark_seen_twice_keeps_first_timestamp() {
        let storage = Storage::open(StorageLocation::InMemory).unwrap();
        let article = ArticleBuilder::new().id(8).build();
        storage.mark_seen(&article).await.unwrap();
        let first = storage.get_article(8).await.unwrap().unwrap().seen_at;

        let mut renamed = article.clone();
        renamed.title = "Renamed".to_string();
        storage.mark_seen(&renamed).await.unwrap();

        let loaded = storage.get_article(8).await.unwrap().unwrap();
        assert_eq!(loaded.seen_at, first);
        assert_eq!(loaded.title, "Test Article");
    }

    #[tokio::test]
    async fn test_save_preserves_seen_at() {
        let storage = Storage::open(StorageLocation::InMemory).unwrap();
        let original = ArticleBuilder::new().id(456).title("Original").build();
        storage.save_articles(&[original.clone()]).await.unwrap();
        storage.mark_seen(&original).await.unwrap();
        let seen_at = storage.get_article(456).await.unwrap().unwrap().seen_at;

        let updated = ArticleBuilder::new().id(456).title("Updated").views(10).build();
        storage.save_articles(&[updated]).await.unwrap();

        let loaded = storage.get_article(456).await.unwrap().unwrap();
        assert_eq!(loaded.title, "Updated");
        assert_eq!(loaded.views, Some(10));
        assert_eq!(loaded.seen_at, seen_at);
    }

    #[tokio::test]
    async fn test_open_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("wikiscroll.db");

        let storage = Storage::open(StorageLocation::Path(path.clone())).unwrap();
        storage
            .save_articles(&[ArticleBuilder::new().id(9).build()])
            .await
            .unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_usable_from_sync_code() {
        let storage = Storage::open(StorageLocation::InMemory).unwrap();
        let article = ArticleBuilder::new().id(5).build();
        tokio_test::block_on(async {
            storage.save_articles(&[article.clone()]).await.unwrap();
            storage.mark_seen(&article).await.unwrap();
        });

        let seen = tokio_test::block_on(storage.seen_ids()).unwrap();
        assert_eq!(seen, HashSet::from([5]));
    }
}
