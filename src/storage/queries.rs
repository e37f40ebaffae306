use std::collections::HashSet;

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::time::now_unix;

use super::StorageError;
use super::types::StorableArticle;

const ARTICLE_COLUMNS: &str =
    "id, title, description, extract, url, views, edited_at, fetched_at, seen_at";

fn article_from_row(row: &Row<'_>) -> rusqlite::Result<StorableArticle> {
    Ok(StorableArticle {
        id: row.get::<_, i64>(0)? as u64,
        title: row.get(1)?,
        description: row.get(2)?,
        extract: row.get(3)?,
        url: row.get(4)?,
        views: row.get::<_, Option<i64>>(5)?.map(|v| v as u64),
        edited_at: row.get(6)?,
        fetched_at: row.get::<_, i64>(7)? as u64,
        seen_at: row.get::<_, Option<i64>>(8)?.map(|t| t as u64),
    })
}

/// Upserts a batch in one transaction. An existing `seen_at` survives.
pub fn save_articles(
    conn: &mut Connection,
    articles: &[StorableArticle],
) -> Result<(), StorageError> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO articles (id, title, description, extract, url, views, edited_at, fetched_at, seen_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                extract = excluded.extract,
                url = excluded.url,
                views = excluded.views,
                edited_at = excluded.edited_at,
                fetched_at = excluded.fetched_at,
                seen_at = COALESCE(articles.seen_at, excluded.seen_at)",
        )?;
        for article in articles {
            stmt.execute(params![
                article.id as i64,
                article.title,
                article.description,
                article.extract,
                article.url,
                article.views.map(|v| v as i64),
                article.edited_at,
                article.fetched_at as i64,
                article.seen_at.map(|t| t as i64),
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

pub fn get_article(conn: &Connection, id: u64) -> Result<Option<StorableArticle>, StorageError> {
    let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?1");
    let article = conn
        .query_row(&sql, params![id as i64], article_from_row)
        .optional()?;
    Ok(article)
}

/// Records the first time an article became current. The row is inserted
/// when the article was not saved yet; an existing `seen_at` is kept.
pub fn mark_seen(conn: &Connection, article: &StorableArticle) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO articles (id, title, description, extract, url, views, edited_at, fetched_at, seen_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(id) DO UPDATE SET
            seen_at = COALESCE(articles.seen_at, excluded.seen_at)",
        params![
            article.id as i64,
            article.title,
            article.description,
            article.extract,
            article.url,
            article.views.map(|v| v as i64),
            article.edited_at,
            article.fetched_at as i64,
            article.seen_at.unwrap_or_else(now_unix) as i64,
        ],
    )?;
    Ok(())
}

pub fn seen_ids(conn: &Connection) -> Result<HashSet<u64>, StorageError> {
    let mut stmt = conn.prepare("SELECT id FROM articles WHERE seen_at IS NOT NULL")?;
    let ids = stmt
        .query_map([], |row| row.get::<_, i64>(0))?
        .map(|id| id.map(|id| id as u64))
        .collect::<Result<HashSet<_>, _>>()?;
    Ok(ids)
}
