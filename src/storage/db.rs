use rusqlite::Connection;
use tokio::sync::mpsc;
use tracing::debug;

use super::StorageCommand;
use super::queries;

pub fn run_worker(mut conn: Connection, mut cmd_rx: mpsc::Receiver<StorageCommand>) {
    while let Some(cmd) = cmd_rx.blocking_recv() {
        match cmd {
            StorageCommand::SaveArticles { articles, reply } => {
                let result = queries::save_articles(&mut conn, &articles);
                let _ = reply.send(result);
            }
            StorageCommand::GetArticle { id, reply } => {
                let result = queries::get_article(&conn, id);
                let _ = reply.send(result);
            }
            StorageCommand::MarkSeen { article, reply } => {
                let result = queries::mark_seen(&conn, &article);
                let _ = reply.send(result);
            }
            StorageCommand::SeenIds { reply } => {
                let result = queries::seen_ids(&conn);
                let _ = reply.send(result);
            }
        }
    }
    debug!("storage worker stopped");
}
