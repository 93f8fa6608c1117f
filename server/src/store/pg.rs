//! Postgres store.

use sqlx::PgPool;

use super::{CommentRow, FileRow, PostRow, Store, StoreError};

type PostTuple = (i64, i64, String, String, String, i64);

fn post_from_tuple((pid, fid, ctype, topic, text, time): PostTuple) -> PostRow {
    PostRow { pid, fid, ctype, topic, text, time }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl Store for PgStore {
    async fn insert_file(&self, ctype: &str, name: &str, time: i64) -> Result<i64, StoreError> {
        let fid = sqlx::query_scalar::<_, i64>(
            "INSERT INTO files (ctype, name, time) VALUES ($1, $2, $3) RETURNING fid",
        )
        .bind(ctype)
        .bind(name)
        .bind(time)
        .fetch_one(&self.pool)
        .await?;
        Ok(fid)
    }

    async fn find_file(&self, fid: i64) -> Result<Option<FileRow>, StoreError> {
        let row = sqlx::query_as::<_, (i64, String, String, i64)>(
            "SELECT fid, ctype, name, time FROM files WHERE fid = $1",
        )
        .bind(fid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(fid, ctype, name, time)| FileRow { fid, ctype, name, time }))
    }

    async fn insert_post(&self, fid: i64, topic: &str, text: &str, time: i64) -> Result<i64, StoreError> {
        let pid = sqlx::query_scalar::<_, i64>(
            "INSERT INTO posts (fid, topic, text, time) VALUES ($1, $2, $3, $4) RETURNING pid",
        )
        .bind(fid)
        .bind(topic)
        .bind(text)
        .bind(time)
        .fetch_one(&self.pool)
        .await?;
        Ok(pid)
    }

    async fn find_post(&self, pid: i64) -> Result<Option<PostRow>, StoreError> {
        let row = sqlx::query_as::<_, PostTuple>(
            "SELECT posts.pid, files.fid, files.ctype, posts.topic, posts.text, posts.time
             FROM posts JOIN files ON posts.fid = files.fid
             WHERE posts.pid = $1",
        )
        .bind(pid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(post_from_tuple))
    }

    async fn posts_by_topic(&self, topic: &str) -> Result<Vec<PostRow>, StoreError> {
        let rows = sqlx::query_as::<_, PostTuple>(
            "SELECT posts.pid, files.fid, files.ctype, posts.topic, posts.text, posts.time
             FROM posts JOIN files ON posts.fid = files.fid
             WHERE posts.topic = $1
             ORDER BY posts.pid ASC",
        )
        .bind(topic)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(post_from_tuple).collect())
    }

    async fn insert_comment(&self, pid: i64, time: i64, text: &str) -> Result<i64, StoreError> {
        let cid = sqlx::query_scalar::<_, i64>(
            "INSERT INTO comments (pid, time, text) VALUES ($1, $2, $3) RETURNING cid",
        )
        .bind(pid)
        .bind(time)
        .bind(text)
        .fetch_one(&self.pool)
        .await?;
        Ok(cid)
    }

    async fn comments_for_post(&self, pid: i64) -> Result<Vec<CommentRow>, StoreError> {
        let rows = sqlx::query_as::<_, (i64, i64, i64, String)>(
            "SELECT cid, pid, time, text FROM comments WHERE pid = $1 ORDER BY cid ASC",
        )
        .bind(pid)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(cid, pid, time, text)| CommentRow { cid, pid, time, text })
            .collect())
    }
}

#[cfg(test)]
#[path = "pg_test.rs"]
mod tests;
