//! In-memory store. Used by tests, and by the server when no database is
//! configured (contents are lost on exit).

use std::sync::Mutex;

use super::{CommentRow, FileRow, PostRow, Store, StoreError};

#[derive(Debug, Clone)]
struct StoredPost {
    pid: i64,
    fid: i64,
    topic: String,
    text: String,
    time: i64,
}

#[derive(Default)]
struct Tables {
    files: Vec<FileRow>,
    posts: Vec<StoredPost>,
    comments: Vec<CommentRow>,
}

impl Tables {
    fn join(&self, post: &StoredPost) -> Option<PostRow> {
        let file = self.files.iter().find(|f| f.fid == post.fid)?;
        Some(PostRow {
            pid: post.pid,
            fid: post.fid,
            ctype: file.ctype.clone(),
            topic: post.topic.clone(),
            text: post.text.clone(),
            time: post.time,
        })
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_tables<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
        // Poisoned only after a panic in another holder; rows stay valid.
        let mut tables = self.tables.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut tables)
    }
}

fn next_id(len: usize) -> i64 {
    i64::try_from(len).map_or(i64::MAX, |n| n + 1)
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn insert_file(&self, ctype: &str, name: &str, time: i64) -> Result<i64, StoreError> {
        Ok(self.with_tables(|t| {
            let fid = next_id(t.files.len());
            t.files.push(FileRow { fid, ctype: ctype.to_owned(), name: name.to_owned(), time });
            fid
        }))
    }

    async fn find_file(&self, fid: i64) -> Result<Option<FileRow>, StoreError> {
        Ok(self.with_tables(|t| t.files.iter().find(|f| f.fid == fid).cloned()))
    }

    async fn insert_post(&self, fid: i64, topic: &str, text: &str, time: i64) -> Result<i64, StoreError> {
        self.with_tables(|t| {
            if !t.files.iter().any(|f| f.fid == fid) {
                return Err(StoreError::UnknownFile(fid));
            }
            let pid = next_id(t.posts.len());
            t.posts.push(StoredPost { pid, fid, topic: topic.to_owned(), text: text.to_owned(), time });
            Ok(pid)
        })
    }

    async fn find_post(&self, pid: i64) -> Result<Option<PostRow>, StoreError> {
        Ok(self.with_tables(|t| t.posts.iter().find(|p| p.pid == pid).and_then(|p| t.join(p))))
    }

    async fn posts_by_topic(&self, topic: &str) -> Result<Vec<PostRow>, StoreError> {
        Ok(self.with_tables(|t| {
            t.posts
                .iter()
                .filter(|p| p.topic == topic)
                .filter_map(|p| t.join(p))
                .collect()
        }))
    }

    async fn insert_comment(&self, pid: i64, time: i64, text: &str) -> Result<i64, StoreError> {
        self.with_tables(|t| {
            if !t.posts.iter().any(|p| p.pid == pid) {
                return Err(StoreError::UnknownPost(pid));
            }
            let cid = next_id(t.comments.len());
            t.comments.push(CommentRow { cid, pid, time, text: text.to_owned() });
            Ok(cid)
        })
    }

    async fn comments_for_post(&self, pid: i64) -> Result<Vec<CommentRow>, StoreError> {
        Ok(self.with_tables(|t| t.comments.iter().filter(|c| c.pid == pid).cloned().collect()))
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
