//! Storage seam for files, posts and comments.
//!
//! DESIGN
//! ======
//! Route and service code talks to `dyn Store`. `PgStore` is the production
//! backend (SQLx/Postgres); `MemoryStore` backs tests and runs the server
//! without a database. Ids are assigned by the store and start at 1.

pub mod memory;
pub mod pg;

pub use memory::MemoryStore;
pub use pg::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("unknown file: {0}")]
    UnknownFile(i64),
    #[error("unknown post: {0}")]
    UnknownPost(i64),
}

/// Row of the `files` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRow {
    pub fid: i64,
    /// Image subtype, also the file extension on disk (`png`, `jpeg`, ...).
    pub ctype: String,
    /// Client-side file name.
    pub name: String,
    pub time: i64,
}

/// A post joined with its file's content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRow {
    pub pid: i64,
    pub fid: i64,
    pub ctype: String,
    pub topic: String,
    pub text: String,
    pub time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRow {
    pub cid: i64,
    pub pid: i64,
    pub time: i64,
    pub text: String,
}

#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Record an accepted upload and return its file id.
    async fn insert_file(&self, ctype: &str, name: &str, time: i64) -> Result<i64, StoreError>;

    async fn find_file(&self, fid: i64) -> Result<Option<FileRow>, StoreError>;

    /// Create a post referencing an existing file and return its post id.
    async fn insert_post(&self, fid: i64, topic: &str, text: &str, time: i64) -> Result<i64, StoreError>;

    async fn find_post(&self, pid: i64) -> Result<Option<PostRow>, StoreError>;

    /// All posts with `topic`, oldest first.
    async fn posts_by_topic(&self, topic: &str) -> Result<Vec<PostRow>, StoreError>;

    /// Persist a comment on an existing post and return its comment id.
    async fn insert_comment(&self, pid: i64, time: i64, text: &str) -> Result<i64, StoreError>;

    /// All comments on a post, oldest first.
    async fn comments_for_post(&self, pid: i64) -> Result<Vec<CommentRow>, StoreError>;
}
