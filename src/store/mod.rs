//! Keyed table interface over the relational store.
//!
//! The backend only ever needs simple per-row reads, appends, and one
//! upsert, so the whole storage layer is this trait. Handlers and jobs
//! depend on `dyn DataStore`; the in-memory implementation backs local runs
//! and tests, and a hosted-table client can slot in behind the same trait.

pub mod blob;
pub mod mem;

use async_trait::async_trait;

use crate::types::{Buddy, ChatMessage, MoodRecord, UserMemory};

pub use blob::{BlobStore, HttpBlobStore, MemBlobStore};
pub use mem::MemStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("table read failed: {0}")]
    Read(String),
    #[error("table write failed: {0}")]
    Write(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait DataStore: Send + Sync {
    // -- buddies -------------------------------------------------------

    async fn buddy(&self, buddy_id: &str) -> StoreResult<Option<Buddy>>;
    async fn buddies_for_user(&self, user_id: &str) -> StoreResult<Vec<Buddy>>;
    async fn insert_buddy(&self, buddy: Buddy) -> StoreResult<()>;
    /// Every user that owns at least one buddy. Drives the periodic jobs.
    async fn user_ids(&self) -> StoreResult<Vec<String>>;

    // -- chats (append-only) -------------------------------------------

    async fn append_chat(&self, message: ChatMessage) -> StoreResult<()>;
    /// Transcript ordered by creation time ascending. `buddy_id = None`
    /// returns the user's full cross-buddy transcript.
    async fn chat_history(
        &self,
        user_id: &str,
        buddy_id: Option<&str>,
    ) -> StoreResult<Vec<ChatMessage>>;
    async fn last_buddy_message(&self, user_id: &str) -> StoreResult<Option<ChatMessage>>;

    // -- mood history (append-only) ------------------------------------

    async fn append_mood(&self, record: MoodRecord) -> StoreResult<()>;
    /// Most recent `n` records, newest first.
    async fn recent_moods(&self, user_id: &str, n: usize) -> StoreResult<Vec<MoodRecord>>;
    /// Full mood history, oldest first.
    async fn mood_history(&self, user_id: &str) -> StoreResult<Vec<MoodRecord>>;

    // -- user memory (one row per user) --------------------------------

    async fn user_memory(&self, user_id: &str) -> StoreResult<Option<UserMemory>>;
    /// Overwrite semantics, keyed on user id. Never merges.
    async fn upsert_user_memory(&self, memory: UserMemory) -> StoreResult<()>;

    // -- turn counter --------------------------------------------------

    /// Bump the persisted count of user-sent messages and return the new
    /// value. Drives the summarization trigger.
    async fn bump_turn_count(&self, user_id: &str) -> StoreResult<u64>;
}
