use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{DataStore, StoreResult};
use crate::types::{Buddy, ChatMessage, MoodRecord, UserMemory};

/// In-memory tables behind one async RwLock. Serves local runs and tests;
/// per-call atomicity matches what the hosted tables give us per row.
#[derive(Default)]
pub struct MemStore {
    inner: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    buddies: Vec<Buddy>,
    chats: Vec<ChatMessage>,
    moods: Vec<MoodRecord>,
    memories: HashMap<String, UserMemory>,
    turn_counts: HashMap<String, u64>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DataStore for MemStore {
    async fn buddy(&self, buddy_id: &str) -> StoreResult<Option<Buddy>> {
        let tables = self.inner.read().await;
        Ok(tables.buddies.iter().find(|b| b.id == buddy_id).cloned())
    }

    async fn buddies_for_user(&self, user_id: &str) -> StoreResult<Vec<Buddy>> {
        let tables = self.inner.read().await;
        Ok(tables
            .buddies
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_buddy(&self, buddy: Buddy) -> StoreResult<()> {
        self.inner.write().await.buddies.push(buddy);
        Ok(())
    }

    async fn user_ids(&self) -> StoreResult<Vec<String>> {
        let tables = self.inner.read().await;
        let mut ids: Vec<String> = Vec::new();
        for buddy in &tables.buddies {
            if !ids.contains(&buddy.user_id) {
                ids.push(buddy.user_id.clone());
            }
        }
        Ok(ids)
    }

    async fn append_chat(&self, message: ChatMessage) -> StoreResult<()> {
        self.inner.write().await.chats.push(message);
        Ok(())
    }

    async fn chat_history(
        &self,
        user_id: &str,
        buddy_id: Option<&str>,
    ) -> StoreResult<Vec<ChatMessage>> {
        let tables = self.inner.read().await;
        let mut rows: Vec<ChatMessage> = tables
            .chats
            .iter()
            .filter(|m| m.user_id == user_id)
            .filter(|m| buddy_id.is_none_or(|id| m.buddy_id == id))
            .cloned()
            .collect();
        rows.sort_by_key(|m| m.created_at);
        Ok(rows)
    }

    async fn last_buddy_message(&self, user_id: &str) -> StoreResult<Option<ChatMessage>> {
        let tables = self.inner.read().await;
        Ok(tables
            .chats
            .iter()
            .filter(|m| m.user_id == user_id && m.sender == crate::types::Sender::Buddy)
            .max_by_key(|m| m.created_at)
            .cloned())
    }

    async fn append_mood(&self, record: MoodRecord) -> StoreResult<()> {
        self.inner.write().await.moods.push(record);
        Ok(())
    }

    async fn recent_moods(&self, user_id: &str, n: usize) -> StoreResult<Vec<MoodRecord>> {
        let tables = self.inner.read().await;
        let mut rows: Vec<MoodRecord> = tables
            .moods
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| std::cmp::Reverse(r.timestamp));
        rows.truncate(n);
        Ok(rows)
    }

    async fn mood_history(&self, user_id: &str) -> StoreResult<Vec<MoodRecord>> {
        let tables = self.inner.read().await;
        let mut rows: Vec<MoodRecord> = tables
            .moods
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.timestamp);
        Ok(rows)
    }

    async fn user_memory(&self, user_id: &str) -> StoreResult<Option<UserMemory>> {
        let tables = self.inner.read().await;
        Ok(tables.memories.get(user_id).cloned())
    }

    async fn upsert_user_memory(&self, memory: UserMemory) -> StoreResult<()> {
        self.inner
            .write()
            .await
            .memories
            .insert(memory.user_id.clone(), memory);
        Ok(())
    }

    async fn bump_turn_count(&self, user_id: &str) -> StoreResult<u64> {
        let mut tables = self.inner.write().await;
        let count = tables.turn_counts.entry(user_id.to_string()).or_insert(0);
        *count += 1;
        Ok(*count)
    }
}
