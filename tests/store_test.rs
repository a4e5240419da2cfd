use chrono::{Duration, Utc};
use novabud::mood::Mood;
use novabud::store::{DataStore, MemStore};
use novabud::types::{Buddy, ChatMessage, MoodRecord, Sender, UserMemory};

fn buddy(id: &str, user_id: &str) -> Buddy {
    Buddy {
        id: id.into(),
        user_id: user_id.into(),
        name: "Nova".into(),
        gender: "female".into(),
        ethnicity: "latina".into(),
        hair: "curly".into(),
        style: "streetwear".into(),
        eye_color: "brown".into(),
        skin_tone: "tan".into(),
        features: None,
        personality_tags: vec![],
        interests: vec![],
        music_genres: vec![],
        movie_genres: vec![],
        avatar_url: String::new(),
        intro_message: String::new(),
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn chat_history_is_ordered_and_scoped() {
    let store = MemStore::new();

    let mut first = ChatMessage::text("user-1", "buddy-a", Sender::User, "first");
    first.created_at = Utc::now() - Duration::seconds(10);
    let second = ChatMessage::text("user-1", "buddy-a", Sender::Buddy, "second");
    let other_buddy = ChatMessage::text("user-1", "buddy-b", Sender::User, "elsewhere");
    let other_user = ChatMessage::text("user-2", "buddy-a", Sender::User, "not mine");

    // Insert out of order; reads sort by created_at.
    store.append_chat(second.clone()).await.unwrap();
    store.append_chat(first).await.unwrap();
    store.append_chat(other_buddy).await.unwrap();
    store.append_chat(other_user).await.unwrap();

    let scoped = store.chat_history("user-1", Some("buddy-a")).await.unwrap();
    assert_eq!(scoped.len(), 2);
    assert_eq!(scoped[0].message, "first");
    assert_eq!(scoped[1].message, "second");

    // Cross-buddy view picks up both buddies, never the other user.
    let all = store.chat_history("user-1", None).await.unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.iter().all(|m| m.user_id == "user-1"));
}

#[tokio::test]
async fn last_buddy_message_ignores_user_rows() {
    let store = MemStore::new();
    store
        .append_chat(ChatMessage::text("user-1", "buddy-a", Sender::Buddy, "from buddy"))
        .await
        .unwrap();
    store
        .append_chat(ChatMessage::text("user-1", "buddy-a", Sender::User, "from user"))
        .await
        .unwrap();

    let last = store.last_buddy_message("user-1").await.unwrap().unwrap();
    assert_eq!(last.message, "from buddy");
}

#[tokio::test]
async fn recent_moods_come_back_newest_first() {
    let store = MemStore::new();
    let base = Utc::now();

    for (i, mood) in [Mood::Happy, Mood::Sad, Mood::Calm].into_iter().enumerate() {
        store
            .append_mood(MoodRecord {
                user_id: "user-1".into(),
                mood,
                timestamp: base + Duration::seconds(i as i64),
            })
            .await
            .unwrap();
    }

    let recent = store.recent_moods("user-1", 2).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].mood, Mood::Calm);
    assert_eq!(recent[1].mood, Mood::Sad);
}

#[tokio::test]
async fn user_memory_upsert_overwrites_single_row() {
    let store = MemStore::new();
    let first_write = UserMemory {
        user_id: "user-1".into(),
        facts: vec!["User has a cat".into()],
        last_updated: Utc::now() - Duration::minutes(5),
    };
    store.upsert_user_memory(first_write).await.unwrap();

    let second_write = UserMemory {
        user_id: "user-1".into(),
        facts: vec!["User plays guitar".into()],
        last_updated: Utc::now(),
    };
    store.upsert_user_memory(second_write).await.unwrap();

    // Overwrite, not merge: the old fact is gone.
    let row = store.user_memory("user-1").await.unwrap().unwrap();
    assert_eq!(row.facts, vec!["User plays guitar".to_string()]);
}

#[tokio::test]
async fn turn_counter_increments_per_user() {
    let store = MemStore::new();
    assert_eq!(store.bump_turn_count("user-1").await.unwrap(), 1);
    assert_eq!(store.bump_turn_count("user-1").await.unwrap(), 2);
    assert_eq!(store.bump_turn_count("user-2").await.unwrap(), 1);
}

#[tokio::test]
async fn user_ids_lists_buddy_owners_once() {
    let store = MemStore::new();
    store.insert_buddy(buddy("buddy-a", "user-1")).await.unwrap();
    store.insert_buddy(buddy("buddy-b", "user-1")).await.unwrap();
    store.insert_buddy(buddy("buddy-c", "user-2")).await.unwrap();

    let ids = store.user_ids().await.unwrap();
    assert_eq!(ids, vec!["user-1".to_string(), "user-2".to_string()]);
}

#[tokio::test]
async fn buddy_lookup_by_id_and_owner() {
    let store = MemStore::new();
    store.insert_buddy(buddy("buddy-a", "user-1")).await.unwrap();

    assert!(store.buddy("buddy-a").await.unwrap().is_some());
    assert!(store.buddy("missing").await.unwrap().is_none());

    let owned = store.buddies_for_user("user-1").await.unwrap();
    assert_eq!(owned.len(), 1);
    assert!(store.buddies_for_user("user-2").await.unwrap().is_empty());
}
