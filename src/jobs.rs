//! Periodic background jobs: proactive check-ins and mood-based reminders.
//! Both iterate all users with a buddy; a failure for one user is logged
//! and the rest of the batch continues.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::JobsConfig;
use crate::mood::{Mood, dominant_mood};
use crate::provider::ChatProvider;
use crate::store::DataStore;
use crate::types::{ChatMessage, ChatTurn, Sender};

const DEFAULT_CHECK_IN: &str = "yo it's been a while 👀 everything good on ur side?";

/// Spawn both job loops. Handles are returned so tests can abort them.
pub fn spawn(
    store: Arc<dyn DataStore>,
    provider: Arc<dyn ChatProvider>,
    config: &JobsConfig,
) -> Vec<JoinHandle<()>> {
    if !config.enabled {
        info!("background jobs disabled");
        return Vec::new();
    }

    let check_in_every = Duration::from_secs(config.check_in_hours * 3600);
    let reminder_every = Duration::from_secs(config.reminder_hours * 3600);

    let check_in = {
        let store = Arc::clone(&store);
        let provider = Arc::clone(&provider);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(check_in_every);
            ticker.tick().await; // first tick fires immediately, skip it
            loop {
                ticker.tick().await;
                check_in_pass(store.as_ref(), provider.as_ref()).await;
            }
        })
    };

    let reminder = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(reminder_every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            reminder_pass(store.as_ref()).await;
        }
    });

    vec![check_in, reminder]
}

/// One proactive check-in sweep over all users.
pub async fn check_in_pass(store: &dyn DataStore, provider: &dyn ChatProvider) {
    info!("checking in on inactive users");

    let users = match store.user_ids().await {
        Ok(users) => users,
        Err(e) => {
            warn!("check-in pass could not list users: {e:#}");
            return;
        }
    };

    for user_id in users {
        if let Err(e) = check_in_user(store, provider, &user_id).await {
            warn!(user = %user_id, "check-in failed: {e:#}");
        }
    }
}

async fn check_in_user(
    store: &dyn DataStore,
    provider: &dyn ChatProvider,
    user_id: &str,
) -> anyhow::Result<()> {
    let buddies = store.buddies_for_user(user_id).await?;
    let Some(buddy) = buddies.first() else {
        return Ok(());
    };

    let facts = store
        .user_memory(user_id)
        .await?
        .map(|m| m.facts)
        .unwrap_or_default();

    let mut message = DEFAULT_CHECK_IN.to_string();

    if !facts.is_empty() {
        let fact_lines = facts
            .iter()
            .map(|f| format!("- {f}"))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "You are {}'s AI buddy.\n\
             Generate a casual, friendly check-in message based on these facts about the user:\n\
             \n\
             {fact_lines}\n\
             \n\
             Rules:\n\
             - Sound natural and chill like a Gen Z friend.\n\
             - Use casual breaks like \"yo\", \"btw\", \"lol\" if it fits.\n\
             - The message should be short (1-2 sentences max).\n\
             - Don't sound like a bot.\n\
             Only return the text of the message.",
            buddy.name,
        );

        match provider.complete(&[ChatTurn::system(prompt)], 0.7).await {
            Ok(generated) => message = generated.trim().to_string(),
            // Generation failure falls back to the default line.
            Err(e) => warn!(user = %user_id, "personalized check-in failed: {e:#}"),
        }
    }

    store
        .append_chat(ChatMessage::text(user_id, &buddy.id, Sender::Buddy, message))
        .await?;
    info!(user = %user_id, "sent proactive check-in");
    Ok(())
}

/// Reminder line for a dominant mood. `None` means no reminder is sent.
fn reminder_for(mood: Mood) -> Option<&'static str> {
    match mood {
        Mood::Stressed | Mood::Anxious => {
            Some("hey take it easy today fr 💛 you deserve a lil break")
        }
        Mood::Sad => Some("sending good vibes your way today 🫶 lmk if u wanna rant"),
        Mood::Bored => Some("yo maybe try smth new today 👀 even smth small!"),
        Mood::Happy => Some("keep riding that good vibe today 🥰 you shining lol"),
        Mood::Angry => Some("hope today's a lil calmer for u 🙏 deep breaths fr"),
        Mood::Calm => Some("vibe check: peaceful af 😎 keep that energy"),
        Mood::Excited | Mood::Neutral => None,
    }
}

/// One mood-reminder sweep over all users.
pub async fn reminder_pass(store: &dyn DataStore) {
    info!("checking mood trends for reminders");

    let users = match store.user_ids().await {
        Ok(users) => users,
        Err(e) => {
            warn!("reminder pass could not list users: {e:#}");
            return;
        }
    };

    for user_id in users {
        if let Err(e) = remind_user(store, &user_id).await {
            warn!(user = %user_id, "mood reminder failed: {e:#}");
        }
    }
}

async fn remind_user(store: &dyn DataStore, user_id: &str) -> anyhow::Result<()> {
    let buddies = store.buddies_for_user(user_id).await?;
    let Some(buddy) = buddies.first() else {
        return Ok(());
    };

    let recent = store.recent_moods(user_id, 5).await?;
    let Some(trend) = dominant_mood(&recent) else {
        return Ok(());
    };
    let Some(reminder) = reminder_for(trend) else {
        return Ok(());
    };

    store
        .append_chat(ChatMessage::text(user_id, &buddy.id, Sender::Buddy, reminder))
        .await?;
    info!(user = %user_id, %trend, "sent mood-based reminder");
    Ok(())
}
