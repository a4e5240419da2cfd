//! Buddy creation: the one-shot onboarding flow that generates an avatar
//! and intro message and persists the persona row.

use chrono::Utc;
use serde::Deserialize;

use crate::error::ApiError;
use crate::provider::{ChatProvider, ImageProvider};
use crate::store::{BlobStore, DataStore};
use crate::types::{Buddy, ChatTurn};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBuddyRequest {
    pub name: String,
    pub gender: String,
    pub ethnicity: String,
    pub hair: String,
    pub style: String,
    pub background: String,
    #[serde(rename = "eyeColor")]
    pub eye_color: String,
    #[serde(rename = "skinTone")]
    pub skin_tone: String,
    pub features: Option<String>,
    #[serde(default)]
    pub personality_tags: Vec<String>,
    #[serde(default)]
    pub music_genres: Vec<String>,
    #[serde(default)]
    pub movie_genres: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

impl CreateBuddyRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let required = [
            &self.name,
            &self.gender,
            &self.ethnicity,
            &self.hair,
            &self.style,
            &self.background,
            &self.eye_color,
            &self.skin_tone,
        ];
        if required.iter().any(|f| f.trim().is_empty()) {
            return Err(ApiError::Validation("Missing required fields.".into()));
        }
        Ok(())
    }
}

pub struct CreatedBuddy {
    pub avatar_url: String,
    pub intro_message: String,
}

/// Run the full creation flow: portrait prompt, avatar image, blob upload,
/// intro message, persona row. Any provider or storage failure fails the
/// request; there is no partial persona.
pub async fn create_buddy(
    store: &dyn DataStore,
    chat: &dyn ChatProvider,
    images: &dyn ImageProvider,
    blobs: &dyn BlobStore,
    user_id: &str,
    req: CreateBuddyRequest,
) -> Result<CreatedBuddy, ApiError> {
    req.validate()?;

    let portrait_brief = format!(
        "Describe a super realistic young adult portrait:\n\
         \n\
         - Gender: {}\n\
         - Ethnicity: {}\n\
         - Hair: {}\n\
         - Style: {}\n\
         - Eye Color: {}\n\
         - Skin Tone: {}\n\
         - Features: {}\n\
         - Background: Soft pastel ({})\n\
         Professional headshot, warm lighting, realistic, not cartoonish.",
        req.gender,
        req.ethnicity,
        req.hair,
        req.style,
        req.eye_color,
        req.skin_tone,
        req.features.as_deref().unwrap_or("none"),
        req.background,
    );

    let image_prompt = chat
        .complete(
            &[
                ChatTurn::system(
                    "You are a professional prompt engineer specializing in hyper-realistic portraits.",
                ),
                ChatTurn::user(portrait_brief),
            ],
            0.7,
        )
        .await
        .map_err(ApiError::Provider)?;

    let image_bytes = images
        .generate_image(image_prompt.trim())
        .await
        .map_err(ApiError::Provider)?;

    let key = format!("avatars/{user_id}-{}.png", Utc::now().timestamp_millis());
    let avatar_url = blobs
        .put(&key, image_bytes, "image/png")
        .await
        .map_err(ApiError::Provider)?;

    let intro_brief = format!(
        "Your name is {}.\n\
         Your personality: {}\n\
         You love: {}\n\
         Favorite music: {}\n\
         Favorite movies: {}\n\
         \n\
         Introduce yourself with energy and emotion — make it personal.",
        req.name,
        req.personality_tags.join(", "),
        req.interests.join(", "),
        req.music_genres.join(", "),
        req.movie_genres.join(", "),
    );

    let intro_message = chat
        .complete(
            &[
                ChatTurn::system(
                    "You are a thoughtful and warm AI buddy. Write a 1-2 sentence intro to greet your new user.",
                ),
                ChatTurn::user(intro_brief),
            ],
            0.7,
        )
        .await
        .map_err(ApiError::Provider)?;

    store
        .insert_buddy(Buddy {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: req.name,
            gender: req.gender,
            ethnicity: req.ethnicity,
            hair: req.hair,
            style: req.style,
            eye_color: req.eye_color,
            skin_tone: req.skin_tone,
            features: req.features,
            personality_tags: req.personality_tags,
            interests: req.interests,
            music_genres: req.music_genres,
            movie_genres: req.movie_genres,
            avatar_url: avatar_url.clone(),
            intro_message: intro_message.clone(),
            created_at: Utc::now(),
        })
        .await?;

    Ok(CreatedBuddy {
        avatar_url,
        intro_message,
    })
}
