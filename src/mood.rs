//! Mood taxonomy, classification, and trend analysis.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

use crate::provider::ChatProvider;
use crate::types::{ChatTurn, MoodRecord};

/// Closed mood taxonomy. `Neutral` is the out-of-band fallback used when the
/// classifier fails or emits something unrecognized — it is never requested
/// from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mood {
    Happy,
    Sad,
    Stressed,
    Excited,
    Anxious,
    Bored,
    Angry,
    Calm,
    Neutral,
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Mood::Happy => "Happy",
            Mood::Sad => "Sad",
            Mood::Stressed => "Stressed",
            Mood::Excited => "Excited",
            Mood::Anxious => "Anxious",
            Mood::Bored => "Bored",
            Mood::Angry => "Angry",
            Mood::Calm => "Calm",
            Mood::Neutral => "Neutral",
        };
        f.write_str(label)
    }
}

impl FromStr for Mood {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Happy" => Ok(Mood::Happy),
            "Sad" => Ok(Mood::Sad),
            "Stressed" => Ok(Mood::Stressed),
            "Excited" => Ok(Mood::Excited),
            "Anxious" => Ok(Mood::Anxious),
            "Bored" => Ok(Mood::Bored),
            "Angry" => Ok(Mood::Angry),
            "Calm" => Ok(Mood::Calm),
            "Neutral" => Ok(Mood::Neutral),
            _ => Err(()),
        }
    }
}

/// Tone directive matching a mood. Total over the 8 classifiable moods;
/// anything else gets the default line. Single table shared by every call
/// site that builds a persona prompt.
pub fn mood_instruction(mood: Mood) -> &'static str {
    match mood {
        Mood::Happy => "Keep it playful and hype them up.",
        Mood::Sad => "Be extra comforting, gentle, and empathetic.",
        Mood::Stressed => "Stay calm and reassure them.",
        Mood::Excited => "Match their excitement and celebrate with them!",
        Mood::Anxious => "Help them feel safe. Validate and comfort them.",
        Mood::Bored => "Be funny or suggest lighthearted stuff to do.",
        Mood::Angry => "Let them vent. Validate their feelings without fixing.",
        Mood::Calm => "Stay chill and relaxed.",
        Mood::Neutral => "Just vibe naturally with their mood.",
    }
}

const CLASSIFIER_PROMPT: &str = "You are a mood detector.\n\
Given a user message, classify their mood as one of: \
[Happy, Sad, Stressed, Excited, Calm, Angry, Bored, Anxious].\n\
Only reply with the mood. No explanations.";

/// Classifies a single message against the mood taxonomy with one
/// zero-temperature completion call.
pub struct MoodClassifier {
    provider: Arc<dyn ChatProvider>,
}

impl MoodClassifier {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self { provider }
    }

    /// Classify a message. Provider failure or an unrecognized label
    /// degrades to `Neutral`; this never fails the surrounding request.
    pub async fn classify(&self, message: &str) -> Mood {
        let turns = vec![ChatTurn::system(CLASSIFIER_PROMPT), ChatTurn::user(message)];

        match self.provider.complete(&turns, 0.0).await {
            Ok(label) => label.trim().parse().unwrap_or_else(|_| {
                warn!(label = %label.trim(), "classifier emitted unknown mood, using Neutral");
                Mood::Neutral
            }),
            Err(e) => {
                warn!("mood detection failed, using Neutral: {e:#}");
                Mood::Neutral
            }
        }
    }
}

/// Majority mood over the given records (callers pass the most recent 5,
/// newest first). Ties break toward the first-encountered label in a single
/// accumulation pass. Returns `None` when there are no records.
pub fn dominant_mood(records: &[MoodRecord]) -> Option<Mood> {
    let mut counts: Vec<(Mood, usize)> = Vec::new();
    for record in records {
        match counts.iter_mut().find(|(m, _)| *m == record.mood) {
            Some((_, n)) => *n += 1,
            None => counts.push((record.mood, 1)),
        }
    }

    let mut dominant = None;
    let mut max_count = 0;
    for (mood, count) in counts {
        if count > max_count {
            dominant = Some(mood);
            max_count = count;
        }
    }
    dominant
}
