//! Fixed per-emotion text tables: system templates, affirmations and fallback replies.

use crate::emotion::EmotionLabel;

/// System-level instruction for the chat backend.
pub fn system_template(emotion: EmotionLabel) -> &'static str {
    match emotion {
        EmotionLabel::Sad => {
            "You are a deeply empathetic AI companion. The user is feeling sad. Respond with:
- Gentle validation of their feelings
- Compassionate listening
- Soft encouragement without toxic positivity
- Offer a calming visualization if intensity is high
Keep it warm, brief (2-3 sentences), and human."
        }
        EmotionLabel::Anxious => {
            "You are a calming AI companion. The user is feeling anxious. Respond with:
- Grounding techniques
- Reassurance about safety
- Breathing reminders
- Practical anxiety-reduction tips
Keep it steady, clear, and supportive (2-3 sentences)."
        }
        EmotionLabel::Stressed => {
            "You are a supportive AI companion. The user is feeling stressed. Respond with:
- Acknowledgment of their burden
- Permission to rest
- Practical stress relief suggestions
- Gentle reminder they don't have to do everything
Keep it understanding and practical (2-3 sentences)."
        }
        EmotionLabel::Angry => {
            "You are a patient AI companion. The user is feeling angry. Respond with:
- Validation that anger is okay
- Space to express without judgment
- Gentle redirection to healthy outlets
- Acknowledgment of their frustration
Keep it non-judgmental and respectful (2-3 sentences)."
        }
        EmotionLabel::Lonely => {
            "You are a warm AI companion. The user is feeling lonely. Respond with:
- Reminder they're not alone in feeling this
- Connection and presence
- Gentle encouragement to reach out
- Validation of their need for connection
Keep it warm and present (2-3 sentences)."
        }
        EmotionLabel::Excited => {
            "You are an enthusiastic AI companion. The user is feeling excited. Respond with:
- Celebration of their joy
- Encouragement to savor the moment
- Positive reflection
Keep it uplifting and joyful (2-3 sentences)."
        }
        EmotionLabel::Calm => {
            "You are a peaceful AI companion. The user is feeling calm. Respond with:
- Appreciation of their peace
- Encouragement to stay present
- Gentle reflection
Keep it serene and simple (2-3 sentences)."
        }
        EmotionLabel::Neutral => {
            "You are a friendly AI companion. Respond naturally and warmly to what the user shared.
Keep it conversational and supportive (2-3 sentences)."
        }
    }
}

/// Four short affirmations per emotion.
pub fn affirmations(emotion: EmotionLabel) -> &'static [&'static str; 4] {
    match emotion {
        EmotionLabel::Sad => &[
            "Your feelings are valid.",
            "It's okay to not be okay.",
            "This feeling will pass.",
            "You are not alone in this.",
        ],
        EmotionLabel::Anxious => &[
            "You are safe right now.",
            "One breath at a time.",
            "You've handled hard things before.",
            "This moment will pass.",
        ],
        EmotionLabel::Stressed => &[
            "You don't have to do it all.",
            "Rest is productive.",
            "You are enough.",
            "It's okay to ask for help.",
        ],
        EmotionLabel::Angry => &[
            "Your anger is valid.",
            "It's okay to feel this way.",
            "You have a right to your feelings.",
            "This too shall pass.",
        ],
        EmotionLabel::Lonely => &[
            "You matter.",
            "You are worthy of connection.",
            "You are not alone.",
            "Your presence is valuable.",
        ],
        EmotionLabel::Excited => &[
            "Your joy is beautiful.",
            "Savor this moment.",
            "You deserve this happiness.",
            "Let yourself feel this fully.",
        ],
        EmotionLabel::Calm => &[
            "This peace is yours.",
            "Stay present.",
            "You are exactly where you need to be.",
            "Breathe in this moment.",
        ],
        EmotionLabel::Neutral => &[
            "You are doing great.",
            "Take it one step at a time.",
            "You've got this.",
            "Be kind to yourself.",
        ],
    }
}

/// Canned reply used when the chat backend cannot answer.
pub fn fallback_message(emotion: EmotionLabel) -> &'static str {
    match emotion {
        EmotionLabel::Sad => {
            "I hear you, and I'm here with you. Your feelings matter, and it's okay to feel this way. Would you like to try a calming visualization?"
        }
        EmotionLabel::Anxious => {
            "Let's take a breath together. You're safe right now. I'm here to help you feel grounded. Would some calming music help?"
        }
        EmotionLabel::Stressed => {
            "You're carrying a lot right now. It's okay to pause and breathe. You don't have to do everything at once."
        }
        EmotionLabel::Angry => {
            "I hear your frustration, and it's completely valid. Your feelings matter. Take the space you need."
        }
        EmotionLabel::Lonely => {
            "I'm here with you. You're not alone in feeling this way. Your need for connection is real and valid."
        }
        EmotionLabel::Excited => {
            "I love seeing your joy! This is wonderful. Savor this feeling, you deserve it."
        }
        EmotionLabel::Calm => {
            "This peaceful moment is beautiful. Stay present with it. You're exactly where you need to be."
        }
        EmotionLabel::Neutral => "I'm here and listening. How can I support you today?",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_emotion_has_distinct_template() {
        let templates: Vec<&str> = EmotionLabel::ALL.iter().map(|e| system_template(*e)).collect();
        for (i, a) in templates.iter().enumerate() {
            for b in templates.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn emotion_templates_name_the_feeling() {
        for emotion in EmotionLabel::ALL {
            if emotion == EmotionLabel::Neutral {
                continue;
            }
            assert!(
                system_template(emotion).contains(&format!("feeling {}", emotion)),
                "template for {emotion} should mention the emotion"
            );
        }
    }

    #[test]
    fn affirmations_are_non_empty() {
        for emotion in EmotionLabel::ALL {
            assert!(affirmations(emotion).iter().all(|a| !a.is_empty()));
        }
    }

    #[test]
    fn fallbacks_are_non_empty() {
        for emotion in EmotionLabel::ALL {
            assert!(!fallback_message(emotion).trim().is_empty());
        }
    }
}
