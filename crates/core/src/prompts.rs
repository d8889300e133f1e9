//! Prompt templates and the fixed user-facing failure strings.
//!
//! Wording is owned here so the flow controllers stay free of string
//! literals and tests can assert against one place.

/// Substituted for the answer when a generation call fails; the flow stays
/// in its current stage so the user can retry.
pub const APOLOGY: &str =
    "😔 Sorry, I could not reach the assistant right now. Please try again in a moment.";

/// Shown when speech-to-text fails; the flow stays in its current stage.
pub const TRANSCRIPTION_FAILED: &str =
    "❌ Sorry, I could not recognize that voice message. Please try again.";

/// Shown when a deferred-synthesis cache entry is gone.
pub const CACHE_MISS: &str = "❌ That response is no longer available to voice (not found or expired).";

/// Shown when text-to-speech fails; the cached text is kept for a retry.
pub const SYNTHESIS_FAILED: &str = "❌ Could not create the audio. Please try again.";

pub const RANDOM_FACT: &str = "Tell me one interesting random fact about any topic. \
     Keep it short (2-3 sentences) and engaging.";

/// Asks the provider for a single quiz question on a theme, without the answer.
pub fn quiz_question(theme: &str) -> String {
    format!(
        "Come up with one interesting quiz question on the topic '{theme}'. \
         It should be of medium difficulty. Write only the question itself, without the answer."
    )
}

/// Asks the provider for a verdict on a quiz answer. The reply must start
/// with 'Correct' or 'Incorrect'; the quiz flow classifies it purely by that
/// prefix.
pub fn quiz_check(question: &str, answer: &str) -> String {
    format!(
        "Quiz question: {question}\nUser's answer: {answer}\n\n\
         Check whether the answer is right. Reply with ONLY 'Correct' or 'Incorrect' first, \
         then briefly explain why and give the right answer if needed."
    )
}

pub fn translate(text: &str, language: &str) -> String {
    format!(
        "Translate the following text into {language}. \
         Provide only the translation, without explanations:\n\n{text}"
    )
}
