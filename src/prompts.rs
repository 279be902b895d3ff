//! Fixed user-facing text: suggestion chips and canned notices.

/// Suggestion chips shown under the hero search bar.
pub const SUGGESTIONS: [&str; 4] = [
    "Need to understand a legal document",
    "Need a lawyer to defend me",
    "Draft a contract or agreement",
    "Received a letter from OpenLaw",
];

/// Placeholder in the hero search bar, reused as the chat prompt.
pub const SEARCH_PLACEHOLDER: &str = "What can we help with?";

/// Reason recorded on an assistant turn whose request was stopped.
pub const CANCELLED_REASON: &str = "Request cancelled before the assistant replied.";

/// Reason recorded on an assistant turn whose request failed. The details go in the
/// system-error turn that follows it.
pub const FAILED_REASON: &str = "The request failed.";

/// Reply shown when the back end asks for the visitor's location.
pub const NEAR_ME_PROMPT: &str =
    "To find attorneys near you, tell me your city, ZIP code, or state.";

/// Hint appended when the back end wants the contact form shown.
pub const CONTACT_FORM_HINT: &str =
    "Leave your contact details and we'll reach out when we launch in your area.";

/// Look up a suggestion chip by its 1-based position.
pub fn suggestion(position: usize) -> Option<&'static str> {
    position
        .checked_sub(1)
        .and_then(|index| SUGGESTIONS.get(index).copied())
}

/// The search bar only opens the widget for a non-blank query.
pub fn search_starter(query: &str) -> Option<String> {
    let trimmed = query.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Notice appended to the transcript after a remote failure.
pub fn retry_notice(user_message: &str) -> String {
    format!("{user_message} You can send your message again to retry.")
}
