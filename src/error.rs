use thiserror::Error;

#[derive(Debug, Error)]
pub enum PickError {
    /// Transport failure, timeout, non-success status or unparsable body.
    /// Never retried here; the caller decides.
    #[error("Scoreboard feed unavailable: {message} (URL: {url})")]
    FeedUnavailable { url: String, message: String },

    /// A single event that cannot be mapped to a game. Reported and skipped.
    #[error("Malformed game data in event {event}: {reason}")]
    MalformedGameData { event: String, reason: String },
}

impl PickError {
    pub fn feed_unavailable(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FeedUnavailable {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn malformed_game(event: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedGameData {
            event: event.into(),
            reason: reason.into(),
        }
    }
}
