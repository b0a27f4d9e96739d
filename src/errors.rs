use thiserror::Error;

/// Purple auth errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The project ID provided is not in the right format. Must be in UUID (00000000-0000-0000-0000-000000000000) format.
    #[error("Invalid project ID format. Must be in UUID format.")]
    InvalidProjectId,

    /// The launch payload carries no `hash` field, so there is nothing to verify.
    #[error("Launch payload has no hash field.")]
    NoHash,
    /// The signature over the launch payload does not match the bot token.
    #[error("Launch payload signature does not match.")]
    HashMismatch,
    /// The launch payload is older than the allowed session window.
    #[error("Launch payload has expired.")]
    Expired,

    /// The project's stored bot token is missing or blank.
    #[error("No bot token is configured for this project.")]
    MissingBotToken,
    /// The project exists but has been deactivated.
    #[error("The project is inactive.")]
    ProjectInactive,
    /// The local clock disagrees with NTP beyond the allowed leeway.
    #[error("System clock is out of sync.")]
    ClockDrift,

    /// Failed to send a request to the Purple API.
    #[error("Failed to send a request to the Purple API.")]
    RequestFailed,
    /// Failed to decode a Purple API response.
    #[error("Failed to decode Purple API response.")]
    FailedToDecode,
    /// The Purple API returned a 404: Not Found status code.
    /// This means that no project matched the given ID.
    #[error("Project not found.")]
    ProjectNotFound,
    /// The Purple API returned a 429: Too Many Requests status code.
    /// This means that you're sending requests too fast.
    #[error("You are being rate limited.")]
    RateLimited,
    /// The Purple API returned a server error.
    /// This is a catch-all for unusual error cases.
    #[error("Server error.")]
    ServerError,
}
