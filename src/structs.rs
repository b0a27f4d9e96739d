use serde::{Deserialize, Serialize};

use crate::structs::user::TelegramUser;

pub mod client;
pub mod user;

/// Data extracted from a launch payload once its signature has verified.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitData {
    /// The user the Telegram client embedded in the payload, if any.
    pub user: Option<TelegramUser>,
    /// Unix timestamp of when the payload was issued, if present.
    pub auth_date: Option<u64>,
}

/// Request-scoped session returned by `client.session()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// The project the session was established against.
    pub project_id: String,
    pub user: Option<TelegramUser>,
    /// Unix timestamp of when the underlying payload was issued.
    pub auth_date: Option<u64>,
}

/// A project's stored bot credential, as returned by the credentials lookup.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct ProjectCredentials {
    /// The bot token issued by BotFather, doubling as the signing root.
    pub bot_token: String,
    /// Whether the project is currently accepting storefront sessions.
    pub active: bool,
}
