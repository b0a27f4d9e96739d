use crate::init_data;
use crate::structs::user::TelegramUser;

/// Builder for signed launch payloads.
///
/// Produces the exact query string a Telegram client would hand to the Mini
/// App, signed with the given bot token. Meant for tests and for driving a
/// storefront locally without a real Telegram client.
pub struct InitDataBuilder {
    pairs: Vec<(String, String)>,
}

impl InitDataBuilder {
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Embeds the user as a JSON-encoded `user` field.
    pub fn user(mut self, user: &TelegramUser) -> Self {
        let json = serde_json::to_string(user).expect("TelegramUser always serializes");
        self.pairs.push(("user".to_string(), json));
        self
    }

    /// Sets the `auth_date` issue timestamp.
    pub fn auth_date(mut self, unix_secs: u64) -> Self {
        self.pairs
            .push(("auth_date".to_string(), unix_secs.to_string()));
        self
    }

    /// Adds an arbitrary field, in decoded form.
    pub fn field(mut self, key: &str, value: &str) -> Self {
        self.pairs.push((key.to_string(), value.to_string()));
        self
    }

    /// Signs the collected fields and renders the percent-encoded payload,
    /// with the `hash` field appended last.
    pub fn sign(self, bot_token: &str) -> String {
        let hash = init_data::sign_pairs(&self.pairs, bot_token);

        let mut query: Vec<String> = self
            .pairs
            .iter()
            .map(|(key, value)| {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
            })
            .collect();
        query.push(format!("hash={hash}"));

        query.join("&")
    }
}

impl Default for InitDataBuilder {
    fn default() -> Self {
        Self::new()
    }
}
