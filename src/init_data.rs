use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::errors::AuthError;
use crate::structs::user::TelegramUser;
use crate::structs::InitData;

type HmacSha256 = Hmac<Sha256>;

/// Fixed key material Telegram uses to derive the per-bot signing key.
const KEY_SEED: &[u8] = b"WebAppData";

/// Maximum accepted age of a launch payload, in seconds.
pub const MAX_AGE_SECS: u64 = 86_400;

/// Verifies a Telegram Mini App launch payload against the bot token and
/// extracts the embedded user and issue time.
///
/// The payload is the raw `initData` query string handed to the Mini App by
/// the Telegram client. Freshness is judged against the system clock; use
/// [`validate_at`] to supply your own clock.
///
/// # Errors
///
/// Returns [`AuthError::NoHash`] when the payload carries no `hash` field,
/// [`AuthError::HashMismatch`] when the signature does not verify, and
/// [`AuthError::Expired`] when `auth_date` is older than [`MAX_AGE_SECS`].
/// The hash is always checked before freshness.
pub fn validate(raw_init_data: &str, bot_token: &str) -> Result<InitData, AuthError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs());

    validate_at(raw_init_data, bot_token, now)
}

/// Same as [`validate`], with the current Unix time passed in explicitly.
pub fn validate_at(
    raw_init_data: &str,
    bot_token: &str,
    now_unix: u64,
) -> Result<InitData, AuthError> {
    let mut pairs = parse_pairs(raw_init_data);

    // The first `hash` pair is the candidate signature; every `hash` pair
    // is excluded from the data-check string.
    let hash_index = pairs
        .iter()
        .position(|(key, _)| key == "hash")
        .ok_or(AuthError::NoHash)?;
    let (_, provided_hash) = pairs.remove(hash_index);
    pairs.retain(|(key, _)| key != "hash");

    let calculated_hash = sign_pairs(&pairs, bot_token);

    if !bool::from(calculated_hash.as_bytes().ct_eq(provided_hash.as_bytes())) {
        return Err(AuthError::HashMismatch);
    }

    // A user field that fails to decode is not fatal: some launch contexts
    // (inline queries) carry no user at all, so callers must already cope
    // with an absent user.
    let user = pairs
        .iter()
        .find(|(key, _)| key == "user")
        .and_then(|(_, raw_user)| {
            serde_json::from_str::<TelegramUser>(raw_user)
                .map_err(|err| warn!("discarding unparseable user field in launch payload: {}", err))
                .ok()
        });

    let auth_date = pairs
        .iter()
        .find(|(key, _)| key == "auth_date")
        .and_then(|(_, raw_date)| raw_date.parse::<u64>().ok());

    if let Some(issued_at) = auth_date {
        if now_unix.saturating_sub(issued_at) > MAX_AGE_SECS {
            return Err(AuthError::Expired);
        }
    }

    Ok(InitData { user, auth_date })
}

/// Computes the lowercase hex signature over a set of decoded pairs, the
/// way the Telegram client signs them: the pairs are rendered as
/// `key=value` lines, sorted, joined with `\n`, and signed with
/// HMAC-SHA256 under a key that is itself HMAC-SHA256("WebAppData", token).
pub(crate) fn sign_pairs(pairs: &[(String, String)], bot_token: &str) -> String {
    let secret_key = {
        let mut mac =
            HmacSha256::new_from_slice(KEY_SEED).expect("HMAC accepts keys of any length");
        mac.update(bot_token.as_bytes());
        mac.finalize().into_bytes()
    };

    let mut mac =
        HmacSha256::new_from_slice(&secret_key).expect("HMAC accepts keys of any length");
    mac.update(data_check_string(pairs).as_bytes());

    hex::encode(mac.finalize().into_bytes())
}

fn data_check_string(pairs: &[(String, String)]) -> String {
    let mut lines: Vec<String> = pairs
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();

    lines.sort();
    lines.join("\n")
}

fn parse_pairs(raw: &str) -> Vec<(String, String)> {
    raw.split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.split_once('=') {
            Some((key, value)) => (decode_component(key), decode_component(value)),
            None => (decode_component(segment), String::new()),
        })
        .collect()
}

fn decode_component(component: &str) -> String {
    // URLSearchParams semantics: a raw `+` is a space.
    let component = component.replace('+', " ");

    match urlencoding::decode(&component) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => component,
    }
}
