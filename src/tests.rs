use std::time::{SystemTime, UNIX_EPOCH};

use crate::{
    validate, AuthError, Client, InitDataBuilder, ProjectCredentials, ProjectStore, TelegramUser,
    MAX_AGE_SECS,
};

const BOT_TOKEN: &str = "123456:ABC";
const PROJECT_ID: &str = "2f6a0d7e-4c1b-4b8e-9a3d-5e8c7f1a2b3c";

struct InMemoryStore;

impl ProjectStore for InMemoryStore {
    fn fetch_credentials(&self, project_id: &str) -> Result<ProjectCredentials, AuthError> {
        if project_id != PROJECT_ID {
            return Err(AuthError::ProjectNotFound);
        }

        Ok(ProjectCredentials {
            bot_token: BOT_TOKEN.to_string(),
            active: true,
        })
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

#[test]
fn validates_fresh_payload_with_user() {
    let now = now_unix();
    let user = TelegramUser {
        id: 42,
        first_name: "Ann".to_string(),
        ..TelegramUser::default()
    };

    let raw = InitDataBuilder::new().user(&user).auth_date(now).sign(BOT_TOKEN);

    let init_data = validate(&raw, BOT_TOKEN).unwrap();

    assert_eq!(init_data.user, Some(user));
    assert_eq!(init_data.auth_date, Some(now));
}

#[test]
fn storefront_session_flow() {
    let client = Client::with_store(PROJECT_ID, Box::new(InMemoryStore)).unwrap();

    let user = TelegramUser {
        id: 7,
        first_name: "Maya".to_string(),
        username: Some("maya_k".to_string()),
        ..TelegramUser::default()
    };
    let raw = InitDataBuilder::new()
        .user(&user)
        .auth_date(now_unix())
        .field("query_id", "AAE1")
        .sign(BOT_TOKEN);

    let session = client.session(&raw).unwrap();

    assert_eq!(session.project_id, PROJECT_ID);
    assert_eq!(session.user, Some(user));
}

#[test]
fn stale_payload_is_rejected_end_to_end() {
    let client = Client::with_store(PROJECT_ID, Box::new(InMemoryStore)).unwrap();

    let raw = InitDataBuilder::new()
        .auth_date(now_unix() - MAX_AGE_SECS - 100)
        .sign(BOT_TOKEN);

    assert!(matches!(client.session(&raw), Err(AuthError::Expired)));
}
