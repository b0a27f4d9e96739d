use std::time::{Duration, SystemTime};

use colorful::Color;
use colorful::Colorful;
use reqwest::StatusCode;
use rsntp::SntpClient;
use serde::Deserialize;
use tracing::warn;

use crate::errors::AuthError;
use crate::init_data;
use crate::structs::{ProjectCredentials, Session};

/// Maximum disagreement tolerated between the system clock and NTP before
/// the expiry check cannot be trusted.
const CLOCK_LEEWAY: Duration = Duration::from_secs(30);

/// Purple auth client. Establishes storefront sessions from Mini App launch payloads.
pub struct Client {
    /// The ID of your Purple project. Should be in UUID format: 00000000-0000-0000-0000-000000000000
    pub project_id: String,
    /// Whether the client should print debug statements.
    pub debug: bool,
    verify_clock: bool,
    store: Box<dyn ProjectStore>,
}

/// Purple auth client options. Pass this into the `new()` function of the client.
#[derive(Debug)]
pub struct ClientOptions {
    /// The ID of your Purple project. Should be in UUID format: 00000000-0000-0000-0000-000000000000
    pub project_id: String,
    /// Hostname of the Purple API serving the credentials lookup.
    pub api_hostname: String,
    /// Whether the client should print debug statements.
    pub debug: bool,
    /// Whether to cross-check the system clock against NTP before trusting
    /// payload freshness.
    pub verify_clock: bool,
}

/// Lookup of a project's stored bot credential, keyed by project ID.
///
/// The storefront backend injects whichever store it persists projects in;
/// [`RestProjectStore`] queries the hosted Purple API.
pub trait ProjectStore {
    fn fetch_credentials(&self, project_id: &str) -> Result<ProjectCredentials, AuthError>;
}

/// Credentials lookup backed by the Purple REST API.
#[derive(Debug)]
pub struct RestProjectStore {
    hostname: String,
}

impl RestProjectStore {
    pub fn new(hostname: &str) -> Self {
        Self {
            hostname: hostname.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct CredentialsEnvelope {
    success: bool,
    data: Option<ProjectCredentials>,
    error: Option<String>,
}

impl ProjectStore for RestProjectStore {
    fn fetch_credentials(&self, project_id: &str) -> Result<ProjectCredentials, AuthError> {
        let url = reqwest::Url::parse_with_params(
            &format!("https://{}/api/v1/projects/credentials", self.hostname),
            &[("project_id", project_id)],
        )
        .or(Err(AuthError::RequestFailed))?;

        let response = reqwest::blocking::get(url).or(Err(AuthError::RequestFailed))?;

        if !response.status().is_success() {
            match response.status() {
                StatusCode::NOT_FOUND => return Err(AuthError::ProjectNotFound),
                StatusCode::TOO_MANY_REQUESTS => return Err(AuthError::RateLimited),
                _ => return Err(AuthError::ServerError),
            }
        }

        let envelope = response
            .json::<CredentialsEnvelope>()
            .or(Err(AuthError::FailedToDecode))?;

        if !envelope.success {
            warn!(
                "credentials lookup rejected: {}",
                envelope.error.unwrap_or_default()
            );
            return Err(AuthError::ProjectNotFound);
        }

        envelope.data.ok_or(AuthError::FailedToDecode)
    }
}

impl Client {
    /// Creates a new Purple auth client against the hosted API.
    pub fn new(options: ClientOptions) -> Result<Self, AuthError> {
        let store = Box::new(RestProjectStore::new(&options.api_hostname));

        let mut client = Self::with_store(&options.project_id, store)?;
        client.debug = options.debug;
        client.verify_clock = options.verify_clock;

        Ok(client)
    }

    /// Creates a client over a custom credentials store.
    pub fn with_store(
        project_id: &str,
        store: Box<dyn ProjectStore>,
    ) -> Result<Self, AuthError> {
        // Verify that the project ID is in the right format
        if project_id.len() != 36 {
            return Err(AuthError::InvalidProjectId);
        }

        Ok(Self {
            project_id: project_id.to_string(),
            debug: false,
            verify_clock: false,
            store,
        })
    }

    /// Establishes a storefront session from a raw Mini App launch payload.
    ///
    /// Fetches the project's bot credential, rejects inactive projects and
    /// blank tokens, then verifies the payload signature and freshness.
    pub fn session(&self, raw_init_data: &str) -> Result<Session, AuthError> {
        if self.debug {
            #[cfg(windows)]
            print!("[AUTH] Validating launch payload...");

            #[cfg(not(windows))]
            print!(
                "{}",
                "[AUTH] Validating launch payload..."
                    .gradient_with_color(Color::Cyan, Color::SpringGreen4)
            );
        }

        let credentials = self.store.fetch_credentials(&self.project_id)?;

        if !credentials.active {
            return Err(AuthError::ProjectInactive);
        }

        if credentials.bot_token.trim().is_empty() {
            return Err(AuthError::MissingBotToken);
        }

        if self.verify_clock {
            Self::check_clock_drift()?;
        }

        let init_data = init_data::validate(raw_init_data, &credentials.bot_token)?;

        if self.debug {
            let name = init_data
                .user
                .as_ref()
                .map(|user| user.display_name())
                .unwrap_or_else(|| "guest".to_string());

            #[cfg(windows)]
            println!("\r[AUTH] Session established. Welcome, {}.", name);

            #[cfg(not(windows))]
            println!(
                "\r{} Welcome, {}.",
                "[AUTH] Session established.".gradient_with_color(Color::Cyan, Color::SpringGreen4),
                name.gradient_with_color(Color::SpringGreen4, Color::Cyan)
            );
        }

        Ok(Session {
            project_id: self.project_id.clone(),
            user: init_data.user,
            auth_date: init_data.auth_date,
        })
    }

    fn check_clock_drift() -> Result<(), AuthError> {
        let client = SntpClient::new();
        let ntp_time = client
            .synchronize("time.cloudflare.com")
            .or(Err(AuthError::RequestFailed))?
            .datetime()
            .into_system_time()
            .or(Err(AuthError::RequestFailed))?;

        let system_time = SystemTime::now();

        let drift = if ntp_time > system_time {
            ntp_time.duration_since(system_time)
        } else {
            system_time.duration_since(ntp_time)
        }
        .unwrap_or_default();

        if drift > CLOCK_LEEWAY {
            return Err(AuthError::ClockDrift);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::InitDataBuilder;
    use crate::structs::user::TelegramUser;

    const PROJECT_ID: &str = "2f6a0d7e-4c1b-4b8e-9a3d-5e8c7f1a2b3c";
    const BOT_TOKEN: &str = "123456:ABC";

    struct FixedStore {
        credentials: ProjectCredentials,
    }

    impl ProjectStore for FixedStore {
        fn fetch_credentials(&self, _project_id: &str) -> Result<ProjectCredentials, AuthError> {
            Ok(self.credentials.clone())
        }
    }

    struct MissingStore;

    impl ProjectStore for MissingStore {
        fn fetch_credentials(&self, _project_id: &str) -> Result<ProjectCredentials, AuthError> {
            Err(AuthError::ProjectNotFound)
        }
    }

    fn client_with(credentials: ProjectCredentials) -> Client {
        Client::with_store(PROJECT_ID, Box::new(FixedStore { credentials })).unwrap()
    }

    fn now_unix() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    #[test]
    fn establishes_session_from_valid_payload() {
        let client = client_with(ProjectCredentials {
            bot_token: BOT_TOKEN.to_string(),
            active: true,
        });

        let user = TelegramUser {
            id: 7,
            first_name: "Maya".to_string(),
            ..TelegramUser::default()
        };
        let raw = InitDataBuilder::new()
            .user(&user)
            .auth_date(now_unix())
            .sign(BOT_TOKEN);

        let session = client.session(&raw).unwrap();

        assert_eq!(session.project_id, PROJECT_ID);
        assert_eq!(session.user, Some(user));
    }

    #[test]
    fn rejects_inactive_project() {
        let client = client_with(ProjectCredentials {
            bot_token: BOT_TOKEN.to_string(),
            active: false,
        });
        let raw = InitDataBuilder::new().auth_date(now_unix()).sign(BOT_TOKEN);

        assert!(matches!(
            client.session(&raw),
            Err(AuthError::ProjectInactive)
        ));
    }

    #[test]
    fn rejects_blank_bot_token() {
        let client = client_with(ProjectCredentials {
            bot_token: "  ".to_string(),
            active: true,
        });
        let raw = InitDataBuilder::new().auth_date(now_unix()).sign(BOT_TOKEN);

        assert!(matches!(
            client.session(&raw),
            Err(AuthError::MissingBotToken)
        ));
    }

    #[test]
    fn propagates_store_failure() {
        let client = Client::with_store(PROJECT_ID, Box::new(MissingStore)).unwrap();
        let raw = InitDataBuilder::new().auth_date(now_unix()).sign(BOT_TOKEN);

        assert!(matches!(
            client.session(&raw),
            Err(AuthError::ProjectNotFound)
        ));
    }

    #[test]
    fn rejects_tampered_payload() {
        let client = client_with(ProjectCredentials {
            bot_token: BOT_TOKEN.to_string(),
            active: true,
        });
        let raw = InitDataBuilder::new()
            .auth_date(now_unix())
            .field("query_id", "AAEuntouched")
            .sign(BOT_TOKEN);
        let tampered = raw.replace("AAEuntouched", "AAEuntouchex");

        assert!(matches!(
            client.session(&tampered),
            Err(AuthError::HashMismatch)
        ));
    }

    #[test]
    fn rejects_malformed_project_id() {
        let result = Client::with_store("not-a-uuid", Box::new(MissingStore));

        assert!(matches!(result, Err(AuthError::InvalidProjectId)));
    }

    #[test]
    fn new_rejects_malformed_project_id_before_any_request() {
        let result = Client::new(ClientOptions {
            project_id: "not-a-uuid".to_string(),
            api_hostname: "api.purple.shop".to_string(),
            debug: false,
            verify_clock: false,
        });

        assert!(matches!(result, Err(AuthError::InvalidProjectId)));
    }
}
