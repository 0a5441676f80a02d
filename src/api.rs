mod client;

pub use self::client::ZulipClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Credentials for a Zulip server.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Auth {
    pub realm: String,
    pub email: String,
    pub api_key: String,
}

impl Auth {
    pub fn realm(&self) -> &str {
        self.realm.trim_end_matches('/')
    }
}

impl Debug for Auth {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth")
            .field("realm", &self.realm)
            .field("email", &self.email)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default = "active_default")]
    pub is_active: bool,
}

fn active_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadResponse {
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SendMessageResponse {
    pub id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Private,
    Stream,
}

/// Form body of `POST /messages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageData {
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub to: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {msg}")]
    Status { status: u16, msg: String },
    #[error("server error: {0}")]
    Api(String),
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("failed to read {locator}: {source}")]
    Read {
        locator: String,
        source: std::io::Error,
    },
    #[error("unsupported resource locator: {0}")]
    Locator(String),
}

/// The subset of the Zulip REST API used for sharing.
#[async_trait]
pub trait ZulipApi: Send + Sync {
    async fn get_own_user(&self, auth: &Auth) -> Result<User, ApiError>;
    async fn get_users(&self, auth: &Auth) -> Result<Vec<User>, ApiError>;
    async fn upload_file(
        &self,
        auth: &Auth,
        locator: &str,
        file_name: &str,
    ) -> Result<UploadResponse, ApiError>;
    async fn send_message(
        &self,
        auth: &Auth,
        data: &MessageData,
    ) -> Result<SendMessageResponse, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_debug_hides_key() {
        let auth = Auth {
            realm: String::from("https://chat.example.com/"),
            email: String::from("me@example.com"),
            api_key: String::from("secret"),
        };
        assert!(!format!("{auth:?}").contains("secret"));
        assert_eq!(auth.realm(), "https://chat.example.com");
    }

    #[test]
    fn deserialize_user() {
        let user = serde_json::from_str::<User>(
            r#"{"user_id":7,"full_name":"Alice","email":"alice@example.com","avatar_url":null}"#,
        )
        .expect("failed to deserialize user");
        assert_eq!(user.user_id, UserId(7));
        assert!(user.is_active);
        assert!(!user.is_bot);
    }
}
