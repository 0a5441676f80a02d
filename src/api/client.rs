use super::{
    ApiError, Auth, MessageData, SendMessageResponse, UploadResponse, User, ZulipApi,
};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// [`ZulipApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct ZulipClient {
    http: Client,
}

#[derive(Deserialize)]
struct Members {
    members: Vec<User>,
}

impl ZulipClient {
    pub fn new() -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(concat!("zulip-share/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }
    fn url(auth: &Auth, path: &str) -> String {
        format!("{}/api/v1/{path}", auth.realm())
    }
    async fn call<T: DeserializeOwned>(request: RequestBuilder, auth: &Auth) -> Result<T, ApiError> {
        let response = request
            .basic_auth(&auth.email, Some(&auth.api_key))
            .send()
            .await?;
        let status = response.status();
        log::debug!("{} {status}", response.url());
        let body = response.text().await?;
        let value = serde_json::from_str::<Value>(&body).map_err(|e| {
            if status.is_success() {
                ApiError::Decode(e)
            } else {
                ApiError::Status {
                    status: status.as_u16(),
                    msg: body.clone(),
                }
            }
        })?;
        if value.get("result").and_then(Value::as_str) != Some("success") {
            let msg = value
                .get("msg")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return Err(if status.is_success() {
                ApiError::Api(msg)
            } else {
                ApiError::Status {
                    status: status.as_u16(),
                    msg,
                }
            });
        }
        Ok(serde_json::from_value(value)?)
    }
}

fn local_path(locator: &str) -> Result<&str, ApiError> {
    if let Some(path) = locator.strip_prefix("file://") {
        Ok(path)
    } else if locator.contains("://") {
        Err(ApiError::Locator(locator.to_string()))
    } else {
        Ok(locator)
    }
}

#[async_trait]
impl ZulipApi for ZulipClient {
    async fn get_own_user(&self, auth: &Auth) -> Result<User, ApiError> {
        Self::call(self.http.get(Self::url(auth, "users/me")), auth).await
    }
    async fn get_users(&self, auth: &Auth) -> Result<Vec<User>, ApiError> {
        let members: Members = Self::call(self.http.get(Self::url(auth, "users")), auth).await?;
        Ok(members.members)
    }
    async fn upload_file(
        &self,
        auth: &Auth,
        locator: &str,
        file_name: &str,
    ) -> Result<UploadResponse, ApiError> {
        let path = local_path(locator)?;
        let bytes = tokio::fs::read(path).await.map_err(|source| ApiError::Read {
            locator: locator.to_string(),
            source,
        })?;
        log::info!("uploading {locator} as {file_name} ({} bytes)", bytes.len());
        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name.to_string()));
        Self::call(
            self.http
                .post(Self::url(auth, "user_uploads"))
                .multipart(form),
            auth,
        )
        .await
    }
    async fn send_message(
        &self,
        auth: &Auth,
        data: &MessageData,
    ) -> Result<SendMessageResponse, ApiError> {
        Self::call(self.http.post(Self::url(auth, "messages")).form(data), auth).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locators() {
        assert_eq!(local_path("/tmp/a.png").ok(), Some("/tmp/a.png"));
        assert_eq!(local_path("file:///tmp/a.png").ok(), Some("/tmp/a.png"));
        assert!(matches!(
            local_path("content://media/1"),
            Err(ApiError::Locator(_))
        ));
    }

    #[test]
    fn api_url() {
        let auth = Auth {
            realm: String::from("https://chat.example.com/"),
            email: String::new(),
            api_key: String::new(),
        };
        assert_eq!(
            ZulipClient::url(&auth, "messages"),
            "https://chat.example.com/api/v1/messages"
        );
    }

    #[tokio::test]
    async fn upload_missing_file() {
        let client = ZulipClient::new().expect("failed to build client");
        let auth = Auth {
            realm: String::from("http://127.0.0.1:9"),
            email: String::new(),
            api_key: String::new(),
        };
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("missing.png");
        let result = client
            .upload_file(&auth, &path.to_string_lossy(), "shared-content-1.png")
            .await;
        assert!(matches!(result, Err(ApiError::Read { .. })));
    }
}
