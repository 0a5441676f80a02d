use crate::api::{ApiError, Auth, MessageData, MessageType, UserId, ZulipApi};
use crate::share::SharedData;

pub const SENDING_MESSAGE: &str = "Sending Message...";
pub const MESSAGE_SENT: &str = "Message sent";
pub const FAILED_TO_SEND: &str = "Failed to send message";

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("failed to upload {file_name}: {source}")]
    Upload {
        file_name: String,
        source: ApiError,
    },
    #[error("failed to post message: {0}")]
    Post(#[source] ApiError),
}

/// Shows transient notifications to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Shared data and the composed message, addressed to a destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendRequest {
    Private {
        recipient_ids: Vec<UserId>,
        message: String,
        shared_data: SharedData,
    },
    Stream {
        stream: String,
        topic: String,
        message: String,
        shared_data: SharedData,
    },
}

impl SendRequest {
    pub fn message(&self) -> &str {
        match self {
            Self::Private { message, .. } | Self::Stream { message, .. } => message,
        }
    }
    pub fn shared_data(&self) -> &SharedData {
        match self {
            Self::Private { shared_data, .. } | Self::Stream { shared_data, .. } => shared_data,
        }
    }
    fn message_data(&self, content: String) -> MessageData {
        match self {
            Self::Private { recipient_ids, .. } => MessageData {
                kind: MessageType::Private,
                to: serde_json::Value::from(
                    recipient_ids.iter().map(|id| id.0).collect::<Vec<_>>(),
                )
                .to_string(),
                content,
                subject: None,
            },
            Self::Stream { stream, topic, .. } => MessageData {
                kind: MessageType::Stream,
                to: stream.clone(),
                content,
                subject: Some(topic.clone()),
            },
        }
    }
}

/// Upload name of the `index`-th (1-based) attachment, e.g.
/// `shared-content-1.png` for `image/png`.
pub fn attachment_file_name(mime_type: &str, index: usize) -> String {
    let subtype = mime_type.rsplit('/').next().unwrap_or(mime_type);
    format!("shared-content-{index}.{subtype}")
}

async fn compose_body(
    api: &dyn ZulipApi,
    auth: &Auth,
    request: &SendRequest,
) -> Result<String, SendError> {
    let mut body = request.message().to_string();
    for (i, content) in request.shared_data().content().iter().enumerate() {
        let file_name = attachment_file_name(&content.mime_type, i + 1);
        let response = api
            .upload_file(auth, &content.url, &file_name)
            .await
            .map_err(|source| SendError::Upload {
                file_name: file_name.clone(),
                source,
            })?;
        body.push_str(&format!("\n[{file_name}]({})", response.uri));
    }
    Ok(body)
}

/// Upload the shared attachments in order, then post one message.
///
/// Failures are reported to the user through `notifier` before being
/// returned. Nothing is retried.
pub async fn handle_send(
    api: &dyn ZulipApi,
    auth: &Auth,
    request: &SendRequest,
    notifier: &dyn Notifier,
) -> Result<(), SendError> {
    notifier.notify(SENDING_MESSAGE);
    let result = async {
        let content = compose_body(api, auth, request).await?;
        api.send_message(auth, &request.message_data(content))
            .await
            .map_err(SendError::Post)
    }
    .await;
    match result {
        Ok(output) => {
            log::info!("message sent: {output:?}");
            notifier.notify(MESSAGE_SENT);
            Ok(())
        }
        Err(e) => {
            log::error!("{e}");
            notifier.notify(FAILED_TO_SEND);
            Err(e)
        }
    }
}
