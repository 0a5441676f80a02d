pub mod dispatch;
pub mod intent;

pub use self::dispatch::{AppStatus, Delivery, Lifecycle, PendingShare, SHARE_RECEIVED};
pub use self::intent::{
    parse_intent, ContentResolver, MimeGuessResolver, ShareAction, ShareIntent, ShareParseError,
};
use serde::{Deserialize, Serialize};

/// A single shared resource: where to read it from and its MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedContent {
    pub url: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

impl SharedContent {
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// Normalized content received from another program.
///
/// In JSON the variant is told apart by `isText`:
/// `{"isText":true,"sharedText":"..."}` or
/// `{"isText":false,"content":[{"url":"...","type":"..."}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "SharedDataRepr", try_from = "SharedDataRepr")]
pub enum SharedData {
    Text { shared_text: String },
    Content { content: Vec<SharedContent> },
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SharedDataRepr {
    is_text: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    shared_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<Vec<SharedContent>>,
}

impl From<SharedData> for SharedDataRepr {
    fn from(data: SharedData) -> Self {
        match data {
            SharedData::Text { shared_text } => Self {
                is_text: true,
                shared_text: Some(shared_text),
                content: None,
            },
            SharedData::Content { content } => Self {
                is_text: false,
                shared_text: None,
                content: Some(content),
            },
        }
    }
}

impl TryFrom<SharedDataRepr> for SharedData {
    type Error = String;

    fn try_from(repr: SharedDataRepr) -> Result<Self, Self::Error> {
        match (repr.is_text, repr.shared_text, repr.content) {
            (true, shared_text, None) => Ok(Self::Text {
                shared_text: shared_text.unwrap_or_default(),
            }),
            (false, None, content) => Ok(Self::Content {
                content: content.unwrap_or_default(),
            }),
            (true, _, Some(_)) => Err(String::from("text share with content")),
            (false, Some(_), _) => Err(String::from("content share with text")),
        }
    }
}

impl SharedData {
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text { .. })
    }
    pub fn shared_text(&self) -> Option<&str> {
        match self {
            Self::Text { shared_text } => Some(shared_text),
            Self::Content { .. } => None,
        }
    }
    pub fn content(&self) -> &[SharedContent] {
        match self {
            Self::Text { .. } => &[],
            Self::Content { content } => content,
        }
    }
}

/// Parse a share event and hand the result to the running application.
///
/// Malformed events are logged and dropped. Returns how the share was
/// delivered, or `None` if nothing was delivered.
pub fn handle_intent(
    intent: &ShareIntent,
    resolver: &dyn ContentResolver,
    lifecycle: &Lifecycle,
) -> Option<Delivery> {
    match parse_intent(intent, resolver) {
        Ok(Some(data)) => {
            match serde_json::to_string(&data) {
                Ok(json) => log::debug!("parsed share event: {json}"),
                Err(e) => log::warn!("failed to serialize share: {e}"),
            }
            Some(lifecycle.dispatch(data))
        }
        Ok(None) => {
            log::debug!("not a share event: {:?}", intent.action);
            None
        }
        Err(e) => {
            log::warn!("Ignoring malformed share event: {e}");
            None
        }
    }
}
