use super::{SharedContent, SharedData};
use serde::{Deserialize, Serialize};
use std::path::Path;

const TEXT_PLAIN: &str = "text/plain";
const ANY_TYPE: &str = "*/*";
const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ShareParseError {
    #[error("share event carries both a single resource and a resource list")]
    AmbiguousStreams,
    #[error("single-item share event carries a resource list")]
    UnexpectedList,
    #[error("multi-item share event carries a single resource")]
    UnexpectedSingle,
    #[error("empty resource locator at position {0}")]
    EmptyLocator(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ShareAction {
    Send,
    SendMultiple,
    View,
}

/// A share event as delivered by the desktop: the declared content type,
/// an optional text payload and resource references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareIntent {
    pub action: ShareAction,
    #[serde(rename = "type", default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub stream: Option<String>,
    #[serde(default)]
    pub streams: Option<Vec<String>>,
}

impl ShareIntent {
    /// Build a share event from command line arguments.
    ///
    /// Without an explicit action, one path (or none) is a single send and
    /// several paths are a multi send. Without an explicit type, a text-only
    /// event is `text/plain`.
    pub fn from_args(
        action: Option<ShareAction>,
        mime_type: Option<String>,
        text: Option<String>,
        paths: Vec<String>,
    ) -> Self {
        let paths = paths
            .into_iter()
            .map(|p| absolute_locator(&p))
            .collect::<Vec<_>>();
        let action = action.unwrap_or(if paths.len() > 1 {
            ShareAction::SendMultiple
        } else {
            ShareAction::Send
        });
        let mime_type = mime_type.or_else(|| {
            Some(String::from(if paths.is_empty() && text.is_some() {
                TEXT_PLAIN
            } else {
                ANY_TYPE
            }))
        });
        let (stream, streams) = match (action, paths.len()) {
            (_, 0) => (None, None),
            (ShareAction::Send, 1) => (paths.into_iter().next(), None),
            _ => (None, Some(paths)),
        };
        Self {
            action,
            mime_type,
            text,
            stream,
            streams,
        }
    }
    pub fn is_share(&self) -> bool {
        matches!(self.action, ShareAction::Send | ShareAction::SendMultiple)
    }
}

fn absolute_locator(locator: &str) -> String {
    if locator.contains("://") {
        return locator.to_string();
    }
    std::path::absolute(locator)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| locator.to_string())
}

/// Resolves the MIME type of a shared resource.
pub trait ContentResolver: Send + Sync {
    fn get_type(&self, locator: &str) -> Option<String>;
}

/// Resolves types from the locator's file extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct MimeGuessResolver;

impl ContentResolver for MimeGuessResolver {
    fn get_type(&self, locator: &str) -> Option<String> {
        let path = locator.strip_prefix("file://").unwrap_or(locator);
        mime_guess::from_path(Path::new(path))
            .first()
            .map(|mime| mime.essence_str().to_string())
    }
}

/// Convert a share event into [`SharedData`].
///
/// Returns `Ok(None)` for events that are not shares at all.
pub fn parse_intent(
    intent: &ShareIntent,
    resolver: &dyn ContentResolver,
) -> Result<Option<SharedData>, ShareParseError> {
    if !intent.is_share() {
        return Ok(None);
    }
    if intent.mime_type.as_deref() == Some(TEXT_PLAIN) {
        return Ok(Some(SharedData::Text {
            shared_text: intent.text.clone().unwrap_or_default(),
        }));
    }
    let locators: &[String] = match (&intent.stream, &intent.streams) {
        (Some(_), Some(_)) => return Err(ShareParseError::AmbiguousStreams),
        (Some(_), None) if intent.action == ShareAction::SendMultiple => {
            return Err(ShareParseError::UnexpectedSingle)
        }
        (None, Some(_)) if intent.action == ShareAction::Send => {
            return Err(ShareParseError::UnexpectedList)
        }
        (Some(url), None) => std::slice::from_ref(url),
        (None, Some(urls)) => urls,
        (None, None) => &[],
    };
    // a concrete declared type stands in for locators the resolver cannot type
    let fallback = intent
        .mime_type
        .as_deref()
        .filter(|t| t.contains('/') && !t.contains('*'))
        .unwrap_or(OCTET_STREAM);
    let content = locators
        .iter()
        .enumerate()
        .map(|(i, url)| {
            if url.is_empty() {
                return Err(ShareParseError::EmptyLocator(i));
            }
            Ok(SharedContent {
                url: url.clone(),
                mime_type: resolver
                    .get_type(url)
                    .unwrap_or_else(|| fallback.to_string()),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(SharedData::Content { content }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn send(mime_type: &str) -> ShareIntent {
        ShareIntent {
            action: ShareAction::Send,
            mime_type: Some(mime_type.to_string()),
            text: None,
            stream: None,
            streams: None,
        }
    }

    #[test]
    fn text_share() {
        let intent = ShareIntent {
            text: Some(String::from("hello")),
            ..send("text/plain")
        };
        assert_eq!(
            parse_intent(&intent, &MimeGuessResolver),
            Ok(Some(SharedData::Text {
                shared_text: String::from("hello")
            }))
        );
    }

    #[test]
    fn text_share_without_payload() {
        assert_eq!(
            parse_intent(&send("text/plain"), &MimeGuessResolver),
            Ok(Some(SharedData::Text {
                shared_text: String::new()
            }))
        );
    }

    #[test]
    fn text_share_ignores_streams() {
        let intent = ShareIntent {
            text: Some(String::from("hello")),
            stream: Some(String::from("/tmp/a.png")),
            ..send("text/plain")
        };
        let data = parse_intent(&intent, &MimeGuessResolver)
            .expect("failed to parse")
            .expect("not a share");
        assert!(data.is_text());
        assert!(data.content().is_empty());
    }

    #[test]
    fn single_resource() {
        let intent = ShareIntent {
            stream: Some(String::from("/tmp/photo.jpg")),
            ..send("image/*")
        };
        assert_eq!(
            parse_intent(&intent, &MimeGuessResolver),
            Ok(Some(SharedData::Content {
                content: vec![SharedContent {
                    url: String::from("/tmp/photo.jpg"),
                    mime_type: String::from("image/jpeg"),
                }]
            }))
        );
    }

    #[test]
    fn multiple_resources_keep_order() {
        let intent = ShareIntent {
            action: ShareAction::SendMultiple,
            streams: Some(vec![
                String::from("file:///tmp/b.png"),
                String::from("/tmp/a.pdf"),
                String::from("/tmp/unknown"),
            ]),
            ..send("*/*")
        };
        let data = parse_intent(&intent, &MimeGuessResolver)
            .expect("failed to parse")
            .expect("not a share");
        assert_eq!(
            data.content()
                .iter()
                .map(|c| (c.url.as_str(), c.mime_type.as_str()))
                .collect::<Vec<_>>(),
            vec![
                ("file:///tmp/b.png", "image/png"),
                ("/tmp/a.pdf", "application/pdf"),
                ("/tmp/unknown", "application/octet-stream"),
            ]
        );
    }

    #[test]
    fn no_resources() {
        assert_eq!(
            parse_intent(&send("image/png"), &MimeGuessResolver),
            Ok(Some(SharedData::Content {
                content: Vec::new()
            }))
        );
    }

    #[test]
    fn declared_type_for_untyped_locator() {
        let untyped = |mime_type: &str| {
            let intent = ShareIntent {
                stream: Some(String::from("/tmp/photo")),
                ..send(mime_type)
            };
            parse_intent(&intent, &MimeGuessResolver)
                .expect("failed to parse")
                .expect("not a share")
                .content()[0]
                .mime_type
                .clone()
        };
        assert_eq!(untyped("image/png"), "image/png");
        assert_eq!(untyped("image/*"), "application/octet-stream");
        assert_eq!(untyped("*/*"), "application/octet-stream");

        // the guess wins over the declared type
        let intent = ShareIntent {
            stream: Some(String::from("/tmp/a.pdf")),
            ..send("image/png")
        };
        assert_eq!(
            parse_intent(&intent, &MimeGuessResolver)
                .expect("failed to parse")
                .expect("not a share")
                .content()[0]
                .mime_type,
            "application/pdf"
        );
    }

    #[test]
    fn malformed_shapes() {
        let both = ShareIntent {
            stream: Some(String::from("/tmp/a.png")),
            streams: Some(vec![String::from("/tmp/b.png")]),
            ..send("image/png")
        };
        assert_eq!(
            parse_intent(&both, &MimeGuessResolver),
            Err(ShareParseError::AmbiguousStreams)
        );
        let list_in_single = ShareIntent {
            streams: Some(vec![String::from("/tmp/b.png")]),
            ..send("image/png")
        };
        assert_eq!(
            parse_intent(&list_in_single, &MimeGuessResolver),
            Err(ShareParseError::UnexpectedList)
        );
        let single_in_multiple = ShareIntent {
            action: ShareAction::SendMultiple,
            stream: Some(String::from("/tmp/a.png")),
            ..send("image/png")
        };
        assert_eq!(
            parse_intent(&single_in_multiple, &MimeGuessResolver),
            Err(ShareParseError::UnexpectedSingle)
        );
        let empty = ShareIntent {
            action: ShareAction::SendMultiple,
            streams: Some(vec![String::from("/tmp/a.png"), String::new()]),
            ..send("image/png")
        };
        assert_eq!(
            parse_intent(&empty, &MimeGuessResolver),
            Err(ShareParseError::EmptyLocator(1))
        );
    }

    #[test]
    fn from_args() {
        let intent = ShareIntent::from_args(None, None, Some(String::from("hi")), Vec::new());
        assert_eq!(intent.action, ShareAction::Send);
        assert_eq!(intent.mime_type.as_deref(), Some("text/plain"));

        let intent = ShareIntent::from_args(
            None,
            None,
            None,
            vec![String::from("/tmp/a.png"), String::from("/tmp/b.png")],
        );
        assert_eq!(intent.action, ShareAction::SendMultiple);
        assert_eq!(intent.mime_type.as_deref(), Some("*/*"));
        assert_eq!(intent.stream, None);
        assert_eq!(intent.streams.map(|v| v.len()), Some(2));

        let intent = ShareIntent::from_args(
            None,
            Some(String::from("image/png")),
            None,
            vec![String::from("https://example.com/a.png")],
        );
        assert_eq!(intent.stream.as_deref(), Some("https://example.com/a.png"));
        assert_eq!(intent.streams, None);
    }

    #[test]
    fn deserialize_forwarded_event() {
        let intent = serde_json::from_str::<ShareIntent>(
            r#"{"action":"send-multiple","type":"*/*","streams":["/tmp/a.png"]}"#,
        )
        .expect("failed to deserialize");
        assert_eq!(intent.action, ShareAction::SendMultiple);
        assert_eq!(intent.text, None);
        assert_eq!(intent.streams, Some(vec![String::from("/tmp/a.png")]));
    }
}
