use crate::api::UserId;
use crate::send::SendRequest;
use crate::share::SharedData;
use indexmap::IndexSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Composing,
    PickingRecipients,
    Sending,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Destination {
    #[default]
    Private,
    Stream {
        stream: String,
        topic: String,
    },
}

/// Form state of the share screen.
#[derive(Debug, Clone)]
pub struct ComposerState {
    shared_data: SharedData,
    pub selected_recipients: IndexSet<UserId>,
    pub message: String,
    pub destination: Destination,
    phase: Phase,
}

impl ComposerState {
    pub fn new(shared_data: SharedData) -> Self {
        Self {
            message: shared_data.shared_text().unwrap_or_default().to_string(),
            shared_data,
            selected_recipients: IndexSet::new(),
            destination: Destination::default(),
            phase: Phase::Composing,
        }
    }
    pub fn shared_data(&self) -> &SharedData {
        &self.shared_data
    }
    pub fn phase(&self) -> Phase {
        self.phase
    }
    pub fn choosing_recipients(&self) -> bool {
        self.phase == Phase::PickingRecipients
    }
    pub fn sending(&self) -> bool {
        self.phase == Phase::Sending
    }
    pub fn open_picker(&mut self) {
        if self.phase == Phase::Composing {
            self.phase = Phase::PickingRecipients;
        }
    }
    pub fn close_picker(&mut self) {
        if self.phase == Phase::PickingRecipients {
            self.phase = Phase::Composing;
        }
    }
    /// Replace the selection with the picker's result and close the picker.
    pub fn complete_picker(&mut self, recipients: impl IntoIterator<Item = UserId>) {
        self.selected_recipients = recipients.into_iter().collect();
        self.close_picker();
    }
    fn has_destination(&self) -> bool {
        match &self.destination {
            Destination::Private => !self.selected_recipients.is_empty(),
            Destination::Stream { stream, topic } => {
                !stream.trim().is_empty() && !topic.trim().is_empty()
            }
        }
    }
    pub fn is_send_enabled(&self) -> bool {
        self.phase == Phase::Composing
            && self.has_destination()
            && (!self.shared_data.is_text() || !self.message.is_empty())
    }
    /// Enter the sending state and build the request, if sending is allowed.
    pub fn begin_send(&mut self) -> Option<SendRequest> {
        if !self.is_send_enabled() {
            return None;
        }
        self.phase = Phase::Sending;
        let (message, shared_data) = (self.message.clone(), self.shared_data.clone());
        Some(match &self.destination {
            Destination::Private => SendRequest::Private {
                recipient_ids: self.selected_recipients.iter().copied().collect(),
                message,
                shared_data,
            },
            Destination::Stream { stream, topic } => SendRequest::Stream {
                stream: stream.trim().to_string(),
                topic: topic.trim().to_string(),
                message,
                shared_data,
            },
        })
    }
    pub fn send_failed(&mut self) {
        if self.phase == Phase::Sending {
            self.phase = Phase::Composing;
        }
    }
    pub fn send_succeeded(&mut self) {
        self.phase = Phase::Done;
    }
    pub fn cancel(&mut self) {
        self.phase = Phase::Done;
    }
}

/// The conversation a message was sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Narrow {
    Private(Vec<UserId>),
    Stream { stream: String, topic: String },
}

impl Narrow {
    pub fn from_request(request: &SendRequest, own_user_id: Option<UserId>) -> Self {
        match request {
            SendRequest::Private { recipient_ids, .. } => {
                Self::Private(pm_key_recipients(recipient_ids, own_user_id))
            }
            SendRequest::Stream { stream, topic, .. } => Self::Stream {
                stream: stream.clone(),
                topic: topic.clone(),
            },
        }
    }
    /// Web app link to the conversation.
    pub fn url(&self, realm: &str) -> String {
        match self {
            Self::Private(ids) => format!(
                "{realm}/#narrow/dm/{}",
                ids.iter().map(UserId::to_string).collect::<Vec<_>>().join(",")
            ),
            Self::Stream { stream, topic } => format!(
                "{realm}/#narrow/channel/{}/topic/{}",
                encode_hash_component(stream),
                encode_hash_component(topic)
            ),
        }
    }
}

/// Sorted, deduplicated recipients without the own user, unless the
/// conversation is with oneself only.
pub fn pm_key_recipients(ids: &[UserId], own_user_id: Option<UserId>) -> Vec<UserId> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    if let Some(own) = own_user_id {
        let others = ids.iter().copied().filter(|id| *id != own).collect::<Vec<_>>();
        if !others.is_empty() {
            return others;
        }
    }
    ids
}

// percent-encoding with '.' in place of '%', as the web app does for hash
// fragments; '.', '(' and ')' are encoded as well
fn encode_hash_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'~' | b'!' | b'*' | b'\'' => {
                out.push(char::from(b))
            }
            _ => out.push_str(&format!(".{b:02X}")),
        }
    }
    out
}
