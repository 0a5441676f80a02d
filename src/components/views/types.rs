use crate::composer::Narrow;
use crate::send::Notifier;
use crate::share::SharedData;
use tokio::sync::mpsc::UnboundedSender;

pub type ViewId = u32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Home,
    Share(Box<SharedData>),
    Conversation(Box<Narrow>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Push(Box<View>),
    Pop,
    Replace(Box<View>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    NextItem,
    PrevItem,
    Enter,
    Back,
    Render,
    Toast(String),
    Transition(Transition),
    Sent { id: ViewId, ok: bool },
}

impl Notifier for UnboundedSender<Action> {
    fn notify(&self, message: &str) {
        if let Err(e) = self.send(Action::Toast(message.to_string())) {
            log::error!("failed to send toast: {e}");
        }
    }
}
