use super::SharedData;
use crate::types::Action;
use std::sync::{Mutex, PoisonError, RwLock};
use tokio::sync::mpsc::UnboundedSender;

/// Name of the live event carrying a share to a running application.
pub const SHARE_RECEIVED: &str = "shareReceived";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppStatus {
    #[default]
    NotRunning,
    Background,
    Foreground,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Stored,
    Emitted,
}

/// Holds at most one share received before the application was ready.
///
/// A second share overwrites the first; the application takes it once.
#[derive(Debug, Default)]
pub struct PendingShare(Mutex<Option<SharedData>>);

impl PendingShare {
    pub fn store(&self, data: SharedData) -> Option<SharedData> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(data)
    }
    pub fn take(&self) -> Option<SharedData> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

/// Application lifecycle as seen by the share entry points.
#[derive(Debug, Default)]
pub struct Lifecycle {
    status: RwLock<AppStatus>,
    pending: PendingShare,
    bus: RwLock<Option<UnboundedSender<Action>>>,
}

impl Lifecycle {
    pub fn status(&self) -> AppStatus {
        *self.status.read().unwrap_or_else(PoisonError::into_inner)
    }
    pub fn set_status(&self, status: AppStatus) {
        let mut current = self.status.write().unwrap_or_else(PoisonError::into_inner);
        if *current != status {
            log::debug!("app status {:?} -> {status:?}", *current);
            *current = status;
        }
    }
    /// Mark the application ready to receive live events, and take the share
    /// that arrived before it was.
    pub fn ready(&self, bus: UnboundedSender<Action>) -> Option<SharedData> {
        self.bus
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(bus);
        self.set_status(AppStatus::Foreground);
        self.pending.take()
    }
    pub fn shutdown(&self) {
        self.set_status(AppStatus::NotRunning);
        self.bus.write().unwrap_or_else(PoisonError::into_inner).take();
    }
    pub fn take_pending(&self) -> Option<SharedData> {
        self.pending.take()
    }
    /// Deliver a share either through the pending slot or as a live event,
    /// depending on the application status.
    pub fn dispatch(&self, data: SharedData) -> Delivery {
        let status = self.status();
        log::debug!("app status is {status:?}");
        if status != AppStatus::NotRunning {
            let bus = self.bus.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(tx) = bus.as_ref() {
                if tx
                    .send(Action::ShareReceived(Box::new(data.clone())))
                    .is_ok()
                {
                    log::info!("emitted {SHARE_RECEIVED}");
                    return Delivery::Emitted;
                }
                log::warn!("event bus closed, storing share");
            }
        }
        if self.pending.store(data).is_some() {
            log::info!("pending share overwritten");
        }
        Delivery::Stored
    }
}
