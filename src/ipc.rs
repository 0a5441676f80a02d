//! Forwarding share events to an already running instance.
//!
//! A running instance listens on a Unix socket. Each connection carries one
//! share event encoded as a single JSON line.

use crate::share::{handle_intent, parse_intent, ContentResolver, Lifecycle, ShareIntent};
use crate::utils::get_runtime_dir;
use color_eyre::{eyre, Result};
use std::io::ErrorKind;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::task::JoinHandle;

const SOCKET_NAME: &str = "zulip-share.sock";

pub fn socket_path() -> Result<PathBuf> {
    let dir = get_runtime_dir()?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir.join(SOCKET_NAME))
}

/// Send the event to a running instance.
///
/// The event is parsed here first, so a malformed one is reported to the
/// caller instead of being dropped by the receiver. Returns `false` if the
/// event is not a share or no instance is listening.
pub async fn forward(
    path: &Path,
    intent: &ShareIntent,
    resolver: &dyn ContentResolver,
) -> Result<bool> {
    if parse_intent(intent, resolver)?.is_none() {
        log::debug!("not a share event: {:?}", intent.action);
        return Ok(false);
    }
    let mut stream = match UnixStream::connect(path).await {
        Ok(stream) => stream,
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::ConnectionRefused) => {
            log::debug!("no running instance at {}: {e}", path.display());
            return Ok(false);
        }
        Err(e) => return Err(e.into()),
    };
    let mut line = serde_json::to_string(intent)?;
    line.push('\n');
    stream.write_all(line.as_bytes()).await?;
    stream.shutdown().await?;
    log::info!("forwarded share event to {}", path.display());
    Ok(true)
}

/// Accepts forwarded events while alive.
pub struct Listener {
    path: PathBuf,
    // (device, inode) of the socket file bound here
    file_id: (u64, u64),
    task: JoinHandle<()>,
}

fn file_id(path: &Path) -> std::io::Result<(u64, u64)> {
    let metadata = std::fs::metadata(path)?;
    Ok((metadata.dev(), metadata.ino()))
}

impl Listener {
    pub fn bind(
        path: PathBuf,
        lifecycle: Arc<Lifecycle>,
        resolver: Arc<dyn ContentResolver>,
    ) -> Result<Self> {
        match std::os::unix::net::UnixStream::connect(&path) {
            Ok(_) => {
                return Err(eyre::eyre!(
                    "another instance is listening on {}",
                    path.display()
                ))
            }
            // left over from an instance that did not exit cleanly
            Err(e) if e.kind() == ErrorKind::ConnectionRefused => {
                std::fs::remove_file(&path)?;
                log::debug!("removed stale socket {}", path.display());
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        let listener = UnixListener::bind(&path)?;
        let file_id = file_id(&path)?;
        log::info!("listening on {}", path.display());
        let task = tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, _)) => {
                        let (lifecycle, resolver) = (lifecycle.clone(), resolver.clone());
                        tokio::spawn(async move {
                            if let Err(e) =
                                Self::receive(stream, &lifecycle, resolver.as_ref()).await
                            {
                                log::warn!("failed to receive share event: {e}");
                            }
                        });
                    }
                    Err(e) => {
                        log::error!("failed to accept connection: {e}");
                        break;
                    }
                }
            }
        });
        Ok(Self {
            path,
            file_id,
            task,
        })
    }
    async fn receive(
        stream: UnixStream,
        lifecycle: &Lifecycle,
        resolver: &dyn ContentResolver,
    ) -> Result<()> {
        let mut lines = BufReader::new(stream).lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let intent = serde_json::from_str::<ShareIntent>(&line)?;
            log::debug!("received share event: {intent:?}");
            handle_intent(&intent, resolver, lifecycle);
        }
        Ok(())
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.task.abort();
        match file_id(&self.path) {
            Ok(id) if id == self.file_id => {
                if let Err(e) = std::fs::remove_file(&self.path) {
                    log::warn!("failed to remove {}: {e}", self.path.display());
                }
            }
            Ok(_) => log::debug!("{} belongs to another listener", self.path.display()),
            Err(e) => log::debug!("socket {} is gone: {e}", self.path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::share::{AppStatus, MimeGuessResolver, ShareAction, SharedData};
    use crate::types::Action;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    fn text_intent(text: &str) -> ShareIntent {
        ShareIntent::from_args(
            Some(ShareAction::Send),
            None,
            Some(text.to_string()),
            Vec::new(),
        )
    }

    #[tokio::test]
    async fn forward_without_instance() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join(SOCKET_NAME);
        assert!(!forward(&path, &text_intent("hi"), &MimeGuessResolver)
            .await
            .expect("forward failed"));
    }

    #[tokio::test]
    async fn forward_to_running_instance() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join(SOCKET_NAME);
        let lifecycle = Arc::new(Lifecycle::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        lifecycle.ready(tx);
        let listener = Listener::bind(path.clone(), lifecycle.clone(), Arc::new(MimeGuessResolver))
            .expect("failed to bind");

        assert!(forward(&path, &text_intent("hello"), &MimeGuessResolver)
            .await
            .expect("forward failed"));
        let action = timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out");
        match action {
            Some(Action::ShareReceived(data)) => assert_eq!(
                *data,
                SharedData::Text {
                    shared_text: String::from("hello")
                }
            ),
            other => panic!("unexpected action: {other:?}"),
        }
        assert_eq!(lifecycle.status(), AppStatus::Foreground);

        drop(listener);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn stale_socket_is_replaced() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join(SOCKET_NAME);
        std::fs::write(&path, b"").expect("failed to write");
        let lifecycle = Arc::new(Lifecycle::default());
        let _listener = Listener::bind(path.clone(), lifecycle.clone(), Arc::new(MimeGuessResolver))
            .expect("failed to bind");
        assert!(forward(&path, &text_intent("queued"), &MimeGuessResolver)
            .await
            .expect("forward failed"));
        // not running yet, so the share waits in the slot
        let data = timeout(Duration::from_secs(5), async {
            loop {
                if let Some(data) = lifecycle.take_pending() {
                    break data;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("timed out");
        assert_eq!(data.shared_text(), Some("queued"));
    }

    fn bind(path: &Path, lifecycle: &Arc<Lifecycle>) -> Result<Listener> {
        Listener::bind(
            path.to_path_buf(),
            lifecycle.clone(),
            Arc::new(MimeGuessResolver),
        )
    }

    async fn received(rx: &mut mpsc::UnboundedReceiver<Action>) -> Option<SharedData> {
        match timeout(Duration::from_secs(5), rx.recv()).await {
            Ok(Some(Action::ShareReceived(data))) => Some(*data),
            _ => None,
        }
    }

    #[tokio::test]
    async fn socket_of_exited_instance_is_replaced() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join(SOCKET_NAME);
        drop(std::os::unix::net::UnixListener::bind(&path).expect("failed to bind"));
        assert!(path.exists());
        let lifecycle = Arc::new(Lifecycle::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        lifecycle.ready(tx);
        let _listener = bind(&path, &lifecycle).expect("failed to bind");
        assert!(forward(&path, &text_intent("again"), &MimeGuessResolver)
            .await
            .expect("forward failed"));
        assert_eq!(
            received(&mut rx).await.as_ref().and_then(SharedData::shared_text),
            Some("again")
        );
    }

    #[tokio::test]
    async fn second_instance_leaves_socket_alone() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join(SOCKET_NAME);
        let first = Arc::new(Lifecycle::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        first.ready(tx);
        let _first_listener = bind(&path, &first).expect("failed to bind");

        let second = Arc::new(Lifecycle::default());
        assert!(bind(&path, &second).is_err());
        assert!(path.exists());

        assert!(forward(&path, &text_intent("still here"), &MimeGuessResolver)
            .await
            .expect("forward failed"));
        assert_eq!(
            received(&mut rx).await.as_ref().and_then(SharedData::shared_text),
            Some("still here")
        );
        assert_eq!(second.take_pending(), None);
    }

    #[tokio::test]
    async fn drop_keeps_socket_of_newer_listener() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join(SOCKET_NAME);
        let old = Arc::new(Lifecycle::default());
        let old_listener = bind(&path, &old).expect("failed to bind");
        std::fs::remove_file(&path).expect("failed to remove");

        let new = Arc::new(Lifecycle::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        new.ready(tx);
        let _new_listener = bind(&path, &new).expect("failed to bind");
        drop(old_listener);
        assert!(path.exists());

        assert!(forward(&path, &text_intent("new"), &MimeGuessResolver)
            .await
            .expect("forward failed"));
        assert_eq!(
            received(&mut rx).await.as_ref().and_then(SharedData::shared_text),
            Some("new")
        );
    }

    #[tokio::test]
    async fn malformed_share_is_not_forwarded() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join(SOCKET_NAME);
        let lifecycle = Arc::new(Lifecycle::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        lifecycle.ready(tx);
        let _listener = bind(&path, &lifecycle).expect("failed to bind");

        let two_files = ShareIntent::from_args(
            Some(ShareAction::Send),
            None,
            None,
            vec![String::from("/tmp/a.png"), String::from("/tmp/b.png")],
        );
        assert!(forward(&path, &two_files, &MimeGuessResolver).await.is_err());

        let view = ShareIntent::from_args(Some(ShareAction::View), None, None, Vec::new());
        assert!(!forward(&path, &view, &MimeGuessResolver)
            .await
            .expect("forward failed"));

        assert!(
            timeout(Duration::from_millis(200), rx.recv()).await.is_err(),
            "nothing should reach the running instance"
        );
    }
}
