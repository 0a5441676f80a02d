use crate::api::{Auth, User, UserId, ZulipApi};
use crate::send::{handle_send, Notifier, SendError, SendRequest};
use std::sync::{Arc, PoisonError, RwLock};

/// Users known to the server, fetched once per session.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    pub own_user_id: Option<UserId>,
    pub users: Vec<User>,
    pub loaded: bool,
}

impl Directory {
    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.user_id == id)
    }
    pub fn display_name(&self, id: UserId) -> String {
        self.user(id)
            .map_or_else(|| format!("user {id}"), |u| u.full_name.clone())
    }
    /// Active users other than oneself, by name.
    pub fn candidates(&self) -> Vec<User> {
        let mut users = self
            .users
            .iter()
            .filter(|u| u.is_active && Some(u.user_id) != self.own_user_id)
            .cloned()
            .collect::<Vec<_>>();
        users.sort_by(|a, b| a.full_name.to_lowercase().cmp(&b.full_name.to_lowercase()));
        users
    }
}

/// Connection to one Zulip server.
#[derive(Clone)]
pub struct Session {
    api: Arc<dyn ZulipApi>,
    pub auth: Auth,
    pub directory: Arc<RwLock<Directory>>,
}

impl Session {
    pub fn new(api: Arc<dyn ZulipApi>, auth: Auth) -> Self {
        Self {
            api,
            auth,
            directory: Arc::new(RwLock::new(Directory::default())),
        }
    }
    pub fn directory(&self) -> Directory {
        self.directory
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
    /// Fetch the own user and the user list.
    pub async fn load_directory(&self) {
        let own = match self.api.get_own_user(&self.auth).await {
            Ok(user) => Some(user.user_id),
            Err(e) => {
                log::error!("failed to get own user: {e}");
                None
            }
        };
        let users = match self.api.get_users(&self.auth).await {
            Ok(users) => users,
            Err(e) => {
                log::error!("failed to get users: {e}");
                Vec::new()
            }
        };
        log::info!("loaded {} users", users.len());
        let mut directory = self
            .directory
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        directory.own_user_id = own;
        directory.users = users;
        directory.loaded = true;
    }
    pub async fn send(
        &self,
        request: &SendRequest,
        notifier: &dyn Notifier,
    ) -> Result<(), SendError> {
        handle_send(self.api.as_ref(), &self.auth, request, notifier).await
    }
}
