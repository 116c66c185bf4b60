use lexi_config::Config;
use lexi_store::Identity;
use tokio::sync::RwLock;

/// Signed-in account, shared read-only outside of the auth flow
#[derive(Default)]
pub struct Session {
    current: RwLock<Option<Identity>>,
}

impl Session {
    pub async fn current(&self) -> Option<Identity> {
        self.current.read().await.clone()
    }

    pub async fn is_signed_in(&self) -> bool {
        self.current.read().await.is_some()
    }

    pub(crate) async fn set(&self, identity: Option<Identity>) {
        *self.current.write().await = identity;
    }
}

#[derive(Default)]
pub struct AppState {
    pub config: RwLock<Config>,
    pub session: Session,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: RwLock::new(config),
            session: Session::default(),
        }
    }
}
