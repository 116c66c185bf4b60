use std::sync::Arc;

use lexi_store::{AuthError, DocumentStore, Identity, IdentityProvider, paths};
use lexi_types::UserProfile;

use crate::error::LexiError;
use crate::state::AppState;

/// Registration, sign-in and sign-out against the identity provider,
/// keeping `users/{uid}` and the shared session in step
#[derive(Clone)]
pub struct Auth {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
    state: Arc<AppState>,
}

impl Auth {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn DocumentStore>,
        state: Arc<AppState>,
    ) -> Self {
        Self {
            identity,
            store,
            state,
        }
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Identity, LexiError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::Rejected(
                "Username is required and cannot be empty.".to_string(),
            )
            .into());
        }

        let identity = self.identity.register(email.trim(), password, name).await?;
        self.store.set_auth_token(identity.token.clone());

        let profile = serde_json::to_value(UserProfile::new(name))?;
        self.store
            .overwrite(&paths::user(&identity.uid), profile)
            .await?;

        tracing::info!("registered {}", identity.uid);
        self.state.session.set(Some(identity.clone())).await;
        Ok(identity)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, LexiError> {
        let identity = self.identity.login(email.trim(), password).await?;
        self.store.set_auth_token(identity.token.clone());

        let path = paths::user(&identity.uid);
        if self.store.read_once(&path).await?.is_none() {
            let name = identity
                .display_name
                .clone()
                .unwrap_or_else(|| "Unknown".to_string());
            tracing::info!("initializing missing profile for {}", identity.uid);
            self.store
                .overwrite(&path, serde_json::to_value(UserProfile::new(name))?)
                .await?;
        }

        tracing::info!("signed in {}", identity.uid);
        self.state.session.set(Some(identity.clone())).await;
        Ok(identity)
    }

    pub async fn logout(&self) -> Result<(), LexiError> {
        self.identity.logout().await?;
        self.store.set_auth_token(None);
        if let Some(identity) = self.state.session.current().await {
            tracing::info!("signed out {}", identity.uid);
        }
        self.state.session.set(None).await;
        Ok(())
    }

    /// Display name stored in the profile
    pub async fn profile(&self, identity: &Identity) -> Result<UserProfile, LexiError> {
        let snapshot = self.store.read_once(&paths::user(&identity.uid)).await?;
        Ok(match snapshot {
            Some(value) => serde_json::from_value(value)?,
            None => UserProfile::new("User"),
        })
    }
}
