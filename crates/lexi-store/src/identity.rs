use std::collections::HashMap;
use std::time::Duration;

use lexi_types::UserId;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::sync::Mutex;

const MIN_PASSWORD_LEN: usize = 6;

/// A signed-in account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: UserId,
    pub email: String,
    pub display_name: Option<String>,
    /// Bearer credential for the document store, if the provider issues one
    pub token: Option<String>,
}

/// Account registration and sign-in
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Identity, AuthError>;

    async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    async fn logout(&self) -> Result<(), AuthError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Provider message, shown to the user as-is
    #[error("{0}")]
    Rejected(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

struct Account {
    uid: UserId,
    password: String,
    display_name: Option<String>,
}

/// In-process account directory
#[derive(Default)]
pub struct MemoryIdentity {
    accounts: Mutex<HashMap<String, Account>>,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_email(email: &str) -> Result<(), AuthError> {
    let valid = email
        .split_once('@')
        .is_some_and(|(user, domain)| !user.is_empty() && domain.contains('.'))
        && !email.chars().any(char::is_whitespace);

    if valid {
        Ok(())
    } else {
        Err(AuthError::Rejected("INVALID_EMAIL".to_string()))
    }
}

#[async_trait::async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Identity, AuthError> {
        check_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Rejected(format!(
                "WEAK_PASSWORD : Password should be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let key = email.to_lowercase();
        let mut accounts = self.accounts.lock().await;
        if accounts.contains_key(&key) {
            return Err(AuthError::Rejected("EMAIL_EXISTS".to_string()));
        }

        let uid = uuid::Uuid::new_v4().simple().to_string();
        accounts.insert(
            key,
            Account {
                uid: uid.clone(),
                password: password.to_string(),
                display_name: Some(display_name.to_string()),
            },
        );

        tracing::info!("registered account {uid}");
        Ok(Identity {
            uid,
            email: email.to_string(),
            display_name: Some(display_name.to_string()),
            token: None,
        })
    }

    async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let accounts = self.accounts.lock().await;
        let account = accounts
            .get(&email.to_lowercase())
            .ok_or_else(|| AuthError::Rejected("EMAIL_NOT_FOUND".to_string()))?;

        if account.password != password {
            return Err(AuthError::Rejected("INVALID_PASSWORD".to_string()));
        }

        Ok(Identity {
            uid: account.uid.clone(),
            email: email.to_string(),
            display_name: account.display_name.clone(),
            token: None,
        })
    }

    async fn logout(&self) -> Result<(), AuthError> {
        Ok(())
    }
}

/// Identity toolkit REST client (`accounts:signUp`, `accounts:signInWithPassword`)
#[derive(Clone)]
pub struct RestIdentity {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    email: String,
    id_token: String,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl RestIdentity {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    /// Invoke an `accounts:*` action
    async fn invoke<T>(&self, action: &str, body: serde_json::Value) -> Result<T, AuthError>
    where
        T: DeserializeOwned,
    {
        if self.api_key.is_empty() {
            return Err(AuthError::Rejected("API key not configured".to_string()));
        }

        let url = format!("{}/accounts:{action}", self.base_url);
        let response = self
            .client
            .post(url)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let envelope: ErrorEnvelope = response
                .json()
                .await
                .map_err(|_| AuthError::InvalidResponse(format!("HTTP {status}")))?;
            return Err(AuthError::Rejected(envelope.error.message));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))
    }
}

#[async_trait::async_trait]
impl IdentityProvider for RestIdentity {
    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Identity, AuthError> {
        let account: AccountResponse = self
            .invoke(
                "signUp",
                json!({"email": email, "password": password, "returnSecureToken": true}),
            )
            .await?;

        let _: serde_json::Value = self
            .invoke(
                "update",
                json!({
                    "idToken": account.id_token,
                    "displayName": display_name,
                    "returnSecureToken": false
                }),
            )
            .await?;

        Ok(Identity {
            uid: account.local_id,
            email: account.email,
            display_name: Some(display_name.to_string()),
            token: Some(account.id_token),
        })
    }

    async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let account: AccountResponse = self
            .invoke(
                "signInWithPassword",
                json!({"email": email, "password": password, "returnSecureToken": true}),
            )
            .await?;

        Ok(Identity {
            uid: account.local_id,
            email: account.email,
            display_name: account.display_name.filter(|n| !n.is_empty()),
            token: Some(account.id_token),
        })
    }

    async fn logout(&self) -> Result<(), AuthError> {
        // ID tokens are stateless, nothing to revoke server side
        Ok(())
    }
}
