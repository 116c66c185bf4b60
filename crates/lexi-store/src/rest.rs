use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::{DocumentStore, Snapshot, StoreError, Subscription, split_path};

/// Realtime database REST client
///
/// Every path maps to `{base_url}/{path}.json`. Live subscriptions poll the path
/// and emit a snapshot whenever it differs from the previous one.
#[derive(Clone)]
pub struct RestStore {
    base_url: String,
    client: reqwest::Client,
    auth_token: Arc<RwLock<Option<String>>>,
    poll_interval: Duration,
}

#[derive(Deserialize)]
struct PushResponse {
    name: String,
}

impl RestStore {
    pub fn new(
        base_url: String,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            auth_token: Arc::new(RwLock::new(None)),
            poll_interval,
        })
    }

    fn url(&self, path: &str) -> Result<String, StoreError> {
        let keys = split_path(path)?;
        Ok(format!("{}/{}.json", self.base_url, keys.join("/")))
    }

    fn token(&self) -> Option<String> {
        match self.auth_token.read() {
            Ok(token) => token.clone(),
            Err(_) => None,
        }
    }

    /// Send a request with credentials and map HTTP failures
    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let request = match self.token() {
            Some(token) => request.query(&[("auth", token)]),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();

        if status == 401 || status == 403 {
            return Err(StoreError::PermissionDenied);
        }

        if status == 503 {
            return Err(StoreError::Unavailable(format!("HTTP {status}")));
        }

        if !status.is_success() {
            return Err(StoreError::Http(status.as_u16()));
        }

        Ok(response)
    }

    async fn fetch(&self, path: &str) -> Result<Snapshot, StoreError> {
        let url = self.url(path)?;
        let response = self.send(self.client.get(url)).await?;
        let value: Value = response.json().await?;

        Ok(match value {
            Value::Null => None,
            value => Some(value),
        })
    }

    async fn poll(self, path: String, tx: kanal::AsyncSender<Snapshot>, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.poll_interval);
        let mut last: Option<Snapshot> = None;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            match self.fetch(&path).await {
                Ok(snapshot) => {
                    if last.as_ref() == Some(&snapshot) {
                        continue;
                    }
                    last = Some(snapshot.clone());
                    if tx.send(snapshot).await.is_err() {
                        break;
                    }
                }
                Err(e) => tracing::warn!("poll of {path} failed: {e}"),
            }
        }

        tracing::debug!("stopped polling {path}");
    }
}

#[async_trait::async_trait]
impl DocumentStore for RestStore {
    async fn subscribe(&self, path: &str) -> Result<Subscription, StoreError> {
        // Validate before spawning
        self.url(path)?;

        let (tx, rx) = kanal::unbounded_async();
        let cancel = CancellationToken::new();

        tokio::spawn(self.clone().poll(path.to_string(), tx, cancel.clone()));

        Ok(Subscription::new(rx, cancel))
    }

    async fn create_child(&self, path: &str, value: Value) -> Result<String, StoreError> {
        let url = self.url(path)?;
        let response = self.send(self.client.post(url).json(&value)).await?;
        let pushed: PushResponse = response.json().await?;
        Ok(pushed.name)
    }

    async fn read_once(&self, path: &str) -> Result<Snapshot, StoreError> {
        self.fetch(path).await
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        let url = self.url(path)?;
        self.send(self.client.patch(url).json(&fields)).await?;
        Ok(())
    }

    async fn overwrite(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let url = self.url(path)?;
        self.send(self.client.put(url).json(&value)).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        let url = self.url(path)?;
        self.send(self.client.delete(url)).await?;
        Ok(())
    }

    fn set_auth_token(&self, token: Option<String>) {
        if let Ok(mut current) = self.auth_token.write() {
            *current = token;
        }
    }
}
