use std::sync::Arc;

use lexi_store::{DocumentStore, StoreError, Subscription, paths};
use lexi_types::{UserId, Word, WordDraft, WordId};

use crate::validation::{ValidationErrors, accept};
use crate::words::words_from_snapshot;

#[derive(Debug, thiserror::Error)]
pub enum WordError {
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Word {0} does not exist")]
    NotFound(WordId),
}

/// The signed-in user's word collection
#[derive(Clone)]
pub struct WordRepository {
    store: Arc<dyn DocumentStore>,
    uid: UserId,
}

impl WordRepository {
    pub fn new(store: Arc<dyn DocumentStore>, uid: UserId) -> Self {
        Self { store, uid }
    }

    pub fn uid(&self) -> &UserId {
        &self.uid
    }

    /// Validate against `existing` and store a new word
    pub async fn add(&self, draft: &WordDraft, existing: &[Word]) -> Result<Word, WordError> {
        let doc = accept(draft, existing, None)?;
        let value = serde_json::to_value(&doc).map_err(StoreError::from)?;
        let id = self
            .store
            .create_child(&paths::user_words(&self.uid), value)
            .await?;

        tracing::info!("added word {id} ({})", doc.text);
        Ok(Word::from_document(id, doc))
    }

    /// Replace an existing word
    pub async fn update(
        &self,
        id: &WordId,
        draft: &WordDraft,
        existing: &[Word],
    ) -> Result<Word, WordError> {
        if !existing.iter().any(|w| &w.id == id) {
            return Err(WordError::NotFound(id.clone()));
        }

        let doc = accept(draft, existing, Some(id.as_str()))?;
        let value = serde_json::to_value(&doc).map_err(StoreError::from)?;
        self.store
            .overwrite(&paths::user_word(&self.uid, id), value)
            .await?;

        tracing::info!("updated word {id}");
        Ok(Word::from_document(id.clone(), doc))
    }

    pub async fn delete(&self, id: &WordId) -> Result<(), WordError> {
        self.store.delete(&paths::user_word(&self.uid, id)).await?;
        tracing::info!("deleted word {id}");
        Ok(())
    }

    /// Current words, read once
    pub async fn list(&self) -> Result<Vec<Word>, WordError> {
        let snapshot = self.store.read_once(&paths::user_words(&self.uid)).await?;
        Ok(words_from_snapshot(&snapshot))
    }

    /// Live word snapshots, decoded with [`words_from_snapshot`]
    pub async fn subscribe(&self) -> Result<WordFeed, WordError> {
        let subscription = self.store.subscribe(&paths::user_words(&self.uid)).await?;
        Ok(WordFeed { subscription })
    }
}

pub struct WordFeed {
    subscription: Subscription,
}

impl WordFeed {
    pub async fn recv(&self) -> Option<Vec<Word>> {
        self.subscription
            .recv()
            .await
            .map(|snapshot| words_from_snapshot(&snapshot))
    }

    pub fn cancel_token(&self) -> tokio_util::sync::CancellationToken {
        self.subscription.cancel_token()
    }
}
