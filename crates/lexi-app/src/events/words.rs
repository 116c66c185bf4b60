use lexi_core::LexiError;
use lexi_core::repository::WordError;
use lexi_core::words::filter_words;
use lexi_types::{AppEvent, Word, WordDraft, WordId, WordQuery};

use crate::events::{AppContext, failure, quiz};

fn rejected(err: WordError) -> AppEvent {
    match err {
        WordError::Invalid(errors) => AppEvent::ValidationFailed(errors.kinds().collect()),
        other => failure(LexiError::from(other)),
    }
}

pub async fn handle_add(ctx: &mut AppContext, draft: WordDraft) -> anyhow::Result<()> {
    let event = match ctx.user.as_mut() {
        None => failure(LexiError::SignedOut),
        Some(user) => match user.repo.add(&draft, &user.words).await {
            Ok(word) => {
                let event = AppEvent::WordSaved {
                    id: word.id.clone(),
                    text: word.text.clone(),
                };
                user.words.push(word);
                event
            }
            Err(e) => rejected(e),
        },
    };

    ctx.send(event).await
}

pub async fn handle_update(
    ctx: &mut AppContext,
    id: WordId,
    draft: WordDraft,
) -> anyhow::Result<()> {
    let event = match ctx.user.as_mut() {
        None => failure(LexiError::SignedOut),
        Some(user) => match user.repo.update(&id, &draft, &user.words).await {
            Ok(word) => {
                let event = AppEvent::WordSaved {
                    id: word.id.clone(),
                    text: word.text.clone(),
                };
                if let Some(slot) = user.words.iter_mut().find(|w| w.id == word.id) {
                    *slot = word;
                }
                event
            }
            Err(e) => rejected(e),
        },
    };

    ctx.send(event).await
}

pub async fn handle_delete(ctx: &mut AppContext, id: WordId) -> anyhow::Result<()> {
    let event = match ctx.user.as_mut() {
        None => failure(LexiError::SignedOut),
        Some(user) if !user.words.iter().any(|w| w.id == id) => {
            rejected(WordError::NotFound(id))
        }
        Some(user) => match user.repo.delete(&id).await {
            Ok(()) => {
                user.words.retain(|w| w.id != id);
                AppEvent::WordDeleted(id)
            }
            Err(e) => rejected(e),
        },
    };

    ctx.send(event).await
}

pub async fn handle_list(ctx: &mut AppContext, query: WordQuery) -> anyhow::Result<()> {
    let event = match ctx.user.as_ref() {
        None => failure(LexiError::SignedOut),
        Some(user) => {
            let words: Vec<Word> = filter_words(&user.words, &query)
                .into_iter()
                .cloned()
                .collect();
            AppEvent::ShowWords {
                count: words.len(),
                words,
            }
        }
    };

    ctx.send(event).await
}

/// Store snapshot of the word collection
pub async fn handle_words_changed(ctx: &mut AppContext, words: Vec<Word>) -> anyhow::Result<()> {
    let Some(user) = ctx.user.as_mut() else {
        tracing::debug!("dropping word snapshot after sign out");
        return Ok(());
    };

    tracing::debug!("word snapshot: {} words", words.len());
    user.words = words;

    quiz::refresh(ctx).await
}
