use std::sync::Arc;

use kanal::{AsyncReceiver, AsyncSender};
use lexi_core::LexiError;
use lexi_core::auth::Auth;
use lexi_core::repository::{WordFeed, WordRepository};
use lexi_core::score::ScoreLedger;
use lexi_core::session::QuizSession;
use lexi_core::state::AppState;
use lexi_store::{Identity, StoreError};
use lexi_types::{AppEvent, Word};
use rand::rngs::StdRng;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::backend::Backends;

pub mod auth;
pub mod quiz;
pub mod words;

/// Everything a signed-in user owns while the session lasts
pub struct UserContext {
    pub repo: WordRepository,
    pub ledger: ScoreLedger,
    pub words: Vec<Word>,
    cancel: CancellationToken,
    tasks: JoinSet<()>,
    /// Score writes still in flight
    writes: JoinSet<()>,
}

impl UserContext {
    /// Run a score write alongside the event loop, finished before sign-out
    pub fn spawn_write<F>(&mut self, write: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        while self.writes.try_join_next().is_some() {}
        self.writes.spawn(write);
    }
}

pub struct AppContext {
    pub state: Arc<AppState>,
    pub backends: Backends,
    pub auth: Auth,
    pub user: Option<UserContext>,
    pub quiz: Option<QuizSession>,
    pub rng: StdRng,
    /// Feeds store notifications back into the event loop
    pub loopback: AsyncSender<AppEvent>,
    pub app_to_ui_tx: AsyncSender<AppEvent>,
    cancel: CancellationToken,
}

impl AppContext {
    pub async fn send(&self, event: AppEvent) -> anyhow::Result<()> {
        self.app_to_ui_tx.send(event).await?;
        Ok(())
    }

    /// Open the user's word feed and score follower
    pub async fn sign_in(&mut self, identity: &Identity) -> Result<(), LexiError> {
        self.sign_out().await;

        let store = self.backends.store.clone();
        let repo = WordRepository::new(store.clone(), identity.uid.clone());
        let ledger = ScoreLedger::new(store, identity.uid.clone());

        let words = repo.list().await?;
        ledger.resync().await?;
        let feed = repo.subscribe().await?;

        let cancel = self.cancel.child_token();
        let mut tasks = JoinSet::new();

        tasks.spawn(forward_words(feed, self.loopback.clone(), cancel.clone()));

        {
            let ledger = ledger.clone();
            let cancel = cancel.clone();
            tasks.spawn(async move {
                if let Err(e) = ledger.follow(cancel).await {
                    tracing::error!("score subscription failed: {e}");
                }
            });
        }

        tasks.spawn(forward_score(
            ledger.watch(),
            self.app_to_ui_tx.clone(),
            cancel.clone(),
        ));

        tracing::info!("loaded {} words for {}", words.len(), identity.uid);
        self.user = Some(UserContext {
            repo,
            ledger,
            words,
            cancel,
            tasks,
            writes: JoinSet::new(),
        });

        Ok(())
    }

    /// Leave any quiz and release the user's subscriptions
    pub async fn sign_out(&mut self) {
        self.quiz = None;

        if let Some(mut user) = self.user.take() {
            if !user.writes.is_empty() {
                tracing::debug!("waiting for {} score write(s)", user.writes.len());
                user.writes.join_all().await;
            }
            user.cancel.cancel();
            user.tasks.shutdown().await;
            tracing::debug!("released subscriptions for {}", user.repo.uid());
        }
    }
}

/// Failure event for the view, logging what the user does not see
pub fn failure(err: LexiError) -> AppEvent {
    match &err {
        LexiError::Store(e) => log_store_error(e),
        LexiError::Word(lexi_core::repository::WordError::Store(e)) => log_store_error(e),
        LexiError::Decode(e) => tracing::error!("malformed document: {e}"),
        other => tracing::debug!("rejected: {other}"),
    }

    AppEvent::Failure(err.user_message())
}

fn log_store_error(err: &StoreError) {
    tracing::error!("store operation failed: {err}");
}

async fn forward_words(feed: WordFeed, loopback: AsyncSender<AppEvent>, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            words = feed.recv() => {
                let Some(words) = words else {
                    tracing::warn!("word feed closed");
                    break;
                };
                if loopback.send(AppEvent::WordsChanged(words)).await.is_err() {
                    break;
                }
            }
        }
    }
}

async fn forward_score(
    mut rx: tokio::sync::watch::Receiver<i64>,
    app_to_ui_tx: AsyncSender<AppEvent>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let score = *rx.borrow_and_update();
                if app_to_ui_tx.send(AppEvent::ScoreChanged(score)).await.is_err() {
                    break;
                }
            }
        }
    }
}

/// App's main loop
pub async fn event_loop(
    state: Arc<AppState>,
    backends: Backends,
    rng: StdRng,
    ui_to_app_rx: AsyncReceiver<AppEvent>,
    loopback: AsyncSender<AppEvent>,
    app_to_ui_tx: AsyncSender<AppEvent>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let auth = Auth::new(
        backends.identity.clone(),
        backends.store.clone(),
        state.clone(),
    );

    let mut ctx = AppContext {
        state,
        backends,
        auth,
        user: None,
        quiz: None,
        rng,
        loopback,
        app_to_ui_tx,
        cancel: cancel.clone(),
    };

    tracing::info!("event loop started");
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = ui_to_app_rx.recv() => event?,
        };

        tracing::debug!("event: {:?}", std::mem::discriminant(&event));
        if matches!(event, AppEvent::Quit) {
            break;
        }

        handle_events(&mut ctx, event).await?;
    }

    ctx.sign_out().await;
    tracing::info!("event loop stopped");
    Ok(())
}

async fn handle_events(ctx: &mut AppContext, event: AppEvent) -> anyhow::Result<()> {
    match event {
        AppEvent::Register {
            email,
            password,
            name,
        } => auth::handle_register(ctx, email, password, name).await?,
        AppEvent::Login { email, password } => auth::handle_login(ctx, email, password).await?,
        AppEvent::Logout => auth::handle_logout(ctx).await?,

        AppEvent::AddWord(draft) => words::handle_add(ctx, draft).await?,
        AppEvent::UpdateWord { id, draft } => words::handle_update(ctx, id, draft).await?,
        AppEvent::DeleteWord(id) => words::handle_delete(ctx, id).await?,
        AppEvent::ListWords(query) => words::handle_list(ctx, query).await?,
        AppEvent::WordsChanged(words) => words::handle_words_changed(ctx, words).await?,

        AppEvent::StartQuiz(mode) => quiz::handle_start(ctx, mode).await?,
        AppEvent::Answer(input) => quiz::handle_answer(ctx, input).await?,
        AppEvent::RevealAnswer => quiz::handle_reveal(ctx).await?,
        AppEvent::SkipQuestion => quiz::handle_skip(ctx).await?,
        AppEvent::NextQuestion => quiz::handle_next(ctx).await?,
        AppEvent::LeaveQuiz => quiz::handle_leave(ctx).await?,
        AppEvent::ScoreApplied { guard, result } => {
            quiz::handle_score_applied(ctx, guard, result).await?
        }
        AppEvent::ShowScore => quiz::handle_show_score(ctx).await?,

        AppEvent::Quit => {}

        // View-bound events
        AppEvent::SignedIn { .. }
        | AppEvent::SignedOut
        | AppEvent::AuthFailed(_)
        | AppEvent::ValidationFailed(_)
        | AppEvent::WordSaved { .. }
        | AppEvent::WordDeleted(_)
        | AppEvent::ShowWords { .. }
        | AppEvent::ShowQuestion { .. }
        | AppEvent::QuizFeedback(_)
        | AppEvent::QuizBlocked(_)
        | AppEvent::ScoreChanged(_)
        | AppEvent::Notice(_)
        | AppEvent::Failure(_) => {
            tracing::warn!("ignoring view event sent to the app");
        }
    }

    Ok(())
}
