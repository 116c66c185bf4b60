use std::sync::Arc;
use std::time::Duration;

use kanal::{AsyncReceiver, AsyncSender};
use lexi_config::Config;
use lexi_core::state::AppState;
use lexi_store::{DocumentStore, MemoryIdentity, MemoryStore};
use lexi_types::{AppEvent, ErrorKind, QuizMode, QuizQuestion, WordDraft, WordQuery};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::task::JoinSet;
use tokio::time::timeout;

use crate::backend::Backends;
use crate::controller::AppController;

struct Harness {
    controller: AppController,
    tasks: JoinSet<anyhow::Result<()>>,
    store: Arc<MemoryStore>,
    tx: AsyncSender<AppEvent>,
    rx: AsyncReceiver<AppEvent>,
}

impl Harness {
    fn start() -> Self {
        let store = Arc::new(MemoryStore::new());
        let backends = Backends {
            store: store.clone(),
            identity: Arc::new(MemoryIdentity::new()),
        };

        let controller = AppController::new(Arc::new(AppState::new(Config::default())));
        let mut tasks = JoinSet::new();
        controller.spawn_event_loop(backends, StdRng::seed_from_u64(11), &mut tasks);
        let (tx, rx) = controller.view_channels();

        Self {
            controller,
            tasks,
            store,
            tx,
            rx,
        }
    }

    async fn send(&self, event: AppEvent) {
        self.tx.send(event).await.expect("event loop gone");
    }

    /// Next view event matching `pick`, skipping the rest
    async fn expect<T>(&self, what: &str, pick: impl Fn(AppEvent) -> Option<T>) -> T {
        let wait = async {
            loop {
                let event = self.rx.recv().await.expect("channel closed");
                if let Some(found) = pick(event) {
                    return found;
                }
            }
        };

        timeout(Duration::from_secs(2), wait)
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for {what}"))
    }

    /// Everything received before the first event matching `stop`
    async fn events_before(&self, what: &str, stop: impl Fn(&AppEvent) -> bool) -> Vec<AppEvent> {
        let collect = async {
            let mut seen = Vec::new();
            loop {
                let event = self.rx.recv().await.expect("channel closed");
                if stop(&event) {
                    return seen;
                }
                seen.push(event);
            }
        };

        timeout(Duration::from_secs(2), collect)
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for {what}"))
    }

    /// Score persisted in the only profile in the store
    async fn stored_score(&self) -> i64 {
        let users = self.store.read_once("users").await.unwrap().unwrap();
        let profile = users.as_object().unwrap().values().next().unwrap();
        profile["score"].as_i64().unwrap()
    }

    async fn register(&self, name: &str) {
        self.send(AppEvent::Register {
            email: format!("{}@example.com", name.to_lowercase()),
            password: "secret1".into(),
            name: name.into(),
        })
        .await;

        let greeted = self
            .expect("SignedIn", |e| match e {
                AppEvent::SignedIn { name } => Some(name),
                _ => None,
            })
            .await;
        assert_eq!(greeted, name);
    }

    async fn add(&self, draft: WordDraft) -> String {
        self.send(AppEvent::AddWord(draft)).await;
        self.expect("WordSaved", |e| match e {
            AppEvent::WordSaved { id, .. } => Some(id),
            _ => None,
        })
        .await
    }

    async fn add_four_words(&self) {
        self.add(WordDraft::new("Dog", "en").with_translation("es", "Perro"))
            .await;
        self.add(WordDraft::new("Gato", "es").with_translation("en", "Cat"))
            .await;
        self.add(WordDraft::new("Chat", "fr").with_translation("en", "Cat"))
            .await;
        self.add(WordDraft::new("Cane", "it").with_translation("en", "Dog"))
            .await;
    }

    async fn question(&self) -> QuizQuestion {
        self.expect("ShowQuestion", |e| match e {
            AppEvent::ShowQuestion { question, .. } => Some(question),
            _ => None,
        })
        .await
    }

    async fn score(&self, wanted: i64) {
        self.expect(&format!("ScoreChanged({wanted})"), |e| match e {
            AppEvent::ScoreChanged(score) if score == wanted => Some(()),
            _ => None,
        })
        .await
    }

    async fn stop(mut self) {
        self.send(AppEvent::Quit).await;
        while let Some(result) = self.tasks.join_next().await {
            result.unwrap().unwrap();
        }
        self.controller.shutdown();
    }
}

#[tokio::test]
async fn commands_need_a_signed_in_user() {
    let harness = Harness::start();

    harness
        .send(AppEvent::AddWord(WordDraft::new("dog", "en")))
        .await;
    let message = harness
        .expect("Failure", |e| match e {
            AppEvent::Failure(message) => Some(message),
            _ => None,
        })
        .await;
    assert_eq!(message, "Please sign in first.");

    harness.stop().await;
}

#[tokio::test]
async fn add_words_then_answer_multiple_choice() {
    let harness = Harness::start();
    harness.register("Ana").await;
    harness.add_four_words().await;

    harness
        .send(AppEvent::StartQuiz(QuizMode::MultipleChoice))
        .await;
    let question = harness.question().await;
    assert_eq!(question.options.len(), 4);

    harness
        .send(AppEvent::Answer(question.correct_answer.clone()))
        .await;
    let feedback = harness
        .expect("QuizFeedback", |e| match e {
            AppEvent::QuizFeedback(message) => Some(message),
            _ => None,
        })
        .await;
    assert!(feedback.starts_with("Correct! You have earned 1 point!"));

    harness.score(1).await;
    harness.stop().await;
}

#[tokio::test]
async fn duplicate_word_is_rejected_inline() {
    let harness = Harness::start();
    harness.register("Ana").await;
    harness.add(WordDraft::new("Cat", "en")).await;

    harness
        .send(AppEvent::AddWord(WordDraft::new("cat", "en")))
        .await;
    let kinds = harness
        .expect("ValidationFailed", |e| match e {
            AppEvent::ValidationFailed(kinds) => Some(kinds),
            _ => None,
        })
        .await;
    assert_eq!(kinds, [ErrorKind::DuplicateWord]);

    harness.stop().await;
}

#[tokio::test]
async fn quiz_without_enough_words_is_blocked() {
    let harness = Harness::start();
    harness.register("Ana").await;
    harness
        .add(WordDraft::new("Dog", "en").with_translation("es", "Perro"))
        .await;

    harness
        .send(AppEvent::StartQuiz(QuizMode::MultipleChoice))
        .await;
    let message = harness
        .expect("QuizBlocked", |e| match e {
            AppEvent::QuizBlocked(message) => Some(message),
            _ => None,
        })
        .await;
    assert!(message.contains("at least 4 words"));

    harness.stop().await;
}

#[tokio::test]
async fn hard_quiz_reveal_then_skip() {
    let harness = Harness::start();
    harness.register("Ana").await;
    harness
        .add(WordDraft::new("Dog", "en").with_translation("es", "Perro"))
        .await;

    harness.send(AppEvent::StartQuiz(QuizMode::FreeText)).await;
    let question = harness.question().await;
    assert_eq!(question.correct_answer, "Perro");

    harness.send(AppEvent::RevealAnswer).await;
    harness.score(-2).await;

    harness.send(AppEvent::NextQuestion).await;
    harness.question().await;
    harness.send(AppEvent::SkipQuestion).await;
    let feedback = harness
        .expect("QuizFeedback", |e| match e {
            AppEvent::QuizFeedback(message) => Some(message),
            _ => None,
        })
        .await;
    assert_eq!(feedback, "Question skipped. You have lost 1 point.");
    harness.score(-3).await;

    harness.stop().await;
}

#[tokio::test]
async fn failed_score_write_is_reported() {
    let harness = Harness::start();
    harness.register("Ana").await;
    harness
        .add(WordDraft::new("Dog", "en").with_translation("es", "Perro"))
        .await;

    harness.send(AppEvent::StartQuiz(QuizMode::FreeText)).await;
    harness.question().await;

    harness.store.set_available(false);
    harness.send(AppEvent::Answer("perro".into())).await;
    let message = harness
        .expect("Failure", |e| match e {
            AppEvent::Failure(message) => Some(message),
            _ => None,
        })
        .await;
    assert_eq!(message, "Your score could not be saved. Please try again later.");

    harness.store.set_available(true);
    harness.stop().await;
}

#[tokio::test]
async fn logout_releases_subscriptions() {
    let harness = Harness::start();
    harness.register("Ana").await;

    // Word feed and score follower
    timeout(Duration::from_secs(2), async {
        while harness.store.watcher_count().await < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("subscriptions never opened");

    harness.send(AppEvent::Logout).await;
    harness
        .expect("SignedOut", |e| matches!(e, AppEvent::SignedOut).then_some(()))
        .await;
    assert_eq!(harness.store.watcher_count().await, 0);

    harness.send(AppEvent::StartQuiz(QuizMode::FreeText)).await;
    let message = harness
        .expect("Failure", |e| match e {
            AppEvent::Failure(message) => Some(message),
            _ => None,
        })
        .await;
    assert_eq!(message, "Please sign in first.");

    harness.stop().await;
}

#[tokio::test]
async fn scored_actions_in_quick_succession_all_count() {
    let harness = Harness::start();
    harness.register("Ana").await;
    harness
        .add(WordDraft::new("Dog", "en").with_translation("es", "Perro"))
        .await;

    harness.send(AppEvent::StartQuiz(QuizMode::FreeText)).await;
    harness.question().await;

    harness.store.set_latency(Duration::from_millis(100));
    harness.send(AppEvent::Answer("perro".into())).await;
    harness.send(AppEvent::NextQuestion).await;
    harness.send(AppEvent::SkipQuestion).await;

    // +2 then -1
    harness.score(1).await;
    harness.store.set_latency(Duration::ZERO);
    assert_eq!(harness.stored_score().await, 1);

    harness.stop().await;
}

#[tokio::test]
async fn late_score_failure_after_leaving_is_not_shown() {
    let harness = Harness::start();
    harness.register("Ana").await;
    harness
        .add(WordDraft::new("Dog", "en").with_translation("es", "Perro"))
        .await;

    harness.send(AppEvent::StartQuiz(QuizMode::FreeText)).await;
    harness.question().await;

    harness.store.set_latency(Duration::from_millis(100));
    harness.store.set_available(false);
    harness.send(AppEvent::Answer("perro".into())).await;
    harness.send(AppEvent::LeaveQuiz).await;
    harness
        .expect("left notice", |e| match e {
            AppEvent::Notice(message) if message == "Left the quiz." => Some(()),
            _ => None,
        })
        .await;

    // Let the write fail and its result reach the event loop
    tokio::time::sleep(Duration::from_millis(300)).await;
    harness.store.set_latency(Duration::ZERO);
    harness.store.set_available(true);

    harness.send(AppEvent::ListWords(WordQuery::default())).await;
    let seen = harness
        .events_before("ShowWords", |e| matches!(e, AppEvent::ShowWords { .. }))
        .await;
    assert!(
        !seen.iter().any(|e| matches!(e, AppEvent::Failure(_))),
        "unexpected failure: {seen:?}"
    );

    harness.stop().await;
}

#[tokio::test]
async fn unreachable_store_at_login_fails_without_hanging() {
    let harness = Harness::start();
    harness.register("Ana").await;
    harness.send(AppEvent::Logout).await;
    harness
        .expect("SignedOut", |e| matches!(e, AppEvent::SignedOut).then_some(()))
        .await;

    harness.store.set_available(false);
    harness
        .send(AppEvent::Login {
            email: "ana@example.com".into(),
            password: "secret1".into(),
        })
        .await;
    let message = harness
        .expect("AuthFailed", |e| match e {
            AppEvent::AuthFailed(message) => Some(message),
            _ => None,
        })
        .await;
    assert_eq!(message, "Something went wrong. Please try again.");

    harness.send(AppEvent::ShowScore).await;
    let message = harness
        .expect("Failure", |e| match e {
            AppEvent::Failure(message) => Some(message),
            _ => None,
        })
        .await;
    assert_eq!(message, "Please sign in first.");

    harness.store.set_available(true);
    harness.stop().await;
}
