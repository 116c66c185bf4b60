use lexi_core::LexiError;
use lexi_core::session::{Outcome, QuizError, QuizSession, QuizState};
use lexi_types::{AppEvent, QuizGuard, QuizMode};

use crate::events::{AppContext, failure};

const NO_QUIZ: &str = "No quiz in progress. Type `quiz` or `hard` to start one.";

fn state_event(session: &QuizSession) -> AppEvent {
    match session.state() {
        QuizState::Loading => AppEvent::Notice("Loading...".to_string()),
        QuizState::Blocked(reason) => AppEvent::QuizBlocked(reason.to_string()),
        QuizState::Ready(active) => AppEvent::ShowQuestion {
            mode: session.mode(),
            question: active.question.clone(),
        },
    }
}

pub async fn handle_start(ctx: &mut AppContext, mode: QuizMode) -> anyhow::Result<()> {
    let Some(user) = ctx.user.as_ref() else {
        return ctx.send(failure(LexiError::SignedOut)).await;
    };

    let config = ctx.state.config.read().await.quiz.clone();
    let mut session = QuizSession::new(mode, config);
    session.load(user.words.clone(), &mut ctx.rng);
    tracing::info!("started {mode:?} quiz {}", session.id());

    let event = state_event(&session);
    ctx.quiz = Some(session);
    ctx.send(event).await
}

/// New word snapshot: unblock a waiting quiz
pub async fn refresh(ctx: &mut AppContext) -> anyhow::Result<()> {
    let (Some(session), Some(user)) = (ctx.quiz.as_mut(), ctx.user.as_ref()) else {
        return Ok(());
    };

    let before = session.state().clone();
    session.refresh(user.words.clone(), &mut ctx.rng);
    if *session.state() == before {
        return Ok(());
    }

    let event = state_event(session);
    ctx.send(event).await
}

/// Show the feedback and start persisting the score change
async fn settle(ctx: &mut AppContext, result: Result<Outcome, QuizError>) -> anyhow::Result<()> {
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => return ctx.send(AppEvent::Notice(e.to_string())).await,
    };

    ctx.send(AppEvent::QuizFeedback(outcome.message)).await?;

    let (Some(scored), Some(user)) = (outcome.scored, ctx.user.as_mut()) else {
        return Ok(());
    };

    let ledger = user.ledger.clone();
    let loopback = ctx.loopback.clone();
    user.spawn_write(async move {
        let result = ledger
            .apply_delta(scored.delta)
            .await
            .map_err(|e| e.to_string());
        let applied = AppEvent::ScoreApplied {
            guard: scored.guard,
            result,
        };
        if loopback.send(applied).await.is_err() {
            tracing::warn!("event loop gone, score result for {:?} dropped", scored.guard);
        }
    });

    Ok(())
}

pub async fn handle_answer(ctx: &mut AppContext, input: String) -> anyhow::Result<()> {
    let Some(session) = ctx.quiz.as_mut() else {
        return ctx.send(AppEvent::Notice(NO_QUIZ.to_string())).await;
    };

    let result = session.answer(&input);
    settle(ctx, result).await
}

pub async fn handle_reveal(ctx: &mut AppContext) -> anyhow::Result<()> {
    let Some(session) = ctx.quiz.as_mut() else {
        return ctx.send(AppEvent::Notice(NO_QUIZ.to_string())).await;
    };

    let result = session.reveal();
    settle(ctx, result).await
}

pub async fn handle_skip(ctx: &mut AppContext) -> anyhow::Result<()> {
    let Some(session) = ctx.quiz.as_mut() else {
        return ctx.send(AppEvent::Notice(NO_QUIZ.to_string())).await;
    };

    let result = session.skip();
    settle(ctx, result).await
}

pub async fn handle_next(ctx: &mut AppContext) -> anyhow::Result<()> {
    let Some(session) = ctx.quiz.as_mut() else {
        return ctx.send(AppEvent::Notice(NO_QUIZ.to_string())).await;
    };

    let advanced = session.advance(&mut ctx.rng).map(|_| ());
    let event = match advanced {
        Ok(()) => state_event(session),
        Err(e) => AppEvent::Notice(e.to_string()),
    };
    ctx.send(event).await
}

pub async fn handle_leave(ctx: &mut AppContext) -> anyhow::Result<()> {
    let message = match ctx.quiz.take() {
        Some(session) => {
            tracing::info!("left quiz {}", session.id());
            "Left the quiz."
        }
        None => NO_QUIZ,
    };

    ctx.send(AppEvent::Notice(message.to_string())).await
}

/// Completion of a score write started by [`settle`]
pub async fn handle_score_applied(
    ctx: &mut AppContext,
    guard: QuizGuard,
    result: Result<i64, String>,
) -> anyhow::Result<()> {
    let current = ctx.quiz.as_ref().is_some_and(|q| q.is_current(guard));

    match result {
        Ok(score) => {
            tracing::debug!("score saved: {score}");
            Ok(())
        }
        Err(e) => {
            tracing::error!("score update failed: {e}");
            if !current {
                tracing::debug!("question {guard:?} no longer on screen");
                return Ok(());
            }
            ctx.send(AppEvent::Failure(
                "Your score could not be saved. Please try again later.".to_string(),
            ))
            .await
        }
    }
}

pub async fn handle_show_score(ctx: &mut AppContext) -> anyhow::Result<()> {
    let event = match ctx.user.as_ref() {
        None => failure(LexiError::SignedOut),
        Some(user) => match user.ledger.resync().await {
            Ok(score) => AppEvent::ScoreChanged(score),
            Err(e) => failure(e.into()),
        },
    };

    ctx.send(event).await
}
