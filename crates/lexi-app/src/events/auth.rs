use lexi_core::LexiError;
use lexi_store::Identity;
use lexi_types::AppEvent;

use crate::events::{AppContext, failure};

pub async fn handle_register(
    ctx: &mut AppContext,
    email: String,
    password: String,
    name: String,
) -> anyhow::Result<()> {
    let identity = match ctx.auth.register(&email, &password, &name).await {
        Ok(identity) => identity,
        Err(e) => return reject(ctx, e).await,
    };

    enter(ctx, &identity, name.trim().to_string()).await
}

pub async fn handle_login(
    ctx: &mut AppContext,
    email: String,
    password: String,
) -> anyhow::Result<()> {
    let identity = match ctx.auth.login(&email, &password).await {
        Ok(identity) => identity,
        Err(e) => return reject(ctx, e).await,
    };

    let name = match ctx.auth.profile(&identity).await {
        Ok(profile) => profile.name,
        Err(e) => {
            tracing::warn!("could not read profile of {}: {e}", identity.uid);
            identity
                .display_name
                .clone()
                .unwrap_or_else(|| "User".to_string())
        }
    };

    enter(ctx, &identity, name).await
}

pub async fn handle_logout(ctx: &mut AppContext) -> anyhow::Result<()> {
    if ctx.user.is_none() {
        return ctx
            .send(AppEvent::Notice("You are not signed in.".to_string()))
            .await;
    }

    ctx.sign_out().await;
    if let Err(e) = ctx.auth.logout().await {
        return ctx.send(failure(e)).await;
    }

    ctx.send(AppEvent::SignedOut).await
}

async fn enter(ctx: &mut AppContext, identity: &Identity, name: String) -> anyhow::Result<()> {
    if let Err(e) = ctx.sign_in(identity).await {
        if let Err(e) = ctx.auth.logout().await {
            tracing::warn!("could not roll back sign-in: {e}");
        }
        return ctx.send(failure(e)).await;
    }

    ctx.send(AppEvent::SignedIn { name }).await
}

async fn reject(ctx: &AppContext, err: LexiError) -> anyhow::Result<()> {
    tracing::warn!("authentication failed: {err}");
    ctx.send(AppEvent::AuthFailed(err.user_message())).await
}
