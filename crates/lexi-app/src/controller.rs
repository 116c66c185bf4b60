use std::sync::Arc;

use kanal::{AsyncReceiver, AsyncSender};
use lexi_core::state::AppState;
use lexi_types::AppEvent;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::backend::Backends;
use crate::console::console_loop;
use crate::events::event_loop;

/// Centralized channel management
pub struct ChannelSet {
    pub app_to_ui: (AsyncSender<AppEvent>, AsyncReceiver<AppEvent>),
    pub ui_to_app: (AsyncSender<AppEvent>, AsyncReceiver<AppEvent>),
}

impl ChannelSet {
    pub fn new() -> Self {
        Self {
            app_to_ui: kanal::bounded_async(256), // word lists, feedback, score pushes
            ui_to_app: kanal::bounded_async(64),  // typed commands
        }
    }
}

/// Application controller for task spawning and lifecycle
pub struct AppController {
    channels: ChannelSet,
    state: Arc<AppState>,
    cancel_token: CancellationToken,
}

impl AppController {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            channels: ChannelSet::new(),
            state,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Event loop only; the caller plays the view through [`Self::view_channels`]
    pub fn spawn_event_loop(
        &self,
        backends: Backends,
        rng: StdRng,
        tasks: &mut JoinSet<anyhow::Result<()>>,
    ) {
        tasks.spawn(event_loop(
            self.state.clone(),
            backends,
            rng,
            self.channels.ui_to_app.1.clone(),
            self.channels.ui_to_app.0.clone(),
            self.channels.app_to_ui.0.clone(),
            self.cancel_token.child_token(),
        ));
    }

    pub fn spawn_tasks(&self, backends: Backends) -> JoinSet<anyhow::Result<()>> {
        let mut tasks = JoinSet::new();

        self.spawn_event_loop(backends, StdRng::from_entropy(), &mut tasks);

        tasks.spawn(console_loop(
            self.state.clone(),
            self.channels.app_to_ui.1.clone(),
            self.channels.ui_to_app.0.clone(),
            self.cancel_token.child_token(),
        ));

        tasks
    }

    /// (view -> app sender, app -> view receiver)
    #[cfg(test)]
    pub fn view_channels(&self) -> (AsyncSender<AppEvent>, AsyncReceiver<AppEvent>) {
        (
            self.channels.ui_to_app.0.clone(),
            self.channels.app_to_ui.1.clone(),
        )
    }

    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}
