// src/watch/session.rs

//! The watch loop.
//!
//! A [`WatchSession`] owns the change notifier for as long as watch mode is
//! active. [`WatchSession::run`] builds once, then rebuilds on every
//! [`WatchEvent::Changed`] and hands each outcome to an [`OutcomeHandler`],
//! one at a time, until [`WatchEvent::Interrupted`] arrives.
//!
//! The notifier handle is disposed exactly once: explicitly when the loop
//! ends normally, and from `Drop` when an error propagates, a panic unwinds
//! or the `run` future is dropped.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::build::{BuildInputs, BuildOutcome, Builder};
use crate::errors::Result;

/// Events flowing into the watch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEvent {
    /// Watched inputs changed; rebuild.
    Changed,
    /// The user asked to stop (Ctrl-C).
    Interrupted,
}

/// Resource behind a watch session (e.g. an OS file watcher).
pub trait NotifierHandle: Send {
    /// Release the underlying resource. Called at most once.
    fn dispose(self: Box<Self>);
}

/// Receives every build outcome produced while watching.
///
/// The returned future is awaited before the next event is read, so
/// outcomes are never handled concurrently.
pub trait OutcomeHandler {
    fn on_outcome(
        &mut self,
        outcome: BuildOutcome,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + '_>>;
}

/// Live handle over a continuous rebuild-on-change loop.
pub struct WatchSession {
    handle: Option<Box<dyn NotifierHandle>>,
    events: mpsc::Receiver<WatchEvent>,
}

impl fmt::Debug for WatchSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchSession")
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

impl WatchSession {
    pub fn new(handle: Box<dyn NotifierHandle>, events: mpsc::Receiver<WatchEvent>) -> Self {
        Self {
            handle: Some(handle),
            events,
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.handle.is_none()
    }

    /// Release the notifier. Later calls are no-ops.
    pub fn dispose(&mut self) {
        if let Some(handle) = self.handle.take() {
            info!("disposing watch session");
            handle.dispose();
        }
    }

    /// Run the loop until interrupted or until the event channel closes.
    ///
    /// Build errors (the build could not even be attempted) end the session
    /// with that error.
    pub async fn run(
        mut self,
        builder: &dyn Builder,
        inputs: &BuildInputs,
        handler: &mut dyn OutcomeHandler,
    ) -> Result<()> {
        info!("watch session started; press Ctrl-C to stop");

        self.cycle(builder, inputs, handler).await?;

        loop {
            match self.events.recv().await {
                Some(WatchEvent::Changed) => {
                    debug!("change detected; rebuilding");
                    self.cycle(builder, inputs, handler).await?;
                }
                Some(WatchEvent::Interrupted) => {
                    info!("interrupt received; stopping watch session");
                    break;
                }
                None => {
                    info!("watch event channel closed; stopping watch session");
                    break;
                }
            }
        }

        self.dispose();
        Ok(())
    }

    async fn cycle(
        &self,
        builder: &dyn Builder,
        inputs: &BuildInputs,
        handler: &mut dyn OutcomeHandler,
    ) -> Result<()> {
        let outcome = builder.build(inputs).await?;
        handler.on_outcome(outcome).await
    }
}

impl Drop for WatchSession {
    fn drop(&mut self) {
        self.dispose();
    }
}
