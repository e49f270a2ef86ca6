// src/watch/handler.rs

use std::future::Future;
use std::pin::Pin;

use tracing::{debug, warn};

use crate::build::BuildOutcome;
use crate::errors::Result;
use crate::run::{Diagnostic, Orchestrator, RunPlan};

use super::session::OutcomeHandler;

/// Watch-mode outcome handler: run every successful build, report failed
/// ones, and never let the program's own result stop the loop.
#[derive(Debug, Clone)]
pub struct RunOnSuccess {
    orchestrator: Orchestrator,
    plan: RunPlan,
}

impl RunOnSuccess {
    /// `plan` is converted with [`RunPlan::for_watch`] (no process
    /// replacement, no exit on error).
    pub fn new(orchestrator: Orchestrator, plan: &RunPlan) -> Self {
        Self {
            orchestrator,
            plan: plan.for_watch(),
        }
    }
}

impl OutcomeHandler for RunOnSuccess {
    fn on_outcome(
        &mut self,
        outcome: BuildOutcome,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + '_>> {
        Box::pin(async move {
            match outcome {
                BuildOutcome::Failed => {
                    self.orchestrator.reporter().report(&Diagnostic::CompilationFailed);
                }
                BuildOutcome::Successful(build) => {
                    match self.orchestrator.run_build(&self.plan, &build).await {
                        Ok(end) => debug!(?end, "watched run finished"),
                        Err(err) => {
                            warn!(error = %err, "could not launch program; waiting for next change");
                            self.orchestrator
                                .reporter()
                                .report(&Diagnostic::LaunchFailed(err.to_string()));
                        }
                    }
                }
            }
            Ok(())
        })
    }
}
