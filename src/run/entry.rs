// src/run/entry.rs

//! Entry-point resolution.

use tracing::{debug, warn};

use crate::types::BenchMode;

use super::report::{Diagnostic, Reporter};

/// Entry point of the benchmark harness.
pub const BENCHMARK_ENTRY: &str = "org.openjdk.jmh.Main";

/// Entry point the `test` command always launches.
pub const TEST_RUNNER_ENTRY: &str = "runwatch.testrunner.DynamicTestRunner";

/// Bootstrap entry used in runner-dependency mode; it receives the real
/// entry point as its first argument.
pub const RUNNER_BOOTSTRAP_ENTRY: &str = "runwatch.runner.Bootstrap";

/// Pick the symbol to execute. First match wins:
///
/// 1. a non-empty `explicit` override (not checked against the build);
/// 2. the benchmark harness, when `bench` launches it;
/// 3. the first retained candidate. Several candidates emit a warning
///    through `reporter`; none yields `None`.
pub fn resolve_entry(
    explicit: Option<&str>,
    bench: BenchMode,
    candidates: &[String],
    reporter: &dyn Reporter,
) -> Option<String> {
    if let Some(name) = explicit.filter(|s| !s.is_empty()) {
        debug!(entry = %name, "using explicit entry point");
        return Some(name.to_string());
    }

    if bench.launches_harness() {
        debug!(entry = BENCHMARK_ENTRY, "bench mode: using harness entry point");
        return Some(BENCHMARK_ENTRY.to_string());
    }

    match candidates {
        [] => {
            debug!("no entry point retained by the build; nothing to run");
            None
        }
        [only] => Some(only.clone()),
        [first, ..] => {
            warn!(chosen = %first, ?candidates, "several entry points found");
            reporter.report(&Diagnostic::SeveralEntryPoints {
                chosen: first.clone(),
                candidates: candidates.to_vec(),
            });
            Some(first.clone())
        }
    }
}
