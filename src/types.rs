use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Target platform a build was produced for.
///
/// Exactly one platform is active per build, which in turn selects exactly one
/// execution strategy:
///
/// - `Jvm`: run the classpath on the managed runtime (default).
/// - `Js`: link a script and run it with the script runtime.
/// - `Native`: compile a native binary and run it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Jvm,
    Js,
    Native,
}

impl Default for Platform {
    fn default() -> Self {
        Platform::Jvm
    }
}

impl Platform {
    /// Fold the `--js` / `--native` CLI switches into a single platform.
    ///
    /// Priority is script, then native. `None` means neither switch was given
    /// and the configured platform applies.
    pub fn from_flags(js: bool, native: bool) -> Option<Platform> {
        match (js, native) {
            (true, true) => {
                tracing::warn!("both --js and --native given; using --js");
                Some(Platform::Js)
            }
            (true, false) => Some(Platform::Js),
            (false, true) => Some(Platform::Native),
            (false, false) => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Platform::Jvm => "jvm",
            Platform::Js => "js",
            Platform::Native => "native",
        };
        f.write_str(s)
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "jvm" => Ok(Platform::Jvm),
            "js" => Ok(Platform::Js),
            "native" => Ok(Platform::Native),
            other => Err(format!(
                "invalid platform: {other} (expected \"jvm\", \"js\" or \"native\")"
            )),
        }
    }
}

/// Benchmark harness mode.
///
/// `PreprocessOnly` builds the benchmark sources but must not hand control to
/// the harness entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BenchMode {
    Off,
    Run,
    PreprocessOnly,
}

impl Default for BenchMode {
    fn default() -> Self {
        BenchMode::Off
    }
}

impl BenchMode {
    /// Whether the benchmark harness should be launched instead of a main class.
    pub fn launches_harness(self) -> bool {
        matches!(self, BenchMode::Run)
    }
}

impl FromStr for BenchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "off" => Ok(BenchMode::Off),
            "run" => Ok(BenchMode::Run),
            "preprocess-only" => Ok(BenchMode::PreprocessOnly),
            other => Err(format!(
                "invalid bench mode: {other} (expected \"off\", \"run\" or \"preprocess-only\")"
            )),
        }
    }
}

/// Which user command produced the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    /// `runwatch run`: user-resolved entry, main initializer when linking.
    Main,
    /// `runwatch test`: fixed test-runner entry, test initializer when linking.
    Test,
}

impl RunKind {
    pub fn is_test(self) -> bool {
        matches!(self, RunKind::Test)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_flag_takes_priority_over_native() {
        assert_eq!(Platform::from_flags(true, true), Some(Platform::Js));
        assert_eq!(Platform::from_flags(false, true), Some(Platform::Native));
        assert_eq!(Platform::from_flags(false, false), None);
    }

    #[test]
    fn bench_mode_parses_kebab_case() {
        assert_eq!("preprocess-only".parse::<BenchMode>(), Ok(BenchMode::PreprocessOnly));
        assert!(!BenchMode::PreprocessOnly.launches_harness());
        assert!(BenchMode::Run.launches_harness());
        assert!("later".parse::<BenchMode>().is_err());
    }
}
