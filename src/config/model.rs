// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::types::{BenchMode, Platform};

/// Configuration exactly as read from a TOML file, before validation.
///
/// ```toml
/// [build]
/// cmd = "scalac -d out/classes src/Main.scala"
/// classpath = ["out/classes"]
/// main_classes = ["Main"]
///
/// [run]
/// platform = "jvm"
///
/// [link]
/// script_cmd = "linkjs --main {entry} --out {dest} {classpath}"
///
/// [watch]
/// paths = ["src"]
/// exclude = ["out/**"]
/// ```
///
/// Only `[build].cmd` is mandatory; every other key has a default.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    pub build: BuildSection,

    #[serde(default)]
    pub run: RunSection,

    #[serde(default)]
    pub link: LinkSection,

    #[serde(default)]
    pub watch: WatchSection,
}

/// `[build]` section: how to invoke the external build and read its results.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildSection {
    /// Shell command that compiles the project.
    pub cmd: String,

    /// Classpath entries produced by the build, relative to the project root.
    #[serde(default)]
    pub classpath: Vec<PathBuf>,

    /// Entry points known to be retained by the build.
    #[serde(default)]
    pub main_classes: Vec<String>,

    /// Regex with one capture group, matched against each line the build
    /// prints on stdout. Every capture is an additional retained entry point.
    #[serde(default)]
    pub main_class_pattern: Option<String>,
}

/// `[run]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RunSection {
    #[serde(default)]
    pub platform: Platform,

    /// Explicit entry point; skips discovery when set.
    #[serde(default)]
    pub main_class: Option<String>,

    /// Arguments passed to the program before any CLI trailing arguments.
    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default = "default_java_cmd")]
    pub java_cmd: String,

    #[serde(default)]
    pub java_opts: Vec<String>,

    #[serde(default = "default_node_cmd")]
    pub node_cmd: String,

    #[serde(default)]
    pub add_runner_dependency: bool,

    #[serde(default)]
    pub bench: BenchMode,

    /// Directory launcher artifacts are created in (relative to the root).
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
}

fn default_java_cmd() -> String {
    "java".to_string()
}

fn default_node_cmd() -> String {
    "node".to_string()
}

fn default_work_dir() -> PathBuf {
    PathBuf::from(".runwatch")
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            platform: Platform::default(),
            main_class: None,
            args: Vec::new(),
            java_cmd: default_java_cmd(),
            java_opts: Vec::new(),
            node_cmd: default_node_cmd(),
            add_runner_dependency: false,
            bench: BenchMode::default(),
            work_dir: default_work_dir(),
        }
    }
}

/// `[link]` section: command templates for the launcher-producing steps.
///
/// Supported placeholders: `{entry}`, `{dest}`, `{classpath}`, `{mode}`
/// (`main` or `test`) and `{work_dir}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkSection {
    #[serde(default)]
    pub script_cmd: Option<String>,

    #[serde(default)]
    pub native_cmd: Option<String>,
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Directories watched recursively, relative to the project root.
    #[serde(default = "default_watch_paths")]
    pub paths: Vec<PathBuf>,

    /// Globs (relative to the root) whose changes never trigger a rebuild.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Only rebuild when a changed file's content hash actually differs.
    #[serde(default)]
    pub use_hash: bool,

    /// Quiet period used to coalesce bursts of file events.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_watch_paths() -> Vec<PathBuf> {
    vec![PathBuf::from(".")]
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            paths: default_watch_paths(),
            exclude: Vec::new(),
            use_hash: false,
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (see `validate.rs`), so
/// holders can rely on templates, patterns and globs being well formed.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    build: BuildSection,
    run: RunSection,
    link: LinkSection,
    watch: WatchSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        build: BuildSection,
        run: RunSection,
        link: LinkSection,
        watch: WatchSection,
    ) -> Self {
        Self {
            build,
            run,
            link,
            watch,
        }
    }

    pub fn build_section(&self) -> &BuildSection {
        &self.build
    }

    pub fn run_section(&self) -> &RunSection {
        &self.run
    }

    pub fn link_section(&self) -> &LinkSection {
        &self.link
    }

    pub fn watch_section(&self) -> &WatchSection {
        &self.watch
    }
}
