#![allow(dead_code)]

use std::path::{Path, PathBuf};

use runwatch::build::{Artifacts, BuildOptions, SuccessfulBuild};
use runwatch::config::{
    BuildSection, ConfigFile, LinkSection, RawConfigFile, RunSection, WatchSection,
};
use runwatch::errors::Result;
use runwatch::types::{BenchMode, Platform};

/// Builder for `SuccessfulBuild` to simplify test setup.
pub struct SuccessfulBuildBuilder {
    build: SuccessfulBuild,
}

impl SuccessfulBuildBuilder {
    pub fn new() -> Self {
        Self {
            build: SuccessfulBuild {
                artifacts: Artifacts {
                    classpath: vec![PathBuf::from("out/classes")],
                },
                options: BuildOptions::default(),
                retained_main_classes: Vec::new(),
            },
        }
    }

    pub fn main_class(mut self, name: &str) -> Self {
        self.build.retained_main_classes.push(name.to_string());
        self
    }

    pub fn main_classes(mut self, names: &[&str]) -> Self {
        self.build
            .retained_main_classes
            .extend(names.iter().map(|n| n.to_string()));
        self
    }

    pub fn classpath(mut self, entries: &[&str]) -> Self {
        self.build.artifacts.classpath = entries.iter().map(PathBuf::from).collect();
        self
    }

    pub fn platform(mut self, platform: Platform) -> Self {
        self.build.options.platform = platform;
        self
    }

    pub fn bench(mut self, bench: BenchMode) -> Self {
        self.build.options.bench = bench;
        self
    }

    pub fn runner_dependency(mut self) -> Self {
        self.build.options.add_runner_dependency = true;
        self
    }

    pub fn work_dir(mut self, dir: &Path) -> Self {
        self.build.options.work_dir = dir.to_path_buf();
        self
    }

    pub fn build(self) -> SuccessfulBuild {
        self.build
    }
}

impl Default for SuccessfulBuildBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `RawConfigFile` / `ConfigFile`.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new(build_cmd: &str) -> Self {
        Self {
            config: RawConfigFile {
                build: BuildSection {
                    cmd: build_cmd.to_string(),
                    classpath: Vec::new(),
                    main_classes: Vec::new(),
                    main_class_pattern: None,
                },
                run: RunSection::default(),
                link: LinkSection::default(),
                watch: WatchSection::default(),
            },
        }
    }

    pub fn main_class_pattern(mut self, pattern: &str) -> Self {
        self.config.build.main_class_pattern = Some(pattern.to_string());
        self
    }

    pub fn platform(mut self, platform: Platform) -> Self {
        self.config.run.platform = platform;
        self
    }

    pub fn script_cmd(mut self, template: &str) -> Self {
        self.config.link.script_cmd = Some(template.to_string());
        self
    }

    pub fn native_cmd(mut self, template: &str) -> Self {
        self.config.link.native_cmd = Some(template.to_string());
        self
    }

    pub fn watch_exclude(mut self, pattern: &str) -> Self {
        self.config.watch.exclude.push(pattern.to_string());
        self
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.config.watch.debounce_ms = ms;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}
