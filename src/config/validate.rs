// src/config/validate.rs

use regex::Regex;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, RunwatchError};
use crate::exec::template::{placeholders, KNOWN_PLACEHOLDERS};
use crate::types::Platform;
use crate::watch::patterns::build_globset;

/// Upper bound for `[watch].debounce_ms`; anything longer feels like a hang.
const MAX_DEBOUNCE_MS: u64 = 10_000;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::RunwatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.build, raw.run, raw.link, raw.watch))
    }
}

/// Run every semantic check on a freshly deserialized config.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_build(cfg)?;
    validate_link_templates(cfg)?;
    validate_platform_requirements(cfg)?;
    validate_watch(cfg)?;
    Ok(())
}

fn validate_build(cfg: &RawConfigFile) -> Result<()> {
    if cfg.build.cmd.trim().is_empty() {
        return Err(RunwatchError::ConfigError(
            "[build].cmd must not be empty".to_string(),
        ));
    }

    if let Some(pattern) = cfg.build.main_class_pattern.as_deref() {
        let re = Regex::new(pattern).map_err(|e| {
            RunwatchError::ConfigError(format!(
                "[build].main_class_pattern is not a valid regex: {e}"
            ))
        })?;
        if re.captures_len() < 2 {
            return Err(RunwatchError::ConfigError(format!(
                "[build].main_class_pattern '{pattern}' needs a capture group for the class name"
            )));
        }
    }

    Ok(())
}

fn validate_link_templates(cfg: &RawConfigFile) -> Result<()> {
    let templates = [
        ("script_cmd", cfg.link.script_cmd.as_deref()),
        ("native_cmd", cfg.link.native_cmd.as_deref()),
    ];

    for (key, template) in templates {
        let Some(template) = template else { continue };
        for name in placeholders(template) {
            if !KNOWN_PLACEHOLDERS.contains(&name.as_str()) {
                return Err(RunwatchError::ConfigError(format!(
                    "[link].{key} uses unknown placeholder '{{{name}}}' (known: {})",
                    KNOWN_PLACEHOLDERS.join(", ")
                )));
            }
        }
    }

    Ok(())
}

fn validate_platform_requirements(cfg: &RawConfigFile) -> Result<()> {
    match cfg.run.platform {
        Platform::Js if cfg.link.script_cmd.is_none() => Err(RunwatchError::ConfigError(
            "[run].platform = \"js\" requires [link].script_cmd".to_string(),
        )),
        Platform::Native if cfg.link.native_cmd.is_none() => {
            Err(RunwatchError::ConfigError(
                "[run].platform = \"native\" requires [link].native_cmd".to_string(),
            ))
        }
        _ => Ok(()),
    }
}

fn validate_watch(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.paths.is_empty() {
        return Err(RunwatchError::ConfigError(
            "[watch].paths must list at least one directory".to_string(),
        ));
    }

    if cfg.watch.debounce_ms > MAX_DEBOUNCE_MS {
        return Err(RunwatchError::ConfigError(format!(
            "[watch].debounce_ms must be <= {MAX_DEBOUNCE_MS} (got {})",
            cfg.watch.debounce_ms
        )));
    }

    build_globset(&cfg.watch.exclude)
        .map_err(|e| RunwatchError::ConfigError(format!("[watch].exclude: {e:#}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_src: &str) -> RawConfigFile {
        toml::from_str(toml_src).unwrap()
    }

    #[test]
    fn minimal_config_is_valid() {
        let raw = parse("[build]\ncmd = \"make\"\n");
        let cfg = ConfigFile::try_from(raw).unwrap();
        assert_eq!(cfg.run_section().platform, Platform::Jvm);
        assert_eq!(cfg.run_section().java_cmd, "java");
        assert_eq!(cfg.watch_section().debounce_ms, 100);
    }

    #[test]
    fn pattern_without_capture_group_is_rejected() {
        let raw = parse("[build]\ncmd = \"make\"\nmain_class_pattern = \"^main: .*$\"\n");
        let err = ConfigFile::try_from(raw).unwrap_err();
        assert!(err.to_string().contains("capture group"), "{err}");
    }

    #[test]
    fn unknown_template_placeholder_is_rejected() {
        let raw = parse(
            "[build]\ncmd = \"make\"\n[link]\nscript_cmd = \"link {entry} {output}\"\n",
        );
        let err = ConfigFile::try_from(raw).unwrap_err();
        assert!(err.to_string().contains("{output}"), "{err}");
    }

    #[test]
    fn js_platform_needs_script_template() {
        let raw = parse("[build]\ncmd = \"make\"\n[run]\nplatform = \"js\"\n");
        let err = ConfigFile::try_from(raw).unwrap_err();
        assert!(matches!(err, RunwatchError::ConfigError(ref m) if m.contains("script_cmd")));
    }

    #[test]
    fn bad_exclude_glob_is_rejected() {
        let raw = parse("[build]\ncmd = \"make\"\n[watch]\nexclude = [\"out/[\"]\n");
        assert!(ConfigFile::try_from(raw).is_err());
    }
}
