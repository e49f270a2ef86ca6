// src/exec/template.rs

//! `{placeholder}` expansion for the `[link]` command templates.

use std::collections::HashMap;
use std::sync::OnceLock;

use anyhow::{anyhow, Result};
use regex::{Captures, Regex};

/// Placeholders a link template may reference.
pub const KNOWN_PLACEHOLDERS: &[&str] = &["entry", "dest", "classpath", "mode", "work_dir"];

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder regex is valid"))
}

/// Names of all placeholders used in `template`, in order of appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    placeholder_re()
        .captures_iter(template)
        .map(|c| c[1].to_string())
        .collect()
}

/// Substitute every placeholder with its (shell-quoted) value.
///
/// Values are quoted because paths routinely contain spaces; a placeholder
/// with no value is an error rather than an empty string.
pub fn expand(template: &str, values: &HashMap<&str, String>) -> Result<String> {
    let mut missing = None;
    let expanded = placeholder_re().replace_all(template, |caps: &Captures<'_>| {
        let name = &caps[1];
        match values.get(name) {
            Some(value) => shell_quote(value),
            None => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(name) => Err(anyhow!("no value for placeholder '{{{name}}}'")),
        None => Ok(expanded.into_owned()),
    }
}

/// Quote a value for `sh -c` (or `cmd /C` on Windows).
pub fn shell_quote(value: &str) -> String {
    let is_plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@+,".contains(c));
    if is_plain {
        return value.to_string();
    }

    if cfg!(windows) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_placeholders_in_order() {
        assert_eq!(
            placeholders("link {entry} -o {dest} {entry}"),
            vec!["entry", "dest", "entry"]
        );
    }

    #[test]
    fn expands_and_quotes_values() {
        let mut values = HashMap::new();
        values.insert("entry", "Main".to_string());
        values.insert("dest", "/tmp/my dir/launcher.js".to_string());

        let out = expand("link --main {entry} --out {dest}", &values).unwrap();
        if cfg!(windows) {
            assert_eq!(out, "link --main Main --out \"/tmp/my dir/launcher.js\"");
        } else {
            assert_eq!(out, "link --main Main --out '/tmp/my dir/launcher.js'");
        }
    }

    #[test]
    fn missing_value_is_an_error() {
        let values = HashMap::new();
        let err = expand("link {entry}", &values).unwrap_err();
        assert!(err.to_string().contains("{entry}"));
    }
}
