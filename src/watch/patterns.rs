// src/watch/patterns.rs

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Build a GlobSet from simple string patterns.
///
/// Patterns are matched against paths relative to the project root, with
/// forward slashes (e.g. `"out/classes/Main.class"`).
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excludes_match_relative_paths() {
        let set = build_globset(&[".runwatch/**".to_string(), "out/**".to_string()]).unwrap();
        assert!(set.is_match(".runwatch/launcher-abc.js"));
        assert!(set.is_match("out/classes/Main.class"));
        assert!(!set.is_match("src/Main.scala"));
    }

    #[test]
    fn empty_pattern_list_matches_nothing() {
        let set = build_globset(&[]).unwrap();
        assert!(!set.is_match("anything"));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = build_globset(&["src/[".to_string()]).unwrap_err();
        assert!(format!("{err:#}").contains("src/["));
    }
}
