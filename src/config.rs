// Run configuration assembled from defaults and environment variables
use std::env;
use std::path::PathBuf;

use crate::error::{ConfigError, PersistenceError};
use crate::generators::{GeneratorList, DEFAULT_GENERATOR_LIST};
use crate::spline::{KnotPolicy, KnotSpacing};
use crate::spline_cache::SplineCache;

/// Name of the event generator list to use.
pub const ENV_GENERATOR_LIST: &str = "GEVGL";
/// Spline files to preload, separated like `PATH`.
pub const ENV_SPLINE_LOAD: &str = "GSPLOAD";
/// Knots per decade of energy for new splines.
pub const ENV_KNOTS_PER_DECADE: &str = "GKNOTS_PER_DECADE";
/// `log` or `linear` knot spacing for new splines.
pub const ENV_KNOT_SPACING: &str = "GKNOT_SPACING";

/// Settings shared by every driver of a run.
///
/// Built with [`RunConfig::from_env`] in applications; tests construct it
/// from a lookup closure so the process environment is never touched.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Name of the generator list passed to [`GeneratorList::from_name`].
    pub generator_list: String,
    pub knot_policy: KnotPolicy,
    pub knot_spacing: KnotSpacing,
    /// Spline XML files merged into the cache at startup.
    pub preload_files: Vec<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            generator_list: DEFAULT_GENERATOR_LIST.to_string(),
            knot_policy: KnotPolicy::default(),
            knot_spacing: KnotSpacing::default(),
            preload_files: Vec::new(),
        }
    }
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by the `GEVGL`, `GSPLOAD`, `GKNOTS_PER_DECADE` and
    /// `GKNOT_SPACING` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`RunConfig::from_env`] but reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(list) = non_empty(ENV_GENERATOR_LIST) {
            config.generator_list = list.trim().to_string();
        }
        if let Some(files) = non_empty(ENV_SPLINE_LOAD) {
            config.preload_files = env::split_paths(&files).collect();
        }
        if let Some(value) = non_empty(ENV_KNOTS_PER_DECADE) {
            let per_decade: f64 = value.trim().parse().map_err(|_| {
                ConfigError::InvalidArgument(format!(
                    "{} must be a number, got '{}'",
                    ENV_KNOTS_PER_DECADE, value
                ))
            })?;
            if !(per_decade.is_finite() && per_decade > 0.0) {
                return Err(ConfigError::InvalidArgument(format!(
                    "{} must be positive, got {}",
                    ENV_KNOTS_PER_DECADE, per_decade
                )));
            }
            config.knot_policy.knots_per_decade = per_decade;
        }
        if let Some(value) = non_empty(ENV_KNOT_SPACING) {
            config.knot_spacing = match value.trim().to_ascii_lowercase().as_str() {
                "log" | "logarithmic" => KnotSpacing::Logarithmic,
                "lin" | "linear" => KnotSpacing::Linear,
                other => {
                    return Err(ConfigError::InvalidArgument(format!(
                        "{} must be 'log' or 'linear', got '{}'",
                        ENV_KNOT_SPACING, other
                    )))
                }
            };
        }
        Ok(config)
    }

    /// Resolve the configured generator list name.
    pub fn generators(&self) -> Result<GeneratorList, ConfigError> {
        GeneratorList::from_name(&self.generator_list)
    }

    /// Empty cache using the configured knot spacing.
    pub fn new_cache(&self) -> SplineCache {
        SplineCache::with_spacing(self.knot_spacing)
    }

    /// Merge every preload file into `cache`. Returns the number of splines
    /// added.
    pub fn preload(&self, cache: &SplineCache) -> Result<usize, PersistenceError> {
        let mut added = 0;
        for path in &self.preload_files {
            added += cache.load_from_file(path)?;
        }
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = RunConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.generator_list, "Default");
        assert_eq!(config.knot_policy.knots_per_decade, 15.0);
        assert_eq!(config.knot_spacing, KnotSpacing::Logarithmic);
        assert!(config.preload_files.is_empty());
    }

    #[test]
    fn test_environment_overrides() {
        let config = RunConfig::from_lookup(lookup(&[
            (ENV_GENERATOR_LIST, "DIS"),
            (ENV_KNOTS_PER_DECADE, "20"),
            (ENV_KNOT_SPACING, "linear"),
            (ENV_SPLINE_LOAD, "splines.xml"),
        ]))
        .unwrap();
        assert_eq!(config.generator_list, "DIS");
        assert_eq!(config.knot_policy.knots_per_decade, 20.0);
        assert_eq!(config.knot_spacing, KnotSpacing::Linear);
        assert_eq!(config.preload_files, vec![PathBuf::from("splines.xml")]);
        assert_eq!(config.generators().unwrap().len(), 2);
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let config = RunConfig::from_lookup(lookup(&[(ENV_GENERATOR_LIST, "  ")])).unwrap();
        assert_eq!(config.generator_list, "Default");
    }

    #[test]
    fn test_invalid_values() {
        assert!(RunConfig::from_lookup(lookup(&[(ENV_KNOTS_PER_DECADE, "many")])).is_err());
        assert!(RunConfig::from_lookup(lookup(&[(ENV_KNOTS_PER_DECADE, "-3")])).is_err());
        assert!(RunConfig::from_lookup(lookup(&[(ENV_KNOT_SPACING, "cubic")])).is_err());
        let config = RunConfig::from_lookup(lookup(&[(ENV_GENERATOR_LIST, "Nope")])).unwrap();
        assert!(matches!(
            config.generators(),
            Err(ConfigError::UnknownGeneratorList(_))
        ));
    }

    #[test]
    fn test_preload_missing_file_fails() {
        let config = RunConfig {
            preload_files: vec![PathBuf::from("/nonexistent/splines.xml")],
            ..RunConfig::default()
        };
        let cache = config.new_cache();
        assert!(matches!(
            config.preload(&cache),
            Err(PersistenceError::Io { .. })
        ));
    }
}
