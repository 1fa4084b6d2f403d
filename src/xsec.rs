//! Cross section integrator interface and the algorithm registry.
//!
//! Physics models plug into the spline cache through [`XSecIntegrator`]. The
//! [`AlgorithmRegistry`] maps algorithm names to factory closures so that the
//! driver resolves every model once, when it is configured, instead of looking
//! algorithms up by name on each call.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::error::{ConfigError, XSecError};
use crate::interaction::{AlgorithmId, InteractionChannel};

/// Integrated cross section of one channel as a function of probe energy.
pub trait XSecIntegrator: Send + Sync + fmt::Debug {
    /// Algorithm name, e.g. `genie::ReinDFRPXSec`.
    fn name(&self) -> &str;

    /// Energy range (GeV) over which the model may be tabulated.
    fn validity_range(&self) -> (f64, f64);

    /// Whether the model can compute `channel` at all.
    fn is_valid_channel(&self, _channel: &InteractionChannel) -> bool {
        true
    }

    /// Integrated cross section (cm^2, per scattering centre) at `energy` GeV.
    fn integrate(&self, channel: &InteractionChannel, energy: f64) -> Result<f64, XSecError>;
}

/// Parsed algorithm configuration string.
///
/// Config strings are `key=value` pairs separated by `;`. The names `Default`
/// and the empty string both mean "no overrides".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlgorithmConfig {
    params: BTreeMap<String, String>,
}

impl AlgorithmConfig {
    pub fn parse(config: &str) -> Result<Self, ConfigError> {
        let mut params = BTreeMap::new();
        let config = config.trim();
        if config.is_empty() || config == "Default" {
            return Ok(Self { params });
        }
        for entry in config.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let (key, value) = entry.split_once('=').ok_or_else(|| {
                ConfigError::InvalidArgument(format!(
                    "algorithm config entry '{}' is not of the form key=value",
                    entry
                ))
            })?;
            params.insert(key.trim().to_string(), value.trim().to_string());
        }
        Ok(Self { params })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Numeric parameter, falling back to `default` when absent.
    pub fn get_f64_or(&self, key: &str, default: f64) -> Result<f64, ConfigError> {
        match self.params.get(key) {
            None => Ok(default),
            Some(v) => v.parse::<f64>().map_err(|_| {
                ConfigError::InvalidArgument(format!("parameter {}='{}' is not a number", key, v))
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

type Factory = Arc<dyn Fn(&AlgorithmConfig) -> Result<Arc<dyn XSecIntegrator>, ConfigError> + Send + Sync>;

/// Registry of cross section algorithm factories keyed by algorithm name.
#[derive(Clone, Default)]
pub struct AlgorithmRegistry {
    factories: HashMap<String, Factory>,
}

impl fmt::Debug for AlgorithmRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("AlgorithmRegistry")
            .field("algorithms", &names)
            .finish()
    }
}

impl AlgorithmRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with every model shipped with the crate.
    pub fn with_builtin_models() -> Self {
        let mut registry = Self::new();
        crate::xsec_models::register_builtin_models(&mut registry);
        crate::rein_sehgal::register(&mut registry);
        registry
    }

    /// Register (or replace) the factory for `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&AlgorithmConfig) -> Result<Arc<dyn XSecIntegrator>, ConfigError>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Instantiate the algorithm `id` with its configuration string.
    pub fn create(&self, id: &AlgorithmId) -> Result<Arc<dyn XSecIntegrator>, ConfigError> {
        let factory = self
            .factories
            .get(&id.name)
            .ok_or_else(|| ConfigError::UnknownAlgorithm(id.name.clone()))?;
        let config = AlgorithmConfig::parse(&id.config)?;
        factory(&config)
    }
}
