use std::env;
use std::fmt;

/// Environment variables that influence a Monte Carlo job.
pub const MC_ENV_VARS: &[&str] = &[
    "GEVGL",
    "GSPLOAD",
    "GKNOTS_PER_DECADE",
    "GKNOT_SPACING",
    "RUST_LOG",
];

const UNDEFINED: &str = "UNDEFINED";

/// Values of [`MC_ENV_VARS`] captured at one moment, kept with the job output
/// so a run can be reproduced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobEnvSnapshot {
    entries: Vec<(String, Option<String>)>,
}

impl JobEnvSnapshot {
    pub fn take() -> Self {
        Self::from_lookup(|var| env::var(var).ok())
    }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        Self {
            entries: MC_ENV_VARS
                .iter()
                .map(|&var| (var.to_string(), lookup(var)))
                .collect(),
        }
    }

    pub fn get(&self, var: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == var)
            .and_then(|(_, value)| value.as_deref())
    }

    /// `envv:<VAR>;value:<VALUE>` records, unset variables as `UNDEFINED`.
    pub fn records(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|(var, value)| {
                format!("envv:{};value:{}", var, value.as_deref().unwrap_or(UNDEFINED))
            })
            .collect()
    }

    pub fn log(&self) {
        log::info!("** MC Job Environment:");
        for (var, value) in &self.entries {
            log::info!("${} ---> {}", var, value.as_deref().unwrap_or(UNDEFINED));
        }
    }
}

impl fmt::Display for JobEnvSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for record in self.records() {
            writeln!(f, "{}", record)?;
        }
        Ok(())
    }
}
