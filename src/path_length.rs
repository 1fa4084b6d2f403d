use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::{PathLengthError, PersistenceError};
use crate::pdg;
use crate::xml_io::{read_xml, write_xml};

/// Path lengths of a probe through each detector material, keyed by the
/// material's PDG code.
///
/// Filled while a ray crosses the geometry (one [`add_path_length`] per volume
/// crossing) and then read by the driver when selecting an interaction
/// channel. All stored values are finite and non-negative; the mutators
/// reject anything that would break that.
///
/// [`add_path_length`]: PathLengthList::add_path_length
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathLengthList {
    lengths: BTreeMap<i32, f64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "path_length_list")]
struct PathLengthListXml {
    #[serde(rename = "path_length", default)]
    entries: Vec<PathLengthXml>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PathLengthXml {
    #[serde(rename = "@pdgc")]
    pdgc: i32,
    #[serde(rename = "$text")]
    value: f64,
}

fn check_value(pdg: i32, value: f64) -> Result<(), PathLengthError> {
    if !value.is_finite() || value < 0.0 {
        return Err(PathLengthError::NegativePathLength { pdg, value });
    }
    Ok(())
}

impl PathLengthList {
    pub fn new() -> Self {
        Self::default()
    }

    /// One zero-length entry per material code.
    pub fn from_pdg_codes<I: IntoIterator<Item = i32>>(codes: I) -> Self {
        Self {
            lengths: codes.into_iter().map(|c| (c, 0.0)).collect(),
        }
    }

    /// path_length(pdg) += pl
    pub fn add_path_length(&mut self, pdg: i32, pl: f64) -> Result<(), PathLengthError> {
        let current = self.path_length(pdg);
        check_value(pdg, current + pl)?;
        self.lengths.insert(pdg, current + pl);
        Ok(())
    }

    /// path_length(pdg) = pl
    pub fn set_path_length(&mut self, pdg: i32, pl: f64) -> Result<(), PathLengthError> {
        check_value(pdg, pl)?;
        self.lengths.insert(pdg, pl);
        Ok(())
    }

    /// path_length(pdg) *= scale. A negative scale leaves the list untouched.
    pub fn scale_path_length(&mut self, pdg: i32, scale: f64) -> Result<(), PathLengthError> {
        if !scale.is_finite() || scale < 0.0 {
            return Err(PathLengthError::InvalidScale { pdg, scale });
        }
        if let Some(pl) = self.lengths.get_mut(&pdg) {
            *pl *= scale;
        }
        Ok(())
    }

    /// Path length through `pdg`, zero when the material was never crossed.
    pub fn path_length(&self, pdg: i32) -> f64 {
        self.lengths.get(&pdg).copied().unwrap_or(0.0)
    }

    pub fn set_all_to_zero(&mut self) {
        for pl in self.lengths.values_mut() {
            *pl = 0.0;
        }
    }

    pub fn are_all_zero(&self) -> bool {
        self.lengths.values().all(|&pl| pl == 0.0)
    }

    pub fn materials(&self) -> impl Iterator<Item = i32> + '_ {
        self.lengths.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.lengths.iter().map(|(&k, &v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    /// Replace the contents with the list stored in an XML file.
    pub fn load_from_xml<P: AsRef<Path>>(&mut self, path: P) -> Result<(), PersistenceError> {
        let path = path.as_ref();
        let doc: PathLengthListXml = read_xml(path)?;

        let mut loaded = PathLengthList::new();
        for entry in doc.entries {
            loaded
                .set_path_length(entry.pdgc, entry.value)
                .map_err(|e| PersistenceError::Invalid {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;
        }
        log::debug!("Loaded {} path lengths from {}", loaded.len(), path.display());
        *self = loaded;
        Ok(())
    }

    pub fn save_as_xml<P: AsRef<Path>>(&self, path: P) -> Result<(), PersistenceError> {
        let doc = PathLengthListXml {
            entries: self
                .iter()
                .map(|(pdgc, value)| PathLengthXml { pdgc, value })
                .collect(),
        };
        write_xml(path.as_ref(), &doc)
    }
}

impl fmt::Display for PathLengthList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Path lengths:")?;
        for (pdgc, pl) in self.iter() {
            writeln!(f, "  {:>12} ({:>6}) -> {:e}", pdgc, pdg::particle_name(pdgc), pl)?;
        }
        Ok(())
    }
}
