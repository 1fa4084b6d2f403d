// Process-wide cache of cross section splines keyed by interaction channel
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{PersistenceError, SplineError, XSecError};
use crate::interaction::{AlgorithmId, InteractionChannel, Process};
use crate::spline::{Knot, KnotSpacing, Spline};
use crate::xml_io::{read_xml, write_xml};
use crate::xsec::XSecIntegrator;

const SPLINE_FILE_VERSION: &str = "1.0";

// Each channel owns a cell; a build initialises the cell exactly once and
// concurrent callers for the same channel block on it.
type SplineCell = Arc<OnceCell<Arc<Spline>>>;

/// Cache of cross section splines shared by every driver of a run.
///
/// The cache is created explicitly (usually once per process) and handed to
/// drivers as `Arc<SplineCache>`. Lookups take a read lock on the channel map
/// only; building a missing spline runs outside the map lock, serialised per
/// channel, so different channels can be built in parallel while a channel is
/// never integrated twice.
///
/// Splines are immutable once inserted. Loading a file merges into the cache
/// and never replaces a spline that is already present.
#[derive(Debug, Default)]
pub struct SplineCache {
    entries: RwLock<HashMap<InteractionChannel, SplineCell>>,
    spacing: KnotSpacing,
    builds: AtomicUsize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "xsec_spline_list")]
struct SplineListXml {
    #[serde(rename = "@version")]
    version: String,
    #[serde(rename = "spline", default)]
    splines: Vec<SplineXml>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SplineXml {
    #[serde(rename = "@probe")]
    probe: i32,
    #[serde(rename = "@target")]
    target: i32,
    #[serde(
        rename = "@hit_nucleon",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    hit_nucleon: Option<i32>,
    #[serde(rename = "@process")]
    process: Process,
    #[serde(rename = "@algorithm")]
    algorithm: String,
    #[serde(rename = "@config")]
    config: String,
    #[serde(rename = "knot", default)]
    knots: Vec<Knot>,
}

impl SplineXml {
    fn from_entry(channel: &InteractionChannel, spline: &Spline) -> Self {
        Self {
            probe: channel.probe,
            target: channel.target,
            hit_nucleon: channel.hit_nucleon,
            process: channel.process,
            algorithm: channel.algorithm.name.clone(),
            config: channel.algorithm.config.clone(),
            knots: spline.knots(),
        }
    }

    fn channel(&self) -> InteractionChannel {
        InteractionChannel {
            probe: self.probe,
            target: self.target,
            hit_nucleon: self.hit_nucleon,
            process: self.process,
            algorithm: AlgorithmId::new(self.algorithm.clone(), self.config.clone()),
        }
    }
}

impl SplineCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_spacing(spacing: KnotSpacing) -> Self {
        Self {
            spacing,
            ..Self::default()
        }
    }

    pub fn spacing(&self) -> KnotSpacing {
        self.spacing
    }

    fn read_entries(&self) -> RwLockReadGuard<'_, HashMap<InteractionChannel, SplineCell>> {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, HashMap<InteractionChannel, SplineCell>> {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Cell for `channel`, created empty on first request.
    fn cell(&self, channel: &InteractionChannel) -> SplineCell {
        if let Some(cell) = self.read_entries().get(channel) {
            return Arc::clone(cell);
        }
        let mut entries = self.write_entries();
        Arc::clone(entries.entry(channel.clone()).or_default())
    }

    /// Return the spline of `channel`, building it with `integrator` first if
    /// the cache does not hold one yet.
    ///
    /// The integrator is sampled at `n_knots` energies spread over
    /// `[energy_min, energy_max]` according to the cache's [`KnotSpacing`].
    /// Concurrent calls for the same channel run the integration once; the
    /// others wait for it and share the result. A failed build leaves the
    /// channel empty so a later call may try again.
    pub fn get_or_build(
        &self,
        channel: &InteractionChannel,
        integrator: &dyn XSecIntegrator,
        energy_min: f64,
        energy_max: f64,
        n_knots: usize,
    ) -> Result<Arc<Spline>, XSecError> {
        let cell = self.cell(channel);
        let spline = cell.get_or_try_init(|| {
            self.build(channel, integrator, energy_min, energy_max, n_knots)
                .map(Arc::new)
        })?;
        Ok(Arc::clone(spline))
    }

    fn build(
        &self,
        channel: &InteractionChannel,
        integrator: &dyn XSecIntegrator,
        energy_min: f64,
        energy_max: f64,
        n_knots: usize,
    ) -> Result<Spline, XSecError> {
        if !(energy_min.is_finite() && energy_max.is_finite() && energy_min < energy_max) {
            return Err(XSecError::build_failure(
                channel,
                format!("invalid energy range [{}, {}]", energy_min, energy_max),
            ));
        }
        if n_knots < 2 {
            return Err(XSecError::build_failure(
                channel,
                format!("need at least 2 knots, got {}", n_knots),
            ));
        }

        log::info!(
            "Building spline for {} with {} knots in [{}, {}] GeV",
            channel,
            n_knots,
            energy_min,
            energy_max
        );

        let mut knots = Vec::with_capacity(n_knots);
        for energy in self.spacing.grid(energy_min, energy_max, n_knots) {
            let xsec = integrator
                .integrate(channel, energy)
                .map_err(|e| XSecError::build_failure(channel, e))?;
            if !xsec.is_finite() || xsec < 0.0 {
                return Err(XSecError::build_failure(
                    channel,
                    format!("{} returned xsec {} at E = {}", integrator.name(), xsec, energy),
                ));
            }
            log::debug!("  E = {:e} GeV, xsec = {:e} cm^2", energy, xsec);
            knots.push(Knot::new(energy, xsec));
        }

        let spline =
            Spline::from_knots(&knots).map_err(|e| XSecError::build_failure(channel, e))?;
        self.builds.fetch_add(1, Ordering::Relaxed);
        Ok(spline)
    }

    /// Built spline for `channel`, if any.
    pub fn get(&self, channel: &InteractionChannel) -> Option<Arc<Spline>> {
        self.read_entries()
            .get(channel)
            .and_then(|cell| cell.get().cloned())
    }

    /// Cross section of `channel` at `energy`, interpolated from its spline.
    pub fn evaluate(&self, channel: &InteractionChannel, energy: f64) -> Result<f64, SplineError> {
        let spline = self.get(channel).ok_or_else(|| SplineError::NotFound {
            channel: channel.to_string(),
        })?;
        spline.evaluate(energy)
    }

    pub fn contains(&self, channel: &InteractionChannel) -> bool {
        self.get(channel).is_some()
    }

    /// Insert an already built spline. Returns `false`, leaving the cache
    /// unchanged, when the channel already has one.
    pub fn insert(&self, channel: InteractionChannel, spline: Spline) -> bool {
        let cell = self.cell(&channel);
        cell.set(Arc::new(spline)).is_ok()
    }

    /// Number of channels with a built spline.
    pub fn len(&self) -> usize {
        self.read_entries()
            .values()
            .filter(|cell| cell.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Channels with a built spline, in key order.
    pub fn channels(&self) -> Vec<InteractionChannel> {
        let mut channels: Vec<InteractionChannel> = self
            .read_entries()
            .iter()
            .filter(|(_, cell)| cell.get().is_some())
            .map(|(channel, _)| channel.clone())
            .collect();
        channels.sort();
        channels
    }

    /// Number of splines built by integration (loaded splines are not counted).
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }

    /// Drop every cached spline.
    pub fn clear(&self) {
        self.write_entries().clear();
        log::debug!("Cleared spline cache");
    }

    /// Write every built spline to an XML file, ordered by channel.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), PersistenceError> {
        let path = path.as_ref();
        let splines: Vec<SplineXml> = self
            .channels()
            .iter()
            .filter_map(|channel| {
                self.get(channel)
                    .map(|spline| SplineXml::from_entry(channel, &spline))
            })
            .collect();
        let n = splines.len();
        let doc = SplineListXml {
            version: SPLINE_FILE_VERSION.to_string(),
            splines,
        };
        write_xml(path, &doc)?;
        log::info!("Saved {} splines to {}", n, path.display());
        Ok(())
    }

    /// Merge the splines stored in an XML file into the cache.
    ///
    /// The whole file is validated before anything is inserted. Channels that
    /// already have a spline keep it. Returns the number of splines added.
    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<usize, PersistenceError> {
        let path = path.as_ref();
        let doc: SplineListXml = read_xml(path)?;

        let mut parsed = Vec::with_capacity(doc.splines.len());
        for entry in &doc.splines {
            let channel = entry.channel();
            let spline = Spline::from_knots(&entry.knots).map_err(|e| PersistenceError::Invalid {
                path: path.to_path_buf(),
                reason: format!("{}: {}", channel, e),
            })?;
            parsed.push((channel, spline));
        }

        let mut added = 0;
        for (channel, spline) in parsed {
            let label = channel.to_string();
            if self.insert(channel, spline) {
                added += 1;
            } else {
                log::warn!("Spline for {} already cached, keeping the in-memory copy", label);
            }
        }
        log::info!(
            "Loaded {} of {} splines from {} (file version {})",
            added,
            doc.splines.len(),
            path.display(),
            doc.version
        );
        Ok(added)
    }
}
