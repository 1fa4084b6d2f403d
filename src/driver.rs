//! Event generator driver.
//!
//! A driver is bound to one initial state (probe + target). Configuring it
//! resolves the generator list into concrete interaction channels, each with
//! its integrator instantiated once through the [`AlgorithmRegistry`]. Splines
//! for those channels live in the shared [`SplineCache`]; they can be built
//! ahead of time with [`EventGeneratorDriver::create_splines`] or on first use.
//!
//! Channel selection weights every channel by
//! `xsec(E) * path_length(target) * scattering_centers` and draws from the
//! cumulative table.

use rand::Rng;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::error::{ConfigError, SelectionError, XSecError};
use crate::generators::GeneratorList;
use crate::interaction::{InitialState, InteractionChannel};
use crate::path_length::PathLengthList;
use crate::spline::{KnotPolicy, Spline};
use crate::spline_cache::SplineCache;
use crate::xsec::{AlgorithmRegistry, XSecIntegrator};

/// Lifecycle of a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Unconfigured,
    Configured,
    SplinesReady,
}

#[derive(Debug, Clone)]
struct ResolvedChannel {
    channel: InteractionChannel,
    integrator: Arc<dyn XSecIntegrator>,
}

/// Outcome of a spline warm-up.
#[derive(Debug, Default)]
pub struct SplineReport {
    /// Splines integrated during this call.
    pub built: usize,
    /// Channels whose spline was already in the cache.
    pub cached: usize,
    /// Channels that could not be built, with the cause.
    pub failures: Vec<(InteractionChannel, XSecError)>,
}

impl SplineReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for SplineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} built, {} cached, {} failed",
            self.built,
            self.cached,
            self.failures.len()
        )
    }
}

/// Cumulative selection weights over the channels of a configured driver.
///
/// Channels with zero weight keep their slot as an empty interval, so the
/// table always lines up with [`EventGeneratorDriver::channels`].
#[derive(Debug, Clone)]
pub struct WeightTable {
    channels: Vec<InteractionChannel>,
    cumulative: Vec<f64>,
}

impl WeightTable {
    fn from_weights(entries: Vec<(InteractionChannel, f64)>) -> Self {
        let mut channels = Vec::with_capacity(entries.len());
        let mut cumulative = Vec::with_capacity(entries.len());
        let mut sum = 0.0;
        for (channel, weight) in entries {
            sum += weight;
            channels.push(channel);
            cumulative.push(sum);
        }
        Self {
            channels,
            cumulative,
        }
    }

    pub fn total(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Weight of the i-th channel.
    pub fn weight(&self, i: usize) -> Option<f64> {
        let upper = *self.cumulative.get(i)?;
        let lower = if i == 0 { 0.0 } else { self.cumulative[i - 1] };
        Some(upper - lower)
    }

    /// Channel whose interval `[cum[i-1], cum[i])` contains `draw`.
    pub fn select(&self, draw: f64) -> Option<&InteractionChannel> {
        if !(0.0..self.total()).contains(&draw) {
            return None;
        }
        self.cumulative
            .iter()
            .position(|&c| draw < c)
            .map(|i| &self.channels[i])
    }

    pub fn channels(&self) -> &[InteractionChannel] {
        &self.channels
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

#[derive(Debug)]
pub struct EventGeneratorDriver {
    cache: Arc<SplineCache>,
    registry: Arc<AlgorithmRegistry>,
    generators: GeneratorList,
    knot_policy: KnotPolicy,
    init_state: Option<InitialState>,
    channels: Vec<ResolvedChannel>,
    /// Channels whose warm-up build failed; they weigh zero until reconfigured.
    failed: HashSet<InteractionChannel>,
    state: DriverState,
}

impl EventGeneratorDriver {
    pub fn new(
        cache: Arc<SplineCache>,
        registry: Arc<AlgorithmRegistry>,
        generators: GeneratorList,
    ) -> Self {
        Self {
            cache,
            registry,
            generators,
            knot_policy: KnotPolicy::default(),
            init_state: None,
            channels: Vec::new(),
            failed: HashSet::new(),
            state: DriverState::Unconfigured,
        }
    }

    pub fn with_knot_policy(mut self, knot_policy: KnotPolicy) -> Self {
        self.knot_policy = knot_policy;
        self
    }

    /// Bind the driver to `init_state` and resolve its channels.
    ///
    /// Any previous binding is replaced. On error the driver is left
    /// unconfigured.
    pub fn configure(&mut self, init_state: InitialState) -> Result<(), ConfigError> {
        self.init_state = None;
        self.channels.clear();
        self.failed.clear();
        self.state = DriverState::Unconfigured;

        let mut channels = Vec::new();
        for spec in self.generators.iter() {
            let integrator = self.registry.create(&spec.algorithm)?;
            for channel in spec.channels(init_state) {
                if integrator.is_valid_channel(&channel) {
                    channels.push(ResolvedChannel {
                        channel,
                        integrator: Arc::clone(&integrator),
                    });
                } else {
                    log::debug!("{} does not handle {}, skipped", integrator.name(), channel);
                }
            }
        }
        if channels.is_empty() {
            log::warn!("No interaction channels for {}", init_state);
        }
        log::info!(
            "Configured driver for {} with {} channels from generator list '{}'",
            init_state,
            channels.len(),
            self.generators.name()
        );

        self.init_state = Some(init_state);
        self.channels = channels;
        self.state = DriverState::Configured;
        Ok(())
    }

    /// Energy range over which the spline of `resolved` is tabulated.
    ///
    /// A `max_energy` at or below the bottom of the validity range leaves
    /// nothing to tabulate.
    fn spline_range(
        resolved: &ResolvedChannel,
        max_energy: Option<f64>,
    ) -> Result<(f64, f64), XSecError> {
        let (e_min, mut e_max) = resolved.integrator.validity_range();
        if let Some(limit) = max_energy {
            if limit <= e_min {
                return Err(XSecError::InvalidEnergy {
                    algorithm: resolved.integrator.name().to_string(),
                    energy: limit,
                });
            }
            if limit < e_max {
                e_max = limit;
            }
        }
        Ok((e_min, e_max))
    }

    fn spline_for(
        &self,
        resolved: &ResolvedChannel,
        n_knots: Option<usize>,
        max_energy: Option<f64>,
    ) -> Result<Arc<Spline>, XSecError> {
        let (e_min, e_max) = Self::spline_range(resolved, max_energy)?;
        let n = n_knots.unwrap_or_else(|| self.knot_policy.n_knots(e_min, e_max));
        self.cache.get_or_build(
            &resolved.channel,
            resolved.integrator.as_ref(),
            e_min,
            e_max,
            n,
        )
    }

    /// Build the spline of every channel missing from the cache.
    ///
    /// `n_knots` overrides the knot policy and `max_energy` caps the upper
    /// end of each integrator's validity range. A failing channel is logged
    /// and reported; the others are still built. Failed channels carry zero
    /// weight in later selections and are not rebuilt until the driver is
    /// configured again.
    pub fn create_splines(
        &mut self,
        n_knots: Option<usize>,
        max_energy: Option<f64>,
    ) -> Result<SplineReport, SelectionError> {
        if self.state == DriverState::Unconfigured {
            return Err(SelectionError::NotConfigured);
        }
        let mut report = SplineReport::default();
        for resolved in &self.channels {
            if self.cache.contains(&resolved.channel) {
                log::debug!("Spline for {} already cached", resolved.channel);
                report.cached += 1;
                continue;
            }
            match self.spline_for(resolved, n_knots, max_energy) {
                Ok(_) => report.built += 1,
                Err(e) => {
                    log::error!("Failed to build spline for {}: {}", resolved.channel, e);
                    report.failures.push((resolved.channel.clone(), e));
                }
            }
        }
        self.failed = report
            .failures
            .iter()
            .map(|(channel, _)| channel.clone())
            .collect();
        log::info!("Spline warm-up: {}", report);
        self.state = DriverState::SplinesReady;
        Ok(report)
    }

    fn xsec(&self, resolved: &ResolvedChannel, energy: f64) -> Result<f64, SelectionError> {
        let spline = match self.cache.get(&resolved.channel) {
            Some(spline) => spline,
            None if self.failed.contains(&resolved.channel) => {
                log::trace!("{} failed warm-up, weight set to zero", resolved.channel);
                return Ok(0.0);
            }
            None => self.spline_for(resolved, None, None)?,
        };
        Ok(spline.evaluate(energy)?)
    }

    /// Selection weights of all channels at `energy`.
    ///
    /// Materials with zero path length contribute zero weight without their
    /// splines being evaluated.
    pub fn weight_table(
        &self,
        path_lengths: &PathLengthList,
        energy: f64,
    ) -> Result<WeightTable, SelectionError> {
        if self.state == DriverState::Unconfigured {
            return Err(SelectionError::NotConfigured);
        }
        let mut entries = Vec::with_capacity(self.channels.len());
        for resolved in &self.channels {
            let pl = path_lengths.path_length(resolved.channel.target);
            let weight = if pl > 0.0 {
                self.xsec(resolved, energy)? * pl * self.scattering_centers(&resolved.channel)
            } else {
                0.0
            };
            entries.push((resolved.channel.clone(), weight));
        }
        Ok(WeightTable::from_weights(entries))
    }

    /// Pick the channel that fires for a probe of `energy` GeV crossing the
    /// materials in `path_lengths`.
    pub fn select_channel<R: Rng + ?Sized>(
        &self,
        path_lengths: &PathLengthList,
        energy: f64,
        rng: &mut R,
    ) -> Result<InteractionChannel, SelectionError> {
        let table = self.weight_table(path_lengths, energy)?;
        let total = table.total();
        if !(total > 0.0 && total.is_finite()) {
            return Err(SelectionError::NoViableChannel {
                energy,
                total_weight: total,
            });
        }
        let xi = rng.gen_range(0.0..total);
        let selected = table
            .select(xi)
            .cloned()
            .ok_or(SelectionError::NoViableChannel {
                energy,
                total_weight: total,
            })?;
        log::trace!("Selected {} at E = {} GeV", selected, energy);
        Ok(selected)
    }

    /// Z for a struck proton, N for a struck neutron, 1 otherwise.
    pub fn scattering_centers(&self, channel: &InteractionChannel) -> f64 {
        channel.scattering_centers()
    }

    /// Sum over channels of `xsec * scattering_centers` at `energy`, i.e. the
    /// total cross section per target nucleus.
    pub fn total_xsec(&self, energy: f64) -> Result<f64, SelectionError> {
        if self.state == DriverState::Unconfigured {
            return Err(SelectionError::NotConfigured);
        }
        let mut total = 0.0;
        for resolved in &self.channels {
            total += self.xsec(resolved, energy)? * self.scattering_centers(&resolved.channel);
        }
        Ok(total)
    }

    pub fn channels(&self) -> impl Iterator<Item = &InteractionChannel> {
        self.channels.iter().map(|r| &r.channel)
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn initial_state(&self) -> Option<InitialState> {
        self.init_state
    }

    pub fn cache(&self) -> &Arc<SplineCache> {
        &self.cache
    }

    pub fn generator_list(&self) -> &GeneratorList {
        &self.generators
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::GeneratorSpec;
    use crate::interaction::{AlgorithmId, InteractionType, Process, ScatteringType};
    use crate::xsec::AlgorithmConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const H1: i32 = 1000010010;
    const FE56: i32 = 1000260560;

    #[derive(Debug)]
    struct Flat(f64);

    impl XSecIntegrator for Flat {
        fn name(&self) -> &str {
            "test::Flat"
        }
        fn validity_range(&self) -> (f64, f64) {
            (0.1, 10.0)
        }
        fn integrate(&self, _channel: &InteractionChannel, _energy: f64) -> Result<f64, XSecError> {
            Ok(self.0)
        }
    }

    /// Fails for struck protons, flat 1.0 otherwise; counts integrations.
    #[derive(Debug)]
    struct ProtonFails(Arc<AtomicUsize>);

    impl XSecIntegrator for ProtonFails {
        fn name(&self) -> &str {
            "test::ProtonFails"
        }
        fn validity_range(&self) -> (f64, f64) {
            (0.1, 10.0)
        }
        fn integrate(&self, channel: &InteractionChannel, _energy: f64) -> Result<f64, XSecError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            if channel.hit_nucleon == Some(crate::pdg::PDG_PROTON) {
                return Err(XSecError::Integration {
                    algorithm: "test::ProtonFails".into(),
                    reason: "no convergence".into(),
                });
            }
            Ok(1.0)
        }
    }

    fn proton_fails_driver(calls: &Arc<AtomicUsize>) -> EventGeneratorDriver {
        let mut registry = AlgorithmRegistry::new();
        let counter = Arc::clone(calls);
        registry.register("test::ProtonFails", move |_cfg: &AlgorithmConfig| {
            Ok(Arc::new(ProtonFails(Arc::clone(&counter))) as Arc<dyn XSecIntegrator>)
        });
        let generators = GeneratorList::new(
            "test",
            vec![GeneratorSpec::new(
                Process::new(ScatteringType::DeepInelastic, InteractionType::ChargedCurrent),
                AlgorithmId::new("test::ProtonFails", "Default"),
            )],
        );
        EventGeneratorDriver::new(Arc::new(SplineCache::new()), Arc::new(registry), generators)
    }

    fn registry() -> Arc<AlgorithmRegistry> {
        let mut registry = AlgorithmRegistry::new();
        registry.register("test::Flat", |cfg: &AlgorithmConfig| {
            Ok(Arc::new(Flat(cfg.get_f64_or("value", 1.0)?)) as Arc<dyn XSecIntegrator>)
        });
        Arc::new(registry)
    }

    fn flat_generators(values: &[(ScatteringType, &str)]) -> GeneratorList {
        GeneratorList::new(
            "test",
            values
                .iter()
                .map(|&(scattering, config)| {
                    GeneratorSpec::new(
                        Process::new(scattering, InteractionType::ChargedCurrent),
                        AlgorithmId::new("test::Flat", config),
                    )
                })
                .collect(),
        )
    }

    fn driver(values: &[(ScatteringType, &str)]) -> EventGeneratorDriver {
        EventGeneratorDriver::new(
            Arc::new(SplineCache::new()),
            registry(),
            flat_generators(values),
        )
    }

    fn path_lengths(target: i32, pl: f64) -> PathLengthList {
        let mut list = PathLengthList::new();
        list.set_path_length(target, pl).unwrap();
        list
    }

    #[test]
    fn test_select_before_configure() {
        let d = driver(&[(ScatteringType::DeepInelastic, "value=1")]);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(d.state(), DriverState::Unconfigured);
        assert_eq!(
            d.select_channel(&path_lengths(H1, 1.0), 1.0, &mut rng),
            Err(SelectionError::NotConfigured)
        );
    }

    #[test]
    fn test_configure_resolves_channels() {
        let mut d = driver(&[
            (ScatteringType::QuasiElastic, "value=1"),
            (ScatteringType::DeepInelastic, "value=2"),
        ]);
        d.configure(InitialState::new(FE56, 14)).unwrap();
        assert_eq!(d.state(), DriverState::Configured);
        // two processes, each on protons and neutrons
        assert_eq!(d.channels().count(), 4);

        d.configure(InitialState::new(H1, 14)).unwrap();
        assert_eq!(d.channels().count(), 2);
        assert!(d.channels().all(|c| c.target == H1));
        assert_eq!(d.initial_state(), Some(InitialState::new(H1, 14)));
    }

    #[test]
    fn test_configure_unknown_algorithm() {
        let generators = GeneratorList::new(
            "bad",
            vec![GeneratorSpec::new(
                Process::new(ScatteringType::DeepInelastic, InteractionType::ChargedCurrent),
                AlgorithmId::new("test::Missing", "Default"),
            )],
        );
        let mut d = EventGeneratorDriver::new(Arc::new(SplineCache::new()), registry(), generators);
        assert!(matches!(
            d.configure(InitialState::new(H1, 14)),
            Err(ConfigError::UnknownAlgorithm(_))
        ));
        assert_eq!(d.state(), DriverState::Unconfigured);
    }

    #[test]
    fn test_create_splines_and_report() {
        let mut d = driver(&[
            (ScatteringType::QuasiElastic, "value=1"),
            (ScatteringType::DeepInelastic, "value=2"),
        ]);
        d.configure(InitialState::new(H1, 14)).unwrap();
        let report = d.create_splines(Some(12), Some(5.0)).unwrap();
        assert_eq!(report.built, 2);
        assert!(report.is_complete());
        assert_eq!(d.state(), DriverState::SplinesReady);
        for channel in d.channels() {
            let spline = d.cache().get(channel).unwrap();
            assert_eq!(spline.n_knots(), 12);
            assert_eq!(spline.energy_max(), 5.0);
        }

        let again = d.create_splines(None, None).unwrap();
        assert_eq!(again.built, 0);
        assert_eq!(again.cached, 2);
    }

    #[test]
    fn test_weight_table_and_selection() {
        let mut d = driver(&[
            (ScatteringType::QuasiElastic, "value=1"),
            (ScatteringType::DeepInelastic, "value=3"),
        ]);
        d.configure(InitialState::new(H1, 14)).unwrap();
        let table = d.weight_table(&path_lengths(H1, 2.0), 1.0).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.weight(0), Some(2.0));
        assert_eq!(table.weight(1), Some(6.0));
        assert_eq!(table.total(), 8.0);
        assert_eq!(table.select(0.0).unwrap().process.scattering, ScatteringType::QuasiElastic);
        assert_eq!(table.select(1.999).unwrap().process.scattering, ScatteringType::QuasiElastic);
        assert_eq!(table.select(2.0).unwrap().process.scattering, ScatteringType::DeepInelastic);
        assert!(table.select(8.0).is_none());
        assert!(table.select(-1.0).is_none());
    }

    #[test]
    fn test_zero_weight_never_selected() {
        let mut d = driver(&[
            (ScatteringType::QuasiElastic, "value=0"),
            (ScatteringType::DeepInelastic, "value=1"),
        ]);
        d.configure(InitialState::new(H1, 14)).unwrap();
        let pl = path_lengths(H1, 1.0);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let channel = d.select_channel(&pl, 2.0, &mut rng).unwrap();
            assert_eq!(channel.process.scattering, ScatteringType::DeepInelastic);
        }
    }

    #[test]
    fn test_no_viable_channel() {
        let mut d = driver(&[(ScatteringType::DeepInelastic, "value=1")]);
        d.configure(InitialState::new(H1, 14)).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        // target material not crossed
        let err = d
            .select_channel(&path_lengths(FE56, 1.0), 1.0, &mut rng)
            .unwrap_err();
        assert!(matches!(err, SelectionError::NoViableChannel { .. }));
    }

    #[test]
    fn test_out_of_domain_energy() {
        let mut d = driver(&[(ScatteringType::DeepInelastic, "value=1")]);
        d.configure(InitialState::new(H1, 14)).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let err = d
            .select_channel(&path_lengths(H1, 1.0), 50.0, &mut rng)
            .unwrap_err();
        assert!(matches!(err, SelectionError::Spline(_)));
    }

    #[test]
    fn test_scattering_centers_weighting() {
        let mut d = driver(&[(ScatteringType::DeepInelastic, "value=1")]);
        d.configure(InitialState::new(FE56, 14)).unwrap();
        let table = d.weight_table(&path_lengths(FE56, 1.0), 1.0).unwrap();
        // proton channel first (Z = 26), then neutron (N = 30)
        assert_eq!(table.weight(0), Some(26.0));
        assert_eq!(table.weight(1), Some(30.0));
        assert_eq!(d.total_xsec(1.0).unwrap(), 56.0);
    }

    #[test]
    fn test_warm_up_skips_failing_channel() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut d = proton_fails_driver(&calls);
        d.configure(InitialState::new(FE56, 14)).unwrap();
        assert_eq!(d.channels().count(), 2);

        let report = d.create_splines(Some(20), None).unwrap();
        assert_eq!(report.built, 1);
        assert_eq!(report.failures.len(), 1);
        assert!(!report.is_complete());
        assert_eq!(report.failures[0].0.hit_nucleon, Some(crate::pdg::PDG_PROTON));
        assert_eq!(d.state(), DriverState::SplinesReady);

        let neutron = d
            .channels()
            .find(|c| c.hit_nucleon == Some(crate::pdg::PDG_NEUTRON))
            .cloned()
            .unwrap();
        assert_eq!(d.cache().get(&neutron).unwrap().n_knots(), 20);
        assert_eq!(d.cache().len(), 1);
    }

    #[test]
    fn test_failed_channel_has_zero_weight_after_warm_up() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut d = proton_fails_driver(&calls);
        d.configure(InitialState::new(FE56, 14)).unwrap();
        d.create_splines(Some(20), None).unwrap();
        let after_warm_up = calls.load(Ordering::SeqCst);

        let pl = path_lengths(FE56, 1.0);
        let table = d.weight_table(&pl, 2.0).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.weight(0), Some(0.0));
        assert_eq!(table.weight(1), Some(30.0));
        assert_eq!(d.total_xsec(2.0).unwrap(), 30.0);

        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            let channel = d.select_channel(&pl, 2.0, &mut rng).unwrap();
            assert_eq!(channel.hit_nucleon, Some(crate::pdg::PDG_NEUTRON));
        }
        assert_eq!(calls.load(Ordering::SeqCst), after_warm_up);

        // a fresh binding forgets the failure and tries again
        d.configure(InitialState::new(FE56, 14)).unwrap();
        assert!(matches!(
            d.weight_table(&pl, 2.0),
            Err(SelectionError::Build(_))
        ));
        assert!(calls.load(Ordering::SeqCst) > after_warm_up);
    }

    #[test]
    fn test_max_energy_below_validity_range() {
        let mut d = driver(&[(ScatteringType::DeepInelastic, "value=1")]);
        d.configure(InitialState::new(H1, 14)).unwrap();
        let report = d.create_splines(None, Some(0.05)).unwrap();
        assert_eq!(report.built, 0);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            report.failures[0].1,
            XSecError::InvalidEnergy { energy, .. } if energy == 0.05
        ));
        assert!(d.cache().is_empty());
    }
}
