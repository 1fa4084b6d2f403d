//! Property-based tests for splines, path length lists and the knot policy.

use nuevgen::{
    interpolate_linear, Knot, KnotPolicy, PathLengthError, PathLengthList, Spline, SplineError,
};
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

/// Knots with strictly increasing energies and non-negative values.
fn arb_knots(max_len: usize) -> impl Strategy<Value = Vec<Knot>> {
    proptest::collection::vec((0.01f64..10.0, 0.0f64..1e-37), 2..=max_len).prop_map(|steps| {
        let mut energy = 0.0;
        steps
            .into_iter()
            .map(|(step, value)| {
                energy += step;
                Knot::new(energy, value)
            })
            .collect()
    })
}

fn arb_material() -> impl Strategy<Value = i32> {
    prop_oneof![
        Just(1000010010),
        Just(1000080160),
        Just(1000260560),
        Just(1000822080),
    ]
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Evaluating at a knot returns the knot value exactly.
    #[test]
    fn spline_passes_through_knots(knots in arb_knots(40)) {
        let spline = Spline::from_knots(&knots).unwrap();
        for k in &knots {
            prop_assert_eq!(spline.evaluate(k.energy), Ok(k.value));
        }
    }

    /// Inside the domain the value lies between the neighbouring knot values.
    #[test]
    fn spline_is_bounded_by_neighbours(knots in arb_knots(40), frac in 0.0f64..1.0) {
        let spline = Spline::from_knots(&knots).unwrap();
        let energy = (spline.energy_min() + frac * (spline.energy_max() - spline.energy_min()))
            .min(spline.energy_max());
        let value = spline.evaluate(energy).unwrap();
        let i = knots.windows(2).position(|w| energy >= w[0].energy && energy <= w[1].energy).unwrap();
        let (lo, hi) = if knots[i].value < knots[i + 1].value {
            (knots[i].value, knots[i + 1].value)
        } else {
            (knots[i + 1].value, knots[i].value)
        };
        let tol = 1e-12 * hi.abs().max(1e-300);
        prop_assert!(value >= lo - tol && value <= hi + tol);
    }

    /// Energies outside the knot range are rejected, never extrapolated.
    #[test]
    fn spline_rejects_out_of_domain(knots in arb_knots(10), below in 1e-6f64..5.0, above in 1e-6f64..5.0) {
        let spline = Spline::from_knots(&knots).unwrap();
        let is_out_of_domain = |r: Result<f64, SplineError>| matches!(r, Err(SplineError::OutOfDomain { .. }));
        prop_assert!(is_out_of_domain(spline.evaluate(spline.energy_min() - below)));
        prop_assert!(is_out_of_domain(spline.evaluate(spline.energy_max() + above)));
    }

    /// Evaluation is a pure function of the knots.
    #[test]
    fn spline_evaluation_is_deterministic(knots in arb_knots(20), frac in 0.0f64..1.0) {
        let a = Spline::from_knots(&knots).unwrap();
        let b = Spline::from_knots(&knots).unwrap();
        let energy = a.energy_min() + frac * (a.energy_max() - a.energy_min());
        prop_assert_eq!(a.evaluate(energy), b.evaluate(energy));
        let x: Vec<f64> = knots.iter().map(|k| k.energy).collect();
        let y: Vec<f64> = knots.iter().map(|k| k.value).collect();
        prop_assert_eq!(a.evaluate(energy).ok(), interpolate_linear(&x, &y, energy));
    }

    /// Knot counts grow with the energy range and never drop below the floor.
    #[test]
    fn knot_policy_respects_minimum(e_min in 1e-3f64..1.0, decades in 0.1f64..6.0) {
        let policy = KnotPolicy::default();
        let e_max = e_min * 10f64.powf(decades);
        let n = policy.n_knots(e_min, e_max);
        prop_assert!(n >= policy.min_knots);
        prop_assert!(n as f64 + 1.0 >= policy.knots_per_decade * decades);
    }

    /// Accumulated path lengths do not depend on the order of crossings.
    #[test]
    fn path_length_accumulation_commutes(
        steps in proptest::collection::vec((arb_material(), 0.0f64..100.0), 0..30)
    ) {
        let mut forward = PathLengthList::new();
        for &(pdg, pl) in &steps {
            forward.add_path_length(pdg, pl).unwrap();
        }
        let mut backward = PathLengthList::new();
        for &(pdg, pl) in steps.iter().rev() {
            backward.add_path_length(pdg, pl).unwrap();
        }
        for pdg in forward.materials() {
            let (f, b) = (forward.path_length(pdg), backward.path_length(pdg));
            prop_assert!((f - b).abs() <= 1e-9 * f.max(1.0));
        }
        prop_assert!(forward.iter().all(|(_, pl)| pl >= 0.0));
    }

    /// A negative scale factor is rejected and leaves the list unchanged.
    #[test]
    fn negative_scale_leaves_list_unchanged(
        steps in proptest::collection::vec((arb_material(), 0.0f64..100.0), 1..10),
        scale in -100.0f64..-1e-9,
    ) {
        let mut list = PathLengthList::new();
        for &(pdg, pl) in &steps {
            list.set_path_length(pdg, pl).unwrap();
        }
        let before = list.clone();
        let pdg = steps[0].0;
        prop_assert_eq!(
            list.scale_path_length(pdg, scale),
            Err(PathLengthError::InvalidScale { pdg, scale })
        );
        prop_assert_eq!(list, before);
    }
}

#[test]
fn path_length_xml_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("path_lengths.xml");

    let mut list = PathLengthList::new();
    list.set_path_length(1000260560, 15.74).unwrap();
    list.set_path_length(1000080160, 0.1 + 0.2).unwrap();
    list.set_path_length(1000010010, 0.0).unwrap();
    list.save_as_xml(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("<path_length_list>"));
    assert!(text.contains("pdgc=\"1000260560\""));

    let mut loaded = PathLengthList::new();
    loaded.set_path_length(1000822080, 3.0).unwrap();
    loaded.load_from_xml(&path).unwrap();
    assert_eq!(loaded, list);
}

#[test]
fn path_length_xml_rejects_negative_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.xml");
    std::fs::write(
        &path,
        "<path_length_list><path_length pdgc=\"1000260560\">-1.5</path_length></path_length_list>",
    )
    .unwrap();
    let mut list = PathLengthList::new();
    list.set_path_length(1000260560, 2.0).unwrap();
    assert!(list.load_from_xml(&path).is_err());
    assert_eq!(list.path_length(1000260560), 2.0);
}
