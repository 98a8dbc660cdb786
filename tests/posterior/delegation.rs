use mcmc_posterior::Error;

use crate::stubs::{StubFactory, tagged_posterior};

#[test]
fn test_prediction_comes_from_canonical_particle() {
    let model = tagged_posterior(&[7.0, 1.0, 2.0, 3.0], StubFactory::default()).unwrap();
    for query in [[0.0], [0.5], [1.0]] {
        let p = model.prediction(&query).unwrap();
        assert_eq!(p.mean().to_bits(), 7.0_f64.to_bits());
    }
}

#[test]
fn test_prediction_ignores_other_particles() {
    let a = tagged_posterior(&[5.0, 1.0, 1.0], StubFactory::default()).unwrap();
    let b = tagged_posterior(&[5.0, 40.0, 90.0], StubFactory::default()).unwrap();
    assert_eq!(
        a.prediction(&[0.2]).unwrap(),
        b.prediction(&[0.2]).unwrap()
    );
    assert!(a.evaluate_criteria(&[0.2]).unwrap() < b.evaluate_criteria(&[0.2]).unwrap());
}

#[test]
fn test_requires_comparison_follows_canonical_particle() {
    for canonical in [true, false] {
        let factory = StubFactory {
            canonical_comparison: canonical,
            ..StubFactory::default()
        };
        let model = tagged_posterior(&[1.0, 2.0, 3.0], factory).unwrap();
        assert_eq!(model.criteria_requires_comparison(), canonical);
    }
}

#[test]
fn test_best_criteria_consults_only_canonical_particle() {
    let factory = StubFactory::with_cycles(vec![2]);
    let mut model = tagged_posterior(&[1.0, 2.0, 3.0], factory).unwrap();

    model.set_first_criterion();
    assert!(!model.set_next_criterion(&[0.25]).unwrap());
    assert!(model.set_next_criterion(&[0.75]).unwrap());

    // Particles 1 and 2 fail if asked.
    let best = model.best_criteria().unwrap();
    assert_eq!(best.point, vec![0.75]);
    assert_eq!(best.name, "stub0");
}

#[test]
fn test_best_criteria_without_proposals_fails() {
    let mut model = tagged_posterior(&[1.0, 2.0], StubFactory::default()).unwrap();
    model.set_first_criterion();
    assert!(matches!(
        model.best_criteria(),
        Err(Error::MissingProposals { .. })
    ));
}
