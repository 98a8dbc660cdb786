use mcmc_posterior::Error;

use crate::stubs::{Event, POISON_TAG, StubFactory, tagged_posterior};

#[test]
fn test_three_particles_average_to_two() {
    let model = tagged_posterior(&[1.0, 2.0, 3.0], StubFactory::default()).unwrap();
    let value = model.evaluate_criteria(&[0.5]).unwrap();
    assert!((value - 2.0).abs() < f64::EPSILON);
}

#[test]
fn test_single_particle_is_exact() {
    let tag = 0.1 + 0.2;
    let model = tagged_posterior(&[tag], StubFactory::default()).unwrap();
    assert_eq!(model.evaluate_criteria(&[0.0]).unwrap().to_bits(), tag.to_bits());
}

#[test]
fn test_average_matches_per_particle_mean() {
    let tags = [0.25, 7.5, 3.125, 11.0, 0.0625];
    let model = tagged_posterior(&tags, StubFactory::default()).unwrap();

    for query in [[0.0], [0.3], [1.0]] {
        let own: Vec<f64> = model
            .ensemble()
            .particles()
            .map(|p| p.evaluate(model.dataset(), &query).unwrap())
            .collect();
        let expected = own.iter().sum::<f64>() / own.len() as f64;
        let got = model.evaluate_criteria(&query).unwrap();
        assert!((got - expected).abs() < 1e-12);
    }
}

#[test]
fn test_average_is_summed_in_particle_order() {
    // Cancellation makes the result depend on summation order.
    let tags = [1e16, 1.0, 3.0, 0.5, 2e16, 7.0, 1.0, 0.25];
    let model = tagged_posterior(&tags, StubFactory::default()).unwrap();

    let mut sum = 0.0;
    for particle in model.ensemble().particles() {
        sum += particle.evaluate(model.dataset(), &[0.5]).unwrap();
    }
    let expected = sum / tags.len() as f64;

    for _ in 0..20 {
        let got = model.evaluate_criteria(&[0.5]).unwrap();
        assert_eq!(got.to_bits(), expected.to_bits());
    }
}

#[test]
fn test_update_criteria_reaches_every_particle_once() {
    let factory = StubFactory::default();
    let log = factory.log.clone();
    let mut model = tagged_posterior(&[1.0, 2.0, 3.0, 4.0], factory).unwrap();

    model.update_criteria(&[0.42]);

    let events = log.lock().clone();
    let mut observed: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            Event::Observe(i, q) if q == &[0.42] => Some(*i),
            _ => None,
        })
        .collect();
    observed.sort_unstable();
    assert_eq!(observed, vec![0, 1, 2, 3]);
}

#[test]
fn test_fit_and_update_reach_every_surrogate() {
    let factory = StubFactory::default();
    let log = factory.log.clone();
    let mut model = tagged_posterior(&[1.0, 2.0, 3.0], factory).unwrap();
    model.add_sample(&[0.5], 1.0).unwrap();

    model.fit_surrogate_model().unwrap();
    model.add_sample(&[0.7], 0.5).unwrap();
    model.update_surrogate_model().unwrap();

    let events = log.lock().clone();
    let fits = events.iter().filter(|e| matches!(e, Event::Fit(_))).count();
    let updates = events.iter().filter(|e| matches!(e, Event::Update(_))).count();
    assert_eq!(fits, 3);
    assert_eq!(updates, 3);
}

#[test]
fn test_fit_failure_is_propagated() {
    let factory = StubFactory::default();
    let log = factory.log.clone();
    let mut model = tagged_posterior(&[1.0, POISON_TAG, 3.0], factory).unwrap();

    assert!(matches!(model.fit_surrogate_model(), Err(Error::ModelFit(_))));
    assert!(matches!(model.update_surrogate_model(), Err(Error::ModelFit(_))));

    // Sequential dispatch stops at the failing particle.
    #[cfg(not(feature = "parallel"))]
    assert!(!log.lock().contains(&Event::Fit(3.0)));
    #[cfg(feature = "parallel")]
    drop(log);
}

#[test]
fn test_update_after_set_samples_is_a_full_fit() {
    let factory = StubFactory::default();
    let log = factory.log.clone();
    let mut model = tagged_posterior(&[1.0, 2.0, 3.0], factory).unwrap();
    model.set_samples(&[vec![0.1], vec![0.2]], &[5.0, 5.0]).unwrap();
    model.fit_surrogate_model().unwrap();
    log.lock().clear();

    model
        .set_samples(&[vec![0.6], vec![0.7], vec![0.8]], &[-1.0, 0.0, 1.0])
        .unwrap();
    model.update_surrogate_model().unwrap();
    {
        let events = log.lock();
        assert_eq!(events.iter().filter(|e| matches!(e, Event::Fit(_))).count(), 3);
        assert!(!events.iter().any(|e| matches!(e, Event::Update(_))));
    }

    // Back to incremental updates once refitted.
    log.lock().clear();
    model.add_sample(&[0.9], 2.0).unwrap();
    model.update_surrogate_model().unwrap();
    let events = log.lock();
    assert_eq!(events.iter().filter(|e| matches!(e, Event::Update(_))).count(), 3);
    assert!(!events.iter().any(|e| matches!(e, Event::Fit(_))));
}

#[test]
fn test_failed_refit_after_set_samples_is_retried() {
    let factory = StubFactory::default();
    let log = factory.log.clone();
    let mut model = tagged_posterior(&[1.0, POISON_TAG], factory).unwrap();

    model.set_samples(&[vec![0.1]], &[1.0]).unwrap();
    assert!(model.update_surrogate_model().is_err());
    log.lock().clear();
    assert!(model.update_surrogate_model().is_err());
    assert!(log.lock().iter().any(|e| matches!(e, Event::Fit(_))));
}
