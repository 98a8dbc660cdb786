use std::sync::atomic::Ordering;

use mcmc_posterior::sampler::FixedSampler;
use mcmc_posterior::{Error, KindFactory, McmcPosterior};

use crate::stubs::{
    ListSampler, POISON_TAG, SequenceSampler, StubFactory, config, tagged_posterior,
};

#[test]
fn test_particles_are_index_aligned() {
    for n in 1..=6 {
        let tags: Vec<f64> = (0..n).map(|i| f64::from(i) + 1.0).collect();
        let model = tagged_posterior(&tags, StubFactory::default()).unwrap();

        assert_eq!(model.particle_count(), tags.len());
        assert_eq!(model.ensemble().particles().len(), tags.len());
        for (i, particle) in model.ensemble().particles().enumerate() {
            assert_eq!(particle.hyperparameters(), &[tags[i]]);
            assert_eq!(particle.surrogate().hyperparameters(), &[tags[i]]);
            assert_eq!(particle.criteria().name(), format!("stub{i}"));
        }
    }
}

#[test]
fn test_zero_particles_is_configuration_error() {
    let factory = StubFactory::default();
    let live = factory.live.clone();
    let mut rng = fastrand::Rng::with_seed(1);

    let result = McmcPosterior::with_components(
        1,
        config(0),
        Box::new(FixedSampler),
        Box::new(factory),
        &mut rng,
    );
    assert!(matches!(result, Err(Error::Configuration(_))));
    assert_eq!(live.load(Ordering::SeqCst), 0);
}

#[test]
fn test_zero_dimension_is_configuration_error() {
    let mut rng = fastrand::Rng::with_seed(1);
    let result = McmcPosterior::new(0, config(2), &mut rng);
    assert!(matches!(result, Err(Error::Configuration(_))));
}

#[test]
fn test_short_sample_list_leaves_nothing_allocated() {
    let factory = StubFactory::default();
    let live = factory.live.clone();
    let mut rng = fastrand::Rng::with_seed(1);

    let result = McmcPosterior::with_components(
        1,
        config(3),
        Box::new(ListSampler(vec![vec![1.0], vec![2.0]])),
        Box::new(factory),
        &mut rng,
    );
    assert!(matches!(result, Err(Error::Sampling(_))));
    assert_eq!(live.load(Ordering::SeqCst), 0);
}

#[test]
fn test_wrong_arity_is_sampling_error() {
    let mut rng = fastrand::Rng::with_seed(1);
    let result = McmcPosterior::with_components(
        1,
        config(2),
        Box::new(ListSampler(vec![vec![1.0], vec![2.0, 3.0]])),
        Box::new(StubFactory::default()),
        &mut rng,
    );
    assert!(matches!(result, Err(Error::Sampling(_))));
}

#[test]
fn test_non_finite_sample_is_sampling_error() {
    let result = tagged_posterior(&[1.0, f64::NAN], StubFactory::default());
    assert!(matches!(result, Err(Error::Sampling(_))));
}

#[test]
fn test_failed_configure_drops_built_particles() {
    let factory = StubFactory::default();
    let live = factory.live.clone();

    // The third surrogate rejects its negative tag.
    let result = tagged_posterior(&[1.0, 2.0, -3.0], factory);
    assert!(matches!(result, Err(Error::Configuration(_))));
    assert_eq!(live.load(Ordering::SeqCst), 0);
}

#[test]
fn test_live_count_matches_particles() {
    let factory = StubFactory::default();
    let live = factory.live.clone();

    let model = tagged_posterior(&[1.0, 2.0, 3.0, 4.0], factory).unwrap();
    assert_eq!(live.load(Ordering::SeqCst), 4);
    drop(model);
    assert_eq!(live.load(Ordering::SeqCst), 0);
}

#[test]
fn test_failed_refresh_keeps_previous_ensemble() {
    let factory = StubFactory::default();
    let live = factory.live.clone();
    let sampler = SequenceSampler::new(vec![
        vec![vec![1.0], vec![2.0], vec![3.0]],
        vec![vec![4.0], vec![5.0], vec![6.0]],
        vec![vec![7.0]],
    ]);
    let mut rng = fastrand::Rng::with_seed(2);
    let mut model = McmcPosterior::with_components(
        1,
        config(3),
        Box::new(sampler),
        Box::new(factory),
        &mut rng,
    )
    .unwrap();
    model.add_sample(&[0.5], 1.0).unwrap();

    model.update_hyperparameters(&mut rng).unwrap();
    assert_eq!(tags(&model), vec![4.0, 5.0, 6.0]);
    assert_eq!(live.load(Ordering::SeqCst), 3);

    let result = model.update_hyperparameters(&mut rng);
    assert!(matches!(result, Err(Error::Sampling(_))));
    assert_eq!(tags(&model), vec![4.0, 5.0, 6.0]);
    assert_eq!(live.load(Ordering::SeqCst), 3);
}

#[test]
fn test_refresh_fit_failure_keeps_previous_ensemble() {
    let sampler = SequenceSampler::new(vec![
        vec![vec![1.0], vec![2.0]],
        vec![vec![3.0], vec![POISON_TAG]],
    ]);
    let mut rng = fastrand::Rng::with_seed(2);
    let mut model = McmcPosterior::with_components(
        1,
        config(2),
        Box::new(sampler),
        Box::new(StubFactory::default()),
        &mut rng,
    )
    .unwrap();
    model.add_sample(&[0.5], 1.0).unwrap();

    let result = model.update_hyperparameters(&mut rng);
    assert!(matches!(result, Err(Error::ModelFit(_))));
    assert_eq!(tags(&model), vec![1.0, 2.0]);
}

#[test]
fn test_fixed_posterior_uses_gp_at_prior_mode() {
    let mut rng = fastrand::Rng::with_seed(3);
    let model = McmcPosterior::fixed(3, config(5), &mut rng).unwrap();
    assert_eq!(model.particle_count(), 1);
    let mode = model.config().initial_hyperparameters(3);
    assert_eq!(model.ensemble().canonical().hyperparameters(), mode.as_slice());
    assert_eq!(model.ensemble().canonical().surrogate().name(), "gp_matern52");
}

#[test]
fn test_default_components_draw_from_prior() {
    let mut rng = fastrand::Rng::with_seed(4);
    let model = McmcPosterior::with_components(
        2,
        config(6),
        Box::new(mcmc_posterior::sampler::SliceSampler::builder().burn_in(5).build()),
        Box::new(KindFactory),
        &mut rng,
    )
    .unwrap();
    assert_eq!(model.particle_count(), 6);
    for particle in model.ensemble().particles() {
        assert_eq!(particle.hyperparameters().len(), 2);
        assert!(particle.hyperparameters().iter().all(|v| v.is_finite()));
    }
}

fn tags(model: &McmcPosterior) -> Vec<f64> {
    model
        .ensemble()
        .particles()
        .map(|p| p.hyperparameters()[0])
        .collect()
}
