//! Bayesian optimization loop over an MCMC posterior with a Hedge portfolio.
//!
//! Each round rotates through the portfolio, maximizes every criterion over
//! random candidates, lets Hedge pick a winner, and evaluates it. The
//! hyperparameter particles are redrawn every few rounds.
//!
//! Run with: `cargo run --example mcmc_loop`

use mcmc_posterior::prelude::*;

/// Branin function rescaled to the unit square. Global minimum ≈ 0.397887.
fn branin(x: &[f64]) -> f64 {
    let x1 = 15.0 * x[0] - 5.0;
    let x2 = 15.0 * x[1];
    let a = x2 - 5.1 / (4.0 * core::f64::consts::PI.powi(2)) * x1 * x1
        + 5.0 / core::f64::consts::PI * x1
        - 6.0;
    a * a + 10.0 * (1.0 - 1.0 / (8.0 * core::f64::consts::PI)) * x1.cos() + 10.0
}

fn argmin_criteria(
    model: &McmcPosterior,
    rng: &mut fastrand::Rng,
) -> mcmc_posterior::Result<Vec<f64>> {
    let mut best = vec![rng.f64(), rng.f64()];
    let mut best_value = model.evaluate_criteria(&best)?;
    for _ in 0..500 {
        let candidate = vec![rng.f64(), rng.f64()];
        let value = model.evaluate_criteria(&candidate)?;
        if value < best_value {
            best = candidate;
            best_value = value;
        }
    }
    Ok(best)
}

fn main() -> mcmc_posterior::Result<()> {
    let mut rng = fastrand::Rng::with_seed(2024);
    let config = PosteriorConfig::builder()
        .particle_count(5)
        .noise_variance(1e-4)
        .criteria("hedge(ei,lcb(2.0),poi,alcb)".parse()?)
        .build()?;
    let mut model = McmcPosterior::new(2, config, &mut rng)?;

    for _ in 0..8 {
        let x = vec![rng.f64(), rng.f64()];
        model.add_sample(&x, branin(&x))?;
    }
    model.update_hyperparameters(&mut rng)?;

    for round in 1..=30 {
        model.set_first_criterion();
        loop {
            let proposal = argmin_criteria(&model, &mut rng)?;
            if model.set_next_criterion(&proposal)? {
                break;
            }
        }
        let winner = model.best_criteria()?;
        let y = branin(&winner.point);

        model.update_criteria(&winner.point);
        model.add_sample(&winner.point, y)?;
        if round % 10 == 0 {
            model.update_hyperparameters(&mut rng)?;
        } else {
            model.update_surrogate_model()?;
        }

        println!(
            "Round {round:>2}: {:<4} proposed ({:.3}, {:.3}) -> {y:.4}",
            winner.name, winner.point[0], winner.point[1],
        );
    }

    if let Some((x, y)) = model.dataset().best() {
        println!("Best: f({:.4}, {:.4}) = {y:.6}", x[0], x[1]);
    }
    Ok(())
}
