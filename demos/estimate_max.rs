//! Estimate the upper bound of a private column of incomes, 20 rounds of epsilon 0.05.
//!
//! Run with `RUST_LOG=debug` to see each round.

use colored::Colorize;
use dp_bound_search::{
    estimator::Error,
    oracle::{DatasetOracle, TimeoutOracle},
    setup, BudgetConfig, DomainBounds, Estimator, Ready, With,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::time::Duration;

fn incomes(size: usize) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(1234);
    (0..size)
        .map(|_| (rng.gen_range(8.0..12.0_f64)).exp().round())
        .collect()
}

fn main() {
    setup::init();
    let private = DatasetOracle::new(incomes(5000), 0.05).unwrap();
    let max = private.exact_max();
    let mut oracle = TimeoutOracle::new(private, Duration::from_secs(30));
    let estimator = Estimator::builder()
        .with(DomainBounds::new(0., 2f64.powi(20)))
        .with(BudgetConfig::new(20, 0.05, 0.02))
        .build();
    println!(
        "Planned spend: {}",
        format!("{}", estimator.config().planned_spend().epsilon()).yellow()
    );
    match estimator.run(&mut oracle) {
        Ok(estimate) => {
            for round in estimate.trace() {
                println!("{}", format!("{round}").blue());
            }
            println!("Estimate: {}", format!("{estimate}").green());
            println!("Exact max (hidden in practice): {}", format!("{max}").red());
        }
        Err(err @ Error::OracleUnavailable { .. }) => {
            println!("{}", format!("{err}").red());
            println!("Spent anyway: {}", err.spent());
        }
        Err(err) => println!("{}", format!("{err}").red()),
    }
}
