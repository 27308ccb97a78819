//! A local stand-in for a private dataframe column
//!
//! Answers the mean of the indicator `value > threshold` with Laplace noise.
//! Each answer is recorded in a ledger, the way a query service would bill it.

use super::{Error, NoisyCompare, Result};
use crate::differential_privacy::{mechanisms, DpEvent};
use rand::{rngs::StdRng, SeedableRng};
use std::mem;

const DEFAULT_SEED: u64 = 1234;

pub struct DatasetOracle {
    values: Vec<f64>,
    epsilon: f64,
    rng: StdRng,
    ledger: DpEvent,
}

impl DatasetOracle {
    /// An oracle answering `epsilon`-DP fractions over `values`
    pub fn new(values: Vec<f64>, epsilon: f64) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::unavailable("the private column is empty"));
        }
        if !(epsilon > 0.) {
            return Err(Error::unavailable(format!(
                "epsilon must be positive, got {epsilon}"
            )));
        }
        Ok(DatasetOracle {
            values,
            epsilon,
            rng: StdRng::seed_from_u64(DEFAULT_SEED),
            ledger: DpEvent::no_op(),
        })
    }

    /// An oracle answering exact fractions
    pub fn noiseless(values: Vec<f64>) -> Result<Self> {
        DatasetOracle::new(values, f64::INFINITY)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Everything spent so far
    pub fn ledger(&self) -> &DpEvent {
        &self.ledger
    }

    /// The value the estimator is after, only readable in tests and demos
    pub fn exact_max(&self) -> f64 {
        self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    fn exact_fraction_above(&self, threshold: f64) -> f64 {
        let above = self.values.iter().filter(|&&v| v > threshold).count();
        above as f64 / self.values.len() as f64
    }
}

impl NoisyCompare for DatasetOracle {
    fn noisy_compare(&mut self, threshold: f64) -> Result<f64> {
        // The sensitivity of a mean of indicators is 1/n
        let sensitivity = 1. / self.values.len() as f64;
        let scale = mechanisms::laplace_scale(self.epsilon, sensitivity);
        let noise = mechanisms::laplace_noise(&mut self.rng, scale);
        self.ledger = mem::replace(&mut self.ledger, DpEvent::NoOp)
            .compose(DpEvent::epsilon_delta(self.epsilon, 0.));
        // The release is clipped to [0, 1], which is post-processing
        Ok((self.exact_fraction_above(threshold) + noise).clamp(0., 1.))
    }
}
