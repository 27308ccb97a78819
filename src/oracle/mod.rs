//! # Noisy comparison oracles
//!
//! An oracle answers, for a threshold `t`, a noisy estimate of the fraction of the
//! private values strictly greater than `t`. Every call is billed by the query
//! service holding the data, so wrappers here never retry.
//!

pub mod dataset;
pub mod timeout;

use std::{error, fmt, result};

pub use dataset::DatasetOracle;
pub use timeout::TimeoutOracle;

// Error management
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The query service could not be reached or refused the query
    Unavailable(String),
    /// The query did not complete in time
    Timeout(String),
    /// The answer is not a fraction
    Malformed(String),
}

impl Error {
    pub fn unavailable(desc: impl fmt::Display) -> Error {
        Error::Unavailable(format!("Oracle unavailable: {}", desc))
    }
    pub fn timeout(desc: impl fmt::Display) -> Error {
        Error::Timeout(format!("Oracle timed out: {}", desc))
    }
    pub fn malformed(answer: f64) -> Error {
        Error::Malformed(format!("Oracle answered {answer}, expected a value in [0, 1]"))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Unavailable(desc) | Error::Timeout(desc) | Error::Malformed(desc) => {
                write!(f, "{}", desc)
            }
        }
    }
}

impl error::Error for Error {}

pub type Result<T> = result::Result<T, Error>;

/// The external noisy comparison capability
pub trait NoisyCompare {
    /// A noisy estimate of the fraction of values strictly above `threshold`
    fn noisy_compare(&mut self, threshold: f64) -> Result<f64>;
}

impl<F: FnMut(f64) -> Result<f64>> NoisyCompare for F {
    fn noisy_compare(&mut self, threshold: f64) -> Result<f64> {
        self(threshold)
    }
}

/// Check an answer really is a fraction
pub fn check_answer(answer: f64) -> Result<f64> {
    if (0. ..=1.).contains(&answer) {
        Ok(answer)
    } else {
        Err(Error::malformed(answer))
    }
}

/// An oracle wrapper auditing the number of calls
#[derive(Clone, Debug)]
pub struct Counting<O> {
    oracle: O,
    calls: usize,
    thresholds: Vec<f64>,
}

impl<O> Counting<O> {
    pub fn new(oracle: O) -> Self {
        Counting {
            oracle,
            calls: 0,
            thresholds: Vec::new(),
        }
    }

    /// Number of calls attempted, failed ones included
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// The thresholds queried, in order
    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    pub fn into_inner(self) -> O {
        self.oracle
    }
}

impl<O: NoisyCompare> NoisyCompare for Counting<O> {
    fn noisy_compare(&mut self, threshold: f64) -> Result<f64> {
        self.calls += 1;
        self.thresholds.push(threshold);
        self.oracle.noisy_compare(threshold)
    }
}
