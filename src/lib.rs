//! # Bounded-budget estimation of private bounds
//!
//! Differentially private query services rarely let analysts see raw values, yet many
//! mechanisms (clipping, histograms, ranges) need prior bounds on the data.
//! This crate estimates such a bound, e.g. the maximum of a column, with a binary search
//! driven by noisy comparison queries.
//!
//! ### Fixed budget
//! The number of queries is committed before the first one and never depends on the
//! answers, so the total privacy spend is `total_rounds * per_round_epsilon`, known upfront.
//!
//! ### Oracles
//! The noisy comparison is provided by the query service through the [oracle::NoisyCompare]
//! trait. [oracle::TimeoutOracle] bounds the duration of each query and
//! [oracle::DatasetOracle] simulates a service over an in-memory column.
//!
//! ```
//! use dp_bound_search::{estimate_max, BudgetConfig, DomainBounds};
//!
//! let mut oracle = |t: f64| -> dp_bound_search::oracle::Result<f64> {
//!     Ok(if t < 1000. { 1. } else { 0. })
//! };
//! let estimate = estimate_max(
//!     DomainBounds::new(-4096., 4096.),
//!     &mut oracle,
//!     BudgetConfig::from_rounds(20),
//! )
//! .unwrap();
//! assert!((estimate.value() - 1000.).abs() <= estimate.precision().unwrap());
//! ```
//!

pub mod builder;
pub mod cancellation;
pub mod differential_privacy;
pub mod estimator;
pub mod oracle;
pub mod setup;

pub use builder::{Ready, With};
pub use cancellation::Cancellation;
pub use differential_privacy::DpEvent;
pub use estimator::{
    estimate_max, BudgetConfig, DomainBounds, Estimate, Estimator, EstimatorBuilder, Round,
    SearchConfig, SearchState, Seed,
};
pub use oracle::NoisyCompare;
