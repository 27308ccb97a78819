//! # Bounded-budget binary estimation
//!
//! Estimates an unknown scalar of a private dataset, typically its maximum, using only
//! noisy comparisons: for a threshold `t`, the oracle answers a noisy fraction of values
//! strictly above `t`. The estimate moves up when that fraction exceeds `noise_threshold`
//! and down otherwise, by a step halved at each round.
//!
//! The number of rounds, hence the privacy spend, is fixed before the first query.
//! There is no early stopping and no retry: the oracle is called exactly `total_rounds`
//! times on success, and the run aborts on the first failing call.
//!
//! With a non-zero `noise_threshold` the search converges towards the value above which
//! a fraction `noise_threshold` of the data lies, which is the maximum only for
//! small datasets or thresholds.
//!

pub mod builder;

use crate::{
    builder::{Ready, With},
    cancellation::Cancellation,
    differential_privacy::DpEvent,
    oracle::{self, NoisyCompare},
};
use serde::{Deserialize, Serialize};
use std::{error, fmt, result};

pub use builder::{EstimatorBuilder, SearchConfig};

pub const DEFAULT_PER_ROUND_EPSILON: f64 = 0.02;
pub const DEFAULT_NOISE_THRESHOLD: f64 = 0.02;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Bad bounds or round count, detected before any query
    InvalidConfiguration(String),
    /// The query of round `round` (0-based) failed, `rounds_completed` answers were consumed
    OracleUnavailable {
        round: usize,
        rounds_completed: usize,
        spent: DpEvent,
        source: oracle::Error,
    },
    /// The run was cancelled before round `rounds_completed`
    Cancelled {
        rounds_completed: usize,
        spent: DpEvent,
    },
}

impl Error {
    pub fn invalid_configuration(desc: impl fmt::Display) -> Error {
        Error::InvalidConfiguration(format!("{}", desc))
    }

    /// The failing query was issued, so it is accounted as spent
    pub fn oracle_unavailable(round: usize, per_round_epsilon: f64, source: oracle::Error) -> Error {
        Error::OracleUnavailable {
            round,
            rounds_completed: round,
            spent: DpEvent::repeated(per_round_epsilon, round + 1),
            source,
        }
    }

    pub fn cancelled(rounds_completed: usize, per_round_epsilon: f64) -> Error {
        Error::Cancelled {
            rounds_completed,
            spent: DpEvent::repeated(per_round_epsilon, rounds_completed),
        }
    }

    pub fn rounds_completed(&self) -> usize {
        match self {
            Error::InvalidConfiguration(_) => 0,
            Error::OracleUnavailable {
                rounds_completed, ..
            }
            | Error::Cancelled {
                rounds_completed, ..
            } => *rounds_completed,
        }
    }

    /// What the run spent before failing, irreversibly
    pub fn spent(&self) -> DpEvent {
        match self {
            Error::InvalidConfiguration(_) => DpEvent::no_op(),
            Error::OracleUnavailable { spent, .. } | Error::Cancelled { spent, .. } => {
                spent.clone()
            }
        }
    }

    pub fn epsilon_spent(&self) -> f64 {
        self.spent().epsilon()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfiguration(desc) => write!(f, "InvalidConfiguration: {}", desc),
            Error::OracleUnavailable {
                round,
                rounds_completed,
                spent,
                source,
            } => write!(
                f,
                "OracleUnavailable at round {round} ({rounds_completed} rounds completed, epsilon spent {}): {source}",
                spent.epsilon()
            ),
            Error::Cancelled {
                rounds_completed,
                spent,
            } => write!(
                f,
                "Cancelled after {rounds_completed} rounds, epsilon spent {}",
                spent.epsilon()
            ),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::OracleUnavailable { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = result::Result<T, Error>;

/// The initial search interval
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DomainBounds {
    lower: f64,
    upper: f64,
}

impl DomainBounds {
    pub fn new(lower: f64, upper: f64) -> Self {
        DomainBounds { lower, upper }
    }

    /// The domain `[-2^bits, 2^bits]`
    pub fn symmetric_power_of_two(bits: i32) -> Self {
        let bound = 2f64.powi(bits);
        DomainBounds::new(-bound, bound)
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn midpoint(&self) -> f64 {
        self.lower + self.width() / 2.
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.lower.is_finite() && self.upper.is_finite()) {
            Err(Error::invalid_configuration(format!(
                "bounds must be finite, got [{}, {}]",
                self.lower, self.upper
            )))
        } else if self.lower >= self.upper {
            Err(Error::invalid_configuration(format!(
                "lower bound {} must be strictly below upper bound {}",
                self.lower, self.upper
            )))
        } else if !self.width().is_finite() {
            Err(Error::invalid_configuration(format!(
                "the width of [{}, {}] overflows",
                self.lower, self.upper
            )))
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for DomainBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lower, self.upper)
    }
}

fn default_per_round_epsilon() -> f64 {
    DEFAULT_PER_ROUND_EPSILON
}

fn default_noise_threshold() -> f64 {
    DEFAULT_NOISE_THRESHOLD
}

/// The budget of a run, committed before the first query
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Signed, so that a negative count is rejected by validation rather than by parsing
    total_rounds: i64,
    #[serde(default = "default_per_round_epsilon")]
    per_round_epsilon: f64,
    #[serde(default = "default_noise_threshold")]
    noise_threshold: f64,
}

impl BudgetConfig {
    pub fn new(total_rounds: i64, per_round_epsilon: f64, noise_threshold: f64) -> Self {
        BudgetConfig {
            total_rounds,
            per_round_epsilon,
            noise_threshold,
        }
    }

    pub fn from_rounds(total_rounds: i64) -> Self {
        BudgetConfig::new(
            total_rounds,
            DEFAULT_PER_ROUND_EPSILON,
            DEFAULT_NOISE_THRESHOLD,
        )
    }

    pub fn total_rounds(&self) -> i64 {
        self.total_rounds
    }

    pub fn per_round_epsilon(&self) -> f64 {
        self.per_round_epsilon
    }

    pub fn noise_threshold(&self) -> f64 {
        self.noise_threshold
    }

    /// `total_rounds * per_round_epsilon`
    pub fn total_epsilon(&self) -> f64 {
        self.total_rounds.max(0) as f64 * self.per_round_epsilon
    }

    /// Everything a complete run spends
    pub fn planned_spend(&self) -> DpEvent {
        DpEvent::repeated(
            self.per_round_epsilon,
            usize::try_from(self.total_rounds).unwrap_or(0),
        )
    }

    /// The bound `(upper - lower) / 2^(k+1)` on the distance between a noiseless
    /// estimate seeded at the midpoint and the target, `None` for an invalid budget
    pub fn precision(&self, domain: &DomainBounds) -> Option<f64> {
        let rounds = self.validate(domain).ok()?;
        Some(domain.width() / 2f64.powf(rounds as f64 + 1.))
    }

    /// Validate the budget against a domain and return the number of rounds
    pub fn validate(&self, domain: &DomainBounds) -> Result<usize> {
        domain.validate()?;
        if self.total_rounds < 1 {
            return Err(Error::invalid_configuration(format!(
                "total_rounds must be at least 1, got {}",
                self.total_rounds
            )));
        }
        if !(self.per_round_epsilon > 0. && self.per_round_epsilon.is_finite()) {
            return Err(Error::invalid_configuration(format!(
                "per_round_epsilon must be positive and finite, got {}",
                self.per_round_epsilon
            )));
        }
        if !(0. ..=1.).contains(&self.noise_threshold) {
            return Err(Error::invalid_configuration(format!(
                "noise_threshold must lie in [0, 1], got {}",
                self.noise_threshold
            )));
        }
        // The step of the last round must not vanish
        let last_round = i32::try_from(self.total_rounds - 1).map_err(|_| {
            Error::invalid_configuration(format!("{} rounds is too many", self.total_rounds))
        })?;
        if SearchState::step_at(domain, last_round) <= 0. {
            return Err(Error::invalid_configuration(format!(
                "{} rounds exhaust the floating point precision of {domain}",
                self.total_rounds
            )));
        }
        usize::try_from(self.total_rounds).map_err(Error::invalid_configuration)
    }
}

/// Where the first query is made
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seed {
    /// `(lower + upper) / 2`, the only seed for which the precision bound holds
    #[default]
    Midpoint,
    /// `0`
    Origin,
    Value(f64),
}

impl Seed {
    pub fn value(&self, domain: &DomainBounds) -> f64 {
        match self {
            Seed::Midpoint => domain.midpoint(),
            Seed::Origin => 0.,
            Seed::Value(value) => *value,
        }
    }

    /// A seed outside the domain could never reach it, the steps sum to half its width
    pub fn validate(&self, domain: &DomainBounds) -> Result<()> {
        let value = self.value(domain);
        if !value.is_finite() {
            Err(Error::invalid_configuration(format!(
                "the seed must be finite, got {value}"
            )))
        } else if value < domain.lower() || value > domain.upper() {
            Err(Error::invalid_configuration(format!(
                "the seed {value} lies outside {domain}"
            )))
        } else {
            Ok(())
        }
    }
}

/// The state of a run, owned by the run
#[derive(Clone, Debug, PartialEq)]
pub struct SearchState {
    current_estimate: f64,
    step_size: f64,
    round_index: usize,
    rounds_remaining: usize,
}

impl SearchState {
    pub fn new(domain: &DomainBounds, seed: Seed, rounds: usize) -> Self {
        SearchState {
            current_estimate: seed.value(domain),
            step_size: domain.width() / 4.,
            round_index: 0,
            rounds_remaining: rounds,
        }
    }

    /// The step applied at round `round`: `(upper - lower) / 4 / 2^round`
    pub fn step_at(domain: &DomainBounds, round: i32) -> f64 {
        domain.width() / 4. / 2f64.powi(round)
    }

    pub fn current_estimate(&self) -> f64 {
        self.current_estimate
    }

    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    pub fn round_index(&self) -> usize {
        self.round_index
    }

    pub fn rounds_remaining(&self) -> usize {
        self.rounds_remaining
    }

    pub fn is_terminal(&self) -> bool {
        self.rounds_remaining == 0
    }

    /// Consume the answer to a query at `current_estimate`
    fn advance(&mut self, answer: f64, noise_threshold: f64) -> Round {
        let round = Round {
            index: self.round_index,
            threshold: self.current_estimate,
            answer,
            moved_up: answer > noise_threshold,
            step: self.step_size,
        };
        if round.moved_up {
            self.current_estimate += self.step_size;
        } else {
            self.current_estimate -= self.step_size;
        }
        self.step_size /= 2.;
        self.round_index += 1;
        self.rounds_remaining -= 1;
        round
    }
}

/// A completed round
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub index: usize,
    pub threshold: f64,
    pub answer: f64,
    pub moved_up: bool,
    pub step: f64,
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "round {}: P(x > {}) ~ {}, {} by {}",
            self.index,
            self.threshold,
            self.answer,
            if self.moved_up { "up" } else { "down" },
            self.step
        )
    }
}

/// The result of a complete run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    value: f64,
    rounds_completed: usize,
    spent: DpEvent,
    precision: Option<f64>,
    trace: Vec<Round>,
}

impl Estimate {
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn rounds_completed(&self) -> usize {
        self.rounds_completed
    }

    pub fn spent(&self) -> &DpEvent {
        &self.spent
    }

    pub fn epsilon_spent(&self) -> f64 {
        self.spent.epsilon()
    }

    /// The guaranteed precision of a noiseless run, only known for a midpoint seed
    pub fn precision(&self) -> Option<f64> {
        self.precision
    }

    pub fn trace(&self) -> &[Round] {
        &self.trace
    }
}

impl fmt::Display for Estimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)?;
        if let Some(precision) = self.precision {
            write!(f, " (precision {precision})")?;
        }
        write!(
            f,
            " after {} rounds, epsilon spent {}",
            self.rounds_completed,
            self.epsilon_spent()
        )
    }
}

/// A validated estimation run, ready to query an oracle
#[derive(Clone, Debug)]
pub struct Estimator {
    domain: DomainBounds,
    config: BudgetConfig,
    seed: Seed,
    cancellation: Option<Cancellation>,
    rounds: usize,
}

impl Estimator {
    /// An estimator seeded at the midpoint of the domain
    pub fn new(domain: DomainBounds, config: BudgetConfig) -> Result<Self> {
        EstimatorBuilder::default()
            .with(domain)
            .with(config)
            .try_build()
    }

    pub fn builder() -> EstimatorBuilder {
        EstimatorBuilder::default()
    }

    pub fn domain(&self) -> &DomainBounds {
        &self.domain
    }

    pub fn config(&self) -> &BudgetConfig {
        &self.config
    }

    pub fn seed(&self) -> Seed {
        self.seed
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Run all the rounds against `oracle`
    pub fn run<O: NoisyCompare + ?Sized>(&self, oracle: &mut O) -> Result<Estimate> {
        let epsilon = self.config.per_round_epsilon;
        let mut state = SearchState::new(&self.domain, self.seed, self.rounds);
        let mut trace = Vec::with_capacity(self.rounds);
        log::debug!(
            "Estimating over {} with {} rounds of epsilon {}",
            self.domain,
            self.rounds,
            epsilon
        );
        while !state.is_terminal() {
            let round = state.round_index();
            if self
                .cancellation
                .as_ref()
                .is_some_and(Cancellation::is_cancelled)
            {
                log::warn!("Estimation cancelled after {round} rounds");
                return Err(Error::cancelled(round, epsilon));
            }
            let answer = oracle
                .noisy_compare(state.current_estimate())
                .and_then(oracle::check_answer)
                .map_err(|source| {
                    log::warn!("Round {round} failed, the run is aborted: {source}");
                    Error::oracle_unavailable(round, epsilon, source)
                })?;
            let record = state.advance(answer, self.config.noise_threshold);
            log::debug!("{record}");
            trace.push(record);
        }
        let estimate = Estimate {
            value: state.current_estimate(),
            rounds_completed: trace.len(),
            spent: DpEvent::repeated(epsilon, trace.len()),
            precision: match self.seed {
                Seed::Midpoint => self.config.precision(&self.domain),
                Seed::Origin | Seed::Value(_) => None,
            },
            trace,
        };
        log::info!("Estimated {estimate}");
        Ok(estimate)
    }
}

/// Estimate an unknown maximum in `domain`, seeded at the midpoint
pub fn estimate_max<O: NoisyCompare + ?Sized>(
    domain: DomainBounds,
    oracle: &mut O,
    config: BudgetConfig,
) -> Result<Estimate> {
    Estimator::new(domain, config)?.run(oracle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{Counting, DatasetOracle};

    const TRUE_MAX: f64 = -151861469.;

    fn step_oracle(max: f64) -> impl FnMut(f64) -> oracle::Result<f64> {
        move |t| Ok(if t < max { 1. } else { 0. })
    }

    #[test]
    fn test_exact_number_of_calls() {
        let domain = DomainBounds::new(-10., 250.);
        for k in 1..=40 {
            let mut oracle = Counting::new(step_oracle(17.));
            let estimate = estimate_max(domain, &mut oracle, BudgetConfig::from_rounds(k)).unwrap();
            assert_eq!(oracle.calls(), k as usize);
            assert_eq!(estimate.rounds_completed(), k as usize);
            assert_eq!(estimate.spent().len(), k as usize);
            assert_eq!(estimate.trace().len(), k as usize);
        }
    }

    #[test]
    fn test_calls_are_not_adaptive_in_number() {
        // Whatever the answers, the number of queries is the same
        let domain = DomainBounds::new(0., 1.);
        let answers: Vec<Box<dyn FnMut(f64) -> oracle::Result<f64>>> = vec![
            Box::new(|_: f64| -> oracle::Result<f64> { Ok(0.) }),
            Box::new(|_: f64| -> oracle::Result<f64> { Ok(1.) }),
            Box::new(|t: f64| -> oracle::Result<f64> { Ok(if t < 0.3 { 1. } else { 0. }) }),
        ];
        for answer in answers {
            let mut oracle = Counting::new(answer);
            estimate_max(domain, &mut oracle, BudgetConfig::from_rounds(12)).unwrap();
            assert_eq!(oracle.calls(), 12);
        }
    }

    #[test]
    fn test_step_halves() {
        let domain = DomainBounds::new(-3., 5.);
        let mut oracle = |_: f64| -> oracle::Result<f64> { Ok(0.7) };
        let estimate = estimate_max(domain, &mut oracle, BudgetConfig::from_rounds(30)).unwrap();
        for (i, round) in estimate.trace().iter().enumerate() {
            assert_eq!(round.index, i);
            assert_eq!(round.step, 8. / 4. / 2f64.powi(i as i32));
            assert_eq!(round.step, SearchState::step_at(&domain, i as i32));
            assert!(round.moved_up);
        }
        assert_eq!(estimate.precision(), Some(8. / 2f64.powi(31)));
    }

    #[test]
    fn test_search_state() {
        let domain = DomainBounds::new(0., 16.);
        let mut state = SearchState::new(&domain, Seed::Midpoint, 2);
        assert_eq!(state.current_estimate(), 8.);
        assert_eq!(state.step_size(), 4.);
        let round = state.advance(0.5, 0.02);
        assert!(round.moved_up);
        assert_eq!(round.threshold, 8.);
        assert_eq!(state.current_estimate(), 12.);
        assert_eq!(state.step_size(), 2.);
        assert_eq!(state.round_index(), 1);
        assert_eq!(state.rounds_remaining(), 1);
        let round = state.advance(0.02, 0.02);
        assert!(!round.moved_up);
        assert_eq!(state.current_estimate(), 10.);
        assert!(state.is_terminal());
    }

    #[test]
    fn test_seeds() {
        let domain = DomainBounds::new(10., 20.);
        assert_eq!(Seed::Midpoint.value(&domain), 15.);
        assert_eq!(Seed::Origin.value(&domain), 0.);
        assert_eq!(Seed::Value(12.).value(&domain), 12.);
        assert!(Seed::Value(f64::NAN).validate(&domain).is_err());
        assert!(Seed::Value(20.).validate(&domain).is_ok());
        assert!(Seed::Value(20.5).validate(&domain).is_err());
        assert!(Seed::Origin.validate(&domain).is_err());
        let estimator = Estimator::builder()
            .with(DomainBounds::new(-4., 16.))
            .with(BudgetConfig::from_rounds(3))
            .with(Seed::Origin)
            .build();
        let mut oracle = Counting::new(step_oracle(100.));
        estimator.run(&mut oracle).unwrap();
        assert_eq!(oracle.thresholds(), &[0., 5., 7.5]);
    }

    #[test]
    fn test_off_center_seed_on_asymmetric_domain() {
        let domain = DomainBounds::new(10., 20.);
        let estimator = Estimator::builder()
            .with(domain)
            .with(BudgetConfig::from_rounds(20))
            .with(Seed::Value(12.))
            .build();
        let estimate = estimator.run(&mut step_oracle(15.)).unwrap();
        println!("{estimate}");
        // No precision is claimed away from the midpoint
        assert_eq!(estimate.precision(), None);
        assert!((estimate.value() - 15.).abs() < 1e-4);

        // A seed outside the domain is rejected before any query
        let mut oracle = Counting::new(step_oracle(15.));
        let error = Estimator::builder()
            .with(domain)
            .with(BudgetConfig::from_rounds(20))
            .with(Seed::Origin)
            .try_build()
            .and_then(|estimator| estimator.run(&mut oracle))
            .unwrap_err();
        println!("{error}");
        assert!(matches!(error, Error::InvalidConfiguration(_)));
        assert_eq!(oracle.calls(), 0);
    }

    #[test]
    fn test_precision_of_invalid_budget() {
        let domain = DomainBounds::new(0., 8.);
        assert_eq!(BudgetConfig::from_rounds(2).precision(&domain), Some(1.));
        assert_eq!(BudgetConfig::from_rounds(0).precision(&domain), None);
        assert_eq!(BudgetConfig::from_rounds(-3).precision(&domain), None);
        assert_eq!(
            BudgetConfig::from_rounds(2).precision(&DomainBounds::new(8., 0.)),
            None
        );
    }

    #[test]
    fn test_invalid_configuration_makes_no_call() {
        let valid = DomainBounds::new(0., 1.);
        let cases = [
            (valid, BudgetConfig::from_rounds(0)),
            (valid, BudgetConfig::from_rounds(-1)),
            (DomainBounds::new(1., 1.), BudgetConfig::from_rounds(10)),
            (DomainBounds::new(2., 1.), BudgetConfig::from_rounds(10)),
            (DomainBounds::new(f64::NEG_INFINITY, 1.), BudgetConfig::from_rounds(10)),
            (DomainBounds::new(-f64::MAX, f64::MAX), BudgetConfig::from_rounds(10)),
            (valid, BudgetConfig::new(10, 0., 0.02)),
            (valid, BudgetConfig::new(10, f64::INFINITY, 0.02)),
            (valid, BudgetConfig::new(10, 0.02, 1.5)),
            (valid, BudgetConfig::new(10, 0.02, f64::NAN)),
            (valid, BudgetConfig::from_rounds(5000)),
            (valid, BudgetConfig::from_rounds(i64::MAX)),
        ];
        for (domain, config) in cases {
            let mut oracle = Counting::new(step_oracle(0.5));
            let error = estimate_max(domain, &mut oracle, config).unwrap_err();
            println!("{error}");
            assert!(matches!(error, Error::InvalidConfiguration(_)));
            assert_eq!(error.rounds_completed(), 0);
            assert!(error.spent().is_no_op());
            assert_eq!(oracle.calls(), 0);
        }
    }

    #[test]
    fn test_noiseless_convergence() {
        let domain = DomainBounds::symmetric_power_of_two(32);
        let maxima = [
            TRUE_MAX,
            0.,
            1.,
            -1.,
            12345.678,
            4294967295.,
            -4294967295.,
            3.3e9,
            -2.5e9 + 0.123,
        ];
        for max in maxima {
            for k in 10..=64 {
                let estimate =
                    estimate_max(domain, &mut step_oracle(max), BudgetConfig::from_rounds(k))
                        .unwrap();
                assert!(
                    (estimate.value() - max).abs() <= estimate.precision().unwrap(),
                    "max = {max}, k = {k}, estimate = {estimate}"
                );
            }
        }
    }

    #[test]
    fn test_deep_search_negative_max() {
        let domain = DomainBounds::symmetric_power_of_two(32);
        let config = BudgetConfig::new(64, 0.02, 0.02);
        let mut oracle = Counting::new(step_oracle(TRUE_MAX));
        let estimate = estimate_max(domain, &mut oracle, config).unwrap();
        println!("{estimate}");
        assert_eq!(oracle.calls(), 64);
        assert!((estimate.value() - TRUE_MAX).abs() <= 2f64.powi(34) / 2f64.powi(65));
        assert!((estimate.epsilon_spent() - 1.28).abs() < 1e-9);
        assert_eq!(estimate.spent(), &config.planned_spend());
    }

    #[test]
    fn test_oracle_failure_on_third_round() {
        let domain = DomainBounds::new(0., 1024.);
        let mut calls = 0;
        let mut oracle = Counting::new(|t: f64| {
            calls += 1;
            if calls == 3 {
                Err(oracle::Error::unavailable("kernel died"))
            } else {
                Ok(if t < 300. { 1. } else { 0. })
            }
        });
        let error = estimate_max(domain, &mut oracle, BudgetConfig::new(10, 0.1, 0.02)).unwrap_err();
        println!("{error}");
        assert_eq!(oracle.calls(), 3);
        match &error {
            Error::OracleUnavailable {
                round,
                rounds_completed,
                source,
                ..
            } => {
                assert_eq!(*round, 2);
                assert_eq!(*rounds_completed, 2);
                assert_eq!(source, &oracle::Error::unavailable("kernel died"));
            }
            _ => panic!("unexpected error {error}"),
        }
        assert_eq!(error.spent().len(), 3);
        assert!((error.epsilon_spent() - 0.3).abs() < 1e-9);
        assert!(error::Error::source(&error).is_some());
    }

    #[test]
    fn test_malformed_answer_aborts() {
        let domain = DomainBounds::new(0., 1.);
        let mut oracle = Counting::new(|_: f64| -> oracle::Result<f64> { Ok(1.2) });
        let error = estimate_max(domain, &mut oracle, BudgetConfig::from_rounds(5)).unwrap_err();
        assert!(matches!(
            error,
            Error::OracleUnavailable {
                round: 0,
                source: oracle::Error::Malformed(_),
                ..
            }
        ));
        assert_eq!(oracle.calls(), 1);
    }

    #[test]
    fn test_cancellation() {
        let cancellation = Cancellation::new();
        let handle = cancellation.clone();
        let mut calls = 0;
        let mut oracle = |t: f64| -> oracle::Result<f64> {
            calls += 1;
            if calls == 4 {
                handle.cancel();
            }
            Ok(if t < 5. { 1. } else { 0. })
        };
        let estimator = Estimator::builder()
            .with(DomainBounds::new(0., 10.))
            .with(BudgetConfig::new(10, 0.05, 0.02))
            .with(cancellation)
            .build();
        let error = estimator.run(&mut oracle).unwrap_err();
        println!("{error}");
        assert_eq!(calls, 4);
        assert_eq!(
            error,
            Error::Cancelled {
                rounds_completed: 4,
                spent: DpEvent::repeated(0.05, 4)
            }
        );
    }

    #[test]
    fn test_noisy_dataset() {
        // 20 values, so that a single value above the threshold weights 0.05 > 0.02
        let values: Vec<f64> = (0..20).map(|i| (i * 37 % 101) as f64).collect();
        let mut oracle = DatasetOracle::new(values, 5.).unwrap().with_seed(7);
        let max = oracle.exact_max();
        let estimate = estimate_max(
            DomainBounds::new(-1000., 1000.),
            &mut oracle,
            BudgetConfig::new(30, 5., 0.02),
        )
        .unwrap();
        println!("max = {max}, estimate = {estimate}");
        assert_eq!(oracle.ledger().len(), 30);
        assert_eq!(oracle.ledger(), estimate.spent());
        assert!(estimate.value() >= -1000. && estimate.value() <= 1000.);
    }
}
