use super::{BudgetConfig, DomainBounds, Error, Estimator, Result, Seed};
use crate::{
    builder::{Ready, With},
    cancellation::Cancellation,
};
use serde::{Deserialize, Serialize};

/// The serializable description of a run
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub domain: DomainBounds,
    pub budget: BudgetConfig,
    #[serde(default)]
    pub seed: Seed,
}

impl SearchConfig {
    pub fn new(domain: DomainBounds, budget: BudgetConfig) -> Self {
        SearchConfig {
            domain,
            budget,
            seed: Seed::default(),
        }
    }

    /// Parse a configuration such as
    /// `{"domain": {"lower": -1.0, "upper": 1.0}, "budget": {"total_rounds": 20}}`
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::invalid_configuration)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Error::invalid_configuration)
    }
}

/// A builder for [Estimator], validating everything before any query is made
#[derive(Clone, Debug, Default)]
pub struct EstimatorBuilder {
    domain: Option<DomainBounds>,
    budget: Option<BudgetConfig>,
    seed: Seed,
    cancellation: Option<Cancellation>,
}

impl EstimatorBuilder {
    pub fn new() -> Self {
        EstimatorBuilder::default()
    }

    pub fn domain(mut self, lower: f64, upper: f64) -> Self {
        self.domain = Some(DomainBounds::new(lower, upper));
        self
    }

    pub fn rounds(mut self, total_rounds: i64, per_round_epsilon: f64) -> Self {
        let noise_threshold = self
            .budget
            .map_or(super::DEFAULT_NOISE_THRESHOLD, |budget| budget.noise_threshold());
        self.budget = Some(BudgetConfig::new(
            total_rounds,
            per_round_epsilon,
            noise_threshold,
        ));
        self
    }
}

impl With<DomainBounds> for EstimatorBuilder {
    fn with(mut self, input: DomainBounds) -> Self {
        self.domain = Some(input);
        self
    }
}

impl With<BudgetConfig> for EstimatorBuilder {
    fn with(mut self, input: BudgetConfig) -> Self {
        self.budget = Some(input);
        self
    }
}

impl With<Seed> for EstimatorBuilder {
    fn with(mut self, input: Seed) -> Self {
        self.seed = input;
        self
    }
}

impl With<Cancellation> for EstimatorBuilder {
    fn with(mut self, input: Cancellation) -> Self {
        self.cancellation = Some(input);
        self
    }
}

impl With<SearchConfig> for EstimatorBuilder {
    fn with(self, input: SearchConfig) -> Self {
        self.with(input.domain).with(input.budget).with(input.seed)
    }
}

impl Ready<Estimator> for EstimatorBuilder {
    type Error = Error;

    fn try_build(self) -> Result<Estimator> {
        let domain = self
            .domain
            .ok_or_else(|| Error::invalid_configuration("no domain bounds"))?;
        let config = self
            .budget
            .ok_or_else(|| Error::invalid_configuration("no budget"))?;
        let rounds = config.validate(&domain)?;
        self.seed.validate(&domain)?;
        if config.total_epsilon() > 1. {
            log::warn!(
                "The estimation will spend a total epsilon of {} ({} rounds of {})",
                config.total_epsilon(),
                rounds,
                config.per_round_epsilon()
            );
        }
        Ok(Estimator {
            domain,
            config,
            seed: self.seed,
            cancellation: self.cancellation,
            rounds,
        })
    }
}
