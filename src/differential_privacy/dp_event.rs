use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An object inspired by Google's [DPEvent](https://github.com/google/differential-privacy/blob/main/python/dp_accounting/dp_event.py)
/// to represent the privacy spend of a sequence of noisy queries
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DpEvent {
    /// Represents application of an operation with no privacy impact.
    ///
    /// This is what an estimation run that failed validation has spent.
    NoOp,
    /// Represents the application of a mechanism which is epsilon-delta approximate DP
    EpsilonDelta { epsilon: f64, delta: f64 },
    /// Represents application of a series of composed mechanisms.
    ///
    /// In a binary search the composition is adaptive: the threshold of each
    /// query depends on the answers of the prior ones.
    Composed { events: Vec<DpEvent> },
}

impl DpEvent {
    pub fn no_op() -> Self {
        Self::NoOp
    }

    pub fn epsilon_delta(epsilon: f64, delta: f64) -> Self {
        Self::EpsilonDelta { epsilon, delta }
    }

    /// `rounds` repetitions of a pure `epsilon`-DP query
    pub fn repeated(epsilon: f64, rounds: usize) -> Self {
        (0..rounds)
            .map(|_| DpEvent::epsilon_delta(epsilon, 0.))
            .collect()
    }

    pub fn compose(self, other: Self) -> Self {
        if other.is_no_op() {
            self
        } else if self.is_no_op() {
            other
        } else {
            let (v1, v2) = match (self, other) {
                (DpEvent::Composed { events: v1 }, DpEvent::Composed { events: v2 }) => (v1, v2),
                (DpEvent::Composed { events: v }, other) => (v, vec![other]),
                (current, DpEvent::Composed { events: v }) => (vec![current], v),
                (current, other) => (vec![current], vec![other]),
            };
            DpEvent::Composed {
                events: v1.into_iter().chain(v2).collect(),
            }
        }
    }

    pub fn is_no_op(&self) -> bool {
        match self {
            DpEvent::NoOp => true,
            DpEvent::EpsilonDelta { epsilon, delta } => epsilon == &0. && delta == &0.,
            DpEvent::Composed { events } => events.iter().all(|e| e.is_no_op()),
        }
    }

    /// Number of elementary mechanisms in the event
    pub fn len(&self) -> usize {
        match self {
            DpEvent::NoOp => 0,
            DpEvent::Composed { events } => events.iter().map(DpEvent::len).sum(),
            DpEvent::EpsilonDelta { .. } => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The epsilon of the event under basic sequential composition
    pub fn epsilon(&self) -> f64 {
        match self {
            DpEvent::NoOp => 0.,
            DpEvent::EpsilonDelta { epsilon, .. } => *epsilon,
            DpEvent::Composed { events } => events.iter().map(DpEvent::epsilon).sum(),
        }
    }

    /// The delta of the event under basic sequential composition
    pub fn delta(&self) -> f64 {
        match self {
            DpEvent::EpsilonDelta { delta, .. } => *delta,
            DpEvent::Composed { events } => events.iter().map(DpEvent::delta).sum(),
            DpEvent::NoOp => 0.,
        }
    }
}

impl fmt::Display for DpEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DpEvent::NoOp => write!(f, "NoOp"),
            DpEvent::EpsilonDelta { epsilon, delta } => {
                write!(f, "EpsilonDelta ({epsilon}, {delta})")
            }
            DpEvent::Composed { events } => write!(
                f,
                "Composed ({})",
                events.iter().map(|dpe| format!("{}", dpe)).join(", ")
            ),
        }
    }
}

impl FromIterator<DpEvent> for DpEvent {
    fn from_iter<T: IntoIterator<Item = DpEvent>>(iter: T) -> Self {
        iter.into_iter()
            .fold(DpEvent::NoOp, |composed, event| composed.compose(event))
    }
}

impl From<Vec<DpEvent>> for DpEvent {
    fn from(v: Vec<DpEvent>) -> Self {
        v.into_iter().collect()
    }
}
