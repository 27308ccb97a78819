//! # Builder utilities
//!
//! This module contains utilities to ease and standardize the writing of builders
//! such as: [crate::estimator::EstimatorBuilder]
//!

use std::error;

/// A trait for builder ad-hoc polymorphism
pub trait With<Input, Output = Self> {
    fn with(self, input: Input) -> Output;
}

/// A trait enabling build when a builder is ready
pub trait Ready<Output>: Sized {
    type Error: error::Error;
    /// Build and panic in case of error
    fn build(self) -> Output {
        match self.try_build() {
            Ok(output) => output,
            Err(err) => panic!("{err}"),
        }
    }
    /// Try to build
    fn try_build(self) -> Result<Output, Self::Error>;
}
