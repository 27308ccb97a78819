//! # Privacy accounting vocabulary
//!
//! The estimator never enforces a privacy budget itself: the query service does.
//! These types let it report exactly what it has spent.
//!

pub mod dp_event;
pub mod mechanisms;

/// Some exports
pub use dp_event::DpEvent;
