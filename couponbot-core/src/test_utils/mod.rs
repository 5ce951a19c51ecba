//! Fakes shared by the unit tests and the `tests/` integration suites.

pub mod helpers;

pub use helpers::*;
