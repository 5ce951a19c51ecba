//! Batch coupon redemption: the sequential engine and the report arithmetic
//! (counts and severity) built on its output.

pub mod aggregate;
pub mod engine;

pub use aggregate::{success_count, BatchResult, Severity};
pub use engine::{AccountBatch, RedemptionEngine};
