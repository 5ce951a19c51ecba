// File: couponbot-common/src/lib.rs
//! Types shared between the bot core and the server binary: the error enum,
//! the registration / redemption models and the collaborator traits.

pub mod error;
pub mod models;
pub mod traits;

pub use error::Error;
