// src/lib.rs

pub mod config;
pub mod platforms;
pub mod repositories;
pub mod services;
pub mod test_utils;
pub mod utils;

pub use config::{BotConfig, OwnerPolicy};
pub use couponbot_common::error::Error;
pub use couponbot_common::models;
