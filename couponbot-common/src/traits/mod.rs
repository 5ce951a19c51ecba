// File: couponbot-common/src/traits/mod.rs
pub mod api;
pub mod repository_traits;

pub use api::{ChatSink, RewardClient};
pub use repository_traits::RecordStore;
