// File: couponbot-common/src/models/mod.rs
pub mod chat;
pub mod redemption;
pub mod registration;

pub use chat::IncomingMessage;
pub use redemption::{json_text, RedemptionOutcome, RewardItem, RewardResponse};
pub use registration::{AccountRegistration, RecordBook, DEFAULT_SCOPE};
