pub mod client;

pub use client::{interpret_reward_response, CouponApiClient, SUCCESS_RESULT_CODE};
