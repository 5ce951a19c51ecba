// File: couponbot-core/src/repositories/mod.rs

pub mod json_file;

pub use couponbot_common::traits::repository_traits::RecordStore;
pub use json_file::JsonFileStore;
