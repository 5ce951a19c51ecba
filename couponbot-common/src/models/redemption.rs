// File: couponbot-common/src/models/redemption.rs

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One line of a reward list returned by the coupon endpoint.
///
/// Both fields are kept as display text. The endpoint is not consistent about
/// their JSON types and the report only ever prints them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardItem {
    #[serde(default, deserialize_with = "text_from_any")]
    pub item_name: String,

    #[serde(rename = "itemCnt", default, deserialize_with = "text_from_any")]
    pub item_count: String,
}

impl RewardItem {
    pub fn new(item_name: impl Into<String>, item_count: impl Into<String>) -> Self {
        Self {
            item_name: item_name.into(),
            item_count: item_count.into(),
        }
    }
}

/// Renders any JSON scalar the way a chat message would show it.
/// `null` becomes the empty string; whole floats drop their `.0`.
pub fn json_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

fn text_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|v| json_text(&v))
}

/// Normalized result of one redemption attempt that reached the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardResponse {
    pub succeeded: bool,
    pub message: String,
    pub reward_items: Option<Vec<RewardItem>>,
}

impl RewardResponse {
    pub fn success(message: impl Into<String>, reward_items: Option<Vec<RewardItem>>) -> Self {
        Self {
            succeeded: true,
            message: message.into(),
            reward_items,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            message: message.into(),
            reward_items: None,
        }
    }
}

/// Per-account line of a batch redemption. Lives only as long as the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedemptionOutcome {
    pub account_label: String,
    pub owner_id: String,
    pub code: String,
    pub succeeded: bool,
    pub message: String,
    pub reward_items: Option<Vec<RewardItem>>,
}
