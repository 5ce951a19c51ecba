// File: couponbot-common/src/models/registration.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Scope key used when per-server scoping is disabled, and the scope that a
/// legacy (bare array) players file is migrated into.
pub const DEFAULT_SCOPE: &str = "default";

/// A game account registered by a chat user.
///
/// The serialized field names match the players file written by earlier
/// versions of the bot, so existing data files load unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRegistration {
    /// Opaque game account identifier (the "PID").
    #[serde(rename = "pid")]
    pub external_account_id: String,

    #[serde(rename = "accountName")]
    pub display_name: String,

    /// Discord user id of the member who registered the account.
    #[serde(rename = "discordID")]
    pub owner_id: String,

    #[serde(rename = "addedAt", default)]
    pub registered_at: DateTime<Utc>,
}

/// Every registration the bot knows about, keyed by scope (a guild id, or
/// [`DEFAULT_SCOPE`]). Insertion order within a scope is preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RecordBook {
    scopes: BTreeMap<String, Vec<AccountRegistration>>,
}

/// On-disk shapes we accept. The bare array is the pre-multi-server format.
#[derive(Deserialize)]
#[serde(untagged)]
enum RecordFile {
    Scoped(BTreeMap<String, Vec<AccountRegistration>>),
    Legacy(Vec<AccountRegistration>),
}

impl<'de> Deserialize<'de> for RecordBook {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let scopes = match RecordFile::deserialize(deserializer)? {
            RecordFile::Scoped(map) => map,
            RecordFile::Legacy(list) => {
                let mut map = BTreeMap::new();
                map.insert(DEFAULT_SCOPE.to_string(), list);
                map
            }
        };
        Ok(Self { scopes })
    }
}

impl RecordBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registrations for one scope, in registration order. Unknown scopes are empty.
    pub fn accounts(&self, scope: &str) -> &[AccountRegistration] {
        self.scopes.get(scope).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn find_by_account_id(&self, scope: &str, account_id: &str) -> Option<&AccountRegistration> {
        self.accounts(scope)
            .iter()
            .find(|r| r.external_account_id == account_id)
    }

    pub fn owned_by<'a>(&'a self, scope: &str, owner_id: &'a str) -> impl Iterator<Item = &'a AccountRegistration> + 'a {
        self.accounts(scope).iter().filter(move |r| r.owner_id == owner_id)
    }

    pub fn push(&mut self, scope: &str, registration: AccountRegistration) {
        self.scopes
            .entry(scope.to_string())
            .or_default()
            .push(registration);
    }

    /// Removes the registration with `account_id` from `scope`, returning it.
    pub fn remove_account(&mut self, scope: &str, account_id: &str) -> Option<AccountRegistration> {
        let list = self.scopes.get_mut(scope)?;
        let idx = list.iter().position(|r| r.external_account_id == account_id)?;
        Some(list.remove(idx))
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    pub fn total_accounts(&self) -> usize {
        self.scopes.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reg(pid: &str, owner: &str) -> AccountRegistration {
        AccountRegistration {
            external_account_id: pid.to_string(),
            display_name: format!("name-{pid}"),
            owner_id: owner.to_string(),
            registered_at: Utc::now(),
        }
    }

    #[test]
    fn legacy_array_is_migrated_into_default_scope() {
        let json = r#"[{"pid":"ABC","accountName":"Main","discordID":"42","addedAt":"2024-05-01T10:00:00Z"}]"#;
        let book: RecordBook = serde_json::from_str(json).unwrap();

        assert_eq!(book.scope_count(), 1);
        let accounts = book.accounts(DEFAULT_SCOPE);
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].external_account_id, "ABC");
        assert_eq!(accounts[0].display_name, "Main");
        assert_eq!(accounts[0].owner_id, "42");
    }

    #[test]
    fn scoped_file_keeps_guild_keys() {
        let json = r#"{
            "111": [{"pid":"A","accountName":"a","discordID":"1","addedAt":"2024-05-01T10:00:00Z"}],
            "222": []
        }"#;
        let book: RecordBook = serde_json::from_str(json).unwrap();
        assert_eq!(book.scope_count(), 2);
        assert_eq!(book.accounts("111").len(), 1);
        assert!(book.accounts("222").is_empty());
        assert!(book.accounts("333").is_empty());
    }

    #[test]
    fn missing_added_at_defaults() {
        let json = r#"{"g":[{"pid":"A","accountName":"a","discordID":"1"}]}"#;
        let book: RecordBook = serde_json::from_str(json).unwrap();
        assert_eq!(book.accounts("g")[0].registered_at, DateTime::<Utc>::default());
    }

    #[test]
    fn remove_keeps_order_of_the_rest() {
        let mut book = RecordBook::new();
        book.push("g", reg("A", "1"));
        book.push("g", reg("B", "2"));
        book.push("g", reg("C", "1"));

        let removed = book.remove_account("g", "B").unwrap();
        assert_eq!(removed.owner_id, "2");

        let pids: Vec<_> = book.accounts("g").iter().map(|r| r.external_account_id.as_str()).collect();
        assert_eq!(pids, vec!["A", "C"]);
        assert_eq!(book.owned_by("g", "1").count(), 2);
        assert!(book.remove_account("g", "B").is_none());
        assert!(book.remove_account("nope", "A").is_none());
    }

    #[test]
    fn serializes_with_legacy_field_names() {
        let mut book = RecordBook::new();
        book.push("g", reg("A", "1"));
        let value = serde_json::to_value(&book).unwrap();
        let entry = &value["g"][0];
        assert_eq!(entry["pid"], "A");
        assert_eq!(entry["accountName"], "name-A");
        assert_eq!(entry["discordID"], "1");
        assert!(entry["addedAt"].is_string());
    }
}
