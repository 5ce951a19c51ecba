// File: couponbot-core/src/services/registry.rs

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use couponbot_common::models::{AccountRegistration, RecordBook};
use couponbot_common::traits::repository_traits::RecordStore;

use crate::config::OwnerPolicy;
use crate::Error;

/// What a removal command points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalTarget {
    /// A registration by its game account id.
    AccountId(String),
    /// The first registration owned by this chat user.
    Owner(String),
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("account {0} is already registered in this scope")]
    DuplicateAccount(String),

    #[error("user {0} already has an account registered in this scope")]
    OwnerAlreadyRegistered(String),

    #[error("no matching registration")]
    NotFound,

    #[error("only the owner or an administrator may remove this registration")]
    NotOwner,

    #[error("could not persist registrations: {0}")]
    Persist(#[from] Error),
}

/// Receipt returned by successful mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryChange {
    pub registration: AccountRegistration,
    /// Registrations left in the scope after the change.
    pub scope_total: usize,
}

/// In-memory view of the record book, loaded once at startup and written
/// through to the store on every mutation.
///
/// A mutation is applied to a copy, the copy is persisted, and only then does
/// it replace the cached book; a failed save leaves the cache untouched.
/// Mutations are serialized by holding the lock across the save.
pub struct Registry {
    store: Arc<dyn RecordStore>,
    book: Mutex<RecordBook>,
    owner_policy: OwnerPolicy,
}

impl Registry {
    pub async fn load(store: Arc<dyn RecordStore>, owner_policy: OwnerPolicy) -> Result<Self, Error> {
        let book = store.load().await?;
        info!(
            "Registry loaded: {} player(s) across {} server(s), owner policy = {}",
            book.total_accounts(),
            book.scope_count(),
            owner_policy
        );
        Ok(Self {
            store,
            book: Mutex::new(book),
            owner_policy,
        })
    }

    pub fn owner_policy(&self) -> OwnerPolicy {
        self.owner_policy
    }

    /// Snapshot of one scope's registrations in registration order.
    pub async fn accounts(&self, scope: &str) -> Vec<AccountRegistration> {
        self.book.lock().await.accounts(scope).to_vec()
    }

    pub async fn owned_by(&self, scope: &str, owner_id: &str) -> Vec<AccountRegistration> {
        self.book.lock().await.owned_by(scope, owner_id).cloned().collect()
    }

    /// `(total registrations, number of scopes)`.
    pub async fn stats(&self) -> (usize, usize) {
        let book = self.book.lock().await;
        (book.total_accounts(), book.scope_count())
    }

    pub async fn register(
        &self,
        scope: &str,
        registration: AccountRegistration,
    ) -> Result<RegistryChange, RegistryError> {
        let mut book = self.book.lock().await;

        if book
            .find_by_account_id(scope, &registration.external_account_id)
            .is_some()
        {
            return Err(RegistryError::DuplicateAccount(registration.external_account_id));
        }
        if self.owner_policy == OwnerPolicy::Single
            && book.owned_by(scope, &registration.owner_id).next().is_some()
        {
            return Err(RegistryError::OwnerAlreadyRegistered(registration.owner_id));
        }

        let mut updated = book.clone();
        updated.push(scope, registration.clone());
        self.store.save(&updated).await?;

        *book = updated;
        let scope_total = book.accounts(scope).len();
        debug!(
            "Registered {} ({}) for {} in scope {scope}",
            registration.display_name, registration.external_account_id, registration.owner_id
        );
        Ok(RegistryChange { registration, scope_total })
    }

    /// Removes one registration. Non-admins may only target their own.
    pub async fn remove(
        &self,
        scope: &str,
        target: &RemovalTarget,
        requester_id: &str,
        requester_is_admin: bool,
    ) -> Result<RegistryChange, RegistryError> {
        let mut book = self.book.lock().await;

        let account_id = match target {
            RemovalTarget::Owner(owner_id) => {
                if !requester_is_admin && owner_id != requester_id {
                    return Err(RegistryError::NotOwner);
                }
                book.owned_by(scope, owner_id)
                    .next()
                    .map(|r| r.external_account_id.clone())
                    .ok_or(RegistryError::NotFound)?
            }
            RemovalTarget::AccountId(pid) => {
                let found = book
                    .find_by_account_id(scope, pid)
                    .ok_or(RegistryError::NotFound)?;
                if !requester_is_admin && found.owner_id != requester_id {
                    return Err(RegistryError::NotOwner);
                }
                found.external_account_id.clone()
            }
        };

        let mut updated = book.clone();
        let registration = updated
            .remove_account(scope, &account_id)
            .ok_or(RegistryError::NotFound)?;
        self.store.save(&updated).await?;

        *book = updated;
        let scope_total = book.accounts(scope).len();
        debug!(
            "Removed {} ({}) from scope {scope}",
            registration.display_name, registration.external_account_id
        );
        Ok(RegistryChange { registration, scope_total })
    }
}
