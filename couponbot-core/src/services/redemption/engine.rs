use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use couponbot_common::models::{AccountRegistration, RedemptionOutcome};
use couponbot_common::traits::api::RewardClient;

use crate::services::redemption::aggregate::BatchResult;
use crate::utils::time::{Clock, Pacer, SystemClock, TokioPacer};

/// A non-empty, ordered list of accounts to redeem for.
///
/// Building one is how callers prove the "at least one account" precondition;
/// the engine itself never sees an empty batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountBatch(Vec<AccountRegistration>);

impl AccountBatch {
    pub fn new(accounts: Vec<AccountRegistration>) -> Option<Self> {
        if accounts.is_empty() {
            None
        } else {
            Some(Self(accounts))
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AccountRegistration> {
        self.0.iter()
    }
}

/// Redeems one code for a batch of accounts, strictly one request at a time.
///
/// Before every request (the first one included) the engine pauses for the
/// configured delay. A failing account never stops the batch: transport errors
/// become failed outcomes and the loop moves on.
pub struct RedemptionEngine {
    client: Arc<dyn RewardClient>,
    pacer: Arc<dyn Pacer>,
    clock: Arc<dyn Clock>,
    delay: Duration,
}

impl RedemptionEngine {
    pub fn new(client: Arc<dyn RewardClient>, delay: Duration) -> Self {
        Self {
            client,
            pacer: Arc::new(TokioPacer),
            clock: Arc::new(SystemClock),
            delay,
        }
    }

    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Runs the batch to completion. `code` must already be trimmed and upper-cased.
    pub async fn redeem_all(&self, accounts: &AccountBatch, code: &str) -> BatchResult {
        let started_at = self.clock.now();
        info!("Redeeming coupon {code} for {} player(s)...", accounts.len());

        let mut outcomes = Vec::with_capacity(accounts.len());
        for account in accounts.iter() {
            self.pacer.pause(self.delay).await;
            outcomes.push(self.redeem_one(account, code).await);
        }

        let result = BatchResult {
            code: code.to_string(),
            outcomes,
            started_at,
            finished_at: self.clock.now(),
        };
        info!(
            "Coupon {code}: {}/{} redeemed successfully",
            result.success_count(),
            result.total_count()
        );
        result
    }

    async fn redeem_one(&self, account: &AccountRegistration, code: &str) -> RedemptionOutcome {
        match self.client.redeem(&account.external_account_id, code).await {
            Ok(resp) => {
                info!("{} - {}: {}", account.display_name, code, resp.message);
                RedemptionOutcome {
                    account_label: account.display_name.clone(),
                    owner_id: account.owner_id.clone(),
                    code: code.to_string(),
                    succeeded: resp.succeeded,
                    message: resp.message,
                    reward_items: resp.reward_items,
                }
            }
            Err(e) => {
                error!("{} - {}: Error - {}", account.display_name, code, e);
                RedemptionOutcome {
                    account_label: account.display_name.clone(),
                    owner_id: account.owner_id.clone(),
                    code: code.to_string(),
                    succeeded: false,
                    message: format!("Error: {e}"),
                    reward_items: None,
                }
            }
        }
    }
}
