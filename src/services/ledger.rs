use crate::rpc::Bank;
use crate::rpc::proto::{Empty, LedgerRequest};
use crate::stores::{AccountStore, StoreError};
use crate::types::{Account, LedgerOp};
use log::{debug, warn};
use std::sync::Arc;
use thiserror::Error;
use tonic::{Request, Response, Status};

/// What a ledger operation does when the account id is not in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownAccountPolicy {
    /// Acknowledge the call and change nothing.
    #[default]
    Ignore,
    /// Fail the call with `NotFound`.
    Reject,
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("amount must be finite, got {0}")]
    InvalidAmount(f32),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<LedgerError> for Status {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InvalidAmount(_) | LedgerError::Store(StoreError::Overflow(_)) => {
                Status::invalid_argument(e.to_string())
            }
            LedgerError::Store(StoreError::NotFound(_)) => Status::not_found(e.to_string()),
            LedgerError::Store(_) => Status::internal(e.to_string()),
        }
    }
}

/// Balance mutations on top of an [`AccountStore`].
///
/// Holds no state of its own. Each operation is a single
/// `apply_delta_with` on the store, so the balance read for interest and the
/// write of the new balance happen under the same account guard.
pub struct LedgerService<S> {
    store: Arc<S>,
    policy: UnknownAccountPolicy,
}

impl<S: AccountStore> LedgerService<S> {
    pub fn new(store: Arc<S>) -> Self {
        LedgerService {
            store,
            policy: UnknownAccountPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: UnknownAccountPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn deposit(&self, id: i64, amount: f32) -> Result<(), LedgerError> {
        self.apply(LedgerOp::Deposit, id, amount)
    }

    /// No sufficiency check, the balance may go negative.
    pub fn withdraw(&self, id: i64, amount: f32) -> Result<(), LedgerError> {
        self.apply(LedgerOp::Withdraw, id, amount)
    }

    /// Adds `rate` percent of the current balance.
    pub fn add_interest(&self, id: i64, rate: f32) -> Result<(), LedgerError> {
        self.apply(LedgerOp::Interest, id, rate)
    }

    pub fn apply(&self, op: LedgerOp, id: i64, amount: f32) -> Result<(), LedgerError> {
        if !amount.is_finite() {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let res = match op {
            LedgerOp::Deposit => self.store.apply_delta(id, amount),
            LedgerOp::Withdraw => self.store.apply_delta(id, -amount),
            LedgerOp::Interest => self
                .store
                .apply_delta_with(id, &|act: &Account| act.interest(amount)),
        };
        match res {
            Ok(balance) => {
                debug!("{:?} {} on account {}: balance {}", op, amount, id, balance);
                Ok(())
            }
            Err(StoreError::NotFound(id)) if self.policy == UnknownAccountPolicy::Ignore => {
                warn!("{:?} on unknown account {} ignored", op, id);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl<S: AccountStore> LedgerService<S> {
    fn answer(
        &self,
        op: LedgerOp,
        request: Request<LedgerRequest>,
    ) -> Result<Response<Empty>, Status> {
        let LedgerRequest {
            account_number,
            amount,
        } = request.into_inner();
        self.apply(op, account_number, amount)?;
        Ok(Response::new(Empty {}))
    }
}

#[tonic::async_trait]
impl<S: AccountStore + 'static> Bank for LedgerService<S> {
    async fn deposit(&self, request: Request<LedgerRequest>) -> Result<Response<Empty>, Status> {
        self.answer(LedgerOp::Deposit, request)
    }

    async fn withdraw(&self, request: Request<LedgerRequest>) -> Result<Response<Empty>, Status> {
        self.answer(LedgerOp::Withdraw, request)
    }

    async fn add_interest(
        &self,
        request: Request<LedgerRequest>,
    ) -> Result<Response<Empty>, Status> {
        self.answer(LedgerOp::Interest, request)
    }
}
