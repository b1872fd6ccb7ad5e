pub mod mem;
pub mod snapshot;
pub use mem::MemAccountStore;

use crate::types::Account;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("account {0} not found")]
    NotFound(i64),
    #[error("balance of account {0} would overflow")]
    Overflow(i64),
    #[error("account guard poisoned for account {0}")]
    Poisoned(i64),
    #[error("store snapshot gate poisoned")]
    GatePoisoned,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read accounts: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed accounts snapshot: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate account id {0}")]
    DuplicateId(i64),
}

/// Trait to be implemented by account stores.
///
/// The set of accounts is fixed once the store is built, so there is no
/// create or delete. Every mutation is a read-modify-write on one account
/// performed under that account's guard.
pub trait AccountStore: Send + Sync {
    /// Returns a copy of the account.
    fn get_account(&self, id: i64) -> Result<Account, StoreError>;

    /// Computes a delta from the current account state and adds it to the
    /// balance, without releasing the account in between. Returns the new balance.
    ///
    /// Fails with [`StoreError::Overflow`] and changes nothing if the new
    /// balance would not be finite.
    fn apply_delta_with(
        &self,
        id: i64,
        delta: &dyn Fn(&Account) -> f32,
    ) -> Result<f32, StoreError>;

    fn apply_delta(&self, id: i64, delta: f32) -> Result<f32, StoreError> {
        self.apply_delta_with(id, &|_: &Account| delta)
    }

    /// Point-in-time copy of every account, in load order. No mutation is in
    /// flight while the copy is taken.
    fn snapshot(&self) -> Result<Vec<Account>, StoreError>;
}
