use serde::{Deserialize, Serialize};

/// One bank account as it appears in the persisted snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "Name", alias = "name")]
    name: String,
    #[serde(rename = "AccountID", alias = "accountId")]
    id: i64,
    /// Can be negative, withdrawals are not checked against the balance.
    #[serde(rename = "Balance", alias = "balance")]
    balance: f32,
}

impl Account {
    pub fn new(id: i64, name: impl Into<String>) -> Account {
        Account::with_balance(id, name, 0.0)
    }

    pub fn with_balance(id: i64, name: impl Into<String>, balance: f32) -> Account {
        Account {
            name: name.into(),
            id,
            balance,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn balance(&self) -> f32 {
        self.balance
    }

    /// Adds a signed delta to the balance and returns the new balance.
    ///
    /// Returns `None` and leaves the balance alone if the result would not be
    /// finite.
    pub fn apply_delta(&mut self, delta: f32) -> Option<f32> {
        let balance = self.balance + delta;
        if !balance.is_finite() {
            return None;
        }
        self.balance = balance;
        Some(balance)
    }

    /// Interest owed on the current balance for a percentage `rate`.
    pub fn interest(&self, rate: f32) -> f32 {
        self.balance * (rate / 100.0)
    }
}
