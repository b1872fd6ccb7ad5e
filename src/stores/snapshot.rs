//! JSON persistence of account snapshots.
//!
//! The snapshot is a JSON array of `{"Name", "AccountID", "Balance"}`
//! records. It is read once at startup and written once at shutdown.

use super::LoadError;
use crate::types::Account;
use std::io::{Read, Write};

pub fn read_accounts<R: Read>(input: R) -> Result<Vec<Account>, LoadError> {
    Ok(serde_json::from_reader(input)?)
}

/// Writes the accounts and flushes the writer.
///
/// JSON has no representation for non-finite numbers, so a snapshot holding
/// one is refused before anything is written.
pub fn write_accounts<W: Write>(mut output: W, accounts: &[Account]) -> std::io::Result<()> {
    if let Some(act) = accounts.iter().find(|act| !act.balance().is_finite()) {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("account {} has non-finite balance {}", act.id(), act.balance()),
        ));
    }
    serde_json::to_writer(&mut output, accounts)?;
    output.flush()
}
