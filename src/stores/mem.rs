use super::{AccountStore, LoadError, StoreError, snapshot};
use crate::types::Account;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::io::Read;
use std::path::Path;
use std::sync::{Mutex, RwLock};

/// In-memory account store.
///
/// Each account sits behind its own mutex so unrelated accounts mutate in
/// parallel. Mutations additionally hold the shared side of `gate`;
/// `snapshot` takes the exclusive side, which waits out every in-flight
/// mutation and keeps new ones out until the copy is done.
pub struct MemAccountStore {
    accounts: Vec<Mutex<Account>>,
    index: HashMap<i64, usize>,
    gate: RwLock<()>,
}

impl MemAccountStore {
    /// Builds a store from account records, keeping their order.
    pub fn load(records: impl IntoIterator<Item = Account>) -> Result<Self, LoadError> {
        let mut accounts = Vec::new();
        let mut index = HashMap::new();
        for act in records {
            match index.entry(act.id()) {
                Entry::Occupied(_) => return Err(LoadError::DuplicateId(act.id())),
                Entry::Vacant(slot) => {
                    slot.insert(accounts.len());
                    accounts.push(Mutex::new(act));
                }
            }
        }
        Ok(MemAccountStore {
            accounts,
            index,
            gate: RwLock::new(()),
        })
    }

    pub fn from_reader<R: Read>(input: R) -> Result<Self, LoadError> {
        Self::load(snapshot::read_accounts(input)?)
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn slot(&self, id: i64) -> Result<&Mutex<Account>, StoreError> {
        self.index
            .get(&id)
            .map(|&i| &self.accounts[i])
            .ok_or(StoreError::NotFound(id))
    }
}

impl AccountStore for MemAccountStore {
    fn get_account(&self, id: i64) -> Result<Account, StoreError> {
        let act = self.slot(id)?.lock().map_err(|_| StoreError::Poisoned(id))?;
        Ok(act.clone())
    }

    fn apply_delta_with(
        &self,
        id: i64,
        delta: &dyn Fn(&Account) -> f32,
    ) -> Result<f32, StoreError> {
        let slot = self.slot(id)?;
        let _gate = self.gate.read().map_err(|_| StoreError::GatePoisoned)?;
        let mut act = slot.lock().map_err(|_| StoreError::Poisoned(id))?;
        let d = delta(&act);
        act.apply_delta(d).ok_or(StoreError::Overflow(id))
    }

    fn snapshot(&self) -> Result<Vec<Account>, StoreError> {
        let _gate = self.gate.write().map_err(|_| StoreError::GatePoisoned)?;
        self.accounts
            .iter()
            .map(|slot| {
                slot.lock()
                    .map(|act| act.clone())
                    .map_err(|e| StoreError::Poisoned(e.into_inner().id()))
            })
            .collect()
    }
}
