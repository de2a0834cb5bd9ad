//! In-memory accounting store.
//!
//! Lock order: the store lock is always taken before any account lock, and no
//! account lock is held while the store lock is requested.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::core::account::{Account, AccountUpdate, SharedAccount, UserSnapshot, PLACEHOLDER_BANK};
use crate::core::queues::QueueTable;
use crate::util::serde::UserId;

/// Result of looking up a user/bank pair.
#[derive(Debug, Clone)]
pub enum Lookup {
    /// A real account matched.
    Found(SharedAccount),
    /// The entry that matched is a placeholder.
    Placeholder(SharedAccount),
    /// Nothing matched.
    NotFound,
}

#[derive(Default)]
struct StoreState {
    accounts: BTreeMap<UserId, BTreeMap<String, SharedAccount>>,
    default_banks: HashMap<UserId, String>,
    queues: Arc<QueueTable>,
    projects: Arc<BTreeSet<String>>,
}

/// Accounts, default banks, queue definitions, and known projects.
#[derive(Default)]
pub struct AccountingStore {
    state: RwLock<StoreState>,
}

impl AccountingStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an account; an omitted bank resolves through the default-bank index.
    pub fn lookup(&self, userid: UserId, bank: Option<&str>) -> Lookup {
        let state = self.state.read();
        let Some(banks) = state.accounts.get(&userid) else {
            return Lookup::NotFound;
        };
        let bank = match bank {
            Some(bank) => bank,
            None => match state.default_banks.get(&userid) {
                Some(default) => default.as_str(),
                None => return Lookup::NotFound,
            },
        };
        match banks.get(bank) {
            Some(account) if account.lock().is_placeholder() => {
                Lookup::Placeholder(Arc::clone(account))
            }
            Some(account) => Lookup::Found(Arc::clone(account)),
            None => Lookup::NotFound,
        }
    }

    /// True iff every account held is a placeholder (including an empty store).
    pub fn only_placeholders_present(&self) -> bool {
        let state = self.state.read();
        state
            .accounts
            .values()
            .flat_map(BTreeMap::values)
            .all(|account| account.lock().is_placeholder())
    }

    /// Return the user's placeholder account, creating it on first use.
    ///
    /// The placeholder becomes the user's default bank only when no default exists.
    pub fn placeholder_for(&self, userid: UserId, fairshare: f64) -> SharedAccount {
        let mut state = self.state.write();
        if !state.default_banks.contains_key(&userid) {
            state.default_banks.insert(userid, PLACEHOLDER_BANK.to_string());
        }
        let account = state
            .accounts
            .entry(userid)
            .or_default()
            .entry(PLACEHOLDER_BANK.to_string())
            .or_insert_with(|| {
                tracing::info!("created placeholder account for uid {}", userid);
                Arc::new(Mutex::new(Account::placeholder(userid, fairshare)))
            });
        Arc::clone(account)
    }

    /// Default bank recorded for a user.
    pub fn default_bank(&self, userid: UserId) -> Option<String> {
        self.state.read().default_banks.get(&userid).cloned()
    }

    /// Current queue definitions.
    pub fn queues(&self) -> Arc<QueueTable> {
        Arc::clone(&self.state.read().queues)
    }

    /// Current set of known projects.
    pub fn projects(&self) -> Arc<BTreeSet<String>> {
        Arc::clone(&self.state.read().projects)
    }

    /// Number of accounts, placeholders included.
    pub fn account_count(&self) -> usize {
        self.state.read().accounts.values().map(BTreeMap::len).sum()
    }

    /// Create or refresh accounts in place under one store lock.
    pub fn apply_account_updates(&self, updates: &[AccountUpdate]) {
        let mut state = self.state.write();
        for update in updates {
            let banks = state.accounts.entry(update.userid).or_default();
            match banks.get(&update.bank) {
                Some(existing) => existing.lock().refresh(update),
                None => {
                    banks.insert(
                        update.bank.clone(),
                        Arc::new(Mutex::new(Account::from_update(update))),
                    );
                }
            }
            state
                .default_banks
                .insert(update.userid, update.default_bank.clone());
        }
    }

    /// Replace every queue definition.
    pub fn replace_queues(&self, table: QueueTable) {
        self.state.write().queues = Arc::new(table);
    }

    /// Replace the set of known projects.
    pub fn replace_projects(&self, projects: BTreeSet<String>) {
        self.state.write().projects = Arc::new(projects);
    }

    /// Export every account, users and banks in ascending order.
    pub fn export(&self) -> Vec<UserSnapshot> {
        let state = self.state.read();
        state
            .accounts
            .iter()
            .map(|(userid, banks)| UserSnapshot {
                userid: *userid,
                banks: banks.values().map(|a| a.lock().snapshot()).collect(),
            })
            .collect()
    }
}
