// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Pacific Cargo Logistics
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Account store.
//!
//! One balance per wallet owner. Callers never hold a lock on an account:
//! they read a versioned snapshot, compute the new balance, and swap it in
//! with [`AccountStore::compare_and_swap_balance`]. Losing the race returns
//! [`LedgerError::VersionConflict`] and the caller re-reads and retries.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use pacific_ledger_rs::{AccountStore, UserId};
//!
//! let store = AccountStore::new();
//! let account = store.create(UserId(1));
//! store
//!     .compare_and_swap_balance(UserId(1), account.version, dec!(250.00))
//!     .unwrap();
//! assert_eq!(store.get(UserId(1)).unwrap().balance, dec!(250.00));
//! ```

use crate::LedgerError;
use crate::base::UserId;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Snapshot of a wallet account.
///
/// `version` increments on every successful mutation; a snapshot is only
/// as fresh as the version it carries, and a swap against a stale version
/// always loses.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub user_id: UserId,
    pub balance: Decimal,
    pub version: u64,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    const DECIMAL_PRECISION: u32 = 2;

    fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            balance: Decimal::ZERO,
            version: 0,
            archived: false,
            created_at: Utc::now(),
        }
    }

    fn assert_invariants(&self) {
        debug_assert!(
            self.balance >= Decimal::ZERO,
            "Invariant violated: balance went negative: {}",
            self.balance
        );
    }
}

impl Serialize for Account {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Account", 4)?;
        state.serialize_field("user", &self.user_id)?;
        state.serialize_field("balance", &self.balance.round_dp(Account::DECIMAL_PRECISION))?;
        state.serialize_field("version", &self.version)?;
        state.serialize_field("archived", &self.archived)?;
        state.end()
    }
}

/// Concurrent store of wallet accounts.
///
/// Hands out snapshots, never references. The only way to change a balance
/// is the compare-and-swap primitive; accounts are never deleted, only
/// soft-archived.
#[derive(Debug)]
pub struct AccountStore {
    accounts: DashMap<UserId, Account>,
}

impl AccountStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    /// Registers an account with a zero balance.
    ///
    /// Idempotent: re-registering returns the existing account unchanged,
    /// so a retried signup hook cannot reset a balance.
    pub fn create(&self, user_id: UserId) -> Account {
        self.accounts
            .entry(user_id)
            .or_insert_with(|| Account::new(user_id))
            .clone()
    }

    /// Returns a snapshot of the account.
    pub fn get(&self, user_id: UserId) -> Result<Account, LedgerError> {
        self.accounts
            .get(&user_id)
            .map(|account| account.clone())
            .ok_or(LedgerError::NotFound)
    }

    /// The sole balance mutation primitive.
    ///
    /// Succeeds only if the live version still equals `expected_version`,
    /// then installs `new_balance` and bumps the version so every
    /// concurrent loser sees [`LedgerError::VersionConflict`] and must
    /// re-read before retrying.
    pub fn compare_and_swap_balance(
        &self,
        user_id: UserId,
        expected_version: u64,
        new_balance: Decimal,
    ) -> Result<(), LedgerError> {
        let mut account = self
            .accounts
            .get_mut(&user_id)
            .ok_or(LedgerError::NotFound)?;
        if account.archived {
            return Err(LedgerError::AccountArchived);
        }
        if account.version != expected_version {
            return Err(LedgerError::VersionConflict);
        }
        account.balance = new_balance;
        account.version += 1;
        account.assert_invariants();
        Ok(())
    }

    /// Soft-archives the account.
    ///
    /// Archived accounts refuse further swaps but stay readable; nothing
    /// is ever deleted. Bumps the version, so swaps in flight against an
    /// older snapshot lose their race.
    pub fn archive(&self, user_id: UserId) -> Result<(), LedgerError> {
        let mut account = self
            .accounts
            .get_mut(&user_id)
            .ok_or(LedgerError::NotFound)?;
        account.archived = true;
        account.version += 1;
        Ok(())
    }

    /// Snapshots of every account, unordered.
    pub fn accounts(&self) -> Vec<Account> {
        self.accounts.iter().map(|account| account.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::new()
    }
}
