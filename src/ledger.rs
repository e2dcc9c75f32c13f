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

//! Posting engine.
//!
//! The [`Ledger`] is the only component that changes balances. Every
//! posting runs the same discipline:
//!
//! 1. Claim the caller's external reference with a `pending` journal
//!    entry. A reference that already completed resolves to the prior
//!    outcome instead of a second application.
//! 2. Read an account snapshot, compute the new balance, and
//!    compare-and-swap it in against the snapshot's version. Losing the
//!    race re-reads and retries, up to the configured budget.
//! 3. Drive the entry to `completed` or `failed` before returning; no
//!    entry outlives its call in `pending` state.
//!
//! Debits re-check sufficiency against every freshly-read snapshot. Two
//! concurrent debits can both pass a stale check, but only one can win
//! the version race; the loser re-reads and re-checks, so a balance can
//! never be driven below zero.
//!
//! # Operations
//!
//! | Operation | Balance effect |
//! |-----------|----------------|
//! | [`credit`] | Adds funds (approved deposit, gateway callback) |
//! | [`debit`] | Removes funds; fails on insufficient balance |
//! | [`reverse`] | Posts the opposite of a completed entry |
//! | [`void`] | None; records a reference as `failed` |
//! | [`reconcile`] | None; audits balance against the journal |
//!
//! [`credit`]: Ledger::credit
//! [`debit`]: Ledger::debit
//! [`reverse`]: Ledger::reverse
//! [`void`]: Ledger::void
//! [`reconcile`]: Ledger::reconcile

use crate::LedgerError;
use crate::account::{Account, AccountStore};
use crate::base::{EntryId, Reference, UserId};
use crate::config::LedgerConfig;
use crate::entry::{EntryKind, EntryStatus, LedgerEntry};
use crate::journal::Journal;
use crate::notify::{LedgerEvent, NotificationSink};
use crossbeam::utils::Backoff;
use rust_decimal::Decimal;
use serde::Serialize;

/// Outcome of a successful posting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Receipt {
    /// The terminal journal entry recorded for the posting.
    pub entry: LedgerEntry,
    /// Whether the call replayed an earlier completed posting instead of
    /// applying a new one.
    pub replayed: bool,
}

/// Result of auditing one account against its journal entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reconciliation {
    /// The stored balance equals the sum of completed entries.
    Consistent { balance: Decimal },
    /// Balance and journal disagree: `expected` is the journal's sum,
    /// `actual` the stored balance.
    Drift { expected: Decimal, actual: Decimal },
}

impl Reconciliation {
    pub fn is_consistent(&self) -> bool {
        matches!(self, Reconciliation::Consistent { .. })
    }
}

/// How a reference claim resolved.
enum Claimed {
    /// A fresh pending entry was appended; the caller owns it.
    Fresh(EntryId),
    /// The reference already completed; the prior entry is the outcome.
    Replayed(LedgerEntry),
}

/// Wallet posting engine.
///
/// Owns the account store and the journal and keeps them consistent: a
/// posting either lands as one completed entry plus one balance swap, or
/// as a failed entry with the balance untouched.
///
/// # Invariants
///
/// - `balance >= 0` for every account, under any interleaving.
/// - At most one entry per external reference ever reaches `completed`.
/// - An account's balance equals the sum of its completed entries.
/// - `VersionConflict` is consumed by the retry loop and never returned.
pub struct Ledger {
    /// Wallet accounts, mutated only through compare-and-swap.
    accounts: AccountStore,
    /// Append-only entry log enforcing reference uniqueness.
    journal: Journal,
    config: LedgerConfig,
    sink: Option<Box<dyn NotificationSink>>,
}

impl Ledger {
    /// Creates a ledger with default tuning and no notification sink.
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::default())
    }

    /// Creates a ledger with the given tuning.
    pub fn with_config(config: LedgerConfig) -> Self {
        Self {
            accounts: AccountStore::new(),
            journal: Journal::new(),
            config,
            sink: None,
        }
    }

    /// Attaches a notification sink.
    ///
    /// The sink is handed an event after each terminal transition, outside
    /// the mutation path; its behavior can never roll back a posting.
    pub fn with_notifications(mut self, sink: impl NotificationSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Registers a wallet for a newly signed-up user. Idempotent.
    pub fn open_account(&self, user_id: UserId) -> Account {
        self.accounts.create(user_id)
    }

    /// Soft-archives a wallet. Postings in flight lose their version race
    /// and surface [`LedgerError::AccountArchived`].
    pub fn archive_account(&self, user_id: UserId) -> Result<(), LedgerError> {
        self.accounts.archive(user_id)
    }

    /// Returns a snapshot of the account.
    pub fn account(&self, user_id: UserId) -> Result<Account, LedgerError> {
        self.accounts.get(user_id)
    }

    /// Returns the current balance.
    pub fn balance(&self, user_id: UserId) -> Result<Decimal, LedgerError> {
        Ok(self.accounts.get(user_id)?.balance)
    }

    /// The user's statement, oldest first.
    pub fn entries(&self, user_id: UserId) -> Vec<LedgerEntry> {
        self.journal.entries_for(user_id)
    }

    /// Latest entry recorded under the reference.
    ///
    /// A caller that timed out can look up the true outcome of its retry
    /// reference here instead of assuming failure.
    pub fn find_by_reference(&self, reference: &Reference) -> Option<LedgerEntry> {
        self.journal.find_by_reference(reference)
    }

    /// Snapshots of every account, unordered.
    pub fn accounts(&self) -> Vec<Account> {
        self.accounts.accounts()
    }

    /// Most recent entries across all accounts, newest first.
    pub fn recent_entries(&self, limit: usize) -> Vec<LedgerEntry> {
        self.journal.recent(limit)
    }

    /// Completed total for one entry kind across all accounts
    /// (e.g. deposit revenue).
    pub fn completed_total(&self, kind: EntryKind) -> Decimal {
        self.journal.sum_completed_of_kind(kind)
    }

    /// Credits the wallet.
    ///
    /// The reference identifies the logical operation: retrying under the
    /// same reference replays the original outcome instead of applying a
    /// second credit. Callers own payload stability across retries.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] - `amount` is zero or negative.
    /// - [`LedgerError::NotFound`] - no account for `user_id`.
    /// - [`LedgerError::AccountArchived`] - wallet refuses new postings.
    /// - [`LedgerError::ContentionExceeded`] - retry budget exhausted.
    pub fn credit(
        &self,
        user_id: UserId,
        amount: Decimal,
        reference: Reference,
        kind: EntryKind,
    ) -> Result<Receipt, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        self.post(user_id, amount, reference, kind)
    }

    /// Debits the wallet.
    ///
    /// Sufficiency is checked against the freshly-read balance inside
    /// every compare-and-swap attempt, so concurrent debits can never
    /// overdraw. Fails with [`LedgerError::InsufficientFunds`] on any
    /// attempt that would go negative; replay semantics match
    /// [`credit`](Ledger::credit).
    pub fn debit(
        &self,
        user_id: UserId,
        amount: Decimal,
        reference: Reference,
        kind: EntryKind,
    ) -> Result<Receipt, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        self.post(user_id, -amount, reference, kind)
    }

    /// Posts the opposite of a completed entry under a fresh reference.
    ///
    /// Reversing a credit debits the wallet and may fail
    /// [`LedgerError::InsufficientFunds`] if the funds were already spent.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::EntryNotFound`] - no such entry.
    /// - [`LedgerError::NotReversible`] - the entry never completed.
    pub fn reverse(&self, entry_id: EntryId, reference: Reference) -> Result<Receipt, LedgerError> {
        let original = self.journal.get(entry_id).ok_or(LedgerError::EntryNotFound)?;
        if original.status != EntryStatus::Completed {
            return Err(LedgerError::NotReversible);
        }
        self.post(original.user_id, -original.amount, reference, EntryKind::Reversal)
    }

    /// Records the reference as `failed` without touching the balance.
    /// This is the admin-reject path for a reviewed deposit.
    ///
    /// Idempotent: rejecting an already-rejected reference is a no-op. A
    /// reference that already completed cannot be voided; money already
    /// applied is corrected by [`reverse`](Ledger::reverse), so the call
    /// fails with [`LedgerError::DuplicateReference`].
    pub fn void(
        &self,
        user_id: UserId,
        amount: Decimal,
        reference: Reference,
        kind: EntryKind,
    ) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        self.accounts.get(user_id)?;

        // Fast path: repeat rejects are no-ops, approved deposits refuse.
        if let Some(prior) = self.journal.find_by_reference(&reference) {
            match prior.status {
                EntryStatus::Failed => return Ok(()),
                EntryStatus::Completed => return Err(LedgerError::DuplicateReference),
                EntryStatus::Pending => {}
            }
        }

        match self.claim_reference(user_id, amount, reference, kind) {
            Claimed::Fresh(entry_id) => {
                if let Some(entry) = self.journal.mark_failed(entry_id) {
                    self.publish(&entry);
                }
                Ok(())
            }
            // A concurrent call completed this reference first.
            Claimed::Replayed(_) => Err(LedgerError::DuplicateReference),
        }
    }

    /// Audits one account: the stored balance must equal the sum of the
    /// journal's completed entries.
    ///
    /// An audit tool, never part of normal mutation. Meaningful when the
    /// account is quiescent: a posting caught between its balance swap
    /// and its terminal mark shows up as transient drift.
    pub fn reconcile(&self, user_id: UserId) -> Result<Reconciliation, LedgerError> {
        let account = self.accounts.get(user_id)?;
        let expected = self.journal.sum_completed(user_id);
        if expected == account.balance {
            Ok(Reconciliation::Consistent {
                balance: account.balance,
            })
        } else {
            Ok(Reconciliation::Drift {
                expected,
                actual: account.balance,
            })
        }
    }

    /// Applies a signed amount to the account, recording it in the journal.
    fn post(
        &self,
        user_id: UserId,
        amount: Decimal,
        reference: Reference,
        kind: EntryKind,
    ) -> Result<Receipt, LedgerError> {
        // Reject unknown or archived wallets before touching the journal,
        // so entries only ever exist for live accounts. Accounts are never
        // deleted, so the existence check cannot go stale mid-call.
        let account = self.accounts.get(user_id)?;
        if account.archived {
            return Err(LedgerError::AccountArchived);
        }

        let entry_id = match self.claim_reference(user_id, amount, reference, kind) {
            Claimed::Fresh(entry_id) => entry_id,
            Claimed::Replayed(entry) => {
                return Ok(Receipt {
                    entry,
                    replayed: true,
                });
            }
        };

        for _ in 0..self.config.max_retries {
            let snapshot = match self.accounts.get(user_id) {
                Ok(snapshot) => snapshot,
                Err(err) => return self.fail(entry_id, err),
            };
            if snapshot.archived {
                return self.fail(entry_id, LedgerError::AccountArchived);
            }
            let new_balance = snapshot.balance + amount;
            if new_balance < Decimal::ZERO {
                return self.fail(entry_id, LedgerError::InsufficientFunds);
            }
            match self
                .accounts
                .compare_and_swap_balance(user_id, snapshot.version, new_balance)
            {
                Ok(()) => return self.complete(entry_id),
                // Lost the race; take a fresh snapshot and re-check.
                Err(LedgerError::VersionConflict) => continue,
                Err(err) => return self.fail(entry_id, err),
            }
        }

        self.fail(entry_id, LedgerError::ContentionExceeded)
    }

    /// Claims the reference with a fresh pending entry, or resolves it to
    /// a prior completed outcome.
    ///
    /// A pending prior entry belongs to a call still in flight; it always
    /// reaches a terminal state before that call returns, so waiting here
    /// is short and bounded. A failed prior frees the reference for
    /// another attempt.
    fn claim_reference(
        &self,
        user_id: UserId,
        amount: Decimal,
        reference: Reference,
        kind: EntryKind,
    ) -> Claimed {
        let backoff = Backoff::new();
        loop {
            match self.journal.append(user_id, amount, kind, reference.clone()) {
                Ok(entry_id) => return Claimed::Fresh(entry_id),
                Err(_) => match self.journal.find_by_reference(&reference) {
                    Some(prior) if prior.status == EntryStatus::Completed => {
                        return Claimed::Replayed(prior);
                    }
                    Some(prior) if prior.status == EntryStatus::Pending => {
                        backoff.snooze();
                    }
                    // Failed, or the index moved under us: the reference
                    // is free again, take another crack at the append.
                    _ => {}
                },
            }
        }
    }

    /// Drives the entry terminal after a winning swap and publishes.
    fn complete(&self, entry_id: EntryId) -> Result<Receipt, LedgerError> {
        let entry = self
            .journal
            .mark_completed(entry_id)
            .ok_or(LedgerError::EntryNotFound)?;
        self.publish(&entry);
        Ok(Receipt {
            entry,
            replayed: false,
        })
    }

    /// Marks the entry failed, publishes, and propagates the error.
    fn fail(&self, entry_id: EntryId, err: LedgerError) -> Result<Receipt, LedgerError> {
        if let Some(entry) = self.journal.mark_failed(entry_id) {
            self.publish(&entry);
        }
        Err(err)
    }

    fn publish(&self, entry: &LedgerEntry) {
        if let Some(sink) = &self.sink {
            sink.publish(LedgerEvent::from(entry));
        }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
