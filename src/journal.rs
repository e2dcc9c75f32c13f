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

//! Append-only journal of ledger entries with reference deduplication.
//!
//! The journal owns the idempotency invariant: for any external reference,
//! at most one entry ever reaches `completed`. Uniqueness is enforced
//! atomically through the reference index's entry API, never by a
//! read-then-write check.

use crate::LedgerError;
use crate::base::{EntryId, Reference, UserId};
use crate::entry::{EntryKind, EntryStatus, LedgerEntry};
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe append-only entry log.
///
/// Combines a [`DashMap`] of entries with a reference index for O(1)
/// duplicate detection. Entries are never removed; terminal entries are
/// never edited.
#[derive(Debug)]
pub struct Journal {
    /// Entries indexed by id.
    entries: DashMap<EntryId, LedgerEntry>,

    /// Latest entry per reference; the uniqueness constraint lives here.
    by_reference: DashMap<Reference, EntryId>,

    /// Next entry id. Ids are monotonic, so sorting by id recovers
    /// append order.
    next_id: AtomicU64,
}

impl Journal {
    /// Creates an empty journal.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            by_reference: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Appends a `pending` entry for the reference.
    ///
    /// A reference whose latest entry is `failed` may be appended again:
    /// the failed entry stays in the journal and the index moves to the
    /// new one.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DuplicateReference`] if the reference
    /// already carries a `pending` or `completed` entry. The check and the
    /// insert happen under the same index slot, so two racing appends for
    /// one reference can never both succeed.
    pub fn append(
        &self,
        user_id: UserId,
        amount: Decimal,
        kind: EntryKind,
        reference: Reference,
    ) -> Result<EntryId, LedgerError> {
        match self.by_reference.entry(reference.clone()) {
            Entry::Occupied(mut slot) => {
                let prior = *slot.get();
                let retryable = self
                    .entries
                    .get(&prior)
                    .is_some_and(|entry| entry.status == EntryStatus::Failed);
                if !retryable {
                    return Err(LedgerError::DuplicateReference);
                }
                let id = self.insert_entry(user_id, amount, kind, reference);
                slot.insert(id);
                Ok(id)
            }
            Entry::Vacant(slot) => {
                let id = self.insert_entry(user_id, amount, kind, reference);
                slot.insert(id);
                Ok(id)
            }
        }
    }

    fn insert_entry(
        &self,
        user_id: UserId,
        amount: Decimal,
        kind: EntryKind,
        reference: Reference,
    ) -> EntryId {
        let id = EntryId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let entry = LedgerEntry {
            id,
            user_id,
            amount,
            kind,
            reference,
            status: EntryStatus::Pending,
            created_at: Utc::now(),
        };
        self.entries.insert(id, entry);
        id
    }

    /// Marks the entry `completed`.
    ///
    /// Returns the entry after the attempt. Repeating the call is a no-op
    /// that returns the same entry; an entry already `failed` is left
    /// untouched. `None` for an unknown id.
    pub fn mark_completed(&self, entry_id: EntryId) -> Option<LedgerEntry> {
        self.mark(entry_id, EntryStatus::Completed)
    }

    /// Marks the entry `failed`. Same no-op rules as [`mark_completed`].
    ///
    /// [`mark_completed`]: Journal::mark_completed
    pub fn mark_failed(&self, entry_id: EntryId) -> Option<LedgerEntry> {
        self.mark(entry_id, EntryStatus::Failed)
    }

    fn mark(&self, entry_id: EntryId, status: EntryStatus) -> Option<LedgerEntry> {
        let mut entry = self.entries.get_mut(&entry_id)?;
        if !entry.status.is_terminal() {
            entry.status = status;
        }
        Some(entry.clone())
    }

    /// Returns a snapshot of the entry.
    pub fn get(&self, entry_id: EntryId) -> Option<LedgerEntry> {
        self.entries.get(&entry_id).map(|entry| entry.clone())
    }

    /// Latest entry recorded under the reference.
    pub fn find_by_reference(&self, reference: &Reference) -> Option<LedgerEntry> {
        let id = *self.by_reference.get(reference)?;
        self.entries.get(&id).map(|entry| entry.clone())
    }

    /// Sum of `amount` over the user's completed entries.
    pub fn sum_completed(&self, user_id: UserId) -> Decimal {
        self.entries
            .iter()
            .filter(|entry| entry.user_id == user_id && entry.status == EntryStatus::Completed)
            .map(|entry| entry.amount)
            .sum()
    }

    /// Completed total across all users for one kind.
    pub fn sum_completed_of_kind(&self, kind: EntryKind) -> Decimal {
        self.entries
            .iter()
            .filter(|entry| entry.kind == kind && entry.status == EntryStatus::Completed)
            .map(|entry| entry.amount)
            .sum()
    }

    /// The user's statement, oldest first.
    pub fn entries_for(&self, user_id: UserId) -> Vec<LedgerEntry> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.clone())
            .collect();
        entries.sort_by_key(|entry| entry.id);
        entries
    }

    /// Most recent entries across all users, newest first.
    pub fn recent(&self, limit: usize) -> Vec<LedgerEntry> {
        let mut entries: Vec<_> = self.entries.iter().map(|entry| entry.clone()).collect();
        entries.sort_by_key(|entry| std::cmp::Reverse(entry.id));
        entries.truncate(limit);
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Journal {
    fn default() -> Self {
        Self::new()
    }
}
