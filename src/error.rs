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

//! Error types for ledger operations.

use thiserror::Error;

/// Ledger operation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Amount is zero or negative
    #[error("invalid amount (must be positive)")]
    InvalidAmount,

    /// No account exists for the user
    #[error("account not found")]
    NotFound,

    /// Account was soft-archived and refuses new postings
    #[error("account is archived")]
    AccountArchived,

    /// Another writer bumped the account version first. Transient: the
    /// ledger retries it internally and never returns it from a posting.
    #[error("account version conflict")]
    VersionConflict,

    /// Compare-and-swap retry budget exhausted under contention
    #[error("contention exceeded, retry later")]
    ContentionExceeded,

    /// Debit would take the balance below zero
    #[error("insufficient wallet balance")]
    InsufficientFunds,

    /// Reference already carries a pending or completed entry
    #[error("duplicate external reference")]
    DuplicateReference,

    /// Referenced journal entry does not exist
    #[error("ledger entry not found")]
    EntryNotFound,

    /// Reversal target never completed
    #[error("only completed entries can be reversed")]
    NotReversible,
}
