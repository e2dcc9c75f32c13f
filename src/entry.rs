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

//! Journal entries: the balance-affecting events of the ledger.

use crate::base::{EntryId, Reference, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a posting was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Wallet funding: an approved deposit request or a gateway callback.
    Deposit,
    /// Wallet spend: payment for a shipment, keyed by tracking code.
    ShipmentPayment,
    /// Correction posting the opposite of an earlier completed entry.
    Reversal,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Deposit => write!(f, "deposit"),
            EntryKind::ShipmentPayment => write!(f, "shipment_payment"),
            EntryKind::Reversal => write!(f, "reversal"),
        }
    }
}

/// Lifecycle of a journal entry.
///
/// `Pending` exists only while the originating call runs; every entry is
/// driven to `Completed` or `Failed` before control returns to the caller,
/// and a terminal entry never changes state again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Pending,
    Completed,
    Failed,
}

impl EntryStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, EntryStatus::Pending)
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryStatus::Pending => write!(f, "pending"),
            EntryStatus::Completed => write!(f, "completed"),
            EntryStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One balance-affecting event.
///
/// Amounts are signed: positive entries credit the wallet, negative
/// entries debit it. Only `completed` entries count toward a balance.
/// Entries are append-only; corrections are posted as new [`Reversal`]
/// entries, never edits.
///
/// [`Reversal`]: EntryKind::Reversal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub user_id: UserId,
    pub amount: Decimal,
    pub kind: EntryKind,
    pub reference: Reference,
    pub status: EntryStatus,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Whether the entry adds funds to the wallet.
    pub fn is_credit(&self) -> bool {
        self.amount > Decimal::ZERO
    }
}
