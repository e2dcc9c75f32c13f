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

//! Core identifier types for accounts, entries, and external references.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a wallet owner.
///
/// Wraps a `u64`. The identity provider supplies it with every call; the
/// ledger never mints or authenticates one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a journal entry.
///
/// Allocated monotonically by the journal, so sorting by id recovers
/// append order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// External idempotency key for a posting.
///
/// Supplied by the caller and unique per logical operation: a shipment
/// tracking code, a deposit request id, or a payment gateway's own
/// transaction reference. Retrying a request under the same reference
/// replays the original outcome instead of applying twice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Reference(pub String);

impl Reference {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Reference {
    fn from(value: &str) -> Self {
        Reference(value.to_owned())
    }
}

impl From<String> for Reference {
    fn from(value: String) -> Self {
        Reference(value)
    }
}
