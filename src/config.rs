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

//! Injected configuration.
//!
//! Everything the engine and workflows are tuned by arrives as plain
//! read-only values at construction; nothing reads ambient global state.

use serde::{Deserialize, Serialize};

/// Tuning for the posting retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Compare-and-swap attempts per posting before giving up with
    /// `ContentionExceeded`.
    pub max_retries: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self { max_retries: 5 }
    }
}

/// Funding instructions shown to depositors.
///
/// The operator's bank transfer details and crypto deposit address.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FundingDetails {
    pub bank_name: String,
    pub account_number: String,
    pub account_name: String,
    pub crypto_address: String,
}
