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

//! # Pacific Ledger
//!
//! This library provides a concurrency-safe wallet ledger for a
//! cargo-logistics platform: atomic balance credits and debits, idempotent
//! retries keyed by external reference, and race-free shipment-payment and
//! deposit-approval workflows.
//!
//! ## Core Components
//!
//! - [`Ledger`]: posting engine owning the account store and the journal
//! - [`AccountStore`]: versioned balances, mutated only by compare-and-swap
//! - [`Journal`]: append-only entry log enforcing reference uniqueness
//! - [`PaymentWorkflow`] / [`DepositWorkflow`]: the two business entry points
//! - [`LedgerError`]: error taxonomy for posting failures
//!
//! ## Example
//!
//! ```
//! use pacific_ledger_rs::{EntryKind, Ledger, Reference, UserId};
//! use rust_decimal_macros::dec;
//!
//! let ledger = Ledger::new();
//! ledger.open_account(UserId(1));
//!
//! // Admin approves a deposit.
//! ledger
//!     .credit(UserId(1), dec!(15000.00), Reference::from("dep-1"), EntryKind::Deposit)
//!     .unwrap();
//!
//! // The user pays for a shipment.
//! ledger
//!     .debit(
//!         UserId(1),
//!         dec!(10000.00),
//!         Reference::from("PCL-10480041"),
//!         EntryKind::ShipmentPayment,
//!     )
//!     .unwrap();
//!
//! assert_eq!(ledger.balance(UserId(1)).unwrap(), dec!(5000.00));
//! assert!(ledger.reconcile(UserId(1)).unwrap().is_consistent());
//! ```
//!
//! ## Concurrency
//!
//! Accounts are never locked by callers. A posting reads a versioned
//! snapshot and compare-and-swaps the new balance in; losing the race
//! re-reads and retries up to a configured budget. The journal's
//! uniqueness constraint on references makes a retried request replay its
//! original outcome instead of applying twice, which keeps duplicate admin
//! clicks and at-least-once gateway delivery safe.

pub mod account;
mod base;
pub mod config;
mod deposit;
mod entry;
pub mod error;
mod journal;
mod ledger;
mod notify;
mod payment;

pub use account::{Account, AccountStore};
pub use base::{EntryId, Reference, UserId};
pub use config::{FundingDetails, LedgerConfig};
pub use deposit::{DepositMethod, DepositRequest, DepositWorkflow};
pub use entry::{EntryKind, EntryStatus, LedgerEntry};
pub use error::LedgerError;
pub use journal::Journal;
pub use ledger::{Ledger, Receipt, Reconciliation};
pub use notify::{ChannelSink, LedgerEvent, NotificationSink};
pub use payment::{PaymentWorkflow, ShipmentCharge, ShipmentDirectory};
