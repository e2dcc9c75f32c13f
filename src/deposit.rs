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

//! Deposit approval workflow.
//!
//! Credits wallets for reviewed deposit requests and for payment-gateway
//! callbacks. The deposit id (or the gateway's own transaction reference)
//! doubles as the idempotency key, so duplicate admin clicks and
//! at-least-once webhook delivery replay the original outcome.

use crate::LedgerError;
use crate::base::{Reference, UserId};
use crate::config::FundingDetails;
use crate::entry::EntryKind;
use crate::ledger::{Ledger, Receipt};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// How the user says they funded the deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositMethod {
    Bank,
    Crypto,
    Card,
}

impl fmt::Display for DepositMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepositMethod::Bank => write!(f, "bank"),
            DepositMethod::Crypto => write!(f, "crypto"),
            DepositMethod::Card => write!(f, "card"),
        }
    }
}

/// A deposit request that passed human review.
///
/// The surrounding application stores and reviews the requests; this
/// workflow only consumes the reviewed artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositRequest {
    /// Doubles as the idempotency reference for the credit.
    pub deposit_id: Reference,
    pub user_id: UserId,
    pub amount: Decimal,
    pub method: DepositMethod,
    /// Receipt the depositor attached for review, if any.
    pub receipt_reference: Option<String>,
}

/// Credits wallets for approved deposits and gateway callbacks.
pub struct DepositWorkflow {
    ledger: Arc<Ledger>,
    funding: FundingDetails,
}

impl DepositWorkflow {
    pub fn new(ledger: Arc<Ledger>, funding: FundingDetails) -> Self {
        Self { ledger, funding }
    }

    /// Credits an approved deposit.
    ///
    /// Safe to invoke twice for the same deposit: double clicks and
    /// retried requests replay the first outcome.
    pub fn approve(&self, request: &DepositRequest) -> Result<Receipt, LedgerError> {
        self.ledger.credit(
            request.user_id,
            request.amount,
            request.deposit_id.clone(),
            EntryKind::Deposit,
        )
    }

    /// Rejects a reviewed deposit without touching the balance.
    ///
    /// Idempotent. Fails with [`LedgerError::DuplicateReference`] once the
    /// deposit has been approved; an approved deposit is corrected by
    /// reversal, never un-approved.
    pub fn reject(&self, request: &DepositRequest) -> Result<(), LedgerError> {
        self.ledger.void(
            request.user_id,
            request.amount,
            request.deposit_id.clone(),
            EntryKind::Deposit,
        )
    }

    /// Entry point for the payment gateway's server callback.
    ///
    /// Credits instantly under the gateway's own transaction reference; no
    /// human review. Safe under at-least-once delivery.
    pub fn gateway_deposit(
        &self,
        user_id: UserId,
        amount: Decimal,
        gateway_reference: Reference,
    ) -> Result<Receipt, LedgerError> {
        self.ledger.credit(user_id, amount, gateway_reference, EntryKind::Deposit)
    }

    /// Funding instructions to show a depositor.
    pub fn funding_details(&self) -> &FundingDetails {
        &self.funding
    }
}
