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

//! Shipment payment workflow.
//!
//! Pays for a shipment out of wallet funds. The tracking code doubles as
//! the idempotency reference, so a retried payment for the same shipment
//! can never debit twice.

use crate::LedgerError;
use crate::base::{Reference, UserId};
use crate::entry::EntryKind;
use crate::ledger::{Ledger, Receipt};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What the shipment store supplies for one payable shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentCharge {
    pub tracking_code: Reference,
    pub cost: Decimal,
}

/// External shipment collaborator.
///
/// Receives `mark_paid` after a successful debit. Must tolerate repeats:
/// a replayed payment marks the shipment paid again.
pub trait ShipmentDirectory: Send + Sync {
    fn mark_paid(&self, tracking_code: &Reference);
}

/// Debits wallets for shipment charges.
pub struct PaymentWorkflow {
    ledger: Arc<Ledger>,
    shipments: Arc<dyn ShipmentDirectory>,
}

impl PaymentWorkflow {
    pub fn new(ledger: Arc<Ledger>, shipments: Arc<dyn ShipmentDirectory>) -> Self {
        Self { ledger, shipments }
    }

    /// Debits the shipment's cost and marks the shipment paid.
    ///
    /// On [`LedgerError::InsufficientFunds`] the shipment is never marked
    /// paid and the error propagates so the caller can prompt the user to
    /// fund the wallet first. A replay still calls `mark_paid`: the
    /// original caller may have timed out before the instruction went out.
    pub fn pay_for_shipment(
        &self,
        user_id: UserId,
        charge: &ShipmentCharge,
    ) -> Result<Receipt, LedgerError> {
        let receipt = self.ledger.debit(
            user_id,
            charge.cost,
            charge.tracking_code.clone(),
            EntryKind::ShipmentPayment,
        )?;
        self.shipments.mark_paid(&charge.tracking_code);
        Ok(receipt)
    }
}
