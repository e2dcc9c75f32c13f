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

//! Notification publishing.
//!
//! The ledger publishes an event after each terminal transition so the
//! surrounding application can message users and admins. Publishing is
//! fire-and-forget and sits outside the mutation path: a slow, full, or
//! disconnected consumer never blocks or rolls back a posting.

use crate::base::{EntryId, Reference, UserId};
use crate::entry::{EntryKind, EntryStatus, LedgerEntry};
use crossbeam::channel::{Receiver, Sender, bounded};
use rust_decimal::Decimal;
use serde::Serialize;

/// Snapshot of a terminal journal entry, delivered to consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerEvent {
    pub user_id: UserId,
    pub entry_id: EntryId,
    pub reference: Reference,
    pub kind: EntryKind,
    pub status: EntryStatus,
    pub amount: Decimal,
}

impl From<&LedgerEntry> for LedgerEvent {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            user_id: entry.user_id,
            entry_id: entry.id,
            reference: entry.reference.clone(),
            kind: entry.kind,
            status: entry.status,
            amount: entry.amount,
        }
    }
}

/// Consumer-facing sink for ledger events.
///
/// `publish` is called after the balance mutation is already final;
/// implementations must not block.
pub trait NotificationSink: Send + Sync {
    fn publish(&self, event: LedgerEvent);
}

/// Sink backed by a bounded crossbeam channel.
///
/// `publish` uses `try_send`: when the consumer is full or gone the event
/// is dropped rather than ever stalling a posting.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: Sender<LedgerEvent>,
}

impl ChannelSink {
    /// Creates a sink and the receiver its events arrive on.
    pub fn bounded(capacity: usize) -> (Self, Receiver<LedgerEvent>) {
        let (sender, receiver) = bounded(capacity);
        (Self { sender }, receiver)
    }
}

impl NotificationSink for ChannelSink {
    fn publish(&self, event: LedgerEvent) {
        let _ = self.sender.try_send(event);
    }
}
