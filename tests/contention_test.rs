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

//! Contention tests: many threads posting against shared wallets.
//!
//! The retry budget is raised where a test requires every posting to land;
//! with the default budget a posting may legitimately bounce with
//! `ContentionExceeded`, and the assertion is that the books still balance.

use pacific_ledger_rs::{
    DepositMethod, DepositRequest, DepositWorkflow, EntryKind, FundingDetails, Ledger,
    LedgerConfig, LedgerError, Reference, UserId,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

/// Budget high enough that no posting in these tests can exhaust it.
fn patient_ledger() -> Arc<Ledger> {
    Arc::new(Ledger::with_config(LedgerConfig { max_retries: 1000 }))
}

/// Mixed credits and debits on one wallet; every posting must land.
#[test]
fn high_contention_single_wallet_stays_consistent() {
    const NUM_THREADS: usize = 16;
    const OPS_PER_THREAD: usize = 24;

    let ledger = patient_ledger();
    ledger.open_account(UserId(1));
    ledger
        .credit(UserId(1), dec!(100000.00), Reference::from("seed"), EntryKind::Deposit)
        .unwrap();

    let mut handles = Vec::with_capacity(NUM_THREADS);
    for t in 0..NUM_THREADS {
        let ledger = Arc::clone(&ledger);
        handles.push(thread::spawn(move || {
            for i in 0..OPS_PER_THREAD {
                let reference = Reference::from(format!("t{t}-op{i}"));
                // Alternate equal credits and debits; the seed is far too
                // large for any interleaving to run dry.
                let result = if i % 2 == 0 {
                    ledger.credit(UserId(1), dec!(10.00), reference, EntryKind::Deposit)
                } else {
                    ledger.debit(UserId(1), dec!(10.00), reference, EntryKind::ShipmentPayment)
                };
                result.expect("posting must land within the raised budget");
            }
        }));
    }
    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    assert_eq!(ledger.balance(UserId(1)).unwrap(), dec!(100000.00), "equal credits and debits");
    assert!(ledger.reconcile(UserId(1)).unwrap().is_consistent());
    assert_eq!(ledger.entries(UserId(1)).len(), NUM_THREADS * OPS_PER_THREAD + 1);

    println!(
        "Single-wallet contention test passed: {} threads x {} ops",
        NUM_THREADS, OPS_PER_THREAD
    );
}

/// With the default budget some postings may bounce; the balance must
/// still equal exactly the sum of the postings that completed.
#[test]
fn default_budget_bounces_still_reconcile() {
    const NUM_THREADS: usize = 12;
    const OPS_PER_THREAD: usize = 20;

    let ledger = Arc::new(Ledger::new());
    ledger.open_account(UserId(1));

    let completed = Arc::new(AtomicUsize::new(0));
    let mut handles = Vec::with_capacity(NUM_THREADS);
    for t in 0..NUM_THREADS {
        let ledger = Arc::clone(&ledger);
        let completed = Arc::clone(&completed);
        handles.push(thread::spawn(move || {
            for i in 0..OPS_PER_THREAD {
                let reference = Reference::from(format!("t{t}-dep{i}"));
                match ledger.credit(UserId(1), dec!(1.00), reference, EntryKind::Deposit) {
                    Ok(_) => {
                        completed.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(LedgerError::ContentionExceeded) => {}
                    Err(err) => panic!("unexpected posting error: {err}"),
                }
            }
        }));
    }
    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let landed = completed.load(Ordering::Relaxed);
    assert!(landed > 0, "some credits must get through");
    assert_eq!(
        ledger.balance(UserId(1)).unwrap(),
        Decimal::from(landed) * dec!(1.00),
        "balance equals exactly the credits that completed"
    );
    assert!(ledger.reconcile(UserId(1)).unwrap().is_consistent());

    println!(
        "Default-budget test passed: {}/{} credits landed",
        landed,
        NUM_THREADS * OPS_PER_THREAD
    );
}

/// Ten debits of `balance / 10 + 1` race one wallet; nine fit, the tenth
/// must bounce, and the wallet can never go negative.
#[test]
fn overdraw_storm_never_goes_negative() {
    const NUM_THREADS: usize = 10;

    for _ in 0..10 {
        let ledger = patient_ledger();
        ledger.open_account(UserId(1));
        ledger
            .credit(UserId(1), dec!(100.00), Reference::from("seed"), EntryKind::Deposit)
            .unwrap();

        let successes = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::with_capacity(NUM_THREADS);
        for t in 0..NUM_THREADS {
            let ledger = Arc::clone(&ledger);
            let successes = Arc::clone(&successes);
            handles.push(thread::spawn(move || {
                let reference = Reference::from(format!("bill-{t}"));
                match ledger.debit(UserId(1), dec!(11.00), reference, EntryKind::ShipmentPayment) {
                    Ok(_) => {
                        successes.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(LedgerError::InsufficientFunds) => {}
                    Err(err) => panic!("unexpected posting error: {err}"),
                }
            }));
        }
        for handle in handles {
            handle.join().expect("Thread panicked");
        }

        // 9 * 11.00 fits in 100.00, a tenth debit cannot.
        assert_eq!(successes.load(Ordering::Relaxed), 9, "exactly nine debits fit");
        let balance = ledger.balance(UserId(1)).unwrap();
        assert_eq!(balance, dec!(1.00));
        assert!(balance >= Decimal::ZERO, "balance went negative: {balance}");
        assert!(ledger.reconcile(UserId(1)).unwrap().is_consistent());
    }
}

/// Two admins approve the same deposit at once; the wallet gains exactly
/// one credit and both calls report success.
#[test]
fn duplicate_approval_race_credits_once() {
    for _ in 0..10 {
        let ledger = Arc::new(Ledger::new());
        ledger.open_account(UserId(1));
        let deposits = Arc::new(DepositWorkflow::new(Arc::clone(&ledger), FundingDetails::default()));

        let request = DepositRequest {
            deposit_id: Reference::from("dep-9"),
            user_id: UserId(1),
            amount: dec!(1000.00),
            method: DepositMethod::Bank,
            receipt_reference: None,
        };

        let mut handles = Vec::with_capacity(4);
        for _ in 0..4 {
            let deposits = Arc::clone(&deposits);
            let request = request.clone();
            handles.push(thread::spawn(move || deposits.approve(&request)));
        }

        let receipts: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().expect("Thread panicked").unwrap())
            .collect();

        // All callers get the outcome; exactly one actually applied it.
        let fresh = receipts.iter().filter(|receipt| !receipt.replayed).count();
        assert_eq!(fresh, 1, "exactly one approval may apply the credit");
        assert!(receipts.windows(2).all(|pair| pair[0].entry.id == pair[1].entry.id));

        assert_eq!(ledger.balance(UserId(1)).unwrap(), dec!(1000.00), "1000, not 2000");
        assert_eq!(ledger.entries(UserId(1)).len(), 1);
    }
}

/// Threads cycling over many wallets; every wallet must reconcile after.
#[test]
fn cross_wallet_storm_reconciles_everywhere() {
    const NUM_THREADS: usize = 20;
    const NUM_WALLETS: u64 = 10;
    const OPS_PER_THREAD: usize = 30;

    let ledger = patient_ledger();
    for user in 1..=NUM_WALLETS {
        ledger.open_account(UserId(user));
        ledger
            .credit(
                UserId(user),
                dec!(10000.00),
                Reference::from(format!("seed-{user}")),
                EntryKind::Deposit,
            )
            .unwrap();
    }

    let mut handles = Vec::with_capacity(NUM_THREADS);
    for t in 0..NUM_THREADS {
        let ledger = Arc::clone(&ledger);
        handles.push(thread::spawn(move || {
            for i in 0..OPS_PER_THREAD {
                let user = UserId(((t + i) as u64 % NUM_WALLETS) + 1);
                let reference = Reference::from(format!("t{t}-op{i}"));
                let result = match i % 3 {
                    0 => ledger.credit(user, dec!(5.00), reference, EntryKind::Deposit),
                    1 => ledger.debit(user, dec!(1.00), reference, EntryKind::ShipmentPayment),
                    _ => {
                        // Reads race the writers without disturbing them.
                        let _ = ledger.balance(user).unwrap();
                        ledger.credit(user, dec!(1.00), reference, EntryKind::Deposit)
                    }
                };
                result.expect("posting must land within the raised budget");
            }
        }));
    }
    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    for user in 1..=NUM_WALLETS {
        let report = ledger.reconcile(UserId(user)).unwrap();
        assert!(report.is_consistent(), "wallet {user} drifted: {report:?}");
        assert!(ledger.balance(UserId(user)).unwrap() >= Decimal::ZERO);
    }

    println!(
        "Cross-wallet storm passed: {} wallets, {} threads x {} ops",
        NUM_WALLETS, NUM_THREADS, OPS_PER_THREAD
    );
}
