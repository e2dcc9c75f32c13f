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

use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use pacific_ledger_rs::{EntryKind, Ledger, LedgerError, Reconciliation, Reference, UserId};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;

/// Wallet Ledger - Replay wallet operation CSV files
///
/// Reads wallet operations from a CSV file and outputs final account
/// balances to stdout. Supports deposits, shipment payments, and reversals.
#[derive(Parser, Debug)]
#[command(name = "pacific-ledger-rs")]
#[command(about = "A wallet ledger that replays operation CSVs", long_about = None)]
struct Args {
    /// Path to CSV file with wallet operations
    ///
    /// Expected format: op,user,amount,reference
    /// Example: cargo run -- operations.csv > balances.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Reconcile every account after the replay.
    ///
    /// Drift is reported on stderr and the process exits with status 2.
    #[arg(long)]
    audit: bool,
}

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // Open input file
    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    // Replay operations from CSV
    let ledger = match replay_operations(BufReader::new(file)) {
        Ok(ledger) => ledger,
        Err(e) => {
            eprintln!("Error replaying operations: {}", e);
            process::exit(1);
        }
    };

    // Write results to stdout
    if let Err(e) = write_balances(&ledger, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }

    if args.audit && !audit(&ledger) {
        process::exit(2);
    }
}

/// Raw CSV record matching the input format.
///
/// Fields: `op, user, amount, reference`
#[derive(Debug, Deserialize)]
struct CsvRecord {
    op: String,
    user: u64,
    #[serde(deserialize_with = "csv::invalid_option")]
    amount: Option<Decimal>,
    reference: String,
}

/// One wallet operation parsed from a CSV row.
#[derive(Debug)]
enum Operation {
    Deposit {
        user_id: UserId,
        amount: Decimal,
        reference: Reference,
    },
    Payment {
        user_id: UserId,
        amount: Decimal,
        reference: Reference,
    },
    Reverse {
        user_id: UserId,
        reference: Reference,
    },
}

impl Operation {
    fn reference(&self) -> &Reference {
        match self {
            Operation::Deposit { reference, .. }
            | Operation::Payment { reference, .. }
            | Operation::Reverse { reference, .. } => reference,
        }
    }
}

impl CsvRecord {
    /// Converts a CSV record to an operation.
    ///
    /// Returns `None` for unknown operations or missing required fields.
    fn into_operation(self) -> Option<Operation> {
        let user_id = UserId(self.user);
        let reference = Reference::from(self.reference);

        match self.op.to_lowercase().as_str() {
            "deposit" => {
                let amount = self.amount?;
                Some(Operation::Deposit {
                    user_id,
                    amount,
                    reference,
                })
            }
            "payment" => {
                let amount = self.amount?;
                Some(Operation::Payment {
                    user_id,
                    amount,
                    reference,
                })
            }
            "reverse" => Some(Operation::Reverse { user_id, reference }),
            _ => None,
        }
    }
}

fn apply(ledger: &Ledger, op: &Operation) -> Result<(), LedgerError> {
    match op {
        Operation::Deposit {
            user_id,
            amount,
            reference,
        } => {
            ledger.open_account(*user_id);
            ledger.credit(*user_id, *amount, reference.clone(), EntryKind::Deposit)?;
        }
        Operation::Payment {
            user_id,
            amount,
            reference,
        } => {
            ledger.open_account(*user_id);
            ledger.debit(*user_id, *amount, reference.clone(), EntryKind::ShipmentPayment)?;
        }
        Operation::Reverse { user_id, reference } => {
            // Reverse rows name the original reference; the reversal posts
            // under a derived "rev-" reference of its own.
            let original = ledger
                .find_by_reference(reference)
                .filter(|entry| entry.user_id == *user_id)
                .ok_or(LedgerError::EntryNotFound)?;
            ledger.reverse(original.id, Reference::from(format!("rev-{reference}")))?;
        }
    }
    Ok(())
}

/// Replay wallet operations from a CSV reader.
///
/// This function uses streaming parsing to handle arbitrarily large CSV
/// files without loading the entire file into memory. Accounts are opened
/// on first use; malformed rows and failed operations are skipped.
///
/// # CSV Format
///
/// Expected columns: `op, user, amount, reference`
/// - `op`: Operation (deposit, payment, reverse)
/// - `user`: Wallet owner ID (u64)
/// - `amount`: Decimal amount (ignored for reverse)
/// - `reference`: External reference; for reverse, the reference of the
///   entry to reverse
///
/// # Example
///
/// ```csv
/// op,user,amount,reference
/// deposit,1,15000.00,dep-1
/// payment,1,10000.00,PCL-10480041
/// reverse,1,,PCL-10480041
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the CSV structure is
/// invalid. Individual operation errors are logged in debug mode but
/// don't stop the replay.
pub fn replay_operations<R: Read>(reader: R) -> Result<Ledger, csv::Error> {
    let ledger = Ledger::new();

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All) // Handle whitespace in fields like " deposit "
        .flexible(true) // Allow missing amount field
        .has_headers(true) // Skip first row as header
        .from_reader(reader);

    for result in rdr.deserialize::<CsvRecord>() {
        match result {
            Ok(record) => {
                let Some(op) = record.into_operation() else {
                    #[cfg(debug_assertions)]
                    eprintln!("Skipping invalid operation record");
                    continue;
                };

                // Apply the operation, ignoring errors (silent failure)
                if let Err(e) = apply(&ledger, &op) {
                    #[cfg(debug_assertions)]
                    eprintln!("Skipping {}: {}", op.reference(), e);
                }
            }
            Err(e) => {
                // Skip malformed rows
                #[cfg(debug_assertions)]
                eprintln!("Skipping malformed row: {}", e);
                continue;
            }
        }
    }

    Ok(ledger)
}

/// Write account balances to a CSV writer.
///
/// Outputs all accounts sorted by user id, balances rounded to 2 decimal
/// places.
///
/// # CSV Format
///
/// Columns: `user, balance, version, archived`
///
/// # Example
///
/// ```csv
/// user,balance,version,archived
/// 1,5000.00,2,false
/// 2,15000.00,1,false
/// ```
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_balances<W: Write>(ledger: &Ledger, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    let mut accounts = ledger.accounts();
    accounts.sort_by_key(|account| account.user_id);
    for account in &accounts {
        wtr.serialize(account)?;
    }

    // Flush to ensure all data is written
    wtr.flush()?;
    Ok(())
}

/// Reconciles every account, reporting drift on stderr.
///
/// Returns `true` when every account's balance matches its journal.
pub fn audit(ledger: &Ledger) -> bool {
    let mut clean = true;
    let mut accounts = ledger.accounts();
    accounts.sort_by_key(|account| account.user_id);
    for account in &accounts {
        match ledger.reconcile(account.user_id) {
            Ok(Reconciliation::Consistent { .. }) => {}
            Ok(Reconciliation::Drift { expected, actual }) => {
                eprintln!(
                    "drift on account {}: journal says {}, balance says {}",
                    account.user_id, expected, actual
                );
                clean = false;
            }
            Err(e) => {
                eprintln!("audit failed for account {}: {}", account.user_id, e);
                clean = false;
            }
        }
    }
    clean
}
