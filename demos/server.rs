//! Simple REST API server example for the wallet ledger.
//!
//! Run with: `cargo run --example server`
//!
//! ## Endpoints
//!
//! - `POST /accounts` - Open a wallet for a user
//! - `POST /shipments` - Register a payable shipment (tracking code + cost)
//! - `POST /operations` - Apply a wallet operation (approve/reject deposit,
//!   gateway deposit, pay shipment, reverse)
//! - `GET /accounts` - List all accounts
//! - `GET /accounts/:id` - Get an account by user ID
//! - `GET /accounts/:id/entries` - The user's statement
//! - `GET /accounts/:id/reconcile` - Audit the account against its journal
//! - `GET /shipments/:tracking` - Shipment charge and paid flag
//! - `GET /funding` - Funding instructions for depositors
//! - `GET /stats` - Deposit revenue and recent activity
//!
//! ## Example Usage
//!
//! ```bash
//! # Open a wallet
//! curl -X POST http://localhost:3000/accounts \
//!   -H "Content-Type: application/json" -d '{"user_id": 1}'
//!
//! # Approve a reviewed deposit
//! curl -X POST http://localhost:3000/operations \
//!   -H "Content-Type: application/json" \
//!   -d '{"type": "approve_deposit", "user_id": 1, "deposit_id": "dep-1", "amount": "15000.00", "method": "bank"}'
//!
//! # Register and pay a shipment
//! curl -X POST http://localhost:3000/shipments \
//!   -H "Content-Type: application/json" \
//!   -d '{"tracking_code": "PCL-10480041", "cost": "10000.00"}'
//! curl -X POST http://localhost:3000/operations \
//!   -H "Content-Type: application/json" \
//!   -d '{"type": "pay_shipment", "user_id": 1, "tracking_code": "PCL-10480041"}'
//!
//! # Audit
//! curl http://localhost:3000/accounts/1/reconcile
//! ```

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use pacific_ledger_rs::{
    ChannelSink, DepositMethod, DepositRequest, DepositWorkflow, EntryId, EntryKind, FundingDetails,
    Ledger, LedgerError, PaymentWorkflow, Reference, ShipmentCharge, ShipmentDirectory, UserId,
};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::thread;
use tokio::net::TcpListener;

// === Request/Response DTOs ===

/// Request body for wallet operations.
///
/// Uses a tagged enum for clean JSON representation:
/// ```json
/// {"type": "approve_deposit", "user_id": 1, "deposit_id": "dep-1", "amount": "500.00", "method": "bank"}
/// ```
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OperationRequest {
    ApproveDeposit {
        user_id: u64,
        deposit_id: String,
        amount: Decimal,
        method: DepositMethod,
        receipt_reference: Option<String>,
    },
    RejectDeposit {
        user_id: u64,
        deposit_id: String,
        amount: Decimal,
        method: DepositMethod,
        receipt_reference: Option<String>,
    },
    GatewayDeposit {
        user_id: u64,
        amount: Decimal,
        reference: String,
    },
    PayShipment {
        user_id: u64,
        tracking_code: String,
    },
    Reverse {
        entry_id: u64,
        reference: String,
    },
}

/// Request body for opening a wallet.
#[derive(Debug, Deserialize)]
pub struct OpenAccountRequest {
    pub user_id: u64,
}

/// Request body for registering a payable shipment.
#[derive(Debug, Deserialize)]
pub struct RegisterShipmentRequest {
    pub tracking_code: String,
    pub cost: Decimal,
}

/// Response body for shipment lookups.
#[derive(Debug, Serialize)]
pub struct ShipmentResponse {
    pub tracking_code: String,
    pub cost: Decimal,
    pub paid: bool,
}

/// Response body for the stats endpoint.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub accounts: usize,
    pub deposit_total: Decimal,
    pub recent: Vec<pacific_ledger_rs::LedgerEntry>,
}

/// Response body for errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// === Shipment directory ===

/// In-memory shipment store standing in for the real shipment service.
#[derive(Default)]
pub struct InMemoryShipments {
    charges: Mutex<HashMap<String, Decimal>>,
    paid: Mutex<HashSet<String>>,
}

impl InMemoryShipments {
    fn register(&self, tracking_code: String, cost: Decimal) {
        self.charges.lock().insert(tracking_code, cost);
    }

    fn charge(&self, tracking_code: &str) -> Option<ShipmentCharge> {
        self.charges.lock().get(tracking_code).map(|cost| ShipmentCharge {
            tracking_code: Reference::from(tracking_code),
            cost: *cost,
        })
    }

    fn is_paid(&self, tracking_code: &str) -> bool {
        self.paid.lock().contains(tracking_code)
    }
}

impl ShipmentDirectory for InMemoryShipments {
    fn mark_paid(&self, tracking_code: &Reference) {
        self.paid.lock().insert(tracking_code.as_str().to_owned());
    }
}

// === Application State ===

/// Shared application state wiring the ledger and its workflows.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger>,
    pub deposits: Arc<DepositWorkflow>,
    pub payments: Arc<PaymentWorkflow>,
    pub shipments: Arc<InMemoryShipments>,
}

// === Error Handling ===

/// Wrapper for converting `LedgerError` into HTTP responses.
pub struct AppError(LedgerError);

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            LedgerError::InvalidAmount => (StatusCode::BAD_REQUEST, "INVALID_AMOUNT"),
            LedgerError::NotFound => (StatusCode::NOT_FOUND, "ACCOUNT_NOT_FOUND"),
            LedgerError::AccountArchived => (StatusCode::FORBIDDEN, "ACCOUNT_ARCHIVED"),
            LedgerError::VersionConflict => {
                (StatusCode::INTERNAL_SERVER_ERROR, "VERSION_CONFLICT")
            }
            LedgerError::ContentionExceeded => {
                (StatusCode::SERVICE_UNAVAILABLE, "CONTENTION_EXCEEDED")
            }
            LedgerError::InsufficientFunds => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INSUFFICIENT_FUNDS")
            }
            LedgerError::DuplicateReference => (StatusCode::CONFLICT, "DUPLICATE_REFERENCE"),
            LedgerError::EntryNotFound => (StatusCode::NOT_FOUND, "ENTRY_NOT_FOUND"),
            LedgerError::NotReversible => (StatusCode::CONFLICT, "NOT_REVERSIBLE"),
        };

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

fn not_found(code: &str, message: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: message.to_string(),
            code: code.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

/// POST /accounts - Open a wallet.
async fn open_account(
    State(state): State<AppState>,
    Json(request): Json<OpenAccountRequest>,
) -> Response {
    let account = state.ledger.open_account(UserId(request.user_id));
    (StatusCode::CREATED, Json(account)).into_response()
}

/// POST /shipments - Register a payable shipment.
async fn register_shipment(
    State(state): State<AppState>,
    Json(request): Json<RegisterShipmentRequest>,
) -> StatusCode {
    state.shipments.register(request.tracking_code, request.cost);
    StatusCode::CREATED
}

/// POST /operations - Apply a wallet operation.
async fn apply_operation(
    State(state): State<AppState>,
    Json(request): Json<OperationRequest>,
) -> Response {
    match request {
        OperationRequest::ApproveDeposit {
            user_id,
            deposit_id,
            amount,
            method,
            receipt_reference,
        } => {
            let request = DepositRequest {
                deposit_id: Reference::from(deposit_id),
                user_id: UserId(user_id),
                amount,
                method,
                receipt_reference,
            };
            match state.deposits.approve(&request) {
                Ok(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
                Err(err) => AppError(err).into_response(),
            }
        }
        OperationRequest::RejectDeposit {
            user_id,
            deposit_id,
            amount,
            method,
            receipt_reference,
        } => {
            let request = DepositRequest {
                deposit_id: Reference::from(deposit_id),
                user_id: UserId(user_id),
                amount,
                method,
                receipt_reference,
            };
            match state.deposits.reject(&request) {
                Ok(()) => StatusCode::NO_CONTENT.into_response(),
                Err(err) => AppError(err).into_response(),
            }
        }
        OperationRequest::GatewayDeposit {
            user_id,
            amount,
            reference,
        } => {
            match state
                .deposits
                .gateway_deposit(UserId(user_id), amount, Reference::from(reference))
            {
                Ok(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
                Err(err) => AppError(err).into_response(),
            }
        }
        OperationRequest::PayShipment {
            user_id,
            tracking_code,
        } => {
            let Some(charge) = state.shipments.charge(&tracking_code) else {
                return not_found("SHIPMENT_NOT_FOUND", "Shipment not found");
            };
            match state.payments.pay_for_shipment(UserId(user_id), &charge) {
                Ok(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
                Err(err) => AppError(err).into_response(),
            }
        }
        OperationRequest::Reverse {
            entry_id,
            reference,
        } => {
            match state
                .ledger
                .reverse(EntryId(entry_id), Reference::from(reference))
            {
                Ok(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
                Err(err) => AppError(err).into_response(),
            }
        }
    }
}

/// GET /accounts/:id - Get account by user ID.
async fn get_account(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    match state.ledger.account(UserId(id)) {
        Ok(account) => Json(account).into_response(),
        Err(err) => AppError(err).into_response(),
    }
}

/// GET /accounts - List all accounts.
async fn list_accounts(State(state): State<AppState>) -> Response {
    let mut accounts = state.ledger.accounts();
    accounts.sort_by_key(|account| account.user_id);
    Json(accounts).into_response()
}

/// GET /accounts/:id/entries - The user's statement.
async fn list_entries(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    match state.ledger.account(UserId(id)) {
        Ok(_) => Json(state.ledger.entries(UserId(id))).into_response(),
        Err(err) => AppError(err).into_response(),
    }
}

/// GET /accounts/:id/reconcile - Audit the account.
async fn reconcile_account(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    match state.ledger.reconcile(UserId(id)) {
        Ok(report) => Json(report).into_response(),
        Err(err) => AppError(err).into_response(),
    }
}

/// GET /shipments/:tracking - Shipment charge and paid flag.
async fn get_shipment(State(state): State<AppState>, Path(tracking): Path<String>) -> Response {
    match state.shipments.charge(&tracking) {
        Some(charge) => Json(ShipmentResponse {
            paid: state.shipments.is_paid(&tracking),
            tracking_code: tracking,
            cost: charge.cost,
        })
        .into_response(),
        None => not_found("SHIPMENT_NOT_FOUND", "Shipment not found"),
    }
}

/// GET /funding - Funding instructions for depositors.
async fn funding_details(State(state): State<AppState>) -> Json<FundingDetails> {
    Json(state.deposits.funding_details().clone())
}

/// GET /stats - Deposit revenue and recent activity.
async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        accounts: state.ledger.accounts().len(),
        deposit_total: state.ledger.completed_total(EntryKind::Deposit),
        recent: state.ledger.recent_entries(20),
    })
}

// === Router ===

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/accounts", post(open_account).get(list_accounts))
        .route("/accounts/{id}", get(get_account))
        .route("/accounts/{id}/entries", get(list_entries))
        .route("/accounts/{id}/reconcile", get(reconcile_account))
        .route("/shipments", post(register_shipment))
        .route("/shipments/{tracking}", get(get_shipment))
        .route("/operations", post(apply_operation))
        .route("/funding", get(funding_details))
        .route("/stats", get(stats))
        .with_state(state)
}

// === Main ===

#[tokio::main]
async fn main() {
    let (sink, events) = ChannelSink::bounded(256);
    let ledger = Arc::new(Ledger::new().with_notifications(sink));

    // Drain notifications the way the real app would push them to users.
    thread::spawn(move || {
        for event in events {
            println!(
                "[notify] user {} {} {} {} ({})",
                event.user_id, event.kind, event.status, event.amount, event.reference
            );
        }
    });

    let funding = FundingDetails {
        bank_name: "Pacific Bank".to_string(),
        account_number: "1234567890".to_string(),
        account_name: "Pacific Cargo Logistics Ltd".to_string(),
        crypto_address: "bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh".to_string(),
    };

    let shipments = Arc::new(InMemoryShipments::default());
    let state = AppState {
        deposits: Arc::new(DepositWorkflow::new(Arc::clone(&ledger), funding)),
        payments: Arc::new(PaymentWorkflow::new(
            Arc::clone(&ledger),
            Arc::clone(&shipments) as Arc<dyn ShipmentDirectory>,
        )),
        ledger,
        shipments,
    };

    let app = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:3000").await.unwrap();
    println!("Wallet ledger API running on http://127.0.0.1:3000");
    println!();
    println!("Endpoints:");
    println!("  POST /accounts                 - Open a wallet");
    println!("  POST /shipments                - Register a payable shipment");
    println!("  POST /operations               - Apply a wallet operation");
    println!("  GET  /accounts                 - List all accounts");
    println!("  GET  /accounts/:id             - Get account by user ID");
    println!("  GET  /accounts/:id/entries     - The user's statement");
    println!("  GET  /accounts/:id/reconcile   - Audit the account");
    println!("  GET  /funding                  - Funding instructions");
    println!("  GET  /stats                    - Revenue and recent activity");

    axum::serve(listener, app).await.unwrap();
}
