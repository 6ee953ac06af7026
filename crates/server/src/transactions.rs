//! Transactions API endpoints

use api_types::{
    topup::TopUpResult,
    transaction::{
        AccountFilter, TransactionKind as ApiKind, TransactionNew, TransactionPosted,
        TransactionView,
    },
};
use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};
use engine::{Money, NewTransaction, Transaction, TransactionKind, User};

use crate::{ServerError, server::ServerState};

fn map_kind(kind: TransactionKind) -> ApiKind {
    match kind {
        TransactionKind::Debit => ApiKind::Debit,
        TransactionKind::Credit => ApiKind::Credit,
    }
}

fn transaction_view(tx: Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        account_id: tx.account_id,
        amount_minor: tx.amount_minor,
        merchant: tx.merchant,
        description: tx.description,
        category: tx.category,
        kind: map_kind(tx.kind),
        occurred_at: tx.occurred_at,
    }
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(filter): Query<AccountFilter>,
) -> Result<Json<Vec<TransactionView>>, ServerError> {
    let txs = state.engine.transactions(user.id, filter.account_id).await?;
    Ok(Json(txs.into_iter().map(transaction_view).collect()))
}

/// Categorizes and posts a transaction, then reports whether it caused a
/// top-up. Unknown or foreign accounts are rejected before the categorizer
/// is called.
pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionPosted>), ServerError> {
    state.engine.account(payload.account_id, user.id).await?;

    let category = state
        .categorizer
        .categorize(
            &payload.merchant,
            payload.description.as_deref(),
            payload.amount_minor,
            payload.kind,
        )
        .await;

    let kind = match payload.kind {
        ApiKind::Debit => TransactionKind::Debit,
        ApiKind::Credit => TransactionKind::Credit,
    };
    let (tx, outcome) = state
        .engine
        .post_transaction(
            user.id,
            NewTransaction {
                account_id: payload.account_id,
                amount: Money::new(payload.amount_minor),
                merchant: payload.merchant,
                description: payload.description,
                category: Some(category),
                kind,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TransactionPosted {
            transaction: transaction_view(tx),
            topup: TopUpResult {
                triggered: outcome.triggered(),
                message: outcome.message(),
            },
        }),
    ))
}
