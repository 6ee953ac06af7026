//! Accounts API endpoints

use api_types::account::{AccountNew, AccountView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{Account, Money, User};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn account_view(account: Account) -> AccountView {
    AccountView {
        id: account.id,
        name: account.name,
        balance_minor: account.balance.minor(),
    }
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<AccountView>>, ServerError> {
    let accounts = state.engine.accounts(user.id).await?;
    Ok(Json(accounts.into_iter().map(account_view).collect()))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<AccountView>, ServerError> {
    let account = state.engine.account(account_id, user.id).await?;
    Ok(Json(account_view(account)))
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<AccountNew>,
) -> Result<(StatusCode, Json<AccountView>), ServerError> {
    let opening_balance = Money::new(payload.opening_balance_minor.unwrap_or(0));
    let account = state
        .engine
        .new_account(user.id, &payload.name, opening_balance)
        .await?;
    Ok((StatusCode::CREATED, Json(account_view(account))))
}
