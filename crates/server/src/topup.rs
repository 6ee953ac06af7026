//! Top-up rules, history and manual trigger endpoints

use api_types::{
    topup::{
        TopUpEventView, TopUpResult, TopUpRuleNew, TopUpRuleUpdate, TopUpRuleView, TriggerTopUp,
    },
    transaction::AccountFilter,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{Money, TopUpEvent, TopUpRule, User};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn rule_view(rule: TopUpRule) -> TopUpRuleView {
    TopUpRuleView {
        id: rule.id,
        account_id: rule.account_id,
        threshold_minor: rule.threshold.minor(),
        topup_amount_minor: rule.topup_amount.minor(),
        enabled: rule.enabled,
        created_at: rule.created_at,
    }
}

fn event_view(event: TopUpEvent) -> TopUpEventView {
    TopUpEventView {
        id: event.id,
        account_id: event.account_id,
        rule_id: event.rule_id,
        amount_minor: event.amount.minor(),
        triggered_balance_minor: event.triggered_balance.minor(),
        occurred_at: event.occurred_at,
    }
}

pub async fn list_rules(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(filter): Query<AccountFilter>,
) -> Result<Json<Vec<TopUpRuleView>>, ServerError> {
    let rules = state.engine.topup_rules(user.id, filter.account_id).await?;
    Ok(Json(rules.into_iter().map(rule_view).collect()))
}

pub async fn create_rule(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<TopUpRuleNew>,
) -> Result<(StatusCode, Json<TopUpRuleView>), ServerError> {
    let rule = state
        .engine
        .new_topup_rule(
            user.id,
            payload.account_id,
            Money::new(payload.threshold_minor),
            Money::new(payload.topup_amount_minor),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(rule_view(rule))))
}

pub async fn update_rule(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(rule_id): Path<Uuid>,
    Json(payload): Json<TopUpRuleUpdate>,
) -> Result<Json<TopUpRuleView>, ServerError> {
    let rule = state
        .engine
        .set_topup_rule_enabled(user.id, rule_id, payload.enabled)
        .await?;
    Ok(Json(rule_view(rule)))
}

pub async fn list_events(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(filter): Query<AccountFilter>,
) -> Result<Json<Vec<TopUpEventView>>, ServerError> {
    let events = state.engine.topup_events(user.id, filter.account_id).await?;
    Ok(Json(events.into_iter().map(event_view).collect()))
}

pub async fn trigger(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(query): Query<TriggerTopUp>,
) -> Result<Json<TopUpResult>, ServerError> {
    let outcome = state.engine.trigger_topup(user.id, query.account_id).await?;
    Ok(Json(TopUpResult {
        triggered: outcome.triggered(),
        message: outcome.message(),
    }))
}
