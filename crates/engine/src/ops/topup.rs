use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Money, ResultEngine, SeaOrmStore, TopUpEvaluator, TopUpEvent, TopUpOutcome,
    TopUpRule, topup_events, topup_rules,
};

use super::{Engine, with_tx};

impl Engine {
    /// Adds an enabled rule at the end of the account's rule list.
    pub async fn new_topup_rule(
        &self,
        user_id: Uuid,
        account_id: Uuid,
        threshold: Money,
        topup_amount: Money,
    ) -> ResultEngine<TopUpRule> {
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, account_id, user_id).await?;

            let last_position = topup_rules::Entity::find()
                .filter(topup_rules::Column::AccountId.eq(account_id.to_string()))
                .order_by_desc(topup_rules::Column::Position)
                .one(&db_tx)
                .await?
                .map_or(0, |last| last.position);

            let rule = TopUpRule::new(
                account_id,
                last_position + 1,
                threshold,
                topup_amount,
            )?;
            topup_rules::ActiveModel::from(&rule).insert(&db_tx).await?;
            tracing::info!(
                %account_id,
                rule_id = %rule.id,
                threshold = %rule.threshold,
                topup_amount = %rule.topup_amount,
                "top-up rule created"
            );
            Ok(rule)
        })
    }

    /// Rules of the user's accounts (or of one account), in evaluation
    /// order per account.
    pub async fn topup_rules(
        &self,
        user_id: Uuid,
        account_id: Option<Uuid>,
    ) -> ResultEngine<Vec<TopUpRule>> {
        with_tx!(self, |db_tx| {
            let account_ids = self.owned_account_ids(&db_tx, user_id, account_id).await?;
            topup_rules::Entity::find()
                .filter(topup_rules::Column::AccountId.is_in(account_ids))
                .order_by_asc(topup_rules::Column::AccountId)
                .order_by_asc(topup_rules::Column::Position)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(TopUpRule::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Enables or disables a rule. This is the only mutation a rule allows.
    pub async fn set_topup_rule_enabled(
        &self,
        user_id: Uuid,
        rule_id: Uuid,
        enabled: bool,
    ) -> ResultEngine<TopUpRule> {
        with_tx!(self, |db_tx| {
            let model = topup_rules::Entity::find_by_id(rule_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("topup rule not exists".to_string()))?;
            let mut rule = TopUpRule::try_from(model)?;
            self.require_account(&db_tx, rule.account_id, user_id)
                .await
                .map_err(|err| match err {
                    EngineError::KeyNotFound(_) => {
                        EngineError::KeyNotFound("topup rule not exists".to_string())
                    }
                    other => other,
                })?;

            topup_rules::ActiveModel {
                id: ActiveValue::Set(rule.id.to_string()),
                enabled: ActiveValue::Set(enabled),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            rule.enabled = enabled;
            Ok(rule)
        })
    }

    /// Top-up history of the user's accounts (or of one account), newest
    /// first.
    pub async fn topup_events(
        &self,
        user_id: Uuid,
        account_id: Option<Uuid>,
    ) -> ResultEngine<Vec<TopUpEvent>> {
        with_tx!(self, |db_tx| {
            let account_ids = self.owned_account_ids(&db_tx, user_id, account_id).await?;
            topup_events::Entity::find()
                .filter(topup_events::Column::AccountId.is_in(account_ids))
                .order_by_desc(topup_events::Column::OccurredAt)
                .order_by_desc(topup_events::Column::Id)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(TopUpEvent::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Runs the top-up evaluation on demand.
    ///
    /// Unlike the evaluator itself, an account the user cannot see is an
    /// error here (`KeyNotFound`).
    pub async fn trigger_topup(
        &self,
        user_id: Uuid,
        account_id: Uuid,
    ) -> ResultEngine<TopUpOutcome> {
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, account_id, user_id).await?;
            let store = SeaOrmStore::new(&db_tx);
            let outcome = TopUpEvaluator::new(&store, &store, &store)
                .evaluate(account_id)
                .await?;
            Ok(outcome)
        })
    }
}
