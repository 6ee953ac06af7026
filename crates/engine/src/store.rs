//! Persistence seams used by the top-up evaluator.
//!
//! The evaluator only sees these traits; [`SeaOrmStore`] is the database
//! implementation and runs every call on the caller's open DB transaction so
//! a top-up commits or rolls back together with the operation that caused it.

use async_trait::async_trait;
use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    Account, EngineError, Money, ResultEngine, TopUpEvent, TopUpRule, accounts, topup_events,
    topup_rules,
};

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Loads an account, `None` if it does not exist.
    async fn account(&self, id: Uuid) -> ResultEngine<Option<Account>>;

    /// Writes `new_balance` if the stored version still matches
    /// `account.version`, bumping the version.
    ///
    /// Returns [`EngineError::Conflict`] when another writer got there first.
    async fn update_balance(&self, account: &Account, new_balance: Money) -> ResultEngine<()>;
}

#[async_trait]
pub trait RuleStore: Send + Sync {
    /// All rules of an account (enabled or not), in insertion order.
    async fn rules_for_account(&self, account_id: Uuid) -> ResultEngine<Vec<TopUpRule>>;
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn append_event(&self, event: &TopUpEvent) -> ResultEngine<()>;
}

/// Store backed by an open sea-orm transaction.
pub struct SeaOrmStore<'a> {
    db: &'a DatabaseTransaction,
}

impl<'a> SeaOrmStore<'a> {
    pub fn new(db: &'a DatabaseTransaction) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccountStore for SeaOrmStore<'_> {
    async fn account(&self, id: Uuid) -> ResultEngine<Option<Account>> {
        accounts::Entity::find_by_id(id.to_string())
            .one(self.db)
            .await?
            .map(Account::try_from)
            .transpose()
    }

    async fn update_balance(&self, account: &Account, new_balance: Money) -> ResultEngine<()> {
        let result = accounts::Entity::update_many()
            .col_expr(accounts::Column::Balance, Expr::value(new_balance.minor()))
            .col_expr(
                accounts::Column::Version,
                Expr::col(accounts::Column::Version).add(1),
            )
            .filter(accounts::Column::Id.eq(account.id.to_string()))
            .filter(accounts::Column::Version.eq(account.version))
            .exec(self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(EngineError::Conflict(format!(
                "account {} was modified concurrently",
                account.id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RuleStore for SeaOrmStore<'_> {
    async fn rules_for_account(&self, account_id: Uuid) -> ResultEngine<Vec<TopUpRule>> {
        topup_rules::Entity::find()
            .filter(topup_rules::Column::AccountId.eq(account_id.to_string()))
            .order_by_asc(topup_rules::Column::Position)
            .all(self.db)
            .await?
            .into_iter()
            .map(TopUpRule::try_from)
            .collect()
    }
}

#[async_trait]
impl EventStore for SeaOrmStore<'_> {
    async fn append_event(&self, event: &TopUpEvent) -> ResultEngine<()> {
        topup_events::ActiveModel::from(event).insert(self.db).await?;
        Ok(())
    }
}
