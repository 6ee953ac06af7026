use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{Account, Money, ResultEngine, accounts, util::normalize_required};

use super::{Engine, with_tx};

impl Engine {
    /// Accounts owned by `user_id`, sorted by name.
    pub async fn accounts(&self, user_id: Uuid) -> ResultEngine<Vec<Account>> {
        accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id.to_string()))
            .order_by_asc(accounts::Column::Name)
            .order_by_asc(accounts::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }

    /// Return an account snapshot from DB.
    pub async fn account(&self, account_id: Uuid, user_id: Uuid) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, account_id, user_id).await?;
            Account::try_from(model)
        })
    }

    /// Opens a new account for `user_id` with an opening balance.
    pub async fn new_account(
        &self,
        user_id: Uuid,
        name: &str,
        opening_balance: Money,
    ) -> ResultEngine<Account> {
        let name = normalize_required(name, "account name")?;
        with_tx!(self, |db_tx| {
            let account = Account::new(name, opening_balance, user_id);
            accounts::ActiveModel::from(&account).insert(&db_tx).await?;
            Ok(account)
        })
    }
}
