use chrono::Utc;
use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Account, AccountStore, NewTransaction, ResultEngine, SeaOrmStore, TopUpEvaluator,
    TopUpOutcome, Transaction, transactions,
    util::{normalize_optional, normalize_required},
};

use super::{Engine, with_tx};

impl Engine {
    /// Posts a debit or credit and then runs the top-up evaluation on the
    /// updated balance.
    ///
    /// Both happen in one DB transaction: if the evaluation fails, the
    /// posting is rolled back too. A concurrent balance write on the same
    /// account makes this fail with `Conflict` instead of losing an update.
    pub async fn post_transaction(
        &self,
        user_id: Uuid,
        new: NewTransaction,
    ) -> ResultEngine<(Transaction, TopUpOutcome)> {
        let merchant = normalize_required(&new.merchant, "merchant")?;
        let tx = Transaction::new(
            new.account_id,
            new.kind,
            new.amount,
            merchant,
            normalize_optional(new.description.as_deref()),
            normalize_optional(new.category.as_deref()),
            Utc::now(),
        )?;

        with_tx!(self, |db_tx| {
            let account = Account::try_from(
                self.require_account(&db_tx, new.account_id, user_id)
                    .await?,
            )?;
            let new_balance = account.balance_after(new.kind.signed(tx.amount()))?;

            let store = SeaOrmStore::new(&db_tx);
            store.update_balance(&account, new_balance).await?;
            transactions::ActiveModel::from(&tx).insert(&db_tx).await?;
            tracing::debug!(
                account_id = %account.id,
                transaction_id = %tx.id,
                kind = tx.kind.as_str(),
                %new_balance,
                "transaction posted"
            );

            let outcome = TopUpEvaluator::new(&store, &store, &store)
                .evaluate(account.id)
                .await?;
            Ok((tx, outcome))
        })
    }

    /// Transactions of the user's accounts (or of one account), newest first.
    pub async fn transactions(
        &self,
        user_id: Uuid,
        account_id: Option<Uuid>,
    ) -> ResultEngine<Vec<Transaction>> {
        with_tx!(self, |db_tx| {
            let account_ids = self.owned_account_ids(&db_tx, user_id, account_id).await?;
            transactions::Entity::find()
                .filter(transactions::Column::AccountId.is_in(account_ids))
                .order_by_desc(transactions::Column::OccurredAt)
                .order_by_desc(transactions::Column::Id)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Transaction::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }
}
