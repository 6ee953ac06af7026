//! Transaction primitives.
//!
//! A `Transaction` is a posted debit or credit against one account. Posting
//! one moves the account balance and then runs the top-up evaluation.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Money, ResultEngine,
    util::{parse_uuid, require_positive},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Debit,
    Credit,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }

    /// Signed balance change for an amount of this kind.
    pub fn signed(self, amount: Money) -> Money {
        match self {
            Self::Debit => -amount,
            Self::Credit => amount,
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "debit" => Ok(Self::Debit),
            "credit" => Ok(Self::Credit),
            other => Err(EngineError::InvalidInput(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

/// Input for [`Engine::post_transaction`].
///
/// `category` is resolved by the caller (the categorization service) before
/// posting; the engine stores whatever it is given.
///
/// [`Engine::post_transaction`]: crate::Engine::post_transaction
#[derive(Clone, Debug)]
pub struct NewTransaction {
    pub account_id: Uuid,
    pub amount: Money,
    pub merchant: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub kind: TransactionKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub account_id: Uuid,
    pub amount_minor: i64,
    pub merchant: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub kind: TransactionKind,
    pub occurred_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        account_id: Uuid,
        kind: TransactionKind,
        amount: Money,
        merchant: String,
        description: Option<String>,
        category: Option<String>,
        occurred_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        require_positive(amount.minor(), "amount")?;
        Ok(Self {
            id: Uuid::new_v4(),
            account_id,
            amount_minor: amount.minor(),
            merchant,
            description,
            category,
            kind,
            occurred_at,
        })
    }

    pub fn amount(&self) -> Money {
        Money::new(self.amount_minor)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub account_id: String,
    pub amount_minor: i64,
    pub merchant: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub kind: String,
    pub occurred_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            account_id: ActiveValue::Set(tx.account_id.to_string()),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            merchant: ActiveValue::Set(tx.merchant.clone()),
            description: ActiveValue::Set(tx.description.clone()),
            category: ActiveValue::Set(tx.category.clone()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            occurred_at: ActiveValue::Set(tx.occurred_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            account_id: parse_uuid(&model.account_id, "account")?,
            amount_minor: model.amount_minor,
            merchant: model.merchant,
            description: model.description,
            category: model.category,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            occurred_at: model.occurred_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debit_is_negative_credit_is_positive() {
        let amount = Money::new(1230);
        assert_eq!(TransactionKind::Debit.signed(amount), Money::new(-1230));
        assert_eq!(TransactionKind::Credit.signed(amount), Money::new(1230));
    }

    #[test]
    fn rejects_non_positive_amount() {
        let err = Transaction::new(
            Uuid::new_v4(),
            TransactionKind::Debit,
            Money::ZERO,
            "Tesco".to_string(),
            None,
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err, EngineError::InvalidAmount("amount must be > 0".to_string()));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(TransactionKind::try_from("refund").is_err());
        assert_eq!(TransactionKind::try_from("credit").unwrap(), TransactionKind::Credit);
    }
}
