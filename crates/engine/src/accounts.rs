//! The module contains `Account` struct and its implementation.

use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine, util::parse_uuid};

/// An account.
///
/// Balances move through posted transactions and automatic top-ups.
/// `version` is bumped on every balance write and guards those writes
/// against concurrent updates (see [`AccountStore::update_balance`]).
///
/// [`AccountStore::update_balance`]: crate::AccountStore::update_balance
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub balance: Money,
    pub user_id: Uuid,
    pub version: i64,
}

impl Account {
    pub fn new(name: String, balance: Money, user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            balance,
            user_id,
            version: 0,
        }
    }

    /// Balance after applying a signed change, rejecting overflow.
    pub fn balance_after(&self, change: Money) -> ResultEngine<Money> {
        self.balance
            .checked_add(change)
            .ok_or_else(|| EngineError::InvalidAmount("balance overflow".to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub balance: i64,
    pub version: i64,
    pub user_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
    #[sea_orm(has_many = "super::topup_rules::Entity")]
    TopUpRules,
    #[sea_orm(has_many = "super::topup_events::Entity")]
    TopUpEvents,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::topup_rules::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TopUpRules.def()
    }
}

impl Related<super::topup_events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TopUpEvents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(value: &Account) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            name: ActiveValue::Set(value.name.clone()),
            balance: ActiveValue::Set(value.balance.minor()),
            version: ActiveValue::Set(value.version),
            user_id: ActiveValue::Set(value.user_id.to_string()),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "account")?,
            name: model.name,
            balance: Money::new(model.balance),
            user_id: parse_uuid(&model.user_id, "user")?,
            version: model.version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_round_trip_keeps_version() {
        let mut account = Account::new(
            "Current Account".to_string(),
            Money::new(15050),
            Uuid::new_v4(),
        );
        account.version = 3;

        let active: ActiveModel = (&account).into();
        let model = Model {
            id: active.id.unwrap(),
            name: active.name.unwrap(),
            balance: active.balance.unwrap(),
            version: active.version.unwrap(),
            user_id: active.user_id.unwrap(),
        };

        assert_eq!(Account::try_from(model).unwrap(), account);
    }

    #[test]
    fn balance_after_rejects_overflow() {
        let account = Account::new("Big".to_string(), Money::new(i64::MAX), Uuid::new_v4());
        assert!(account.balance_after(Money::new(1)).is_err());
        assert_eq!(
            account.balance_after(Money::new(-1)).unwrap(),
            Money::new(i64::MAX - 1)
        );
    }
}
