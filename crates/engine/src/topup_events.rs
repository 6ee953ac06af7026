//! Top-up events: the append-only audit trail of triggered top-ups.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{EngineError, Money, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopUpEvent {
    pub id: Uuid,
    pub account_id: Uuid,
    /// Rule that fired. `None` only for imported history.
    pub rule_id: Option<Uuid>,
    /// Amount added to the balance.
    pub amount: Money,
    /// Balance observed when the rule fired, before the top-up was applied.
    pub triggered_balance: Money,
    pub occurred_at: DateTime<Utc>,
}

impl TopUpEvent {
    pub fn new(
        account_id: Uuid,
        rule_id: Option<Uuid>,
        amount: Money,
        triggered_balance: Money,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            rule_id,
            amount,
            triggered_balance,
            occurred_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "topup_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub account_id: String,
    pub rule_id: Option<String>,
    pub amount_minor: i64,
    pub triggered_balance: i64,
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

impl From<&TopUpEvent> for ActiveModel {
    fn from(event: &TopUpEvent) -> Self {
        Self {
            id: ActiveValue::Set(event.id.to_string()),
            account_id: ActiveValue::Set(event.account_id.to_string()),
            rule_id: ActiveValue::Set(event.rule_id.map(|id| id.to_string())),
            amount_minor: ActiveValue::Set(event.amount.minor()),
            triggered_balance: ActiveValue::Set(event.triggered_balance.minor()),
            occurred_at: ActiveValue::Set(event.occurred_at),
        }
    }
}

impl TryFrom<Model> for TopUpEvent {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "topup event")?,
            account_id: parse_uuid(&model.account_id, "account")?,
            rule_id: model
                .rule_id
                .as_deref()
                .map(|id| parse_uuid(id, "topup rule"))
                .transpose()?,
            amount: Money::new(model.amount_minor),
            triggered_balance: Money::new(model.triggered_balance),
            occurred_at: model.occurred_at,
        })
    }
}
