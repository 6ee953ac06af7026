//! Top-up rules: "when the balance drops below `threshold`, add
//! `topup_amount`".
//!
//! Rules are evaluated in `position` order (per-account insertion sequence)
//! and the first breached, enabled rule wins.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Money, ResultEngine,
    util::{parse_uuid, require_positive},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopUpRule {
    pub id: Uuid,
    pub account_id: Uuid,
    pub position: i64,
    pub threshold: Money,
    pub topup_amount: Money,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl TopUpRule {
    pub fn new(
        account_id: Uuid,
        position: i64,
        threshold: Money,
        topup_amount: Money,
    ) -> ResultEngine<Self> {
        require_positive(topup_amount.minor(), "topup_amount")?;
        Ok(Self {
            id: Uuid::new_v4(),
            account_id,
            position,
            threshold,
            topup_amount,
            enabled: true,
            created_at: Utc::now(),
        })
    }

    /// Returns `true` if this rule fires for `balance`.
    ///
    /// The comparison is strict: a balance equal to the threshold does not
    /// trigger.
    pub fn is_breached_by(&self, balance: Money) -> bool {
        self.enabled && balance < self.threshold
    }

    /// Returns `true` if one top-up applied to `balance` still leaves the
    /// account below the threshold, so the next evaluation fires again.
    pub fn still_breached_after_topup(&self, balance: Money) -> bool {
        balance
            .checked_add(self.topup_amount)
            .is_some_and(|after| self.is_breached_by(after))
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "topup_rules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub account_id: String,
    pub position: i64,
    pub threshold: i64,
    pub topup_amount: i64,
    pub enabled: bool,
    pub created_at: DateTimeUtc,
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

impl From<&TopUpRule> for ActiveModel {
    fn from(rule: &TopUpRule) -> Self {
        Self {
            id: ActiveValue::Set(rule.id.to_string()),
            account_id: ActiveValue::Set(rule.account_id.to_string()),
            position: ActiveValue::Set(rule.position),
            threshold: ActiveValue::Set(rule.threshold.minor()),
            topup_amount: ActiveValue::Set(rule.topup_amount.minor()),
            enabled: ActiveValue::Set(rule.enabled),
            created_at: ActiveValue::Set(rule.created_at),
        }
    }
}

impl TryFrom<Model> for TopUpRule {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "topup rule")?,
            account_id: parse_uuid(&model.account_id, "account")?,
            position: model.position,
            threshold: Money::new(model.threshold),
            topup_amount: Money::new(model.topup_amount),
            enabled: model.enabled,
            created_at: model.created_at,
        })
    }
}
