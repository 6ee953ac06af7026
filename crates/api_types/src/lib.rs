//! JSON bodies of the top-up HTTP API and of the categorization service.
//!
//! Every amount is sent as integer pence in a `*_minor` field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

pub mod auth {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SignUp {
        pub email: String,
        pub name: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Login {
        pub email: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Token {
        pub access_token: String,
        /// Always `bearer`.
        pub token_type: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub id: Uuid,
        pub email: String,
        pub name: String,
        pub created_at: DateTime<Utc>,
    }
}

pub mod account {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountNew {
        pub name: String,
        /// Defaults to zero.
        pub opening_balance_minor: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: Uuid,
        pub name: String,
        pub balance_minor: i64,
    }
}

pub mod transaction {
    use super::*;

    use crate::topup::TopUpResult;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        Debit,
        Credit,
    }

    /// Optional `?account_id=` filter of the list endpoints.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct AccountFilter {
        pub account_id: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub account_id: Uuid,
        /// Must be > 0. The kind defines the sign.
        pub amount_minor: i64,
        pub merchant: String,
        pub description: Option<String>,
        pub kind: TransactionKind,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub account_id: Uuid,
        pub amount_minor: i64,
        pub merchant: String,
        pub description: Option<String>,
        pub category: Option<String>,
        pub kind: TransactionKind,
        pub occurred_at: DateTime<Utc>,
    }

    /// Response of `POST /transactions`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionPosted {
        pub transaction: TransactionView,
        pub topup: TopUpResult,
    }
}

pub mod topup {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TopUpRuleNew {
        pub account_id: Uuid,
        pub threshold_minor: i64,
        pub topup_amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TopUpRuleUpdate {
        pub enabled: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TopUpRuleView {
        pub id: Uuid,
        pub account_id: Uuid,
        pub threshold_minor: i64,
        pub topup_amount_minor: i64,
        pub enabled: bool,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TopUpEventView {
        pub id: Uuid,
        pub account_id: Uuid,
        pub rule_id: Option<Uuid>,
        pub amount_minor: i64,
        /// Balance seen right before the top-up was applied.
        pub triggered_balance_minor: i64,
        pub occurred_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TopUpResult {
        pub triggered: bool,
        pub message: String,
    }

    /// Query of `POST /trigger-topup`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TriggerTopUp {
        pub account_id: Uuid,
    }
}

pub mod categorize {
    use super::*;

    pub use crate::transaction::TransactionKind;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategorizeRequest {
        pub merchant: String,
        pub amount_minor: i64,
        #[serde(default)]
        pub description: Option<String>,
        pub kind: TransactionKind,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategorizeResponse {
        pub category: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Health {
        pub status: String,
        pub service: String,
    }
}
