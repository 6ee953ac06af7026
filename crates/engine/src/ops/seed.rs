//! Demo data for a fresh database.

use chrono::{Duration, Utc};
use sea_orm::{PaginatorTrait, TransactionTrait, prelude::*};

use crate::{
    Account, Money, ResultEngine, TopUpEvent, TopUpRule, Transaction, TransactionKind, accounts,
    password::hash_password, topup_events, topup_rules, transactions, users,
};

use super::{Engine, with_tx};

/// Email of the account used by the passwordless demo login.
pub const DEMO_EMAIL: &str = "demo@example.com";
/// Password of every seeded user.
pub const DEMO_PASSWORD: &str = "demo";

impl Engine {
    /// Seeds demo users, accounts, transactions, a top-up rule and one past
    /// top-up event. Does nothing if any user exists.
    ///
    /// Returns `true` if data was inserted.
    pub async fn seed_demo_data(&self) -> ResultEngine<bool> {
        with_tx!(self, |db_tx| {
            if users::Entity::find().count(&db_tx).await? > 0 {
                tracing::info!("database already contains data, skipping seeding");
                return Ok(false);
            }

            let password_hash = hash_password(DEMO_PASSWORD)?;
            let demo = self
                .insert_user(&db_tx, DEMO_EMAIL, "Demo User", &password_hash)
                .await?;
            let john = self
                .insert_user(&db_tx, "john@example.com", "John Doe", &password_hash)
                .await?;

            let demo_current =
                Account::new("Current Account".to_string(), Money::new(150_50), demo.id);
            let demo_savings =
                Account::new("Savings Account".to_string(), Money::new(1250_00), demo.id);
            let john_current =
                Account::new("Current Account".to_string(), Money::new(89_23), john.id);
            for account in [&demo_current, &demo_savings, &john_current] {
                accounts::ActiveModel::from(account).insert(&db_tx).await?;
            }

            let now = Utc::now();
            let samples = [
                (
                    demo_current.id,
                    25_50,
                    "Tesco",
                    "Weekly groceries",
                    "Groceries",
                    TransactionKind::Debit,
                    2,
                ),
                (
                    demo_current.id,
                    12_30,
                    "Costa Coffee",
                    "Morning coffee",
                    "Food & Drink",
                    TransactionKind::Debit,
                    1,
                ),
                (
                    demo_current.id,
                    500_00,
                    "Salary",
                    "Monthly salary",
                    "Income",
                    TransactionKind::Credit,
                    5,
                ),
                (
                    demo_savings.id,
                    100_00,
                    "Transfer",
                    "Monthly savings",
                    "Transfer",
                    TransactionKind::Credit,
                    1,
                ),
            ];
            for (account_id, amount, merchant, description, category, kind, days_ago) in samples {
                let tx = Transaction::new(
                    account_id,
                    kind,
                    Money::new(amount),
                    merchant.to_string(),
                    Some(description.to_string()),
                    Some(category.to_string()),
                    now - Duration::days(days_ago),
                )?;
                transactions::ActiveModel::from(&tx).insert(&db_tx).await?;
            }

            let rule = TopUpRule::new(demo_current.id, 1, Money::new(50_00), Money::new(100_00))?;
            topup_rules::ActiveModel::from(&rule).insert(&db_tx).await?;

            let event = TopUpEvent::new(
                demo_current.id,
                Some(rule.id),
                rule.topup_amount,
                Money::new(25_50),
                now - Duration::days(3),
            );
            topup_events::ActiveModel::from(&event).insert(&db_tx).await?;

            tracing::info!("demo data seeded");
            Ok(true)
        })
    }
}
