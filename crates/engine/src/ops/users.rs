use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Account, EngineError, Money, ResultEngine, User, accounts,
    password::{hash_password, verify_password},
    users,
    util::{normalize_email, normalize_required},
};

use super::{Engine, with_tx};

/// Accounts every new user starts with.
const DEFAULT_ACCOUNTS: [(&str, i64); 2] =
    [("Current Account", 100_00), ("Savings Account", 500_00)];

impl Engine {
    /// Registers a new user and opens the default accounts.
    ///
    /// Emails are unique case-insensitively.
    pub async fn sign_up(&self, email: &str, name: &str, password: &str) -> ResultEngine<User> {
        let email = normalize_email(email)?;
        let name = normalize_required(name, "name")?;
        let password_hash = hash_password(password)?;

        with_tx!(self, |db_tx| {
            let user = self
                .insert_user(&db_tx, &email, &name, &password_hash)
                .await?;
            for (account_name, balance) in DEFAULT_ACCOUNTS {
                let account = Account::new(account_name.to_string(), Money::new(balance), user.id);
                accounts::ActiveModel::from(&account).insert(&db_tx).await?;
            }
            tracing::info!(user_id = %user.id, "user signed up");
            Ok(user)
        })
    }

    /// Checks credentials. Unknown email and wrong password are
    /// indistinguishable to the caller.
    pub async fn authenticate(&self, email: &str, password: &str) -> ResultEngine<User> {
        let invalid = || EngineError::Unauthorized("incorrect email or password".to_string());
        let email = normalize_email(email).map_err(|_| invalid())?;

        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email.as_str()))
            .one(&self.database)
            .await?;
        let Some(model) = model else {
            tracing::warn!("login failed: unknown user");
            return Err(invalid());
        };
        if !verify_password(password, &model.password_hash) {
            tracing::warn!(user_id = %model.id, "login failed: bad password");
            return Err(invalid());
        }
        User::try_from(model)
    }

    /// Looks a user up by email, e.g. to resolve a bearer token subject.
    pub async fn user_by_email(&self, email: &str) -> ResultEngine<Option<User>> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email.trim().to_lowercase()))
            .one(&self.database)
            .await?
            .map(User::try_from)
            .transpose()
    }

    pub(super) async fn insert_user(
        &self,
        db: &DatabaseTransaction,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> ResultEngine<User> {
        let exists = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(db)
            .await?
            .is_some();
        if exists {
            return Err(EngineError::ExistingKey(email.to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        users::ActiveModel {
            id: ActiveValue::Set(user.id.to_string()),
            email: ActiveValue::Set(user.email.clone()),
            name: ActiveValue::Set(user.name.clone()),
            password_hash: ActiveValue::Set(password_hash.to_string()),
            created_at: ActiveValue::Set(user.created_at),
        }
        .insert(db)
        .await?;
        Ok(user)
    }
}
