use sea_orm::{DatabaseConnection, DatabaseTransaction, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

mod accounts;
mod seed;
mod topup;
mod transactions;
mod users;

pub use seed::{DEMO_EMAIL, DEMO_PASSWORD};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Entry point for every business operation.
///
/// Each public method runs in its own DB transaction and takes the acting
/// user's id; accounts owned by somebody else look exactly like missing ones.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Loads an account owned by `user_id`, or `KeyNotFound`.
    pub(super) async fn require_account(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
        user_id: Uuid,
    ) -> ResultEngine<crate::accounts::Model> {
        crate::accounts::Entity::find_by_id(account_id.to_string())
            .filter(crate::accounts::Column::UserId.eq(user_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))
    }

    /// Ids of every account owned by `user_id`, optionally narrowed to one.
    ///
    /// Narrowing to an account the user does not own is `KeyNotFound`.
    pub(super) async fn owned_account_ids(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
        account_id: Option<Uuid>,
    ) -> ResultEngine<Vec<String>> {
        if let Some(account_id) = account_id {
            let model = self.require_account(db, account_id, user_id).await?;
            return Ok(vec![model.id]);
        }
        Ok(crate::accounts::Entity::find()
            .filter(crate::accounts::Column::UserId.eq(user_id.to_string()))
            .all(db)
            .await?
            .into_iter()
            .map(|model| model.id)
            .collect())
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
