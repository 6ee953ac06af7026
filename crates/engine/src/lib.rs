//! Domain engine of the top-up backend.
//!
//! - [`Engine`] runs every business operation (users, accounts, transactions,
//!   top-up rules and events) against a sea-orm database.
//! - [`TopUpEvaluator`] holds the auto top-up decision and talks to storage
//!   only through [`AccountStore`], [`RuleStore`] and [`EventStore`].
//!
//! Money is always [`Money`] (integer pence).

pub use accounts::Account;
pub use error::EngineError;
pub use money::Money;
pub use ops::{DEMO_EMAIL, DEMO_PASSWORD, Engine, EngineBuilder};
pub use store::{AccountStore, EventStore, RuleStore, SeaOrmStore};
pub use topup::{NotTriggered, TopUpEvaluator, TopUpOutcome};
pub use topup_events::TopUpEvent;
pub use topup_rules::TopUpRule;
pub use transactions::{NewTransaction, Transaction, TransactionKind};
pub use users::User;

mod accounts;
mod error;
mod money;
mod ops;
mod password;
mod store;
mod topup;
mod topup_events;
mod topup_rules;
mod transactions;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
