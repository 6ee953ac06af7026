//! Automatic top-up evaluation.
//!
//! After a balance moves, [`TopUpEvaluator::evaluate`] scans the account's
//! enabled rules in insertion order and applies the **first** one whose
//! threshold is breached: the balance is credited with the rule's amount and a
//! [`TopUpEvent`] recording the pre-top-up balance is appended. At most one
//! rule fires per evaluation.
//!
//! Evaluation is not idempotent: if a top-up leaves the balance below the
//! threshold, evaluating again fires the rule again.

use chrono::Utc;
use uuid::Uuid;

use crate::{AccountStore, EventStore, Money, ResultEngine, RuleStore, TopUpEvent};

/// Why an evaluation did not top up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotTriggered {
    AccountNotFound,
    NoRuleMatched,
}

/// Result of one evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TopUpOutcome {
    Triggered {
        event: TopUpEvent,
        new_balance: Money,
    },
    NotTriggered(NotTriggered),
}

impl TopUpOutcome {
    pub fn triggered(&self) -> bool {
        matches!(self, Self::Triggered { .. })
    }

    /// Human readable summary, shown to the user as-is.
    pub fn message(&self) -> String {
        match self {
            Self::Triggered { event, new_balance } => format!(
                "TopUp of {} triggered. New balance: {}",
                event.amount, new_balance
            ),
            Self::NotTriggered(NotTriggered::AccountNotFound) => "Account not found".to_string(),
            Self::NotTriggered(NotTriggered::NoRuleMatched) => {
                "No topup rules triggered".to_string()
            }
        }
    }

    pub fn event(&self) -> Option<&TopUpEvent> {
        match self {
            Self::Triggered { event, .. } => Some(event),
            Self::NotTriggered(_) => None,
        }
    }
}

/// Applies top-up rules to one account through injected stores.
///
/// The caller is responsible for authorizing access to the account.
pub struct TopUpEvaluator<'a> {
    accounts: &'a dyn AccountStore,
    rules: &'a dyn RuleStore,
    events: &'a dyn EventStore,
}

impl<'a> TopUpEvaluator<'a> {
    pub fn new(
        accounts: &'a dyn AccountStore,
        rules: &'a dyn RuleStore,
        events: &'a dyn EventStore,
    ) -> Self {
        Self {
            accounts,
            rules,
            events,
        }
    }

    /// Evaluates the account's rules and applies the first breached one.
    ///
    /// A missing account is reported as [`NotTriggered::AccountNotFound`]
    /// without touching the stores. Store failures and version conflicts
    /// are returned as errors.
    pub async fn evaluate(&self, account_id: Uuid) -> ResultEngine<TopUpOutcome> {
        let Some(account) = self.accounts.account(account_id).await? else {
            tracing::debug!(%account_id, "top-up skipped: account not found");
            return Ok(TopUpOutcome::NotTriggered(NotTriggered::AccountNotFound));
        };

        let rules = self.rules.rules_for_account(account_id).await?;
        let Some(rule) = rules
            .iter()
            .filter(|rule| rule.enabled)
            .find(|rule| rule.is_breached_by(account.balance))
        else {
            return Ok(TopUpOutcome::NotTriggered(NotTriggered::NoRuleMatched));
        };

        let new_balance = account.balance_after(rule.topup_amount)?;
        self.accounts.update_balance(&account, new_balance).await?;

        let event = TopUpEvent::new(
            account.id,
            Some(rule.id),
            rule.topup_amount,
            account.balance,
            Utc::now(),
        );
        self.events.append_event(&event).await?;

        tracing::info!(
            %account_id,
            rule_id = %rule.id,
            triggered_balance = %account.balance,
            amount = %rule.topup_amount,
            %new_balance,
            "top-up triggered"
        );
        if rule.still_breached_after_topup(account.balance) {
            tracing::warn!(
                %account_id,
                rule_id = %rule.id,
                "top-up amount does not lift balance above threshold, rule will fire again"
            );
        }

        Ok(TopUpOutcome::Triggered { event, new_balance })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use sea_orm::DbErr;

    use super::*;
    use crate::{Account, EngineError, TopUpRule};

    /// In-memory stand-in for the three stores, with write counters and an
    /// optional failure switch.
    #[derive(Default)]
    struct MemoryStore {
        accounts: Mutex<Vec<Account>>,
        rules: Mutex<Vec<TopUpRule>>,
        events: Mutex<Vec<TopUpEvent>>,
        balance_writes: Mutex<usize>,
        fail_reads: bool,
        fail_event_append: bool,
    }

    impl MemoryStore {
        fn with_account(balance: i64) -> (Self, Uuid) {
            let account = Account::new(
                "Current Account".to_string(),
                Money::new(balance),
                Uuid::new_v4(),
            );
            let id = account.id;
            let store = Self::default();
            store.accounts.lock().unwrap().push(account);
            (store, id)
        }

        fn add_rule(&self, account_id: Uuid, threshold: i64, amount: i64, enabled: bool) -> Uuid {
            let mut rules = self.rules.lock().unwrap();
            let position = rules.len() as i64 + 1;
            let mut rule =
                TopUpRule::new(account_id, position, Money::new(threshold), Money::new(amount))
                    .unwrap();
            rule.enabled = enabled;
            let id = rule.id;
            rules.push(rule);
            id
        }

        fn balance(&self, id: Uuid) -> Money {
            self.accounts
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.id == id)
                .unwrap()
                .balance
        }

        fn evaluator(&self) -> TopUpEvaluator<'_> {
            TopUpEvaluator::new(self, self, self)
        }
    }

    #[async_trait]
    impl AccountStore for MemoryStore {
        async fn account(&self, id: Uuid) -> ResultEngine<Option<Account>> {
            if self.fail_reads {
                return Err(DbErr::Custom("store unavailable".to_string()).into());
            }
            Ok(self.accounts.lock().unwrap().iter().find(|a| a.id == id).cloned())
        }

        async fn update_balance(&self, account: &Account, new_balance: Money) -> ResultEngine<()> {
            let mut accounts = self.accounts.lock().unwrap();
            let stored = accounts.iter_mut().find(|a| a.id == account.id).unwrap();
            if stored.version != account.version {
                return Err(EngineError::Conflict("stale".to_string()));
            }
            stored.balance = new_balance;
            stored.version += 1;
            *self.balance_writes.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[async_trait]
    impl RuleStore for MemoryStore {
        async fn rules_for_account(&self, account_id: Uuid) -> ResultEngine<Vec<TopUpRule>> {
            let mut rules: Vec<_> = self
                .rules
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.account_id == account_id)
                .cloned()
                .collect();
            rules.sort_by_key(|r| r.position);
            Ok(rules)
        }
    }

    #[async_trait]
    impl EventStore for MemoryStore {
        async fn append_event(&self, event: &TopUpEvent) -> ResultEngine<()> {
            if self.fail_event_append {
                return Err(DbErr::Custom("event log unavailable".to_string()).into());
            }
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn no_enabled_rules_leaves_balance_untouched() {
        let (store, id) = MemoryStore::with_account(2550);
        store.add_rule(id, 5000, 10000, false);

        let outcome = store.evaluator().evaluate(id).await.unwrap();

        assert!(!outcome.triggered());
        assert_eq!(outcome, TopUpOutcome::NotTriggered(NotTriggered::NoRuleMatched));
        assert_eq!(store.balance(id), Money::new(2550));
        assert_eq!(*store.balance_writes.lock().unwrap(), 0);
        assert!(store.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn breached_rule_tops_up_and_records_pre_topup_balance() {
        let (store, id) = MemoryStore::with_account(2550);
        let rule_id = store.add_rule(id, 5000, 10000, true);

        let outcome = store.evaluator().evaluate(id).await.unwrap();

        assert!(outcome.triggered());
        assert_eq!(
            outcome.message(),
            "TopUp of £100.00 triggered. New balance: £125.50"
        );
        assert_eq!(store.balance(id), Money::new(12550));

        let events = store.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].triggered_balance, Money::new(2550));
        assert_eq!(events[0].amount, Money::new(10000));
        assert_eq!(events[0].rule_id, Some(rule_id));
    }

    #[tokio::test]
    async fn only_first_breached_rule_fires() {
        let (store, id) = MemoryStore::with_account(1000);
        let first = store.add_rule(id, 5000, 2000, true);
        store.add_rule(id, 8000, 50000, true);

        let outcome = store.evaluator().evaluate(id).await.unwrap();

        assert_eq!(outcome.event().and_then(|e| e.rule_id), Some(first));
        assert_eq!(store.balance(id), Money::new(3000));
        assert_eq!(store.events.lock().unwrap().len(), 1);
        assert_eq!(*store.balance_writes.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn disabled_rule_is_skipped_for_next_enabled_one() {
        let (store, id) = MemoryStore::with_account(1000);
        store.add_rule(id, 5000, 2000, false);
        let second = store.add_rule(id, 5000, 7000, true);

        let outcome = store.evaluator().evaluate(id).await.unwrap();

        assert_eq!(outcome.event().and_then(|e| e.rule_id), Some(second));
        assert_eq!(store.balance(id), Money::new(8000));
    }

    #[tokio::test]
    async fn balance_at_threshold_does_not_trigger() {
        let (store, id) = MemoryStore::with_account(5000);
        store.add_rule(id, 5000, 10000, true);

        let outcome = store.evaluator().evaluate(id).await.unwrap();

        assert!(!outcome.triggered());
        assert_eq!(outcome.message(), "No topup rules triggered");
    }

    #[tokio::test]
    async fn missing_account_is_a_soft_outcome_without_writes() {
        let (store, id) = MemoryStore::with_account(100);
        store.add_rule(id, 5000, 10000, true);

        let outcome = store.evaluator().evaluate(Uuid::new_v4()).await.unwrap();

        assert_eq!(outcome, TopUpOutcome::NotTriggered(NotTriggered::AccountNotFound));
        assert_eq!(outcome.message(), "Account not found");
        assert_eq!(*store.balance_writes.lock().unwrap(), 0);
        assert!(store.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn repeated_evaluation_triggers_again_while_below_threshold() {
        let (store, id) = MemoryStore::with_account(0);
        store.add_rule(id, 5000, 1000, true);

        assert!(store.evaluator().evaluate(id).await.unwrap().triggered());
        assert!(store.evaluator().evaluate(id).await.unwrap().triggered());

        assert_eq!(store.balance(id), Money::new(2000));
        let events = store.events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].triggered_balance, Money::new(1000));
    }

    #[tokio::test]
    async fn store_failure_is_a_hard_error() {
        let (mut store, id) = MemoryStore::with_account(100);
        store.add_rule(id, 5000, 10000, true);
        store.fail_reads = true;

        let err = store.evaluator().evaluate(id).await.unwrap_err();

        assert!(matches!(err, EngineError::Database(_)));
    }

    #[tokio::test]
    async fn event_append_failure_propagates() {
        let (mut store, id) = MemoryStore::with_account(100);
        store.add_rule(id, 5000, 10000, true);
        store.fail_event_append = true;

        let err = store.evaluator().evaluate(id).await.unwrap_err();

        assert!(matches!(err, EngineError::Database(_)));
    }

    #[tokio::test]
    async fn stale_account_version_is_a_conflict() {
        let (store, id) = MemoryStore::with_account(100);
        store.add_rule(id, 5000, 10000, true);
        let stale = store.account(id).await.unwrap().unwrap();
        store.update_balance(&stale, Money::new(50)).await.unwrap();

        let err = store.update_balance(&stale, Money::new(10050)).await.unwrap_err();

        assert!(matches!(err, EngineError::Conflict(_)));
        assert_eq!(store.balance(id), Money::new(50));
    }
}
