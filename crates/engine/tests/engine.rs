use sea_orm::{Database, DatabaseConnection, TransactionTrait};

use engine::{
    AccountStore, Engine, EngineError, Money, NewTransaction, SeaOrmStore, TransactionKind, User,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn alice(engine: &Engine) -> User {
    engine
        .sign_up("alice@example.com", "Alice", "password")
        .await
        .unwrap()
}

async fn account_with_balance(engine: &Engine, user: &User, balance: i64) -> Uuid {
    engine
        .new_account(user.id, "Spending", Money::new(balance))
        .await
        .unwrap()
        .id
}

fn debit(account_id: Uuid, amount: i64) -> NewTransaction {
    NewTransaction {
        account_id,
        amount: Money::new(amount),
        merchant: "Tesco".to_string(),
        description: Some("Weekly groceries".to_string()),
        category: Some("Groceries".to_string()),
        kind: TransactionKind::Debit,
    }
}

#[tokio::test]
async fn sign_up_opens_default_accounts() {
    let (engine, _db) = engine_with_db().await;
    let user = alice(&engine).await;

    let accounts = engine.accounts(user.id).await.unwrap();
    let summary: Vec<_> = accounts
        .iter()
        .map(|a| (a.name.as_str(), a.balance.minor()))
        .collect();
    assert_eq!(
        summary,
        vec![("Current Account", 100_00), ("Savings Account", 500_00)]
    );
}

#[tokio::test]
async fn duplicate_email_is_rejected_case_insensitively() {
    let (engine, _db) = engine_with_db().await;
    alice(&engine).await;

    let err = engine
        .sign_up("ALICE@example.com", "Other Alice", "secret")
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("alice@example.com".to_string()));
}

#[tokio::test]
async fn authenticate_checks_password() {
    let (engine, _db) = engine_with_db().await;
    let user = alice(&engine).await;

    let logged = engine
        .authenticate("Alice@Example.com", "password")
        .await
        .unwrap();
    assert_eq!((logged.id, logged.email.as_str()), (user.id, "alice@example.com"));

    let err = engine.authenticate("alice@example.com", "nope").await.unwrap_err();
    assert!(matches!(err, EngineError::Unauthorized(_)));
    let err = engine.authenticate("bob@example.com", "password").await.unwrap_err();
    assert!(matches!(err, EngineError::Unauthorized(_)));
}

#[tokio::test]
async fn debit_below_threshold_triggers_topup() {
    let (engine, _db) = engine_with_db().await;
    let user = alice(&engine).await;
    let account_id = account_with_balance(&engine, &user, 75_50).await;
    engine
        .new_topup_rule(user.id, account_id, Money::new(50_00), Money::new(100_00))
        .await
        .unwrap();

    let (tx, outcome) = engine
        .post_transaction(user.id, debit(account_id, 50_00))
        .await
        .unwrap();

    assert_eq!(tx.amount_minor, 50_00);
    assert!(outcome.triggered());
    assert_eq!(
        outcome.message(),
        "TopUp of £100.00 triggered. New balance: £125.50"
    );

    let account = engine.account(account_id, user.id).await.unwrap();
    assert_eq!(account.balance, Money::new(125_50));

    let events = engine.topup_events(user.id, Some(account_id)).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].triggered_balance, Money::new(25_50));
    assert_eq!(events[0].amount, Money::new(100_00));
}

#[tokio::test]
async fn posting_without_rules_only_moves_balance() {
    let (engine, _db) = engine_with_db().await;
    let user = alice(&engine).await;
    let account_id = account_with_balance(&engine, &user, 10_00).await;

    let (_, outcome) = engine
        .post_transaction(user.id, debit(account_id, 30_00))
        .await
        .unwrap();
    assert!(!outcome.triggered());

    let credit = NewTransaction {
        kind: TransactionKind::Credit,
        ..debit(account_id, 5_00)
    };
    engine.post_transaction(user.id, credit).await.unwrap();

    let account = engine.account(account_id, user.id).await.unwrap();
    assert_eq!(account.balance, Money::new(-15_00));
    assert!(engine.topup_events(user.id, Some(account_id)).await.unwrap().is_empty());
    assert_eq!(engine.transactions(user.id, Some(account_id)).await.unwrap().len(), 2);
}

#[tokio::test]
async fn first_rule_in_insertion_order_wins() {
    let (engine, _db) = engine_with_db().await;
    let user = alice(&engine).await;
    let account_id = account_with_balance(&engine, &user, 10_00).await;
    let first = engine
        .new_topup_rule(user.id, account_id, Money::new(20_00), Money::new(15_00))
        .await
        .unwrap();
    let second = engine
        .new_topup_rule(user.id, account_id, Money::new(80_00), Money::new(500_00))
        .await
        .unwrap();
    assert_eq!((first.position, second.position), (1, 2));

    let outcome = engine.trigger_topup(user.id, account_id).await.unwrap();

    assert_eq!(outcome.event().and_then(|e| e.rule_id), Some(first.id));
    let account = engine.account(account_id, user.id).await.unwrap();
    assert_eq!(account.balance, Money::new(25_00));
}

#[tokio::test]
async fn disabled_rule_does_not_fire() {
    let (engine, _db) = engine_with_db().await;
    let user = alice(&engine).await;
    let account_id = account_with_balance(&engine, &user, 10_00).await;
    let rule = engine
        .new_topup_rule(user.id, account_id, Money::new(50_00), Money::new(100_00))
        .await
        .unwrap();

    let rule = engine
        .set_topup_rule_enabled(user.id, rule.id, false)
        .await
        .unwrap();
    assert!(!rule.enabled);

    let outcome = engine.trigger_topup(user.id, account_id).await.unwrap();
    assert!(!outcome.triggered());
    assert_eq!(outcome.message(), "No topup rules triggered");

    let rules = engine.topup_rules(user.id, Some(account_id)).await.unwrap();
    assert_eq!(rules.len(), 1);
    assert!(!rules[0].enabled);
}

#[tokio::test]
async fn manual_trigger_is_not_idempotent() {
    let (engine, _db) = engine_with_db().await;
    let user = alice(&engine).await;
    let account_id = account_with_balance(&engine, &user, 0).await;
    engine
        .new_topup_rule(user.id, account_id, Money::new(50_00), Money::new(10_00))
        .await
        .unwrap();

    assert!(engine.trigger_topup(user.id, account_id).await.unwrap().triggered());
    assert!(engine.trigger_topup(user.id, account_id).await.unwrap().triggered());

    let account = engine.account(account_id, user.id).await.unwrap();
    assert_eq!(account.balance, Money::new(20_00));
    assert_eq!(account.version, 2);
    assert_eq!(engine.topup_events(user.id, None).await.unwrap().len(), 2);
}

#[tokio::test]
async fn foreign_accounts_look_missing() {
    let (engine, _db) = engine_with_db().await;
    let user = alice(&engine).await;
    let bob = engine
        .sign_up("bob@example.com", "Bob", "password")
        .await
        .unwrap();
    let bobs_account = account_with_balance(&engine, &bob, 0).await;

    let not_found = EngineError::KeyNotFound("account not exists".to_string());
    assert_eq!(
        engine.trigger_topup(user.id, bobs_account).await.unwrap_err(),
        not_found
    );
    assert_eq!(
        engine
            .post_transaction(user.id, debit(bobs_account, 1_00))
            .await
            .unwrap_err(),
        not_found
    );
    assert_eq!(
        engine
            .new_topup_rule(user.id, bobs_account, Money::new(1_00), Money::new(1_00))
            .await
            .unwrap_err(),
        not_found
    );
    assert_eq!(
        engine.transactions(user.id, Some(bobs_account)).await.unwrap_err(),
        not_found
    );
}

#[tokio::test]
async fn invalid_input_is_rejected_before_writing() {
    let (engine, _db) = engine_with_db().await;
    let user = alice(&engine).await;
    let account_id = account_with_balance(&engine, &user, 10_00).await;

    let err = engine
        .post_transaction(user.id, debit(account_id, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let blank_merchant = NewTransaction {
        merchant: "   ".to_string(),
        ..debit(account_id, 1_00)
    };
    let err = engine.post_transaction(user.id, blank_merchant).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let err = engine
        .new_topup_rule(user.id, account_id, Money::new(50_00), Money::ZERO)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let account = engine.account(account_id, user.id).await.unwrap();
    assert_eq!(account.balance, Money::new(10_00));
    assert!(engine.transactions(user.id, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn stale_balance_write_is_a_conflict() {
    let (engine, db) = engine_with_db().await;
    let user = alice(&engine).await;
    let account_id = account_with_balance(&engine, &user, 10_00).await;
    let stale = engine.account(account_id, user.id).await.unwrap();

    engine
        .post_transaction(user.id, debit(account_id, 1_00))
        .await
        .unwrap();

    let db_tx = db.begin().await.unwrap();
    let err = SeaOrmStore::new(&db_tx)
        .update_balance(&stale, Money::new(999_00))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
    db_tx.rollback().await.unwrap();

    let account = engine.account(account_id, user.id).await.unwrap();
    assert_eq!(account.balance, Money::new(9_00));
}

#[tokio::test]
async fn seeding_runs_once() {
    let (engine, _db) = engine_with_db().await;

    assert!(engine.seed_demo_data().await.unwrap());
    assert!(!engine.seed_demo_data().await.unwrap());

    let demo = engine
        .authenticate(engine::DEMO_EMAIL, engine::DEMO_PASSWORD)
        .await
        .unwrap();
    let accounts = engine.accounts(demo.id).await.unwrap();
    assert_eq!(accounts.len(), 2);
    assert_eq!(engine.transactions(demo.id, None).await.unwrap().len(), 4);
    assert_eq!(engine.topup_rules(demo.id, None).await.unwrap().len(), 1);

    let events = engine.topup_events(demo.id, None).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].triggered_balance, Money::new(25_50));
}
