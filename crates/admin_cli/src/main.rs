use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{Engine, Money, User};
use migration::MigratorTrait;
use sea_orm::Database;
use uuid::Uuid;

type CliResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

#[derive(Parser, Debug)]
#[command(name = "topup_admin")]
#[command(about = "Admin utilities for the top-up backend (users, accounts, rules, demo data)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./topup.db?mode=rwc")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a user with the default accounts. The password is prompted.
    User(UserCreateArgs),
    /// Open an extra account for an existing user.
    Account(AccountCreateArgs),
    /// Add a top-up rule to an account.
    Rule(RuleCreateArgs),
    /// Insert the demo users if the database is empty.
    Seed,
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    name: String,
}

#[derive(Args, Debug)]
struct AccountCreateArgs {
    /// Owner email.
    #[arg(long)]
    email: String,
    #[arg(long)]
    name: String,
    /// Opening balance, e.g. `120.50`.
    #[arg(long, default_value = "0")]
    balance: Money,
}

#[derive(Args, Debug)]
struct RuleCreateArgs {
    /// Owner email.
    #[arg(long)]
    email: String,
    #[arg(long)]
    account: Uuid,
    /// Balance floor, e.g. `50`.
    #[arg(long)]
    threshold: Money,
    /// Amount credited when the balance drops below the threshold.
    #[arg(long)]
    amount: Money,
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> CliResult<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Prints a full line on stderr, also while in raw mode.
fn notice(out: &mut impl Write, line: &str) -> CliResult<()> {
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(line),
        Print("\r\n")
    )?;
    Ok(())
}

/// Reads a line without echoing it, printing `*` per character.
fn read_hidden(prompt: &str) -> CliResult<String> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => break,
            KeyCode::Backspace if buf.pop().is_some() => {
                execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
            }
            _ => {}
        }
        out.flush()?;
    }
    execute!(out, Print("\r\n"))?;

    Ok(buf)
}

fn prompt_new_password() -> CliResult<String> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let password = read_hidden("Password: ")?;
        if password.is_empty() {
            notice(&mut out, "Password must not be empty.")?;
            continue;
        }
        if read_hidden("Confirm password: ")? == password {
            return Ok(password);
        }
        notice(&mut out, "Passwords do not match. Try again.")?;
    }

    Err("too many attempts".into())
}

async fn connect_engine(database_url: &str) -> CliResult<Engine> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(Engine::builder().database(db).build().await?)
}

async fn find_user(engine: &Engine, email: &str) -> CliResult<User> {
    match engine.user_by_email(email).await? {
        Some(user) => Ok(user),
        None => Err(format!("user not found: {email}").into()),
    }
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();

    let engine = connect_engine(&cli.database_url).await?;

    match cli.command {
        Command::User(args) => {
            let password = prompt_new_password()?;
            let user = engine.sign_up(&args.email, &args.name, &password).await?;
            println!("created user: {} ({})", user.email, user.id);
        }
        Command::Account(args) => {
            let user = find_user(&engine, &args.email).await?;
            let account = engine.new_account(user.id, &args.name, args.balance).await?;
            println!(
                "created account: {} ({}) balance {}",
                account.name, account.id, account.balance
            );
        }
        Command::Rule(args) => {
            let user = find_user(&engine, &args.email).await?;
            let rule = engine
                .new_topup_rule(user.id, args.account, args.threshold, args.amount)
                .await?;
            println!(
                "created rule {}: top up {} below {}",
                rule.id, rule.topup_amount, rule.threshold
            );
        }
        Command::Seed => {
            if engine.seed_demo_data().await? {
                println!("demo data seeded");
            } else {
                println!("database not empty, nothing to do");
            }
        }
    }

    Ok(())
}
