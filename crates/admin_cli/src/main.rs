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
use engine::{Engine, NewMandalCmd, NewMemberCmd, Role};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "mandal_admin")]
#[command(about = "Admin utilities for mandal wallets (bootstrap mandals/members)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./mandal.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Mandal(Mandal),
    Member(Member),
    Wallet(Wallet),
}

#[derive(Args, Debug)]
struct Mandal {
    #[command(subcommand)]
    command: MandalCommand,
}

#[derive(Subcommand, Debug)]
enum MandalCommand {
    Create(MandalCreateArgs),
}

#[derive(Args, Debug)]
struct MandalCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    manager_name: String,
    #[arg(long)]
    mobile: String,
}

#[derive(Args, Debug)]
struct Member {
    #[command(subcommand)]
    command: MemberCommand,
}

#[derive(Subcommand, Debug)]
enum MemberCommand {
    Add(MemberAddArgs),
}

#[derive(Args, Debug)]
struct MemberAddArgs {
    /// Manager adding the member; the member joins that manager's mandal.
    #[arg(long)]
    manager_id: Uuid,
    #[arg(long)]
    name: String,
    #[arg(long)]
    mobile: String,
    #[arg(long)]
    manager: bool,
}

#[derive(Args, Debug)]
struct Wallet {
    #[command(subcommand)]
    command: WalletCommand,
}

#[derive(Subcommand, Debug)]
enum WalletCommand {
    /// Rewrites cached balance columns from the ledger.
    Recompute(WalletRecomputeArgs),
}

#[derive(Args, Debug)]
struct WalletRecomputeArgs {
    #[arg(long)]
    manager_id: Uuid,
    /// Every member of the mandal when absent.
    #[arg(long)]
    user_id: Option<Uuid>,
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
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
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn prompt_password_twice() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let p1 = prompt_password("Password: ")?;
        if p1.is_empty() {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print("Password must not be empty.\r\n")
            )?;
            continue;
        }

        let p2 = prompt_password("Confirm password: ")?;
        if p1 == p2 {
            return Ok(p1);
        }

        execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print("Passwords do not match. Try again.\r\n")
        )?;
    }

    Err("too many attempts".into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Mandal(Mandal {
            command: MandalCommand::Create(args),
        }) => {
            let password = prompt_password_twice()?;
            let mandal = engine
                .create_mandal(NewMandalCmd::new(
                    args.name,
                    args.manager_name,
                    args.mobile,
                    password,
                ))
                .await?;
            println!(
                "created mandal: {} ({}), manager {}",
                mandal.name, mandal.id, mandal.manager_id
            );
        }
        Command::Member(Member {
            command: MemberCommand::Add(args),
        }) => {
            let actor = engine.actor(args.manager_id, None).await?;
            let password = prompt_password_twice()?;
            let role = if args.manager {
                Role::Manager
            } else {
                Role::User
            };
            let user = engine
                .add_member(
                    &actor,
                    NewMemberCmd::new(args.name, args.mobile, password).role(role),
                )
                .await?;
            println!("added member: {} ({})", user.name, user.id);
        }
        Command::Wallet(Wallet {
            command: WalletCommand::Recompute(args),
        }) => {
            let actor = engine.actor(args.manager_id, None).await?;
            let user_ids = match args.user_id {
                Some(user_id) => vec![user_id],
                None => engine
                    .members(&actor)
                    .await?
                    .into_iter()
                    .map(|user| user.id)
                    .collect(),
            };
            for user_id in user_ids {
                let balance = engine.recompute_cached_balances(&actor, user_id).await?;
                println!("{user_id}: {balance}");
            }
        }
    }

    Ok(())
}
