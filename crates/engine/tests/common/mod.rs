#![allow(dead_code)]

use std::path::PathBuf;

use chrono::{TimeZone, Utc};
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

use engine::{Actor, Engine, Entry, Mandal, Money, NewEntryCmd, NewMandalCmd, NewMemberCmd, Role};
use migration::MigratorTrait;

pub const PASSWORD: &str = "secret";

pub struct Fixture {
    pub engine: Engine,
    pub db: DatabaseConnection,
    pub mandal: Mandal,
    pub manager: Actor,
    pub member: Actor,
}

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    engine_on("sqlite::memory:").await
}

async fn engine_on(url: &str) -> (Engine, DatabaseConnection) {
    let db = Database::connect(url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .password_cost(4)
        .build()
        .await
        .unwrap();
    (engine, db)
}

/// A mandal with its founding manager and one regular member.
pub async fn fixture() -> Fixture {
    let (engine, db) = engine_with_db().await;
    populate(engine, db).await
}

/// Sqlite file removed on drop, with its WAL side files.
pub struct TempDb(PathBuf);

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut path = self.0.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Same as [`fixture`], but on a sqlite file: the pool hands out several
/// connections, so concurrent transactions really overlap.
pub async fn file_fixture() -> (Fixture, TempDb) {
    let path = std::env::temp_dir().join(format!("mandal-{}.db", Uuid::new_v4()));
    let (engine, db) = engine_on(&format!("sqlite:{}?mode=rwc", path.display())).await;
    (populate(engine, db).await, TempDb(path))
}

async fn populate(engine: Engine, db: DatabaseConnection) -> Fixture {
    let mandal = engine
        .create_mandal(NewMandalCmd::new("Lalbaug", "Ravi", "9000000001", PASSWORD))
        .await
        .unwrap();
    let manager = engine
        .authenticate("9000000001", PASSWORD, None)
        .await
        .unwrap();
    let member = add_member(&engine, &manager, "Asha", "9000000002").await;

    Fixture {
        engine,
        db,
        mandal,
        manager,
        member,
    }
}

pub async fn add_member(engine: &Engine, manager: &Actor, name: &str, mobile: &str) -> Actor {
    let user = engine
        .add_member(manager, NewMemberCmd::new(name, mobile, PASSWORD))
        .await
        .unwrap();
    engine.actor(user.id, manager.scope.event_id).await.unwrap()
}

pub async fn add_manager(engine: &Engine, manager: &Actor, name: &str, mobile: &str) -> Actor {
    let user = engine
        .add_member(
            manager,
            NewMemberCmd::new(name, mobile, PASSWORD).role(Role::Manager),
        )
        .await
        .unwrap();
    engine.actor(user.id, manager.scope.event_id).await.unwrap()
}

pub fn occurred_at() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 7, 10, 0, 0).unwrap()
}

pub async fn donate(engine: &Engine, actor: &Actor, key: &str, minor: i64) -> Entry {
    engine
        .create_donation(actor, NewEntryCmd::new(key, Money::new(minor), occurred_at()))
        .await
        .unwrap()
}

pub async fn spend(engine: &Engine, actor: &Actor, key: &str, minor: i64) -> Entry {
    engine
        .create_expense(actor, NewEntryCmd::new(key, Money::new(minor), occurred_at()))
        .await
        .unwrap()
}
