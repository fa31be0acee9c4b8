//! Initial schema migration.
//!
//! - `mandals`: the top-level organizations
//! - `mandal_events`: festivals run by a mandal
//! - `users`: managers and members, with cached wallet columns
//! - `entries`: donations and expenses
//! - `wallet_transfers`: member to manager transfer requests

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Mandals {
    Table,
    Id,
    Name,
    ManagerId,
    CreatedAt,
}

#[derive(Iden)]
enum MandalEvents {
    Table,
    Id,
    MandalId,
    Name,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    MandalId,
    Name,
    Mobile,
    PasswordHash,
    Role,
    ManagerId,
    DonationCount,
    ExpenseCount,
    WalletBalance,
    TotalCollected,
    TotalTransferred,
    ManagerBalance,
    CreatedAt,
}

#[derive(Iden)]
enum Entries {
    Table,
    Id,
    IdempotencyKey,
    Kind,
    AmountMinor,
    MandalId,
    EventId,
    CreatedByUserId,
    CreatedByName,
    OccurredAt,
    CreatedAt,
    IsDeleted,
    IsSynced,
    DeletedAt,
    DeletedBy,
    Counterparty,
    Category,
    PaymentMode,
    Contact,
    ReceivedBy,
    Remarks,
}

#[derive(Iden)]
enum WalletTransfers {
    Table,
    Id,
    IdempotencyKey,
    FromUserId,
    ToManagerId,
    MandalId,
    EventId,
    AmountMinor,
    Status,
    Note,
    RequestedAt,
    ApprovedAt,
}

fn zeroed_integer<T: IntoIden>(column: T) -> ColumnDef {
    ColumnDef::new(column)
        .big_integer()
        .not_null()
        .default(0)
        .to_owned()
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Mandals
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Mandals::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Mandals::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Mandals::Name).string().not_null())
                    .col(ColumnDef::new(Mandals::ManagerId).uuid().not_null())
                    .col(ColumnDef::new(Mandals::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Events
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(MandalEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MandalEvents::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MandalEvents::MandalId).uuid().not_null())
                    .col(ColumnDef::new(MandalEvents::Name).string().not_null())
                    .col(
                        ColumnDef::new(MandalEvents::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-mandal_events-mandal_id")
                            .from(MandalEvents::Table, MandalEvents::MandalId)
                            .to(Mandals::Table, Mandals::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-mandal_events-mandal_id-name-unique")
                    .table(MandalEvents::Table)
                    .col(MandalEvents::MandalId)
                    .col(MandalEvents::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Users::MandalId).uuid().not_null())
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::Mobile).string().not_null())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string()
                            .not_null()
                            .default("user"),
                    )
                    .col(ColumnDef::new(Users::ManagerId).uuid())
                    .col(zeroed_integer(Users::DonationCount))
                    .col(zeroed_integer(Users::ExpenseCount))
                    .col(zeroed_integer(Users::WalletBalance))
                    .col(zeroed_integer(Users::TotalCollected))
                    .col(zeroed_integer(Users::TotalTransferred))
                    .col(zeroed_integer(Users::ManagerBalance))
                    .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-users-mandal_id")
                            .from(Users::Table, Users::MandalId)
                            .to(Mandals::Table, Mandals::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-users-manager_id")
                            .from(Users::Table, Users::ManagerId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-users-mobile-unique")
                    .table(Users::Table)
                    .col(Users::Mobile)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-users-mandal_id")
                    .table(Users::Table)
                    .col(Users::MandalId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Entries
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Entries::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Entries::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Entries::IdempotencyKey).string().not_null())
                    .col(ColumnDef::new(Entries::Kind).string().not_null())
                    .col(ColumnDef::new(Entries::AmountMinor).big_integer().not_null())
                    .col(ColumnDef::new(Entries::MandalId).uuid().not_null())
                    .col(ColumnDef::new(Entries::EventId).uuid())
                    .col(ColumnDef::new(Entries::CreatedByUserId).uuid().not_null())
                    .col(ColumnDef::new(Entries::CreatedByName).string().not_null())
                    .col(ColumnDef::new(Entries::OccurredAt).timestamp().not_null())
                    .col(ColumnDef::new(Entries::CreatedAt).timestamp().not_null())
                    .col(
                        ColumnDef::new(Entries::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Entries::IsSynced)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Entries::DeletedAt).timestamp())
                    .col(ColumnDef::new(Entries::DeletedBy).uuid())
                    .col(ColumnDef::new(Entries::Counterparty).string())
                    .col(ColumnDef::new(Entries::Category).string())
                    .col(ColumnDef::new(Entries::PaymentMode).string())
                    .col(ColumnDef::new(Entries::Contact).string())
                    .col(ColumnDef::new(Entries::ReceivedBy).string())
                    .col(ColumnDef::new(Entries::Remarks).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-entries-mandal_id")
                            .from(Entries::Table, Entries::MandalId)
                            .to(Mandals::Table, Mandals::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-entries-event_id")
                            .from(Entries::Table, Entries::EventId)
                            .to(MandalEvents::Table, MandalEvents::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-entries-created_by_user_id")
                            .from(Entries::Table, Entries::CreatedByUserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-entries-idempotency_key-unique")
                    .table(Entries::Table)
                    .col(Entries::IdempotencyKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-entries-created_by_user_id-kind")
                    .table(Entries::Table)
                    .col(Entries::CreatedByUserId)
                    .col(Entries::Kind)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-entries-mandal_id-occurred_at")
                    .table(Entries::Table)
                    .col(Entries::MandalId)
                    .col(Entries::OccurredAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Wallet transfers
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(WalletTransfers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WalletTransfers::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(WalletTransfers::IdempotencyKey)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WalletTransfers::FromUserId).uuid().not_null())
                    .col(ColumnDef::new(WalletTransfers::ToManagerId).uuid().not_null())
                    .col(ColumnDef::new(WalletTransfers::MandalId).uuid().not_null())
                    .col(ColumnDef::new(WalletTransfers::EventId).uuid())
                    .col(
                        ColumnDef::new(WalletTransfers::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletTransfers::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(WalletTransfers::Note).string())
                    .col(
                        ColumnDef::new(WalletTransfers::RequestedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WalletTransfers::ApprovedAt).timestamp())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-wallet_transfers-from_user_id")
                            .from(WalletTransfers::Table, WalletTransfers::FromUserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-wallet_transfers-to_manager_id")
                            .from(WalletTransfers::Table, WalletTransfers::ToManagerId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-wallet_transfers-event_id")
                            .from(WalletTransfers::Table, WalletTransfers::EventId)
                            .to(MandalEvents::Table, MandalEvents::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-wallet_transfers-idempotency_key-unique")
                    .table(WalletTransfers::Table)
                    .col(WalletTransfers::IdempotencyKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-wallet_transfers-mandal_id-status")
                    .table(WalletTransfers::Table)
                    .col(WalletTransfers::MandalId)
                    .col(WalletTransfers::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Reverse order of creation (FK dependencies)
        manager
            .drop_table(Table::drop().table(WalletTransfers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Entries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MandalEvents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Mandals::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{ConnectionTrait, Database, Statement};

    use crate::{Migrator, MigratorTrait};

    #[tokio::test]
    async fn up_then_down_leaves_no_tables() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        Migrator::down(&db, None).await.unwrap();

        let row = db
            .query_one(Statement::from_string(
                db.get_database_backend(),
                "SELECT COUNT(*) AS n FROM sqlite_master \
                 WHERE type = 'table' AND name = 'wallet_transfers'",
            ))
            .await
            .unwrap()
            .unwrap();
        let count: i64 = row.try_get("", "n").unwrap();
        assert_eq!(count, 0);
    }
}
