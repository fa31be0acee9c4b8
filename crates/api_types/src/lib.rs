use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod balance {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BalanceQuery {
        /// Defaults to the authenticated user.
        pub user_id: Option<Uuid>,
        pub event_id: Option<Uuid>,
    }

    /// Always present: an empty wallet is `0`, never `null`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceResponse {
        pub user_id: Uuid,
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletSummaryView {
        pub user_id: Uuid,
        pub collected_minor: i64,
        pub spent_minor: i64,
        pub transferred_out_minor: i64,
        pub received_minor: i64,
        pub balance_minor: i64,
    }

    /// Cached columns after a recompute.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecomputeResponse {
        pub user_id: Uuid,
        pub wallet_balance_minor: i64,
    }
}

pub mod entry {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum EntryKind {
        Donation,
        Expense,
    }

    /// Request body of `POST /donations` and `POST /expenses`.
    ///
    /// Scope and attribution are never read from the body: they come from the
    /// authenticated user.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryNew {
        /// Client-generated; resubmitting the same key returns the stored
        /// entry.
        pub idempotency_key: String,
        pub amount_minor: i64,
        /// RFC3339 timestamp, including timezone offset (local user time).
        pub occurred_at: DateTime<FixedOffset>,
        /// Donor name for donations, payee for expenses.
        pub counterparty: Option<String>,
        /// Donation type or expense category.
        pub category: Option<String>,
        pub payment_mode: Option<String>,
        pub contact: Option<String>,
        pub received_by: Option<String>,
        pub remarks: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct EntryList {
        pub kind: Option<EntryKind>,
        pub include_deleted: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryView {
        pub id: Uuid,
        pub idempotency_key: String,
        pub kind: EntryKind,
        pub amount_minor: i64,
        pub mandal_id: Uuid,
        pub event_id: Option<Uuid>,
        pub created_by_user_id: Uuid,
        pub created_by_name: String,
        pub occurred_at: DateTime<Utc>,
        pub is_deleted: bool,
        pub is_synced: bool,
        pub counterparty: Option<String>,
        pub category: Option<String>,
        pub payment_mode: Option<String>,
        pub contact: Option<String>,
        pub received_by: Option<String>,
        pub remarks: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryListResponse {
        pub entries: Vec<EntryView>,
    }
}

pub mod transfer {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransferStatus {
        Pending,
        Approved,
        Rejected,
    }

    /// Request body of `POST /transfers`. The recipient is always the
    /// sender's manager.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferNew {
        pub idempotency_key: String,
        pub amount_minor: i64,
        pub note: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransferList {
        /// `pending` when absent.
        pub status: Option<TransferStatus>,
        /// List every status, overriding `status`.
        pub all: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferView {
        pub id: Uuid,
        pub idempotency_key: String,
        pub from_user_id: Uuid,
        pub to_manager_id: Uuid,
        pub mandal_id: Uuid,
        pub event_id: Option<Uuid>,
        pub amount_minor: i64,
        pub status: TransferStatus,
        pub note: Option<String>,
        pub requested_at: DateTime<Utc>,
        pub approved_at: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferListResponse {
        pub transfers: Vec<TransferView>,
    }
}

pub mod directory {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Role {
        Manager,
        User,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EventNew {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EventView {
        pub id: Uuid,
        pub mandal_id: Uuid,
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberNew {
        pub name: String,
        pub mobile: String,
        pub password: String,
        /// `user` when absent.
        pub role: Option<Role>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberView {
        pub id: Uuid,
        pub mandal_id: Uuid,
        pub name: String,
        pub mobile: String,
        pub role: Role,
        pub manager_id: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MembersResponse {
        pub members: Vec<MemberView>,
    }
}
