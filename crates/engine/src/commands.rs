//! Command structs for engine operations.
//!
//! These types group parameters for write operations (entries, transfer
//! requests, directory bootstrap), keeping call sites readable and avoiding
//! long argument lists.

use chrono::{DateTime, Utc};

use crate::{EntryDetails, EntryKind, Money, Role, TransferStatus};

/// Record a donation or an expense.
///
/// The owning scope and the creator are never part of the command: they are
/// taken from the [`Actor`](crate::Actor).
#[derive(Clone, Debug)]
pub struct NewEntryCmd {
    pub idempotency_key: String,
    pub amount: Money,
    pub occurred_at: DateTime<Utc>,
    pub details: EntryDetails,
}

impl NewEntryCmd {
    #[must_use]
    pub fn new(
        idempotency_key: impl Into<String>,
        amount: Money,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            idempotency_key: idempotency_key.into(),
            amount,
            occurred_at,
            details: EntryDetails::default(),
        }
    }

    #[must_use]
    pub fn counterparty(mut self, counterparty: impl Into<String>) -> Self {
        self.details.counterparty = Some(counterparty.into());
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.details.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn payment_mode(mut self, payment_mode: impl Into<String>) -> Self {
        self.details.payment_mode = Some(payment_mode.into());
        self
    }

    #[must_use]
    pub fn contact(mut self, contact: impl Into<String>) -> Self {
        self.details.contact = Some(contact.into());
        self
    }

    #[must_use]
    pub fn received_by(mut self, received_by: impl Into<String>) -> Self {
        self.details.received_by = Some(received_by.into());
        self
    }

    #[must_use]
    pub fn remarks(mut self, remarks: impl Into<String>) -> Self {
        self.details.remarks = Some(remarks.into());
        self
    }

    #[must_use]
    pub fn details(mut self, details: EntryDetails) -> Self {
        self.details = details;
        self
    }
}

/// Ask to move wallet funds to the requester's manager.
#[derive(Clone, Debug)]
pub struct TransferRequestCmd {
    pub idempotency_key: String,
    pub amount: Money,
    pub note: Option<String>,
}

impl TransferRequestCmd {
    #[must_use]
    pub fn new(idempotency_key: impl Into<String>, amount: Money) -> Self {
        Self {
            idempotency_key: idempotency_key.into(),
            amount,
            note: None,
        }
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Register a mandal together with its founding manager.
#[derive(Clone, Debug)]
pub struct NewMandalCmd {
    pub name: String,
    pub manager_name: String,
    pub mobile: String,
    pub password: String,
}

impl NewMandalCmd {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        manager_name: impl Into<String>,
        mobile: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            manager_name: manager_name.into(),
            mobile: mobile.into(),
            password: password.into(),
        }
    }
}

/// Add a member to the acting manager's mandal.
#[derive(Clone, Debug)]
pub struct NewMemberCmd {
    pub name: String,
    pub mobile: String,
    pub password: String,
    pub role: Role,
}

impl NewMemberCmd {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        mobile: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            mobile: mobile.into(),
            password: password.into(),
            role: Role::User,
        }
    }

    #[must_use]
    pub fn role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct EntryListFilter {
    pub kind: Option<EntryKind>,
    pub include_deleted: bool,
}

#[derive(Clone, Debug, Default)]
pub struct TransferListFilter {
    pub status: Option<TransferStatus>,
}
