//! Wallet ledger and transfer-approval engine for mandals.
//!
//! Balances are always derived from the persisted donations, expenses and
//! approved transfers; the balance columns on `users` are only a cache that
//! transfer approval keeps roughly in sync.

pub use commands::{
    EntryListFilter, NewEntryCmd, NewMandalCmd, NewMemberCmd, TransferListFilter,
    TransferRequestCmd,
};
pub use entries::{Entry, EntryDetails, EntryKind};
pub use error::EngineError;
pub use mandal_events::MandalEvent;
pub use mandals::Mandal;
pub use money::Money;
pub use ops::{Engine, EngineBuilder, WalletSummary};
pub use scope::{Actor, Role, Scope};
pub use transfers::{Transfer, TransferStatus};
pub use users::{CachedBalances, User};

mod commands;
mod entries;
mod error;
mod mandal_events;
mod mandals;
mod money;
mod ops;
mod scope;
mod transfers;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
